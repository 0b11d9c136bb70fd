//! URL parameter sets
//!
//! A request's parameters are built by layering: server defaults, then the
//! auth token, then whatever the caller passes. Every layer is applied with
//! [`UrlParameters::extend`], which never touches the receiver.

use super::constants::{defaults, params, MIN_INDEX, PAGE_MAX_SIZE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Str(String),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Str(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

/// Ordered key/value parameter set with right-biased merging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlParameters {
    entries: IndexMap<String, ParamValue>,
}

impl UrlParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new set with every entry of `other` applied on top of `self`
    pub fn extend<I, K, V>(&self, other: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let mut merged = self.clone();
        for (key, value) in other {
            merged.entries.insert(key.into(), value.into());
        }
        merged
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn unset(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k),
                    urlencoding::encode(&v.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<'a> IntoIterator for &'a UrlParameters {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = indexmap::map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for UrlParameters {
    type Item = (String, ParamValue);
    type IntoIter = indexmap::map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for UrlParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        UrlParameters::new().extend(iter)
    }
}

/// Typed server defaults, with an open map for module specific keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultParameters {
    pub scope: String,
    pub new_format: i64,
    pub version: i64,
    pub from_index: u32,
    pub to_index: u32,
    #[serde(flatten)]
    pub extra: IndexMap<String, ParamValue>,
}

impl Default for DefaultParameters {
    fn default() -> Self {
        Self {
            scope: defaults::SCOPE.to_string(),
            new_format: defaults::NEW_FORMAT,
            version: defaults::VERSION,
            from_index: MIN_INDEX,
            to_index: PAGE_MAX_SIZE,
            extra: IndexMap::new(),
        }
    }
}

impl DefaultParameters {
    pub fn builder() -> DefaultParametersBuilder {
        DefaultParametersBuilder::new()
    }
}

impl From<DefaultParameters> for UrlParameters {
    fn from(defaults: DefaultParameters) -> Self {
        let mut set = UrlParameters::new();
        set.set(params::SCOPE, defaults.scope);
        set.set(params::NEW_FORMAT, defaults.new_format);
        set.set(params::VERSION, defaults.version);
        set.set(params::FROM_INDEX, defaults.from_index);
        set.set(params::TO_INDEX, defaults.to_index);
        set.extend(defaults.extra)
    }
}

/// Fluent builder for [`DefaultParameters`]
#[derive(Debug, Clone, Default)]
pub struct DefaultParametersBuilder {
    params: DefaultParameters,
}

impl DefaultParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.params.scope = scope.into();
        self
    }

    pub fn new_format(mut self, new_format: i64) -> Self {
        self.params.new_format = new_format;
        self
    }

    pub fn version(mut self, version: i64) -> Self {
        self.params.version = version;
        self
    }

    pub fn index_window(mut self, from_index: u32, to_index: u32) -> Self {
        self.params.from_index = from_index;
        self.params.to_index = to_index;
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.extra.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> DefaultParameters {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_is_right_biased_and_pure() {
        let base: UrlParameters = [("scope", "crmapi"), ("selectColumns", "All")]
            .into_iter()
            .collect();
        let layer = [("selectColumns", "Leads(First Name)"), ("sortOrderString", "asc")];

        let merged = base.extend(layer);

        assert_eq!(merged.get("scope"), Some(&ParamValue::from("crmapi")));
        assert_eq!(merged.get("selectColumns"), Some(&ParamValue::from("Leads(First Name)")));
        assert_eq!(merged.get("sortOrderString"), Some(&ParamValue::from("asc")));
        assert_eq!(merged.len(), 3);

        // the receiver is left alone
        assert_eq!(base.get("selectColumns"), Some(&ParamValue::from("All")));
        assert!(!base.contains("sortOrderString"));
    }

    #[test]
    fn test_extend_keeps_first_insertion_position() {
        let base: UrlParameters = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        let merged = base.extend([("b", 20), ("d", 4)]);

        let keys: Vec<&str> = merged.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert_eq!(merged.get("b").and_then(ParamValue::as_int), Some(20));
    }

    #[test]
    fn test_set_and_unset() {
        let mut set = UrlParameters::new();
        set.set("version", 2);
        set.set("scope", "crmapi");
        assert_eq!(set.unset("version"), Some(ParamValue::Int(2)));
        assert_eq!(set.unset("version"), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_defaults_to_url_parameters() {
        let set: UrlParameters = DefaultParameters::default().into();
        assert_eq!(
            set.to_query_string(),
            "scope=crmapi&newFormat=1&version=2&fromIndex=1&toIndex=200"
        );
    }

    #[test]
    fn test_builder_extra_keys() {
        let defaults = DefaultParameters::builder()
            .version(4)
            .extra("selectColumns", "Leads(Company)")
            .build();
        let set: UrlParameters = defaults.into();

        assert_eq!(set.get("version").and_then(ParamValue::as_int), Some(4));
        assert_eq!(
            set.get("selectColumns").and_then(ParamValue::as_str),
            Some("Leads(Company)")
        );
    }

    #[test]
    fn test_query_string_encoding() {
        let set: UrlParameters = [("searchCondition", "(Company|=|Acme & Co)")]
            .into_iter()
            .collect();
        assert_eq!(
            set.to_query_string(),
            "searchCondition=%28Company%7C%3D%7CAcme%20%26%20Co%29"
        );
    }

    #[test]
    fn test_param_value_deserialize() {
        let set: UrlParameters = serde_json::from_str(r#"{"version": 2, "scope": "crmapi"}"#).unwrap();
        assert_eq!(set.get("version"), Some(&ParamValue::Int(2)));
        assert_eq!(set.get("scope"), Some(&ParamValue::from("crmapi")));
    }
}
