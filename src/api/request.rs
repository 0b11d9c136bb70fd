//! Request descriptor
//!
//! Bundles everything needed to issue one call: wire format, module, method
//! and the effective parameter set. Pagination never mutates a descriptor; it
//! derives a new one per page with [`Request::with_window`].

use super::constants::{self, params};
use super::params::UrlParameters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire format requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            other => Err(format!("unknown response format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    format: ResponseFormat,
    module: String,
    method: String,
    parameters: UrlParameters,
}

impl Request {
    pub fn new(
        format: ResponseFormat,
        module: impl Into<String>,
        method: impl Into<String>,
        parameters: UrlParameters,
    ) -> Self {
        Self {
            format,
            module: module.into(),
            method: method.into(),
            parameters,
        }
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn parameters(&self) -> &UrlParameters {
        &self.parameters
    }

    /// Derive a descriptor for the index window `[from_index, to_index]`
    pub fn with_window(&self, from_index: u32, to_index: u32) -> Self {
        Self {
            format: self.format,
            module: self.module.clone(),
            method: self.method.clone(),
            parameters: self
                .parameters
                .extend([(params::FROM_INDEX, from_index), (params::TO_INDEX, to_index)]),
        }
    }

    /// Endpoint URL without the query string
    pub fn endpoint(&self, base_url: &str) -> String {
        constants::method_endpoint(base_url, self.format.as_str(), &self.module, &self.method)
    }

    /// Full URL including the encoded parameters
    pub fn to_url(&self, base_url: &str) -> String {
        let mut url = self.endpoint(base_url);
        if !self.parameters.is_empty() {
            url.push('?');
            url.push_str(&self.parameters.to_query_string());
        }
        url
    }
}

impl fmt::Display for Request {
    /// Log-friendly form, which leaves the auth token out
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.format, self.module, self.method)?;
        if let (Some(from), Some(to)) = (
            self.parameters.get(params::FROM_INDEX),
            self.parameters.get(params::TO_INDEX),
        ) {
            write!(f, " [{}..{}]", from, to)?;
        }
        Ok(())
    }
}
