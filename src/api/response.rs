//! Response envelope and response shaping
//!
//! A call produces a [`Response`] envelope. Before it reaches the caller it is
//! shaped according to a [`ResponseMode`]: kept as is, unwrapped to its
//! records, or mapped to [`Entity`] values.

use super::modules::id_field_for;
use super::request::Request;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// One CRM record, field name to value in server order
pub type Record = Map<String, Value>;

/// Records returned by a single page fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub records: Vec<Record>,
}

impl PageResult {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Full response envelope: the request, the raw payloads and the clean records
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    request: Request,
    raw_payloads: Vec<String>,
    content: Vec<Record>,
}

impl Response {
    pub fn new(request: Request, raw_payload: String, content: Vec<Record>) -> Self {
        Self {
            request,
            raw_payloads: vec![raw_payload],
            content,
        }
    }

    /// Envelope for a paginated call, one raw payload per fetched page
    pub fn aggregated(request: Request, raw_payloads: Vec<String>, content: Vec<Record>) -> Self {
        Self {
            request,
            raw_payloads,
            content,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn raw_payloads(&self) -> &[String] {
        &self.raw_payloads
    }

    pub fn content(&self) -> &[Record] {
        &self.content
    }

    pub fn into_content(self) -> Vec<Record> {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Map every record to an entity of the request's module
    pub fn to_entities(&self) -> Vec<Entity> {
        let id_field = id_field_for(self.request.module());
        self.content
            .iter()
            .map(|record| Entity::from_record(self.request.module(), &id_field, record.clone()))
            .collect()
    }

    pub fn as_full(self) -> Output {
        Output::Full(self)
    }

    pub fn as_records_array(self) -> Output {
        Output::Records(self.into_content())
    }

    pub fn as_entity(self) -> Output {
        Output::Entities(self.to_entities())
    }

    /// Shape the envelope according to `mode`
    pub fn transform(self, mode: ResponseMode) -> Output {
        match mode {
            ResponseMode::Full => self.as_full(),
            ResponseMode::RecordsArray => self.as_records_array(),
            ResponseMode::Entity => self.as_entity(),
        }
    }
}

/// A record mapped to its module, with the id pulled out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub module: String,
    pub id: Option<String>,
    pub fields: Record,
}

impl Entity {
    pub fn from_record(module: &str, id_field: &str, fields: Record) -> Self {
        let id = fields.get(id_field).and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Self {
            module: module.to_string(),
            id,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }
}

/// How call results are shaped before being returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    #[default]
    Full,
    RecordsArray,
    Entity,
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseMode::Full => "full",
            ResponseMode::RecordsArray => "records_array",
            ResponseMode::Entity => "entity",
        })
    }
}

impl FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(ResponseMode::Full),
            "records" | "records_array" => Ok(ResponseMode::RecordsArray),
            "entity" | "entities" => Ok(ResponseMode::Entity),
            other => Err(format!("unknown response mode '{}'", other)),
        }
    }
}

/// A shaped call result
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Full(Response),
    Records(Vec<Record>),
    Entities(Vec<Entity>),
}

impl Output {
    pub fn mode(&self) -> ResponseMode {
        match self {
            Output::Full(_) => ResponseMode::Full,
            Output::Records(_) => ResponseMode::RecordsArray,
            Output::Entities(_) => ResponseMode::Entity,
        }
    }

    /// Number of records regardless of shape
    pub fn len(&self) -> usize {
        match self {
            Output::Full(response) => response.len(),
            Output::Records(records) => records.len(),
            Output::Entities(entities) => entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Output::Full(response) => Some(response),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            Output::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn into_entities(self) -> Option<Vec<Entity>> {
        match self {
            Output::Entities(entities) => Some(entities),
            _ => None,
        }
    }

    /// JSON rendering of the shaped result
    pub fn to_json(&self) -> Value {
        match self {
            Output::Full(response) => serde_json::json!({
                "module": response.request().module(),
                "method": response.request().method(),
                "pages": response.raw_payloads().len(),
                "records": response.content(),
            }),
            Output::Records(records) => serde_json::json!(records),
            Output::Entities(entities) => serde_json::json!(entities),
        }
    }
}
