//! Response parsing
//!
//! Turns a raw payload into clean records. Both wire formats share one row
//! layout:
//!
//! ```text
//! response
//! └── result
//!     └── <Module>
//!         └── row (no="1")
//!             ├── FL (val="LEADID")  -> "1001"
//!             └── FL (val="Company") -> "Acme"
//! ```
//!
//! An empty result set comes back as a `nodata` node and yields no records.
//! An `error` node is an in-band failure and becomes [`CrmError::Parse`].

use super::constants::NO_DATA_CODE;
use super::error::{CrmError, Result};
use super::request::{Request, ResponseFormat};
use super::response::Record;
use log::debug;
use serde_json::Value;

pub trait ResponseParser: Send + Sync {
    /// Decode a raw payload according to the request's declared format
    fn parse(&self, request: &Request, raw: &str) -> Result<Vec<Record>>;
}

/// Parser for the CRM's JSON and XML payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct ZohoResponseParser;

impl ResponseParser for ZohoResponseParser {
    fn parse(&self, request: &Request, raw: &str) -> Result<Vec<Record>> {
        let records = match request.format() {
            ResponseFormat::Json => parse_json(request.module(), raw)?,
            ResponseFormat::Xml => parse_xml(request.module(), raw)?,
        };
        debug!("Parsed {} record(s) from {}", records.len(), request);
        Ok(records)
    }
}

fn in_band_error(code: Option<String>, message: Option<String>) -> CrmError {
    CrmError::parse(format!(
        "server error {}: {}",
        code.unwrap_or_else(|| "unknown".to_string()),
        message.unwrap_or_else(|| "no message".to_string())
    ))
}

/// Parse the JSON wire format
pub fn parse_json(module: &str, raw: &str) -> Result<Vec<Record>> {
    let json: Value = serde_json::from_str(raw)?;

    // getUsers answers with a different root
    if let Some(users) = json.get("users") {
        return Ok(parse_json_users(users));
    }

    let response = json
        .get("response")
        .ok_or_else(|| CrmError::parse("missing 'response' node"))?;

    if let Some(error) = response.get("error") {
        return Err(in_band_error(
            scalar_to_string(error.get("code")),
            scalar_to_string(error.get("message")),
        ));
    }

    if let Some(nodata) = response.get("nodata") {
        let code = scalar_to_string(nodata.get("code"));
        if code.as_deref().map_or(true, |c| c == NO_DATA_CODE) {
            return Ok(Vec::new());
        }
        return Err(in_band_error(code, scalar_to_string(nodata.get("message"))));
    }

    let result = response
        .get("result")
        .ok_or_else(|| CrmError::parse("missing 'result' node"))?;

    let rows = match result.get(module).and_then(|m| m.get("row")) {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    one_or_many(rows).into_iter().map(json_row_to_record).collect()
}

fn parse_json_users(users: &Value) -> Vec<Record> {
    let list = match users.get("user") {
        Some(list) => list,
        None => return Vec::new(),
    };

    one_or_many(list)
        .into_iter()
        .filter_map(Value::as_object)
        .map(|user| {
            user.iter()
                .map(|(key, value)| {
                    let key = if key == "content" { "name" } else { key.as_str() };
                    (key.to_string(), value.clone())
                })
                .collect()
        })
        .collect()
}

fn json_row_to_record(row: &Value) -> Result<Record> {
    let fields = row
        .get("FL")
        .ok_or_else(|| CrmError::parse("row without 'FL' entries"))?;

    let mut record = Record::new();
    for field in one_or_many(fields) {
        let name = field
            .get("val")
            .and_then(Value::as_str)
            .ok_or_else(|| CrmError::parse("field without 'val' attribute"))?;
        let value = field.get("content").cloned().unwrap_or(Value::Null);
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

/// Single elements are sent bare instead of as one-element arrays
fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Parse the XML wire format
pub fn parse_xml(module: &str, raw: &str) -> Result<Vec<Record>> {
    let doc = roxmltree::Document::parse(raw)?;
    let root = doc.root_element();

    if root.has_tag_name("users") {
        return Ok(root
            .children()
            .filter(|n| n.has_tag_name("user"))
            .map(|user| {
                let mut record = Record::new();
                for attr in user.attributes() {
                    record.insert(attr.name().to_string(), Value::String(attr.value().to_string()));
                }
                if let Some(name) = user.text() {
                    record.insert("name".to_string(), Value::String(name.trim().to_string()));
                }
                record
            })
            .collect());
    }

    if !root.has_tag_name("response") {
        return Err(CrmError::parse(format!(
            "unexpected root element '{}'",
            root.tag_name().name()
        )));
    }

    if let Some(error) = child(root, "error") {
        return Err(in_band_error(child_text(error, "code"), child_text(error, "message")));
    }

    if let Some(nodata) = child(root, "nodata") {
        let code = child_text(nodata, "code");
        if code.as_deref().map_or(true, |c| c == NO_DATA_CODE) {
            return Ok(Vec::new());
        }
        return Err(in_band_error(code, child_text(nodata, "message")));
    }

    let result = child(root, "result").ok_or_else(|| CrmError::parse("missing 'result' node"))?;
    let module_node = match child(result, module) {
        Some(node) => node,
        None => return Ok(Vec::new()),
    };

    module_node
        .children()
        .filter(|n| n.has_tag_name("row"))
        .map(|row| {
            let mut record = Record::new();
            for field in row.children().filter(|n| n.has_tag_name("FL")) {
                let name = field
                    .attribute("val")
                    .ok_or_else(|| CrmError::parse("field without 'val' attribute"))?;
                let value = field
                    .text()
                    .map(|t| Value::String(t.to_string()))
                    .unwrap_or(Value::Null);
                record.insert(name.to_string(), value);
            }
            Ok(record)
        })
        .collect()
}

fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).and_then(|n| n.text()).map(|t| t.trim().to_string())
}
