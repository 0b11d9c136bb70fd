//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zoho_crm::api::{Client, CrmError, ParamValue, Request, Result, Transport};

/// In-memory Leads server honoring the fromIndex/toIndex window
pub struct LeadsServer {
    pub total: u32,
    pub fail_on_call: Option<usize>,
    pub slow_from_call: Option<(usize, Duration)>,
    pub requests: Mutex<Vec<Request>>,
}

impl LeadsServer {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            fail_on_call: None,
            slow_from_call: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(total: u32, call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new(total)
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn windows(&self) -> Vec<(i64, i64)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| (index(r, "fromIndex"), index(r, "toIndex")))
            .collect()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn index(request: &Request, key: &str) -> i64 {
    request
        .parameters()
        .get(key)
        .and_then(ParamValue::as_int)
        .unwrap_or_default()
}

#[async_trait]
impl Transport for LeadsServer {
    async fn fire(&self, request: &Request) -> Result<String> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if let Some((from_call, delay)) = self.slow_from_call {
            if call >= from_call {
                tokio::time::sleep(delay).await;
            }
        }

        if self.fail_on_call == Some(call) {
            return Err(CrmError::transport(Some(500), "internal error"));
        }

        let from = index(request, "fromIndex").max(1);
        let to = index(request, "toIndex");
        let last = to.min(self.total as i64);

        let rows: Vec<String> = (from..=last)
            .map(|i| {
                format!(
                    r#"{{"no":"{}","FL":[{{"val":"LEADID","content":"L{}"}},{{"val":"Company","content":"Company {}"}}]}}"#,
                    i - from + 1,
                    i,
                    i
                )
            })
            .collect();

        if rows.is_empty() {
            return Ok(r#"{"response":{"nodata":{"code":"4422","message":"There is no data to show"},"uri":"/crm/private/json/Leads/getRecords"}}"#.to_string());
        }

        Ok(format!(
            r#"{{"response":{{"uri":"/crm/private/json/Leads/getRecords","result":{{"Leads":{{"row":[{}]}}}}}}}}"#,
            rows.join(",")
        ))
    }
}

pub fn client_with(server: Arc<LeadsServer>) -> Client {
    Client::builder()
        .auth_token("test-token")
        .transport(server)
        .build()
        .unwrap()
}
