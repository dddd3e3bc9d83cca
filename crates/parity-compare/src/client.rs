//! HTTP transport for dual dispatch

use crate::error::TransportError;
use async_trait::async_trait;
use parity_core::{Method, Params};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One call to one target
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: Params,
}

/// Sends a request and returns the parsed JSON body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<Value, TransportError>;
}

/// [`Transport`] over a shared reqwest connection pool
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                after: self.timeout,
            }
        } else {
            TransportError::Request(error)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<Value, TransportError> {
        let url = request.url.as_str();
        let builder = match &request.method {
            Method::Get => self.client.get(url).query(&query_pairs(&request.params)),
            Method::Post => self.client.post(url).json(&request.params),
            Method::Put => self.client.put(url).json(&request.params),
            Method::Delete => self.client.delete(url).json(&request.params),
            Method::Other(method) => {
                return Err(TransportError::UnsupportedMethod {
                    method: method.clone(),
                })
            }
        };
        let builder = request
            .headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name, value));

        debug!("{} {}", request.method, url);
        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let raw_body = response.text().await.map_err(|e| self.classify(e))?;

        // Status is not checked: error payloads are compared like any other body
        serde_json::from_str(&raw_body).map_err(|e| TransportError::InvalidBody {
            status: status.as_u16(),
            reason: e.to_string(),
        })
    }
}

/// Query-string pairs for a parameter mapping.
///
/// Strings go verbatim, other scalars as JSON text, `null` is dropped,
/// sequences repeat the key and nested mappings are sent as JSON text.
pub fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = query_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = query_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
