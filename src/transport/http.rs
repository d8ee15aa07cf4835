//! reqwest-backed transport.

use super::{Transport, TransportError, TransportResponse};
use crate::config::DataSourceConfig;
use crate::request::{Method, RequestDescriptor};

use async_trait::async_trait;
use std::time::Duration;

/// Production transport using a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    pub fn new(config: &DataSourceConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        let credentials = config
            .username()
            .map(|user| (user.to_string(), config.password().unwrap_or_default().to_string()));

        Ok(Self {
            client,
            timeout: config.timeout(),
            credentials,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
        };

        builder = builder.query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        tracing::debug!("{} -> {} ({} bytes)", request.url, status, body.len());

        Ok(TransportResponse::new(status, decode_body(body)))
    }
}

/// Decode a body as JSON, keeping non-JSON text as a JSON string.
fn decode_body(body: String) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body))
}
