//! Transport layer between the connector and the metric backend.
//!
//! The connector only builds request descriptors; a `Transport` turns them
//! into HTTP exchanges.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::*;

use crate::request::RequestDescriptor;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Transport error types.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("client setup failed: {0}")]
    Client(String),
}

/// A completed exchange. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// `None` when the transport could not determine a status.
    pub status: Option<u16>,
    /// Decoded JSON body, or the raw text as a JSON string when it was not JSON.
    pub data: serde_json::Value,
}

impl TransportResponse {
    pub fn new(status: u16, data: serde_json::Value) -> Self {
        Self {
            status: Some(status),
            data,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }
}

/// Executes request descriptors.
///
/// Implementations resolve for every HTTP status and fail only when no
/// response was obtained at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError>;
}
