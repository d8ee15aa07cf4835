//! AppDynamics data source.
//!
//! Translates time-series queries into AppDynamics controller REST requests
//! and normalizes the controller's metric payloads into result tables.

pub mod config;
pub mod datasource;
pub mod models;
pub mod request;
pub mod timeexpr;
pub mod transport;
pub mod web;

pub use config::{DataSourceConfig, ServerConfig};
pub use datasource::{DataSource, DataSourceApi, DataSourceError};
pub use models::*;
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
