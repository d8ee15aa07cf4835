//! The AppDynamics data source.
//!
//! Turns query targets into controller REST requests and controller payloads
//! into result tables. Also answers health checks and name discovery.

mod convert;
mod filter;

pub use convert::*;
pub use filter::*;

use crate::config::DataSourceConfig;
use crate::models::{
    HealthCheckResult, HealthStatus, NamedEntity, QueryTarget, ResultTable, TimeRange,
};
use crate::request::RequestBuilder;
use crate::timeexpr::{resolve_millis, TimeResolver};
use crate::transport::{Transport, TransportError};

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;

/// Data source error types.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("query {ref_id:?} failed: {source}")]
    Transport {
        ref_id: String,
        #[source]
        source: TransportError,
    },
}

/// The surface a visualization host calls.
#[async_trait]
pub trait DataSourceApi: Send + Sync {
    /// One result table per target, in target order.
    async fn query(
        &self,
        range: &TimeRange,
        targets: &[QueryTarget],
    ) -> Result<Vec<ResultTable>, DataSourceError>;

    async fn check_health(&self) -> HealthCheckResult;
}

/// Connector to an AppDynamics controller.
pub struct DataSource {
    config: DataSourceConfig,
    requests: RequestBuilder,
    transport: Arc<dyn Transport>,
    resolver: Arc<dyn TimeResolver>,
}

impl DataSource {
    pub fn new(
        config: DataSourceConfig,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn TimeResolver>,
    ) -> Self {
        let requests = RequestBuilder::new(config.base_url());
        Self {
            config,
            requests,
            transport,
            resolver,
        }
    }

    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    async fn query_target(
        &self,
        target: &QueryTarget,
        start: i64,
        end: i64,
    ) -> Result<ResultTable, DataSourceError> {
        tracing::debug!(
            "Querying {:?} in application {:?} (host {:?})",
            target.query_text,
            target.application,
            target.host
        );

        let request = self
            .requests
            .metric_request(&target.application, &target.query_text, start, end);

        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|source| DataSourceError::Transport {
                ref_id: target.ref_id.clone(),
                source,
            })?;

        let mut table = ResultTable::new(target.ref_id.clone(), target.query_text.clone());
        for point in convert_series(&response.data) {
            table.append_row(point.1, point.0);
        }

        Ok(table)
    }

    /// Application names known to the controller, filtered by `query`.
    ///
    /// Any failure yields an empty list.
    pub async fn list_application_names(&self, query: &str) -> Vec<NamedEntity> {
        let request = self.requests.application_list_request();

        let response = match self.transport.execute(&request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Application listing failed: {}", e);
                return Vec::new();
            }
        };

        if !response.is_ok() {
            tracing::warn!(
                "Application listing returned status {}",
                status_label(response.status)
            );
            return Vec::new();
        }

        let entities: Vec<NamedEntity> = response
            .data
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("name")?.as_str().map(NamedEntity::new))
                    .collect()
            })
            .unwrap_or_default();

        filter_names(query, &entities)
    }

    /// Configured hosts, filtered by `query`.
    pub fn list_hosts(&self, query: &str) -> Vec<NamedEntity> {
        let hosts: Vec<NamedEntity> = self
            .config
            .hosts()
            .iter()
            .map(|h| NamedEntity::new(h.as_str()))
            .collect();
        filter_names(query, &hosts)
    }
}

#[async_trait]
impl DataSourceApi for DataSource {
    async fn query(
        &self,
        range: &TimeRange,
        targets: &[QueryTarget],
    ) -> Result<Vec<ResultTable>, DataSourceError> {
        let start = resolve_millis(self.resolver.as_ref(), &range.from);
        let end = resolve_millis(self.resolver.as_ref(), &range.to);

        // Any failed target fails the whole batch.
        let tables = try_join_all(
            targets
                .iter()
                .map(|target| self.query_target(target, start, end)),
        )
        .await?;

        tracing::info!(
            "Query {}..{}: {} targets, {} rows",
            start,
            end,
            tables.len(),
            tables.iter().map(ResultTable::len).sum::<usize>()
        );

        Ok(tables)
    }

    async fn check_health(&self) -> HealthCheckResult {
        let request = self.requests.application_list_request();

        let status = match self.transport.execute(&request).await {
            Ok(response) => response.status,
            Err(e) => {
                tracing::warn!("Health check request failed: {}", e);
                None
            }
        };

        if status == Some(200) {
            return HealthCheckResult {
                status: HealthStatus::Success,
                message: "Data source is working".to_string(),
                title: "Success".to_string(),
            };
        }

        HealthCheckResult {
            status: HealthStatus::Failure,
            message: format!("Data source is not working due to: {}", status_label(status)),
            title: "Failure".to_string(),
        }
    }
}

/// Status as shown to users; a missing status renders as `undefined`.
fn status_label(status: Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldType, MetricScalar, RangeBound};
    use crate::timeexpr::DateMath;
    use crate::transport::mock::MockTransport;
    use crate::transport::TransportResponse;

    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn fixed_resolver() -> Arc<DateMath> {
        Arc::new(DateMath::at(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()))
    }

    fn datasource(transport: Arc<MockTransport>) -> DataSource {
        let config = DataSourceConfig::new("http://example.com")
            .with_hosts(vec!["web-1".to_string(), "web-2".to_string(), "db-1".to_string()]);
        DataSource::new(config, transport, fixed_resolver())
    }

    fn metric_body(values: serde_json::Value) -> serde_json::Value {
        json!([{"metricName": "m", "metricValues": values}])
    }

    #[tokio::test]
    async fn test_query_builds_table() {
        let transport = Arc::new(MockTransport::replying(TransportResponse {
            status: None,
            data: metric_body(json!([{"value": 10, "startTimeInMillis": 20}])),
        }));
        let ds = datasource(transport.clone());

        let mut target = QueryTarget::new("A", "1", "metric");
        target.host = Some("1".to_string());
        let tables = assert_ok!(ds.query(&TimeRange::new("now-1h", "now"), &[target]).await);

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        let fields = table.fields();
        assert_eq!(fields[0].name, "Time");
        assert_eq!(fields[0].field_type, FieldType::Time);
        assert_eq!(fields[1].name, "metric");
        assert_eq!(fields[1].field_type, FieldType::Number);
        assert_eq!(table.len(), 1);
        assert_eq!(table.times(), [20]);
        assert_eq!(table.values(), [MetricScalar::from(10i64)]);
        assert_eq!(table.ref_id(), "A");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://example.com/controller/rest/applications/1/metric-data"
        );
        assert_eq!(requests[0].param_value("metric-path"), Some("metric"));
        assert_eq!(requests[0].param_value("start-time"), Some("1704067200000"));
        assert_eq!(requests[0].param_value("end-time"), Some("1704070800000"));
    }

    #[tokio::test]
    async fn test_query_preserves_target_order() {
        // Answer each metric path with a single point whose value is the path.
        let transport = Arc::new(MockTransport::new(|req| {
            let path = req.param_value("metric-path").unwrap_or_default().to_string();
            Ok(TransportResponse::new(
                200,
                metric_body(json!([{"value": path, "startTimeInMillis": 1}])),
            ))
        }));
        let ds = datasource(transport);

        let targets: Vec<QueryTarget> = ["c", "a", "b"]
            .iter()
            .map(|q| QueryTarget::new(q, "app", q))
            .collect();
        let tables = assert_ok!(ds.query(&TimeRange::new(0i64, 10i64), &targets).await);

        let refs: Vec<&str> = tables.iter().map(ResultTable::ref_id).collect();
        assert_eq!(refs, ["c", "a", "b"]);
        assert_eq!(tables[2].values(), [MetricScalar::from("b")]);
    }

    #[tokio::test]
    async fn test_query_keeps_backend_row_order_and_empty_tables() {
        let transport = Arc::new(MockTransport::new(|req| {
            let data = if req.param_value("metric-path") == Some("empty") {
                json!("<html>not json</html>")
            } else {
                metric_body(json!([
                    {"value": 3, "startTimeInMillis": 300},
                    {"value": 1, "startTimeInMillis": 100},
                    {"value": "2", "startTimeInMillis": 200}
                ]))
            };
            Ok(TransportResponse::new(200, data))
        }));
        let ds = datasource(transport);

        let targets = vec![QueryTarget::new("A", "app", "full"), QueryTarget::new("B", "app", "empty")];
        let tables = assert_ok!(ds.query(&TimeRange::new("now-1h", "now"), &targets).await);

        assert_eq!(tables[0].times(), [300, 100, 200]);
        assert_eq!(tables[0].values()[2], MetricScalar::from("2"));
        assert!(tables[1].is_empty());
        assert_eq!(tables[1].fields()[1].name, "empty");
    }

    #[tokio::test]
    async fn test_unresolvable_range_uses_zero() {
        let transport = Arc::new(MockTransport::replying(TransportResponse::new(200, json!([]))));
        let ds = datasource(transport.clone());

        let range = TimeRange {
            from: RangeBound::from("last tuesday"),
            to: RangeBound::Millis(5),
        };
        assert_ok!(ds.query(&range, &[QueryTarget::new("A", "app", "m")]).await);

        let requests = transport.requests();
        assert_eq!(requests[0].param_value("start-time"), Some("0"));
        assert_eq!(requests[0].param_value("end-time"), Some("5"));
    }

    #[tokio::test]
    async fn test_one_failed_target_fails_the_batch() {
        let transport = Arc::new(MockTransport::new(|req| {
            if req.param_value("metric-path") == Some("broken") {
                Err(TransportError::Timeout(Duration::from_secs(30)))
            } else {
                Ok(TransportResponse::new(200, json!([])))
            }
        }));
        let ds = datasource(transport);

        let targets = vec![QueryTarget::new("A", "app", "ok"), QueryTarget::new("B", "app", "broken")];
        let err = assert_err!(ds.query(&TimeRange::new("now-1h", "now"), &targets).await);

        let DataSourceError::Transport { ref_id, .. } = &err;
        assert_eq!(ref_id, "B");
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_query_with_no_targets() {
        let transport = Arc::new(MockTransport::replying(TransportResponse::new(200, json!([]))));
        let ds = datasource(transport.clone());

        let tables = assert_ok!(ds.query(&TimeRange::new("now-1h", "now"), &[]).await);
        assert!(tables.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_health_success() {
        let transport = Arc::new(MockTransport::replying(TransportResponse::new(200, json!([]))));
        let ds = datasource(transport.clone());

        assert_eq!(
            ds.check_health().await,
            HealthCheckResult {
                status: HealthStatus::Success,
                message: "Data source is working".to_string(),
                title: "Success".to_string(),
            }
        );
        assert_eq!(
            transport.requests()[0].url,
            "http://example.com/controller/rest/applications"
        );
    }

    #[tokio::test]
    async fn test_health_failure_status() {
        let transport = Arc::new(MockTransport::replying(TransportResponse::new(500, json!(null))));
        let ds = datasource(transport);

        assert_eq!(
            ds.check_health().await,
            HealthCheckResult {
                status: HealthStatus::Failure,
                message: "Data source is not working due to: 500".to_string(),
                title: "Failure".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_health_without_status() {
        let missing = Arc::new(MockTransport::replying(TransportResponse {
            status: None,
            data: json!(null),
        }));
        let result = datasource(missing).check_health().await;
        assert_eq!(result.status, HealthStatus::Failure);
        assert_eq!(result.message, "Data source is not working due to: undefined");

        let unreachable = Arc::new(MockTransport::new(|_| {
            Err(TransportError::Network("connection refused".to_string()))
        }));
        let result = datasource(unreachable).check_health().await;
        assert_eq!(result.message, "Data source is not working due to: undefined");
        assert_eq!(result.title, "Failure");
    }

    #[tokio::test]
    async fn test_list_application_names() {
        let transport = Arc::new(MockTransport::replying(TransportResponse::new(
            200,
            json!([{"name": "AppA", "id": 1}, {"name": "AppB", "id": 2}, {"id": 3}]),
        )));
        let ds = datasource(transport);

        assert_eq!(
            ds.list_application_names("").await,
            vec![NamedEntity::new("AppA"), NamedEntity::new("AppB")]
        );
        assert_eq!(ds.list_application_names("x|appb").await, vec![NamedEntity::new("AppB")]);
    }

    #[tokio::test]
    async fn test_list_application_names_failure_is_empty() {
        let failing = Arc::new(MockTransport::replying(TransportResponse::new(500, json!(null))));
        assert!(datasource(failing).list_application_names("").await.is_empty());

        let unreachable = Arc::new(MockTransport::new(|_| {
            Err(TransportError::Network("connection refused".to_string()))
        }));
        assert!(datasource(unreachable).list_application_names("").await.is_empty());

        let not_a_list = Arc::new(MockTransport::replying(TransportResponse::new(200, json!({"name": "x"}))));
        assert!(datasource(not_a_list).list_application_names("").await.is_empty());
    }

    #[test]
    fn test_list_hosts() {
        let transport = Arc::new(MockTransport::replying(TransportResponse::new(200, json!([]))));
        let ds = datasource(transport);

        assert_eq!(ds.list_hosts("").len(), 3);
        assert_eq!(
            ds.list_hosts("WEB"),
            vec![NamedEntity::new("web-1"), NamedEntity::new("web-2")]
        );
    }
}
