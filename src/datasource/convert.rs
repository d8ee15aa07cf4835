//! Conversion of controller metric payloads into data points.

use crate::models::{MetricPoint, MetricScalar};

use serde_json::Value;

/// Extract `[value, startTimeInMillis]` pairs from a full response envelope
/// (`{"status": .., "data": [..]}`).
///
/// Never fails: anything that does not have the expected shape yields an
/// empty list.
pub fn convert_metric_data(response: &Value) -> Vec<MetricPoint> {
    match response.get("data") {
        Some(data) => convert_series(data),
        None => Vec::new(),
    }
}

/// Extract data points from the `data` array of a metric response.
///
/// Only the first series is read.
pub fn convert_series(data: &Value) -> Vec<MetricPoint> {
    let Some(series) = data.as_array() else {
        return Vec::new();
    };

    if series.len() > 1 {
        tracing::debug!("Metric response has {} series; ignoring all but the first", series.len());
    }

    let Some(values) = series
        .first()
        .and_then(|s| s.get("metricValues"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    values
        .iter()
        .filter_map(|entry| {
            let point = to_point(entry);
            if point.is_none() {
                tracing::debug!("Skipping malformed metric value: {}", entry);
            }
            point
        })
        .collect()
}

fn to_point(entry: &Value) -> Option<MetricPoint> {
    let value = match entry.get("value")? {
        Value::Number(n) => MetricScalar::Number(n.clone()),
        Value::String(s) => MetricScalar::Text(s.clone()),
        _ => return None,
    };

    let start = entry.get("startTimeInMillis")?;
    let timestamp = start
        .as_i64()
        .or_else(|| start.as_f64().map(|f| f.ceil() as i64))?;

    Some(MetricPoint(value, timestamp))
}
