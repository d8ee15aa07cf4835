//! Data model types shared by the connector and the web facade.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// One user-specified query unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTarget {
    /// Correlates the result table with the request.
    #[serde(default)]
    pub ref_id: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub host: Option<String>,
    /// Metric path sent to the backend; also names the value column.
    #[serde(default)]
    pub query_text: String,
}

impl QueryTarget {
    pub fn new(ref_id: &str, application: &str, query_text: &str) -> Self {
        Self {
            ref_id: ref_id.to_string(),
            application: application.to_string(),
            host: None,
            query_text: query_text.to_string(),
        }
    }
}

/// A range boundary: epoch milliseconds or a date-math / RFC 3339 expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeBound {
    Millis(i64),
    Expr(String),
}

impl From<&str> for RangeBound {
    fn from(expr: &str) -> Self {
        RangeBound::Expr(expr.to_string())
    }
}

impl From<i64> for RangeBound {
    fn from(millis: i64) -> Self {
        RangeBound::Millis(millis)
    }
}

impl std::fmt::Display for RangeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeBound::Millis(ms) => write!(f, "{}", ms),
            RangeBound::Expr(expr) => f.write_str(expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: RangeBound,
    pub to: RangeBound,
}

impl TimeRange {
    pub fn new(from: impl Into<RangeBound>, to: impl Into<RangeBound>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A metric value as the backend sent it.
///
/// The controller reports some values as JSON strings; those stay strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricScalar {
    Number(serde_json::Number),
    Text(String),
}

impl From<i64> for MetricScalar {
    fn from(v: i64) -> Self {
        MetricScalar::Number(v.into())
    }
}

impl From<&str> for MetricScalar {
    fn from(v: &str) -> Self {
        MetricScalar::Text(v.to_string())
    }
}

/// A converted data point, serialized as `[value, startTimeInMillis]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint(pub MetricScalar, pub i64);

/// A filterable catalog entry such as an application or host name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub name: String,
}

impl NamedEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    Number,
}

/// Name and type of a result table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
}

/// Per-target time series: a `Time` column and a value column.
///
/// Always exactly two columns, even with zero rows. Rows keep the order in
/// which they were appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    ref_id: String,
    value_name: String,
    times: Vec<i64>,
    values: Vec<MetricScalar>,
}

impl ResultTable {
    pub const TIME_FIELD: &'static str = "Time";

    pub fn new(ref_id: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            value_name: value_name.into(),
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn append_row(&mut self, time: i64, value: MetricScalar) {
        self.times.push(time);
        self.values.push(value);
    }

    pub fn ref_id(&self) -> &str {
        &self.ref_id
    }

    pub fn fields(&self) -> [FieldSchema; 2] {
        [
            FieldSchema {
                name: Self::TIME_FIELD.to_string(),
                field_type: FieldType::Time,
            },
            FieldSchema {
                name: self.value_name.clone(),
                field_type: FieldType::Number,
            },
        ]
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn values(&self) -> &[MetricScalar] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[derive(Serialize)]
struct FieldRepr<'a, V: Serialize> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: FieldType,
    values: &'a [V],
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let time = FieldRepr {
            name: Self::TIME_FIELD,
            field_type: FieldType::Time,
            values: &self.times,
        };
        let value = FieldRepr {
            name: &self.value_name,
            field_type: FieldType::Number,
            values: &self.values,
        };

        let mut state = serializer.serialize_struct("ResultTable", 3)?;
        state.serialize_field("refId", &self.ref_id)?;
        state.serialize_field("fields", &(time, value))?;
        state.serialize_field("length", &self.len())?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Success,
    Failure,
}

/// Outcome of a connectivity check against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: String,
    pub title: String,
}
