//! Data model: the bean catalog, finished metric values, the wire shapes of
//! the batched read, and the decoded attribute tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sink;

/// A pollable bean discovered from the bridge listing.
///
/// The name is `domain:beanProperties`; the attribute list keeps the order
/// the listing reported them in. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricBean {
    pub name: String,
    pub attributes: Vec<String>,
}

impl MetricBean {
    pub fn new(name: String, attributes: Vec<String>) -> Self {
        Self { name, attributes }
    }
}

/// One successfully read numeric leaf attribute, ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub name: String,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl MetricValue {
    /// Builds a value, gating the composed name through the sink's naming
    /// contract. A rejected name means this one metric is dropped, never
    /// the whole cycle.
    pub fn new(
        name: String,
        value: f64,
        timestamp_ms: i64,
    ) -> Result<Self, sink::InvalidMetricName> {
        sink::validate_metric_name(&name)?;
        Ok(Self {
            name,
            value,
            timestamp_ms,
        })
    }
}

/// One element of the batched read body. The bridge requires the `type`
/// discriminator on every bulk-request element.
#[derive(Debug, Serialize)]
pub struct ReadRequest {
    #[serde(rename = "type")]
    pub op: &'static str,
    pub mbean: String,
    pub attribute: Vec<String>,
}

impl From<&MetricBean> for ReadRequest {
    fn from(bean: &MetricBean) -> Self {
        Self {
            op: "read",
            mbean: bean.name.clone(),
            attribute: bean.attributes.clone(),
        }
    }
}

/// The request echo carried inside each response fragment. Correlation keys
/// off `mbean` here, never off array position.
#[derive(Debug, Deserialize)]
pub struct EchoedRequest {
    pub mbean: String,
}

/// One element of the bulk-read response, corresponding to one requested
/// bean. Consumed once during correlation.
#[derive(Debug, Deserialize)]
pub struct ReadResponseFragment {
    pub request: EchoedRequest,
    pub status: u16,
    #[serde(default)]
    pub value: Option<AttrValue>,
    /// Seconds since the epoch, as the bridge reports it.
    pub timestamp: i64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stacktrace: Option<String>,
}

/// An attribute value decoded once at the wire boundary, so the flattener
/// matches a closed set of shapes instead of re-probing JSON types.
///
/// `Other` swallows strings, booleans, nulls and arrays; none of those can
/// become a metric.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Branch(BTreeMap<String, AttrValue>),
    Other(serde_json::Value),
}

/// Result of one cycle's bulk read. Cycle-fatal conditions travel as `Err`
/// on the call itself; per-item problems accumulate here and never abort
/// the cycle.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub values: Vec<MetricValue>,
    pub skipped: Vec<SkipReason>,
}

/// Why a bean or a single metric sat out one cycle.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("bean '{bean}' answered status {status}: {}", .error.as_deref().unwrap_or("no error detail"))]
    BeanReadFailed {
        bean: String,
        status: u16,
        error: Option<String>,
    },
    #[error("metric '{name}' from bean '{bean}' dropped: {reason}")]
    NameRejected {
        bean: String,
        name: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metric_value_rejects_forbidden_names() {
        assert!(MetricValue::new("jvm.heap.used".to_string(), 1.0, 0).is_ok());
        assert!(MetricValue::new(String::new(), 1.0, 0).is_err());
        assert!(MetricValue::new("jvm.he ap".to_string(), 1.0, 0).is_err());
        assert!(MetricValue::new("jvm..heap".to_string(), 1.0, 0).is_err());
    }

    #[test]
    fn read_request_serializes_with_type_discriminator() {
        let bean = MetricBean::new(
            "java.lang:type=Memory".to_string(),
            vec!["HeapMemoryUsage".to_string()],
        );
        let body = serde_json::to_value(ReadRequest::from(&bean)).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "read",
                "mbean": "java.lang:type=Memory",
                "attribute": ["HeapMemoryUsage"]
            })
        );
    }

    #[test]
    fn attr_value_decodes_into_closed_variants() {
        let decoded: AttrValue =
            serde_json::from_value(json!({"used": 42, "label": "heap", "inner": {"max": 1.5}}))
                .unwrap();
        let AttrValue::Branch(tree) = decoded else {
            panic!("expected a branch");
        };
        assert_eq!(tree["used"], AttrValue::Number(42.0));
        assert_eq!(tree["inner"], AttrValue::Branch(BTreeMap::from([(
            "max".to_string(),
            AttrValue::Number(1.5),
        )])));
        assert!(matches!(tree["label"], AttrValue::Other(_)));
    }
}
