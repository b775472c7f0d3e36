//! Metrics-sink seam: the naming contract every outgoing metric must pass,
//! and the trait the poller hands finished values to.
//!
//! The Graphite/carbon wire client is an external collaborator; this crate
//! only depends on its sanitization rules and on [`MetricsSink`].

use tracing::info;

use crate::model::MetricValue;

/// A metric name the downstream naming scheme would refuse.
#[derive(Debug, thiserror::Error)]
#[error("invalid metric name: {0}")]
pub struct InvalidMetricName(pub String);

/// Normalizes one raw name segment for the downstream naming scheme.
///
/// `keep_dot = true` preserves literal dots already present in a bean
/// identifier (`java.lang:type=Memory` keeps its domain dots); attribute
/// keys pass `keep_dot = false` so stray dots become underscores instead of
/// fake hierarchy.
pub fn sanitize_metric_name(raw: &str, keep_dot: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' | '\'' | '*' | '?' => {}
            ':' | ',' => out.push('.'),
            '=' => out.push('_'),
            ' ' => out.push('-'),
            '.' if !keep_dot => out.push('_'),
            c => out.push(c),
        }
    }
    out
}

/// Final gate applied when a [`MetricValue`] is built: non-empty, charset
/// limited to `[A-Za-z0-9._-]`, no empty dotted segments.
pub fn validate_metric_name(name: &str) -> Result<(), InvalidMetricName> {
    if name.is_empty() {
        return Err(InvalidMetricName("name is empty".to_string()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-'))
    {
        return Err(InvalidMetricName(format!(
            "character '{c}' is not allowed in '{name}'"
        )));
    }
    if name.split('.').any(str::is_empty) {
        return Err(InvalidMetricName(format!(
            "empty path segment in '{name}'"
        )));
    }
    Ok(())
}

/// Where finished metric values go at the end of a cycle.
pub trait MetricsSink {
    fn report(&mut self, values: &[MetricValue]) -> anyhow::Result<()>;
}

/// Sink that writes each value to the log, standing in for the Graphite
/// transport.
#[derive(Debug, Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn report(&mut self, values: &[MetricValue]) -> anyhow::Result<()> {
        for metric in values {
            info!("{} {} {}", metric.name, metric.value, metric.timestamp_ms);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_maps_bean_separators_onto_path_chars() {
        assert_eq!(
            sanitize_metric_name("java.lang:type=Memory", true),
            "java.lang.type_Memory"
        );
        assert_eq!(
            sanitize_metric_name("java.lang:type=GarbageCollector,name=PS Scavenge", true),
            "java.lang.type_GarbageCollector.name_PS-Scavenge"
        );
    }

    #[test]
    fn sanitize_escapes_dots_in_attribute_keys() {
        assert_eq!(sanitize_metric_name("rate.per.sec", false), "rate_per_sec");
        assert_eq!(sanitize_metric_name("\"quoted\"", false), "quoted");
    }

    #[test]
    fn validation_rejects_out_of_charset_names() {
        assert!(validate_metric_name("jvm.heap.used").is_ok());
        assert!(validate_metric_name("").is_err());
        assert!(validate_metric_name("jvm.he%p").is_err());
        assert!(validate_metric_name(".leading").is_err());
        assert!(validate_metric_name("double..dot").is_err());
    }
}
