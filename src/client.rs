//! Bridge protocol client: bean discovery over `GET /list` and batched
//! attribute reads over `POST /read`.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::config::BridgeConfig;
use crate::flatten::flatten;
use crate::model::{
    AttrValue, MetricBean, MetricValue, PollOutcome, ReadRequest, ReadResponseFragment,
    SkipReason,
};
use crate::sink::sanitize_metric_name;

/// Cycle-fatal bridge failures. Per-bean and per-metric problems never show
/// up here; they travel in [`PollOutcome::skipped`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed listing beans from bridge: {0}")]
    Discovery(String),
    #[error("failed reading beans from bridge: {0}")]
    Read(String),
    #[error("unexpected bridge response: {0}")]
    Protocol(String),
}

/// Shared, long-lived client for one bridge endpoint. `reqwest` pools the
/// underlying connections, so sequential cycles reuse them; timeouts are
/// fixed at construction and surface as transport failures.
pub struct BridgeClient {
    base_url: String,
    http: reqwest::Client,
}

impl BridgeClient {
    pub fn new(config: &BridgeConfig) -> anyhow::Result<Self> {
        let mut base_url = config.url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()?;
        Ok(Self { base_url, http })
    }

    /// Lists every pollable bean the bridge knows about.
    ///
    /// `canonicalNaming=false` keeps bean identifiers stable across polls
    /// instead of letting the remote reorder property lists.
    pub async fn list_beans(&self) -> Result<Vec<MetricBean>, BridgeError> {
        let url = format!("{}list?canonicalNaming=false", self.base_url);
        debug!("retrieving bean listing from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BridgeError::Discovery(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BridgeError::Discovery(format!(
                "listing returned HTTP {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Protocol(format!("unreadable listing body: {e}")))?;

        let domains = body
            .get("value")
            .and_then(Value::as_object)
            .ok_or_else(|| BridgeError::Protocol("list response has no 'value' tree".to_string()))?;

        Ok(extract_metric_beans(domains))
    }

    /// Reads every attribute of every catalogued bean in one batched call.
    ///
    /// `ignoreErrors=true` makes the remote answer one fragment per request
    /// even when individual beans fail, so a bad bean costs its own values
    /// and nothing else.
    pub async fn read_metrics(&self, beans: &[MetricBean]) -> Result<PollOutcome, BridgeError> {
        let requests: Vec<ReadRequest> = beans.iter().map(ReadRequest::from).collect();
        let url = format!("{}read?ignoreErrors=true&canonicalNaming=false", self.base_url);
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(
                "bulk read request body: {}",
                serde_json::to_string(&requests).unwrap_or_default()
            );
        }

        let response = self
            .http
            .post(&url)
            .json(&requests)
            .send()
            .await
            .map_err(|e| BridgeError::Read(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BridgeError::Read(format!(
                "bulk read returned HTTP {}",
                response.status()
            )));
        }
        let fragments: Vec<ReadResponseFragment> = response
            .json()
            .await
            .map_err(|e| BridgeError::Protocol(format!("unreadable bulk read body: {e}")))?;

        Ok(collect_metric_values(fragments))
    }
}

/// Walks the `domain -> beanProperties -> attr` listing tree and emits one
/// catalog entry per bean that actually exposes attributes. Entries without
/// a non-empty `attr` map are structural-only and skipped silently.
fn extract_metric_beans(domains: &serde_json::Map<String, Value>) -> Vec<MetricBean> {
    let mut beans = Vec::new();
    for (domain, entry) in domains {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        for (properties, mbean) in entry {
            match mbean.get("attr").and_then(Value::as_object) {
                Some(attrs) if !attrs.is_empty() => {
                    beans.push(MetricBean::new(
                        format!("{domain}:{properties}"),
                        attrs.keys().cloned().collect(),
                    ));
                }
                _ => {}
            }
        }
    }
    beans
}

/// Correlates response fragments against their originating beans and turns
/// successful ones into timestamped metric values.
///
/// The bean name always comes from the fragment's embedded request echo;
/// the transport is free to reorder the response array. The batch-level
/// HTTP status and the per-fragment `status` are distinct channels: a
/// non-200 fragment only sidelines its own bean for this cycle.
fn collect_metric_values(fragments: Vec<ReadResponseFragment>) -> PollOutcome {
    let mut outcome = PollOutcome::default();
    for fragment in fragments {
        let bean = fragment.request.mbean;
        if fragment.status != 200 {
            warn!(
                "failed reading mbean '{}': {} - {}",
                bean,
                fragment.status,
                fragment.error.as_deref().unwrap_or("no error detail")
            );
            if let Some(stacktrace) = &fragment.stacktrace {
                debug!("stacktrace for '{}': {}", bean, stacktrace);
            }
            outcome.skipped.push(SkipReason::BeanReadFailed {
                bean,
                status: fragment.status,
                error: fragment.error,
            });
            continue;
        }

        let timestamp_ms = fragment.timestamp * 1000;
        let tree = match fragment.value {
            Some(AttrValue::Branch(tree)) => tree,
            other => {
                warn!(
                    "mbean '{}' answered 200 without an attribute tree: {:?}",
                    bean, other
                );
                continue;
            }
        };

        let prefix = sanitize_metric_name(&bean, true);
        for (suffix, value) in flatten(&tree) {
            let name = format!("{prefix}.{suffix}");
            match MetricValue::new(name.clone(), value, timestamp_ms) {
                Ok(metric) => outcome.values.push(metric),
                Err(e) => {
                    info!("dropping invalid metric from '{}': {}", bean, e);
                    outcome.skipped.push(SkipReason::NameRejected {
                        bean: bean.clone(),
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
    outcome
}
