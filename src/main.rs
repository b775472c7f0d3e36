//! beanpoll - polls MBean attributes through a Jolokia-style HTTP bridge,
//! flattens the nested attribute trees into dotted metric paths, and hands
//! the numeric values to a metrics sink.
//!
//! One cycle = bean discovery, then a single batched attribute read. Both
//! calls go through the bounded-retry wrapper; a cycle that exhausts its
//! retries is logged and the next tick starts clean.

mod client;
mod config;
mod flatten;
mod model;
mod retry;
mod sink;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::interval;
use tracing::{error, info, warn};

use client::BridgeClient;
use config::PollerConfig;
use model::PollOutcome;
use retry::{execute_with_retry, RetryError};
use sink::{LogSink, MetricsSink};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let config = PollerConfig::load()
        .await
        .context("Failed to load configuration")?;
    info!("beanpoll starting against {}", config.bridge.url);

    let client = BridgeClient::new(&config.bridge).context("Failed to build bridge client")?;
    let mut sink = LogSink;

    let mut ticker = interval(Duration::from_secs(config.poll.interval_secs));
    loop {
        ticker.tick().await;

        match poll_cycle(&client, &config).await {
            Ok(outcome) => {
                if !outcome.skipped.is_empty() {
                    warn!("{} items skipped this cycle", outcome.skipped.len());
                }
                info!("cycle produced {} metrics", outcome.values.len());
                if let Err(e) = sink.report(&outcome.values) {
                    error!("sink rejected cycle output: {}", e);
                }
            }
            // the next tick starts clean; no failure state carries over
            Err(e) => error!("poll cycle failed: {}", e),
        }
    }
}

/// Discovery, then the batched read, each behind the retry wrapper.
async fn poll_cycle(
    client: &BridgeClient,
    config: &PollerConfig,
) -> Result<PollOutcome, RetryError> {
    let delay = Duration::from_secs(config.retry.delay_secs);
    let attempts = config.retry.max_attempts;

    let beans = execute_with_retry(|| client.list_beans(), attempts, delay).await?;
    info!("discovered {} pollable beans", beans.len());

    execute_with_retry(|| client.read_metrics(&beans), attempts, delay).await
}
