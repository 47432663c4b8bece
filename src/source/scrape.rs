//! Scrape source for Prometheus text exposition endpoints.

use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use prometheus_parse::{Scrape, Value};

use crate::config::{MetricSelector, SourceConfig};
use crate::evaluator::Sample;
use crate::source::{CounterSource, SourceError};

/// Reads success and total counters from a metrics endpoint.
pub struct ScrapeSource {
    name: String,
    url: String,
    client: reqwest::Client,
    success: MetricSelector,
    total: MetricSelector,
}

impl ScrapeSource {
    /// Create a scrape source. `timeout` bounds each HTTP request.
    pub fn new(config: &SourceConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("health-alerter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name: config.name.clone(),
            url: config.url.clone(),
            client,
            success: config.success.clone(),
            total: config.total.clone(),
        })
    }

    async fn scrape(&self) -> Result<Scrape, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_exposition(&body)
    }
}

#[async_trait]
impl CounterSource for ScrapeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Sample, SourceError> {
        let scrape = self.scrape().await?;
        let successful_count = sum_selector(&scrape, &self.success)?;
        let total_count = sum_selector(&scrape, &self.total)?;

        tracing::trace!(
            source = %self.name,
            successful_count,
            total_count,
            "Scraped counters"
        );

        Ok(Sample::new(Utc::now(), successful_count, total_count))
    }
}

/// Parse exposition text.
pub fn parse_exposition(body: &str) -> Result<Scrape, SourceError> {
    let lines = body.lines().map(|s| Ok(s.to_owned()));
    Scrape::parse(lines).map_err(|e| SourceError::Parse(e.to_string()))
}

/// Sum every series matching `selector`.
pub fn sum_selector(scrape: &Scrape, selector: &MetricSelector) -> Result<u64, SourceError> {
    let mut matched = false;
    let mut sum = 0.0;

    for sample in scrape.samples.iter().filter(|s| s.metric == selector.metric) {
        let labels_match = selector
            .labels
            .iter()
            .all(|(name, value)| sample.labels.get(name).is_some_and(|actual| actual == value.as_str()));
        if !labels_match {
            continue;
        }

        let value = match sample.value {
            Value::Counter(v) | Value::Gauge(v) | Value::Untyped(v) => v,
            _ => {
                return Err(SourceError::Parse(format!(
                    "{} is not a counter",
                    selector.metric
                )))
            }
        };
        if !value.is_finite() || value < 0.0 {
            return Err(SourceError::Parse(format!(
                "{} has invalid value {}",
                selector.metric, value
            )));
        }

        matched = true;
        sum += value;
    }

    if !matched {
        return Err(SourceError::MetricMissing(describe(selector)));
    }
    Ok(sum.round() as u64)
}

fn describe(selector: &MetricSelector) -> String {
    if selector.labels.is_empty() {
        return selector.metric.clone();
    }
    let labels: Vec<String> = selector
        .labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    format!("{}{{{}}}", selector.metric, labels.join(","))
}
