//! The two independent signals that tell us the backend can serve requests.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::config::BackendConfig;

/// Which signal resolved startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessSignal {
    LogMarker,
    HealthProbe,
}

impl ReadinessSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessSignal::LogMarker => "log marker",
            ReadinessSignal::HealthProbe => "health probe",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub marker: String,
    pub health_url: String,
    pub probe_delay: Duration,
    pub probe_interval: Duration,
    pub startup_timeout: Duration,
}

impl ReadinessConfig {
    pub fn from_backend(config: &BackendConfig) -> Self {
        Self {
            marker: config.readiness_marker.clone(),
            health_url: config.health_url(),
            probe_delay: Duration::from_millis(config.probe_delay_ms),
            probe_interval: Duration::from_millis(config.probe_interval_ms),
            startup_timeout: Duration::from_millis(config.startup_timeout_ms),
        }
    }

    pub fn is_marker(&self, line: &str) -> bool {
        !self.marker.is_empty() && line.contains(&self.marker)
    }
}

/// Repeating `GET` against the health endpoint.
pub struct HealthProbe {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl HealthProbe {
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        // A probe that hangs would starve the next tick; cap each attempt.
        let client = reqwest::Client::builder()
            .timeout(interval.max(Duration::from_secs(2)))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.into(),
            interval,
        }
    }

    /// One attempt. Only a 200 counts.
    pub async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("Health probe {} failed: {}", self.url, e);
                false
            }
        }
    }

    /// Resolves on the first healthy response. Never returns otherwise; the
    /// caller bounds it with a deadline and drops it to cancel.
    pub async fn wait_until_healthy(&self, initial_delay: Duration) {
        sleep(initial_delay).await;
        loop {
            if self.check().await {
                return;
            }
            sleep(self.interval).await;
        }
    }
}
