use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quota use over one rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub utilization_percent: f64,
    pub resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub five_hour: UsageWindow,
    pub seven_day: UsageWindow,
}

/// Fetches quota usage for a bearer token.
///
/// Any failure (network, timeout, unexpected response) is `None`; the
/// monitor never depends on it for correctness.
#[async_trait]
pub trait UsageSource: Send + Sync {
    async fn fetch_usage(&self, access_token: &str) -> Option<UsageReport>;
}
