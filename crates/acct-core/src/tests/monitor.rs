use crate::tests::{Fixture, make_jwt};
use crate::{Monitor, MonitorState, UsageReport, UsageSource, UsageWindow};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

const TICK: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(5);

struct RecordingUsage {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl UsageSource for RecordingUsage {
    async fn fetch_usage(&self, access_token: &str) -> Option<UsageReport> {
        self.seen.lock().unwrap().push(access_token.to_string());
        Some(UsageReport {
            five_hour: UsageWindow {
                utilization_percent: 42.5,
                resets_at: None,
            },
            seven_day: UsageWindow {
                utilization_percent: 7.0,
                resets_at: None,
            },
        })
    }
}

struct FailingUsage;

#[async_trait]
impl UsageSource for FailingUsage {
    async fn fetch_usage(&self, _access_token: &str) -> Option<UsageReport> {
        None
    }
}

#[tokio::test]
async fn given_new_monitor_when_stop_then_stays_stopped() {
    let fixture = Fixture::new();
    let monitor = Monitor::new(fixture.engine(), TICK);

    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(monitor.stop().await, MonitorState::Stopped);
}

#[tokio::test]
async fn given_started_monitor_when_started_again_then_still_running_once() {
    let fixture = Fixture::new();
    let monitor = Monitor::new(fixture.engine(), TICK);

    assert_eq!(monitor.start().await, MonitorState::Running);
    assert_eq!(monitor.start().await, MonitorState::Running);
    assert_eq!(monitor.stop().await, MonitorState::Stopped);
    assert_eq!(monitor.state(), MonitorState::Stopped);
}

#[tokio::test]
async fn given_running_monitor_when_saved_account_is_live_then_snapshot_published() {
    let fixture = Fixture::new();
    fixture.login("sub-alice", "alice@example.com");
    fixture.engine().save_current().unwrap();
    let monitor = Monitor::new(fixture.engine(), TICK);
    let mut snapshots = monitor.subscribe();

    monitor.start().await;
    let snapshot = tokio::time::timeout(WAIT, snapshots.wait_for(Option::is_some))
        .await
        .unwrap()
        .unwrap()
        .clone()
        .unwrap();
    monitor.stop().await;

    let status = snapshot.status.unwrap();
    assert_eq!(status.live_account, Some(1));
    assert!(!status.pointer_stale);
    assert!(snapshot.usage.is_none());
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn given_usage_source_when_refresh_then_called_with_live_token() {
    let fixture = Fixture::new();
    fixture.login("sub-bob", "bob@example.com");
    let usage = Arc::new(RecordingUsage {
        seen: Mutex::new(Vec::new()),
    });
    let monitor = Monitor::new(fixture.engine(), TICK).with_usage_source(usage.clone());

    let snapshot = monitor.refresh_now().await;

    let expected = make_jwt(&json!({ "sub": "sub-bob", "email": "bob@example.com" }));
    assert_eq!(*usage.seen.lock().unwrap(), vec![expected]);
    assert_eq!(snapshot.usage.unwrap().five_hour.utilization_percent, 42.5);
    assert_eq!(monitor.subscribe().borrow().as_ref().map(|s| s.refreshed_at), Some(snapshot.refreshed_at));
}

#[tokio::test]
async fn given_failing_usage_source_when_refresh_then_usage_absent_not_error() {
    let fixture = Fixture::new();
    fixture.login("sub-bob", "bob@example.com");
    let monitor = Monitor::new(fixture.engine(), TICK).with_usage_source(Arc::new(FailingUsage));

    let snapshot = monitor.refresh_now().await;

    assert!(snapshot.usage.is_none());
    assert!(snapshot.error.is_none());
    assert!(snapshot.status.is_some());
}

#[tokio::test]
async fn given_no_live_credential_when_refresh_then_usage_source_not_called() {
    let fixture = Fixture::new();
    let usage = Arc::new(RecordingUsage {
        seen: Mutex::new(Vec::new()),
    });
    let monitor = Monitor::new(fixture.engine(), TICK).with_usage_source(usage.clone());

    let snapshot = monitor.refresh_now().await;

    assert!(usage.seen.lock().unwrap().is_empty());
    assert_eq!(snapshot.status.unwrap().live_account, None);
}
