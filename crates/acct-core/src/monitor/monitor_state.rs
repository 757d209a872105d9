use serde::Serialize;

/// Lifecycle of the background refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// No task is running
    Stopped,
    /// Task is refreshing on its interval
    Running,
    /// Stop requested, waiting for the task to finish
    Stopping,
}
