//! Asynchronous task models

use serde::{Deserialize, Deserializer, Serialize};

/// Server-side task status
///
/// `completed` and `failed` are terminal; the server never moves a task out
/// of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[serde(alias = "pending", alias = "queued")]
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a task, as returned by a result endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot<R> {
    pub task_id: String,

    pub status: TaskStatus,

    /// Completion percentage, clamped to 0-100
    #[serde(
        default,
        deserialize_with = "clamped_progress",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<R> TaskSnapshot<R> {
    /// A non-terminal snapshot
    pub fn processing(task_id: impl Into<String>, progress: Option<u8>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Processing,
            progress,
            result: None,
            error: None,
        }
    }

    /// A completed snapshot holding its result
    pub fn completed(task_id: impl Into<String>, result: R) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            progress: Some(100),
            result: Some(result),
            error: None,
        }
    }

    /// A failed snapshot holding the server's error text
    #[cfg(test)]
    pub fn failed(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            progress: None,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Progress notification delivered after each poll attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskUpdate {
    /// 1-based attempt number
    pub attempt: u32,
    pub status: TaskStatus,
    pub progress: Option<u8>,
}

fn clamped_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.map(|p| p.clamp(0.0, 100.0).round() as u8))
}
