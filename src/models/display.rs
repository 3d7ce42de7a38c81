//! Display model implementations for table and JSON output
//!
//! Display models transform API response types into CLI-friendly formats
//! with appropriate column names and serialization.

use serde::Serialize;
use tabled::Tabled;

use crate::client::models::{OcrResult, SolutionStep, TaskSnapshot, User};

/// Signed-in user display model.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct UserDisplay {
    #[tabled(rename = "USER ID")]
    pub id: String,

    #[tabled(rename = "USERNAME")]
    pub username: String,

    #[tabled(rename = "EMAIL")]
    pub email: String,

    #[tabled(rename = "ROLE")]
    pub role: String,
}

impl From<&User> for UserDisplay {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone().unwrap_or_else(|| "--".to_string()),
            role: user.role.clone().unwrap_or_else(|| "--".to_string()),
        }
    }
}

/// One solution step as a table row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct StepDisplay {
    #[tabled(rename = "#")]
    pub step: u32,

    #[tabled(rename = "TITLE")]
    pub title: String,

    #[tabled(rename = "WORKING")]
    pub content: String,

    #[tabled(rename = "MATH")]
    pub latex: String,
}

impl From<&SolutionStep> for StepDisplay {
    fn from(step: &SolutionStep) -> Self {
        Self {
            step: step.step,
            title: step.title.clone().unwrap_or_default(),
            content: step.content.clone(),
            latex: step.latex.clone().unwrap_or_default(),
        }
    }
}

/// Recognized text with its confidence.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct OcrDisplay {
    #[tabled(rename = "TEXT")]
    pub text: String,

    #[tabled(rename = "LATEX")]
    pub latex: String,

    #[tabled(rename = "CONFIDENCE")]
    pub confidence: String,
}

impl From<&OcrResult> for OcrDisplay {
    fn from(ocr: &OcrResult) -> Self {
        Self {
            text: ocr.text.clone(),
            latex: ocr.latex.clone().unwrap_or_else(|| "--".to_string()),
            confidence: format!("{:.0}%", ocr.confidence * 100.0),
        }
    }
}

/// Task state for a single poll.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct TaskDisplay {
    #[tabled(rename = "TASK ID")]
    pub task_id: String,

    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "PROGRESS")]
    pub progress: String,

    #[tabled(rename = "ERROR")]
    pub error: String,
}

impl<R> From<&TaskSnapshot<R>> for TaskDisplay {
    fn from(snapshot: &TaskSnapshot<R>) -> Self {
        Self {
            task_id: snapshot.task_id.clone(),
            status: snapshot.status.to_string(),
            progress: snapshot
                .progress
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "--".to_string()),
            error: snapshot.error.clone().unwrap_or_default(),
        }
    }
}
