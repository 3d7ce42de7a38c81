//! Question analysis models

use serde::{Deserialize, Serialize};

use super::OcrResult;

/// Body of `POST /api/question/analyze`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub ocr_result: OcrResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_note: Option<String>,
}

/// Response to a task submission that only carries the task ID
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: String,
}

/// Step-by-step solution produced by question analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,

    #[serde(default)]
    pub knowledge_points: Vec<String>,

    #[serde(default)]
    pub steps: Vec<SolutionStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One step of a worked solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionStep {
    /// 1-based step number
    pub step: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
}
