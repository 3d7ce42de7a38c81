//! Analyze command: submit a question and wait for the solution

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::progress::TaskProgress;
use crate::cli::{CommandContext, OutputFormat, PollArgs, ocr};
use crate::client::models::{AnalysisResult, AnalyzeRequest, OcrResult, TaskStatus};
use crate::error::{ApiError, Result};
use crate::models::StepDisplay;
use crate::output::{self, table};

/// Where the question text comes from
#[derive(Debug, Clone)]
pub enum QuestionSource {
    Image(PathBuf),
    Text(String),
    OcrTask(String),
}

/// Optional hints sent along with the question
#[derive(Debug, Clone, Default)]
pub struct Hints {
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub note: Option<String>,
}

/// Run the analyze command
pub async fn run(
    ctx: &CommandContext,
    source: QuestionSource,
    hints: Hints,
    no_wait: bool,
    poll: &PollArgs,
) -> Result<()> {
    let ocr_result = question_text(ctx, source, poll).await?;

    let request = AnalyzeRequest {
        ocr_result,
        subject_hint: hints.subject,
        grade_hint: hints.grade,
        user_note: hints.note,
    };
    let task_id = ctx.client.analyze(&request).await?.task_id;

    if no_wait {
        return ocr::print_submitted(ctx.format, &task_id);
    }

    let options = ctx.poll_options(poll);
    let progress = TaskProgress::new("Solving", options.max_attempts, ctx.format);
    let result = ctx
        .client
        .wait_for_analysis(&task_id, options, &ctx.cancel, &mut |u| progress.update(u))
        .await;
    progress.finish();

    render(ctx.format, &task_id, &result?)
}

/// Resolve the question source to recognized text
async fn question_text(
    ctx: &CommandContext,
    source: QuestionSource,
    poll: &PollArgs,
) -> Result<OcrResult> {
    match source {
        QuestionSource::Image(path) => {
            let (_, ocr) = ocr::recognize(ctx, &path, poll).await?;
            Ok(ocr)
        }
        QuestionSource::Text(text) => {
            if text.trim().is_empty() {
                return Err(ApiError::Validation("Question text must not be empty".into()).into());
            }
            Ok(OcrResult {
                latex: None,
                confidence: 1.0,
                text,
            })
        }
        QuestionSource::OcrTask(task_id) => {
            let snapshot = ctx.client.ocr_result(&task_id).await?;
            match (snapshot.status, snapshot.result) {
                (TaskStatus::Completed, Some(result)) => Ok(result),
                (TaskStatus::Failed, _) => Err(ApiError::TaskFailed {
                    task_id,
                    message: snapshot
                        .error
                        .unwrap_or_else(|| "Task failed without details".to_string()),
                }
                .into()),
                (status, _) => Err(ApiError::Validation(format!(
                    "OCR task {} has no result yet (status: {})",
                    task_id, status
                ))
                .into()),
            }
        }
    }
}

/// Print a solution
pub fn render(format: OutputFormat, task_id: &str, analysis: &AnalysisResult) -> Result<()> {
    let steps: Vec<StepDisplay> = analysis.steps.iter().map(StepDisplay::from).collect();

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "taskId": task_id,
            "result": analysis,
        })),
        OutputFormat::Table => output::print(&steps, format),
        OutputFormat::Pretty => {
            let mut details = vec![("Task", task_id.to_string())];
            if let Some(ref subject) = analysis.subject {
                details.push(("Subject", subject.clone()));
            }
            if let Some(ref kind) = analysis.question_type {
                details.push(("Type", kind.clone()));
            }
            if !analysis.knowledge_points.is_empty() {
                details.push(("Covers", analysis.knowledge_points.join(", ")));
            }
            println!("{}", table::format_details(&details));

            println!("\n{}", "Steps".bold());
            println!("{}", table::format_table(&steps));

            if let Some(ref answer) = analysis.answer {
                println!("\n{} {}", "Answer:".bold(), answer.green().bold());
            }
            if let Some(ref explanation) = analysis.explanation {
                println!("{}", explanation.dimmed());
            }
            Ok(())
        }
    }
}
