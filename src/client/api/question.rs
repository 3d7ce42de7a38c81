//! Question analysis API trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::models::{
    AnalysisResult, AnalyzeRequest, SubmitResponse, TaskSnapshot, TaskUpdate,
};
use crate::client::task::{PollOptions, poll_until_done};
use crate::error::ApiResult;

/// Question analysis operations for the SolveCam API
#[async_trait]
pub trait QuestionApi: Send + Sync {
    /// Submit recognized question text for step-by-step analysis
    async fn analyze(&self, request: &AnalyzeRequest) -> ApiResult<SubmitResponse>;

    /// Poll an analysis task once
    async fn analysis_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<AnalysisResult>>;

    /// Poll an analysis task until it reaches a terminal state
    async fn wait_for_analysis(
        &self,
        task_id: &str,
        options: PollOptions,
        cancel: &CancellationToken,
        on_update: &mut (dyn for<'u> FnMut(&'u TaskUpdate) + Send),
    ) -> ApiResult<AnalysisResult> {
        poll_until_done(
            task_id,
            options,
            cancel,
            || self.analysis_result(task_id),
            |update| on_update(update),
        )
        .await
    }
}
