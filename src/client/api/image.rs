//! Image upload and OCR API trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::models::{ImageUpload, OcrResult, TaskSnapshot, TaskUpdate, UploadResponse};
use crate::client::task::{PollOptions, poll_until_done};
use crate::error::ApiResult;

/// OCR task operations for the SolveCam API
#[async_trait]
pub trait ImageApi: Send + Sync {
    /// Upload an image, starting an OCR task
    async fn upload_image(&self, upload: ImageUpload) -> ApiResult<UploadResponse>;

    /// Poll an OCR task once
    async fn ocr_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<OcrResult>>;

    /// Poll an OCR task until it reaches a terminal state
    async fn wait_for_ocr(
        &self,
        task_id: &str,
        options: PollOptions,
        cancel: &CancellationToken,
        on_update: &mut (dyn for<'u> FnMut(&'u TaskUpdate) + Send),
    ) -> ApiResult<OcrResult> {
        poll_until_done(
            task_id,
            options,
            cancel,
            || self.ocr_result(task_id),
            |update| on_update(update),
        )
        .await
    }
}
