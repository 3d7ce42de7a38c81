//! Mock learning API client for testing
//!
//! Provides a scripted implementation of the API traits for unit testing
//! the layers above the client without making real API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::api::{AuthApi, ImageApi, QuestionApi};
use super::models::{
    AnalysisResult, AnalyzeRequest, AuthResponse, ImageUpload, LoginRequest, OcrResult,
    RegisterRequest, SubmitResponse, TaskSnapshot, UploadResponse, User,
};
use crate::error::{ApiError, ApiResult};

/// Mock API client for testing.
///
/// Configure scripted snapshots via builder methods, then use in tests.
/// Each poll pops the next snapshot; the last one repeats once the script
/// runs out, so a terminal snapshot stays terminal.
///
/// # Example
/// ```ignore
/// let mock = MockLearningClient::new()
///     .with_ocr_snapshots(vec![TaskSnapshot::processing("t1", Some(50))])
///     .await;
///
/// let snap = mock.ocr_result("t1").await?;
/// assert_eq!(snap.progress, Some(50));
/// ```
#[derive(Default)]
pub struct MockLearningClient {
    user: Arc<Mutex<Option<User>>>,
    ocr_snapshots: Arc<Mutex<VecDeque<TaskSnapshot<OcrResult>>>>,
    analysis_snapshots: Arc<Mutex<VecDeque<TaskSnapshot<AnalysisResult>>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    call_count: Arc<Mutex<CallCounts>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub login: usize,
    pub register: usize,
    pub logout: usize,
    pub current_user: usize,
    pub upload_image: usize,
    pub ocr_result: usize,
    pub analyze: usize,
    pub analysis_result: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.login
            + self.register
            + self.logout
            + self.current_user
            + self.upload_image
            + self.ocr_result
            + self.analyze
            + self.analysis_result
    }
}

impl MockLearningClient {
    /// Create a new mock client with no scripted data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the user returned from current_user and login.
    pub async fn with_user(self, user: User) -> Self {
        *self.user.lock().await = Some(user);
        self
    }

    /// Configure OCR snapshots, returned in order.
    pub async fn with_ocr_snapshots(self, snapshots: Vec<TaskSnapshot<OcrResult>>) -> Self {
        *self.ocr_snapshots.lock().await = snapshots.into();
        self
    }

    /// Configure analysis snapshots, returned in order.
    pub async fn with_analysis_snapshots(
        self,
        snapshots: Vec<TaskSnapshot<AnalysisResult>>,
    ) -> Self {
        *self.analysis_snapshots.lock().await = snapshots.into();
        self
    }

    /// Configure an error to return on the next API call.
    /// The error is consumed after one use.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Queue an error for the next call on an already-built mock.
    pub async fn fail_next(&self, error: ApiError) {
        *self.error.lock().await = Some(error);
    }

    /// Get the call counts for verification in tests.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    async fn check_error(&self) -> ApiResult<()> {
        match self.error.lock().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn current(&self) -> ApiResult<User> {
        self.user.lock().await.clone().ok_or(ApiError::Unauthorized)
    }
}

/// Pop the next scripted snapshot, repeating the last one
fn next_snapshot<R: Clone>(
    script: &mut VecDeque<TaskSnapshot<R>>,
    task_id: &str,
) -> TaskSnapshot<R> {
    match script.len() {
        0 => TaskSnapshot::processing(task_id, None),
        1 => script[0].clone(),
        _ => script.pop_front().unwrap_or_else(|| TaskSnapshot::processing(task_id, None)),
    }
}

// ============================================================================
// AuthApi Implementation
// ============================================================================

#[async_trait]
impl AuthApi for MockLearningClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.call_count.lock().await.login += 1;
        self.check_error().await?;

        let user = self.user.lock().await.clone().unwrap_or_else(|| User {
            id: "mock-user".to_string(),
            username: request.username.clone(),
            email: None,
            role: None,
        });
        Ok(AuthResponse {
            token: "mock-token".to_string(),
            user,
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.call_count.lock().await.register += 1;
        self.check_error().await?;

        Ok(AuthResponse {
            token: "mock-token".to_string(),
            user: User {
                id: "mock-user".to_string(),
                username: request.username.clone(),
                email: request.email.clone(),
                role: None,
            },
        })
    }

    async fn logout(&self) -> ApiResult<()> {
        self.call_count.lock().await.logout += 1;
        self.check_error().await
    }

    async fn current_user(&self) -> ApiResult<User> {
        self.call_count.lock().await.current_user += 1;
        self.check_error().await?;
        self.current().await
    }
}

// ============================================================================
// ImageApi / QuestionApi Implementations
// ============================================================================

#[async_trait]
impl ImageApi for MockLearningClient {
    async fn upload_image(&self, _upload: ImageUpload) -> ApiResult<UploadResponse> {
        self.call_count.lock().await.upload_image += 1;
        self.check_error().await?;

        Ok(UploadResponse {
            task_id: "t1".to_string(),
            message: None,
        })
    }

    async fn ocr_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<OcrResult>> {
        self.call_count.lock().await.ocr_result += 1;
        self.check_error().await?;

        let mut script = self.ocr_snapshots.lock().await;
        Ok(next_snapshot(&mut script, task_id))
    }
}

#[async_trait]
impl QuestionApi for MockLearningClient {
    async fn analyze(&self, _request: &AnalyzeRequest) -> ApiResult<SubmitResponse> {
        self.call_count.lock().await.analyze += 1;
        self.check_error().await?;

        Ok(SubmitResponse {
            task_id: "q1".to_string(),
        })
    }

    async fn analysis_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<AnalysisResult>> {
        self.call_count.lock().await.analysis_result += 1;
        self.check_error().await?;

        let mut script = self.analysis_snapshots.lock().await;
        Ok(next_snapshot(&mut script, task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::TaskStatus;

    fn ocr() -> OcrResult {
        OcrResult {
            text: "x+1=2".to_string(),
            latex: None,
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn test_mock_client_default_processing() {
        let mock = MockLearningClient::new();
        let snap = mock.ocr_result("t1").await.unwrap();
        assert_eq!(snap.status, TaskStatus::Processing);
        assert!(mock.current_user().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_script_repeats_last() {
        let mock = MockLearningClient::new()
            .with_ocr_snapshots(vec![
                TaskSnapshot::processing("t1", Some(50)),
                TaskSnapshot::completed("t1", ocr()),
            ])
            .await;

        assert_eq!(mock.ocr_result("t1").await.unwrap().progress, Some(50));
        assert!(mock.ocr_result("t1").await.unwrap().status.is_terminal());
        assert!(mock.ocr_result("t1").await.unwrap().status.is_terminal());
        assert_eq!(mock.call_counts().await.ocr_result, 3);
    }

    #[tokio::test]
    async fn test_mock_client_error_consumed_once() {
        let mock = MockLearningClient::new()
            .with_error(ApiError::Connectivity("down".into()))
            .await;

        let request = AnalyzeRequest {
            ocr_result: ocr(),
            subject_hint: None,
            grade_hint: None,
            user_note: None,
        };
        assert!(mock.analyze(&request).await.is_err());
        assert!(mock.analyze(&request).await.is_ok());
        assert_eq!(mock.call_counts().await.total(), 2);
    }
}
