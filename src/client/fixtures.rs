//! Deterministic fixture data source
//!
//! Serves canned data without any network access. Task IDs are issued by
//! the uploads and analyses made through the same instance; each poll
//! advances a task one stage along `processing 30% → processing 70% →
//! completed`. Used by `--fixtures` and `data_source: fixture`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::api::{AuthApi, ImageApi, QuestionApi};
use super::models::{
    AnalysisResult, AnalyzeRequest, AuthResponse, ImageUpload, LoginRequest, OcrResult,
    RegisterRequest, SolutionStep, SubmitResponse, TaskSnapshot, UploadResponse, User,
};
use super::token::TokenStore;
use crate::error::{ApiError, ApiResult};

const OCR_PREFIX: &str = "fx-ocr-";
const ANALYSIS_PREFIX: &str = "fx-q-";

/// Progress reported on the polls before completion
const STAGES: [u8; 2] = [30, 70];

/// Fixture implementation of the learning API
pub struct FixtureClient {
    tokens: Arc<TokenStore>,
    next_id: AtomicU64,
    polls: Mutex<HashMap<String, usize>>,
}

impl FixtureClient {
    pub fn new(tokens: Arc<TokenStore>) -> Self {
        Self {
            tokens,
            next_id: AtomicU64::new(1),
            polls: Mutex::new(HashMap::new()),
        }
    }

    fn issue_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Advance a task by one poll and build its snapshot
    fn advance<R>(
        &self,
        task_id: &str,
        prefix: &str,
        result: impl FnOnce() -> R,
    ) -> ApiResult<TaskSnapshot<R>> {
        if !task_id.starts_with(prefix) {
            return Err(ApiError::Server {
                status: 404,
                message: format!("Task {} not found", task_id),
            });
        }

        let stage = {
            let mut polls = self
                .polls
                .lock()
                .map_err(|_| ApiError::InvalidResponse("fixture state poisoned".to_string()))?;
            let count = polls.entry(task_id.to_string()).or_insert(0);
            let stage = *count;
            *count += 1;
            stage
        };

        Ok(match STAGES.get(stage) {
            Some(progress) => TaskSnapshot::processing(task_id, Some(*progress)),
            None => TaskSnapshot::completed(task_id, result()),
        })
    }

    async fn require_token(&self) -> ApiResult<()> {
        match self.tokens.get().await {
            Some(_) => Ok(()),
            None => Err(ApiError::Unauthorized),
        }
    }

    async fn sign_in(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> ApiResult<AuthResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let auth = AuthResponse {
            token: format!("fixture-token-{}", username),
            user: fixture_user(username, email),
        };
        if let Err(e) = self.tokens.set(&auth.token).await {
            log::warn!("Signed in, but the credential could not be saved: {}", e);
        }
        Ok(auth)
    }
}

fn fixture_user(username: &str, email: Option<String>) -> User {
    User {
        id: "fixture-user".to_string(),
        username: username.to_string(),
        email: email.or_else(|| Some(format!("{}@example.com", username))),
        role: Some("student".to_string()),
    }
}

/// OCR result returned for every fixture image
pub fn fixture_ocr() -> OcrResult {
    OcrResult {
        text: "2x+5=15".to_string(),
        latex: Some("2x+5=15".to_string()),
        confidence: 0.98,
    }
}

/// Solution returned for every fixture analysis
pub fn fixture_analysis() -> AnalysisResult {
    AnalysisResult {
        subject: Some("math".to_string()),
        question_type: Some("linear-equation".to_string()),
        knowledge_points: vec![
            "Linear equations in one variable".to_string(),
            "Inverse operations".to_string(),
        ],
        steps: vec![
            SolutionStep {
                step: 1,
                title: Some("Isolate the x term".to_string()),
                content: "Subtract 5 from both sides.".to_string(),
                latex: Some("2x = 15 - 5 = 10".to_string()),
            },
            SolutionStep {
                step: 2,
                title: Some("Solve for x".to_string()),
                content: "Divide both sides by 2.".to_string(),
                latex: Some("x = 10 / 2".to_string()),
            },
            SolutionStep {
                step: 3,
                title: Some("Check".to_string()),
                content: "Substitute back: 2(5) + 5 = 15.".to_string(),
                latex: Some("2 \\cdot 5 + 5 = 15".to_string()),
            },
        ],
        answer: Some("x = 5".to_string()),
        explanation: Some("Undo the addition, then the multiplication.".to_string()),
    }
}

#[async_trait]
impl AuthApi for FixtureClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.sign_in(&request.username, &request.password, None).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.sign_in(&request.username, &request.password, request.email.clone())
            .await
    }

    async fn logout(&self) -> ApiResult<()> {
        if let Err(e) = self.tokens.clear().await {
            log::warn!("Failed to remove stored credential: {}", e);
        }
        Ok(())
    }

    async fn current_user(&self) -> ApiResult<User> {
        let token = self.tokens.get().await.ok_or(ApiError::Unauthorized)?;
        let username = token
            .strip_prefix("fixture-token-")
            .unwrap_or("student")
            .to_string();
        Ok(fixture_user(&username, None))
    }
}

#[async_trait]
impl ImageApi for FixtureClient {
    async fn upload_image(&self, upload: ImageUpload) -> ApiResult<UploadResponse> {
        if upload.bytes.is_empty() {
            return Err(ApiError::Validation(format!(
                "Image '{}' is empty",
                upload.file_name
            )));
        }
        self.require_token().await?;

        Ok(UploadResponse {
            task_id: self.issue_id(OCR_PREFIX),
            message: Some("Upload accepted".to_string()),
        })
    }

    async fn ocr_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<OcrResult>> {
        self.require_token().await?;
        self.advance(task_id, OCR_PREFIX, fixture_ocr)
    }
}

#[async_trait]
impl QuestionApi for FixtureClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> ApiResult<SubmitResponse> {
        if request.ocr_result.text.trim().is_empty() {
            return Err(ApiError::Validation(
                "Question text must not be empty".to_string(),
            ));
        }
        self.require_token().await?;

        Ok(SubmitResponse {
            task_id: self.issue_id(ANALYSIS_PREFIX),
        })
    }

    async fn analysis_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<AnalysisResult>> {
        self.require_token().await?;
        self.advance(task_id, ANALYSIS_PREFIX, fixture_analysis)
    }
}
