//! SolveCam backend client
//!
//! Implements the API traits against the real backend through [`ApiClient`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::api::{AuthApi, ImageApi, QuestionApi};
use super::http::ApiClient;
use super::models::{
    AnalysisResult, AnalyzeRequest, AuthResponse, ImageUpload, LoginRequest, OcrResult,
    RegisterRequest, SubmitResponse, TaskSnapshot, UploadResponse, User,
};
use super::retry::RetryPolicy;
use super::token::TokenStore;
use super::transport::HttpTransport;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const ME_PATH: &str = "/api/auth/me";
pub const UPLOAD_PATH: &str = "/api/image/upload";
pub const ANALYZE_PATH: &str = "/api/question/analyze";

/// Result endpoint for an OCR task
pub fn ocr_result_path(task_id: &str) -> String {
    format!("/api/image/result/{}", task_id)
}

/// Result endpoint for an analysis task
pub fn analysis_result_path(task_id: &str) -> String {
    format!("/api/question/result/{}", task_id)
}

/// Reject task IDs that would escape their URL segment
pub fn validate_task_id(task_id: &str) -> ApiResult<()> {
    if task_id.trim().is_empty() {
        return Err(ApiError::Validation("Task ID must not be empty".to_string()));
    }
    if task_id.contains(['/', '?', '#']) || task_id.chars().any(char::is_whitespace) {
        return Err(ApiError::Validation(format!(
            "Task ID contains invalid characters: '{}'",
            task_id
        )));
    }
    Ok(())
}

/// SolveCam API client
pub struct SolveCamClient {
    api: ApiClient,
}

impl SolveCamClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Build a client for the configured host, timeout and retry policy
    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> ApiResult<Self> {
        let transport = HttpTransport::new(&config.api_host, config.timeout())?;
        log::debug!("Using SolveCam API at {}", transport.base_url());
        Ok(Self::new(ApiClient::new(
            Arc::new(transport),
            tokens,
            RetryPolicy::from(&config.retry),
        )))
    }

    fn tokens(&self) -> &Arc<TokenStore> {
        self.api.tokens()
    }

    /// Activate a freshly issued credential; persistence trouble is not fatal
    async fn activate(&self, auth: &AuthResponse) {
        if let Err(e) = self.tokens().set(&auth.token).await {
            log::warn!("Signed in, but the credential could not be saved: {}", e);
        }
    }
}

#[async_trait]
impl AuthApi for SolveCamClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let auth: AuthResponse = self.api.post(LOGIN_PATH, request).await?;
        self.activate(&auth).await;
        Ok(auth)
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let auth: AuthResponse = self.api.post(REGISTER_PATH, request).await?;
        self.activate(&auth).await;
        Ok(auth)
    }

    async fn logout(&self) -> ApiResult<()> {
        if self.tokens().get().await.is_some() {
            let result: ApiResult<serde_json::Value> =
                self.api.post(LOGOUT_PATH, &serde_json::json!({})).await;
            if let Err(e) = result {
                log::warn!("Server-side logout failed: {}", e);
            }
        }

        if let Err(e) = self.tokens().clear().await {
            log::warn!("Failed to remove stored credential: {}", e);
        }
        Ok(())
    }

    async fn current_user(&self) -> ApiResult<User> {
        // Some deployments wrap the user as `{ user: {...} }`
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MeResponse {
            Wrapped { user: User },
            Bare(User),
        }

        if self.tokens().get().await.is_none() {
            return Err(ApiError::Unauthorized);
        }

        let response: MeResponse = self.api.get(ME_PATH).await?;
        Ok(match response {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        })
    }
}

#[async_trait]
impl ImageApi for SolveCamClient {
    async fn upload_image(&self, upload: ImageUpload) -> ApiResult<UploadResponse> {
        if upload.bytes.is_empty() {
            return Err(ApiError::Validation(format!(
                "Image '{}' is empty",
                upload.file_name
            )));
        }

        let response: UploadResponse = self.api.upload(UPLOAD_PATH, upload).await?;
        validate_task_id(&response.task_id)
            .map_err(|_| ApiError::InvalidResponse("Upload returned no usable task ID".into()))?;
        Ok(response)
    }

    async fn ocr_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<OcrResult>> {
        validate_task_id(task_id)?;
        self.api.get(&ocr_result_path(task_id)).await
    }
}

#[async_trait]
impl QuestionApi for SolveCamClient {
    async fn analyze(&self, request: &AnalyzeRequest) -> ApiResult<SubmitResponse> {
        if request.ocr_result.text.trim().is_empty() {
            return Err(ApiError::Validation(
                "Question text must not be empty".to_string(),
            ));
        }

        let response: SubmitResponse = self.api.post(ANALYZE_PATH, request).await?;
        validate_task_id(&response.task_id)
            .map_err(|_| ApiError::InvalidResponse("Analyze returned no usable task ID".into()))?;
        Ok(response)
    }

    async fn analysis_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<AnalysisResult>> {
        validate_task_id(task_id)?;
        self.api.get(&analysis_result_path(task_id)).await
    }
}
