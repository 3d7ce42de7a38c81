//! Authentication API trait

use async_trait::async_trait;

use crate::client::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::error::ApiResult;

/// Authentication operations for the SolveCam API
///
/// Implementations store the returned credential on success and drop it on
/// logout; callers never handle the token themselves.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Sign in and activate the returned credential
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse>;

    /// Create an account and activate the returned credential
    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse>;

    /// Sign out; the local credential is cleared even if the server call fails
    async fn logout(&self) -> ApiResult<()>;

    /// Fetch the signed-in user
    async fn current_user(&self) -> ApiResult<User>;
}
