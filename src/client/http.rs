//! Authenticated request pipeline
//!
//! [`ApiClient`] runs every request through the same steps: rate-limit wait,
//! bearer attachment, transport call with connectivity retries, then status
//! mapping and envelope normalization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::envelope;
use super::models::ImageUpload;
use super::rate_limit::{EndpointCategory, RateLimiterSet};
use super::retry::RetryPolicy;
use super::token::TokenStore;
use super::transport::{ApiRequest, RawResponse, Transport};
use crate::error::{ApiError, ApiResult};

/// Fallback wait when a 429 carries no `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Request pipeline shared by every backend call
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    retry: RetryPolicy,
    rate_limiter: RateLimiterSet,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<TokenStore>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            tokens,
            retry,
            rate_limiter: RateLimiterSet::new(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.execute(ApiRequest::new(Method::POST, path).json(to_json(body)?))
            .await
    }

    #[allow(dead_code)]
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.execute(ApiRequest::new(Method::PUT, path).json(to_json(body)?))
            .await
    }

    #[allow(dead_code)]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(ApiRequest::new(Method::DELETE, path)).await
    }

    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        upload: ImageUpload,
    ) -> ApiResult<T> {
        self.execute(ApiRequest::new(Method::POST, path).multipart(upload))
            .await
    }

    /// Send a request and decode the normalized payload
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        envelope::decode(&response)
    }

    /// Send a request, returning the raw 2xx response or a mapped error
    pub async fn send(&self, mut request: ApiRequest) -> ApiResult<RawResponse> {
        let category = EndpointCategory::from_request(&request.path, &request.method);
        request.bearer = self.tokens.get().await;

        let request = &request;
        let response = self
            .retry
            .run(move |_| async move {
                self.rate_limiter.wait_for(category).await;
                self.transport.send(request).await
            })
            .await?;

        match response.status {
            200..=299 => Ok(response),
            401 => {
                // Only the credential this request carried is known to be dead
                if let Some(sent) = request.bearer.as_deref() {
                    match self.tokens.clear_if(sent).await {
                        Ok(false) => log::debug!("Credential changed in flight; keeping it"),
                        Ok(true) => {}
                        Err(e) => log::warn!("Failed to clear rejected credential: {}", e),
                    }
                }
                Err(ApiError::Unauthorized)
            }
            429 => {
                self.rate_limiter.activate(category);
                let wait = response.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                Err(ApiError::RateLimit(Duration::from_secs(wait)))
            }
            status => Err(ApiError::Server {
                status,
                message: envelope::error_message(status, &response.body),
            }),
        }
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Validation(format!("Could not encode request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::HttpTransport;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Transport double replaying scripted outcomes
    struct ScriptedTransport {
        outcomes: Mutex<Vec<ApiResult<RawResponse>>>,
        calls: AtomicU32,
        seen_bearers: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedTransport {
        fn new(mut outcomes: Vec<ApiResult<RawResponse>>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
                seen_bearers: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> ApiResult<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_bearers.lock().unwrap().push(request.bearer.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ApiError::Connectivity("script exhausted".into())))
        }
    }

    fn ok(body: &str) -> ApiResult<RawResponse> {
        status(200, body)
    }

    fn status(code: u16, body: &str) -> ApiResult<RawResponse> {
        Ok(RawResponse {
            status: code,
            body: body.to_string(),
            retry_after: None,
        })
    }

    fn dropped() -> ApiResult<RawResponse> {
        Err(ApiError::Connectivity("connection reset".into()))
    }

    async fn client_with(transport: Arc<ScriptedTransport>) -> (ApiClient, Arc<TokenStore>) {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set("tok-1").await.unwrap();
        let client = ApiClient::new(transport, Arc::clone(&tokens), RetryPolicy::default());
        (client, tokens)
    }

    #[tokio::test]
    async fn test_attaches_current_credential() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"taskId":"t1"}"#)]);
        let (client, _tokens) = client_with(Arc::clone(&transport)).await;

        let value: serde_json::Value = client.get("/api/image/result/t1").await.unwrap();
        assert_eq!(value["taskId"], "t1");
        assert_eq!(
            transport.seen_bearers.lock().unwrap().as_slice(),
            &[Some("tok-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_no_bearer_when_signed_out() {
        let transport = ScriptedTransport::new(vec![ok("{}")]);
        let client = ApiClient::new(
            transport.clone(),
            Arc::new(TokenStore::in_memory()),
            RetryPolicy::default(),
        );

        let _: serde_json::Value = client.get("/api/auth/me").await.unwrap();
        assert_eq!(transport.seen_bearers.lock().unwrap().as_slice(), &[None]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connectivity_failures_retry_then_surface() {
        let transport = ScriptedTransport::new(vec![dropped(), dropped(), dropped()]);
        let (client, tokens) = client_with(Arc::clone(&transport)).await;
        let started = Instant::now();

        let err = client
            .get::<serde_json::Value>("/api/question/result/t1")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Connectivity(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        // Connectivity trouble never touches the credential
        assert!(tokens.has().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let transport = ScriptedTransport::new(vec![dropped(), ok(r#"{"ok":true}"#)]);
        let (client, _tokens) = client_with(Arc::clone(&transport)).await;

        let value: serde_json::Value = client.get("/api/auth/me").await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_clears_credential_without_retry() {
        let transport = ScriptedTransport::new(vec![status(401, r#"{"error":"expired"}"#)]);
        let (client, tokens) = client_with(Arc::clone(&transport)).await;

        let err = client
            .get::<serde_json::Value>("/api/auth/me")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(!tokens.has().await);
        assert!(tokens.get().await.is_none());
    }

    /// Transport that signs in with a new credential while the old request is in flight
    struct ReloginTransport {
        tokens: Arc<TokenStore>,
    }

    #[async_trait]
    impl Transport for ReloginTransport {
        async fn send(&self, _request: &ApiRequest) -> ApiResult<RawResponse> {
            self.tokens.set("fresh-login").await.unwrap();
            status(401, r#"{"error":"expired"}"#)
        }
    }

    #[tokio::test]
    async fn test_unauthorized_keeps_credential_stored_in_flight() {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set("stale").await.unwrap();
        let transport = Arc::new(ReloginTransport {
            tokens: Arc::clone(&tokens),
        });
        let client = ApiClient::new(transport, Arc::clone(&tokens), RetryPolicy::default());

        let err = client
            .get::<serde_json::Value>("/api/auth/me")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(tokens.get().await.as_deref(), Some("fresh-login"));
        assert!(tokens.has().await);
    }

    #[tokio::test]
    async fn test_server_error_message_is_passed_through() {
        let transport = ScriptedTransport::new(vec![status(
            422,
            r#"{"success":false,"error":"Unsupported image format"}"#,
        )]);
        let (client, tokens) = client_with(Arc::clone(&transport)).await;

        let err = client
            .post::<serde_json::Value, _>("/api/question/analyze", &serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Unsupported image format");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(tokens.has().await);
    }

    #[tokio::test]
    async fn test_rate_limit_activates_category() {
        let transport = ScriptedTransport::new(vec![Ok(RawResponse {
            status: 429,
            body: String::new(),
            retry_after: Some(12),
        })]);
        let (client, _tokens) = client_with(Arc::clone(&transport)).await;

        let err = client
            .get::<serde_json::Value>("/api/image/result/t1")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::RateLimit(d) if d == Duration::from_secs(12)));
        assert!(client.rate_limiter.is_active(EndpointCategory::TaskPoll));
        assert!(!client.rate_limiter.is_active(EndpointCategory::Upload));
    }

    #[tokio::test]
    async fn test_put_and_delete_use_their_verbs() {
        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/api/user/profile")
            .match_body(mockito::Matcher::Json(serde_json::json!({"grade": "8"})))
            .with_status(200)
            .with_body(r#"{"success":true,"data":{"grade":"8"}}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/favorites/f1")
            .with_status(200)
            .with_body(r#"{"success":true,"data":{"removed":true}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url(), Duration::from_secs(5)).unwrap();
        let client = ApiClient::new(
            Arc::new(transport),
            Arc::new(TokenStore::in_memory()),
            RetryPolicy::none(),
        );

        let updated: serde_json::Value = client
            .put("/api/user/profile", &serde_json::json!({"grade": "8"}))
            .await
            .unwrap();
        assert_eq!(updated["grade"], "8");

        let removed: serde_json::Value = client.delete("/api/favorites/f1").await.unwrap();
        assert_eq!(removed["removed"], true);

        put.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_against_http_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/question/analyze")
            .match_header("authorization", "Bearer tok-http")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"subjectHint": "math"}),
            ))
            .with_status(200)
            .with_body(r#"{"success":true,"data":{"taskId":"q1"}}"#)
            .create_async()
            .await;

        let tokens = Arc::new(TokenStore::in_memory());
        tokens.set("tok-http").await.unwrap();
        let transport = HttpTransport::new(&server.url(), Duration::from_secs(5)).unwrap();
        let client = ApiClient::new(Arc::new(transport), tokens, RetryPolicy::none());

        let value: serde_json::Value = client
            .post(
                "/api/question/analyze",
                &serde_json::json!({"subjectHint": "math"}),
            )
            .await
            .unwrap();

        assert_eq!(value["taskId"], "q1");
        mock.assert_async().await;
    }
}
