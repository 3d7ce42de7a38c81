//! Cached wrapper for the learning API client
//!
//! Caches the current user and terminal task snapshots. Processing snapshots
//! always go to the server so polling observes progress. Cache trouble is
//! logged and never fails the call it decorates.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Mutex;

use crate::cache::{CacheStorage, cache_key};
use crate::client::models::{
    AnalysisResult, AnalyzeRequest, AuthResponse, ImageUpload, LoginRequest, OcrResult,
    RegisterRequest, SubmitResponse, TaskSnapshot, UploadResponse, User,
};
use crate::client::solvecam::{ME_PATH, analysis_result_path, ocr_result_path};
use crate::client::{AuthApi, ImageApi, LearningApi, QuestionApi};
use crate::error::{ApiResult, CacheError};

/// Cached wrapper for any LearningApi implementation.
///
/// Caching can be disabled by passing no storage (for `--no-cache`).
/// The storage is wrapped in a Mutex for thread-safety.
pub struct CachedLearningClient<C: LearningApi> {
    inner: C,
    cache: Option<Mutex<CacheStorage>>,
}

impl<C: LearningApi> CachedLearningClient<C> {
    /// Create a new cached client wrapper.
    ///
    /// # Arguments
    /// * `inner` - The underlying API client to wrap
    /// * `cache` - Storage to use, or `None` to pass everything through
    pub fn new(inner: C, cache: Option<CacheStorage>) -> Self {
        Self {
            inner,
            cache: cache.map(Mutex::new),
        }
    }

    /// Get the inner client
    #[allow(dead_code)]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Run `op` against the storage, logging any failure
    ///
    /// `None` when caching is disabled or the operation failed.
    fn with_storage<T>(
        &self,
        action: &str,
        op: impl FnOnce(&CacheStorage) -> Result<T, CacheError>,
    ) -> Option<T> {
        let cache = self.cache.as_ref()?;
        let outcome = cache
            .lock()
            .map_err(|_| CacheError::Poisoned)
            .and_then(|guard| op(&*guard));

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Cache {} failed: {}", action, e);
                None
            }
        }
    }

    /// Try to get cached data
    fn get_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.with_storage("read", |storage| storage.get(key))??;
        match serde_json::from_slice(&data) {
            Ok(value) => {
                log::debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                log::warn!("Discarding unreadable cache entry: {}", e);
                None
            }
        }
    }

    /// Store data in cache
    fn set_cached<T: Serialize>(&self, key: &str, data: &T, endpoint: &str) {
        if self.cache.is_none() {
            return;
        }
        match serde_json::to_vec(data) {
            Ok(json) => {
                self.with_storage("write", |storage| storage.put(key, &json, endpoint));
            }
            Err(e) => log::warn!("Could not encode {} for the cache: {}", endpoint, e),
        }
    }

    fn invalidate(&self, key: &str) {
        self.with_storage("invalidation", |storage| storage.invalidate(key));
    }

    fn clear(&self) {
        if let Some(stats) = self.with_storage("clear", CacheStorage::clear) {
            log::debug!("Cleared {} cache entries", stats.entries_removed);
        }
    }

    /// Serve a task snapshot, caching it only once it is terminal
    async fn snapshot<R, Fut>(
        &self,
        path: &str,
        endpoint: &str,
        fetch: Fut,
    ) -> ApiResult<TaskSnapshot<R>>
    where
        R: Serialize + DeserializeOwned + Send,
        Fut: std::future::Future<Output = ApiResult<TaskSnapshot<R>>>,
    {
        let key = cache_key(path, &[]);
        if let Some(cached) = self.get_cached::<TaskSnapshot<R>>(&key) {
            return Ok(cached);
        }

        let snapshot = fetch.await?;
        if snapshot.status.is_terminal() {
            self.set_cached(&key, &snapshot, endpoint);
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl<C: LearningApi> AuthApi for CachedLearningClient<C> {
    /// Login - NEVER cached; drops any cached identity
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        let auth = self.inner.login(request).await?;
        self.invalidate(&cache_key(ME_PATH, &[]));
        Ok(auth)
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        let auth = self.inner.register(request).await?;
        self.invalidate(&cache_key(ME_PATH, &[]));
        Ok(auth)
    }

    /// Logout - everything cached belonged to the departing user
    async fn logout(&self) -> ApiResult<()> {
        let result = self.inner.logout().await;
        self.clear();
        result
    }

    async fn current_user(&self) -> ApiResult<User> {
        let key = cache_key(ME_PATH, &[]);
        if let Some(user) = self.get_cached::<User>(&key) {
            return Ok(user);
        }

        let user = self.inner.current_user().await?;
        self.set_cached(&key, &user, "current_user");
        Ok(user)
    }
}

#[async_trait]
impl<C: LearningApi> ImageApi for CachedLearningClient<C> {
    async fn upload_image(&self, upload: ImageUpload) -> ApiResult<UploadResponse> {
        self.inner.upload_image(upload).await
    }

    async fn ocr_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<OcrResult>> {
        self.snapshot(
            &ocr_result_path(task_id),
            "ocr_result",
            self.inner.ocr_result(task_id),
        )
        .await
    }
}

#[async_trait]
impl<C: LearningApi> QuestionApi for CachedLearningClient<C> {
    async fn analyze(&self, request: &AnalyzeRequest) -> ApiResult<SubmitResponse> {
        self.inner.analyze(request).await
    }

    async fn analysis_result(&self, task_id: &str) -> ApiResult<TaskSnapshot<AnalysisResult>> {
        self.snapshot(
            &analysis_result_path(task_id),
            "analysis_result",
            self.inner.analysis_result(task_id),
        )
        .await
    }
}
