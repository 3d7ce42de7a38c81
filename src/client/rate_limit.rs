//! Per-endpoint rate limiting for the SolveCam API
//!
//! Implements reactive rate limiting that only activates after receiving a 429.
//! Different endpoint patterns have different rate limits.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::Method;

/// Categories of API endpoints with their rate limits.
///
/// - Image upload: 10/min
/// - Task result polling: 10/sec
/// - Auth endpoints: 1/sec
/// - Everything else: 5/sec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    /// POST /api/image/upload
    Upload,
    /// GET /api/{image,question}/result/{id}
    TaskPoll,
    /// /api/auth/*
    Auth,
    /// Default for all other endpoints
    Default,
}

impl EndpointCategory {
    /// All endpoint categories for initialization.
    pub const ALL: [EndpointCategory; 4] = [
        EndpointCategory::Upload,
        EndpointCategory::TaskPoll,
        EndpointCategory::Auth,
        EndpointCategory::Default,
    ];

    /// Categorize a request based on path and method.
    pub fn from_request(path: &str, method: &Method) -> Self {
        if path == "/api/image/upload" && *method == Method::POST {
            return EndpointCategory::Upload;
        }

        if *method == Method::GET
            && (path.starts_with("/api/image/result/") || path.starts_with("/api/question/result/"))
        {
            return EndpointCategory::TaskPoll;
        }

        if path.starts_with("/api/auth/") {
            return EndpointCategory::Auth;
        }

        EndpointCategory::Default
    }

    /// Get the rate limit for this category (requests per second).
    pub fn rate_limit(&self) -> f64 {
        match self {
            EndpointCategory::Upload => 0.167, // 10 per minute
            EndpointCategory::TaskPoll => 10.0,
            EndpointCategory::Auth => 1.0,
            EndpointCategory::Default => 5.0,
        }
    }
}

/// Rate limiter state for a single endpoint category.
pub struct EndpointRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    category: EndpointCategory,
}

impl EndpointRateLimiter {
    /// Create a new rate limiter for an endpoint category.
    pub fn new(category: EndpointCategory) -> Self {
        let rate = category.rate_limit();

        // Sub-1 rates use per-minute quotas
        let quota = if rate >= 1.0 {
            Quota::per_second(NonZeroU32::new(rate as u32).unwrap_or(NonZeroU32::MIN))
        } else {
            let per_min = (rate * 60.0).round() as u32;
            Quota::per_minute(NonZeroU32::new(per_min).unwrap_or(NonZeroU32::MIN))
        };

        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
            category,
        }
    }

    /// Activate rate limiting for this category.
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Rate limiting activated for {:?}", self.category);
        }
    }

    /// Check if rate limiting is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            debug!("Waiting for rate limiter {:?}", self.category);
            self.limiter.until_ready().await;
        }
    }
}

/// Collection of rate limiters for all endpoint categories.
pub struct RateLimiterSet {
    limiters: HashMap<EndpointCategory, EndpointRateLimiter>,
}

impl Default for RateLimiterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterSet {
    /// Create a new set of rate limiters for all endpoint categories.
    pub fn new() -> Self {
        let limiters = EndpointCategory::ALL
            .into_iter()
            .map(|category| (category, EndpointRateLimiter::new(category)))
            .collect();

        Self { limiters }
    }

    /// Wait for rate limit permission for a category (if active).
    pub async fn wait_for(&self, category: EndpointCategory) {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.wait_if_active().await;
        }
    }

    /// Activate rate limiting for a category (called on 429).
    pub fn activate(&self, category: EndpointCategory) {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.activate();
        }
    }

    /// Whether a category is currently throttled.
    #[cfg(test)]
    pub fn is_active(&self, category: EndpointCategory) -> bool {
        self.limiters
            .get(&category)
            .is_some_and(EndpointRateLimiter::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_endpoint() {
        assert_eq!(
            EndpointCategory::from_request("/api/image/upload", &Method::POST),
            EndpointCategory::Upload
        );
        // GET to the upload path is not an upload
        assert_eq!(
            EndpointCategory::from_request("/api/image/upload", &Method::GET),
            EndpointCategory::Default
        );
    }

    #[test]
    fn test_task_poll_endpoints() {
        assert_eq!(
            EndpointCategory::from_request("/api/image/result/t1", &Method::GET),
            EndpointCategory::TaskPoll
        );
        assert_eq!(
            EndpointCategory::from_request("/api/question/result/t1", &Method::GET),
            EndpointCategory::TaskPoll
        );
    }

    #[test]
    fn test_auth_endpoints() {
        assert_eq!(
            EndpointCategory::from_request("/api/auth/login", &Method::POST),
            EndpointCategory::Auth
        );
        assert_eq!(
            EndpointCategory::from_request("/api/auth/me", &Method::GET),
            EndpointCategory::Auth
        );
    }

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            EndpointCategory::from_request("/api/question/analyze", &Method::POST),
            EndpointCategory::Default
        );
        assert_eq!(
            EndpointCategory::from_request("/unknown/path", &Method::GET),
            EndpointCategory::Default
        );
    }

    #[test]
    fn test_rate_limits() {
        assert_eq!(EndpointCategory::Upload.rate_limit(), 0.167);
        assert_eq!(EndpointCategory::TaskPoll.rate_limit(), 10.0);
        assert_eq!(EndpointCategory::Auth.rate_limit(), 1.0);
        assert_eq!(EndpointCategory::Default.rate_limit(), 5.0);
    }

    #[test]
    fn test_endpoint_rate_limiter_activation() {
        let limiter = EndpointRateLimiter::new(EndpointCategory::TaskPoll);
        assert!(!limiter.is_active());

        limiter.activate();
        assert!(limiter.is_active());

        // Second activation should be idempotent
        limiter.activate();
        assert!(limiter.is_active());
    }

    #[test]
    fn test_rate_limiter_set_activation_is_per_category() {
        let set = RateLimiterSet::new();
        for category in EndpointCategory::ALL {
            assert!(!set.is_active(category));
        }

        set.activate(EndpointCategory::Upload);
        assert!(set.is_active(EndpointCategory::Upload));
        assert!(!set.is_active(EndpointCategory::TaskPoll));
    }

    #[tokio::test]
    async fn test_inactive_limiter_does_not_wait() {
        let set = RateLimiterSet::new();
        // Would block for minutes if the upload quota applied
        for _ in 0..20 {
            set.wait_for(EndpointCategory::Upload).await;
        }
    }
}
