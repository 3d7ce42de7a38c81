//! SolveCam API client
//!
//! The API surface is split into focused traits (see [`api`]) and combined
//! as [`LearningApi`]. Two data sources implement it: [`SolveCamClient`]
//! talks to the real backend, [`FixtureClient`] serves canned data. The
//! caller picks one when building its context.

use std::sync::Arc;

pub mod api;
pub mod envelope;
pub mod fixtures;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod rate_limit;
pub mod retry;
pub mod solvecam;
pub mod task;
pub mod token;
pub mod transport;

pub use api::{AuthApi, ImageApi, QuestionApi};
pub use fixtures::FixtureClient;
#[cfg(test)]
#[allow(unused_imports)]
pub use mock::MockLearningClient;
pub use solvecam::SolveCamClient;
pub use task::PollOptions;
pub use token::{FileCredentialStore, TokenStore};

use crate::config::{Config, DataSource};
use crate::error::Result;

/// The complete learning API: auth, OCR and analysis.
pub trait LearningApi: AuthApi + ImageApi + QuestionApi {}

impl<T: AuthApi + ImageApi + QuestionApi> LearningApi for T {}

/// Which implementation serves a run
pub fn data_source(config: &Config, force_fixtures: bool) -> DataSource {
    if force_fixtures {
        DataSource::Fixture
    } else {
        config.data_source
    }
}

/// Uncached client for the selected data source
///
/// Kept concrete so callers can wrap either side in the cache layer.
pub enum SourceClient {
    Backend(SolveCamClient),
    Fixture(FixtureClient),
}

impl SourceClient {
    pub fn build(config: &Config, source: DataSource, tokens: Arc<TokenStore>) -> Result<Self> {
        Ok(match source {
            DataSource::Backend => Self::Backend(SolveCamClient::from_config(config, tokens)?),
            DataSource::Fixture => Self::Fixture(FixtureClient::new(tokens)),
        })
    }
}
