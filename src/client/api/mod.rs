//! API trait definitions split by responsibility
//!
//! This module organizes the SolveCam API surface into focused sub-traits:
//! - [`AuthApi`] - Sign-in, sign-out and the current user
//! - [`ImageApi`] - Image upload and OCR tasks
//! - [`QuestionApi`] - Question analysis tasks
//!
//! The [`LearningApi`](super::LearningApi) super-trait combines all three.

mod auth;
mod image;
mod question;

pub use auth::AuthApi;
pub use image::ImageApi;
pub use question::QuestionApi;
