//! SolveCam API data models
//!
//! Domain types exchanged with the SolveCam backend, organized by resource.

mod auth;
mod image;
mod question;
mod task;

pub use auth::{AuthResponse, LoginRequest, RegisterRequest, User};
pub use image::{ImageUpload, OcrResult, UploadResponse};
pub use question::{AnalysisResult, AnalyzeRequest, SolutionStep, SubmitResponse};
pub use task::{TaskSnapshot, TaskStatus, TaskUpdate};
