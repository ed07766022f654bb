//! HTTP admission endpoint for deployment-submission handlers

pub mod handlers;
pub mod state;

pub use handlers::{create_router, AdmissionRequest, AdmissionResponse};
pub use state::{AdmissionCounts, AppState};
