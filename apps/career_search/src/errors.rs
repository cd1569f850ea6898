use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type shared by the crew, the tools and the web layer.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A role or task key is missing from its YAML config. Always fatal.
    #[error("No configuration found for {kind} '{key}'")]
    ConfigNotFound { kind: &'static str, key: String },

    #[error("Failed to load config '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("External call failed: {0}")]
    ExternalCall(String),

    #[error("Construction failed: {0}")]
    Construction(String),

    #[error("Pipeline failed: {0}")]
    Pipeline(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ConfigNotFound { .. } | AppError::ConfigLoad { .. } => {
                tracing::error!("Configuration error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "The search service is misconfigured".to_string(),
                )
            }
            AppError::ExternalCall(msg) => {
                tracing::error!("External call error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EXTERNAL_CALL_ERROR",
                    "An upstream data source failed".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Construction(msg) | AppError::Pipeline(msg) => {
                tracing::error!("Pipeline error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PIPELINE_ERROR",
                    "Job search failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
