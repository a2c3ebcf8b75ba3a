use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum ScannerError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid upload: {message}")]
    InvalidUpload { status: StatusCode, message: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Gemini API error ({status}): {message}")]
    Upstream {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Local store error: {0}")]
    LocalStore(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Receipt not found: {0}")]
    NotFound(String),
}

impl ScannerError {
    /// Build from a non-success Gemini reply, keeping the upstream message when the
    /// body decodes as the standard error envelope.
    pub fn from_upstream(status: reqwest::StatusCode, body: &[u8]) -> Self {
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match serde_json::from_slice::<GeminiError>(body) {
            Ok(err) => ScannerError::Upstream {
                status,
                code: err.error.status,
                message: err.error.message,
            },
            Err(_) => ScannerError::Upstream {
                status,
                code: "UPSTREAM_ERROR".to_string(),
                message: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }
}

impl IntoResponse for ScannerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            ScannerError::MissingFile => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("MISSING_FILE", "No file uploaded"),
            ),
            ScannerError::InvalidUpload { status, message } => {
                let code = status.canonical_reason().unwrap_or("BAD_REQUEST");
                (
                    status,
                    ApiErrorBody::new(&code.to_uppercase().replace(' ', "_"), &message),
                )
            }
            ScannerError::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("INVALID_BODY", &message),
            ),
            ScannerError::Upstream {
                status,
                code,
                message,
            } => {
                error!(upstream_status = %status, code = %code, "Gemini request failed: {message}");
                let message = if message.is_empty() {
                    "An upstream error occurred.".to_string()
                } else {
                    message
                };
                (StatusCode::BAD_GATEWAY, ApiErrorBody { code, message })
            }
            ScannerError::Transport(e) => {
                error!(error = %e, "Gemini transport failure");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorBody::new("BAD_GATEWAY", &format!("Upstream request failed: {e}")),
                )
            }
            ScannerError::MalformedOutput(reason) => {
                error!(reason = %reason, "model reply could not be parsed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("EXTRACTION_FAILED", "Failed to process receipt"),
                )
            }
            ScannerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "Sign in to view your receipts."),
            ),
            ScannerError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", &format!("Receipt {id} not found.")),
            ),
            e @ (ScannerError::UrlParse(_)
            | ScannerError::Json(_)
            | ScannerError::Database(_)
            | ScannerError::LocalStore(_)
            | ScannerError::Csv(_)) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Gemini API error response structure
#[derive(Deserialize, Debug)]
pub struct GeminiError {
    pub error: GeminiErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct GeminiErrorBody {
    pub code: u32,
    pub message: String,
    pub status: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
