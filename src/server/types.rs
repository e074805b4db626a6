//! REST API request and response types

use crate::error::{AppError, ErrorResponse};
use serde::{Deserialize, Serialize};

/// Standard response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error code, only set on errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success_with_message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
            code: None,
        }
    }

    pub fn success_with_data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
            code: None,
        }
    }

    pub fn success_with_data_and_message(data: T, message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: Some(data),
            code: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        let ErrorResponse { code, message } = ErrorResponse::from(err);
        Self {
            status: "error".to_string(),
            message: Some(message),
            data: None,
            code: Some(code),
        }
    }
}

/// Empty data type for responses without data
#[derive(Debug, Clone, Serialize)]
pub struct Empty {}

/// Body of `POST /api/stocks`
#[derive(Debug, Clone, Deserialize)]
pub struct AddStockRequest {
    pub code: String,
}
