// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::marketplace::{FieldViolation, MarketError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    ValidationFailed(Vec<FieldViolation>),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    CorruptState(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationFailed(violations) => {
                let mut details = HashMap::new();
                details.insert(
                    "errors".to_string(),
                    serde_json::to_value(violations).unwrap_or_default(),
                );
                ("validation_error", "Invalid job data".to_string(), Some(details))
            }
            ApiError::Unauthorized(msg) => ("unauthorized", msg.clone(), None),
            ApiError::Forbidden(msg) => ("forbidden", msg.clone(), None),
            ApiError::Conflict(msg) => ("conflict", msg.clone(), None),
            ApiError::CorruptState(msg) => ("corrupt_state", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::ValidationFailed(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::Conflict(_) => 409,
            ApiError::CorruptState(_) | ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationFailed(violations) => {
                write!(f, "Validation failed: {} field(s)", violations.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::CorruptState(msg) => write!(f, "Corrupt state: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Validation(violations) => ApiError::ValidationFailed(violations),
            MarketError::ModelNotFound(id) => ApiError::NotFound(format!("Model {} not found", id)),
            MarketError::Unauthorized(id) => {
                ApiError::Forbidden(format!("You don't have a license for model {}", id))
            }
            MarketError::AlreadyLicensed(id) => {
                ApiError::Conflict(format!("You already own a license for model {}", id))
            }
            MarketError::CorruptState(msg) => ApiError::CorruptState(msg),
            MarketError::Storage(err) => ApiError::InternalError(err.to_string()),
        }
    }
}
