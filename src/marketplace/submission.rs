// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Job submission: parameter validation, the deterministic mask-file naming
//! contract, and the submitted-job view returned to clients.

use serde::{Deserialize, Serialize};

use super::job_id;
use crate::storage::JobParameters;

/// Raw submission payload. Field names are fixed for client compatibility.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmission {
    pub name: String,
    pub model_id: String,
    pub resolution: f64,
    pub wavelength: f64,
    pub numerical_aperture: f64,
    pub iterations: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl JobSubmission {
    /// Validate every field, reporting all violations rather than stopping
    /// at the first one.
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();
        if self.name.trim().len() < 3 {
            violations.push(FieldViolation::new(
                "name",
                "Job name must be at least 3 characters",
            ));
        }
        if self.model_id.trim().is_empty() {
            violations.push(FieldViolation::new("modelId", "Please select a model"));
        } else if self.model_id.trim().parse::<u64>().is_err() {
            violations.push(FieldViolation::new(
                "modelId",
                "Model id must be a numeric identifier",
            ));
        }
        if !(self.resolution > 0.0) {
            violations.push(FieldViolation::new(
                "resolution",
                "Resolution must be positive",
            ));
        }
        if !(self.wavelength > 0.0) {
            violations.push(FieldViolation::new(
                "wavelength",
                "Wavelength must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.numerical_aperture) {
            violations.push(FieldViolation::new(
                "numericalAperture",
                "Numerical aperture must be between 0 and 1",
            ));
        }
        if self.iterations == 0 {
            violations.push(FieldViolation::new(
                "iterations",
                "Iterations must be a positive integer",
            ));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn parameters(&self) -> JobParameters {
        JobParameters {
            resolution: self.resolution,
            wavelength: self.wavelength,
            numerical_aperture: self.numerical_aperture,
            iterations: self.iterations,
        }
    }
}

/// Deterministic storage name for an uploaded mask file, derived from the
/// allocated job number and the original file's extension. Naming only:
/// the upload itself is performed by the file-storage collaborator.
pub fn mask_object_name(job_number: u64, original_file_name: &str) -> String {
    let display_id = job_id::format_display_id(job_number);
    match original_file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("masks/{}.{}", display_id, ext)
        }
        _ => format!("masks/{}", display_id),
    }
}

/// Submitted-job view returned to the caller: the persisted record plus the
/// formatted cost string and resolved model name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    pub job_id: String,
    pub name: String,
    pub status: crate::storage::JobStatus,
    pub progress: u8,
    pub parameters: JobParameters,
    pub model_id: u64,
    pub model_name: String,
    pub cost: String,
    pub mask_file_url: Option<String>,
    pub transaction_hash: String,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}
