// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Marketplace entities: users, catalog models, licenses, jobs and the
//! payment ledger. Field names on the wire stay camelCase for client
//! compatibility; amounts are stored at full precision and only formatted
//! to three decimals at the display edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub wallet_address: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub wallet_address: String,
    pub email: Option<String>,
}

/// Catalog entry for a purchasable lithography simulation model.
///
/// Invariant: `price >= 0`. A price of exactly zero marks the model as
/// free, which implicitly licenses it to every user (see
/// [`crate::marketplace::LicenseGate`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub price_in_wei: String,
    pub author_id: Option<u64>,
    pub author_address: Option<String>,
    pub category: String,
    pub features: Vec<String>,
    pub rating: f64,
    pub num_reviews: u32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewModel {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub price_in_wei: String,
    pub author_id: Option<u64>,
    pub author_address: Option<String>,
    pub category: String,
    pub features: Vec<String>,
    pub rating: f64,
    pub num_reviews: u32,
    pub image_url: Option<String>,
}

/// Grants a user the right to submit jobs against a paid model.
/// At most one license may exist per (user, model) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelLicense {
    pub id: u64,
    pub user_id: u64,
    pub model_id: u64,
    pub wallet_address: String,
    pub transaction_hash: String,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLicense {
    pub user_id: u64,
    pub model_id: u64,
    pub wallet_address: String,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// True while the external worker still owes a terminal transition.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParameters {
    pub resolution: f64,
    pub wavelength: f64,
    pub numerical_aperture: f64,
    pub iterations: u32,
}

/// A submitted simulation request. `display_id` is the human-readable
/// identifier (`JOB-<n>`, strictly increasing); `id` is the storage row id.
/// `cost` is fixed at submission time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub display_id: String,
    pub user_id: u64,
    pub model_id: u64,
    pub name: String,
    pub status: JobStatus,
    pub progress: u8,
    pub parameters: JobParameters,
    pub mask_file_url: Option<String>,
    pub cost: f64,
    pub transaction_hash: String,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result_id: Option<String>,
    pub result_file_url: Option<String>,
    pub result_image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub display_id: String,
    pub user_id: u64,
    pub model_id: u64,
    pub name: String,
    pub parameters: JobParameters,
    pub mask_file_url: Option<String>,
    pub cost: f64,
    pub transaction_hash: String,
}

/// Result references attached by the external job-processing worker once a
/// simulation finishes. This service only establishes the initial
/// `queued` state.
#[derive(Debug, Clone)]
pub struct JobResultRefs {
    pub result_id: String,
    pub result_file_url: Option<String>,
    pub result_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    JobPayment,
    ModelPurchase,
    Deposit,
}

/// Ledger entry paired 1:1 with a job submission or model purchase.
/// Created atomically with its paired record; immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub user_id: u64,
    pub tx_type: TransactionType,
    pub amount: f64,
    pub amount_in_wei: String,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub job_id: Option<u64>,
    pub model_id: Option<u64>,
    pub status: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: u64,
    pub tx_type: TransactionType,
    pub amount: f64,
    pub amount_in_wei: String,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub model_id: Option<u64>,
    pub metadata: serde_json::Value,
}
