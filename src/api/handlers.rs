// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Wire types for the marketplace API. Amounts are formatted to three
//! decimals here, at the display edge; the stored records keep full
//! precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::pricing;
use crate::storage::{DashboardCounts, Job, JobParameters, JobStatus, Model, Transaction};

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectRequest {
    pub address: String,
    pub signature: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub address: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_jobs: u64,
    pub completed_jobs: u64,
    pub owned_models: u64,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
}

impl DashboardResponse {
    pub fn anonymous(currency: &str) -> Self {
        Self {
            stats: DashboardStats {
                active_jobs: 0,
                completed_jobs: 0,
                owned_models: 0,
                balance: format!("0.000 {}", currency),
            },
        }
    }

    pub fn for_user(counts: DashboardCounts, currency: &str) -> Self {
        Self {
            stats: DashboardStats {
                active_jobs: counts.active_jobs,
                completed_jobs: counts.completed_jobs,
                owned_models: counts.owned_models,
                // Placeholder until a real balance lookup exists; the chain
                // layer is simulated throughout.
                balance: format!("1.245 {}", currency),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelView {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub rating: f64,
    pub category: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub licensed_to_user: bool,
}

impl ModelView {
    pub fn build(model: &Model, currency: &str, licensed: bool) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            description: model.description.clone(),
            price: pricing::format_cost(model.price, currency),
            rating: model.rating,
            category: model.category.clone(),
            features: model.features.clone(),
            author_address: model.author_address.clone(),
            image_url: model.image_url.clone(),
            licensed_to_user: licensed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelView>,
    pub categories: Vec<String>,
}

/// Compact model entry for the submission form; `id` is a string for form
/// compatibility.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableModelView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub licensed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub progress: u8,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub cost: String,
    pub model_id: u64,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_image_url: Option<String>,
}

impl JobView {
    pub fn build(job: &Job, model_name: &str, currency: &str) -> Self {
        Self {
            id: job.display_id.clone(),
            name: job.name.clone(),
            status: job.status,
            progress: job.progress,
            submitted_at: job.submitted_at,
            completed_at: job.completed_at,
            cost: pricing::format_cost(job.cost, currency),
            model_id: job.model_id,
            model_name: model_name.to_string(),
            result_id: job.result_id.clone(),
            result_image_url: job.result_image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailView {
    #[serde(flatten)]
    pub summary: JobView,
    pub parameters: JobParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_file_url: Option<String>,
    pub transaction_hash: String,
}

impl JobDetailView {
    pub fn build(job: &Job, model_name: &str, currency: &str) -> Self {
        Self {
            summary: JobView::build(job, model_name, currency),
            parameters: job.parameters,
            mask_file_url: job.mask_file_url.clone(),
            result_file_url: job.result_file_url.clone(),
            transaction_hash: job.transaction_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResultView {
    pub id: String,
    pub job_id: String,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: crate::storage::TransactionType,
    pub amount: String,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    pub metadata: serde_json::Value,
}

impl TransactionView {
    pub fn build(tx: &Transaction, currency: &str) -> Self {
        Self {
            id: tx.id.to_string(),
            tx_type: tx.tx_type,
            amount: pricing::format_cost(tx.amount, currency),
            timestamp: tx.created_at,
            tx_hash: tx.tx_hash.clone(),
            metadata: tx.metadata.clone(),
        }
    }
}
