// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Persistence layer. The marketplace workflow talks to storage through the
//! [`MarketStore`] trait so the HTTP layer and tests can share the in-memory
//! implementation while a relational backend stays swappable.

pub mod entities;
pub mod memory;
pub mod seed;

use anyhow::Result;

pub use entities::{
    Job, JobParameters, JobResultRefs, JobStatus, Model, ModelLicense, NewJob, NewLicense,
    NewModel, NewTransaction, NewUser, Transaction, TransactionType, User,
};
pub use memory::MemoryStore;

/// Catalog query filters. All fields are conjunctive; `None` means no
/// constraint.
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    pub category: Option<String>,
    pub price_range: Option<(f64, f64)>,
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
    pub active_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub active_jobs: u64,
    pub completed_jobs: u64,
    pub owned_models: u64,
}

/// Storage operations required by the marketplace workflow.
///
/// The two `*_with_payment` methods are the atomicity seam of the submission
/// and purchase workflows: the record and its ledger entry are written as one
/// unit, both succeed or both fail. A relational implementation must wrap
/// them in a database transaction; the in-memory store performs both inserts
/// under a single write lock.
#[async_trait::async_trait]
pub trait MarketStore: Send + Sync {
    // Users
    async fn user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: NewUser) -> Result<User>;
    /// Find-or-create for wallet login. Existing users are returned as-is.
    async fn upsert_wallet_user(&self, wallet_address: &str) -> Result<User>;

    // Models
    async fn model_by_id(&self, model_id: u64) -> Result<Option<Model>>;
    async fn list_models(&self, filter: ModelFilter) -> Result<Vec<Model>>;
    async fn model_categories(&self) -> Result<Vec<String>>;
    async fn insert_model(&self, model: NewModel) -> Result<Model>;

    // Licenses
    async fn license_for(&self, user_id: u64, model_id: u64) -> Result<Option<ModelLicense>>;
    async fn licensed_model_ids(&self, user_id: u64) -> Result<Vec<u64>>;
    /// Atomically create a license and its `model_purchase` transaction.
    async fn create_license_with_payment(
        &self,
        license: NewLicense,
        payment: NewTransaction,
    ) -> Result<(ModelLicense, Transaction)>;

    // Jobs
    /// Display identifier of the most recently inserted job, if any. Read
    /// once at startup to seed the identifier allocator.
    async fn latest_job_display_id(&self) -> Result<Option<String>>;
    /// Atomically create a job and its `job_payment` transaction. The store
    /// links the payment to the created job row.
    async fn create_job_with_payment(
        &self,
        job: NewJob,
        payment: NewTransaction,
    ) -> Result<(Job, Transaction)>;
    async fn job_by_display_id(&self, user_id: u64, display_id: &str) -> Result<Option<Job>>;
    /// Jobs for one user, newest first.
    async fn jobs_for_user(&self, user_id: u64, filter: JobFilter) -> Result<Vec<Job>>;
    /// Completed jobs with attached results, newest first.
    async fn recent_results(&self, user_id: u64, limit: usize) -> Result<Vec<Job>>;
    /// Worker seam: advance a job along `queued -> processing -> {completed, failed}`.
    async fn update_job_status(
        &self,
        display_id: &str,
        status: JobStatus,
        progress: u8,
    ) -> Result<()>;
    /// Worker seam: mark a job completed and attach its result references.
    async fn complete_job(&self, display_id: &str, result: JobResultRefs) -> Result<()>;

    // Transactions
    async fn recent_transactions(&self, user_id: u64, limit: usize) -> Result<Vec<Transaction>>;

    // Dashboard
    async fn dashboard_counts(&self, user_id: u64) -> Result<DashboardCounts>;
}
