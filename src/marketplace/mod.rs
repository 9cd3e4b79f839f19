// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! The job submission and licensing workflow.
//!
//! [`Marketplace`] is the facade the HTTP layer calls into. A submission
//! runs: validate -> license gate -> model lookup -> cost estimate ->
//! identifier allocation -> atomic job + payment write. Purchases run the
//! duplicate check and the atomic license + payment write.

pub mod job_id;
pub mod licensing;
pub mod pricing;
pub mod submission;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

pub use job_id::{JobIdAllocator, SEQUENCE_START};
pub use licensing::{LicenseGate, PurchaseReceipt};
pub use submission::{FieldViolation, JobSubmission, SubmittedJob};

use crate::chain;
use crate::storage::{MarketStore, NewJob, NewTransaction, TransactionType, User};

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("invalid job data: {}", format_violations(.0))]
    Validation(Vec<FieldViolation>),
    #[error("model {0} not found")]
    ModelNotFound(u64),
    #[error("no license for model {0}")]
    Unauthorized(u64),
    #[error("license already owned for model {0}")]
    AlreadyLicensed(u64),
    #[error("corrupt identifier state: {0}")]
    CorruptState(String),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct Marketplace {
    store: Arc<dyn MarketStore>,
    gate: LicenseGate,
    allocator: JobIdAllocator,
    currency: String,
    mask_storage_base: String,
}

impl Marketplace {
    /// Build the marketplace service, seeding the identifier allocator from
    /// the newest stored job. Fails with `CorruptState` if the stored
    /// identifier sequence is unparsable.
    pub async fn new(
        store: Arc<dyn MarketStore>,
        currency: impl Into<String>,
        mask_storage_base: impl Into<String>,
    ) -> Result<Self, MarketError> {
        let allocator = JobIdAllocator::seed(store.as_ref()).await?;
        Ok(Self {
            gate: LicenseGate::new(store.clone()),
            store,
            allocator,
            currency: currency.into(),
            mask_storage_base: mask_storage_base.into(),
        })
    }

    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// License gate: may `user_id` submit jobs against `model_id`?
    pub async fn authorize(&self, user_id: u64, model_id: u64) -> Result<bool, MarketError> {
        self.gate.authorize(user_id, model_id).await
    }

    pub async fn purchase_model(
        &self,
        user: &User,
        model_id: u64,
    ) -> Result<PurchaseReceipt, MarketError> {
        licensing::purchase_model(&self.store, user, model_id, &self.currency).await
    }

    /// Submit a simulation job. `mask_file_name` is the original name of an
    /// uploaded mask file, if one accompanied the request; only the
    /// deterministic storage name is derived here, the upload itself belongs
    /// to the file-storage collaborator.
    pub async fn submit_job(
        &self,
        user: &User,
        submission: JobSubmission,
        mask_file_name: Option<&str>,
    ) -> Result<SubmittedJob, MarketError> {
        submission.validate().map_err(MarketError::Validation)?;
        let model_id: u64 = submission.model_id.trim().parse().map_err(|_| {
            MarketError::Validation(vec![FieldViolation {
                field: "modelId".to_string(),
                message: "Model id must be a numeric identifier".to_string(),
            }])
        })?;

        if !self.gate.authorize(user.id, model_id).await? {
            return Err(MarketError::Unauthorized(model_id));
        }

        let model = self
            .store
            .model_by_id(model_id)
            .await?
            .ok_or(MarketError::ModelNotFound(model_id))?;

        let cost = pricing::estimate(model.price, submission.resolution, submission.iterations);

        let job_number = self.allocator.allocate();
        let display_id = job_id::format_display_id(job_number);

        let mask_file_url = mask_file_name.map(|original| {
            format!(
                "{}/{}",
                self.mask_storage_base,
                submission::mask_object_name(job_number, original)
            )
        });

        // Settlement is simulated; see crate::chain.
        let tx_hash = chain::mock_tx_hash();

        let (job, payment) = self
            .store
            .create_job_with_payment(
                NewJob {
                    display_id: display_id.clone(),
                    user_id: user.id,
                    model_id,
                    name: submission.name.clone(),
                    parameters: submission.parameters(),
                    mask_file_url,
                    cost,
                    transaction_hash: tx_hash.clone(),
                },
                NewTransaction {
                    user_id: user.id,
                    tx_type: TransactionType::JobPayment,
                    amount: cost,
                    amount_in_wei: chain::to_wei(cost),
                    tx_hash,
                    from_address: user.wallet_address.clone(),
                    to_address: chain::SETTLEMENT_ADDRESS.to_string(),
                    model_id: None,
                    metadata: serde_json::json!({ "jobId": display_id }),
                },
            )
            .await?;
        debug_assert_eq!(payment.amount, job.cost);

        info!(
            job_id = %job.display_id,
            model_id,
            user_id = user.id,
            cost,
            "job submitted"
        );

        Ok(SubmittedJob {
            job_id: job.display_id,
            name: job.name,
            status: job.status,
            progress: job.progress,
            parameters: job.parameters,
            model_id,
            model_name: model.name,
            cost: pricing::format_cost(cost, &self.currency),
            mask_file_url: job.mask_file_url,
            transaction_hash: job.transaction_hash,
            submitted_at: job.submitted_at,
        })
    }
}
