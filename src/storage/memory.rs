// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! In-memory [`MarketStore`] backed by `tokio::sync::RwLock` tables. All
//! tables live behind one lock so the paired record+ledger inserts are
//! atomic: a writer either commits both rows or neither.

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::entities::*;
use super::{DashboardCounts, JobFilter, MarketStore, ModelFilter};

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    models: BTreeMap<u64, Model>,
    licenses: BTreeMap<u64, ModelLicense>,
    jobs: BTreeMap<u64, Job>,
    transactions: BTreeMap<u64, Transaction>,
    next_user_id: u64,
    next_model_id: u64,
    next_license_id: u64,
    next_job_id: u64,
    next_transaction_id: u64,
}

impl Tables {
    fn new() -> Self {
        Self {
            next_user_id: 1,
            next_model_id: 1,
            next_license_id: 1,
            next_job_id: 1,
            next_transaction_id: 1,
            ..Default::default()
        }
    }

    fn insert_transaction(&mut self, payment: NewTransaction, job_id: Option<u64>) -> Transaction {
        let id = self.next_transaction_id;
        self.next_transaction_id += 1;
        let tx = Transaction {
            id,
            user_id: payment.user_id,
            tx_type: payment.tx_type,
            amount: payment.amount,
            amount_in_wei: payment.amount_in_wei,
            tx_hash: payment.tx_hash,
            from_address: payment.from_address,
            to_address: payment.to_address,
            job_id,
            model_id: payment.model_id,
            status: "confirmed".to_string(),
            metadata: payment.metadata,
            created_at: Utc::now(),
        };
        self.transactions.insert(id, tx.clone());
        tx
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_search(haystacks: &[&str], term: &str) -> bool {
    let term = term.to_lowercase();
    haystacks.iter().any(|h| h.to_lowercase().contains(&term))
}

#[async_trait::async_trait]
impl MarketStore for MemoryStore {
    async fn user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.wallet_address.eq_ignore_ascii_case(wallet_address))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        let id = tables.next_user_id;
        tables.next_user_id += 1;
        let user = User {
            id,
            username: user.username,
            wallet_address: user.wallet_address,
            email: user.email,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn upsert_wallet_user(&self, wallet_address: &str) -> Result<User> {
        if let Some(existing) = self.user_by_wallet(wallet_address).await? {
            return Ok(existing);
        }
        let suffix = Uuid::new_v4().simple().to_string();
        self.create_user(NewUser {
            username: format!("user_{}", &suffix[..8]),
            wallet_address: wallet_address.to_string(),
            email: None,
        })
        .await
    }

    async fn model_by_id(&self, model_id: u64) -> Result<Option<Model>> {
        let tables = self.tables.read().await;
        Ok(tables.models.get(&model_id).cloned())
    }

    async fn list_models(&self, filter: ModelFilter) -> Result<Vec<Model>> {
        let tables = self.tables.read().await;
        let mut models: Vec<Model> = tables
            .models
            .values()
            .filter(|m| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| m.category == c)
            })
            .filter(|m| {
                filter
                    .price_range
                    .map_or(true, |(min, max)| m.price >= min && m.price <= max)
            })
            .filter(|m| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |t| matches_search(&[&m.name, &m.description], t))
            })
            .filter(|m| filter.min_rating.map_or(true, |r| m.rating >= r))
            .cloned()
            .collect();
        models.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(limit) = filter.limit {
            models.truncate(limit);
        }
        Ok(models)
    }

    async fn model_categories(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<String> =
            tables.models.values().map(|m| m.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn insert_model(&self, model: NewModel) -> Result<Model> {
        let mut tables = self.tables.write().await;
        let id = tables.next_model_id;
        tables.next_model_id += 1;
        let model = Model {
            id,
            name: model.name,
            description: model.description,
            price: model.price,
            price_in_wei: model.price_in_wei,
            author_id: model.author_id,
            author_address: model.author_address,
            category: model.category,
            features: model.features,
            rating: model.rating,
            num_reviews: model.num_reviews,
            image_url: model.image_url,
            created_at: Utc::now(),
        };
        tables.models.insert(id, model.clone());
        Ok(model)
    }

    async fn license_for(&self, user_id: u64, model_id: u64) -> Result<Option<ModelLicense>> {
        let tables = self.tables.read().await;
        Ok(tables
            .licenses
            .values()
            .find(|l| l.user_id == user_id && l.model_id == model_id)
            .cloned())
    }

    async fn licensed_model_ids(&self, user_id: u64) -> Result<Vec<u64>> {
        let tables = self.tables.read().await;
        Ok(tables
            .licenses
            .values()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.model_id)
            .collect())
    }

    async fn create_license_with_payment(
        &self,
        license: NewLicense,
        payment: NewTransaction,
    ) -> Result<(ModelLicense, Transaction)> {
        let mut tables = self.tables.write().await;
        // Re-check uniqueness under the write lock; the gate's earlier read
        // may have raced with another purchase.
        if tables
            .licenses
            .values()
            .any(|l| l.user_id == license.user_id && l.model_id == license.model_id)
        {
            return Err(anyhow!(
                "license already exists for user {} and model {}",
                license.user_id,
                license.model_id
            ));
        }
        let id = tables.next_license_id;
        tables.next_license_id += 1;
        let row = ModelLicense {
            id,
            user_id: license.user_id,
            model_id: license.model_id,
            wallet_address: license.wallet_address,
            transaction_hash: license.transaction_hash,
            acquired_at: Utc::now(),
        };
        tables.licenses.insert(id, row.clone());
        let tx = tables.insert_transaction(payment, None);
        Ok((row, tx))
    }

    async fn latest_job_display_id(&self) -> Result<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .next_back()
            .map(|j| j.display_id.clone()))
    }

    async fn create_job_with_payment(
        &self,
        job: NewJob,
        payment: NewTransaction,
    ) -> Result<(Job, Transaction)> {
        let mut tables = self.tables.write().await;
        let id = tables.next_job_id;
        tables.next_job_id += 1;
        let row = Job {
            id,
            display_id: job.display_id,
            user_id: job.user_id,
            model_id: job.model_id,
            name: job.name,
            status: JobStatus::Queued,
            progress: 0,
            parameters: job.parameters,
            mask_file_url: job.mask_file_url,
            cost: job.cost,
            transaction_hash: job.transaction_hash,
            submitted_at: Utc::now(),
            completed_at: None,
            result_id: None,
            result_file_url: None,
            result_image_url: None,
        };
        tables.jobs.insert(id, row.clone());
        let tx = tables.insert_transaction(payment, Some(id));
        Ok((row, tx))
    }

    async fn job_by_display_id(&self, user_id: u64, display_id: &str) -> Result<Option<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .find(|j| j.user_id == user_id && j.display_id == display_id)
            .cloned())
    }

    async fn jobs_for_user(&self, user_id: u64, filter: JobFilter) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        let mut jobs: Vec<Job> = tables
            .jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .filter(|j| filter.status.map_or(true, |s| j.status == s))
            .filter(|j| !filter.active_only || j.status.is_active())
            .filter(|j| {
                filter.search.as_deref().map_or(true, |t| {
                    let model_name = tables
                        .models
                        .get(&j.model_id)
                        .map(|m| m.name.as_str())
                        .unwrap_or("");
                    matches_search(&[&j.name, &j.display_id, model_name], t)
                })
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        if let Some(limit) = filter.limit {
            jobs.truncate(limit);
        }
        Ok(jobs)
    }

    async fn recent_results(&self, user_id: u64, limit: usize) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        let mut jobs: Vec<Job> = tables
            .jobs
            .values()
            .filter(|j| {
                j.user_id == user_id
                    && j.status == JobStatus::Completed
                    && j.result_id.is_some()
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn update_job_status(
        &self,
        display_id: &str,
        status: JobStatus,
        progress: u8,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let job = tables
            .jobs
            .values_mut()
            .find(|j| j.display_id == display_id)
            .ok_or_else(|| anyhow!("job {} not found", display_id))?;
        job.status = status;
        job.progress = progress.min(100);
        Ok(())
    }

    async fn complete_job(&self, display_id: &str, result: JobResultRefs) -> Result<()> {
        let mut tables = self.tables.write().await;
        let job = tables
            .jobs
            .values_mut()
            .find(|j| j.display_id == display_id)
            .ok_or_else(|| anyhow!("job {} not found", display_id))?;
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.completed_at = Some(Utc::now());
        job.result_id = Some(result.result_id);
        job.result_file_url = result.result_file_url;
        job.result_image_url = result.result_image_url;
        Ok(())
    }

    async fn recent_transactions(&self, user_id: u64, limit: usize) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut txs: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        txs.truncate(limit);
        Ok(txs)
    }

    async fn dashboard_counts(&self, user_id: u64) -> Result<DashboardCounts> {
        let tables = self.tables.read().await;
        let mut counts = DashboardCounts::default();
        for job in tables.jobs.values().filter(|j| j.user_id == user_id) {
            if job.status.is_active() {
                counts.active_jobs += 1;
            } else if job.status == JobStatus::Completed {
                counts.completed_jobs += 1;
            }
        }
        counts.owned_models = tables
            .licenses
            .values()
            .filter(|l| l.user_id == user_id)
            .count() as u64;
        Ok(counts)
    }
}
