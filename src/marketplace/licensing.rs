// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! License gating and model purchase.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::{pricing, MarketError};
use crate::chain;
use crate::storage::{
    MarketStore, NewLicense, NewTransaction, TransactionType, User,
};

/// Decides whether a caller may submit jobs against a model.
///
/// Free models (`price == 0`) are licensed to everyone; the branch is kept
/// explicit here rather than folded into the license lookup so the rule
/// stays visible and testable on its own. Paid models require an explicit
/// license row. Pure read, no side effects.
pub struct LicenseGate {
    store: Arc<dyn MarketStore>,
}

impl LicenseGate {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn authorize(&self, user_id: u64, model_id: u64) -> Result<bool, MarketError> {
        let model = self
            .store
            .model_by_id(model_id)
            .await?
            .ok_or(MarketError::ModelNotFound(model_id))?;
        if model.price == 0.0 {
            return Ok(true);
        }
        Ok(self.store.license_for(user_id, model_id).await?.is_some())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub success: bool,
    pub license_id: u64,
    pub model_id: u64,
    pub model_name: String,
    pub price: String,
    pub transaction_hash: String,
}

/// Purchase a license for `model_id`.
///
/// Rejects duplicate purchases for an already-licensed (user, model) pair,
/// then writes the license and its `model_purchase` transaction as one
/// atomic storage operation.
pub async fn purchase_model(
    store: &Arc<dyn MarketStore>,
    user: &User,
    model_id: u64,
    currency: &str,
) -> Result<PurchaseReceipt, MarketError> {
    if store.license_for(user.id, model_id).await?.is_some() {
        return Err(MarketError::AlreadyLicensed(model_id));
    }

    let model = store
        .model_by_id(model_id)
        .await?
        .ok_or(MarketError::ModelNotFound(model_id))?;

    // Settlement is simulated; see crate::chain.
    let tx_hash = chain::mock_tx_hash();
    let to_address = model
        .author_address
        .clone()
        .unwrap_or_else(|| chain::SETTLEMENT_ADDRESS.to_string());

    let (license, _payment) = store
        .create_license_with_payment(
            NewLicense {
                user_id: user.id,
                model_id,
                wallet_address: user.wallet_address.clone(),
                transaction_hash: tx_hash.clone(),
            },
            NewTransaction {
                user_id: user.id,
                tx_type: TransactionType::ModelPurchase,
                amount: model.price,
                amount_in_wei: model.price_in_wei.clone(),
                tx_hash: tx_hash.clone(),
                from_address: user.wallet_address.clone(),
                to_address,
                model_id: Some(model_id),
                metadata: serde_json::json!({ "modelName": model.name }),
            },
        )
        .await?;

    info!(
        model_id,
        user_id = user.id,
        tx_hash = %tx_hash,
        "model license purchased"
    );

    Ok(PurchaseReceipt {
        success: true,
        license_id: license.id,
        model_id,
        model_name: model.name,
        price: pricing::format_cost(model.price, currency),
        transaction_hash: tx_hash,
    })
}
