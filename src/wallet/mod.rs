// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Wallet authentication: ECDSA signature verification plus the bearer-token
//! session registry the HTTP layer resolves callers through.

pub mod signature;

pub use signature::{personal_message_hash, recover_signer, verify_wallet_signature};

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Maps opaque bearer tokens to connected wallet addresses. Tokens are
/// minted on wallet connect and revoked on disconnect; nothing here expires
/// on its own.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh session token for a verified wallet address.
    pub async fn issue(&self, wallet_address: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), wallet_address.to_string());
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
