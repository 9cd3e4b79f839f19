// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Environment-driven node configuration.

use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Display currency for formatted amounts.
    pub currency: String,
    /// Base URL the mask-file storage collaborator serves objects from.
    pub mask_storage_base: String,
    /// Seed the demo catalog into an empty store at startup.
    pub seed_catalog: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 8080).into(),
            currency: "MATIC".to_string(),
            mask_storage_base: "https://storage.example.com".to_string(),
            seed_catalog: true,
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let bind_addr = format!("{}:{}", host, port)
            .parse()
            .unwrap_or(defaults.bind_addr);

        Self {
            bind_addr,
            currency: env::var("CURRENCY").unwrap_or(defaults.currency),
            mask_storage_base: env::var("MASK_STORAGE_BASE")
                .unwrap_or(defaults.mask_storage_base),
            seed_catalog: env::var("SEED_CATALOG")
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.seed_catalog),
        }
    }
}
