// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use lithomarket_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    marketplace::Marketplace,
    storage::{seed, MarketStore, MemoryStore},
    wallet::SessionRegistry,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::from_env();
    tracing::info!(?config, "starting lithomarket node");

    let store: Arc<dyn MarketStore> = Arc::new(MemoryStore::new());
    if config.seed_catalog {
        seed::seed_catalog(store.as_ref()).await?;
    }

    // Fails here if the stored job-identifier sequence is corrupt; better to
    // refuse to start than to mint colliding or random identifiers.
    let marketplace = Marketplace::new(
        store,
        config.currency.clone(),
        config.mask_storage_base.clone(),
    )
    .await?;

    let state = AppState {
        marketplace: Arc::new(marketplace),
        sessions: Arc::new(SessionRegistry::new()),
        config: config.clone(),
    };

    start_server(state, config.bind_addr).await
}
