// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Demo catalog seeding for local development and tests.

use anyhow::Result;
use tracing::info;

use super::{MarketStore, ModelFilter, NewModel, NewUser};
use crate::chain;

struct SeedModel {
    name: &'static str,
    description: &'static str,
    price: f64,
    category: &'static str,
    features: &'static [&'static str],
    rating: f64,
    num_reviews: u32,
}

const CATALOG: &[SeedModel] = &[
    SeedModel {
        name: "Advanced EUV Mask Defect Analysis",
        description: "High precision model for EUV pattern analysis",
        price: 0.15,
        category: "EUV Lithography",
        features: &["Defect detection", "Pattern fidelity", "EUV-optimized"],
        rating: 4.5,
        num_reviews: 27,
    },
    SeedModel {
        name: "FinFET Process Simulation",
        description: "Complete 7nm process with optimized parameters",
        price: 0.22,
        category: "FinFET Process",
        features: &["7nm process", "High aspect ratio", "Production-ready"],
        rating: 5.0,
        num_reviews: 32,
    },
    SeedModel {
        name: "Multi-Patterning Optimization",
        description: "SADP and SAQP decomposition with overlay control",
        price: 0.18,
        category: "Multi-Patterning",
        features: &["SADP", "SAQP", "Overlay-aware"],
        rating: 4.2,
        num_reviews: 19,
    },
    SeedModel {
        name: "Advanced Gate Pattern v2",
        description: "Gate-level patterning tuned for 5nm nodes",
        price: 0.20,
        category: "Gate Patterning",
        features: &["5nm resolution", "OPC-ready"],
        rating: 4.7,
        num_reviews: 24,
    },
    SeedModel {
        name: "Line Edge Roughness Analysis",
        description: "Statistical LER/LWR characterization for critical dimensions",
        price: 0.12,
        category: "Line Edge Roughness",
        features: &["LER", "LWR", "CD statistics"],
        rating: 4.0,
        num_reviews: 15,
    },
    SeedModel {
        name: "DRAM Cell Patterning",
        description: "Memory array patterning with honeycomb layouts",
        price: 0.25,
        category: "DRAM Cell",
        features: &["Honeycomb layout", "Array simulation"],
        rating: 4.4,
        num_reviews: 21,
    },
];

/// Seed the demo catalog under an author user. Idempotent: does nothing if
/// models already exist.
pub async fn seed_catalog(store: &dyn MarketStore) -> Result<()> {
    if !store.list_models(ModelFilter::default()).await?.is_empty() {
        return Ok(());
    }

    let author = store
        .create_user(NewUser {
            username: "semiconductor_expert".to_string(),
            wallet_address: "0x4a27c8F749D19B121D324F97ffaDB00D46489aE1".to_string(),
            email: Some("expert@example.com".to_string()),
        })
        .await?;

    for model in CATALOG {
        store
            .insert_model(NewModel {
                name: model.name.to_string(),
                description: model.description.to_string(),
                price: model.price,
                price_in_wei: chain::to_wei(model.price),
                author_id: Some(author.id),
                author_address: Some(author.wallet_address.clone()),
                category: model.category.to_string(),
                features: model.features.iter().map(|f| f.to_string()).collect(),
                rating: model.rating,
                num_reviews: model.num_reviews,
                image_url: None,
            })
            .await?;
    }

    info!(models = CATALOG.len(), "seeded demo catalog");
    Ok(())
}
