// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end submission workflow tests against the in-memory store.

use std::sync::Arc;

use lithomarket_node::chain;
use lithomarket_node::marketplace::{JobSubmission, MarketError, Marketplace};
use lithomarket_node::storage::{
    JobStatus, MarketStore, MemoryStore, NewJob, NewModel, NewTransaction, NewUser,
    TransactionType, User,
};

async fn setup() -> (Arc<dyn MarketStore>, User) {
    let store: Arc<dyn MarketStore> = Arc::new(MemoryStore::new());
    let user = store
        .create_user(NewUser {
            username: "john_smith".to_string(),
            wallet_address: "0x71Ce042A9B246bF89f77AAcfC8A4319f5D95551A".to_string(),
            email: None,
        })
        .await
        .unwrap();
    (store, user)
}

async fn add_model(store: &Arc<dyn MarketStore>, name: &str, price: f64) -> u64 {
    store
        .insert_model(NewModel {
            name: name.to_string(),
            description: "test model".to_string(),
            price,
            price_in_wei: chain::to_wei(price),
            author_id: None,
            author_address: Some("0x9999".to_string()),
            category: "Gate Patterning".to_string(),
            features: vec![],
            rating: 4.0,
            num_reviews: 1,
            image_url: None,
        })
        .await
        .unwrap()
        .id
}

async fn marketplace(store: &Arc<dyn MarketStore>) -> Marketplace {
    Marketplace::new(store.clone(), "MATIC", "https://storage.example.com")
        .await
        .unwrap()
}

fn submission(model_id: u64) -> JobSubmission {
    JobSubmission {
        name: "Gate pattern simulation".to_string(),
        model_id: model_id.to_string(),
        resolution: 4.0,
        wavelength: 193.0,
        numerical_aperture: 0.93,
        iterations: 1200,
    }
}

#[tokio::test]
async fn licensed_submission_creates_job_and_matching_payment() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Advanced Gate Pattern v2", 0.20).await;
    let market = marketplace(&store).await;
    market.purchase_model(&user, model_id).await.unwrap();

    let job = market
        .submit_job(&user, submission(model_id), None)
        .await
        .unwrap();

    assert_eq!(job.job_id, "JOB-1000");
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.progress, 0);
    assert_eq!(job.model_name, "Advanced Gate Pattern v2");
    // 0.20 * (1 + (5/4)*0.5 + (1200/1000)*0.5) = 0.445
    assert_eq!(job.cost, "0.445 MATIC");

    let stored = store
        .job_by_display_id(user.id, "JOB-1000")
        .await
        .unwrap()
        .unwrap();
    assert!((stored.cost - 0.445).abs() < 1e-9);

    let txs = store.recent_transactions(user.id, 10).await.unwrap();
    let payment = txs
        .iter()
        .find(|t| t.tx_type == TransactionType::JobPayment)
        .expect("job payment recorded");
    assert_eq!(payment.amount, stored.cost);
    assert_eq!(payment.job_id, Some(stored.id));
    assert_eq!(payment.tx_hash, stored.transaction_hash);
}

#[tokio::test]
async fn unlicensed_submission_is_rejected_without_partial_writes() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Paid Model", 0.10).await;
    let market = marketplace(&store).await;

    let err = market
        .submit_job(&user, submission(model_id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Unauthorized(_)));

    // No job and no ledger entry may exist after the rejection.
    assert!(store
        .jobs_for_user(user.id, Default::default())
        .await
        .unwrap()
        .is_empty());
    assert!(store.recent_transactions(user.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn free_model_needs_no_license() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Free Starter Model", 0.0).await;
    let market = marketplace(&store).await;

    let job = market
        .submit_job(&user, submission(model_id), None)
        .await
        .unwrap();
    assert_eq!(job.cost, "0.000 MATIC");
}

#[tokio::test]
async fn missing_model_is_not_found() {
    let (store, user) = setup().await;
    let market = marketplace(&store).await;
    let err = market
        .submit_job(&user, submission(404), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::ModelNotFound(404)));
}

#[tokio::test]
async fn validation_reports_every_violation() {
    let (store, user) = setup().await;
    let market = marketplace(&store).await;

    let bad = JobSubmission {
        name: "ab".to_string(),
        model_id: String::new(),
        resolution: -2.0,
        wavelength: 0.0,
        numerical_aperture: 2.0,
        iterations: 0,
    };
    match market.submit_job(&user, bad, None).await.unwrap_err() {
        MarketError::Validation(violations) => assert_eq!(violations.len(), 6),
        other => panic!("expected validation error, got {other}"),
    }
}

#[tokio::test]
async fn identifiers_increase_across_submissions() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Free Model", 0.0).await;
    let market = marketplace(&store).await;

    let first = market
        .submit_job(&user, submission(model_id), None)
        .await
        .unwrap();
    let second = market
        .submit_job(&user, submission(model_id), None)
        .await
        .unwrap();
    assert_eq!(first.job_id, "JOB-1000");
    assert_eq!(second.job_id, "JOB-1001");
}

#[tokio::test]
async fn allocator_resumes_from_stored_sequence() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Free Model", 0.0).await;
    store
        .create_job_with_payment(
            NewJob {
                display_id: "JOB-4821".to_string(),
                user_id: user.id,
                model_id,
                name: "previous run".to_string(),
                parameters: lithomarket_node::storage::JobParameters {
                    resolution: 5.0,
                    wavelength: 193.0,
                    numerical_aperture: 0.9,
                    iterations: 1000,
                },
                mask_file_url: None,
                cost: 0.0,
                transaction_hash: "0x00".to_string(),
            },
            NewTransaction {
                user_id: user.id,
                tx_type: TransactionType::JobPayment,
                amount: 0.0,
                amount_in_wei: "0".to_string(),
                tx_hash: "0x00".to_string(),
                from_address: user.wallet_address.clone(),
                to_address: chain::SETTLEMENT_ADDRESS.to_string(),
                model_id: None,
                metadata: serde_json::json!({}),
            },
        )
        .await
        .unwrap();

    let market = marketplace(&store).await;
    let job = market
        .submit_job(&user, submission(model_id), None)
        .await
        .unwrap();
    assert_eq!(job.job_id, "JOB-4822");
}

#[tokio::test]
async fn corrupt_stored_identifier_refuses_startup() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Free Model", 0.0).await;
    store
        .create_job_with_payment(
            NewJob {
                display_id: "JOB-oops".to_string(),
                user_id: user.id,
                model_id,
                name: "corrupt row".to_string(),
                parameters: lithomarket_node::storage::JobParameters {
                    resolution: 5.0,
                    wavelength: 193.0,
                    numerical_aperture: 0.9,
                    iterations: 1000,
                },
                mask_file_url: None,
                cost: 0.0,
                transaction_hash: "0x00".to_string(),
            },
            NewTransaction {
                user_id: user.id,
                tx_type: TransactionType::JobPayment,
                amount: 0.0,
                amount_in_wei: "0".to_string(),
                tx_hash: "0x00".to_string(),
                from_address: user.wallet_address.clone(),
                to_address: chain::SETTLEMENT_ADDRESS.to_string(),
                model_id: None,
                metadata: serde_json::json!({}),
            },
        )
        .await
        .unwrap();

    let result = Marketplace::new(store, "MATIC", "https://storage.example.com").await;
    assert!(matches!(result, Err(MarketError::CorruptState(_))));
}

#[tokio::test]
async fn mask_file_gets_deterministic_storage_url() {
    let (store, user) = setup().await;
    let model_id = add_model(&store, "Free Model", 0.0).await;
    let market = marketplace(&store).await;

    let job = market
        .submit_job(&user, submission(model_id), Some("layout_final.gds"))
        .await
        .unwrap();
    assert_eq!(
        job.mask_file_url.as_deref(),
        Some("https://storage.example.com/masks/JOB-1000.gds")
    );
}
