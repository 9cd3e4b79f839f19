// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod chain;
pub mod config;
pub mod marketplace;
pub mod storage;
pub mod wallet;

// Re-export main types
pub use api::{build_router, start_server, ApiError, AppState};
pub use config::NodeConfig;
pub use marketplace::{
    FieldViolation, JobIdAllocator, JobSubmission, LicenseGate, MarketError, Marketplace,
    PurchaseReceipt, SubmittedJob,
};
pub use storage::{
    Job, JobParameters, JobStatus, MarketStore, MemoryStore, Model, ModelLicense, Transaction,
    TransactionType, User,
};
pub use wallet::{verify_wallet_signature, SessionRegistry};
