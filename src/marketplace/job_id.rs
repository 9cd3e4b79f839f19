// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Monotonic job-identifier allocation.
//!
//! Display identifiers have the form `JOB-<n>` with `n` strictly increasing
//! and starting at 1000. The counter is seeded once from storage at startup
//! and advanced with an atomic fetch-add, so concurrent submissions can
//! never mint the same identifier. A malformed identifier in storage is
//! surfaced as [`MarketError::CorruptState`] at seed time.

use std::sync::atomic::{AtomicU64, Ordering};

use super::MarketError;
use crate::storage::MarketStore;

/// First value of the sequence when no job exists yet.
pub const SEQUENCE_START: u64 = 1000;

pub fn format_display_id(n: u64) -> String {
    format!("JOB-{}", n)
}

/// Parse the numeric suffix of a stored `JOB-<digits>` identifier.
pub fn parse_display_id(id: &str) -> Result<u64, MarketError> {
    id.strip_prefix("JOB-")
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| {
            MarketError::CorruptState(format!("unparsable job identifier {:?} in storage", id))
        })
}

#[derive(Debug)]
pub struct JobIdAllocator {
    next: AtomicU64,
}

impl JobIdAllocator {
    /// Seed the counter from the newest stored job. Runs once at startup,
    /// before the server accepts submissions.
    pub async fn seed(store: &dyn MarketStore) -> Result<Self, MarketError> {
        let next = match store.latest_job_display_id().await? {
            None => SEQUENCE_START,
            Some(id) => parse_display_id(&id)? + 1,
        };
        Ok(Self {
            next: AtomicU64::new(next),
        })
    }

    #[cfg(test)]
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Mint the next identifier. Safe under concurrent submissions.
    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
