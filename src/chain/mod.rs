// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! Simulated settlement layer.
//!
//! No real chain calls happen here: transaction hashes are random 32-byte
//! values and the wei conversion exists only so ledger rows carry the shape
//! a real settlement integration would produce. Swapping this module for an
//! actual client is the intended upgrade path.

use rand::RngCore;

/// Receiving address for job payments until real escrow settlement lands.
pub const SETTLEMENT_ADDRESS: &str = "0x0000000000000000000000000000000000000001";

/// Mock transaction hash: `0x` followed by 64 hex characters.
pub fn mock_tx_hash() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// Decimal token amount to a wei string (18 decimals). Mock precision:
/// amounts here are small catalog prices, well within f64 range.
pub fn to_wei(amount: f64) -> String {
    let wei = (amount * 1e18).round() as u128;
    wei.to_string()
}
