// Copyright (c) 2025 Lithomarket
// SPDX-License-Identifier: BUSL-1.1
//! ECDSA wallet-signature verification.
//!
//! Proves control of a wallet address during connect: the login message is
//! hashed with the EIP-191 personal-message prefix, the signer's address is
//! recovered from the 65-byte compact signature, and the result is compared
//! to the claimed address.

use anyhow::{anyhow, Result};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 over the EIP-191 personal-message envelope:
/// `"\x19Ethereum Signed Message:\n" + len(message) + message`.
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize(&mut hash);
    hash
}

/// Recover the signer's address from a 65-byte compact signature (r + s + v)
/// over a 32-byte prehash. Ethereum-style recovery ids (27/28) are
/// normalized to 0/1. Returns the 0x-prefixed lowercase hex address.
pub fn recover_signer(signature: &[u8], message_hash: &[u8; 32]) -> Result<String> {
    if signature.len() != 65 {
        return Err(anyhow!(
            "Invalid signature size: expected 65 bytes, got {}",
            signature.len()
        ));
    }

    let mut recovery_id = signature[64];
    if recovery_id >= 27 {
        recovery_id -= 27;
    }
    if recovery_id > 3 {
        return Err(anyhow!(
            "Invalid recovery ID: expected 0-3, got {}",
            recovery_id
        ));
    }
    let recovery_id = RecoveryId::try_from(recovery_id)
        .map_err(|e| anyhow!("Failed to create recovery ID: {}", e))?;

    let parsed = Signature::try_from(&signature[..64])
        .map_err(|e| anyhow!("Failed to parse signature: {}", e))?;

    let verifying_key = VerifyingKey::recover_from_prehash(message_hash, &parsed, recovery_id)
        .map_err(|e| anyhow!("Failed to recover public key: {}", e))?;

    // Ethereum address: last 20 bytes of keccak-256 over the uncompressed
    // public key, minus its 0x04 prefix byte.
    let public_key = verifying_key.to_encoded_point(false);
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(&public_key.as_bytes()[1..]);
    hasher.finalize(&mut hash);

    Ok(format!("0x{}", hex::encode(&hash[12..])))
}

/// Verify that `signature_hex` over `message` was produced by
/// `claimed_address`. Address comparison ignores checksum casing.
pub fn verify_wallet_signature(
    claimed_address: &str,
    signature_hex: &str,
    message: &str,
) -> Result<bool> {
    let raw = hex::decode(signature_hex.trim_start_matches("0x"))
        .map_err(|e| anyhow!("Invalid signature encoding: {}", e))?;
    let hash = personal_message_hash(message);
    let recovered = recover_signer(&raw, &hash)?;
    Ok(recovered.eq_ignore_ascii_case(claimed_address))
}
