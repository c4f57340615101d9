//! # Domain Services
//!
//! Pure, deterministic helpers: hashing and contract-address derivation.

use crate::domain::value_objects::{Address, Hash};
use sha3::{Digest, Keccak256};

// =============================================================================
// KECCAK-256
// =============================================================================

/// Computes the Keccak-256 hash of data (the pre-standard Keccak, not
/// NIST SHA3-256).
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    Hash::new(hash.into())
}

/// Keccak-256 of the empty string, the code hash of every account without
/// code.
#[must_use]
pub fn empty_code_hash() -> Hash {
    keccak256(&[])
}

// =============================================================================
// CONTRACT ADDRESS DERIVATION
// =============================================================================

/// Computes the contract address for CREATE.
///
/// Address = keccak256(rlp(\[sender, nonce\]))\[12..\]
///
/// The RLP encoding of this one fixed shape (20-byte string, small integer)
/// is produced inline.
#[must_use]
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(32);

    // 20-byte address string: 0x80 + 20.
    content.push(0x94);
    content.extend_from_slice(sender.as_bytes());

    // Nonce as a minimal big-endian integer.
    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 128 {
        content.push(nonce as u8);
    } else {
        let nonce_bytes = strip_leading_zeros(nonce);
        content.push(0x80 + nonce_bytes.len() as u8);
        content.extend_from_slice(&nonce_bytes);
    }

    // List header; the payload never reaches 56 bytes.
    let mut encoded = Vec::with_capacity(content.len() + 1);
    encoded.push(0xC0 + content.len() as u8);
    encoded.extend_from_slice(&content);

    let hash = Keccak256::digest(&encoded);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

/// Computes the contract address for CREATE2 (EIP-1014).
///
/// Address = keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))\[12..\]
#[must_use]
pub fn create2_address(sender: Address, salt: Hash, init_code: &[u8]) -> Address {
    let code_hash = Keccak256::digest(init_code);

    let mut data = Vec::with_capacity(85);
    data.push(0xFF);
    data.extend_from_slice(sender.as_bytes());
    data.extend_from_slice(salt.as_bytes());
    data.extend_from_slice(&code_hash);

    let hash = Keccak256::digest(&data);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

/// Derives an account address from an uncompressed public key (64 bytes,
/// without the 0x04 prefix): the low 20 bytes of its Keccak-256 hash.
#[must_use]
pub fn address_from_pubkey(public_key: &[u8]) -> Address {
    let hash = Keccak256::digest(public_key);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

fn strip_leading_zeros(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

// =============================================================================
// TESTS
// =============================================================================
