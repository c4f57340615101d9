//! # Hash Precompiles
//!
//! SHA-256 (0x02) and RIPEMD-160 (0x03). The RIPEMD digest is 20 bytes,
//! returned left-padded to 32.

use super::{linear_gas, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

const SHA256_BASE_GAS: u64 = 60;
const SHA256_WORD_GAS: u64 = 12;

const RIPEMD160_BASE_GAS: u64 = 600;
const RIPEMD160_WORD_GAS: u64 = 120;

/// The SHA-256 precompile.
pub struct Sha256Hash;

impl Precompile for Sha256Hash {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let cost = linear_gas(SHA256_BASE_GAS, SHA256_WORD_GAS, input.len());
        if cost > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }
        let digest = Sha256::digest(input);
        Ok(PrecompileOutput::new(cost, digest.to_vec()))
    }
}

/// The RIPEMD-160 precompile.
pub struct Ripemd160Hash;

impl Precompile for Ripemd160Hash {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let cost = linear_gas(RIPEMD160_BASE_GAS, RIPEMD160_WORD_GAS, input.len());
        if cost > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }
        let digest = Ripemd160::digest(input);
        let mut output = vec![0u8; 32];
        output[12..].copy_from_slice(&digest);
        Ok(PrecompileOutput::new(cost, output))
    }
}
