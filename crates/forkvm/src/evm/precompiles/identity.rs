//! # Identity Precompile (0x04)
//!
//! Copies its input to its output. Gas: 15 + 3 per word.

use super::{linear_gas, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;

const IDENTITY_BASE_GAS: u64 = 15;
const IDENTITY_WORD_GAS: u64 = 3;

/// The data-copy precompile.
pub struct Identity;

impl Precompile for Identity {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let cost = linear_gas(IDENTITY_BASE_GAS, IDENTITY_WORD_GAS, input.len());
        if cost > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }
        Ok(PrecompileOutput::new(cost, input.to_vec()))
    }
}
