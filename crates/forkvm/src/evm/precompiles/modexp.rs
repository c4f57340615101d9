//! # Modexp Precompile (0x05)
//!
//! Arbitrary-precision modular exponentiation (EIP-198), repriced by
//! EIP-2565 at Berlin. Input: three 32-byte lengths, then base, exponent,
//! and modulus, each zero-padded on read.

use super::{Precompile, PrecompileOutput};
use crate::domain::value_objects::U256;
use crate::errors::PrecompileError;
use num::BigUint;

/// EIP-2565 minimum price.
const MIN_GAS: u64 = 200;

/// The modexp precompile. Byzantium and Berlin differ only in the gas
/// formula.
pub struct ModExp {
    eip2565: bool,
}

impl ModExp {
    /// The EIP-198 original.
    #[must_use]
    pub fn byzantium() -> Self {
        Self { eip2565: false }
    }

    /// The EIP-2565 repricing.
    #[must_use]
    pub fn berlin() -> Self {
        Self { eip2565: true }
    }

    fn required_gas(&self, base_len: u64, exp_len: u64, mod_len: u64, exp_head: U256) -> u64 {
        let adjusted_exp_len = adjusted_exponent_length(exp_len, exp_head).max(1);
        let max_len = base_len.max(mod_len);

        if self.eip2565 {
            // ceil(max_len / 8)^2 words of multiplication complexity.
            let words = max_len.div_ceil(8) as u128;
            let complexity = words.saturating_mul(words);
            let gas = complexity.saturating_mul(adjusted_exp_len as u128) / 3;
            gas.min(u64::MAX as u128).max(MIN_GAS as u128) as u64
        } else {
            let complexity = byzantium_mult_complexity(max_len as u128);
            let gas = complexity.saturating_mul(adjusted_exp_len as u128) / 20;
            gas.min(u64::MAX as u128) as u64
        }
    }
}

impl Precompile for ModExp {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let base_len = read_length(input, 0);
        let exp_len = read_length(input, 32);
        let mod_len = read_length(input, 64);

        // Lengths that cannot fit an address space price themselves out.
        let (Ok(base_len), Ok(exp_len), Ok(mod_len)) = (
            u64::try_from(base_len),
            u64::try_from(exp_len),
            u64::try_from(mod_len),
        ) else {
            return Err(PrecompileError::OutOfGas);
        };

        // The first 32 exponent bytes drive the iteration count.
        let exp_head = {
            let start = 96u64.saturating_add(base_len);
            let head = read_padded(input, start, exp_len.min(32));
            U256::from_big_endian(&head)
        };

        let cost = self.required_gas(base_len, exp_len, mod_len, exp_head);
        if cost > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }

        if mod_len == 0 {
            return Ok(PrecompileOutput::empty(cost));
        }

        let base = BigUint::from_bytes_be(&read_padded(input, 96, base_len));
        let exponent = BigUint::from_bytes_be(&read_padded(input, 96 + base_len, exp_len));
        let modulus = BigUint::from_bytes_be(&read_padded(
            input,
            96 + base_len + exp_len,
            mod_len,
        ));

        // Anything mod zero is zero; the output keeps the modulus width.
        let result = if modulus == BigUint::from(0u8) {
            Vec::new()
        } else {
            base.modpow(&exponent, &modulus).to_bytes_be()
        };

        // Left-pad the result to the modulus length. The residue is always
        // narrower than the modulus.
        let mod_len = mod_len as usize;
        let mut output = vec![0u8; mod_len];
        output[mod_len - result.len()..].copy_from_slice(&result);

        Ok(PrecompileOutput::new(cost, output))
    }
}

/// One 32-byte big-endian length field, zero-padded past the input.
fn read_length(input: &[u8], offset: usize) -> U256 {
    let mut word = [0u8; 32];
    for (i, byte) in word.iter_mut().enumerate() {
        if let Some(&b) = input.get(offset + i) {
            *byte = b;
        }
    }
    U256::from_big_endian(&word)
}

/// `len` bytes starting at `offset`, zero-padded past the input.
fn read_padded(input: &[u8], offset: u64, len: u64) -> Vec<u8> {
    let len = len as usize;
    let mut out = vec![0u8; len];
    if let Ok(offset) = usize::try_from(offset) {
        for (i, byte) in out.iter_mut().enumerate() {
            if let Some(&b) = offset.checked_add(i).and_then(|pos| input.get(pos)) {
                *byte = b;
            }
        }
    }
    out
}

/// EIP-198 multiplication complexity, piecewise quadratic.
fn byzantium_mult_complexity(x: u128) -> u128 {
    if x <= 64 {
        x * x
    } else if x <= 1024 {
        x * x / 4 + 96 * x - 3072
    } else {
        x.saturating_mul(x) / 16 + 480 * x - 199_680
    }
}

/// EIP-198 adjusted exponent length: the bit length of the exponent head,
/// plus 8 per byte beyond 32.
fn adjusted_exponent_length(exp_len: u64, exp_head: U256) -> u64 {
    let head_bits = if exp_head.is_zero() {
        0
    } else {
        256 - u64::from(exp_head.leading_zeros()) - 1
    };
    if exp_len <= 32 {
        head_bits
    } else {
        8 * (exp_len - 32) + head_bits
    }
}

// =============================================================================
// TESTS
// =============================================================================
