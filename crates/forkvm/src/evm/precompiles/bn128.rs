//! # alt_bn128 Precompiles
//!
//! Curve addition (0x06), scalar multiplication (0x07), and the pairing
//! check (0x08) over alt_bn128, per EIP-196/EIP-197, with the EIP-1108
//! Istanbul re-pricing. Points off the curve are a hard failure, not a
//! soft empty return.

use super::{Precompile, PrecompileOutput};
use crate::errors::PrecompileError;
use substrate_bn::{pairing_batch, AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};

const ADD_INPUT_LEN: usize = 128;
const MUL_INPUT_LEN: usize = 96;
const PAIR_ELEMENT_LEN: usize = 192;

/// Reads one field element at `pos`.
fn read_fq(input: &[u8], pos: usize) -> Result<Fq, PrecompileError> {
    Fq::from_slice(&input[pos..pos + 32])
        .map_err(|_| PrecompileError::InvalidInput("bn128 field element"))
}

/// Reads the curve point `(x, y)` at `pos`; `(0, 0)` is the identity.
fn read_g1(input: &[u8], pos: usize) -> Result<G1, PrecompileError> {
    let px = read_fq(input, pos)?;
    let py = read_fq(input, pos + 32)?;

    if px == Fq::zero() && py == Fq::zero() {
        Ok(G1::zero())
    } else {
        AffineG1::new(px, py)
            .map(Into::into)
            .map_err(|_| PrecompileError::InvalidInput("bn128 point not on curve"))
    }
}

/// Serializes a G1 point into 64 big-endian bytes; the identity is all
/// zeros.
fn write_g1(point: G1) -> Result<Vec<u8>, PrecompileError> {
    let mut output = vec![0u8; 64];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine
            .x()
            .to_big_endian(&mut output[0..32])
            .map_err(|_| PrecompileError::InvalidInput("bn128 serialization"))?;
        affine
            .y()
            .to_big_endian(&mut output[32..64])
            .map_err(|_| PrecompileError::InvalidInput("bn128 serialization"))?;
    }
    Ok(output)
}

// =============================================================================
// ADDITION (0x06)
// =============================================================================

/// Point addition. 500 gas at Byzantium, 150 from Istanbul.
pub struct Bn128Add {
    gas: u64,
}

impl Bn128Add {
    #[must_use]
    pub fn byzantium() -> Self {
        Self { gas: 500 }
    }

    #[must_use]
    pub fn istanbul() -> Self {
        Self { gas: 150 }
    }
}

impl Precompile for Bn128Add {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        if self.gas > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }

        let mut padded = input.to_vec();
        padded.resize(ADD_INPUT_LEN, 0);

        let p1 = read_g1(&padded, 0)?;
        let p2 = read_g1(&padded, 64)?;

        Ok(PrecompileOutput::new(self.gas, write_g1(p1 + p2)?))
    }
}

// =============================================================================
// SCALAR MULTIPLICATION (0x07)
// =============================================================================

/// Scalar multiplication. 40000 gas at Byzantium, 6000 from Istanbul.
pub struct Bn128Mul {
    gas: u64,
}

impl Bn128Mul {
    #[must_use]
    pub fn byzantium() -> Self {
        Self { gas: 40_000 }
    }

    #[must_use]
    pub fn istanbul() -> Self {
        Self { gas: 6_000 }
    }
}

impl Precompile for Bn128Mul {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        if self.gas > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }

        let mut padded = input.to_vec();
        padded.resize(MUL_INPUT_LEN, 0);

        let point = read_g1(&padded, 0)?;
        let scalar = Fr::from_slice(&padded[64..96])
            .map_err(|_| PrecompileError::InvalidInput("bn128 scalar"))?;

        Ok(PrecompileOutput::new(self.gas, write_g1(point * scalar)?))
    }
}

// =============================================================================
// PAIRING CHECK (0x08)
// =============================================================================

/// Pairing check over (G1, G2) pairs. Base + per-pair cost; the input must
/// be a whole number of 192-byte elements.
pub struct Bn128Pairing {
    base_gas: u64,
    pair_gas: u64,
}

impl Bn128Pairing {
    #[must_use]
    pub fn byzantium() -> Self {
        Self {
            base_gas: 100_000,
            pair_gas: 80_000,
        }
    }

    #[must_use]
    pub fn istanbul() -> Self {
        Self {
            base_gas: 45_000,
            pair_gas: 34_000,
        }
    }
}

impl Precompile for Bn128Pairing {
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        if input.len() % PAIR_ELEMENT_LEN != 0 {
            return Err(PrecompileError::InvalidInput("bn128 pairing input length"));
        }
        let elements = input.len() / PAIR_ELEMENT_LEN;

        let cost = self.base_gas + self.pair_gas * elements as u64;
        if cost > gas_limit {
            return Err(PrecompileError::OutOfGas);
        }

        let satisfied = if elements == 0 {
            // An empty product is the identity: the check passes.
            true
        } else {
            let mut pairs = Vec::with_capacity(elements);
            for idx in 0..elements {
                let pos = idx * PAIR_ELEMENT_LEN;
                let a = read_g1(input, pos)?;

                // G2 coordinates arrive imaginary-first.
                let b_x_i = read_fq(input, pos + 64)?;
                let b_x_r = read_fq(input, pos + 96)?;
                let b_y_i = read_fq(input, pos + 128)?;
                let b_y_r = read_fq(input, pos + 160)?;

                let b_x = Fq2::new(b_x_r, b_x_i);
                let b_y = Fq2::new(b_y_r, b_y_i);

                let b = if b_x.is_zero() && b_y.is_zero() {
                    G2::zero()
                } else {
                    AffineG2::new(b_x, b_y)
                        .map(Into::into)
                        .map_err(|_| PrecompileError::InvalidInput("bn128 twist point"))?
                };
                pairs.push((a, b));
            }
            pairing_batch(&pairs) == Gt::one()
        };

        let mut output = vec![0u8; 32];
        if satisfied {
            output[31] = 1;
        }
        Ok(PrecompileOutput::new(cost, output))
    }
}

// =============================================================================
// TESTS
// =============================================================================
