//! Arithmetic handlers: 0x01..0x0B.
//!
//! All arithmetic is modulo 2^256. SDIV/SMOD reinterpret the bit pattern
//! as two's complement; they never pass through a narrower signed integer.

use crate::domain::value_objects::{U256, U512};
use crate::errors::VmError;
use crate::evm::gas;
use crate::evm::interpreter::MessageComputation;

pub fn op_add(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    comp.stack.push(a.overflowing_add(b).0)
}

pub fn op_mul(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    comp.stack.push(a.overflowing_mul(b).0)
}

pub fn op_sub(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    comp.stack.push(a.overflowing_sub(b).0)
}

pub fn op_div(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    let result = if b.is_zero() { U256::zero() } else { a / b };
    comp.stack.push(result)
}

pub fn op_sdiv(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    let result = if b.is_zero() {
        U256::zero()
    } else {
        signed_div(a, b)
    };
    comp.stack.push(result)
}

pub fn op_mod(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    let result = if b.is_zero() { U256::zero() } else { a % b };
    comp.stack.push(result)
}

pub fn op_smod(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b) = comp.stack.pop2()?;
    let result = if b.is_zero() {
        U256::zero()
    } else {
        signed_mod(a, b)
    };
    comp.stack.push(result)
}

pub fn op_addmod(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b, n) = comp.stack.pop3()?;
    let result = if n.is_zero() {
        U256::zero()
    } else {
        // 512-bit intermediate so the sum cannot wrap.
        let sum = widen(a) + widen(b);
        narrow(sum % widen(n))
    };
    comp.stack.push(result)
}

pub fn op_mulmod(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (a, b, n) = comp.stack.pop3()?;
    let result = if n.is_zero() {
        U256::zero()
    } else {
        let product = widen(a) * widen(b);
        narrow(product % widen(n))
    };
    comp.stack.push(result)
}

pub fn op_exp(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (base, exponent) = comp.stack.pop2()?;

    let byte_gas = gas::exp_gas(exponent, comp.fork.gas.exp_byte_gas);
    comp.gas.consume(byte_gas, "EXP exponent bytes")?;

    comp.stack.push(exp_by_squaring(base, exponent))
}

pub fn op_signextend(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (k, x) = comp.stack.pop2()?;
    comp.stack.push(sign_extend(k, x))
}

/// Extends the sign bit of the low `k + 1` bytes across the full word.
fn sign_extend(k: U256, x: U256) -> U256 {
    if k >= U256::from(32) {
        return x;
    }
    let bit_index = 8 * k.as_usize() + 7;
    // Low bit_index + 1 bits; shifting down from MAX cannot overflow even
    // for the full-width case.
    let mask = U256::MAX >> (255 - bit_index);
    if x.bit(bit_index) {
        x | !mask
    } else {
        x & mask
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn widen(value: U256) -> U512 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes[32..]);
    U512::from_big_endian(&bytes)
}

fn narrow(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// Two's-complement division. Callers exclude b == 0.
fn signed_div(a: U256, b: U256) -> U256 {
    let a_neg = a.bit(255);
    let b_neg = b.bit(255);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b_neg { twos_complement(b) } else { b };

    let result = a_abs / b_abs;
    if a_neg == b_neg {
        result
    } else {
        twos_complement(result)
    }
}

/// Two's-complement remainder; the sign follows the dividend.
fn signed_mod(a: U256, b: U256) -> U256 {
    let a_neg = a.bit(255);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b.bit(255) { twos_complement(b) } else { b };

    let result = a_abs % b_abs;
    if a_neg {
        twos_complement(result)
    } else {
        result
    }
}

fn exp_by_squaring(base: U256, mut exponent: U256) -> U256 {
    let mut result = U256::one();
    let mut base = base;

    while !exponent.is_zero() {
        if exponent.bit(0) {
            result = result.overflowing_mul(base).0;
        }
        exponent >>= 1;
        base = base.overflowing_mul(base).0;
    }

    result
}

// =============================================================================
// TESTS
// =============================================================================
