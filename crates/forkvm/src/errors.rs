//! # Error Types
//!
//! All error types for message computation, precompiles, and
//! transaction-level validation.

use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Errors that fail the current computation frame.
///
/// Every kind except `Reverted` consumes all remaining gas in the failing
/// frame; `Reverted` hands unused gas and return data back to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// Stack underflow (pop from a too-shallow stack).
    #[error("stack underflow")]
    StackUnderflow,

    /// Stack overflow (>1024 items).
    #[error("stack overflow")]
    StackOverflow,

    /// Unassigned or explicitly invalid opcode.
    #[error("invalid instruction: 0x{0:02X}")]
    InvalidInstruction(u8),

    /// JUMP/JUMPI target is not a valid JUMPDEST.
    #[error("invalid jump destination: {0}")]
    InvalidJumpDestination(usize),

    /// State-modifying operation inside a static frame.
    #[error("write protection violated in static frame")]
    WriteProtection,

    /// RETURNDATACOPY source range past the end of the return buffer.
    #[error("out of bounds read: {offset}..{} exceeds return data of {available} bytes", .offset + .size)]
    OutOfBoundsRead {
        offset: usize,
        size: usize,
        available: usize,
    },

    /// Frame entered beyond the 1024 call-depth limit.
    #[error("max call depth exceeded: {0}")]
    MaxCallDepthExceeded(u16),

    /// Value-carrying call with sender balance below the value.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: U256, available: U256 },

    /// Deployed code larger than the EIP-170 limit.
    #[error("code size limit exceeded: {size} > {max} bytes")]
    CodeSizeLimitExceeded { size: usize, max: usize },

    /// CREATE/CREATE2 target already carries code or a nonce.
    #[error("contract address collision at {0:?}")]
    ContractAddressCollision(Address),

    /// Explicit REVERT opcode.
    #[error("execution reverted")]
    Reverted,
}

impl VmError {
    /// Returns true if this failure consumes all remaining frame gas.
    #[must_use]
    pub fn consumes_all_gas(&self) -> bool {
        !matches!(self, Self::Reverted)
    }

    /// Returns true if the caller still receives return data.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted)
    }
}

// =============================================================================
// PRECOMPILE ERRORS
// =============================================================================

/// Failures inside a precompiled contract.
///
/// Input-validation failures in ecrecover are *not* errors: they consume
/// the gas and return empty output. These variants cover the cases that
/// fail the calling frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// The fixed or computed cost exceeds the gas the caller forwarded.
    #[error("precompile out of gas")]
    OutOfGas,

    /// Malformed input that the precompile defines as fatal
    /// (bn128 points off the curve, blake2f length/flag violations).
    #[error("invalid precompile input: {0}")]
    InvalidInput(&'static str),
}

impl From<PrecompileError> for VmError {
    fn from(err: PrecompileError) -> Self {
        match err {
            PrecompileError::OutOfGas => VmError::OutOfGas,
            // Fatal precompile input errors behave like invalid instructions:
            // the frame fails and burns its gas.
            PrecompileError::InvalidInput(_) => VmError::InvalidInstruction(0xFE),
        }
    }
}

// =============================================================================
// TRANSACTION ERRORS
// =============================================================================

/// Pre-state validation failures. A transaction failing these checks is not
/// included in a block and causes no state change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Transaction nonce does not match the sender account.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    /// The gas limit cannot even cover the intrinsic cost.
    #[error("intrinsic gas too low: limit {limit}, required {required}")]
    IntrinsicGasTooLow { limit: u64, required: u64 },

    /// Sender cannot cover `gas_limit * gas_price + value`.
    #[error("insufficient account funds: required {required}, available {available}")]
    InsufficientFunds { required: U256, available: U256 },

    /// Gas price below the block base fee (EIP-1559 forks).
    #[error("gas price {gas_price} below base fee {base_fee}")]
    GasPriceBelowBaseFee { gas_price: U256, base_fee: U256 },

    /// The sender is a contract (EIP-3607 style origin check).
    #[error("sender {0:?} is not an externally owned account")]
    SenderNotEoa(Address),
}

// =============================================================================
// TESTS
// =============================================================================
