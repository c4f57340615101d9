//! # Precompiled Contracts
//!
//! Fixed-address native routines. A precompile computes its gas up front
//! from the input; input-validation failures (where the protocol defines
//! them as soft) consume the gas and return empty output rather than
//! failing the calling frame.

pub mod blake2;
pub mod bn128;
pub mod ecrecover;
pub mod hash;
pub mod identity;
pub mod modexp;

use crate::domain::value_objects::{Address, Bytes};
use crate::errors::PrecompileError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of a precompile run.
pub struct PrecompileOutput {
    /// Gas consumed; never exceeds the limit the caller passed.
    pub gas_used: u64,
    /// Output bytes, empty on soft validation failure.
    pub output: Bytes,
}

impl PrecompileOutput {
    /// An output carrying data.
    #[must_use]
    pub fn new(gas_used: u64, output: Vec<u8>) -> Self {
        Self {
            gas_used,
            output: Bytes::from_vec(output),
        }
    }

    /// Gas consumed, nothing returned (soft validation failure).
    #[must_use]
    pub fn empty(gas_used: u64) -> Self {
        Self {
            gas_used,
            output: Bytes::new(),
        }
    }
}

/// A precompiled contract.
pub trait Precompile: Send + Sync {
    /// Runs the precompile over `input` with at most `gas_limit` gas.
    ///
    /// # Errors
    ///
    /// `OutOfGas` when the computed cost exceeds the limit; `InvalidInput`
    /// for the inputs the protocol defines as fatal.
    fn execute(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError>;
}

/// The reserved address `0x00..0n`.
#[must_use]
pub fn precompile_address(n: u8) -> Address {
    let mut addr = [0u8; 20];
    addr[19] = n;
    Address::new(addr)
}

// =============================================================================
// PRECOMPILE SET
// =============================================================================

/// Address-keyed precompile registry. Forks extend a clone of their
/// predecessor's set.
#[derive(Clone, Default)]
pub struct PrecompileSet {
    entries: BTreeMap<Address, Arc<dyn Precompile>>,
}

impl PrecompileSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces, for re-pricing forks) the precompile at
    /// address `0x00..0n`.
    pub fn insert(&mut self, n: u8, precompile: Arc<dyn Precompile>) {
        self.entries.insert(precompile_address(n), precompile);
    }

    /// The precompile at an address, if any.
    #[must_use]
    pub fn get(&self, address: Address) -> Option<&dyn Precompile> {
        self.entries.get(&address).map(AsRef::as_ref)
    }

    /// True if the address is a registered precompile.
    #[must_use]
    pub fn contains(&self, address: Address) -> bool {
        self.entries.contains_key(&address)
    }

    /// All registered addresses, ascending. The executor pre-warms these
    /// under EIP-2929.
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered precompiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no precompile is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for PrecompileSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrecompileSet({} entries)", self.entries.len())
    }
}

/// Shared gas shape: a base cost plus a per-32-byte-word cost over the
/// input length.
#[must_use]
pub fn linear_gas(base: u64, per_word: u64, input_len: usize) -> u64 {
    base + per_word * input_len.div_ceil(32) as u64
}

// =============================================================================
// TESTS
// =============================================================================
