//! # forkvm
//!
//! A fork-aware Ethereum Virtual Machine core: the stack-based bytecode
//! interpreter, the precompiled contracts, a journaled world state with
//! nested snapshots, and the transaction executor with per-hardfork
//! finalization rules.
//!
//! ## Fork model
//!
//! Every hardfork is a [`forks::ForkSpec`] value holding its instruction
//! table, precompile set, gas schedule, and behavior switches. Forks are
//! built as overlays on their predecessor (Frontier → Homestead → … →
//! Shanghai); a [`forks::ChainConfig`] maps block heights to specs, and
//! the interpreter resolves the table once per frame, so nothing in the
//! dispatch loop is fork-aware.
//!
//! ## Layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `domain` | Value objects, entities, pure services |
//! | `evm` | Stack, memory, code stream, gas, instruction table, handlers, interpreter, precompiles |
//! | `forks` | Fork specifications and the chain-config registry |
//! | `state` | The `State` trait and the journaled in-memory implementation |
//! | `executor` | Transaction-level validation, dispatch, and finalization |
//!
//! ## Usage
//!
//! ```
//! use forkvm::prelude::*;
//!
//! let mut state = JournaledState::new();
//! state.set_balance(Address::new([1u8; 20]), U256::from(1_000_000_000u64));
//!
//! let config = ChainConfig::single(1, ForkSpec::shanghai());
//! let ctx = TransactionContext::default();
//!
//! let tx = Transaction {
//!     nonce: 0,
//!     gas_price: U256::zero(),
//!     gas_limit: 100_000,
//!     to: Some(Address::new([2u8; 20])),
//!     value: U256::from(7),
//!     data: Bytes::new(),
//! };
//!
//! let mut executor = TransactionExecutor::new(&mut state, &config, ctx);
//! let receipt = executor.execute(Address::new([1u8; 20]), &tx).unwrap();
//! assert!(receipt.success);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod domain;
pub mod errors;
pub mod evm;
pub mod executor;
pub mod forks;
pub mod state;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Value objects
    pub use crate::domain::value_objects::{Address, Bytes, Hash, U256};

    // Entities
    pub use crate::domain::entities::{Account, Log, Message, Receipt, TransactionContext};

    // Services
    pub use crate::domain::services::{create2_address, create_address, keccak256};

    // Errors
    pub use crate::errors::{PrecompileError, TxError, VmError};

    // VM
    pub use crate::evm::{
        apply, apply_create_message, apply_message, ComputationResult, MessageComputation,
    };

    // Forks
    pub use crate::forks::{ChainConfig, CreateRule, ForkSpec, SstoreSchedule};

    // State
    pub use crate::state::{JournaledState, Snapshot, State};

    // Executor
    pub use crate::executor::{Transaction, TransactionExecutor};
}
