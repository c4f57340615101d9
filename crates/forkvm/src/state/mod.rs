//! # World-State Interface
//!
//! The state surface the interpreter and executor run against. Backing
//! implementations are expected to be trie-backed in a full node; the
//! in-memory [`JournaledState`] here carries the same snapshot discipline
//! and is what tests execute over.

mod journal;

pub use journal::JournaledState;

use crate::domain::value_objects::{Address, Bytes, Hash, U256};

// =============================================================================
// SNAPSHOT TOKEN
// =============================================================================

/// Opaque checkpoint handle.
///
/// Snapshots nest in strict LIFO order: every token is resolved by exactly
/// one `commit` or `revert`, innermost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    mark: usize,
}

impl Snapshot {
    /// Wraps a journal mark. Implementations create these; callers only
    /// pass them back.
    #[must_use]
    pub fn new(mark: usize) -> Self {
        Self { mark }
    }

    /// The journal position this snapshot was taken at.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.mark
    }
}

/// First-access tracking for EIP-2929 pricing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    /// First access within this transaction.
    Cold,
    /// Already accessed within this transaction.
    Warm,
}

// =============================================================================
// STATE TRAIT
// =============================================================================

/// Account, storage, and snapshot access.
///
/// All methods are synchronous and infallible; a backing store with
/// fallible I/O adapts behind this trait. Reads of absent accounts yield
/// zero values, writes create accounts lazily.
pub trait State {
    /// Account balance, zero for absent accounts.
    fn get_balance(&self, address: Address) -> U256;

    /// Sets the balance, creating the account if needed.
    fn set_balance(&mut self, address: Address, balance: U256);

    /// Account nonce, zero for absent accounts.
    fn get_nonce(&self, address: Address) -> u64;

    /// Sets the nonce, creating the account if needed.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Contract code, empty for absent accounts.
    fn get_code(&self, address: Address) -> Bytes;

    /// Sets contract code, creating the account if needed.
    fn set_code(&mut self, address: Address, code: Bytes);

    /// Keccak-256 of the account code (the empty-code hash for accounts
    /// without code).
    fn get_code_hash(&self, address: Address) -> Hash;

    /// Storage slot value, zero when never written.
    fn get_storage(&self, address: Address, key: U256) -> U256;

    /// Writes a storage slot, creating the account if needed.
    fn set_storage(&mut self, address: Address, key: U256, value: U256);

    /// The slot value as of the start of the current transaction, the
    /// anchor of the net-metered SSTORE cost matrix.
    fn original_storage(&self, address: Address, key: U256) -> U256;

    /// True if the account exists at all.
    fn account_exists(&self, address: Address) -> bool;

    /// True if the account exists and is empty in the EIP-161 sense.
    fn account_is_empty(&self, address: Address) -> bool;

    /// Removes the account and its storage.
    fn delete_account(&mut self, address: Address);

    /// Takes a checkpoint.
    fn snapshot(&mut self) -> Snapshot;

    /// Resolves a checkpoint, keeping everything written since it. The
    /// journal above the mark stays live so an *outer* revert still undoes
    /// it.
    fn commit(&mut self, snapshot: Snapshot);

    /// Rolls every change back to the checkpoint, including account
    /// warming.
    fn revert(&mut self, snapshot: Snapshot);

    /// Resets per-transaction tracking: warm sets and the original-storage
    /// cache. Called by the executor before each transaction.
    fn begin_transaction(&mut self);

    /// Marks the account accessed, returning its prior status.
    fn access_account(&mut self, address: Address) -> AccessStatus;

    /// Marks the storage slot accessed, returning its prior status.
    fn access_storage(&mut self, address: Address, key: U256) -> AccessStatus;
}

// =============================================================================
// TESTS
// =============================================================================
