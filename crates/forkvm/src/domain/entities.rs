//! # Core Entities
//!
//! The data carried through a message computation: the message itself, the
//! per-transaction context, accounts, logs, and receipts.

use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// MESSAGE
// =============================================================================

/// One message: the immutable input of a single computation frame.
///
/// `recipient` and `storage_address` coincide for plain calls and differ
/// under DELEGATECALL/CALLCODE, where the callee's code runs against the
/// caller's storage. `code_address` names whose code executes (and which
/// precompile, if any).
#[derive(Clone, Debug)]
pub struct Message {
    /// Immediate caller of this frame.
    pub sender: Address,
    /// Account receiving the value transfer.
    pub recipient: Address,
    /// Account whose code runs.
    pub code_address: Address,
    /// Account whose storage and balance the frame sees as "self".
    pub storage_address: Address,
    /// Value transferred (wei).
    pub value: U256,
    /// Input data (calldata, or init code parameters for creations).
    pub data: Bytes,
    /// The code to execute. For creations this is the init code.
    pub code: Bytes,
    /// Gas available to this frame.
    pub gas: u64,
    /// Frame depth; the top-level message is depth 0.
    pub depth: u16,
    /// Static frames reject every state-modifying operation.
    pub is_static: bool,
    /// Contract creation frame (the output becomes the deployed code).
    pub is_create: bool,
    /// Whether `value` actually moves (DELEGATECALL carries an apparent
    /// value without a transfer).
    pub transfer_value: bool,
}

impl Message {
    /// Builds a top-level call message.
    #[must_use]
    pub fn call(sender: Address, to: Address, value: U256, data: Bytes, gas: u64, code: Bytes) -> Self {
        Self {
            sender,
            recipient: to,
            code_address: to,
            storage_address: to,
            value,
            data,
            code,
            gas,
            depth: 0,
            is_static: false,
            is_create: false,
            transfer_value: true,
        }
    }

    /// Builds a top-level creation message. `address` is the contract
    /// address derived from sender and nonce.
    #[must_use]
    pub fn create(sender: Address, address: Address, value: U256, init_code: Bytes, gas: u64) -> Self {
        Self {
            sender,
            recipient: address,
            code_address: address,
            storage_address: address,
            value,
            data: Bytes::new(),
            code: init_code,
            gas,
            depth: 0,
            is_static: false,
            is_create: true,
            transfer_value: true,
        }
    }
}

// =============================================================================
// TRANSACTION CONTEXT
// =============================================================================

/// Immutable per-transaction envelope, populated by the caller from block
/// and transaction headers.
#[derive(Clone, Debug)]
pub struct TransactionContext {
    /// Transaction origin (the externally owned account that signed it).
    pub origin: Address,
    /// Gas price paid per unit.
    pub gas_price: U256,
    /// Block number.
    pub block_number: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
    /// Block proposer.
    pub coinbase: Address,
    /// Proof-of-work difficulty. Forks at and after the merge carry the
    /// header's prevRandao in `mix_hash` instead and the DIFFICULTY opcode
    /// reads that slot.
    pub difficulty: U256,
    /// Per-block randomness (prevRandao), present on post-merge forks.
    pub mix_hash: Option<Hash>,
    /// Block gas limit.
    pub block_gas_limit: u64,
    /// Chain id (EIP-155).
    pub chain_id: u64,
    /// Base fee per gas (EIP-1559), zero before London.
    pub base_fee: U256,
}

impl Default for TransactionContext {
    fn default() -> Self {
        Self {
            origin: Address::ZERO,
            gas_price: U256::zero(),
            block_number: 0,
            timestamp: 0,
            coinbase: Address::ZERO,
            difficulty: U256::zero(),
            mix_hash: None,
            block_gas_limit: 30_000_000,
            chain_id: 1,
            base_fee: U256::zero(),
        }
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

/// World-state account: balance, nonce, code, and storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// Account balance (wei).
    pub balance: U256,
    /// Transaction / creation counter.
    pub nonce: u64,
    /// Contract bytecode (empty for externally owned accounts).
    pub code: Bytes,
    /// Contract storage.
    pub storage: HashMap<U256, U256>,
}

impl Account {
    /// Returns true if the account is empty in the EIP-161 sense:
    /// zero balance, zero nonce, no code.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }
}

// =============================================================================
// LOG
// =============================================================================

/// Emitted log (event) from contract execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Contract address that emitted the log.
    pub address: Address,
    /// Indexed topics (up to 4).
    pub topics: Vec<Hash>,
    /// Non-indexed data.
    pub data: Bytes,
}

impl Log {
    /// Creates a new log.
    #[must_use]
    pub fn new(address: Address, topics: Vec<Hash>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }
}

// =============================================================================
// RECEIPT
// =============================================================================

/// Outcome of one executed transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Receipt {
    /// True when the transaction committed; false for reverts and
    /// exceptional halts.
    pub success: bool,
    /// Gas charged after the capped refund.
    pub gas_used: u64,
    /// Logs emitted by committed frames.
    pub logs: Vec<Log>,
    /// Return data. Preserved for success and explicit reverts, empty for
    /// exceptional halts.
    pub output: Bytes,
    /// Address of the deployed contract for creation transactions.
    pub contract_address: Option<Address>,
}

// =============================================================================
// TESTS
// =============================================================================
