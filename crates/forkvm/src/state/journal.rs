//! # Journaled State
//!
//! In-memory world state with a write-ahead journal of old values. A
//! snapshot records the journal length; revert replays the journal in
//! reverse down to the mark; commit merely releases the mark, leaving the
//! entries for a potential outer revert.

use crate::domain::entities::Account;
use crate::domain::services;
use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use crate::state::{AccessStatus, Snapshot, State};
use std::collections::{HashMap, HashSet};

/// One undo record.
#[derive(Clone, Debug)]
enum JournalEntry {
    BalanceChange { address: Address, old: U256 },
    NonceChange { address: Address, old: u64 },
    StorageChange { address: Address, key: U256, old: U256 },
    CodeChange { address: Address, old: Bytes },
    AccountCreated { address: Address },
    AccountDeleted { address: Address, account: Box<Account> },
    AccountWarmed { address: Address },
    SlotWarmed { address: Address, key: U256 },
}

/// In-memory journaled world state.
#[derive(Debug, Default)]
pub struct JournaledState {
    accounts: HashMap<Address, Account>,
    journal: Vec<JournalEntry>,
    /// Open snapshot marks, innermost last. Guards LIFO discipline.
    checkpoints: Vec<usize>,
    warm_accounts: HashSet<Address>,
    warm_slots: HashSet<(Address, U256)>,
    /// Slot values as of the start of the current transaction, recorded at
    /// first write.
    original_slots: HashMap<(Address, U256), U256>,
}

impl JournaledState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live journal entries. Diagnostic use.
    #[must_use]
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    fn ensure_account(&mut self, address: Address) -> &mut Account {
        if !self.accounts.contains_key(&address) {
            self.journal.push(JournalEntry::AccountCreated { address });
            self.accounts.insert(address, Account::default());
        }
        self.accounts.get_mut(&address).expect("just ensured")
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::BalanceChange { address, old } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.balance = old;
                }
            }
            JournalEntry::NonceChange { address, old } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.nonce = old;
                }
            }
            JournalEntry::StorageChange { address, key, old } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    if old.is_zero() {
                        account.storage.remove(&key);
                    } else {
                        account.storage.insert(key, old);
                    }
                }
            }
            JournalEntry::CodeChange { address, old } => {
                if let Some(account) = self.accounts.get_mut(&address) {
                    account.code = old;
                }
            }
            JournalEntry::AccountCreated { address } => {
                self.accounts.remove(&address);
            }
            JournalEntry::AccountDeleted { address, account } => {
                self.accounts.insert(address, *account);
            }
            JournalEntry::AccountWarmed { address } => {
                self.warm_accounts.remove(&address);
            }
            JournalEntry::SlotWarmed { address, key } => {
                self.warm_slots.remove(&(address, key));
            }
        }
    }
}

impl State for JournaledState {
    fn get_balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        let old = self.get_balance(address);
        self.ensure_account(address);
        self.journal.push(JournalEntry::BalanceChange { address, old });
        self.accounts.get_mut(&address).expect("ensured").balance = balance;
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|a| a.nonce)
            .unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        let old = self.get_nonce(address);
        self.ensure_account(address);
        self.journal.push(JournalEntry::NonceChange { address, old });
        self.accounts.get_mut(&address).expect("ensured").nonce = nonce;
    }

    fn get_code(&self, address: Address) -> Bytes {
        self.accounts
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        let old = self.get_code(address);
        self.ensure_account(address);
        self.journal.push(JournalEntry::CodeChange { address, old });
        self.accounts.get_mut(&address).expect("ensured").code = code;
    }

    fn get_code_hash(&self, address: Address) -> Hash {
        match self.accounts.get(&address) {
            Some(account) if !account.code.is_empty() => {
                services::keccak256(account.code.as_slice())
            }
            _ => services::empty_code_hash(),
        }
    }

    fn get_storage(&self, address: Address, key: U256) -> U256 {
        self.accounts
            .get(&address)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: U256, value: U256) {
        let old = self.get_storage(address, key);
        self.original_slots.entry((address, key)).or_insert(old);
        self.ensure_account(address);
        self.journal.push(JournalEntry::StorageChange { address, key, old });
        let account = self.accounts.get_mut(&address).expect("ensured");
        if value.is_zero() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
    }

    fn original_storage(&self, address: Address, key: U256) -> U256 {
        self.original_slots
            .get(&(address, key))
            .copied()
            .unwrap_or_else(|| self.get_storage(address, key))
    }

    fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn account_is_empty(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .is_some_and(Account::is_empty)
    }

    fn delete_account(&mut self, address: Address) {
        if let Some(account) = self.accounts.remove(&address) {
            self.journal.push(JournalEntry::AccountDeleted {
                address,
                account: Box::new(account),
            });
        }
    }

    fn snapshot(&mut self) -> Snapshot {
        let mark = self.journal.len();
        self.checkpoints.push(mark);
        Snapshot::new(mark)
    }

    fn commit(&mut self, snapshot: Snapshot) {
        let mark = self.checkpoints.pop();
        debug_assert_eq!(mark, Some(snapshot.mark()), "snapshot commit out of order");
    }

    fn revert(&mut self, snapshot: Snapshot) {
        let mark = self.checkpoints.pop();
        debug_assert_eq!(mark, Some(snapshot.mark()), "snapshot revert out of order");
        while self.journal.len() > snapshot.mark() {
            let entry = self.journal.pop().expect("length checked");
            self.undo(entry);
        }
    }

    fn begin_transaction(&mut self) {
        debug_assert!(self.checkpoints.is_empty(), "open snapshots across transactions");
        self.journal.clear();
        self.warm_accounts.clear();
        self.warm_slots.clear();
        self.original_slots.clear();
    }

    fn access_account(&mut self, address: Address) -> AccessStatus {
        if self.warm_accounts.insert(address) {
            self.journal.push(JournalEntry::AccountWarmed { address });
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    fn access_storage(&mut self, address: Address, key: U256) -> AccessStatus {
        if self.warm_slots.insert((address, key)) {
            self.journal.push(JournalEntry::SlotWarmed { address, key });
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_lazy_account_creation() {
        let mut state = JournaledState::new();
        assert!(!state.account_exists(addr(1)));
        assert_eq!(state.get_balance(addr(1)), U256::zero());

        state.set_balance(addr(1), U256::from(100));
        assert!(state.account_exists(addr(1)));
    }

    #[test]
    fn test_revert_undoes_everything() {
        let mut state = JournaledState::new();
        state.set_balance(addr(1), U256::from(100));

        let snapshot = state.snapshot();
        state.set_balance(addr(1), U256::from(50));
        state.set_nonce(addr(1), 3);
        state.set_storage(addr(1), U256::one(), U256::from(42));
        state.set_code(addr(2), Bytes::from_slice(&[0x00]));

        state.revert(snapshot);

        assert_eq!(state.get_balance(addr(1)), U256::from(100));
        assert_eq!(state.get_nonce(addr(1)), 0);
        assert_eq!(state.get_storage(addr(1), U256::one()), U256::zero());
        // Account 2 was created inside the snapshot: gone entirely.
        assert!(!state.account_exists(addr(2)));
    }

    #[test]
    fn test_commit_keeps_changes_for_outer_revert() {
        let mut state = JournaledState::new();
        let outer = state.snapshot();

        let inner = state.snapshot();
        state.set_balance(addr(1), U256::from(7));
        state.commit(inner);

        // Committed inner changes are visible...
        assert_eq!(state.get_balance(addr(1)), U256::from(7));

        // ...but the outer revert still takes them down.
        state.revert(outer);
        assert!(!state.account_exists(addr(1)));
    }

    #[test]
    fn test_nested_revert_inner_only() {
        let mut state = JournaledState::new();
        state.set_balance(addr(1), U256::from(1));

        let outer = state.snapshot();
        state.set_balance(addr(1), U256::from(2));

        let inner = state.snapshot();
        state.set_balance(addr(1), U256::from(3));
        state.revert(inner);

        assert_eq!(state.get_balance(addr(1)), U256::from(2));
        state.commit(outer);
        assert_eq!(state.get_balance(addr(1)), U256::from(2));
    }

    #[test]
    fn test_delete_and_revert_restores_account() {
        let mut state = JournaledState::new();
        state.set_balance(addr(1), U256::from(9));
        state.set_storage(addr(1), U256::one(), U256::from(2));

        let snapshot = state.snapshot();
        state.delete_account(addr(1));
        assert!(!state.account_exists(addr(1)));

        state.revert(snapshot);
        assert_eq!(state.get_balance(addr(1)), U256::from(9));
        assert_eq!(state.get_storage(addr(1), U256::one()), U256::from(2));
    }

    #[test]
    fn test_original_storage_tracks_tx_start() {
        let mut state = JournaledState::new();
        state.set_storage(addr(1), U256::one(), U256::from(10));

        state.begin_transaction();
        assert_eq!(state.original_storage(addr(1), U256::one()), U256::from(10));

        state.set_storage(addr(1), U256::one(), U256::from(20));
        state.set_storage(addr(1), U256::one(), U256::from(30));

        // Current moves, original stays.
        assert_eq!(state.get_storage(addr(1), U256::one()), U256::from(30));
        assert_eq!(state.original_storage(addr(1), U256::one()), U256::from(10));
    }

    #[test]
    fn test_warming_reverts_with_snapshot() {
        let mut state = JournaledState::new();
        state.begin_transaction();

        assert_eq!(state.access_account(addr(1)), AccessStatus::Cold);
        assert_eq!(state.access_account(addr(1)), AccessStatus::Warm);

        let snapshot = state.snapshot();
        assert_eq!(state.access_account(addr(2)), AccessStatus::Cold);
        assert_eq!(state.access_storage(addr(2), U256::one()), AccessStatus::Cold);
        state.revert(snapshot);

        // Warming inside the reverted scope is undone...
        assert_eq!(state.access_account(addr(2)), AccessStatus::Cold);
        // ...warming outside it persists.
        assert_eq!(state.access_account(addr(1)), AccessStatus::Warm);
    }

    #[test]
    fn test_code_hash() {
        let mut state = JournaledState::new();
        // Absent and code-less accounts share the empty-code hash.
        let empty = state.get_code_hash(addr(1));
        assert_eq!(empty.as_bytes()[0..2], [0xC5, 0xD2]);

        state.set_code(addr(1), Bytes::from_slice(&[0x60, 0x00]));
        assert_ne!(state.get_code_hash(addr(1)), empty);
    }

    #[test]
    fn test_zero_storage_write_removes_slot() {
        let mut state = JournaledState::new();
        state.set_storage(addr(1), U256::one(), U256::from(5));
        state.set_storage(addr(1), U256::one(), U256::zero());
        assert_eq!(state.get_storage(addr(1), U256::one()), U256::zero());
    }
}
