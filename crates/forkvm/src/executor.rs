//! # Transaction Executor
//!
//! The top-level lifecycle: pre-state validation, the upfront gas debit,
//! message dispatch, and fork-specific finalization (capped refunds,
//! coinbase payment, self-destructs, and the empty-account sweep).

use crate::domain::entities::{Message, Receipt, TransactionContext};
use crate::domain::services;
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::TxError;
use crate::evm::interpreter::{apply_create_message, apply_message, ComputationResult};
use crate::forks::{ChainConfig, ForkSpec};
use crate::state::State;

/// One transaction, already signature-checked: the sender arrives
/// separately because signature recovery happens outside the core.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Sender account nonce this transaction spends.
    pub nonce: u64,
    /// Price per unit of gas.
    pub gas_price: U256,
    /// Gas ceiling, paid for upfront.
    pub gas_limit: u64,
    /// Call target; None makes this a contract creation.
    pub to: Option<Address>,
    /// Value transferred to the target.
    pub value: U256,
    /// Calldata, or init code for creations.
    pub data: Bytes,
}

/// Drives transactions against a world state under a chain configuration.
///
/// Transactions in a block run strictly sequentially through one
/// executor; each sees the committed state of its predecessor.
pub struct TransactionExecutor<'a> {
    state: &'a mut dyn State,
    config: &'a ChainConfig,
    ctx: TransactionContext,
}

impl<'a> TransactionExecutor<'a> {
    /// Binds an executor to state, chain config, and the per-transaction
    /// context built from the enclosing block.
    pub fn new(
        state: &'a mut dyn State,
        config: &'a ChainConfig,
        ctx: TransactionContext,
    ) -> Self {
        Self { state, config, ctx }
    }

    /// Executes one transaction to a receipt.
    ///
    /// # Errors
    ///
    /// `TxError` for pre-state validation failures; such a transaction is
    /// not includable and nothing was changed. Execution failures inside
    /// the machine are *not* errors: they produce a `status = 0` receipt.
    pub fn execute(&mut self, sender: Address, tx: &Transaction) -> Result<Receipt, TxError> {
        let fork = self.config.fork_at(self.ctx.block_number);
        self.state.begin_transaction();

        self.validate(fork, sender, tx)?;

        tracing::debug!(
            sender = ?sender,
            to = ?tx.to,
            gas_limit = tx.gas_limit,
            fork = fork.name,
            "executing transaction"
        );

        // Debit the full gas allowance and spend the nonce.
        let balance = self.state.get_balance(sender);
        let upfront = U256::from(tx.gas_limit) * tx.gas_price;
        self.state.set_balance(sender, balance - upfront);
        self.state.set_nonce(sender, tx.nonce + 1);

        if fork.eip2929 {
            self.state.access_account(sender);
            if let Some(to) = tx.to {
                self.state.access_account(to);
            }
            for address in fork.precompiles.addresses().collect::<Vec<_>>() {
                self.state.access_account(address);
            }
        }

        let msg_gas = tx.gas_limit - fork.intrinsic_gas(tx.data.as_slice(), tx.to.is_none());
        let result = match tx.to {
            Some(to) => {
                let code = self.state.get_code(to);
                let msg = Message::call(sender, to, tx.value, tx.data.clone(), msg_gas, code);
                apply_message(self.state, fork, &self.ctx, msg)
            }
            None => {
                // The creation address spends the pre-increment nonce.
                let address = services::create_address(sender, tx.nonce);
                if fork.eip2929 {
                    self.state.access_account(address);
                }
                let msg = Message::create(sender, address, tx.value, tx.data.clone(), msg_gas);
                apply_create_message(self.state, fork, &self.ctx, msg)
            }
        };

        Ok(self.finalize(fork, sender, tx, result))
    }

    fn validate(&self, fork: &ForkSpec, sender: Address, tx: &Transaction) -> Result<(), TxError> {
        let account_nonce = self.state.get_nonce(sender);
        if tx.nonce != account_nonce {
            return Err(TxError::InvalidNonce {
                expected: account_nonce,
                got: tx.nonce,
            });
        }

        if !self.state.get_code(sender).is_empty() {
            return Err(TxError::SenderNotEoa(sender));
        }

        let intrinsic = fork.intrinsic_gas(tx.data.as_slice(), tx.to.is_none());
        if intrinsic > tx.gas_limit {
            return Err(TxError::IntrinsicGasTooLow {
                limit: tx.gas_limit,
                required: intrinsic,
            });
        }

        // Pre-London contexts carry a zero base fee, so this only bites
        // where EIP-1559 is live.
        if tx.gas_price < self.ctx.base_fee {
            return Err(TxError::GasPriceBelowBaseFee {
                gas_price: tx.gas_price,
                base_fee: self.ctx.base_fee,
            });
        }

        // Checked math: no balance can cover an overflowing upfront cost.
        let available = self.state.get_balance(sender);
        let required = U256::from(tx.gas_limit)
            .checked_mul(tx.gas_price)
            .and_then(|gas_cost| gas_cost.checked_add(tx.value))
            .ok_or(TxError::InsufficientFunds {
                required: U256::MAX,
                available,
            })?;
        if available < required {
            return Err(TxError::InsufficientFunds {
                required,
                available,
            });
        }

        Ok(())
    }

    fn finalize(
        &mut self,
        fork: &ForkSpec,
        sender: Address,
        tx: &Transaction,
        result: ComputationResult,
    ) -> Receipt {
        let success = result.is_success();

        // Refunds apply only to successful outermost computations, capped
        // at a fork-dependent fraction of the gas actually used.
        let mut gas_remaining = result.gas_remaining;
        if success {
            let used = tx.gas_limit - gas_remaining;
            let refund = (result.gas_refund.max(0) as u64).min(used / fork.refund_quotient);
            gas_remaining += refund;
        }
        let gas_used = tx.gas_limit - gas_remaining;

        // Unused gas back to the sender at the full price.
        let sender_balance = self.state.get_balance(sender);
        self.state.set_balance(
            sender,
            sender_balance + U256::from(gas_remaining) * tx.gas_price,
        );

        // The coinbase earns the priority fee; the base-fee share is
        // burned.
        let priority = tx.gas_price - self.ctx.base_fee;
        let coinbase = self.ctx.coinbase;
        let coinbase_balance = self.state.get_balance(coinbase);
        self.state
            .set_balance(coinbase, coinbase_balance + U256::from(gas_used) * priority);

        let mut touched: Vec<Address> = if success {
            result.touched.iter().copied().collect()
        } else {
            Vec::new()
        };
        touched.push(coinbase);
        touched.sort_unstable();

        if success {
            for address in &result.self_destructs {
                self.state.delete_account(*address);
            }
        }

        // EIP-161: every touched account that exists and is empty is
        // deleted from state.
        if fork.kill_empty {
            for address in touched {
                if self.state.account_exists(address) && self.state.account_is_empty(address) {
                    tracing::debug!(address = ?address, "clearing empty account");
                    self.state.delete_account(address);
                }
            }
        }

        tracing::debug!(
            success,
            gas_used,
            logs = result.logs.len(),
            "transaction finalized"
        );

        let output = if result.is_error() {
            Bytes::new()
        } else {
            result.output
        };

        Receipt {
            success,
            gas_used,
            logs: if success { result.logs } else { Vec::new() },
            output,
            contract_address: if success { result.created_address } else { None },
        }
    }
}
