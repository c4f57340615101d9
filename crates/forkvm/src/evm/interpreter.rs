//! # Message Computation
//!
//! One interpreter frame: a message bound to code, state, gas, and the
//! fork's instruction table, run to a halt. Nested CALL/CREATE frames are
//! driven recursively through [`apply_message`] / [`apply_create_message`],
//! each under its own state snapshot.

use crate::domain::entities::{Log, Message, TransactionContext};
use crate::domain::services;
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::VmError;
use crate::evm::code::CodeStream;
use crate::evm::gas::{GasMeter, CODE_DEPOSIT_GAS};
use crate::evm::memory::{memory_expansion_gas, Memory};
use crate::evm::stack::Stack;
use crate::forks::{CreateRule, ForkSpec};
use crate::state::{AccessStatus, State};
use std::collections::HashSet;

/// Maximum frame nesting depth.
pub const MAX_CALL_DEPTH: u16 = 1024;

/// Frame execution status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The dispatch loop is (or may still be) making progress.
    Running,
    /// Halted successfully (STOP, RETURN, SELFDESTRUCT, end of code).
    Stopped,
    /// Halted by REVERT: return data preserved, state rolled back.
    Reverted,
}

// =============================================================================
// COMPUTATION FRAME
// =============================================================================

/// One message-computation frame.
pub struct MessageComputation<'a> {
    /// The message that spawned this frame.
    pub msg: Message,
    /// Per-transaction envelope.
    pub ctx: &'a TransactionContext,
    /// Fork behavior: instruction table, gas schedule, precompiles.
    pub fork: &'a ForkSpec,
    /// World state, shared down the frame tree.
    pub state: &'a mut dyn State,
    /// Operand stack.
    pub stack: Stack,
    /// Frame memory.
    pub memory: Memory,
    /// Code cursor with the jumpdest cache.
    pub code: CodeStream,
    /// Frame gas meter.
    pub gas: GasMeter,
    /// Output of the most recent child frame.
    pub return_data: Bytes,
    /// This frame's output (set by RETURN/REVERT, or a creation's code).
    pub output: Bytes,
    /// Logs emitted by this frame and committed children.
    pub logs: Vec<Log>,
    /// Accounts touched by this frame and committed children (EIP-161).
    pub touched: HashSet<Address>,
    /// Accounts scheduled for deletion by SELFDESTRUCT.
    pub self_destructs: HashSet<Address>,
    /// Execution status.
    pub status: Status,
    /// The failure that halted this frame, if any.
    pub error: Option<VmError>,
}

impl<'a> MessageComputation<'a> {
    /// Binds a frame to its message. The jumpdest cache is computed here,
    /// once per bytecode.
    pub fn new(
        state: &'a mut dyn State,
        fork: &'a ForkSpec,
        ctx: &'a TransactionContext,
        msg: Message,
    ) -> Self {
        let gas = GasMeter::new(msg.gas);
        let code = CodeStream::new(msg.code.clone());
        Self {
            msg,
            ctx,
            fork,
            state,
            stack: Stack::new(),
            memory: Memory::new(),
            code,
            gas,
            return_data: Bytes::new(),
            output: Bytes::new(),
            logs: Vec::new(),
            touched: HashSet::new(),
            self_destructs: HashSet::new(),
            status: Status::Running,
            error: None,
        }
    }

    /// Runs the dispatch loop to a halt, recording any failure on the
    /// frame.
    pub fn execute(&mut self) {
        if let Err(error) = self.run_loop() {
            self.fail(error);
        }
    }

    fn run_loop(&mut self) -> Result<(), VmError> {
        while self.status == Status::Running {
            let Some(op) = self.code.current_opcode() else {
                // Running off the end of code halts like STOP.
                self.status = Status::Stopped;
                break;
            };

            let instruction = self.fork.table.get(op);
            self.gas.consume(instruction.gas, instruction.name)?;

            let depth = self.stack.len();
            if depth < instruction.min_stack {
                return Err(VmError::StackUnderflow);
            }
            if depth > instruction.max_stack {
                return Err(VmError::StackOverflow);
            }

            self.code.advance(1);
            (instruction.exec)(self)?;
        }
        Ok(())
    }

    /// Records a failure. Everything except an explicit revert burns the
    /// frame's remaining gas and drops its output.
    pub fn fail(&mut self, error: VmError) {
        if error.consumes_all_gas() {
            self.gas.consume_all();
            self.output = Bytes::new();
        } else {
            self.status = Status::Reverted;
        }
        tracing::trace!(error = %error, depth = self.msg.depth, "frame halted");
        self.error = Some(error);
    }

    /// True if the frame halted without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    // -------------------------------------------------------------------------
    // Handler support
    // -------------------------------------------------------------------------

    /// The opcode byte currently being executed (the pc has already moved
    /// past it).
    #[must_use]
    pub fn current_op(&self) -> u8 {
        let pc = self.code.pc();
        self.code.as_slice().get(pc.wrapping_sub(1)).copied().unwrap_or(0xFE)
    }

    /// Ensures `[offset, offset+size)` is active memory, charging the
    /// expansion differential before resizing. A zero-size touch charges
    /// and grows nothing.
    pub fn extend_memory(&mut self, offset: usize, size: usize) -> Result<(), VmError> {
        if size == 0 {
            return Ok(());
        }
        let end = offset.checked_add(size).ok_or(VmError::OutOfGas)?;
        let new_words = end.div_ceil(32);
        let cost = memory_expansion_gas(self.memory.active_words(), new_words);
        self.gas.consume(cost, "memory expansion")?;
        self.memory.grow(offset, size);
        Ok(())
    }

    /// Charges the EIP-2929 account access cost (no-op before Berlin).
    pub fn charge_account_access(&mut self, address: Address) -> Result<(), VmError> {
        if !self.fork.eip2929 {
            return Ok(());
        }
        let cost = match self.state.access_account(address) {
            AccessStatus::Cold => self.fork.gas.cold_account_gas,
            AccessStatus::Warm => self.fork.gas.warm_access_gas,
        };
        self.gas.consume(cost, "account access")
    }

    /// Charges the EIP-2929 storage access cost (no-op before Berlin).
    pub fn charge_storage_access(&mut self, address: Address, key: U256) -> Result<(), VmError> {
        if !self.fork.eip2929 {
            return Ok(());
        }
        let cost = match self.state.access_storage(address, key) {
            AccessStatus::Cold => self.fork.gas.cold_sload_gas,
            AccessStatus::Warm => self.fork.gas.warm_access_gas,
        };
        self.gas.consume(cost, "storage access")
    }

    /// Rejects state mutation inside static frames.
    pub fn require_mutable(&self) -> Result<(), VmError> {
        if self.msg.is_static {
            return Err(VmError::WriteProtection);
        }
        Ok(())
    }

    /// Absorbs a finished child frame: gas always per its semantics, the
    /// side-effect sets only on success.
    pub fn merge_child(&mut self, child: &ComputationResult) {
        self.return_data = child.output.clone();
        if child.is_error() {
            // Exceptional child halts burn everything they were given and
            // leave no return data.
            self.return_data = Bytes::new();
            return;
        }
        self.gas.return_gas(child.gas_remaining);
        if child.is_success() {
            self.gas.merge_refund(child.gas_refund);
            self.logs.extend(child.logs.iter().cloned());
            self.touched.extend(child.touched.iter().copied());
            self.self_destructs.extend(child.self_destructs.iter().copied());
        }
    }
}

// =============================================================================
// COMPUTATION RESULT
// =============================================================================

/// The owned outcome of one frame, handed back to the parent or executor.
#[derive(Clone, Debug)]
pub struct ComputationResult {
    /// The failure that halted the frame, None on success.
    pub error: Option<VmError>,
    /// Output bytes (RETURN data, REVERT data, or deployed code).
    pub output: Bytes,
    /// Gas left unspent.
    pub gas_remaining: u64,
    /// Accumulated refund counter.
    pub gas_refund: i64,
    /// Logs from this frame and committed descendants.
    pub logs: Vec<Log>,
    /// Touched accounts from this frame and committed descendants.
    pub touched: HashSet<Address>,
    /// Self-destruct set from this frame and committed descendants.
    pub self_destructs: HashSet<Address>,
    /// Address of the created contract (creation frames only).
    pub created_address: Option<Address>,
}

impl ComputationResult {
    /// Halted without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Halted by explicit REVERT.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self.error, Some(VmError::Reverted))
    }

    /// Exceptional halt (everything that is neither success nor revert).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some() && !self.is_revert()
    }

    fn from_frame(comp: MessageComputation<'_>) -> Self {
        Self {
            error: comp.error,
            output: comp.output,
            gas_remaining: comp.gas.remaining(),
            gas_refund: comp.gas.refund(),
            logs: comp.logs,
            touched: comp.touched,
            self_destructs: comp.self_destructs,
            created_address: None,
        }
    }

    fn depth_exceeded(msg: &Message) -> Self {
        Self {
            error: Some(VmError::MaxCallDepthExceeded(msg.depth)),
            output: Bytes::new(),
            gas_remaining: 0,
            gas_refund: 0,
            logs: Vec::new(),
            touched: HashSet::new(),
            self_destructs: HashSet::new(),
            created_address: None,
        }
    }
}

// =============================================================================
// MESSAGE APPLICATION
// =============================================================================

/// Applies a call message: snapshot, value transfer, then precompile or
/// bytecode execution. Commits on success, reverts otherwise.
pub fn apply_message(
    state: &mut dyn State,
    fork: &ForkSpec,
    ctx: &TransactionContext,
    msg: Message,
) -> ComputationResult {
    if msg.depth > MAX_CALL_DEPTH {
        return ComputationResult::depth_exceeded(&msg);
    }

    let snapshot = state.snapshot();
    let mut comp = MessageComputation::new(state, fork, ctx, msg);
    comp.touched.insert(comp.msg.recipient);

    if comp.msg.transfer_value && !comp.msg.value.is_zero() {
        let sender_balance = comp.state.get_balance(comp.msg.sender);
        if sender_balance < comp.msg.value {
            comp.fail(VmError::InsufficientFunds {
                required: comp.msg.value,
                available: sender_balance,
            });
            let result = ComputationResult::from_frame(comp);
            state.revert(snapshot);
            return result;
        }
        // Debit before crediting so a self-transfer nets to zero.
        comp.state
            .set_balance(comp.msg.sender, sender_balance - comp.msg.value);
        let recipient_balance = comp.state.get_balance(comp.msg.recipient);
        comp.state
            .set_balance(comp.msg.recipient, recipient_balance + comp.msg.value);
    }

    if let Some(precompile) = fork.precompiles.get(comp.msg.code_address) {
        match precompile.execute(comp.msg.data.as_slice(), comp.gas.remaining()) {
            Ok(out) => match comp.gas.consume(out.gas_used, "precompile") {
                Ok(()) => {
                    comp.output = out.output;
                    comp.status = Status::Stopped;
                }
                Err(err) => comp.fail(err),
            },
            Err(err) => comp.fail(err.into()),
        }
    } else if !comp.code.is_empty() {
        comp.execute();
    } else {
        comp.status = Status::Stopped;
    }

    let success = comp.is_success();
    let result = ComputationResult::from_frame(comp);
    if success {
        state.commit(snapshot);
    } else {
        state.revert(snapshot);
    }
    result
}

/// Applies a creation message: collision check, init-code run, then the
/// fork's code-deposit rule. The whole creation happens under one snapshot.
pub fn apply_create_message(
    state: &mut dyn State,
    fork: &ForkSpec,
    ctx: &TransactionContext,
    msg: Message,
) -> ComputationResult {
    if msg.depth > MAX_CALL_DEPTH {
        return ComputationResult::depth_exceeded(&msg);
    }

    let contract_address = msg.storage_address;
    let snapshot = state.snapshot();

    // Address collision: an account with code or a nonce already lives
    // here. The creation fails without running the init code.
    if !state.get_code(contract_address).is_empty() || state.get_nonce(contract_address) != 0 {
        state.revert(snapshot);
        return ComputationResult {
            error: Some(VmError::ContractAddressCollision(contract_address)),
            output: Bytes::new(),
            gas_remaining: 0,
            gas_refund: 0,
            logs: Vec::new(),
            touched: HashSet::new(),
            self_destructs: HashSet::new(),
            created_address: None,
        };
    }

    // EIP-161: fresh contracts start at nonce 1 so they are never "empty".
    if fork.no_empty {
        let nonce = state.get_nonce(contract_address);
        state.set_nonce(contract_address, nonce + 1);
    }

    let mut comp = MessageComputation::new(state, fork, ctx, msg);
    comp.touched.insert(contract_address);

    if comp.msg.transfer_value && !comp.msg.value.is_zero() {
        let sender_balance = comp.state.get_balance(comp.msg.sender);
        if sender_balance < comp.msg.value {
            comp.fail(VmError::InsufficientFunds {
                required: comp.msg.value,
                available: sender_balance,
            });
            let result = ComputationResult::from_frame(comp);
            state.revert(snapshot);
            return result;
        }
        comp.state
            .set_balance(comp.msg.sender, sender_balance - comp.msg.value);
        let recipient_balance = comp.state.get_balance(contract_address);
        comp.state
            .set_balance(contract_address, recipient_balance + comp.msg.value);
    }

    comp.execute();

    if !comp.is_success() {
        let result = ComputationResult::from_frame(comp);
        state.revert(snapshot);
        return result;
    }

    // The init code's output is the contract code, paid for byte by byte.
    let contract_code = std::mem::take(&mut comp.output);

    if let Some(max) = fork.max_code_size {
        if contract_code.len() > max {
            comp.fail(VmError::CodeSizeLimitExceeded {
                size: contract_code.len(),
                max,
            });
            let result = ComputationResult::from_frame(comp);
            state.revert(snapshot);
            return result;
        }
    }

    if !contract_code.is_empty() {
        let deposit_gas = CODE_DEPOSIT_GAS * contract_code.len() as u64;
        match comp.gas.consume(deposit_gas, "code deposit") {
            Ok(()) => {
                tracing::debug!(
                    address = ?contract_address,
                    code_len = contract_code.len(),
                    "setting contract code"
                );
                comp.state.set_code(contract_address, contract_code.clone());
                comp.output = contract_code;
            }
            Err(err) => match fork.create_rule {
                // Frontier keeps the account, just without code.
                CreateRule::CommitOnDepositShortfall => {}
                // Homestead onward: the deposit shortfall reverts the whole
                // creation and surfaces as an error.
                CreateRule::RevertOnDepositShortfall => {
                    comp.fail(err);
                    let result = ComputationResult::from_frame(comp);
                    state.revert(snapshot);
                    return result;
                }
            },
        }
    }

    let mut result = ComputationResult::from_frame(comp);
    result.created_address = Some(contract_address);
    state.commit(snapshot);
    result
}

/// Picks the right application path for a message.
pub fn apply(
    state: &mut dyn State,
    fork: &ForkSpec,
    ctx: &TransactionContext,
    msg: Message,
) -> ComputationResult {
    if msg.is_create {
        apply_create_message(state, fork, ctx, msg)
    } else {
        apply_message(state, fork, ctx, msg)
    }
}

// Conversion helpers shared by handlers.

/// Interprets a stack word as a memory offset or size. Anything beyond the
/// platform word would cost more gas than exists, so it maps to OutOfGas.
pub fn to_usize(value: U256) -> Result<usize, VmError> {
    if value > U256::from(usize::MAX) {
        return Err(VmError::OutOfGas);
    }
    Ok(value.as_usize())
}

/// Resolves an (offset, size) pair popped from the stack. A zero size makes
/// the offset irrelevant, so it never fails for zero-size touches.
pub fn mem_range(offset: U256, size: U256) -> Result<(usize, usize), VmError> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    Ok((to_usize(offset)?, to_usize(size)?))
}

/// Keccak-256 of in-memory data, as a stack word.
#[must_use]
pub fn keccak_word(data: &[u8]) -> U256 {
    services::keccak256(data).into_word()
}

// =============================================================================
// TESTS
// =============================================================================
