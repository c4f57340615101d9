//! # Instruction Table
//!
//! Dense 256-entry dispatch table. Each entry carries the mnemonic, the
//! static gas cost, the stack bounds, and the handler. Fork overlays clone
//! a predecessor's table and overwrite slots: additions fill a previously
//! invalid slot, removals put [`Instruction::invalid`] back, re-pricings
//! mutate the gas field.

use crate::errors::VmError;
use crate::evm::interpreter::MessageComputation;
use crate::evm::stack::STACK_LIMIT;

/// Instruction handler. Mutates the computation frame directly; an `Err`
/// fails the frame.
pub type ExecFn = fn(&mut MessageComputation<'_>) -> Result<(), VmError>;

/// One dispatch-table entry.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    /// Mnemonic, used in gas-consumption diagnostics.
    pub name: &'static str,
    /// Static gas charged before the handler runs. Handlers with dynamic
    /// components charge those themselves.
    pub gas: u64,
    /// Minimum stack depth (the words the handler pops).
    pub min_stack: usize,
    /// Maximum stack depth on entry such that the handler's pushes cannot
    /// overflow.
    pub max_stack: usize,
    /// The handler.
    pub exec: ExecFn,
}

impl Instruction {
    /// Builds an entry from mnemonic, static gas, pop/push counts, and
    /// handler.
    #[must_use]
    pub const fn new(name: &'static str, gas: u64, pops: usize, pushes: usize, exec: ExecFn) -> Self {
        Self {
            name,
            gas,
            min_stack: pops,
            max_stack: STACK_LIMIT + pops - pushes,
            exec,
        }
    }

    /// The entry occupying every unassigned slot: consumes all remaining
    /// gas and fails with `InvalidInstruction`.
    #[must_use]
    pub const fn invalid() -> Self {
        Self::new("INVALID", 0, 0, 0, op_invalid)
    }
}

/// Handler for unassigned opcodes.
fn op_invalid(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    Err(VmError::InvalidInstruction(comp.current_op()))
}

/// Dense opcode-byte to instruction mapping.
#[derive(Clone)]
pub struct InstructionTable {
    entries: [Instruction; 256],
}

impl InstructionTable {
    /// A table with every slot invalid.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: [Instruction::invalid(); 256],
        }
    }

    /// The entry for an opcode byte.
    #[must_use]
    pub fn get(&self, op: u8) -> &Instruction {
        &self.entries[op as usize]
    }

    /// Assigns a slot (fork additions and full replacements).
    pub fn set(&mut self, op: u8, instruction: Instruction) {
        self.entries[op as usize] = instruction;
    }

    /// Re-prices a slot without touching its semantics.
    pub fn set_gas(&mut self, op: u8, gas: u64) {
        self.entries[op as usize].gas = gas;
    }

    /// Renames a slot (the merge renamed DIFFICULTY to PREVRANDAO).
    pub fn set_name(&mut self, op: u8, name: &'static str) {
        self.entries[op as usize].name = name;
    }

    /// Puts a slot back to invalid (fork removals).
    pub fn clear(&mut self, op: u8) {
        self.entries[op as usize] = Instruction::invalid();
    }

    /// True if the slot has an assigned handler.
    #[must_use]
    pub fn is_assigned(&self, op: u8) -> bool {
        self.entries[op as usize].name != "INVALID"
    }
}

impl std::fmt::Debug for InstructionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let assigned = (0..=255u8).filter(|&op| self.is_assigned(op)).count();
        write!(f, "InstructionTable({assigned} assigned)")
    }
}

// =============================================================================
// TESTS
// =============================================================================
