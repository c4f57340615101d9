//! POP, PUSH0..PUSH32, DUP1..DUP16, SWAP1..SWAP16.
//!
//! The PUSH/DUP/SWAP families share one handler each; the variant is
//! recovered from the opcode byte being executed.

use crate::domain::value_objects::U256;
use crate::errors::VmError;
use crate::evm::interpreter::MessageComputation;
use crate::evm::opcodes;

pub fn op_pop(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.pop()?;
    Ok(())
}

pub fn op_push0(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::zero())
}

pub fn op_push(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let n = opcodes::push_bytes(comp.current_op()).unwrap_or(0);

    // Immediates truncated by the end of code read as zero on the right.
    let raw = comp.code.read(n);
    let mut word = [0u8; 32];
    word[32 - n..32 - n + raw.len()].copy_from_slice(&raw);

    comp.stack.push(U256::from_big_endian(&word))
}

pub fn op_dup(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let n = (comp.current_op() - opcodes::DUP1 + 1) as usize;
    comp.stack.dup(n)
}

pub fn op_swap(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let n = (comp.current_op() - opcodes::SWAP1 + 1) as usize;
    comp.stack.swap(n)
}
