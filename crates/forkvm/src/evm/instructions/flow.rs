//! Control-flow handlers: STOP, JUMP, JUMPI, PC, GAS, JUMPDEST.

use crate::domain::value_objects::U256;
use crate::errors::VmError;
use crate::evm::interpreter::{MessageComputation, Status};

pub fn op_stop(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.status = Status::Stopped;
    Ok(())
}

pub fn op_jump(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let target = comp.stack.pop()?;
    let dest = jump_dest(comp, target)?;
    comp.code.jump_to(dest);
    Ok(())
}

pub fn op_jumpi(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (dest, condition) = comp.stack.pop2()?;
    if !condition.is_zero() {
        let dest = jump_dest(comp, dest)?;
        comp.code.jump_to(dest);
    }
    Ok(())
}

pub fn op_pc(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    // The pc has already advanced past the opcode.
    comp.stack.push(U256::from(comp.code.pc() - 1))
}

pub fn op_gas(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    // Remaining after this opcode's own cost, which was charged already.
    comp.stack.push(U256::from(comp.gas.remaining()))
}

pub fn op_jumpdest(_comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    // A marker, nothing more.
    Ok(())
}

/// Validates a jump target against the jumpdest cache.
fn jump_dest(comp: &MessageComputation<'_>, dest: U256) -> Result<usize, VmError> {
    if dest > U256::from(usize::MAX) {
        return Err(VmError::InvalidJumpDestination(usize::MAX));
    }
    let dest = dest.as_usize();
    if !comp.code.is_valid_jumpdest(dest) {
        return Err(VmError::InvalidJumpDestination(dest));
    }
    Ok(dest)
}
