//! Memory handlers: MLOAD, MSTORE, MSTORE8, MSIZE.
//!
//! Each load/store extends (and pays for) its region before touching it.

use crate::domain::value_objects::U256;
use crate::errors::VmError;
use crate::evm::interpreter::{to_usize, MessageComputation};

pub fn op_mload(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let offset = to_usize(comp.stack.pop()?)?;
    comp.extend_memory(offset, 32)?;

    let word = comp.memory.read_word(offset);
    comp.stack.push(U256::from_big_endian(&word))
}

pub fn op_mstore(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (offset, value) = comp.stack.pop2()?;
    let offset = to_usize(offset)?;
    comp.extend_memory(offset, 32)?;

    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    comp.memory.write(offset, &bytes);
    Ok(())
}

pub fn op_mstore8(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (offset, value) = comp.stack.pop2()?;
    let offset = to_usize(offset)?;
    comp.extend_memory(offset, 1)?;

    comp.memory.write_byte(offset, value.byte(0));
    Ok(())
}

pub fn op_msize(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.memory.active_len()))
}
