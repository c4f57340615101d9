//! KECCAK256 (0x20).

use crate::errors::VmError;
use crate::evm::gas;
use crate::evm::interpreter::{keccak_word, mem_range, MessageComputation};

pub fn op_keccak256(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (offset, size) = comp.stack.pop2()?;
    let (offset, size) = mem_range(offset, size)?;

    comp.extend_memory(offset, size)?;
    comp.gas.consume(gas::keccak_gas(size), "KECCAK256 words")?;

    let data = comp.memory.read(offset, size);
    comp.stack.push(keccak_word(&data))
}
