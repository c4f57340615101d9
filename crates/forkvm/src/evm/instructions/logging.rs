//! LOG0..LOG4.

use crate::domain::entities::Log;
use crate::domain::value_objects::{Bytes, Hash};
use crate::errors::VmError;
use crate::evm::gas;
use crate::evm::interpreter::{mem_range, MessageComputation};
use crate::evm::opcodes;

/// Shared handler for the LOG family; the topic count comes from the
/// opcode byte.
pub fn op_log(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.require_mutable()?;

    let topic_count = (comp.current_op() - opcodes::LOG0) as usize;
    let (offset, size) = comp.stack.pop2()?;
    let (offset, size) = mem_range(offset, size)?;

    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        let word = comp.stack.pop()?;
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        topics.push(Hash::new(bytes));
    }

    comp.extend_memory(offset, size)?;
    comp.gas
        .consume(gas::log_gas(size, topic_count), "LOG topics and data")?;

    let data = comp.memory.read(offset, size);
    comp.logs.push(Log::new(
        comp.msg.storage_address,
        topics,
        Bytes::from_vec(data),
    ));
    Ok(())
}
