//! Block-information handlers: 0x40..0x48.

use crate::domain::value_objects::U256;
use crate::errors::VmError;
use crate::evm::interpreter::MessageComputation;

pub fn op_blockhash(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let _number = comp.stack.pop()?;
    // The block-hash oracle lives outside the execution core; without it
    // every height reads as zero, which is also what the protocol returns
    // for anything but the most recent 256 blocks.
    comp.stack.push(U256::zero())
}

pub fn op_coinbase(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.ctx.coinbase.into_word())
}

pub fn op_timestamp(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.ctx.timestamp))
}

pub fn op_number(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.ctx.block_number))
}

/// DIFFICULTY before the merge, PREVRANDAO after: post-merge forks read
/// the header's mix-hash slot instead of the difficulty.
pub fn op_difficulty(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let word = if comp.fork.prevrandao {
        comp.ctx.mix_hash.map(|h| h.into_word()).unwrap_or_default()
    } else {
        comp.ctx.difficulty
    };
    comp.stack.push(word)
}

pub fn op_gaslimit(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.ctx.block_gas_limit))
}

pub fn op_basefee(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.ctx.base_fee)
}
