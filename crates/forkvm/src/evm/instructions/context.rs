//! Environment handlers: 0x30..0x3F plus CHAINID/SELFBALANCE.
//!
//! The copy family shares one padding rule: bytes past the end of the
//! source read as zero. The single exception is RETURNDATACOPY, which
//! fails instead.

use crate::domain::value_objects::{Address, U256};
use crate::errors::VmError;
use crate::evm::gas;
use crate::evm::interpreter::{mem_range, MessageComputation};

pub fn op_address(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.msg.storage_address.into_word())
}

pub fn op_balance(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let address = Address::from_word(comp.stack.pop()?);
    comp.touched.insert(address);
    comp.charge_account_access(address)?;
    let balance = comp.state.get_balance(address);
    comp.stack.push(balance)
}

pub fn op_selfbalance(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let balance = comp.state.get_balance(comp.msg.storage_address);
    comp.stack.push(balance)
}

pub fn op_origin(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.ctx.origin.into_word())
}

pub fn op_caller(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.msg.sender.into_word())
}

pub fn op_callvalue(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.msg.value)
}

pub fn op_gasprice(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(comp.ctx.gas_price)
}

pub fn op_chainid(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.ctx.chain_id))
}

// -----------------------------------------------------------------------------
// Calldata
// -----------------------------------------------------------------------------

pub fn op_calldataload(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let offset = comp.stack.pop()?;
    let data = comp.msg.data.as_slice();

    // The full 32-byte word is pushed, leading zeros retained; reads past
    // the end of calldata see zeros.
    let mut word = [0u8; 32];
    if offset <= U256::from(usize::MAX) {
        let offset = offset.as_usize();
        for (i, byte) in word.iter_mut().enumerate() {
            if let Some(pos) = offset.checked_add(i) {
                if pos < data.len() {
                    *byte = data[pos];
                }
            }
        }
    }
    comp.stack.push(U256::from_big_endian(&word))
}

pub fn op_calldatasize(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.msg.data.len()))
}

pub fn op_calldatacopy(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (dest, src, size) = comp.stack.pop3()?;
    let (dest, size) = mem_range(dest, size)?;

    comp.extend_memory(dest, size)?;
    comp.gas.consume(gas::copy_gas(size), "CALLDATACOPY words")?;

    let padded = read_padded(comp.msg.data.as_slice(), src, size);
    comp.memory.write(dest, &padded);
    Ok(())
}

// -----------------------------------------------------------------------------
// Code
// -----------------------------------------------------------------------------

pub fn op_codesize(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.code.len()))
}

pub fn op_codecopy(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (dest, src, size) = comp.stack.pop3()?;
    let (dest, size) = mem_range(dest, size)?;

    comp.extend_memory(dest, size)?;
    comp.gas.consume(gas::copy_gas(size), "CODECOPY words")?;

    // Read through a scoped seek so execution resumes where it left off.
    let src = clamp_offset(src, comp.code.len());
    let raw = {
        let mut seek = comp.code.seek(src);
        seek.read(size)
    };
    let mut padded = raw;
    padded.resize(size, 0);

    comp.memory.write(dest, &padded);
    Ok(())
}

pub fn op_extcodesize(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let address = Address::from_word(comp.stack.pop()?);
    comp.touched.insert(address);
    comp.charge_account_access(address)?;
    let size = comp.state.get_code(address).len();
    comp.stack.push(U256::from(size))
}

pub fn op_extcodecopy(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let address = Address::from_word(comp.stack.pop()?);
    let (dest, src, size) = comp.stack.pop3()?;
    let (dest, size) = mem_range(dest, size)?;

    comp.touched.insert(address);
    comp.charge_account_access(address)?;
    comp.extend_memory(dest, size)?;
    comp.gas.consume(gas::copy_gas(size), "EXTCODECOPY words")?;

    let code = comp.state.get_code(address);
    let padded = read_padded(code.as_slice(), src, size);
    comp.memory.write(dest, &padded);
    Ok(())
}

pub fn op_extcodehash(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let address = Address::from_word(comp.stack.pop()?);
    comp.touched.insert(address);
    comp.charge_account_access(address)?;

    // Absent and empty accounts read as zero (EIP-1052); everything else
    // pushes the Keccak of the account's code.
    let word = if comp.state.account_exists(address) && !comp.state.account_is_empty(address) {
        comp.state.get_code_hash(address).into_word()
    } else {
        U256::zero()
    };
    comp.stack.push(word)
}

// -----------------------------------------------------------------------------
// Return data
// -----------------------------------------------------------------------------

pub fn op_returndatasize(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.stack.push(U256::from(comp.return_data.len()))
}

pub fn op_returndatacopy(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (dest, src, size) = comp.stack.pop3()?;

    // Unlike the other copies there is no padding: reading past the end of
    // the return buffer is a hard failure, checked before any side effect.
    let in_bounds = src
        .checked_add(size)
        .is_some_and(|end| end <= U256::from(comp.return_data.len()));
    if !in_bounds {
        return Err(VmError::OutOfBoundsRead {
            offset: src.low_u64() as usize,
            size: size.low_u64() as usize,
            available: comp.return_data.len(),
        });
    }

    let (dest, size) = mem_range(dest, size)?;
    let src = src.as_usize();

    comp.extend_memory(dest, size)?;
    comp.gas.consume(gas::copy_gas(size), "RETURNDATACOPY words")?;

    let slice = comp.return_data.as_slice()[src..src + size].to_vec();
    comp.memory.write(dest, &slice);
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Source bytes `[offset, offset+size)`, zero-padded past the end.
fn read_padded(source: &[u8], offset: U256, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    let start = clamp_offset(offset, source.len());
    let end = start.saturating_add(size).min(source.len());
    out[..end - start].copy_from_slice(&source[start..end]);
    out
}

/// Clamps a source offset to the source length; everything past it pads.
fn clamp_offset(offset: U256, len: usize) -> usize {
    if offset > U256::from(len) {
        len
    } else {
        offset.as_usize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
