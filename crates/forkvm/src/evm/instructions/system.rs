//! System handlers: RETURN, REVERT, SELFDESTRUCT, the CREATE pair, and the
//! CALL family. These are the opcodes that spawn child frames.

use crate::domain::entities::Message;
use crate::domain::services;
use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use crate::errors::VmError;
use crate::evm::gas::{self, CALL_STIPEND};
use crate::evm::interpreter::{
    self, mem_range, MessageComputation, Status, MAX_CALL_DEPTH,
};
use crate::state::AccessStatus;

// -----------------------------------------------------------------------------
// Halting
// -----------------------------------------------------------------------------

pub fn op_return(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (offset, size) = comp.stack.pop2()?;
    let (offset, size) = mem_range(offset, size)?;

    comp.extend_memory(offset, size)?;
    comp.output = Bytes::from_vec(comp.memory.read(offset, size));
    comp.status = Status::Stopped;
    Ok(())
}

pub fn op_revert(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let (offset, size) = comp.stack.pop2()?;
    let (offset, size) = mem_range(offset, size)?;

    comp.extend_memory(offset, size)?;
    comp.output = Bytes::from_vec(comp.memory.read(offset, size));
    Err(VmError::Reverted)
}

pub fn op_selfdestruct(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.require_mutable()?;
    let beneficiary = Address::from_word(comp.stack.pop()?);
    let contract = comp.msg.storage_address;
    let balance = comp.state.get_balance(contract);

    // Beneficiary account creation surcharge. Before the empty-account
    // rules the trigger was bare nonexistence; after, a value must move
    // into a dead account.
    let creates_account = if comp.fork.no_empty {
        !balance.is_zero() && is_dead(comp, beneficiary)
    } else {
        !comp.state.account_exists(beneficiary)
    };
    if creates_account {
        comp.gas.consume(
            comp.fork.gas.selfdestruct_new_account_gas,
            "SELFDESTRUCT new account",
        )?;
    }

    // Cold beneficiary surcharge; no warm counterpart for SELFDESTRUCT.
    if comp.fork.eip2929 && comp.state.access_account(beneficiary) == AccessStatus::Cold {
        comp.gas
            .consume(comp.fork.gas.cold_account_gas, "SELFDESTRUCT cold account")?;
    }

    if comp.self_destructs.insert(contract) && comp.fork.gas.selfdestruct_refund > 0 {
        comp.gas.add_refund(comp.fork.gas.selfdestruct_refund);
    }

    // Move the balance; if the contract names itself the funds die with it.
    comp.state.set_balance(contract, U256::zero());
    let beneficiary_balance = comp.state.get_balance(beneficiary);
    comp.state
        .set_balance(beneficiary, beneficiary_balance + balance);

    comp.touched.insert(beneficiary);
    comp.status = Status::Stopped;
    Ok(())
}

// -----------------------------------------------------------------------------
// CREATE / CREATE2
// -----------------------------------------------------------------------------

pub fn op_create(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    do_create(comp, false)
}

pub fn op_create2(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    do_create(comp, true)
}

fn do_create(comp: &mut MessageComputation<'_>, with_salt: bool) -> Result<(), VmError> {
    comp.require_mutable()?;

    let (value, offset, size) = comp.stack.pop3()?;
    let salt = if with_salt {
        Some(comp.stack.pop()?)
    } else {
        None
    };
    let (offset, size) = mem_range(offset, size)?;

    comp.extend_memory(offset, size)?;
    if with_salt {
        // CREATE2 hashes the init code to derive the address.
        comp.gas.consume(gas::keccak_gas(size), "CREATE2 init code hash")?;
    }

    let creator = comp.msg.storage_address;

    // A creation that cannot fund itself, or would nest too deep, pushes
    // zero without spawning a frame.
    if comp.state.get_balance(creator) < value || comp.msg.depth + 1 > MAX_CALL_DEPTH {
        comp.return_data = Bytes::new();
        return comp.stack.push(U256::zero());
    }

    let init_code = Bytes::from_vec(comp.memory.read(offset, size));

    let child_gas = if comp.fork.cap_call_gas {
        gas::max_call_gas(comp.gas.remaining())
    } else {
        comp.gas.remaining()
    };
    comp.gas.consume(child_gas, "CREATE child gas")?;

    let nonce = comp.state.get_nonce(creator);
    comp.state.set_nonce(creator, nonce + 1);

    let address = match salt {
        Some(salt) => {
            let mut salt_bytes = [0u8; 32];
            salt.to_big_endian(&mut salt_bytes);
            services::create2_address(creator, Hash::new(salt_bytes), init_code.as_slice())
        }
        None => services::create_address(creator, nonce),
    };

    if comp.fork.eip2929 {
        comp.state.access_account(address);
    }

    let child_msg = Message {
        sender: creator,
        recipient: address,
        code_address: address,
        storage_address: address,
        value,
        data: Bytes::new(),
        code: init_code,
        gas: child_gas,
        depth: comp.msg.depth + 1,
        is_static: comp.msg.is_static,
        is_create: true,
        transfer_value: true,
    };

    let result =
        interpreter::apply_create_message(&mut *comp.state, comp.fork, comp.ctx, child_msg);

    // A successful creation leaves the return buffer empty; only revert
    // data flows back (EIP-211).
    comp.return_data = if result.is_revert() {
        result.output.clone()
    } else {
        Bytes::new()
    };
    if !result.is_error() {
        comp.gas.return_gas(result.gas_remaining);
    }

    if result.is_success() {
        comp.gas.merge_refund(result.gas_refund);
        comp.logs.extend(result.logs);
        comp.touched.extend(result.touched);
        comp.self_destructs.extend(result.self_destructs);
        comp.stack.push(address.into_word())
    } else {
        comp.stack.push(U256::zero())
    }
}

// -----------------------------------------------------------------------------
// CALL family
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

pub fn op_call(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    do_call(comp, CallKind::Call)
}

pub fn op_callcode(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    do_call(comp, CallKind::CallCode)
}

pub fn op_delegatecall(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    do_call(comp, CallKind::DelegateCall)
}

pub fn op_staticcall(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    do_call(comp, CallKind::StaticCall)
}

fn do_call(comp: &mut MessageComputation<'_>, kind: CallKind) -> Result<(), VmError> {
    let gas_word = comp.stack.pop()?;
    let target = Address::from_word(comp.stack.pop()?);
    let value = match kind {
        CallKind::Call | CallKind::CallCode => comp.stack.pop()?,
        // DELEGATECALL forwards the apparent value; STATICCALL has none.
        CallKind::DelegateCall => comp.msg.value,
        CallKind::StaticCall => U256::zero(),
    };
    let (in_offset, in_size) = comp.stack.pop2()?;
    let (out_offset, out_size) = comp.stack.pop2()?;
    let (in_offset, in_size) = mem_range(in_offset, in_size)?;
    let (out_offset, out_size) = mem_range(out_offset, out_size)?;

    if kind == CallKind::Call && comp.msg.is_static && !value.is_zero() {
        return Err(VmError::WriteProtection);
    }

    comp.extend_memory(in_offset, in_size)?;
    comp.extend_memory(out_offset, out_size)?;

    comp.touched.insert(target);
    comp.charge_account_access(target)?;

    let transfers = matches!(kind, CallKind::Call | CallKind::CallCode) && !value.is_zero();
    let mut extra_gas = 0;
    if transfers {
        extra_gas += comp.fork.gas.call_value_gas;
    }
    // Only a plain CALL can conjure an account at the target.
    if kind == CallKind::Call {
        let creates_account = if comp.fork.no_empty {
            !value.is_zero() && is_dead(comp, target)
        } else {
            !comp.state.account_exists(target)
        };
        if creates_account {
            extra_gas += comp.fork.gas.call_new_account_gas;
        }
    }
    comp.gas.consume(extra_gas, "CALL transfer and account")?;

    let requested = if gas_word > U256::from(u64::MAX) {
        u64::MAX
    } else {
        gas_word.as_u64()
    };
    let forwarded = if comp.fork.cap_call_gas {
        requested.min(gas::max_call_gas(comp.gas.remaining()))
    } else {
        // Before the 63/64 rule the requested gas had to be available in
        // full.
        requested
    };
    comp.gas.consume(forwarded, "CALL forwarded gas")?;

    // The stipend rides for free on any value transfer.
    let child_gas = if transfers {
        forwarded + CALL_STIPEND
    } else {
        forwarded
    };

    let data = Bytes::from_vec(comp.memory.read(in_offset, in_size));
    let code = comp.state.get_code(target);
    let self_address = comp.msg.storage_address;

    let child_msg = match kind {
        CallKind::Call => Message {
            sender: self_address,
            recipient: target,
            code_address: target,
            storage_address: target,
            value,
            data,
            code,
            gas: child_gas,
            depth: comp.msg.depth + 1,
            is_static: comp.msg.is_static,
            is_create: false,
            transfer_value: true,
        },
        CallKind::CallCode => Message {
            sender: self_address,
            recipient: self_address,
            code_address: target,
            storage_address: self_address,
            value,
            data,
            code,
            gas: child_gas,
            depth: comp.msg.depth + 1,
            is_static: comp.msg.is_static,
            is_create: false,
            transfer_value: true,
        },
        CallKind::DelegateCall => Message {
            sender: comp.msg.sender,
            recipient: self_address,
            code_address: target,
            storage_address: self_address,
            value,
            data,
            code,
            gas: child_gas,
            depth: comp.msg.depth + 1,
            is_static: comp.msg.is_static,
            is_create: false,
            transfer_value: false,
        },
        CallKind::StaticCall => Message {
            sender: self_address,
            recipient: target,
            code_address: target,
            storage_address: target,
            value: U256::zero(),
            data,
            code,
            gas: child_gas,
            depth: comp.msg.depth + 1,
            is_static: true,
            is_create: false,
            transfer_value: true,
        },
    };

    let result = interpreter::apply_message(&mut *comp.state, comp.fork, comp.ctx, child_msg);
    comp.merge_child(&result);

    // Copy what fits of the child's output into the reserved region.
    if !result.is_error() {
        let n = out_size.min(result.output.len());
        comp.memory.write(out_offset, &result.output.as_slice()[..n]);
    }

    comp.stack.push(if result.is_success() {
        U256::one()
    } else {
        U256::zero()
    })
}

/// Dead for gas purposes: absent, or present and EIP-161 empty.
fn is_dead(comp: &MessageComputation<'_>, address: Address) -> bool {
    !comp.state.account_exists(address) || comp.state.account_is_empty(address)
}
