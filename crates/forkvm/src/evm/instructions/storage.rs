//! Storage handlers: SLOAD and SSTORE.
//!
//! SSTORE's price and refund are a pure function of the slot's original,
//! current, and new values; the schedule parameters change fork by fork.

use crate::errors::VmError;
use crate::evm::gas::CALL_STIPEND;
use crate::evm::interpreter::MessageComputation;
use crate::forks::{sstore_gas_and_refund, SstoreSchedule};
use crate::state::AccessStatus;

pub fn op_sload(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    let key = comp.stack.pop()?;
    let address = comp.msg.storage_address;

    comp.charge_storage_access(address, key)?;
    let value = comp.state.get_storage(address, key);
    comp.stack.push(value)
}

pub fn op_sstore(comp: &mut MessageComputation<'_>) -> Result<(), VmError> {
    comp.require_mutable()?;

    // Net-metered schedules refuse to run on less than the call stipend so
    // a 2300-gas callee can never reach SSTORE.
    if matches!(comp.fork.gas.sstore, SstoreSchedule::NetMetered { .. })
        && comp.gas.remaining() <= CALL_STIPEND
    {
        return Err(VmError::OutOfGas);
    }

    let (key, new) = comp.stack.pop2()?;
    let address = comp.msg.storage_address;

    // Berlin adds the cold-slot surcharge on top of the matrix.
    if comp.fork.eip2929 && comp.state.access_storage(address, key) == AccessStatus::Cold {
        comp.gas
            .consume(comp.fork.gas.cold_sload_gas, "SSTORE cold slot")?;
    }

    let original = comp.state.original_storage(address, key);
    let current = comp.state.get_storage(address, key);

    let (cost, refund) = sstore_gas_and_refund(&comp.fork.gas.sstore, original, current, new);
    comp.gas.consume(cost, "SSTORE")?;
    if refund >= 0 {
        comp.gas.add_refund(refund as u64);
    } else {
        comp.gas.sub_refund((-refund) as u64);
    }

    comp.state.set_storage(address, key, new);
    Ok(())
}
