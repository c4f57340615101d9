//! # Instruction Handlers
//!
//! The opcode implementations, grouped by family, and the Frontier base
//! table every later fork's table is derived from.

// Handlers are named after their mnemonics; the table entry is the
// documentation.
#![allow(missing_docs)]

pub mod arithmetic;
pub mod bitwise;
pub mod block;
pub mod context;
pub mod flow;
pub mod hashing;
pub mod logging;
pub mod memory;
pub mod stack_ops;
pub mod storage;
pub mod system;

use crate::evm::opcodes as op;
use crate::evm::table::{Instruction, InstructionTable};

#[rustfmt::skip]
const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8",
    "PUSH9", "PUSH10", "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16",
    "PUSH17", "PUSH18", "PUSH19", "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24",
    "PUSH25", "PUSH26", "PUSH27", "PUSH28", "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

#[rustfmt::skip]
const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8",
    "DUP9", "DUP10", "DUP11", "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

#[rustfmt::skip]
const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8",
    "SWAP9", "SWAP10", "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

/// The Frontier instruction table. Every other fork's table starts as a
/// clone of its predecessor's and patches slots.
#[must_use]
pub fn frontier_table() -> InstructionTable {
    let mut t = InstructionTable::empty();

    // Stop and arithmetic
    t.set(op::STOP, Instruction::new("STOP", 0, 0, 0, flow::op_stop));
    t.set(op::ADD, Instruction::new("ADD", 3, 2, 1, arithmetic::op_add));
    t.set(op::MUL, Instruction::new("MUL", 5, 2, 1, arithmetic::op_mul));
    t.set(op::SUB, Instruction::new("SUB", 3, 2, 1, arithmetic::op_sub));
    t.set(op::DIV, Instruction::new("DIV", 5, 2, 1, arithmetic::op_div));
    t.set(op::SDIV, Instruction::new("SDIV", 5, 2, 1, arithmetic::op_sdiv));
    t.set(op::MOD, Instruction::new("MOD", 5, 2, 1, arithmetic::op_mod));
    t.set(op::SMOD, Instruction::new("SMOD", 5, 2, 1, arithmetic::op_smod));
    t.set(op::ADDMOD, Instruction::new("ADDMOD", 8, 3, 1, arithmetic::op_addmod));
    t.set(op::MULMOD, Instruction::new("MULMOD", 8, 3, 1, arithmetic::op_mulmod));
    t.set(op::EXP, Instruction::new("EXP", 10, 2, 1, arithmetic::op_exp));
    t.set(op::SIGNEXTEND, Instruction::new("SIGNEXTEND", 5, 2, 1, arithmetic::op_signextend));

    // Comparison and bitwise
    t.set(op::LT, Instruction::new("LT", 3, 2, 1, bitwise::op_lt));
    t.set(op::GT, Instruction::new("GT", 3, 2, 1, bitwise::op_gt));
    t.set(op::SLT, Instruction::new("SLT", 3, 2, 1, bitwise::op_slt));
    t.set(op::SGT, Instruction::new("SGT", 3, 2, 1, bitwise::op_sgt));
    t.set(op::EQ, Instruction::new("EQ", 3, 2, 1, bitwise::op_eq));
    t.set(op::ISZERO, Instruction::new("ISZERO", 3, 1, 1, bitwise::op_iszero));
    t.set(op::AND, Instruction::new("AND", 3, 2, 1, bitwise::op_and));
    t.set(op::OR, Instruction::new("OR", 3, 2, 1, bitwise::op_or));
    t.set(op::XOR, Instruction::new("XOR", 3, 2, 1, bitwise::op_xor));
    t.set(op::NOT, Instruction::new("NOT", 3, 1, 1, bitwise::op_not));
    t.set(op::BYTE, Instruction::new("BYTE", 3, 2, 1, bitwise::op_byte));

    // Hashing
    t.set(op::KECCAK256, Instruction::new("KECCAK256", 30, 2, 1, hashing::op_keccak256));

    // Environment
    t.set(op::ADDRESS, Instruction::new("ADDRESS", 2, 0, 1, context::op_address));
    t.set(op::BALANCE, Instruction::new("BALANCE", 20, 1, 1, context::op_balance));
    t.set(op::ORIGIN, Instruction::new("ORIGIN", 2, 0, 1, context::op_origin));
    t.set(op::CALLER, Instruction::new("CALLER", 2, 0, 1, context::op_caller));
    t.set(op::CALLVALUE, Instruction::new("CALLVALUE", 2, 0, 1, context::op_callvalue));
    t.set(op::CALLDATALOAD, Instruction::new("CALLDATALOAD", 3, 1, 1, context::op_calldataload));
    t.set(op::CALLDATASIZE, Instruction::new("CALLDATASIZE", 2, 0, 1, context::op_calldatasize));
    t.set(op::CALLDATACOPY, Instruction::new("CALLDATACOPY", 3, 3, 0, context::op_calldatacopy));
    t.set(op::CODESIZE, Instruction::new("CODESIZE", 2, 0, 1, context::op_codesize));
    t.set(op::CODECOPY, Instruction::new("CODECOPY", 3, 3, 0, context::op_codecopy));
    t.set(op::GASPRICE, Instruction::new("GASPRICE", 2, 0, 1, context::op_gasprice));
    t.set(op::EXTCODESIZE, Instruction::new("EXTCODESIZE", 20, 1, 1, context::op_extcodesize));
    t.set(op::EXTCODECOPY, Instruction::new("EXTCODECOPY", 20, 4, 0, context::op_extcodecopy));

    // Block information
    t.set(op::BLOCKHASH, Instruction::new("BLOCKHASH", 20, 1, 1, block::op_blockhash));
    t.set(op::COINBASE, Instruction::new("COINBASE", 2, 0, 1, block::op_coinbase));
    t.set(op::TIMESTAMP, Instruction::new("TIMESTAMP", 2, 0, 1, block::op_timestamp));
    t.set(op::NUMBER, Instruction::new("NUMBER", 2, 0, 1, block::op_number));
    t.set(op::DIFFICULTY, Instruction::new("DIFFICULTY", 2, 0, 1, block::op_difficulty));
    t.set(op::GASLIMIT, Instruction::new("GASLIMIT", 2, 0, 1, block::op_gaslimit));

    // Stack, memory, storage, flow
    t.set(op::POP, Instruction::new("POP", 2, 1, 0, stack_ops::op_pop));
    t.set(op::MLOAD, Instruction::new("MLOAD", 3, 1, 1, memory::op_mload));
    t.set(op::MSTORE, Instruction::new("MSTORE", 3, 2, 0, memory::op_mstore));
    t.set(op::MSTORE8, Instruction::new("MSTORE8", 3, 2, 0, memory::op_mstore8));
    t.set(op::SLOAD, Instruction::new("SLOAD", 50, 1, 1, storage::op_sload));
    t.set(op::SSTORE, Instruction::new("SSTORE", 0, 2, 0, storage::op_sstore));
    t.set(op::JUMP, Instruction::new("JUMP", 8, 1, 0, flow::op_jump));
    t.set(op::JUMPI, Instruction::new("JUMPI", 10, 2, 0, flow::op_jumpi));
    t.set(op::PC, Instruction::new("PC", 2, 0, 1, flow::op_pc));
    t.set(op::MSIZE, Instruction::new("MSIZE", 2, 0, 1, memory::op_msize));
    t.set(op::GAS, Instruction::new("GAS", 2, 0, 1, flow::op_gas));
    t.set(op::JUMPDEST, Instruction::new("JUMPDEST", 1, 0, 0, flow::op_jumpdest));

    // Push, dup, swap
    for (i, name) in PUSH_NAMES.iter().copied().enumerate() {
        t.set(op::PUSH1 + i as u8, Instruction::new(name, 3, 0, 1, stack_ops::op_push));
    }
    for (i, name) in DUP_NAMES.iter().copied().enumerate() {
        t.set(op::DUP1 + i as u8, Instruction::new(name, 3, i + 1, i + 2, stack_ops::op_dup));
    }
    for (i, name) in SWAP_NAMES.iter().copied().enumerate() {
        t.set(op::SWAP1 + i as u8, Instruction::new(name, 3, i + 2, i + 2, stack_ops::op_swap));
    }

    // Logging
    for (i, name) in LOG_NAMES.iter().copied().enumerate() {
        t.set(op::LOG0 + i as u8, Instruction::new(name, 375, i + 2, 0, logging::op_log));
    }

    // System
    t.set(op::CREATE, Instruction::new("CREATE", 32_000, 3, 1, system::op_create));
    t.set(op::CALL, Instruction::new("CALL", 40, 7, 1, system::op_call));
    t.set(op::CALLCODE, Instruction::new("CALLCODE", 40, 7, 1, system::op_callcode));
    t.set(op::RETURN, Instruction::new("RETURN", 0, 2, 0, system::op_return));
    t.set(op::SELFDESTRUCT, Instruction::new("SELFDESTRUCT", 0, 1, 0, system::op_selfdestruct));

    t
}

// =============================================================================
// TESTS
// =============================================================================
