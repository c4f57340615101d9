//! # Fork Specifications
//!
//! Each hardfork is a value: an instruction table, a precompile set, a gas
//! schedule, and a handful of behavior switches. A fork is built by
//! cloning its predecessor and applying an overlay (additions fill
//! invalid slots, removals put them back, re-pricings mutate gas fields)
//! so the interpreter itself never changes across forks.

mod config;

pub use config::ChainConfig;

use crate::domain::value_objects::U256;
use crate::evm::instructions::{self, bitwise, block, context, stack_ops, system};
use crate::evm::opcodes as op;
use crate::evm::precompiles::{
    blake2::Blake2F,
    bn128::{Bn128Add, Bn128Mul, Bn128Pairing},
    ecrecover::EcRecover,
    hash::{Ripemd160Hash, Sha256Hash},
    identity::Identity,
    modexp::ModExp,
    PrecompileSet,
};
use crate::evm::table::{Instruction, InstructionTable};
use std::sync::Arc;

// =============================================================================
// GAS SCHEDULE
// =============================================================================

/// Prices that instruction handlers and the executor read at run time.
/// Purely static per-opcode prices live in the instruction table instead.
#[derive(Clone, Debug)]
pub struct GasSchedule {
    /// EXP surcharge per byte of exponent.
    pub exp_byte_gas: u64,
    /// CALL surcharge for a nonzero value transfer.
    pub call_value_gas: u64,
    /// CALL surcharge for materializing the target account.
    pub call_new_account_gas: u64,
    /// SELFDESTRUCT surcharge for materializing the beneficiary.
    pub selfdestruct_new_account_gas: u64,
    /// Refund per first SELFDESTRUCT of an account (zero from London).
    pub selfdestruct_refund: u64,
    /// EIP-2929 cold account access.
    pub cold_account_gas: u64,
    /// EIP-2929 cold storage-slot access.
    pub cold_sload_gas: u64,
    /// EIP-2929 warm access.
    pub warm_access_gas: u64,
    /// The SSTORE cost-and-refund schedule.
    pub sstore: SstoreSchedule,
    /// Intrinsic gas of any transaction.
    pub tx_gas: u64,
    /// Extra intrinsic gas for creation transactions.
    pub tx_create_extra_gas: u64,
    /// Intrinsic gas per zero byte of transaction data.
    pub tx_data_zero_gas: u64,
    /// Intrinsic gas per non-zero byte of transaction data.
    pub tx_data_nonzero_gas: u64,
}

// =============================================================================
// SSTORE SCHEDULE
// =============================================================================

/// How SSTORE prices a write, as a pure function of the slot's original
/// (transaction-start), current, and new values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SstoreSchedule {
    /// 20000 to fill an empty slot, 5000 otherwise, 15000 refund for
    /// clearing. Frontier through Byzantium, and again at Petersburg.
    Legacy,
    /// Net gas metering: no-ops and dirty writes cost one sload, clean
    /// writes the full price, and refunds track the distance to the
    /// original value.
    NetMetered {
        /// Price of a no-op or dirty write.
        sload_gas: u64,
        /// Price of a clean nonzero overwrite.
        reset_gas: u64,
        /// Refund for clearing a slot.
        clear_refund: u64,
    },
}

const SSTORE_SET_GAS: u64 = 20_000;
const SSTORE_LEGACY_RESET_GAS: u64 = 5_000;
const SSTORE_LEGACY_CLEAR_REFUND: u64 = 15_000;

/// The SSTORE cost matrix. Returns (gas, refund delta); the delta can be
/// negative when a write takes back a refund granted earlier in the
/// transaction.
#[must_use]
pub fn sstore_gas_and_refund(
    schedule: &SstoreSchedule,
    original: U256,
    current: U256,
    new: U256,
) -> (u64, i64) {
    match schedule {
        SstoreSchedule::Legacy => {
            if current.is_zero() && !new.is_zero() {
                (SSTORE_SET_GAS, 0)
            } else if !current.is_zero() && new.is_zero() {
                (SSTORE_LEGACY_RESET_GAS, SSTORE_LEGACY_CLEAR_REFUND as i64)
            } else {
                (SSTORE_LEGACY_RESET_GAS, 0)
            }
        }
        SstoreSchedule::NetMetered {
            sload_gas,
            reset_gas,
            clear_refund,
        } => {
            if new == current {
                return (*sload_gas, 0);
            }
            if current == original {
                // Clean slot: first write this transaction.
                if original.is_zero() {
                    (SSTORE_SET_GAS, 0)
                } else if new.is_zero() {
                    (*reset_gas, *clear_refund as i64)
                } else {
                    (*reset_gas, 0)
                }
            } else {
                // Dirty slot: already written this transaction.
                let mut refund = 0i64;
                if !original.is_zero() {
                    if current.is_zero() {
                        refund -= *clear_refund as i64;
                    }
                    if new.is_zero() {
                        refund += *clear_refund as i64;
                    }
                }
                if new == original {
                    if original.is_zero() {
                        refund += (SSTORE_SET_GAS - sload_gas) as i64;
                    } else {
                        refund += (reset_gas - sload_gas) as i64;
                    }
                }
                (*sload_gas, refund)
            }
        }
    }
}

// =============================================================================
// CREATE RULE
// =============================================================================

/// What happens when the code-deposit charge exceeds the gas left after
/// running init code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateRule {
    /// Frontier: the account is kept, with empty code.
    CommitOnDepositShortfall,
    /// Homestead onward: the whole creation reverts and the error
    /// propagates.
    RevertOnDepositShortfall,
}

// =============================================================================
// FORK SPEC
// =============================================================================

/// Everything fork-dependent, as one value. The interpreter binds one of
/// these per frame; the registry selects one per block height.
#[derive(Clone, Debug)]
pub struct ForkSpec {
    /// Fork name, for diagnostics.
    pub name: &'static str,
    /// The 256-entry dispatch table.
    pub table: InstructionTable,
    /// Active precompiles.
    pub precompiles: PrecompileSet,
    /// Run-time prices.
    pub gas: GasSchedule,
    /// Code-deposit behavior for creations.
    pub create_rule: CreateRule,
    /// Refund cap divisor: used/2 before London, used/5 after.
    pub refund_quotient: u64,
    /// EIP-150: forward at most 63/64 of remaining gas.
    pub cap_call_gas: bool,
    /// EIP-161: fresh contracts start at nonce 1, and account-creation
    /// surcharges require an actual value into a dead account.
    pub no_empty: bool,
    /// EIP-161: sweep touched empty accounts after the transaction.
    pub kill_empty: bool,
    /// EIP-2929 warm/cold access pricing.
    pub eip2929: bool,
    /// EIP-170 deployed-code cap.
    pub max_code_size: Option<usize>,
    /// The merge: DIFFICULTY reads the mix-hash (prevRandao) slot.
    pub prevrandao: bool,
}

impl ForkSpec {
    /// Intrinsic gas of a transaction under this fork.
    #[must_use]
    pub fn intrinsic_gas(&self, data: &[u8], is_create: bool) -> u64 {
        let mut gas = self.gas.tx_gas;
        if is_create {
            gas += self.gas.tx_create_extra_gas;
        }
        for &byte in data {
            gas += if byte == 0 {
                self.gas.tx_data_zero_gas
            } else {
                self.gas.tx_data_nonzero_gas
            };
        }
        gas
    }

    // -------------------------------------------------------------------------
    // The fork chain
    // -------------------------------------------------------------------------

    /// The launch rules.
    #[must_use]
    pub fn frontier() -> Self {
        let mut precompiles = PrecompileSet::new();
        precompiles.insert(1, Arc::new(EcRecover));
        precompiles.insert(2, Arc::new(Sha256Hash));
        precompiles.insert(3, Arc::new(Ripemd160Hash));
        precompiles.insert(4, Arc::new(Identity));

        Self {
            name: "frontier",
            table: instructions::frontier_table(),
            precompiles,
            gas: GasSchedule {
                exp_byte_gas: 10,
                call_value_gas: 9_000,
                call_new_account_gas: 25_000,
                selfdestruct_new_account_gas: 0,
                selfdestruct_refund: 24_000,
                cold_account_gas: 2_600,
                cold_sload_gas: 2_100,
                warm_access_gas: 100,
                sstore: SstoreSchedule::Legacy,
                tx_gas: 21_000,
                tx_create_extra_gas: 0,
                tx_data_zero_gas: 4,
                tx_data_nonzero_gas: 68,
            },
            create_rule: CreateRule::CommitOnDepositShortfall,
            refund_quotient: 2,
            cap_call_gas: false,
            no_empty: false,
            kill_empty: false,
            eip2929: false,
            max_code_size: None,
            prevrandao: false,
        }
    }

    /// DELEGATECALL, the creation-shortfall revert, and the 53000-gas
    /// creation transaction.
    #[must_use]
    pub fn homestead() -> Self {
        let mut spec = Self::frontier();
        spec.name = "homestead";
        spec.table.set(
            op::DELEGATECALL,
            Instruction::new("DELEGATECALL", 40, 6, 1, system::op_delegatecall),
        );
        spec.create_rule = CreateRule::RevertOnDepositShortfall;
        spec.gas.tx_create_extra_gas = 32_000;
        spec
    }

    /// EIP-150: IO-heavy opcodes repriced, the 63/64 forwarding cap.
    #[must_use]
    pub fn tangerine() -> Self {
        let mut spec = Self::homestead();
        spec.name = "tangerine";
        spec.table.set_gas(op::SLOAD, 200);
        spec.table.set_gas(op::BALANCE, 400);
        spec.table.set_gas(op::EXTCODESIZE, 700);
        spec.table.set_gas(op::EXTCODECOPY, 700);
        spec.table.set_gas(op::CALL, 700);
        spec.table.set_gas(op::CALLCODE, 700);
        spec.table.set_gas(op::DELEGATECALL, 700);
        spec.table.set_gas(op::SELFDESTRUCT, 5_000);
        spec.gas.selfdestruct_new_account_gas = 25_000;
        spec.cap_call_gas = true;
        spec
    }

    /// EIP-160/161/170: dearer EXP, the empty-account rules, the deployed
    /// code cap.
    #[must_use]
    pub fn spurious_dragon() -> Self {
        let mut spec = Self::tangerine();
        spec.name = "spurious-dragon";
        spec.gas.exp_byte_gas = 50;
        spec.no_empty = true;
        spec.kill_empty = true;
        spec.max_code_size = Some(24_576);
        spec
    }

    /// REVERT, the return-data opcodes, STATICCALL, and the modexp/bn128
    /// precompiles.
    #[must_use]
    pub fn byzantium() -> Self {
        let mut spec = Self::spurious_dragon();
        spec.name = "byzantium";
        spec.table.set(
            op::RETURNDATASIZE,
            Instruction::new("RETURNDATASIZE", 2, 0, 1, context::op_returndatasize),
        );
        spec.table.set(
            op::RETURNDATACOPY,
            Instruction::new("RETURNDATACOPY", 3, 3, 0, context::op_returndatacopy),
        );
        spec.table.set(
            op::STATICCALL,
            Instruction::new("STATICCALL", 700, 6, 1, system::op_staticcall),
        );
        spec.table.set(
            op::REVERT,
            Instruction::new("REVERT", 0, 2, 0, system::op_revert),
        );
        spec.precompiles.insert(5, Arc::new(ModExp::byzantium()));
        spec.precompiles.insert(6, Arc::new(Bn128Add::byzantium()));
        spec.precompiles.insert(7, Arc::new(Bn128Mul::byzantium()));
        spec.precompiles.insert(8, Arc::new(Bn128Pairing::byzantium()));
        spec
    }

    /// Shifts, EXTCODEHASH, CREATE2, and net-metered SSTORE (EIP-1283).
    #[must_use]
    pub fn constantinople() -> Self {
        let mut spec = Self::byzantium();
        spec.name = "constantinople";
        spec.table.set(op::SHL, Instruction::new("SHL", 3, 2, 1, bitwise::op_shl));
        spec.table.set(op::SHR, Instruction::new("SHR", 3, 2, 1, bitwise::op_shr));
        spec.table.set(op::SAR, Instruction::new("SAR", 3, 2, 1, bitwise::op_sar));
        spec.table.set(
            op::EXTCODEHASH,
            Instruction::new("EXTCODEHASH", 400, 1, 1, context::op_extcodehash),
        );
        spec.table.set(
            op::CREATE2,
            Instruction::new("CREATE2", 32_000, 4, 1, system::op_create2),
        );
        spec.gas.sstore = SstoreSchedule::NetMetered {
            sload_gas: 200,
            reset_gas: 5_000,
            clear_refund: 15_000,
        };
        spec
    }

    /// Constantinople with EIP-1283 rolled back, as shipped on mainnet.
    #[must_use]
    pub fn petersburg() -> Self {
        let mut spec = Self::constantinople();
        spec.name = "petersburg";
        spec.gas.sstore = SstoreSchedule::Legacy;
        spec
    }

    /// CHAINID and SELFBALANCE, EIP-1884 re-pricing, EIP-2200 SSTORE,
    /// cheaper calldata, blake2f, and the EIP-1108 bn128 prices.
    #[must_use]
    pub fn istanbul() -> Self {
        let mut spec = Self::petersburg();
        spec.name = "istanbul";
        spec.table.set(
            op::CHAINID,
            Instruction::new("CHAINID", 2, 0, 1, context::op_chainid),
        );
        spec.table.set(
            op::SELFBALANCE,
            Instruction::new("SELFBALANCE", 5, 0, 1, context::op_selfbalance),
        );
        spec.table.set_gas(op::BALANCE, 700);
        spec.table.set_gas(op::SLOAD, 800);
        spec.table.set_gas(op::EXTCODEHASH, 700);
        spec.gas.sstore = SstoreSchedule::NetMetered {
            sload_gas: 800,
            reset_gas: 5_000,
            clear_refund: 15_000,
        };
        spec.gas.tx_data_nonzero_gas = 16;
        spec.precompiles.insert(6, Arc::new(Bn128Add::istanbul()));
        spec.precompiles.insert(7, Arc::new(Bn128Mul::istanbul()));
        spec.precompiles.insert(8, Arc::new(Bn128Pairing::istanbul()));
        spec.precompiles.insert(9, Arc::new(Blake2F));
        spec
    }

    /// EIP-2929 warm/cold access pricing and the repriced modexp.
    #[must_use]
    pub fn berlin() -> Self {
        let mut spec = Self::istanbul();
        spec.name = "berlin";
        spec.eip2929 = true;
        // The static prices move into the dynamic warm/cold charge.
        for opcode in [
            op::BALANCE,
            op::EXTCODESIZE,
            op::EXTCODECOPY,
            op::EXTCODEHASH,
            op::SLOAD,
            op::CALL,
            op::CALLCODE,
            op::DELEGATECALL,
            op::STATICCALL,
        ] {
            spec.table.set_gas(opcode, 0);
        }
        spec.gas.sstore = SstoreSchedule::NetMetered {
            sload_gas: 100,
            reset_gas: 2_900,
            clear_refund: 15_000,
        };
        spec.precompiles.insert(5, Arc::new(ModExp::berlin()));
        spec
    }

    /// BASEFEE and the EIP-3529 refund reductions.
    #[must_use]
    pub fn london() -> Self {
        let mut spec = Self::berlin();
        spec.name = "london";
        spec.table.set(
            op::BASEFEE,
            Instruction::new("BASEFEE", 2, 0, 1, block::op_basefee),
        );
        spec.refund_quotient = 5;
        spec.gas.selfdestruct_refund = 0;
        spec.gas.sstore = SstoreSchedule::NetMetered {
            sload_gas: 100,
            reset_gas: 2_900,
            clear_refund: 4_800,
        };
        spec
    }

    /// The merge: DIFFICULTY becomes PREVRANDAO and reads the header's
    /// mix-hash.
    #[must_use]
    pub fn paris() -> Self {
        let mut spec = Self::london();
        spec.name = "paris";
        spec.prevrandao = true;
        spec.table.set_name(op::DIFFICULTY, "PREVRANDAO");
        spec
    }

    /// PUSH0.
    #[must_use]
    pub fn shanghai() -> Self {
        let mut spec = Self::paris();
        spec.name = "shanghai";
        spec.table.set(
            op::PUSH0,
            Instruction::new("PUSH0", 2, 0, 1, stack_ops::op_push0),
        );
        spec
    }
}

// =============================================================================
// TESTS
// =============================================================================
