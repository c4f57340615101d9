//! # Gas Metering
//!
//! The per-frame gas meter plus the dynamic-cost helpers shared by
//! instruction handlers. Fork-dependent prices live on the fork's gas
//! schedule; the helpers here take them as parameters.

use crate::domain::value_objects::U256;
use crate::errors::VmError;

/// Gas charged per word of any copy operation (CALLDATACOPY, CODECOPY,
/// EXTCODECOPY, RETURNDATACOPY).
pub const COPY_WORD_GAS: u64 = 3;

/// Gas charged per word hashed by KECCAK256.
pub const KECCAK_WORD_GAS: u64 = 6;

/// LOG base cost (static in the opcode table).
pub const LOG_GAS: u64 = 375;

/// LOG cost per topic.
pub const LOG_TOPIC_GAS: u64 = 375;

/// LOG cost per byte of data.
pub const LOG_DATA_GAS: u64 = 8;

/// Gas deposited per byte of created contract code.
pub const CODE_DEPOSIT_GAS: u64 = 200;

/// Stipend granted to the callee of a value-carrying call.
pub const CALL_STIPEND: u64 = 2300;

// =============================================================================
// GAS METER
// =============================================================================

/// Monotonic debit counter for one computation frame.
///
/// `used` never decreases except through [`GasMeter::return_gas`], which
/// hands back what a child frame left unspent. The refund accumulator is
/// signed: net-metered SSTORE can take back refunds it granted earlier.
#[derive(Clone, Copy, Debug, Default)]
pub struct GasMeter {
    limit: u64,
    used: u64,
    refund: i64,
}

impl GasMeter {
    /// Creates a meter over `limit` gas.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self {
            limit,
            used: 0,
            refund: 0,
        }
    }

    /// The frame's gas limit.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas consumed so far.
    #[must_use]
    pub const fn used(&self) -> u64 {
        self.used
    }

    /// Gas still available.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Accumulated refund.
    #[must_use]
    pub const fn refund(&self) -> i64 {
        self.refund
    }

    /// Debits `amount` gas.
    ///
    /// # Errors
    ///
    /// Returns `OutOfGas`, draining the meter, when `amount` exceeds
    /// what remains. The reason tag is diagnostic only.
    pub fn consume(&mut self, amount: u64, reason: &'static str) -> Result<(), VmError> {
        if amount > self.remaining() {
            tracing::trace!(amount, remaining = self.remaining(), reason, "out of gas");
            self.used = self.limit;
            return Err(VmError::OutOfGas);
        }
        self.used += amount;
        Ok(())
    }

    /// Drains the meter (exceptional halts burn the frame's gas).
    pub fn consume_all(&mut self) {
        self.used = self.limit;
    }

    /// Credits back gas a child frame did not spend.
    pub fn return_gas(&mut self, amount: u64) {
        debug_assert!(amount <= self.used);
        self.used -= amount;
    }

    /// Adds to the refund accumulator.
    pub fn add_refund(&mut self, amount: u64) {
        self.refund += amount as i64;
    }

    /// Subtracts from the refund accumulator (may drive it negative).
    pub fn sub_refund(&mut self, amount: u64) {
        self.refund -= amount as i64;
    }

    /// Merges a finished child frame's refund into this one.
    pub fn merge_refund(&mut self, child_refund: i64) {
        self.refund += child_refund;
    }

    /// The refund actually applied at the outermost frame: clamped at zero
    /// and capped at `gas_used / quotient` (quotient 2 before London, 5
    /// after EIP-3529).
    #[must_use]
    pub fn capped_refund(&self, quotient: u64) -> u64 {
        let refund = self.refund.max(0) as u64;
        refund.min(self.used / quotient)
    }
}

// =============================================================================
// DYNAMIC COST HELPERS
// =============================================================================

/// Per-word cost of copying `size` bytes.
#[must_use]
pub fn copy_gas(size: usize) -> u64 {
    COPY_WORD_GAS * size.div_ceil(32) as u64
}

/// Per-word cost of hashing `size` bytes with KECCAK256 (base cost is
/// static in the opcode table).
#[must_use]
pub fn keccak_gas(size: usize) -> u64 {
    KECCAK_WORD_GAS * size.div_ceil(32) as u64
}

/// Cost of a LOG with `topics` topics over `size` bytes, beyond the static
/// base.
#[must_use]
pub fn log_gas(size: usize, topics: usize) -> u64 {
    LOG_TOPIC_GAS * topics as u64 + LOG_DATA_GAS * size as u64
}

/// Per-byte-of-exponent cost of EXP. The per-byte price rose from 10 to 50
/// at Spurious Dragon, so it arrives as a parameter.
#[must_use]
pub fn exp_gas(exponent: U256, byte_gas: u64) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let bits = 256 - u64::from(exponent.leading_zeros());
    byte_gas * bits.div_ceil(8)
}

/// EIP-150 forwarding cap: at most 63/64 of the remaining gas may follow a
/// call or creation.
#[must_use]
pub fn max_call_gas(remaining: u64) -> u64 {
    remaining - remaining / 64
}

// =============================================================================
// TESTS
// =============================================================================
