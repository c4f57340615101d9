//! # Chain Configuration
//!
//! Maps block heights to fork specifications. Later forks are declared as
//! (activation height, spec) transitions over the genesis rules.

use crate::forks::ForkSpec;

/// Block-height keyed fork registry.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    chain_id: u64,
    /// (activation height, spec), strictly ascending; index 0 is genesis.
    transitions: Vec<(u64, ForkSpec)>,
}

impl ChainConfig {
    /// A chain running `genesis` rules from block zero.
    #[must_use]
    pub fn new(chain_id: u64, genesis: ForkSpec) -> Self {
        Self {
            chain_id,
            transitions: vec![(0, genesis)],
        }
    }

    /// A single-fork chain, the usual shape for tests.
    #[must_use]
    pub fn single(chain_id: u64, spec: ForkSpec) -> Self {
        Self::new(chain_id, spec)
    }

    /// Declares `spec` active from `height` on. Heights must be added in
    /// ascending order.
    #[must_use]
    pub fn with_fork(mut self, height: u64, spec: ForkSpec) -> Self {
        assert!(
            height > self.transitions.last().map_or(0, |(h, _)| *h),
            "fork heights must ascend"
        );
        self.transitions.push((height, spec));
        self
    }

    /// The chain id (EIP-155).
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The fork active at a block height.
    #[must_use]
    pub fn fork_at(&self, block_number: u64) -> &ForkSpec {
        let idx = self
            .transitions
            .partition_point(|(height, _)| *height <= block_number);
        &self.transitions[idx - 1].1
    }

    /// The Ethereum mainnet schedule. Constantinople never ran alone on
    /// mainnet: Petersburg superseded it at the same height.
    #[must_use]
    pub fn mainnet() -> Self {
        Self::new(1, ForkSpec::frontier())
            .with_fork(1_150_000, ForkSpec::homestead())
            .with_fork(2_463_000, ForkSpec::tangerine())
            .with_fork(2_675_000, ForkSpec::spurious_dragon())
            .with_fork(4_370_000, ForkSpec::byzantium())
            .with_fork(7_280_000, ForkSpec::petersburg())
            .with_fork(9_069_000, ForkSpec::istanbul())
            .with_fork(12_244_000, ForkSpec::berlin())
            .with_fork(12_965_000, ForkSpec::london())
            .with_fork(15_537_394, ForkSpec::paris())
            .with_fork(17_034_870, ForkSpec::shanghai())
    }
}

// =============================================================================
// TESTS
// =============================================================================
