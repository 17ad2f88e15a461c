//! Clock-domain crossing primitives.

use crate::ConfigError;

/// Fewest stages a reset synchronizer may have.
pub const MIN_STAGES: u8 = 2;
/// Most stages a reset synchronizer may have.
pub const MAX_STAGES: u8 = 8;

/// Bridges an asynchronous reset into a clock domain.
///
/// Assertion is immediate. Deassertion ripples through a shift register of
/// `stages` flops clocked by the destination domain, so the domain leaves
/// reset `stages` edges after the asynchronous input drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetSynchronizer {
    stages: u8,
    chain: u8,
}

impl ResetSynchronizer {
    /// Creates a synchronizer with every stage asserted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSynchronizerStages`] outside `2..=8`.
    pub const fn new(stages: u8) -> Result<Self, ConfigError> {
        if stages < MIN_STAGES || stages > MAX_STAGES {
            return Err(ConfigError::InvalidSynchronizerStages { stages });
        }
        Ok(Self {
            stages,
            chain: Self::all_asserted(stages),
        })
    }

    const fn all_asserted(stages: u8) -> u8 {
        u8::MAX >> (8 - stages)
    }

    /// Number of flops in the chain.
    #[must_use]
    pub const fn stages(&self) -> u8 {
        self.stages
    }

    /// Domain reset as seen by logic in the destination domain.
    #[must_use]
    pub const fn asserted(&self) -> bool {
        self.chain & (1 << (self.stages - 1)) != 0
    }

    /// Applies the asynchronous input between edges: a high input asserts every stage at once.
    pub const fn apply_async(&mut self, arst: bool) {
        if arst {
            self.chain = Self::all_asserted(self.stages);
        }
    }

    /// Chain contents after the next destination-domain edge.
    #[must_use]
    pub const fn evaluate(&self, arst: bool) -> u8 {
        if arst {
            Self::all_asserted(self.stages)
        } else {
            (self.chain << 1) & Self::all_asserted(self.stages)
        }
    }

    /// Latches a chain produced by [`Self::evaluate`].
    pub const fn commit(&mut self, next: u8) {
        self.chain = next & Self::all_asserted(self.stages);
    }
}
