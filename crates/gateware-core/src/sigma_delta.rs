//! First-order sigma-delta DAC.
//!
//! A `width + 1` bit accumulator adds the input to its low `width` bits every
//! tick; the top bit (the carry out of that addition) is the output.

use crate::{bits::check_width, BitVector, ConfigError};

/// Single-bit density modulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigmaDeltaDac {
    width: u32,
    accumulator: BitVector,
}

impl SigmaDeltaDac {
    /// Creates a modulator for `width`-bit samples with a zeroed accumulator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWidth`] unless `width` is in `1..=63`.
    pub fn new(width: u32) -> Result<Self, ConfigError> {
        let width = check_width(width)?;
        if width == crate::bits::MAX_WIDTH {
            return Err(ConfigError::InvalidWidth { width });
        }
        Ok(Self {
            width,
            accumulator: BitVector::new(width + 1, 0),
        })
    }

    /// Input sample width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Registered accumulator value.
    #[must_use]
    pub const fn accumulator(&self) -> BitVector {
        self.accumulator
    }

    /// Output bit: top bit of the registered accumulator.
    #[must_use]
    pub const fn output(&self) -> bool {
        self.accumulator.msb()
    }

    /// Next accumulator for `input`, truncated or extended to the sample width.
    #[must_use]
    pub const fn evaluate(&self, input: BitVector) -> BitVector {
        self.accumulator
            .slice(0, self.width)
            .widening_add(input.to_unsigned().resize(self.width))
    }

    /// Latches an accumulator produced by [`Self::evaluate`].
    pub const fn commit(&mut self, next: BitVector) {
        self.accumulator = next.resize(self.width + 1);
    }

    /// Evaluates and commits one tick, returning the new output bit.
    pub const fn tick(&mut self, input: BitVector) -> bool {
        let next = self.evaluate(input);
        self.commit(next);
        self.output()
    }

    /// Clears the accumulator.
    pub const fn reset(&mut self) {
        self.accumulator = BitVector::new(self.width + 1, 0);
    }
}
