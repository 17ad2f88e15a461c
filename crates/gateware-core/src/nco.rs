//! Phase accumulator and numerically-controlled oscillator.

use crate::{sincos::SinCos, ConfigError, QuarterWaveTable};

/// Width of the phase accumulator register.
pub const PHASE_BITS: u32 = 32;

/// Converts a target frequency into a phase step for a clock running at `clock_hz`.
///
/// Computes `round(2^32 * frequency_hz / clock_hz)`, rounding halves away from
/// zero and wrapping into 32 bits. Nothing checks Nyquist: a frequency above
/// `clock_hz / 2` aliases silently, as it would in hardware.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_phase_step(clock_hz: f64, frequency_hz: f64) -> u32 {
    let full_turn = f64::from(u32::MAX) + 1.0;
    (full_turn * frequency_hz / clock_hz).round() as i64 as u32
}

/// Free-running 32-bit phase register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PhaseAccumulator {
    phase: u32,
}

impl PhaseAccumulator {
    /// Accumulator at reset (phase zero).
    #[must_use]
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// Current registered phase.
    #[must_use]
    pub const fn phase(&self) -> u32 {
        self.phase
    }

    /// Next phase for `step`, computed from the current snapshot.
    #[must_use]
    pub const fn evaluate(&self, step: u32) -> u32 {
        self.phase.wrapping_add(step)
    }

    /// Latches a value produced by [`Self::evaluate`].
    pub const fn commit(&mut self, next: u32) {
        self.phase = next;
    }

    /// Returns the register to zero.
    pub const fn reset(&mut self) {
        self.phase = 0;
    }
}

/// Bus-visible NCO controls, read from the register file every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NcoControl {
    /// Phase increment per tick.
    pub step: u32,
    /// Enable bit of the control register.
    pub enable: bool,
}

/// Oscillator: a phase accumulator addressing a quarter-wave table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nco {
    table: QuarterWaveTable,
    accumulator: PhaseAccumulator,
    honor_enable: bool,
}

impl Nco {
    /// Builds an oscillator with `out_width`-bit samples and a `samples`-entry quarter table.
    ///
    /// With `honor_enable` unset the enable bit is ignored and the
    /// accumulator advances every tick.
    ///
    /// # Errors
    ///
    /// Propagates table sizing errors from [`QuarterWaveTable::new`].
    pub fn new(out_width: u32, samples: usize, honor_enable: bool) -> Result<Self, ConfigError> {
        Ok(Self {
            table: QuarterWaveTable::new(out_width, samples)?,
            accumulator: PhaseAccumulator::new(),
            honor_enable,
        })
    }

    /// Sample width of the sine and cosine outputs.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.table.out_width()
    }

    /// Backing quarter-wave table.
    #[must_use]
    pub const fn table(&self) -> &QuarterWaveTable {
        &self.table
    }

    /// Current registered phase.
    #[must_use]
    pub const fn phase(&self) -> u32 {
        self.accumulator.phase()
    }

    /// Whether the enable bit gates accumulation.
    #[must_use]
    pub const fn honors_enable(&self) -> bool {
        self.honor_enable
    }

    /// Table address: the top `address_bits` of the phase.
    #[must_use]
    pub const fn address(&self) -> u32 {
        self.accumulator.phase() >> (PHASE_BITS - self.table.address_bits())
    }

    /// Combinational sine and cosine for the current phase.
    #[must_use]
    pub fn outputs(&self) -> SinCos {
        self.table.lookup(self.address())
    }

    /// Next phase for the given controls.
    #[must_use]
    pub const fn evaluate(&self, control: NcoControl) -> u32 {
        if self.honor_enable && !control.enable {
            self.accumulator.phase()
        } else {
            self.accumulator.evaluate(control.step)
        }
    }

    /// Latches a phase produced by [`Self::evaluate`].
    pub const fn commit(&mut self, next: u32) {
        self.accumulator.commit(next);
    }

    /// Evaluates and commits one tick.
    pub const fn tick(&mut self, control: NcoControl) {
        let next = self.evaluate(control);
        self.commit(next);
    }

    /// Holds the accumulator at its reset value.
    pub const fn reset(&mut self) {
        self.accumulator.reset();
    }
}
