//! iCE40 PLL coefficient search and PLL clock-domain model.
//!
//! All frequencies are in MHz. The search enumerates `divr`, `divf` and
//! `divq` in ascending order and keeps the first output frequency closest to
//! the request.

use std::fmt;
use std::ops::RangeInclusive;

use tracing::warn;

use crate::ConfigError;

/// Accepted reference-clock range (MHz).
pub const INPUT_RANGE_MHZ: RangeInclusive<f64> = 10.0..=160.0;
/// Accepted output-clock range (MHz).
pub const OUTPUT_RANGE_MHZ: RangeInclusive<f64> = 16.0..=275.0;
/// Phase-detector frequency window (MHz).
pub const PFD_RANGE_MHZ: RangeInclusive<f64> = 10.0..=133.0;
/// VCO frequency window (MHz).
pub const VCO_RANGE_MHZ: RangeInclusive<f64> = 533.0..=1066.0;
/// Number of reference divider settings searched.
pub const DIVR_COUNT: u8 = 16;
/// Number of feedback divider settings searched.
pub const DIVF_COUNT: u8 = 128;
/// Number of output divider settings searched.
pub const DIVQ_COUNT: u8 = 8;

/// Divider settings for the PLL primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PllCoefficients {
    /// Reference divider (`pfd = f_in / (divr + 1)`).
    pub divr: u8,
    /// Feedback divider (`vco = pfd * (divf + 1)`).
    pub divf: u8,
    /// Output divider (`f_out = vco / 2^divq`).
    pub divq: u8,
}

impl PllCoefficients {
    /// Output frequency these settings produce from `f_in_mhz`.
    #[must_use]
    pub fn output_mhz(self, f_in_mhz: f64) -> f64 {
        let vco = Self::pfd(f_in_mhz, self.divr) * f64::from(self.divf + 1);
        vco / f64::from(1_u32 << self.divq)
    }

    fn pfd(f_in_mhz: f64, divr: u8) -> f64 {
        f_in_mhz / f64::from(divr + 1)
    }
}

impl fmt::Display for PllCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DIVR={} DIVF={} DIVQ={}", self.divr, self.divf, self.divq)
    }
}

/// Non-fatal notice that the best reachable frequency differs from the request.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PrecisionWarning {
    /// Requested output frequency.
    pub requested_mhz: f64,
    /// Frequency the chosen coefficients produce.
    pub achieved_mhz: f64,
}

impl PrecisionWarning {
    /// Signed deviation `achieved - requested` in MHz.
    #[must_use]
    pub const fn deviation_mhz(&self) -> f64 {
        self.achieved_mhz - self.requested_mhz
    }
}

impl fmt::Display for PrecisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PLL: requested {} MHz, got {} MHz",
            self.requested_mhz, self.achieved_mhz
        )
    }
}

/// Result of a coefficient search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PllSolution {
    /// Chosen divider settings.
    pub coefficients: PllCoefficients,
    /// Output frequency they produce.
    pub f_actual_mhz: f64,
    /// Present when `f_actual_mhz` differs from the request.
    pub warning: Option<PrecisionWarning>,
}

impl PllSolution {
    /// Whether the request was met exactly.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.warning.is_none()
    }
}

/// Searches for the divider settings closest to `f_req_mhz`.
///
/// Ties keep the first candidate in ascending `(divr, divf, divq)` order. An
/// inexact result carries a [`PrecisionWarning`] and is logged at warn level.
///
/// # Errors
///
/// Rejects inputs outside [`INPUT_RANGE_MHZ`] or [`OUTPUT_RANGE_MHZ`] before
/// searching, and returns [`ConfigError::PllUnreachable`] when no divider
/// combination satisfies the phase-detector and VCO windows.
#[allow(clippy::float_cmp)]
pub fn solve(f_in_mhz: f64, f_req_mhz: f64) -> Result<PllSolution, ConfigError> {
    if !INPUT_RANGE_MHZ.contains(&f_in_mhz) {
        return Err(ConfigError::PllInputOutOfRange { f_in_mhz });
    }
    if !OUTPUT_RANGE_MHZ.contains(&f_req_mhz) {
        return Err(ConfigError::PllOutputOutOfRange { f_req_mhz });
    }

    let mut best: Option<(PllCoefficients, f64)> = None;
    for divr in 0..DIVR_COUNT {
        let pfd = PllCoefficients::pfd(f_in_mhz, divr);
        if !PFD_RANGE_MHZ.contains(&pfd) {
            continue;
        }
        for divf in 0..DIVF_COUNT {
            let vco = pfd * f64::from(divf + 1);
            if !VCO_RANGE_MHZ.contains(&vco) {
                continue;
            }
            for divq in 0..DIVQ_COUNT {
                let f_out = vco / f64::from(1_u32 << divq);
                let best_out = best.map_or(f64::INFINITY, |(_, out)| out);
                if (f_out - f_req_mhz).abs() < (best_out - f_req_mhz).abs() {
                    best = Some((PllCoefficients { divr, divf, divq }, f_out));
                }
            }
        }
    }

    let (coefficients, f_actual_mhz) = best.ok_or(ConfigError::PllUnreachable {
        f_in_mhz,
        f_req_mhz,
    })?;
    let warning = (f_actual_mhz != f_req_mhz).then(|| {
        let warning = PrecisionWarning {
            requested_mhz: f_req_mhz,
            achieved_mhz: f_actual_mhz,
        };
        warn!(
            requested_mhz = f_req_mhz,
            achieved_mhz = f_actual_mhz,
            %coefficients,
            "{warning}"
        );
        warning
    });

    Ok(PllSolution {
        coefficients,
        f_actual_mhz,
        warning,
    })
}

/// PLL output clock: solved coefficients plus a lock indicator.
///
/// `lock` rises once `lock_ticks` reference edges have elapsed and stays high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PllClock {
    solution: PllSolution,
    lock_ticks: u32,
    elapsed: u32,
}

impl PllClock {
    /// Sizes the PLL for `f_out_mhz` from a `f_in_mhz` reference.
    ///
    /// # Errors
    ///
    /// Propagates [`solve`] errors.
    pub fn new(f_in_mhz: f64, f_out_mhz: f64, lock_ticks: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            solution: solve(f_in_mhz, f_out_mhz)?,
            lock_ticks,
            elapsed: 0,
        })
    }

    /// Search result backing this clock.
    #[must_use]
    pub const fn solution(&self) -> &PllSolution {
        &self.solution
    }

    /// Frequency the output domain actually runs at, in MHz.
    #[must_use]
    pub const fn output_mhz(&self) -> f64 {
        self.solution.f_actual_mhz
    }

    /// Lock indicator.
    #[must_use]
    pub const fn locked(&self) -> bool {
        self.elapsed >= self.lock_ticks
    }

    /// Counts one reference-clock edge.
    pub const fn tick_reference(&mut self) {
        self.elapsed = self.elapsed.saturating_add(1);
    }

    /// Drops lock, as when the reference reset is asserted.
    pub const fn reset(&mut self) {
        self.elapsed = 0;
    }
}
