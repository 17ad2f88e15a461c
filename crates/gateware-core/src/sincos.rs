//! Quarter-wave sine table with full-cycle sine and cosine read ports.
//!
//! Only the first quadrant of the sine is stored. A phase address of
//! `log2(samples) + 2` bits is split into the two top quadrant bits and the
//! table index:
//!
//! ```text
//!  address:  [ q1 | q0 | index (log2(samples) bits) ]
//!  q0 = 1 -> mirror the index (read table[!index])
//!  q1 = 1 -> negative half: Cat(!data, 0), else Cat(data, 1)
//! ```
//!
//! Samples are offset-binary: the top bit is set for the positive half of the
//! cycle, which is what the sigma-delta DACs consume directly.

use std::f64::consts::FRAC_PI_2;

use crate::{bits::check_width, BitVector, ConfigError};

/// Narrowest supported sample width (one amplitude bit plus the half bit).
pub const MIN_OUT_WIDTH: u32 = 2;
/// Widest supported sample width.
pub const MAX_OUT_WIDTH: u32 = 32;

/// Sine and cosine samples read in the same evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinCos {
    /// Sine sample at the phase address.
    pub sin: BitVector,
    /// Cosine sample (sine one quadrant ahead).
    pub cos: BitVector,
}

/// Immutable quarter-wave amplitude table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterWaveTable {
    out_width: u32,
    address_bits: u32,
    table: Box<[u32]>,
}

impl QuarterWaveTable {
    /// Builds the table for `samples` quarter-period entries at `out_width` bits.
    ///
    /// Entry `i` is `round(2^(out_width-1) * sin(pi/2 * i / samples))`,
    /// saturated to the `out_width - 1` bits each entry is stored in.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWidth`] for widths outside `2..=32`,
    /// [`ConfigError::SampleCountNotPowerOfTwo`] when `samples` is not a power
    /// of two, and [`ConfigError::AddressTooWide`] when the phase address would
    /// not fit 32 bits.
    pub fn new(out_width: u32, samples: usize) -> Result<Self, ConfigError> {
        let out_width = check_width(out_width)?;
        if !(MIN_OUT_WIDTH..=MAX_OUT_WIDTH).contains(&out_width) {
            return Err(ConfigError::InvalidWidth { width: out_width });
        }
        if !samples.is_power_of_two() {
            return Err(ConfigError::SampleCountNotPowerOfTwo { samples });
        }
        let address_bits = samples.trailing_zeros() + 2;
        if address_bits > u32::BITS {
            return Err(ConfigError::AddressTooWide { bits: address_bits });
        }

        let full_scale = f64::from(1_u32 << (out_width - 1));
        let max_amplitude = (1_u32 << (out_width - 1)) - 1;
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let table = (0..samples)
            .map(|i| {
                let angle = FRAC_PI_2 * (i as f64 / samples as f64);
                let amplitude = (full_scale * angle.sin()).round() as u32;
                amplitude.min(max_amplitude)
            })
            .collect();

        Ok(Self {
            out_width,
            address_bits,
            table,
        })
    }

    /// Width of each full-cycle sample.
    #[must_use]
    pub const fn out_width(&self) -> u32 {
        self.out_width
    }

    /// Number of stored quarter-period entries.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.table.len()
    }

    /// Width of the phase address (`log2(samples) + 2`).
    #[must_use]
    pub const fn address_bits(&self) -> u32 {
        self.address_bits
    }

    /// Stored quarter-wave amplitudes, in index order.
    #[must_use]
    pub fn amplitudes(&self) -> &[u32] {
        &self.table
    }

    /// Quarter-wave entry `index`, or `None` past the end of the table.
    #[must_use]
    pub fn amplitude(&self, index: usize) -> Option<u32> {
        self.table.get(index).copied()
    }

    /// Full-cycle sine sample for `address` (truncated to the address width).
    #[must_use]
    pub fn sin(&self, address: u32) -> BitVector {
        self.read_port(address)
    }

    /// Full-cycle cosine sample: the sine read port addressed one quadrant ahead.
    #[must_use]
    pub fn cos(&self, address: u32) -> BitVector {
        self.read_port(self.advance_quadrant(address))
    }

    /// Reads both ports for the same phase address.
    #[must_use]
    pub fn lookup(&self, address: u32) -> SinCos {
        SinCos {
            sin: self.sin(address),
            cos: self.cos(address),
        }
    }

    /// Two's-complement view of an offset-binary sample.
    #[must_use]
    pub fn to_signed(&self, sample: BitVector) -> i64 {
        let sign = BitVector::new(self.out_width, 1 << (self.out_width - 1));
        BitVector::new(self.out_width, sample.as_u64() ^ sign.as_u64())
            .to_signed()
            .as_i64()
    }

    fn address_mask(&self) -> u64 {
        crate::bits::mask(self.address_bits)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn advance_quadrant(&self, address: u32) -> u32 {
        // address + samples, wrapped to the address width
        BitVector::new(self.address_bits, u64::from(address) & self.address_mask())
            .wrapping_add(self.table.len() as u64)
            .as_u64() as u32
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_port(&self, address: u32) -> BitVector {
        let address = BitVector::new(self.address_bits, u64::from(address));
        let index_bits = self.address_bits - 2;
        let mirror = address.bit(index_bits);
        let negate = address.bit(index_bits + 1);

        let mut index = address.slice(0, index_bits);
        if mirror {
            index = index.not();
        }
        let index = if index_bits == 0 { 0 } else { index.as_u64() as usize };

        let data = BitVector::new(self.out_width - 1, u64::from(self.table[index]));
        if negate {
            data.not().concat(BitVector::ZERO)
        } else {
            data.concat(BitVector::ONE)
        }
    }
}
