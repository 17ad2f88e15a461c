//! Fixed-width bit vectors with hardware register semantics.
//!
//! Every operation truncates or wraps to the declared width, the way a
//! register of that width would. Nothing here traps on overflow.

use std::fmt;

use crate::ConfigError;

/// Widest vector supported by [`BitVector`].
pub const MAX_WIDTH: u32 = 64;

/// Returns the all-ones mask for `width` bits (`width` is clamped to `1..=64`).
#[must_use]
pub const fn mask(width: u32) -> u64 {
    let width = clamp_width(width);
    if width == MAX_WIDTH {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

const fn clamp_width(width: u32) -> u32 {
    if width == 0 {
        1
    } else if width > MAX_WIDTH {
        MAX_WIDTH
    } else {
        width
    }
}

/// Validates a configured signal width.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidWidth`] when `width` is outside `1..=64`.
pub fn check_width(width: u32) -> Result<u32, ConfigError> {
    if width == 0 || width > MAX_WIDTH {
        Err(ConfigError::InvalidWidth { width })
    } else {
        Ok(width)
    }
}

/// Fixed-width unsigned or signed value.
///
/// The width is fixed at construction and never changes; use
/// [`BitVector::resize`] to model assignment into a signal of another width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BitVector {
    width: u32,
    bits: u64,
    signed: bool,
}

impl BitVector {
    /// Single set bit.
    pub const ONE: Self = Self::new(1, 1);
    /// Single clear bit.
    pub const ZERO: Self = Self::new(1, 0);

    /// Creates an unsigned vector, truncating `value` to `width` bits.
    ///
    /// Widths outside `1..=64` are clamped; configuration code should validate
    /// them first with [`check_width`].
    #[must_use]
    pub const fn new(width: u32, value: u64) -> Self {
        let width = clamp_width(width);
        Self {
            width,
            bits: value & mask(width),
            signed: false,
        }
    }

    /// Creates a two's-complement vector from a signed value.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_signed(width: u32, value: i64) -> Self {
        let width = clamp_width(width);
        Self {
            width,
            bits: (value as u64) & mask(width),
            signed: true,
        }
    }

    /// Declared width in bits.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width
    }

    /// Whether the vector is interpreted as two's complement.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        self.signed
    }

    /// Raw bit pattern, zero-extended.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.bits
    }

    /// Numeric value: sign-extended when signed, zero-extended otherwise.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn as_i64(self) -> i64 {
        if self.signed && self.msb() && self.width < MAX_WIDTH {
            (self.bits | !mask(self.width)) as i64
        } else {
            self.bits as i64
        }
    }

    /// Reinterprets the same bits as two's complement.
    #[must_use]
    pub const fn to_signed(self) -> Self {
        Self {
            signed: true,
            ..self
        }
    }

    /// Reinterprets the same bits as unsigned.
    #[must_use]
    pub const fn to_unsigned(self) -> Self {
        Self {
            signed: false,
            ..self
        }
    }

    /// Bit `index`; bits beyond the width read as zero.
    #[must_use]
    pub const fn bit(self, index: u32) -> bool {
        index < self.width && (self.bits >> index) & 1 == 1
    }

    /// Top bit (the sign bit for signed vectors, the carry for accumulators).
    #[must_use]
    pub const fn msb(self) -> bool {
        self.bit(self.width - 1)
    }

    /// `len` bits starting at `lo`, as an unsigned vector.
    ///
    /// The slice is clipped to the bits that exist; an empty slice yields a
    /// single zero bit.
    #[must_use]
    pub const fn slice(self, lo: u32, len: u32) -> Self {
        if lo >= self.width || len == 0 {
            return Self::ZERO;
        }
        let available = self.width - lo;
        let len = if len > available { available } else { len };
        Self::new(len, self.bits >> lo)
    }

    /// Concatenates `high` above `self` (`self` keeps the low bits).
    ///
    /// The result width saturates at 64 bits; bits of `high` that would land
    /// above bit 63 are dropped.
    #[must_use]
    pub const fn concat(self, high: Self) -> Self {
        if self.width == MAX_WIDTH {
            return self.to_unsigned();
        }
        let width = self.width + high.width;
        Self::new(width, self.bits | (high.bits << self.width))
    }

    /// Bitwise complement within the width.
    #[must_use]
    pub const fn not(self) -> Self {
        Self {
            bits: !self.bits & mask(self.width),
            ..self
        }
    }

    /// Adds `rhs` and wraps to the current width.
    #[must_use]
    pub const fn wrapping_add(self, rhs: u64) -> Self {
        Self {
            bits: self.bits.wrapping_add(rhs) & mask(self.width),
            ..self
        }
    }

    /// Adds `rhs` producing one extra bit of width, like hardware `a + b`.
    ///
    /// The result is as wide as the wider operand plus one (at most 64 bits).
    #[must_use]
    pub const fn widening_add(self, rhs: Self) -> Self {
        let operand = if self.width > rhs.width {
            self.width
        } else {
            rhs.width
        };
        Self::new(operand + 1, self.bits.wrapping_add(rhs.bits))
    }

    /// Assigns into a signal of `width` bits: truncates when narrower,
    /// sign- or zero-extends when wider.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn resize(self, width: u32) -> Self {
        let value = self.as_i64() as u64;
        Self {
            width: clamp_width(width),
            bits: value & mask(width),
            signed: self.signed,
        }
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.width as usize;
        write!(f, "{}'b{:0width$b}", self.width, self.bits)
    }
}
