//! 8N1 serial transmitter fed by the UART custom bus effect.
//!
//! ## Frame
//!
//! | Bit | Value |
//! |-----|-------|
//! | start | 0 |
//! | 0-7 | data, LSB first |
//! | stop | 1 |
//!
//! Each bit is held for `divisor = round(clock_hz / baud_rate)` ticks. The
//! line idles high.

use tracing::debug;

use crate::ConfigError;

/// Bits per frame: start, eight data bits, stop.
pub const FRAME_BITS: u8 = 10;

/// Transmitter registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TxRegisters {
    shift: u16,
    bits_left: u8,
    ticks_left: u32,
    byte: u8,
}

/// Next-state values computed by [`UartTx::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UartNext {
    registers: TxRegisters,
    completed: Option<u8>,
}

impl UartNext {
    /// Byte whose stop bit ends on this edge.
    #[must_use]
    pub const fn completed(&self) -> Option<u8> {
        self.completed
    }
}

/// Serial transmitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UartTx {
    divisor: u32,
    registers: TxRegisters,
    sent: Vec<u8>,
}

impl UartTx {
    /// Transmitter for `baud_rate` on a `clock_hz` clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaudRate`] when the divisor rounds to
    /// zero or does not fit 32 bits.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(clock_hz: f64, baud_rate: u32) -> Result<Self, ConfigError> {
        let divisor = (clock_hz / f64::from(baud_rate)).round();
        if !divisor.is_finite() || divisor < 1.0 || divisor > u32::MAX as f64 {
            return Err(ConfigError::InvalidBaudRate {
                baud_rate,
                clock_hz,
            });
        }
        Ok(Self {
            divisor: divisor as u32,
            registers: TxRegisters::default(),
            sent: Vec::new(),
        })
    }

    /// Ticks per bit.
    #[must_use]
    pub const fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Whether a new byte would be accepted on the next edge.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.registers.bits_left == 0
    }

    /// Serial line level.
    #[must_use]
    pub const fn line(&self) -> bool {
        self.is_idle() || self.registers.shift & 1 != 0
    }

    /// Bytes whose frames have fully gone out, oldest first.
    #[must_use]
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Next registers; `start` loads a new frame when the transmitter is idle.
    #[must_use]
    pub fn evaluate(&self, start: Option<u8>) -> UartNext {
        let current = self.registers;
        if current.bits_left == 0 {
            let registers = match start {
                Some(byte) => TxRegisters {
                    shift: (u16::from(byte) << 1) | (1 << (FRAME_BITS - 1)),
                    bits_left: FRAME_BITS,
                    ticks_left: self.divisor,
                    byte,
                },
                None => current,
            };
            return UartNext {
                registers,
                completed: None,
            };
        }

        if current.ticks_left > 1 {
            return UartNext {
                registers: TxRegisters {
                    ticks_left: current.ticks_left - 1,
                    ..current
                },
                completed: None,
            };
        }

        let bits_left = current.bits_left - 1;
        UartNext {
            registers: TxRegisters {
                shift: current.shift >> 1,
                bits_left,
                ticks_left: self.divisor,
                byte: current.byte,
            },
            completed: if bits_left == 0 {
                Some(current.byte)
            } else {
                None
            },
        }
    }

    /// Latches registers from [`Self::evaluate`] and records any completed byte.
    pub fn commit(&mut self, next: UartNext) {
        self.registers = next.registers;
        if let Some(byte) = next.completed {
            debug!(byte, ch = %char::from(byte).escape_default(), "uart byte sent");
            self.sent.push(byte);
        }
    }

    /// Returns the line to idle, discarding any frame in flight.
    pub const fn reset(&mut self) {
        self.registers = TxRegisters {
            shift: 0,
            bits_left: 0,
            ticks_left: 0,
            byte: 0,
        };
    }
}
