//! Firmware-side peripheral drivers, expressed as bus operations.

use crate::bus::{
    LED_ADDR, LED_ENABLE, NCO_CTRL_ADDR, NCO_CTRL_ENABLE, NCO_PHASE_STEP_ADDR, UART_TX_ADDR,
};
use crate::config::DEFAULT_CLOCK_HZ;
use crate::master::BusOp;
use crate::nco::calculate_phase_step;

/// NCO control and phase-step registers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NcoDriver {
    clock_hz: f64,
}

impl Default for NcoDriver {
    fn default() -> Self {
        Self::new(DEFAULT_CLOCK_HZ)
    }
}

impl NcoDriver {
    /// Driver for an NCO clocked at `clock_hz`.
    #[must_use]
    pub const fn new(clock_hz: f64) -> Self {
        Self { clock_hz }
    }

    /// Writes the phase step for `frequency_hz`.
    #[must_use]
    pub fn set_frequency(&self, frequency_hz: f64) -> BusOp {
        BusOp::Write {
            address: NCO_PHASE_STEP_ADDR,
            data: calculate_phase_step(self.clock_hz, frequency_hz),
        }
    }

    /// Sets or clears the enable bit, keeping the rest of the control register.
    #[must_use]
    pub const fn enable(&self, enable: bool) -> BusOp {
        let (set, clear) = if enable {
            (NCO_CTRL_ENABLE, 0)
        } else {
            (0, NCO_CTRL_ENABLE)
        };
        BusOp::Modify {
            address: NCO_CTRL_ADDR,
            set,
            clear,
        }
    }
}

/// LED register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedDriver;

impl LedDriver {
    /// Turns the LED on or off.
    #[must_use]
    pub const fn enable(self, enable: bool) -> BusOp {
        BusOp::Write {
            address: LED_ADDR,
            data: if enable { LED_ENABLE } else { 0 },
        }
    }
}

/// UART transmit trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UartDriver;

impl UartDriver {
    /// One trigger write per byte; each waits for the transmitter.
    pub fn write_bytes(self, bytes: &[u8]) -> impl Iterator<Item = BusOp> + '_ {
        bytes.iter().map(|&byte| BusOp::Write {
            address: UART_TX_ADDR,
            data: u32::from(byte),
        })
    }
}

/// Start-up sequence of the reference firmware: tune and enable the NCO, light the LED,
/// then send `message` over the UART.
#[must_use]
pub fn boot_sequence(clock_hz: f64, frequency_hz: f64, message: &[u8]) -> Vec<BusOp> {
    let nco = NcoDriver::new(clock_hz);
    let mut ops = vec![
        nco.set_frequency(frequency_hz),
        nco.enable(true),
        LedDriver.enable(true),
    ];
    ops.extend(UartDriver.write_bytes(message));
    ops
}

#[cfg(test)]
mod tests {
    use super::{boot_sequence, LedDriver, NcoDriver, UartDriver};
    use crate::bus::{LED_ADDR, NCO_CTRL_ADDR, NCO_PHASE_STEP_ADDR, UART_TX_ADDR};
    use crate::master::BusOp;

    #[test]
    fn set_frequency_uses_the_default_board_clock() {
        assert_eq!(
            NcoDriver::default().set_frequency(32_768.5),
            BusOp::Write {
                address: NCO_PHASE_STEP_ADDR,
                data: 8_796_227
            }
        );
    }

    #[test]
    fn enable_is_a_read_modify_write() {
        assert_eq!(
            NcoDriver::default().enable(false),
            BusOp::Modify {
                address: NCO_CTRL_ADDR,
                set: 0,
                clear: 1
            }
        );
    }

    #[test]
    fn led_and_uart_target_their_registers() {
        assert_eq!(
            LedDriver.enable(true),
            BusOp::Write {
                address: LED_ADDR,
                data: 1
            }
        );
        let ops: Vec<_> = UartDriver.write_bytes(b"ok").collect();
        assert_eq!(
            ops,
            [
                BusOp::Write {
                    address: UART_TX_ADDR,
                    data: u32::from(b'o')
                },
                BusOp::Write {
                    address: UART_TX_ADDR,
                    data: u32::from(b'k')
                },
            ]
        );
    }

    #[test]
    fn boot_sequence_orders_nco_before_led_and_uart() {
        let ops = boot_sequence(16e6, 1_000.0, b"x");
        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[0], BusOp::Write { address: NCO_PHASE_STEP_ADDR, .. }));
        assert!(matches!(ops[1], BusOp::Modify { address: NCO_CTRL_ADDR, .. }));
        assert!(matches!(ops[2], BusOp::Write { address: LED_ADDR, .. }));
        assert!(matches!(ops[3], BusOp::Write { address: UART_TX_ADDR, .. }));
    }
}
