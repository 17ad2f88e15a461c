//! Construction-time configuration for the top-level design and simulator.
//!
//! Defaults describe the reference board: a 16 MHz clock, a 12-bit NCO over a
//! 1024-entry quarter table, 256 words of RAM and a 9600 baud UART, with the
//! whole design in the reference domain.

use crate::bus::DEFAULT_RAM_WORDS;

/// Reference clock of the board.
pub const DEFAULT_CLOCK_HZ: f64 = 16_000_000.0;
/// NCO and DAC sample width.
pub const DEFAULT_NCO_WIDTH: u32 = 12;
/// Quarter-wave table entries.
pub const DEFAULT_NCO_SAMPLES: usize = 1024;
/// UART baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// PLL output requested when a PLL domain is configured without a frequency.
pub const DEFAULT_PLL_OUTPUT_MHZ: f64 = 50.0;
/// Reference ticks before the PLL reports lock.
pub const DEFAULT_PLL_LOCK_TICKS: u32 = 16;
/// Flops in the PLL-domain reset synchronizer.
pub const DEFAULT_SYNC_STAGES: u8 = 2;

/// Oscillator sizing and enable policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NcoConfig {
    /// Sample width of the sine/cosine outputs and of both DACs.
    pub width: u32,
    /// Quarter-wave table entries (power of two).
    pub samples: usize,
    /// Gate accumulation on the control register's enable bit.
    pub honor_enable: bool,
}

impl Default for NcoConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_NCO_WIDTH,
            samples: DEFAULT_NCO_SAMPLES,
            honor_enable: false,
        }
    }
}

/// Local memory sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemoryConfig {
    /// Zeroed words placed before the firmware image.
    pub ram_words: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ram_words: DEFAULT_RAM_WORDS,
        }
    }
}

/// Serial transmitter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UartConfig {
    /// Line rate in bits per second.
    pub baud_rate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// PLL-derived signal domain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PllConfig {
    /// Requested output frequency in MHz.
    pub output_mhz: f64,
    /// Reference ticks until lock.
    pub lock_ticks: u32,
    /// Reset synchronizer depth.
    pub synchronizer_stages: u8,
}

impl Default for PllConfig {
    fn default() -> Self {
        Self {
            output_mhz: DEFAULT_PLL_OUTPUT_MHZ,
            lock_ticks: DEFAULT_PLL_LOCK_TICKS,
            synchronizer_stages: DEFAULT_SYNC_STAGES,
        }
    }
}

/// Full simulator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Reference (bus-side) clock in Hz.
    pub clock_hz: f64,
    /// Oscillator settings.
    pub nco: NcoConfig,
    /// Memory settings.
    pub memory: MemoryConfig,
    /// UART settings.
    pub uart: UartConfig,
    /// Signal path in a PLL domain when present, otherwise in the reference domain.
    pub pll: Option<PllConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            nco: NcoConfig::default(),
            memory: MemoryConfig::default(),
            uart: UartConfig::default(),
            pll: None,
        }
    }
}

impl SimConfig {
    /// Reference clock in MHz, as the PLL solver takes it.
    #[must_use]
    pub const fn clock_mhz(&self) -> f64 {
        self.clock_hz / 1e6
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{MemoryConfig, SimConfig, DEFAULT_CLOCK_HZ};
    use crate::{ConfigError, ErrorClass, Top};

    #[test]
    fn defaults_describe_the_reference_board() {
        let config = SimConfig::default();
        assert!((config.clock_hz - DEFAULT_CLOCK_HZ).abs() < f64::EPSILON);
        assert_eq!(config.nco.width, 12);
        assert_eq!(config.nco.samples, 1024);
        assert!(!config.nco.honor_enable);
        assert_eq!(config.memory.ram_words, 256);
        assert_eq!(config.uart.baud_rate, 9600);
        assert!(config.pll.is_none());
        assert!((config.clock_mhz() - 16.0).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case((1 << 30) + 1, 0, (1 << 30) + 1)]
    #[case((1 << 30) - 1, 8, (1 << 30) + 1)]
    #[case(usize::MAX, 4, usize::MAX)]
    fn oversized_memory_is_rejected(
        #[case] ram_words: usize,
        #[case] image_bytes: usize,
        #[case] words: usize,
    ) {
        let config = SimConfig {
            memory: MemoryConfig { ram_words },
            ..SimConfig::default()
        };
        let error = Top::new(&config, &vec![0_u8; image_bytes]).expect_err("too large");
        assert_eq!(error, ConfigError::MemoryTooLarge { words });
        assert_eq!(error.class(), ErrorClass::Bus);
    }
}
