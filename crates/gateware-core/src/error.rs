use thiserror::Error;

/// Error classes used for reporting and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// Signal-path sizing (widths, table sizes).
    Signal,
    /// Address map, register ownership or memory layout.
    Bus,
    /// PLL frequency request outside the supported ranges.
    Pll,
    /// Clock-domain or reset-synchronizer construction.
    Clock,
}

/// Configuration errors detected at construction time, before any clock is ticked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A signal width outside the supported `1..=64` range.
    #[error("signal width {width} is outside 1..=64")]
    InvalidWidth {
        /// Requested width in bits.
        width: u32,
    },
    /// Quarter-wave table sizes must be powers of two.
    #[error("sample count {samples} is not a power of two")]
    SampleCountNotPowerOfTwo {
        /// Requested sample count.
        samples: usize,
    },
    /// The phase address (`log2(samples) + 2` bits) does not fit the 32-bit accumulator.
    #[error("phase address of {bits} bits does not fit a 32-bit accumulator")]
    AddressTooWide {
        /// Required address width in bits.
        bits: u32,
    },
    /// Two mappings claim the same bus address.
    #[error("address {address:#010x} is claimed by more than one mapping")]
    DuplicateMapping {
        /// Conflicting bus address.
        address: u32,
    },
    /// A mapping that is neither readable nor writable.
    #[error("mapping at {address:#010x} is neither readable nor writable")]
    InertMapping {
        /// Mapping address.
        address: u32,
    },
    /// A mapping address falls inside the local memory range.
    #[error("mapping at {address:#010x} overlaps local memory")]
    MappingOverlapsMemory {
        /// Mapping address.
        address: u32,
    },
    /// A readable or directly writable mapping with no backing register.
    #[error("mapping at {address:#010x} has no backing register")]
    MissingBackingRegister {
        /// Mapping address.
        address: u32,
    },
    /// A bus write targets a register driven internally.
    #[error("register `{register}` is internally driven and cannot be bus-writable")]
    ConflictingDrivers {
        /// Register name.
        register: String,
    },
    /// Local memory does not fit below the first mapped address.
    #[error("local memory of {words} words exceeds the 32-bit address space")]
    MemoryTooLarge {
        /// Requested memory size in words.
        words: usize,
    },
    /// PLL reference outside `10..=160` MHz.
    #[error("PLL input frequency {f_in_mhz} MHz is outside 10..=160 MHz")]
    PllInputOutOfRange {
        /// Requested input frequency.
        f_in_mhz: f64,
    },
    /// PLL request outside `16..=275` MHz.
    #[error("PLL output frequency {f_req_mhz} MHz is outside 16..=275 MHz")]
    PllOutputOutOfRange {
        /// Requested output frequency.
        f_req_mhz: f64,
    },
    /// No divider combination satisfies the phase-detector and VCO constraints.
    #[error("no PLL coefficients reach {f_req_mhz} MHz from {f_in_mhz} MHz")]
    PllUnreachable {
        /// Input frequency.
        f_in_mhz: f64,
        /// Requested output frequency.
        f_req_mhz: f64,
    },
    /// A clock frequency that yields no usable period.
    #[error("clock frequency {hz} Hz is not usable")]
    InvalidClockFrequency {
        /// Requested frequency.
        hz: f64,
    },
    /// UART baud rate that yields a zero bit divisor.
    #[error("baud rate {baud_rate} is not reachable from a {clock_hz} Hz clock")]
    InvalidBaudRate {
        /// Requested baud rate.
        baud_rate: u32,
        /// Clock the transmitter runs from.
        clock_hz: f64,
    },
    /// More clock domains than one scheduler can interleave.
    #[error("{count} clock domains exceed the scheduler limit")]
    TooManyDomains {
        /// Domains requested.
        count: usize,
    },
    /// Reset synchronizers need at least two stages.
    #[error("reset synchronizer needs 2..=8 stages, got {stages}")]
    InvalidSynchronizerStages {
        /// Requested stage count.
        stages: u8,
    },
}

impl ConfigError {
    /// Returns the class this error is reported under.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidWidth { .. }
            | Self::SampleCountNotPowerOfTwo { .. }
            | Self::AddressTooWide { .. } => ErrorClass::Signal,
            Self::DuplicateMapping { .. }
            | Self::InertMapping { .. }
            | Self::MappingOverlapsMemory { .. }
            | Self::MissingBackingRegister { .. }
            | Self::ConflictingDrivers { .. }
            | Self::MemoryTooLarge { .. }
            | Self::InvalidBaudRate { .. } => ErrorClass::Bus,
            Self::PllInputOutOfRange { .. }
            | Self::PllOutputOutOfRange { .. }
            | Self::PllUnreachable { .. } => ErrorClass::Pll,
            Self::InvalidClockFrequency { .. }
            | Self::TooManyDomains { .. }
            | Self::InvalidSynchronizerStages { .. } => ErrorClass::Clock,
        }
    }
}
