//! Cycle-accurate simulation core for the NCO, sigma-delta DAC and soft-CPU bus gateware.

/// Construction-time error taxonomy.
pub mod error;
pub use error::{ConfigError, ErrorClass};

/// Fixed-width bit vectors with hardware truncation rules.
pub mod bits;
pub use bits::{check_width, mask, BitVector, MAX_WIDTH};

/// Quarter-wave sine table with sine and cosine read ports.
pub mod sincos;
pub use sincos::{QuarterWaveTable, SinCos, MAX_OUT_WIDTH, MIN_OUT_WIDTH};

/// Phase accumulator and oscillator.
pub mod nco;
pub use nco::{calculate_phase_step, Nco, NcoControl, PhaseAccumulator, PHASE_BITS};

/// First-order sigma-delta DAC.
pub mod sigma_delta;
pub use sigma_delta::SigmaDeltaDac;

/// PLL coefficient search and lock model.
pub mod pll;
pub use pll::{solve, PllClock, PllCoefficients, PllSolution, PrecisionWarning};

/// Clock domains and edge scheduling.
pub mod clock;
pub use clock::{ClockDomain, DomainId, DomainScheduler, DomainSet, Edge, Tick};

/// Clock-domain crossing primitives.
pub mod cdc;
pub use cdc::ResetSynchronizer;

/// Memory-mapped peripheral bus.
pub mod bus;
pub use bus::{
    AddressMap, BusAction, BusMediator, BusRequest, BusResponse, BusSignals, BusState,
    LocalMemory, Mapping, MediatorNext, Owner, RegisterFile, RegisterId, WritePolicy,
};

/// 8N1 serial transmitter.
pub mod uart;
pub use uart::UartTx;

/// Top-level design.
pub mod top;
pub use top::{Effect, EffectStatus, Top};

/// Bus master models.
pub mod master;
pub use master::{BusMaster, BusOp, Completion, ScriptedMaster};

/// Firmware drivers as bus operations.
pub mod drivers;
pub use drivers::{boot_sequence, LedDriver, NcoDriver, UartDriver};

/// Simulator configuration.
pub mod config;
pub use config::{MemoryConfig, NcoConfig, PllConfig, SimConfig, UartConfig};

/// Multi-domain simulator.
pub mod sim;
pub use sim::{Bitstreams, SimStats, Simulator};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
