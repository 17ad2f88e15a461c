//! Top-level design: CPU bus, peripheral registers, NCO and the two DACs.
//!
//! The design has two halves that may sit in different clock domains:
//!
//! - the bus half (mediator, memory, registers, UART), clocked by the reference domain;
//! - the signal half (NCO, sine DAC, cosine DAC), clocked by the signal domain.
//!
//! Each half is evaluated against the current state of the whole design and
//! committed afterwards, so halves ticking on the same edge see one snapshot.

use tracing::{debug, trace};

use crate::bus::{
    AddressMap, BusAction, BusMediator, BusResponse, BusSignals, LocalMemory, Mapping,
    MediatorNext, Owner, RegisterFile, RegisterId, LED_ADDR, LED_ENABLE, NCO_CTRL_ADDR,
    NCO_CTRL_ENABLE, NCO_PHASE_STEP_ADDR, UART_TX_ADDR,
};
use crate::uart::{UartNext, UartTx};
use crate::{BitVector, ConfigError, Nco, NcoControl, SigmaDeltaDac, SimConfig};

/// Custom write effects of the top-level address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Latch the low data byte into the UART and start a frame.
    UartTransmit,
}

/// Whether a custom effect completed on this edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectStatus {
    /// The effect ran; `ready` is registered.
    Acknowledged,
    /// The effect is waiting; the master keeps `valid` high.
    Pending,
}

/// Bus-half next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusNext {
    mediator: MediatorNext<Effect>,
    uart: UartNext,
}

impl BusNext {
    /// Registered response the master will see after commit.
    #[must_use]
    pub const fn response(&self) -> BusResponse {
        self.mediator.response
    }
}

/// Signal-half next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalNext {
    phase: u32,
    sine: BitVector,
    cosine: BitVector,
}

/// Registers declared by the top-level design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopRegisters {
    /// LED control.
    pub led: RegisterId,
    /// NCO control (enable bit).
    pub nco_ctrl: RegisterId,
    /// NCO phase step.
    pub phase_step: RegisterId,
}

/// The complete design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Top {
    registers: RegisterFile,
    ids: TopRegisters,
    memory: LocalMemory,
    mediator: BusMediator<Effect>,
    uart: UartTx,
    nco: Nco,
    sine_dac: SigmaDeltaDac,
    cosine_dac: SigmaDeltaDac,
}

impl Top {
    /// Builds the design from `config` with `firmware` placed after RAM.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found while sizing the NCO, DACs,
    /// memory or UART, or while validating the address map.
    pub fn new(config: &SimConfig, firmware: &[u8]) -> Result<Self, ConfigError> {
        let mut registers = RegisterFile::new();
        let ids = TopRegisters {
            led: registers.add("led", 1, Owner::Bus)?,
            nco_ctrl: registers.add("nco_ctrl", 1, Owner::Bus)?,
            phase_step: registers.add("phase_step", 32, Owner::Bus)?,
        };
        let memory = LocalMemory::with_image(config.memory.ram_words, firmware)?;
        let map = AddressMap::new(
            [
                Mapping::write_only(LED_ADDR, ids.led),
                Mapping::read_write(NCO_CTRL_ADDR, ids.nco_ctrl),
                Mapping::read_write(NCO_PHASE_STEP_ADDR, ids.phase_step),
                Mapping::custom(UART_TX_ADDR, Effect::UartTransmit),
            ],
            &registers,
            &memory,
        )?;
        let nco = Nco::new(config.nco.width, config.nco.samples, config.nco.honor_enable)?;

        Ok(Self {
            registers,
            ids,
            memory,
            mediator: BusMediator::new(map),
            uart: UartTx::new(config.clock_hz, config.uart.baud_rate)?,
            sine_dac: SigmaDeltaDac::new(nco.width())?,
            cosine_dac: SigmaDeltaDac::new(nco.width())?,
            nco,
        })
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Ids of the design's registers.
    #[must_use]
    pub const fn register_ids(&self) -> TopRegisters {
        self.ids
    }

    /// Local memory.
    #[must_use]
    pub const fn memory(&self) -> &LocalMemory {
        &self.memory
    }

    /// Bus mediator.
    #[must_use]
    pub const fn mediator(&self) -> &BusMediator<Effect> {
        &self.mediator
    }

    /// Oscillator.
    #[must_use]
    pub const fn nco(&self) -> &Nco {
        &self.nco
    }

    /// Serial transmitter.
    #[must_use]
    pub const fn uart(&self) -> &UartTx {
        &self.uart
    }

    /// Registered bus response.
    #[must_use]
    pub const fn response(&self) -> BusResponse {
        self.mediator.response()
    }

    /// LED output.
    #[must_use]
    pub fn led(&self) -> bool {
        self.registers.read(self.ids.led) & LED_ENABLE != 0
    }

    /// Sine DAC output bit.
    #[must_use]
    pub const fn sine_out(&self) -> bool {
        self.sine_dac.output()
    }

    /// Cosine DAC output bit.
    #[must_use]
    pub const fn cosine_out(&self) -> bool {
        self.cosine_dac.output()
    }

    /// UART serial line.
    #[must_use]
    pub const fn uart_line(&self) -> bool {
        self.uart.line()
    }

    /// NCO controls as currently held in the register file.
    #[must_use]
    pub fn nco_control(&self) -> NcoControl {
        NcoControl {
            step: self.registers.read(self.ids.phase_step),
            enable: self.registers.read(self.ids.nco_ctrl) & NCO_CTRL_ENABLE != 0,
        }
    }

    /// Runs a custom effect against the current state.
    ///
    /// Returns the effect's status and the byte to start on the UART, if any.
    fn dispatch(&self, effect: Effect, data: u32) -> (EffectStatus, Option<u8>) {
        match effect {
            Effect::UartTransmit => {
                if self.uart.is_idle() {
                    let byte = data.to_le_bytes()[0];
                    debug!(byte, "uart transmit");
                    (EffectStatus::Acknowledged, Some(byte))
                } else {
                    trace!("uart busy, holding bus");
                    (EffectStatus::Pending, None)
                }
            }
        }
    }

    /// Next state of the bus half for the master's `signals`.
    #[must_use]
    pub fn evaluate_bus(&self, signals: BusSignals) -> BusNext {
        let mut mediator = self
            .mediator
            .evaluate(signals, &self.memory, &self.registers);
        let mut uart_start = None;
        if let Some(BusAction::Custom { handler, data }) = mediator.action {
            let (status, start) = self.dispatch(handler, data);
            if status == EffectStatus::Acknowledged {
                mediator.acknowledge();
            }
            uart_start = start;
            mediator.action = None;
        }
        BusNext {
            mediator,
            uart: self.uart.evaluate(uart_start),
        }
    }

    /// Latches the bus half.
    pub fn commit_bus(&mut self, next: &BusNext) {
        match next.mediator.action {
            Some(BusAction::MemoryWrite { word, data, strobe }) => {
                self.memory.write_word(word, data, strobe);
            }
            Some(BusAction::RegisterLoad { register, value }) => {
                self.registers.load(register, value);
            }
            Some(BusAction::Custom { .. }) | None => {}
        }
        self.mediator.commit(&next.mediator);
        self.uart.commit(next.uart);
    }

    /// Next state of the signal half: the DACs take the current NCO outputs.
    #[must_use]
    pub fn evaluate_signal(&self) -> SignalNext {
        let samples = self.nco.outputs();
        SignalNext {
            phase: self.nco.evaluate(self.nco_control()),
            sine: self.sine_dac.evaluate(samples.sin),
            cosine: self.cosine_dac.evaluate(samples.cos),
        }
    }

    /// Latches the signal half.
    pub const fn commit_signal(&mut self, next: &SignalNext) {
        self.nco.commit(next.phase);
        self.sine_dac.commit(next.sine);
        self.cosine_dac.commit(next.cosine);
    }

    /// Holds the signal half at its reset values.
    pub const fn reset_signal(&mut self) {
        self.nco.reset();
        self.sine_dac.reset();
        self.cosine_dac.reset();
    }

    /// Resets the bus half; memory and register contents are kept.
    pub const fn reset_bus(&mut self) {
        self.mediator.reset();
        self.uart.reset();
    }

    /// One edge with both halves in the same domain.
    pub fn tick(&mut self, signals: BusSignals) -> BusResponse {
        let bus = self.evaluate_bus(signals);
        let signal = self.evaluate_signal();
        self.commit_bus(&bus);
        self.commit_signal(&signal);
        self.response()
    }
}
