//! Wait-stated bus mediator between a single master and local memory/registers.
//!
//! The mediator is a pure interpreter: [`BusMediator::evaluate`] reads the
//! master's signals and a borrowed snapshot of memory and registers, and
//! returns the next mediator state plus at most one [`BusAction`] for the
//! owner of that storage to apply. Nothing is mutated until
//! [`BusMediator::commit`].

use tracing::trace;

use super::map::{AddressMap, WritePolicy};
use super::{LocalMemory, RegisterFile, RegisterId};

/// One transaction as driven by the master.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusRequest {
    /// Byte address.
    pub address: u32,
    /// Byte-enable mask (low four bits); zero means read.
    pub write_strobe: u8,
    /// Write data.
    pub data: u32,
}

impl BusRequest {
    /// Read of the word at `address`.
    #[must_use]
    pub const fn read(address: u32) -> Self {
        Self {
            address,
            write_strobe: 0,
            data: 0,
        }
    }

    /// Full-word write of `data` to `address`.
    #[must_use]
    pub const fn write(address: u32, data: u32) -> Self {
        Self {
            address,
            write_strobe: 0b1111,
            data,
        }
    }

    /// Whether any byte lane is enabled.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.write_strobe & 0b1111 != 0
    }
}

/// Master-driven bus signals at one edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BusSignals {
    /// Transaction valid.
    pub valid: bool,
    /// Transaction fields; ignored while `valid` is low.
    pub request: BusRequest,
}

impl BusSignals {
    /// No transaction in flight.
    pub const IDLE: Self = Self {
        valid: false,
        request: BusRequest {
            address: 0,
            write_strobe: 0,
            data: 0,
        },
    };

    /// `request` held valid.
    #[must_use]
    pub const fn active(request: BusRequest) -> Self {
        Self {
            valid: true,
            request,
        }
    }
}

/// Mediator-driven bus signals, registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusResponse {
    /// High for exactly one tick per completed transaction.
    pub ready: bool,
    /// Read data, meaningful while `ready` is high.
    pub read_data: u32,
}

/// Mediator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusState {
    /// No transaction in flight.
    #[default]
    Idle,
    /// A transaction is valid and not yet acknowledged.
    Decoding,
    /// `ready` is asserted for the current tick.
    Ready,
}

/// Storage update requested by one decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusAction<H> {
    /// Byte-enable write into local memory.
    MemoryWrite {
        /// Word index.
        word: usize,
        /// Write data.
        data: u32,
        /// Byte-enable mask.
        strobe: u8,
    },
    /// Direct load of a backing register.
    RegisterLoad {
        /// Target register.
        register: RegisterId,
        /// Write data, truncated to the register width on load.
        value: u32,
    },
    /// Write handed to a custom effect handler.
    Custom {
        /// Handler named by the mapping.
        handler: H,
        /// Write data.
        data: u32,
    },
}

/// Next-state values computed by [`BusMediator::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediatorNext<H> {
    /// Next state.
    pub state: BusState,
    /// Next registered response.
    pub response: BusResponse,
    /// Storage update for this edge.
    pub action: Option<BusAction<H>>,
}

impl<H> MediatorNext<H> {
    /// Registers `ready` on behalf of a custom effect that completed this edge.
    pub const fn acknowledge(&mut self) {
        self.state = BusState::Ready;
        self.response.ready = true;
    }

    const fn idle() -> Self {
        Self {
            state: BusState::Idle,
            response: BusResponse {
                ready: false,
                read_data: 0,
            },
            action: None,
        }
    }

    const fn ready(read_data: u32, action: Option<BusAction<H>>) -> Self {
        Self {
            state: BusState::Ready,
            response: BusResponse {
                ready: true,
                read_data,
            },
            action,
        }
    }

    const fn waiting(action: Option<BusAction<H>>) -> Self {
        Self {
            state: BusState::Decoding,
            response: BusResponse {
                ready: false,
                read_data: 0,
            },
            action,
        }
    }
}

/// Address decoder and `ready` sequencer.
///
/// An address matching neither memory nor a mapping (or a mapping that does
/// not serve that direction) is never acknowledged; the master stalls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMediator<H> {
    map: AddressMap<H>,
    state: BusState,
    response: BusResponse,
}

impl<H: Clone> BusMediator<H> {
    /// Mediator in reset over a validated address map.
    #[must_use]
    pub const fn new(map: AddressMap<H>) -> Self {
        Self {
            map,
            state: BusState::Idle,
            response: BusResponse {
                ready: false,
                read_data: 0,
            },
        }
    }

    /// Address map served by this mediator.
    #[must_use]
    pub const fn map(&self) -> &AddressMap<H> {
        &self.map
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BusState {
        self.state
    }

    /// Registered response visible to the master.
    #[must_use]
    pub const fn response(&self) -> BusResponse {
        self.response
    }

    /// Computes the next state from the current one and the master's signals.
    ///
    /// `ready` always falls the edge after it rises, and no decode happens on
    /// that edge.
    #[must_use]
    pub fn evaluate(
        &self,
        signals: BusSignals,
        memory: &LocalMemory,
        registers: &RegisterFile,
    ) -> MediatorNext<H> {
        if !signals.valid || self.response.ready {
            return MediatorNext::idle();
        }
        let request = signals.request;
        trace!(
            address = format_args!("{:#010x}", request.address),
            strobe = request.write_strobe,
            data = format_args!("{:#010x}", request.data),
            "decode"
        );

        if let Some(word) = memory.word_index(request.address) {
            return if request.is_write() {
                MediatorNext::ready(
                    0,
                    Some(BusAction::MemoryWrite {
                        word,
                        data: request.data,
                        strobe: request.write_strobe,
                    }),
                )
            } else {
                MediatorNext::ready(memory.word(word), None)
            };
        }

        let Some(mapping) = self.map.lookup(request.address) else {
            return MediatorNext::waiting(None);
        };
        match (&mapping.write, mapping.register, request.is_write()) {
            (WritePolicy::Direct, Some(register), true) => MediatorNext::ready(
                0,
                Some(BusAction::RegisterLoad {
                    register,
                    value: request.data,
                }),
            ),
            (WritePolicy::Custom(handler), _, true) => {
                MediatorNext::waiting(Some(BusAction::Custom {
                    handler: handler.clone(),
                    data: request.data,
                }))
            }
            (_, Some(register), false) if mapping.readable => {
                MediatorNext::ready(registers.read(register), None)
            }
            _ => MediatorNext::waiting(None),
        }
    }

    /// Latches state and response from [`Self::evaluate`].
    ///
    /// The caller applies `next.action` to the storage it owns.
    pub const fn commit(&mut self, next: &MediatorNext<H>) {
        self.state = next.state;
        self.response = next.response;
    }

    /// Forces `Idle` and clears any pending `ready`.
    pub const fn reset(&mut self) {
        self.state = BusState::Idle;
        self.response = BusResponse {
            ready: false,
            read_data: 0,
        };
    }
}
