//! Memory-mapped peripheral bus: register file, local memory, address map and mediator.

/// Validated address map and the fixed peripheral addresses.
pub mod map;
pub use map::{
    AddressMap, Mapping, WritePolicy, LED_ADDR, LED_ENABLE, NCO_CTRL_ADDR, NCO_CTRL_ENABLE,
    NCO_PHASE_STEP_ADDR, UART_TX_ADDR,
};

/// Local RAM and firmware image.
pub mod memory;
pub use memory::{
    merge_bytes, LocalMemory, DEFAULT_RAM_WORDS, PROGADDR_IRQ, PROGADDR_RESET, WORD_BYTES,
};

/// Register storage with single-writer ownership.
pub mod registers;
pub use registers::{Owner, RegisterFile, RegisterId};

/// Decode and `ready` sequencing.
pub mod mediator;
pub use mediator::{
    BusAction, BusMediator, BusRequest, BusResponse, BusSignals, BusState, MediatorNext,
};
