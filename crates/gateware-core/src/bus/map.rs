//! Fixed peripheral address map and mapping validation.

use std::collections::BTreeMap;

use super::registers::{Owner, RegisterFile, RegisterId};
use super::LocalMemory;
use crate::ConfigError;

/// LED control (write-only, 1 bit).
pub const LED_ADDR: u32 = 0xCAFE_BAB0;
/// NCO control register (read/write).
pub const NCO_CTRL_ADDR: u32 = 0xF000_0000;
/// NCO phase step (read/write, 32 bits).
pub const NCO_PHASE_STEP_ADDR: u32 = 0xF000_0004;
/// UART transmit trigger (write-only, custom effect).
pub const UART_TX_ADDR: u32 = 0xF000_0008;

/// Enable bit of the NCO control register.
pub const NCO_CTRL_ENABLE: u32 = 1 << 0;
/// Enable bit of the LED register.
pub const LED_ENABLE: u32 = 1 << 0;

/// What a bus write to a mapping does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritePolicy<H> {
    /// Not writable.
    None,
    /// Loads the write data into the backing register and acknowledges.
    Direct,
    /// Hands the write data to effect handler `H`, which decides when to acknowledge.
    Custom(H),
}

impl<H> WritePolicy<H> {
    /// Whether bus writes reach this mapping at all.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// One memory-mapped register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping<H> {
    /// Exact bus address (no range).
    pub address: u32,
    /// Backing register, required for reads and direct writes.
    pub register: Option<RegisterId>,
    /// Whether reads return the backing register.
    pub readable: bool,
    /// Write behaviour.
    pub write: WritePolicy<H>,
}

impl<H> Mapping<H> {
    /// Readable and directly writable register.
    #[must_use]
    pub const fn read_write(address: u32, register: RegisterId) -> Self {
        Self {
            address,
            register: Some(register),
            readable: true,
            write: WritePolicy::Direct,
        }
    }

    /// Directly writable register that reads as nothing.
    #[must_use]
    pub const fn write_only(address: u32, register: RegisterId) -> Self {
        Self {
            address,
            register: Some(register),
            readable: false,
            write: WritePolicy::Direct,
        }
    }

    /// Read-only view of a register.
    #[must_use]
    pub const fn read_only(address: u32, register: RegisterId) -> Self {
        Self {
            address,
            register: Some(register),
            readable: true,
            write: WritePolicy::None,
        }
    }

    /// Write-only trigger handled by `handler`.
    #[must_use]
    pub const fn custom(address: u32, handler: H) -> Self {
        Self {
            address,
            register: None,
            readable: false,
            write: WritePolicy::Custom(handler),
        }
    }
}

/// Validated set of mappings keyed by address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap<H> {
    mappings: BTreeMap<u32, Mapping<H>>,
}

impl<H> AddressMap<H> {
    /// Validates `mappings` against the register file and local memory.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InertMapping`] for a mapping neither readable nor writable.
    /// - [`ConfigError::MissingBackingRegister`] when a read or direct write has
    ///   no register, or names one the file does not hold.
    /// - [`ConfigError::ConflictingDrivers`] for a direct write into an
    ///   internally driven register.
    /// - [`ConfigError::MappingOverlapsMemory`] when the address decodes to
    ///   local memory.
    /// - [`ConfigError::DuplicateMapping`] when two mappings share an address.
    pub fn new(
        mappings: impl IntoIterator<Item = Mapping<H>>,
        registers: &RegisterFile,
        memory: &LocalMemory,
    ) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for mapping in mappings {
            let address = mapping.address;
            if !mapping.readable && !mapping.write.is_writable() {
                return Err(ConfigError::InertMapping { address });
            }
            let needs_register = mapping.readable || matches!(mapping.write, WritePolicy::Direct);
            if needs_register {
                let register = mapping
                    .register
                    .filter(|id| registers.contains(*id))
                    .ok_or(ConfigError::MissingBackingRegister { address })?;
                if matches!(mapping.write, WritePolicy::Direct)
                    && registers.owner(register) == Some(Owner::Internal)
                {
                    return Err(ConfigError::ConflictingDrivers {
                        register: registers.name(register).unwrap_or_default().to_string(),
                    });
                }
            }
            if memory.contains(address) {
                return Err(ConfigError::MappingOverlapsMemory { address });
            }
            if map.insert(address, mapping).is_some() {
                return Err(ConfigError::DuplicateMapping { address });
            }
        }
        Ok(Self { mappings: map })
    }

    /// Mapping at exactly `address`.
    #[must_use]
    pub fn lookup(&self, address: u32) -> Option<&Mapping<H>> {
        self.mappings.get(&address)
    }

    /// Mappings in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &Mapping<H>> + '_ {
        self.mappings.values()
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
