//! Bus-visible registers with a single declared writer each.

use tracing::debug;

use crate::{bits::check_width, BitVector, ConfigError};

/// Which side drives a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Owner {
    /// Loaded by bus writes only.
    Bus,
    /// Driven by design logic; bus writes are refused at map construction.
    Internal,
}

/// Handle to a register in a [`RegisterFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegisterId(usize);

impl RegisterId {
    /// Index in declaration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Register {
    name: String,
    owner: Owner,
    value: BitVector,
}

/// Backing storage for memory-mapped registers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    registers: Vec<Register>,
}

impl RegisterFile {
    /// Creates an empty register file.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            registers: Vec::new(),
        }
    }

    /// Declares a zero-initialized register.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWidth`] for widths outside `1..=32`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        width: u32,
        owner: Owner,
    ) -> Result<RegisterId, ConfigError> {
        let width = check_width(width)?;
        if width > u32::BITS {
            return Err(ConfigError::InvalidWidth { width });
        }
        let id = RegisterId(self.registers.len());
        self.registers.push(Register {
            name: name.into(),
            owner,
            value: BitVector::new(width, 0),
        });
        Ok(id)
    }

    /// Whether `id` was issued by this file.
    #[must_use]
    pub const fn contains(&self, id: RegisterId) -> bool {
        id.0 < self.registers.len()
    }

    /// Number of declared registers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.registers.len()
    }

    /// Whether no register is declared.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Register name, if declared.
    #[must_use]
    pub fn name(&self, id: RegisterId) -> Option<&str> {
        self.registers.get(id.0).map(|register| register.name.as_str())
    }

    /// Register owner, if declared.
    #[must_use]
    pub fn owner(&self, id: RegisterId) -> Option<Owner> {
        self.registers.get(id.0).map(|register| register.owner)
    }

    /// Current value with its declared width.
    #[must_use]
    pub fn value(&self, id: RegisterId) -> Option<BitVector> {
        self.registers.get(id.0).map(|register| register.value)
    }

    /// Current value zero-extended to a bus word; undeclared ids read as zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn read(&self, id: RegisterId) -> u32 {
        self.value(id).map_or(0, |value| value.as_u64() as u32)
    }

    /// Loads `data` truncated to the register width.
    pub fn load(&mut self, id: RegisterId, data: u32) {
        if let Some(register) = self.registers.get_mut(id.0) {
            register.value = BitVector::new(register.value.width(), u64::from(data));
            debug!(
                register = %register.name,
                value = %register.value,
                "register load"
            );
        }
    }

    /// Drives an internally owned register from design logic.
    ///
    /// Bus-owned registers are left untouched; their only writer is the bus.
    #[cfg(test)]
    pub(crate) fn drive(&mut self, id: RegisterId, value: u64) {
        if let Some(register) = self.registers.get_mut(id.0) {
            if register.owner == Owner::Internal {
                register.value = BitVector::new(register.value.width(), value);
            }
        }
    }

    /// Iterates `(id, name, owner)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (RegisterId, &str, Owner)> + '_ {
        self.registers
            .iter()
            .enumerate()
            .map(|(index, register)| (RegisterId(index), register.name.as_str(), register.owner))
    }
}
