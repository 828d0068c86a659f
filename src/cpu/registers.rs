//! The UM register file: eight general-purpose 32-bit registers.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    values: [u32; NUM_REGISTERS],
}

impl Registers {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self { values: [0; NUM_REGISTERS] }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.values = [0; NUM_REGISTERS];
    }

    /// Check that `index` names a register.
    #[inline]
    pub fn validate(index: u8) -> Result<usize, RegisterError> {
        let index = index as usize;
        if index < NUM_REGISTERS {
            Ok(index)
        } else {
            Err(RegisterError::InvalidRegister(index))
        }
    }

    /// Read register `index`.
    #[inline]
    pub fn get(&self, index: u8) -> Result<u32, RegisterError> {
        Ok(self.values[Self::validate(index)?])
    }

    /// Write register `index`.
    #[inline]
    pub fn set(&mut self, index: u8, value: u32) -> Result<(), RegisterError> {
        self.values[Self::validate(index)?] = value;
        Ok(())
    }

    /// All register values, r0 first.
    pub fn values(&self) -> [u32; NUM_REGISTERS] {
        self.values
    }
}

/// Errors raised by register access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid register index {0} (valid: 0-7)")]
    InvalidRegister(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_start_zeroed() {
        let regs = Registers::new();
        assert_eq!(regs.values(), [0; NUM_REGISTERS]);
    }

    #[test]
    fn test_get_set() {
        let mut regs = Registers::new();
        regs.set(7, 0xFFFF_FFFF).unwrap();
        regs.set(0, 1).unwrap();

        assert_eq!(regs.get(7).unwrap(), 0xFFFF_FFFF);
        assert_eq!(regs.get(0).unwrap(), 1);
        assert_eq!(regs.get(3).unwrap(), 0);
    }

    #[test]
    fn test_invalid_index() {
        let mut regs = Registers::new();
        assert_eq!(regs.get(8), Err(RegisterError::InvalidRegister(8)));
        assert_eq!(regs.set(200, 1), Err(RegisterError::InvalidRegister(200)));
        assert_eq!(regs.values(), [0; NUM_REGISTERS]);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers::new();
        regs.set(4, 42).unwrap();
        regs.reset();
        assert_eq!(regs.get(4).unwrap(), 0);
    }
}
