//! # Register File
//!
//! Fixed-size array of `data_width`-bit registers. Every stored value is
//! already width-restricted, so reads never renormalize.

use crate::bits::restrict_to_width;
use crate::config::{InstructionSetConfig, RegisterClass};
use crate::error::{IsaError, Result};
use crate::Value;

/// What happened to a register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Write to a ground register; nothing changed
    Discarded,
    /// Write to a reserved register
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    values: Vec<Value>,
    classes: Vec<RegisterClass>,
    width: u32,
}

impl RegisterFile {
    /// Allocate `register_count` zeroed registers with the declared classes.
    pub fn new(config: &InstructionSetConfig) -> Self {
        let count = config.register_count();
        let classes = (0..count).map(|i| config.register_class(i)).collect();
        Self {
            values: vec![0; count],
            classes,
            width: config.data_width,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn slot(&self, index: Value) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.values.len())
            .ok_or(IsaError::RegisterOutOfRange {
                index,
                count: self.values.len(),
            })
    }

    pub fn class(&self, index: Value) -> Result<RegisterClass> {
        Ok(self.classes[self.slot(index)?])
    }

    /// Read register (ground registers always return 0)
    #[inline]
    pub fn read(&self, index: Value) -> Result<Value> {
        let slot = self.slot(index)?;
        Ok(match self.classes[slot] {
            RegisterClass::Ground => 0,
            _ => self.values[slot],
        })
    }

    /// Write register, restricting `value` to the data width.
    pub fn write(&mut self, index: Value, value: Value) -> Result<WriteOutcome> {
        let slot = self.slot(index)?;
        match self.classes[slot] {
            RegisterClass::Ground => {
                tracing::trace!(register = slot, value, "write to ground register dropped");
                Ok(WriteOutcome::Discarded)
            }
            RegisterClass::Reserved => {
                self.values[slot] = restrict_to_width(value, self.width);
                tracing::debug!(register = slot, value = self.values[slot], "reserved register written");
                Ok(WriteOutcome::Reserved)
            }
            RegisterClass::Normal => {
                self.values[slot] = restrict_to_width(value, self.width);
                Ok(WriteOutcome::Written)
            }
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn snapshot(&self) -> Vec<Value> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegisterDecl;

    fn config() -> InstructionSetConfig {
        let mut config = InstructionSetConfig::default();
        config.field_widths.insert("reg".into(), 4);
        config.registers = vec![
            RegisterDecl {
                index: 0,
                alias: "zero".into(),
                class: RegisterClass::Ground,
            },
            RegisterDecl {
                index: 14,
                alias: "jump".into(),
                class: RegisterClass::Reserved,
            },
        ];
        config
    }

    #[test]
    fn test_ground_register() {
        let mut regs = RegisterFile::new(&config());
        assert_eq!(regs.len(), 16);
        assert_eq!(regs.write(0, 42).unwrap(), WriteOutcome::Discarded);
        assert_eq!(regs.read(0).unwrap(), 0);
    }

    #[test]
    fn test_reserved_register() {
        let mut regs = RegisterFile::new(&config());
        assert_eq!(regs.write(14, 7).unwrap(), WriteOutcome::Reserved);
        assert_eq!(regs.read(14).unwrap(), 7);
        assert_eq!(regs.class(14).unwrap(), RegisterClass::Reserved);
    }

    #[test]
    fn test_width_restriction() {
        let mut regs = RegisterFile::new(&config());
        assert_eq!(regs.write(1, 0xFFFF_FFFF).unwrap(), WriteOutcome::Written);
        assert_eq!(regs.read(1).unwrap(), -1);
        regs.write(2, 0x1_2345_6789).unwrap();
        assert_eq!(regs.read(2).unwrap(), 0x2345_6789);
    }

    #[test]
    fn test_out_of_range() {
        let mut regs = RegisterFile::new(&config());
        assert!(matches!(
            regs.read(16),
            Err(IsaError::RegisterOutOfRange { index: 16, count: 16 })
        ));
        assert!(regs.write(-1, 0).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normal_write_reads_back_canonical(index in 1i64..14, value in any::<i64>()) {
                let mut regs = RegisterFile::new(&config());
                regs.write(index, value).unwrap();
                prop_assert_eq!(regs.read(index).unwrap(), restrict_to_width(value, 32));
            }

            #[test]
            fn ground_always_reads_zero(value in any::<i64>()) {
                let mut regs = RegisterFile::new(&config());
                regs.write(0, value).unwrap();
                prop_assert_eq!(regs.read(0).unwrap(), 0);
            }
        }
    }
}
