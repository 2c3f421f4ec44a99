//! Instruction-text parser
//!
//! Accumulates the primitives of a program one line at a time.

use crate::error::Result;
use isakit_spec::{Address, Instruction, InstructionSet, Program};

pub struct InstructionParser<'a> {
    isa: &'a InstructionSet,
    instructions: Vec<Instruction>,
}

impl<'a> InstructionParser<'a> {
    pub fn new(isa: &'a InstructionSet) -> Self {
        Self {
            isa,
            instructions: Vec::new(),
        }
    }

    /// Parse `text` at `address`, append the primitives it flattens to,
    /// and return the address following them.
    pub fn add(&mut self, text: &str, address: Address) -> Result<Address> {
        let flattened = self.isa.parse(text, address)?;
        let count = flattened.len() as u64;
        tracing::trace!(text, address, count, "parsed");
        self.instructions.extend(flattened);
        Ok(address.wrapping_add(count * self.isa.config().instruction_bytes()))
    }

    pub fn clear(&mut self) {
        self.instructions.clear();
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn into_program(self) -> Program {
        let mut program = Program::for_isa(self.isa);
        program.extend(self.instructions);
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssemblerError;
    use isakit_spec::{isa3220, IsaError};

    #[test]
    fn test_add_returns_next_address() {
        let isa = isa3220().unwrap();
        let mut parser = InstructionParser::new(&isa);
        assert_eq!(parser.add("add R1, R2", 0x40000).unwrap(), 0x40002);
        assert_eq!(parser.add("mimm R3, 7", 0x40002).unwrap(), 0x4000A);
        assert_eq!(parser.len(), 5);
        assert_eq!(parser.instructions()[4].pc(), Some(0x40008));
    }

    #[test]
    fn test_clear() {
        let isa = isa3220().unwrap();
        let mut parser = InstructionParser::new(&isa);
        parser.add("add R1, R2", 0x40000).unwrap();
        parser.clear();
        assert!(parser.is_empty());
    }

    #[test]
    fn test_into_program() {
        let isa = isa3220().unwrap();
        let mut parser = InstructionParser::new(&isa);
        let next = parser.add("bnez 6", 0x40000).unwrap();
        parser.add("beqz -2", next).unwrap();
        let program = parser.into_program();
        assert_eq!(program.len(), 3);
        assert_eq!(program.words().unwrap(), vec![0x0EEA, 0x4004, 0x4FFE]);
    }

    #[test]
    fn test_unknown_text() {
        let isa = isa3220().unwrap();
        let mut parser = InstructionParser::new(&isa);
        assert!(matches!(
            parser.add("nonsense", 0x40000),
            Err(AssemblerError::Isa(IsaError::UnknownInstruction(_)))
        ));
        assert!(parser.is_empty());
    }
}
