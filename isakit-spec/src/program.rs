//! # Programs and Images
//!
//! A [`Program`] is the flat list of primitive instructions produced by the
//! parser, laid out from `instruction_start`. A [`DataImage`] holds the
//! initial memory contents, and a [`ProgramImage`] is the serialised form of
//! both.

use crate::config::ByteOrder;
use crate::error::{IsaError, Result};
use crate::instruction::Instruction;
use crate::isa::InstructionSet;
use crate::memory::MemoryStore;
use crate::{Address, Word};
use serde::{Deserialize, Serialize};

/// Magic number for image files: "ISK1"
pub const IMAGE_MAGIC: u32 = 0x4953_4B31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    start: Address,
    instruction_bytes: u64,
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(start: Address, instruction_bytes: u64, instructions: Vec<Instruction>) -> Self {
        Self {
            start,
            instruction_bytes: instruction_bytes.max(1),
            instructions,
        }
    }

    /// Empty program laid out the way `isa` lays out code
    pub fn for_isa(isa: &InstructionSet) -> Self {
        let config = isa.config();
        Self::new(config.instruction_start, config.instruction_bytes(), Vec::new())
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        self.instructions.extend(instructions);
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn instruction_bytes(&self) -> u64 {
        self.instruction_bytes
    }

    /// Address just past the last instruction
    pub fn end(&self) -> Address {
        self.address_of(self.instructions.len())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn address_of(&self, index: usize) -> Address {
        self.start
            .wrapping_add(index as u64 * self.instruction_bytes)
    }

    /// Index of the instruction at `addr`, if `addr` is aligned and in range
    pub fn index_of(&self, addr: Address) -> Option<usize> {
        let offset = addr.checked_sub(self.start)?;
        if offset % self.instruction_bytes != 0 {
            return None;
        }
        let index = usize::try_from(offset / self.instruction_bytes).ok()?;
        (index < self.instructions.len()).then_some(index)
    }

    pub fn fetch(&self, addr: Address) -> Option<&Instruction> {
        self.index_of(addr).map(|i| &self.instructions[i])
    }

    /// Encoded words, in program order
    pub fn words(&self) -> Result<Vec<Word>> {
        self.instructions.iter().map(Instruction::encode).collect()
    }

    pub fn to_image(&self, instruction_width: u32, data: DataImage) -> Result<ProgramImage> {
        Ok(ProgramImage::new(self.start, instruction_width, self.words()?, data))
    }
}

/// Consecutive data words starting at one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSegment {
    pub start: Address,
    pub words: Vec<u64>,
}

/// Initial memory contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataImage {
    pub segments: Vec<DataSegment>,
}

impl DataImage {
    /// Width of one data word in memory
    pub const WORD_BYTES: u64 = 4;

    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new segment; following words are placed from `start`.
    pub fn begin(&mut self, start: Address) {
        self.segments.push(DataSegment {
            start,
            words: Vec::new(),
        });
    }

    /// Append a word to the current segment, starting one at 0 if needed.
    pub fn push(&mut self, word: u64) {
        if self.segments.is_empty() {
            self.begin(0);
        }
        if let Some(segment) = self.segments.last_mut() {
            segment.words.push(word);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.words.is_empty())
    }

    /// `(address, word)` entries in order
    pub fn entries(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.segments.iter().flat_map(|segment| {
            segment.words.iter().enumerate().map(move |(i, &word)| {
                (segment.start.wrapping_add(i as u64 * Self::WORD_BYTES), word)
            })
        })
    }

    /// Write every entry into `mem` in the given byte order.
    pub fn load_into(&self, mem: &mut MemoryStore, order: ByteOrder) -> Result<()> {
        for (addr, word) in self.entries() {
            mem.write(addr, Self::WORD_BYTES, order, word)?;
        }
        Ok(())
    }
}

/// Serialisable assembled program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    pub magic: u32,
    pub instruction_start: Address,
    pub instruction_width: u32,
    pub words: Vec<Word>,
    pub data: DataImage,
}

impl ProgramImage {
    pub fn new(instruction_start: Address, instruction_width: u32, words: Vec<Word>, data: DataImage) -> Self {
        Self {
            magic: IMAGE_MAGIC,
            instruction_start,
            instruction_width,
            words,
            data,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != IMAGE_MAGIC {
            return Err(IsaError::InvalidMagic {
                expected: IMAGE_MAGIC,
                found: self.magic,
            });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| IsaError::Image(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let image: Self = bincode::deserialize(bytes).map_err(|e| IsaError::Image(e.to_string()))?;
        image.validate()?;
        Ok(image)
    }
}
