//! Instruction-level simulator

use crate::error::{Result, RuntimeError};
use crate::state::{HaltReason, Status, VMState};
use crate::trace::StepRecord;
use isakit_disassembler::decode_program;
use isakit_spec::{
    Address, DataImage, InstructionSet, InstructionSetConfig, MemoryStore, Program, ProgramImage,
    RegisterFile, Value, Word,
};
use std::sync::Arc;

/// VM configuration
#[derive(Debug, Clone)]
pub struct VMConfig {
    /// Halt after this many steps; `None` runs until the program ends
    pub max_steps: Option<u64>,

    /// Keep every step record in the execution result
    pub trace: bool,
}

impl Default for VMConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(1_000_000),
            trace: false,
        }
    }
}

/// Execution result
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Number of instructions executed
    pub steps: u64,

    pub halt_reason: HaltReason,

    pub final_pc: Address,

    /// Register values when the simulation halted
    pub registers: Vec<Value>,

    /// Step records (if tracing enabled)
    pub trace: Vec<StepRecord>,
}

/// Simulator for a program of primitive instructions
pub struct VM {
    isa_config: Arc<InstructionSetConfig>,
    program: Program,
    state: VMState,
    config: VMConfig,
    trace: Vec<StepRecord>,
}

impl VM {
    /// Create a VM with `pc` at the program's first instruction.
    pub fn new(isa: &InstructionSet, program: Program, config: VMConfig) -> Self {
        let isa_config = isa.shared_config();
        let mut state = VMState::new(&isa_config);
        state.pc = program.start();

        Self {
            isa_config,
            program,
            state,
            config,
            trace: Vec::new(),
        }
    }

    /// Decode `words` laid out from `start` and create a VM for them.
    pub fn from_words(
        isa: &InstructionSet,
        words: &[Word],
        start: Address,
        config: VMConfig,
    ) -> Result<Self> {
        let program = decode_program(isa, words, start)?;
        Ok(Self::new(isa, program, config))
    }

    /// Create a VM from a serialised image, with its data already loaded.
    pub fn from_image(isa: &InstructionSet, image: &ProgramImage, config: VMConfig) -> Result<Self> {
        image.validate()?;
        let expected = isa.config().instruction_width;
        if image.instruction_width != expected {
            return Err(RuntimeError::WidthMismatch {
                image: image.instruction_width,
                expected,
            });
        }

        let mut vm = Self::from_words(isa, &image.words, image.instruction_start, config)?;
        vm.load_data(&image.data)?;
        Ok(vm)
    }

    /// Write a data image into memory in the instruction set's byte order.
    pub fn load_data(&mut self, data: &DataImage) -> Result<()> {
        data.load_into(&mut self.state.mem, self.isa_config.byte_order)?;
        Ok(())
    }

    /// Execute the instruction at `pc`.
    ///
    /// The record's `halted` flag is set when the VM stops after this step:
    /// the word was the terminating pattern, the next `pc` is outside the
    /// program, or the step cap is reached. `None` means nothing could be
    /// executed at all and halts the VM the same way. Stepping a halted VM
    /// is an error.
    pub fn step(&mut self) -> Result<Option<StepRecord>> {
        if let Some(reason) = self.state.halt_reason() {
            return Err(RuntimeError::Halted { reason });
        }

        if let Some(limit) = self.config.max_steps {
            if self.state.steps >= limit {
                self.halt(HaltReason::StepLimit);
                return Ok(None);
            }
        }

        let pc = self.state.pc;
        let instr = match self.program.fetch(pc) {
            Some(instr) => instr,
            None => {
                self.halt(HaltReason::ProgramExhausted);
                return Ok(None);
            }
        };
        self.state.status = Status::Running;

        let word = instr.encode()?;
        let binary = instr.to_binary()?;
        let text = instr.render()?;

        let before = self.state.regs.snapshot();
        let execution = instr.execute(&self.isa_config, &mut self.state.regs, &mut self.state.mem)?;
        let after = self.state.regs.snapshot();
        let changes = StepRecord::diff(&before, &after);
        let terminating = instr.is_terminating(&self.isa_config);

        tracing::trace!(
            step = self.state.steps,
            pc,
            next_pc = execution.next_pc,
            instruction = %text,
            "step"
        );

        self.state.pc = execution.next_pc;
        self.state.steps += 1;

        let reason = if terminating {
            Some(HaltReason::TerminatingInstruction)
        } else if self.program.fetch(execution.next_pc).is_none() {
            Some(HaltReason::ProgramExhausted)
        } else {
            match self.config.max_steps {
                Some(limit) if self.state.steps >= limit => Some(HaltReason::StepLimit),
                _ => None,
            }
        };
        if let Some(reason) = reason {
            self.halt(reason);
        }
        let halted = reason.is_some();

        let record = StepRecord {
            pc,
            next_pc: execution.next_pc,
            text,
            word,
            binary,
            before,
            after,
            changes,
            halted,
        };
        if self.config.trace {
            self.trace.push(record.clone());
        }
        Ok(Some(record))
    }

    /// Run the VM until halt
    pub fn run(mut self) -> Result<ExecutionResult> {
        while !self.state.is_halted() {
            self.step()?;
        }

        Ok(ExecutionResult {
            steps: self.state.steps,
            halt_reason: self
                .state
                .halt_reason()
                .unwrap_or(HaltReason::ProgramExhausted),
            final_pc: self.state.pc,
            registers: self.state.regs.snapshot(),
            trace: self.trace,
        })
    }

    fn halt(&mut self, reason: HaltReason) {
        tracing::debug!(
            pc = self.state.pc,
            steps = self.state.steps,
            %reason,
            "simulation halted"
        );
        self.state.halt(reason);
    }

    /// Get current state (for debugging)
    pub fn state(&self) -> &VMState {
        &self.state
    }

    /// Mutable state, for presetting registers or memory before a run
    pub fn state_mut(&mut self) -> &mut VMState {
        &mut self.state
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.state.regs
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.state.mem
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &VMConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isakit_spec::isa3220;

    const START: Address = 0x40000;

    fn vm_for(words: &[Word], config: VMConfig) -> VM {
        let isa = isa3220().unwrap();
        VM::from_words(&isa, words, START, config).unwrap()
    }

    #[test]
    fn test_vm_config_default() {
        let config = VMConfig::default();
        assert_eq!(config.max_steps, Some(1_000_000));
        assert!(!config.trace);
    }

    #[test]
    fn test_terminating_word_halts_after_one_step() {
        let mut vm = vm_for(&[0x4FFE], VMConfig::default());
        assert_eq!(vm.state().status, Status::Ready);

        let record = vm.step().unwrap().unwrap();
        assert!(record.halted);
        assert!(record.changes.is_empty());
        assert_eq!(record.pc, START);
        assert_eq!(record.next_pc, START);
        assert_eq!(record.text, "beqz 4094");
        assert_eq!(record.binary, "0100111111111110");
        assert_eq!(
            vm.state().halt_reason(),
            Some(HaltReason::TerminatingInstruction)
        );

        assert!(matches!(
            vm.step(),
            Err(RuntimeError::Halted {
                reason: HaltReason::TerminatingInstruction
            })
        ));
    }

    #[test]
    fn test_falls_off_the_end() {
        // mib0 R1, 5 ; add R2, R1
        let result = vm_for(&[0xC105, 0x0210], VMConfig::default()).run().unwrap();
        assert_eq!(result.steps, 2);
        assert_eq!(result.halt_reason, HaltReason::ProgramExhausted);
        assert_eq!(result.final_pc, START + 4);
        assert_eq!(result.registers[1], 5);
        assert_eq!(result.registers[2], 5);
        assert!(result.trace.is_empty());
    }

    #[test]
    fn test_step_records_changes() {
        let mut vm = vm_for(&[0xC105], VMConfig::default());
        let record = vm.step().unwrap().unwrap();
        assert_eq!(record.text, "mib0 R1, 5");
        assert_eq!(record.word, 0xC105);
        assert_eq!(record.changes.len(), 1);
        assert_eq!(record.changes[0].register, 1);
        assert_eq!(record.changes[0].new, 5);
        assert!(record.halted);
        assert_eq!(vm.state().halt_reason(), Some(HaltReason::ProgramExhausted));
        assert!(matches!(
            vm.step(),
            Err(RuntimeError::Halted {
                reason: HaltReason::ProgramExhausted
            })
        ));
    }

    #[test]
    fn test_halted_only_on_last_step() {
        // mib0 R1, 5 ; add R2, R1
        let config = VMConfig {
            trace: true,
            ..VMConfig::default()
        };
        let result = vm_for(&[0xC105, 0x0210], config).run().unwrap();
        let flags: Vec<bool> = result.trace.iter().map(|r| r.halted).collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn test_running_between_steps() {
        let mut vm = vm_for(&[0xC105, 0x0210], VMConfig::default());
        assert!(!vm.step().unwrap().unwrap().halted);
        assert_eq!(vm.state().status, Status::Running);
    }

    #[test]
    fn test_empty_program_exhausted_without_step() {
        let mut vm = vm_for(&[], VMConfig::default());
        assert!(vm.step().unwrap().is_none());
        assert_eq!(vm.state().halt_reason(), Some(HaltReason::ProgramExhausted));
        assert_eq!(vm.state().steps, 0);
    }

    #[test]
    fn test_step_limit() {
        // Self-branch with the terminating pattern switched off loops forever
        let config = VMConfig {
            max_steps: Some(3),
            trace: true,
        };
        let isa = isa3220().unwrap();
        let mut isa_config = (*isa.shared_config()).clone();
        isa_config.terminating_instruction = None;
        let mut vm = vm_for(&[0x4FFE], config);
        vm.isa_config = Arc::new(isa_config);

        let result = vm.run().unwrap();
        assert_eq!(result.steps, 3);
        assert_eq!(result.halt_reason, HaltReason::StepLimit);
        assert_eq!(result.trace.len(), 3);
        assert!(result.trace.iter().all(|r| r.pc == START));
        assert!(result.trace[2].halted);
        assert!(!result.trace[1].halted);
    }

    #[test]
    fn test_misaligned_pc_exhausts() {
        let mut vm = vm_for(&[0x0120], VMConfig::default());
        vm.state_mut().pc = START + 1;
        assert!(vm.step().unwrap().is_none());
        assert_eq!(vm.state().halt_reason(), Some(HaltReason::ProgramExhausted));
    }

    #[test]
    fn test_load_data_little_endian() {
        let mut data = DataImage::new();
        data.begin(0x100);
        data.push(0x1122_3344);

        let mut vm = vm_for(&[0x4FFE], VMConfig::default());
        vm.load_data(&data).unwrap();
        assert_eq!(vm.memory().read_byte(0x100), 0x44);
        assert_eq!(vm.memory().read_byte(0x103), 0x11);
    }

    #[test]
    fn test_from_image_rejects_width() {
        let isa = isa3220().unwrap();
        let image = ProgramImage::new(START, 32, vec![0x4FFE], DataImage::new());
        assert!(matches!(
            VM::from_image(&isa, &image, VMConfig::default()),
            Err(RuntimeError::WidthMismatch {
                image: 32,
                expected: 16
            })
        ));
    }

    #[test]
    fn test_from_words_rejects_bad_word() {
        let isa = isa3220().unwrap();
        assert!(matches!(
            VM::from_words(&isa, &[0x7301], START, VMConfig::default()),
            Err(RuntimeError::Decode(_))
        ));
    }
}
