//! Execution context handed to semantic actions

use crate::bindings::{Bindings, PC};
use crate::bits::{mask, restrict_to_width, zero_extend};
use crate::config::InstructionSetConfig;
use crate::error::{IsaError, Result};
use crate::memory::MemoryStore;
use crate::op::OperationSpec;
use crate::register::{RegisterFile, WriteOutcome};
use crate::{Address, Value};

/// Typed view of one executing instruction: its operands, scratch
/// variables set by earlier actions, the register file, memory and `pc`.
pub struct ExecContext<'a> {
    config: &'a InstructionSetConfig,
    spec: &'a OperationSpec,
    bindings: &'a Bindings,
    scratch: Bindings,
    regs: &'a mut RegisterFile,
    mem: &'a mut MemoryStore,
    pc: Address,
    branch: Option<Address>,
}

impl<'a> ExecContext<'a> {
    pub(crate) fn new(
        config: &'a InstructionSetConfig,
        spec: &'a OperationSpec,
        bindings: &'a Bindings,
        regs: &'a mut RegisterFile,
        mem: &'a mut MemoryStore,
        pc: Address,
    ) -> Self {
        Self {
            config,
            spec,
            bindings,
            scratch: Bindings::new(),
            regs,
            mem,
            pc,
            branch: None,
        }
    }

    /// Branch target, if an action set one
    pub(crate) fn finish(self) -> Option<Address> {
        self.branch
    }

    pub fn config(&self) -> &InstructionSetConfig {
        self.config
    }

    pub fn spec_name(&self) -> &str {
        self.spec.name()
    }

    // ========================================================================
    // Variables
    // ========================================================================

    /// Look up a scratch variable, an operand, or `pc`.
    pub fn var(&self, name: &str) -> Result<Value> {
        self.scratch
            .get(name)
            .or_else(|| self.bindings.get(name))
            .or_else(|| (name == PC).then_some(self.pc as Value))
            .ok_or_else(|| IsaError::unbound(self.spec.name(), name))
    }

    fn field_width(&self, name: &str) -> Option<u32> {
        self.spec.layout().and_then(|layout| layout.field_width(name))
    }

    /// Operand interpreted as a two's-complement number of its field width
    pub fn signed(&self, name: &str) -> Result<Value> {
        let value = self.var(name)?;
        Ok(match self.field_width(name) {
            Some(width) => restrict_to_width(value, width),
            None => value,
        })
    }

    /// Operand interpreted as an unsigned number of its field width
    pub fn unsigned(&self, name: &str) -> Result<Value> {
        let value = self.var(name)?;
        Ok(match self.field_width(name) {
            Some(width) => zero_extend(value, width),
            None => value,
        })
    }

    /// Set a scratch variable visible to later actions of this instruction.
    pub fn set(&mut self, name: &str, value: Value) {
        self.scratch.set(name, value);
    }

    // ========================================================================
    // Registers
    // ========================================================================

    /// Value of the register whose index is bound to `role`
    pub fn reg(&self, role: &str) -> Result<Value> {
        self.regs.read(self.var(role)?)
    }

    pub fn reg_at(&self, index: Value) -> Result<Value> {
        self.regs.read(index)
    }

    /// Value of the register declared with `alias`
    pub fn reg_named(&self, alias: &str) -> Result<Value> {
        self.regs.read(self.register_index(alias)?)
    }

    pub fn set_reg(&mut self, role: &str, value: Value) -> Result<WriteOutcome> {
        let index = self.var(role)?;
        self.regs.write(index, value)
    }

    pub fn set_reg_at(&mut self, index: Value, value: Value) -> Result<WriteOutcome> {
        self.regs.write(index, value)
    }

    pub fn set_reg_named(&mut self, alias: &str, value: Value) -> Result<WriteOutcome> {
        let index = self.register_index(alias)?;
        self.regs.write(index, value)
    }

    fn register_index(&self, alias: &str) -> Result<Value> {
        self.config
            .register_named(alias)
            .map(|index| index as Value)
            .ok_or_else(|| IsaError::UnknownRegister(alias.to_string()))
    }

    pub fn registers(&self) -> &RegisterFile {
        &*self.regs
    }

    // ========================================================================
    // Program counter
    // ========================================================================

    pub fn pc(&self) -> Address {
        self.pc
    }

    /// Address of the following instruction
    pub fn next_pc(&self) -> Address {
        self.pc.wrapping_add(self.config.instruction_bytes())
    }

    /// Set the next fetch address. Honoured even when equal to `pc`.
    pub fn set_pc(&mut self, target: Address) {
        self.branch = Some(target);
    }

    // ========================================================================
    // Memory
    // ========================================================================

    /// Map a data value to an address of the data width
    pub fn address(&self, value: Value) -> Address {
        value as u64 & mask(self.config.data_width)
    }

    /// Read `bytes` bytes at `addr` in the configured byte order, unsigned.
    pub fn load(&self, addr: Value, bytes: u64) -> Result<Value> {
        let value = self.mem.read(self.address(addr), bytes, self.config.byte_order)?;
        Ok(value as Value)
    }

    pub fn store(&mut self, addr: Value, bytes: u64, value: Value) -> Result<()> {
        let addr = self.address(addr);
        self.mem.write(addr, bytes, self.config.byte_order, value as u64)
    }

    pub fn memory(&self) -> &MemoryStore {
        &*self.mem
    }

    /// Restrict `value` to the data width
    pub fn restrict(&self, value: Value) -> Value {
        restrict_to_width(value, self.config.data_width)
    }

    pub fn data_width(&self) -> u32 {
        self.config.data_width
    }
}
