//! # ISA Builder
//!
//! The single construction phase of an instruction set. Widths, registers,
//! roles and specs are declared in any order; [`IsaBuilder::build`] then
//! validates the whole description and freezes it.
//!
//! ```rust
//! use isakit_spec::{IsaBuilder, OpDef, GroupDef};
//!
//! let isa = IsaBuilder::new()
//!     .instruction_width(16)
//!     .data_width(32)
//!     .field_width("opcode", 4)
//!     .field_width("reg", 4)
//!     .field_width("ext", 4)
//!     .register_args(&["dest", "src"])
//!     .destination("dest")
//!     .group(
//!         GroupDef::new("arith")
//!             .syntax(":op :dest, :src")
//!             .layout(":opcode:dest:src:ext")
//!             .with("opcode", 0)
//!             .member(OpDef::operation("add").with("ext", 0).action(|ctx| {
//!                 Ok(Some(ctx.reg("dest")? + ctx.reg("src")?))
//!             })),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(isa.parse("add R1, R2", 0).unwrap()[0].encode().unwrap(), 0x0120);
//! ```

use crate::config::{
    ByteOrder, ConfigError, InstructionSetConfig, RegisterClass, RegisterDecl, RegisterFormat,
};
use crate::context::ExecContext;
use crate::error::Result;
use crate::expand::ExpansionContext;
use crate::isa::InstructionSet;
use crate::layout::BinaryLayout;
use crate::op::{Action, Expansion, OperationSpec, SpecKind};
use crate::syntax::AssemblyFormat;
use crate::{Address, Value, Word};
use std::sync::Arc;

enum Body {
    Operation(Option<Action>),
    Mnemonic(Expansion),
}

/// Declaration of one operation or mnemonic
pub struct OpDef {
    name: String,
    aliases: Vec<String>,
    syntax: Option<String>,
    layout: Option<String>,
    fixed: Vec<(String, Value)>,
    body: Body,
}

impl OpDef {
    /// A primitive operation; attach its semantics with [`OpDef::action`].
    pub fn operation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            syntax: None,
            layout: None,
            fixed: Vec::new(),
            body: Body::Operation(None),
        }
    }

    pub fn mnemonic<F>(name: impl Into<String>, expansion: F) -> Self
    where
        F: Fn(&mut ExpansionContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            body: Body::Mnemonic(Arc::new(expansion)),
            ..Self::operation(name)
        }
    }

    /// Main semantic action. Ignored on mnemonics.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        if let Body::Operation(slot) = &mut self.body {
            *slot = Some(Arc::new(action));
        }
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }

    /// Assembly format, e.g. `:op :dest, :src`
    pub fn syntax(mut self, format: impl Into<String>) -> Self {
        self.syntax = Some(format.into());
        self
    }

    /// Binary layout, e.g. `:opcode:dest:src:ext`
    pub fn layout(mut self, format: impl Into<String>) -> Self {
        self.layout = Some(format.into());
        self
    }

    /// Pin a layout field to a discriminant value.
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fixed.push((field.into(), value));
        self
    }
}

/// Operations sharing a syntax, a layout, fixed fields and "before" actions
pub struct GroupDef {
    name: String,
    syntax: Option<String>,
    layout: Option<String>,
    fixed: Vec<(String, Value)>,
    before: Vec<Action>,
    members: Vec<OpDef>,
}

impl GroupDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            syntax: None,
            layout: None,
            fixed: Vec::new(),
            before: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn syntax(mut self, format: impl Into<String>) -> Self {
        self.syntax = Some(format.into());
        self
    }

    pub fn layout(mut self, format: impl Into<String>) -> Self {
        self.layout = Some(format.into());
        self
    }

    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fixed.push((field.into(), value));
        self
    }

    /// Action run before every member's own action
    pub fn before<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(action));
        self
    }

    pub fn member(mut self, op: OpDef) -> Self {
        self.members.push(op);
        self
    }
}

struct Pending {
    def: OpDef,
    group: Option<String>,
    syntax: Option<String>,
    layout: Option<String>,
    fixed: Vec<(String, Value)>,
    before: Vec<Action>,
}

pub struct IsaBuilder {
    config: InstructionSetConfig,
    register_formats: Vec<String>,
    before: Vec<Action>,
    pending: Vec<Pending>,
}

impl Default for IsaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IsaBuilder {
    pub fn new() -> Self {
        Self {
            config: InstructionSetConfig::default(),
            register_formats: Vec::new(),
            before: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn instruction_width(mut self, bits: u32) -> Self {
        self.config.instruction_width = bits;
        self
    }

    pub fn data_width(mut self, bits: u32) -> Self {
        self.config.data_width = bits;
        self
    }

    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.config.byte_order = order;
        self
    }

    pub fn instruction_start(mut self, addr: Address) -> Self {
        self.config.instruction_start = addr;
        self
    }

    pub fn field_width(mut self, name: impl Into<String>, bits: u32) -> Self {
        self.config.field_widths.insert(name.into(), bits);
        self
    }

    pub fn terminating_instruction(mut self, word: Word) -> Self {
        self.config.terminating_instruction = Some(word);
        self
    }

    fn declare(mut self, index: usize, alias: &str, class: RegisterClass) -> Self {
        self.config.registers.retain(|r| r.index != index);
        self.config.registers.push(RegisterDecl {
            index,
            alias: alias.to_string(),
            class,
        });
        self
    }

    /// Give a normal register a symbolic alias.
    pub fn register(self, index: usize, alias: &str) -> Self {
        self.declare(index, alias, RegisterClass::Normal)
    }

    pub fn ground_register(self, index: usize, alias: &str) -> Self {
        self.declare(index, alias, RegisterClass::Ground)
    }

    pub fn reserve_register(self, index: usize, alias: &str) -> Self {
        self.declare(index, alias, RegisterClass::Reserved)
    }

    pub fn register_args(mut self, roles: &[&str]) -> Self {
        self.config.register_args = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn destination(mut self, role: &str) -> Self {
        self.config.destination = Some(role.to_string());
        self
    }

    /// Accepted register spellings such as `R:val`; the first is canonical.
    pub fn register_formats(mut self, forms: &[&str]) -> Self {
        self.register_formats = forms.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Action run before the actions of every operation defined after it
    pub fn before<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(action));
        self
    }

    pub fn def(mut self, op: OpDef) -> Self {
        self.pending.push(Pending {
            syntax: op.syntax.clone(),
            layout: op.layout.clone(),
            fixed: op.fixed.clone(),
            before: self.before.clone(),
            group: None,
            def: op,
        });
        self
    }

    pub fn group(mut self, group: GroupDef) -> Self {
        for op in group.members {
            let mut fixed = group.fixed.clone();
            fixed.extend(op.fixed.iter().cloned());
            let mut before = self.before.clone();
            before.extend(group.before.iter().cloned());
            self.pending.push(Pending {
                syntax: op.syntax.clone().or_else(|| group.syntax.clone()),
                layout: op.layout.clone().or_else(|| group.layout.clone()),
                fixed,
                before,
                group: Some(group.name.clone()),
                def: op,
            });
        }
        self
    }

    /// Validate everything and freeze the instruction set.
    pub fn build(self) -> Result<InstructionSet> {
        let mut config = self.config;
        if !self.register_formats.is_empty() {
            config.register_formats = self
                .register_formats
                .iter()
                .map(|form| RegisterFormat::parse(form))
                .collect::<std::result::Result<_, _>>()?;
        }
        config.validate()?;

        let mut specs = Vec::with_capacity(self.pending.len());
        for pending in self.pending {
            specs.push(Arc::new(build_spec(&config, pending)?));
        }

        let primitives: Vec<(&str, &BinaryLayout)> = specs
            .iter()
            .filter_map(|spec| spec.layout().map(|layout| (spec.name(), layout)))
            .collect();
        for (i, (first, a)) in primitives.iter().enumerate() {
            for (second, b) in &primitives[i + 1..] {
                if a.overlaps(b) {
                    return Err(ConfigError::AmbiguousEncoding {
                        first: first.to_string(),
                        second: second.to_string(),
                    }
                    .into());
                }
            }
        }

        tracing::debug!(specs = specs.len(), %config, "instruction set built");
        Ok(InstructionSet::new(Arc::new(config), specs))
    }
}

fn build_spec(config: &InstructionSetConfig, pending: Pending) -> Result<OperationSpec> {
    let Pending {
        def,
        group,
        syntax,
        layout,
        fixed,
        before,
    } = pending;
    let name = def.name;

    let syntax = syntax.ok_or_else(|| ConfigError::MalformedSyntax {
        format: String::new(),
        reason: format!("{name} has no assembly format"),
    })?;
    let syntax = AssemblyFormat::new(&syntax, config)?;

    let kind = match def.body {
        Body::Mnemonic(expansion) => SpecKind::Mnemonic { expansion },
        Body::Operation(action) => {
            let format = layout.ok_or_else(|| ConfigError::MalformedLayout {
                format: String::new(),
                reason: format!("{name} has no binary layout"),
            })?;
            let mut layout = BinaryLayout::new(&format, config)?;
            for (field, value) in &fixed {
                layout.pin(&name, field, *value)?;
            }

            let placeholders = syntax.placeholders();
            if let Some(operand) = layout
                .operands()
                .into_iter()
                .find(|operand| !placeholders.contains(operand))
            {
                return Err(ConfigError::UndeclaredOperand {
                    spec: name.clone(),
                    operand: operand.to_string(),
                }
                .into());
            }

            let mut actions = before;
            actions.extend(action);
            SpecKind::Primitive { layout, actions }
        }
    };

    Ok(OperationSpec::new(name, def.aliases, group, syntax, kind))
}
