//! # Operations and Mnemonics
//!
//! An [`OperationSpec`] is either a primitive operation with a binary layout
//! and semantic actions, or a mnemonic that expands into other specs. Both
//! share the assembly format layer.

use crate::bindings::Bindings;
use crate::context::ExecContext;
use crate::error::{IsaError, Result};
use crate::expand::ExpansionContext;
use crate::layout::BinaryLayout;
use crate::syntax::AssemblyFormat;
use crate::{Value, Word};
use std::fmt;
use std::sync::Arc;

/// Semantic action of a primitive. A returned value is written back to the
/// destination register when the instruction binds one.
pub type Action = Arc<dyn Fn(&mut ExecContext<'_>) -> Result<Option<Value>> + Send + Sync>;

/// Expansion function of a mnemonic
pub type Expansion = Arc<dyn Fn(&mut ExpansionContext<'_>) -> Result<()> + Send + Sync>;

pub enum SpecKind {
    Primitive {
        layout: BinaryLayout,
        /// Shared "before" actions first, then the operation's own
        actions: Vec<Action>,
    },
    Mnemonic {
        expansion: Expansion,
    },
}

pub struct OperationSpec {
    name: String,
    /// Primary name followed by aliases
    names: Vec<String>,
    group: Option<String>,
    syntax: AssemblyFormat,
    kind: SpecKind,
}

impl OperationSpec {
    pub fn new(
        name: String,
        aliases: Vec<String>,
        group: Option<String>,
        syntax: AssemblyFormat,
        kind: SpecKind,
    ) -> Self {
        let mut names = Vec::with_capacity(aliases.len() + 1);
        names.push(name.clone());
        names.extend(aliases);
        Self {
            name,
            names,
            group,
            syntax,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.names[1..]
    }

    /// Primary name and aliases
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn syntax(&self) -> &AssemblyFormat {
        &self.syntax
    }

    pub fn kind(&self) -> &SpecKind {
        &self.kind
    }

    pub fn is_mnemonic(&self) -> bool {
        matches!(self.kind, SpecKind::Mnemonic { .. })
    }

    pub fn layout(&self) -> Option<&BinaryLayout> {
        match &self.kind {
            SpecKind::Primitive { layout, .. } => Some(layout),
            SpecKind::Mnemonic { .. } => None,
        }
    }

    /// Operand names written in the assembly format
    pub fn operands(&self) -> Vec<&str> {
        self.syntax.placeholders()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.syntax.matches(text, &self.names)
    }

    /// Match `text`, returning the name it was written with and its operands.
    pub fn parse_text(&self, text: &str) -> Option<(String, Bindings)> {
        self.syntax.parse(text, &self.names)
    }

    pub fn encode(&self, bindings: &Bindings) -> Result<Word> {
        match &self.kind {
            SpecKind::Primitive { layout, .. } => layout.encode(&self.name, bindings),
            SpecKind::Mnemonic { .. } => Err(IsaError::NotEncodable(self.name.clone())),
        }
    }

    /// Operands of `word` if it belongs to this spec
    pub fn decode(&self, word: Word) -> Option<Bindings> {
        self.layout().and_then(|layout| layout.decode(word))
    }

    pub fn render(&self, name: &str, bindings: &Bindings) -> Result<String> {
        self.syntax.render(name, bindings)
    }
}

impl fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("OperationSpec");
        s.field("names", &self.names)
            .field("group", &self.group)
            .field("syntax", &self.syntax.format());
        match &self.kind {
            SpecKind::Primitive { layout, actions } => s
                .field("layout", &layout.format())
                .field("actions", &actions.len())
                .finish(),
            SpecKind::Mnemonic { .. } => s.field("mnemonic", &true).finish(),
        }
    }
}
