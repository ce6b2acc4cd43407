//! Basic blocks

use crate::error::ContractViolation;
use crate::ident::LocalIdent;
use crate::inst::{Inst, Term};
use crate::types::Type;
use crate::value::{Local, Value};
use std::fmt;

/// Straight-line instruction sequence ended by one terminator
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    label: Local,
    pub insts: Vec<Inst>,
    pub term: Option<Term>,
}

impl Block {
    pub fn new(name: Option<LocalIdent>) -> Self {
        Block {
            label: Local::new(name, Type::label()),
            insts: Vec::new(),
            term: None,
        }
    }

    /// Block whose label local was created ahead of time (forward
    /// references to it may already exist)
    pub fn with_label(label: Local) -> Result<Self, ContractViolation> {
        if !label.typ().is_label() {
            return Err(ContractViolation::InvalidOperand {
                inst: "block",
                expected: "label",
                got: label.typ().clone(),
            });
        }
        Ok(Block {
            label,
            insts: Vec::new(),
            term: None,
        })
    }

    pub fn label(&self) -> &Local {
        &self.label
    }

    /// Append an instruction, returning its result value if it has one
    pub fn append(&mut self, inst: Inst) -> Option<Value> {
        let value = inst.value();
        self.insts.push(inst);
        value
    }

    pub fn set_term(&mut self, term: Term) -> Option<Value> {
        let value = term.value();
        self.term = Some(term);
        value
    }

    pub fn has_terminator(&self) -> bool {
        self.term.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty() && self.term.is_none()
    }

    /// Every local this block defines, in definition order
    pub(crate) fn locals(&self) -> impl Iterator<Item = &Local> {
        std::iter::once(&self.label)
            .chain(self.insts.iter().filter_map(Inst::result))
            .chain(self.term.iter().filter_map(Term::result))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label.label_string())?;
        for inst in &self.insts {
            writeln!(f, "\t{}", inst)?;
        }
        if let Some(term) = &self.term {
            writeln!(f, "\t{}", term)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;

    #[test]
    fn test_basic_block() {
        let mut block = Block::new(Some(LocalIdent::from("entry")));
        assert!(block.is_empty());
        assert!(!block.has_terminator());

        let slot = block.append(Inst::alloca(Type::i32()).unwrap().named("x"));
        assert!(slot.is_some());
        assert!(block.append(Inst::store(Constant::i32(1), slot.unwrap()).unwrap()).is_none());
        block.set_term(Term::ret_void());

        assert!(block.has_terminator());
        assert_eq!(
            block.to_string(),
            "entry:\n\t%x = alloca i32\n\tstore i32 1, i32* %x\n\tret void\n"
        );
        assert_eq!(block.locals().count(), 2);
    }
}
