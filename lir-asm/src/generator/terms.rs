//! Terminators

use super::insts::call_result_type;
use super::local::FuncScope;
use super::metadata::{attachments, ValueResolver};
use super::{Result, TypeTable};
use crate::ast::{TermKindNode, TermNode};
use lir_ir::{ContractViolation, Local, Term, TermKind, Type, Value};

pub(crate) fn opcode(kind: &TermKindNode) -> &'static str {
    match kind {
        TermKindNode::Ret { .. } => "ret",
        TermKindNode::Br { .. } | TermKindNode::CondBr { .. } => "br",
        TermKindNode::Switch { .. } => "switch",
        TermKindNode::IndirectBr { .. } => "indirectbr",
        TermKindNode::Invoke { .. } => "invoke",
        TermKindNode::Resume { .. } => "resume",
        TermKindNode::Unreachable => "unreachable",
    }
}

/// Only a non-void `invoke` produces a value
pub(crate) fn result_type(types: &TypeTable, kind: &TermKindNode) -> Result<Option<Type>> {
    match kind {
        TermKindNode::Invoke { call, .. } => call_result_type(types, call),
        _ => Ok(None),
    }
}

impl FuncScope<'_> {
    pub(crate) fn term(&self, node: &TermNode, result: Option<Local>) -> Result<Term> {
        let mut term = match &node.kind {
            TermKindNode::Ret { x } => Term::ret(x.as_ref().map(|x| self.value(x)).transpose()?)?,
            TermKindNode::Br { target } => Term::br(&self.label(target)?)?,
            TermKindNode::CondBr {
                cond,
                target_true,
                target_false,
            } => Term::cond_br(
                self.value(cond)?,
                &self.label(target_true)?,
                &self.label(target_false)?,
            )?,
            TermKindNode::Switch { x, default, cases } => {
                let cases = cases
                    .iter()
                    .map(|case| match self.value(&case.x)? {
                        Value::Const(c) => Ok((c, self.label(&case.target)?)),
                        other => Err(ContractViolation::InvalidOperand {
                            inst: "switch",
                            expected: "constant case value",
                            got: other.typ(),
                        }
                        .into()),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Term::switch(self.value(x)?, &self.label(default)?, cases)?
            }
            TermKindNode::IndirectBr { addr, targets } => {
                let targets = targets
                    .iter()
                    .map(|target| self.label(target))
                    .collect::<Result<Vec<_>>>()?;
                Term::indirect_br(self.value(addr)?, targets)?
            }
            TermKindNode::Invoke {
                call,
                normal,
                exception,
            } => {
                let (callee, args) = self.call_operands(call)?;
                let mut term = Term::invoke(callee, args, &self.label(normal)?, &self.label(exception)?)?;
                if let TermKind::Invoke { site, .. } = &mut term.kind {
                    self.decorate_call_site(site, call)?;
                }
                term
            }
            TermKindNode::Resume { x } => Term::resume(self.value(x)?),
            TermKindNode::Unreachable => Term::unreachable(),
        };
        term.metadata = attachments(self, &node.metadata)?;
        match result {
            Some(local) => Ok(term.with_result(local)?),
            None => Ok(term),
        }
    }
}
