//! Terminators

use super::{Arg, CallSite, Result};
use crate::constant::Constant;
use crate::error::ContractViolation;
use crate::metadata::{fmt_attachments, MetadataAttachment};
use crate::types::Type;
use crate::value::{Local, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
    /// `ret void` when `x` is `None`
    Ret {
        x: Option<Value>,
    },
    Br {
        target: Local,
    },
    CondBr {
        cond: Value,
        target_true: Local,
        target_false: Local,
    },
    Switch {
        x: Value,
        default: Local,
        cases: Vec<(Constant, Local)>,
    },
    IndirectBr {
        addr: Value,
        targets: Vec<Local>,
    },
    Invoke {
        site: CallSite,
        normal: Local,
        exception: Local,
    },
    Resume {
        x: Value,
    },
    Unreachable,
}

/// Terminator of a basic block
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    result: Option<Local>,
    pub kind: TermKind,
    pub metadata: Vec<MetadataAttachment>,
}

fn require_label(inst: &'static str, target: &Local) -> Result<()> {
    if !target.typ().is_label() {
        return Err(ContractViolation::InvalidOperand {
            inst,
            expected: "label target",
            got: target.typ().clone(),
        });
    }
    Ok(())
}

impl Term {
    fn new(kind: TermKind) -> Self {
        Term {
            result: None,
            kind,
            metadata: Vec::new(),
        }
    }

    pub fn ret(x: Option<Value>) -> Result<Self> {
        if let Some(x) = &x {
            let typ = x.typ();
            if !typ.is_first_class() || typ.is_label() {
                return Err(ContractViolation::InvalidOperand {
                    inst: "ret",
                    expected: "first-class return value",
                    got: typ,
                });
            }
        }
        Ok(Self::new(TermKind::Ret { x }))
    }

    pub fn ret_void() -> Self {
        Self::new(TermKind::Ret { x: None })
    }

    pub fn br(target: &Local) -> Result<Self> {
        require_label("br", target)?;
        Ok(Self::new(TermKind::Br {
            target: target.clone(),
        }))
    }

    pub fn cond_br(cond: impl Into<Value>, target_true: &Local, target_false: &Local) -> Result<Self> {
        let cond = cond.into();
        let typ = cond.typ();
        if !typ.is_bool() {
            return Err(ContractViolation::InvalidOperand {
                inst: "br",
                expected: "i1 condition",
                got: typ,
            });
        }
        require_label("br", target_true)?;
        require_label("br", target_false)?;
        Ok(Self::new(TermKind::CondBr {
            cond,
            target_true: target_true.clone(),
            target_false: target_false.clone(),
        }))
    }

    pub fn switch(x: impl Into<Value>, default: &Local, cases: Vec<(Constant, Local)>) -> Result<Self> {
        let x = x.into();
        let typ = x.typ();
        if !typ.is_int() {
            return Err(ContractViolation::InvalidOperand {
                inst: "switch",
                expected: "integer scrutinee",
                got: typ,
            });
        }
        require_label("switch", default)?;
        for (value, target) in &cases {
            let got = value.typ();
            if got != typ {
                return Err(ContractViolation::TypeMismatch {
                    what: "switch case",
                    expected: typ,
                    got,
                });
            }
            require_label("switch", target)?;
        }
        Ok(Self::new(TermKind::Switch {
            x,
            default: default.clone(),
            cases,
        }))
    }

    pub fn indirect_br(addr: impl Into<Value>, targets: Vec<Local>) -> Result<Self> {
        let addr = addr.into();
        let typ = addr.typ();
        if !typ.is_pointer() {
            return Err(ContractViolation::InvalidOperand {
                inst: "indirectbr",
                expected: "pointer address",
                got: typ,
            });
        }
        for target in &targets {
            require_label("indirectbr", target)?;
        }
        Ok(Self::new(TermKind::IndirectBr { addr, targets }))
    }

    /// Call with normal and unwind successors; produces a value unless the
    /// callee returns void.
    pub fn invoke(
        callee: impl Into<Value>,
        args: Vec<Arg>,
        normal: &Local,
        exception: &Local,
    ) -> Result<Self> {
        let (site, ret) = CallSite::new("invoke", callee.into(), args)?;
        require_label("invoke", normal)?;
        require_label("invoke", exception)?;
        let mut term = Self::new(TermKind::Invoke {
            site,
            normal: normal.clone(),
            exception: exception.clone(),
        });
        if !ret.is_void() {
            term.result = Some(Local::unnamed(ret));
        }
        Ok(term)
    }

    pub fn resume(x: impl Into<Value>) -> Self {
        Self::new(TermKind::Resume { x: x.into() })
    }

    pub fn unreachable() -> Self {
        Self::new(TermKind::Unreachable)
    }

    pub fn result(&self) -> Option<&Local> {
        self.result.as_ref()
    }

    pub fn value(&self) -> Option<Value> {
        self.result.clone().map(Value::Local)
    }

    pub fn typ(&self) -> Option<Type> {
        self.result.as_ref().map(|l| l.typ().clone())
    }

    /// Replace the result local (invoke only)
    pub fn with_result(mut self, local: Local) -> Result<Self> {
        let expected = self.typ().ok_or(ContractViolation::NoResult {
            inst: self.opcode(),
        })?;
        if local.typ() != &expected {
            return Err(ContractViolation::ResultTypeMismatch {
                inst: self.opcode(),
                expected,
                got: local.typ().clone(),
            });
        }
        self.result = Some(local);
        Ok(self)
    }

    pub fn opcode(&self) -> &'static str {
        match &self.kind {
            TermKind::Ret { .. } => "ret",
            TermKind::Br { .. } | TermKind::CondBr { .. } => "br",
            TermKind::Switch { .. } => "switch",
            TermKind::IndirectBr { .. } => "indirectbr",
            TermKind::Invoke { .. } => "invoke",
            TermKind::Resume { .. } => "resume",
            TermKind::Unreachable => "unreachable",
        }
    }

    /// Labels this terminator may transfer control to
    pub fn successors(&self) -> Vec<&Local> {
        match &self.kind {
            TermKind::Br { target } => vec![target],
            TermKind::CondBr {
                target_true,
                target_false,
                ..
            } => vec![target_true, target_false],
            TermKind::Switch { default, cases, .. } => {
                std::iter::once(default).chain(cases.iter().map(|(_, t)| t)).collect()
            }
            TermKind::IndirectBr { targets, .. } => targets.iter().collect(),
            TermKind::Invoke {
                normal, exception, ..
            } => vec![normal, exception],
            TermKind::Ret { .. } | TermKind::Resume { .. } | TermKind::Unreachable => Vec::new(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = &self.result {
            write!(f, "{} = ", result.ident_string())?;
        }
        match &self.kind {
            TermKind::Ret { x: None } => f.write_str("ret void")?,
            TermKind::Ret { x: Some(x) } => write!(f, "ret {}", x)?,
            TermKind::Br { target } => write!(f, "br {}", target)?,
            TermKind::CondBr {
                cond,
                target_true,
                target_false,
            } => write!(f, "br {}, {}, {}", cond, target_true, target_false)?,
            TermKind::Switch { x, default, cases } => {
                write!(f, "switch {}, {} [\n", x, default)?;
                for (value, target) in cases {
                    writeln!(f, "\t\t{}, {}", value, target)?;
                }
                f.write_str("\t]")?;
            }
            TermKind::IndirectBr { addr, targets } => {
                write!(f, "indirectbr {}, [", addr)?;
                for (i, target) in targets.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", target)?;
                }
                f.write_str("]")?;
            }
            TermKind::Invoke {
                site,
                normal,
                exception,
            } => {
                f.write_str("invoke")?;
                site.fmt_call(f)?;
                write!(f, "\n\t\tto {} unwind {}", normal, exception)?;
            }
            TermKind::Resume { x } => write!(f, "resume {}", x)?,
            TermKind::Unreachable => f.write_str("unreachable")?,
        }
        fmt_attachments(f, &self.metadata, true)
    }
}
