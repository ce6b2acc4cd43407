//! IR Instructions
//!
//! Every constructor validates its operands and computes the result type;
//! a value-producing instruction owns a fresh unnamed [`Local`] for its
//! result, which callers may replace with [`Inst::with_result`] (checked
//! against the computed type) or rename in place.
//!
//! The operand fields of [`InstKind`] are public for inspection. Editing
//! them directly bypasses the construction-time checks.

mod term;

pub use term::{Term, TermKind};

use crate::attrs::{fmt_attrs, Attribute};
use crate::check;
use crate::enums::{
    fmt_flags, AtomicOp, AtomicOrdering, BinaryOp, CallingConv, CastOp, FPred, IPred, OpFlag, Tail,
};
use crate::error::ContractViolation;
use crate::gep::GepIndex;
use crate::metadata::{fmt_attachments, MetadataAttachment};
use crate::types::{AddrSpace, Type};
use crate::value::{Local, Value};
use std::fmt;

type Result<T> = std::result::Result<T, ContractViolation>;

/// Ordering and synchronization scope of an atomic memory operation
#[derive(Debug, Clone, PartialEq)]
pub struct Atomic {
    pub ordering: AtomicOrdering,
    pub sync_scope: Option<String>,
}

impl Atomic {
    pub fn new(ordering: AtomicOrdering) -> Self {
        Atomic {
            ordering,
            sync_scope: None,
        }
    }
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.sync_scope {
            write!(f, "syncscope({}) ", crate::enc::quote(scope))?;
        }
        write!(f, "{}", self.ordering)
    }
}

/// `[ %x, %pred ]`
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub x: Value,
    pub pred: Local,
}

/// Call argument with its parameter attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub value: Value,
    pub attrs: Vec<Attribute>,
}

impl Arg {
    pub fn new(value: impl Into<Value>) -> Self {
        Arg {
            value: value.into(),
            attrs: Vec::new(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.typ())?;
        fmt_attrs(f, &self.attrs)?;
        write!(f, " {}", self.value.ident())
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::new(value)
    }
}

/// Callee and arguments shared by `call` and `invoke`
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub cc: Option<CallingConv>,
    pub ret_attrs: Vec<Attribute>,
    pub callee: Value,
    pub args: Vec<Arg>,
    pub func_attrs: Vec<Attribute>,
}

impl CallSite {
    /// Checks the arguments against the callee signature; returns the
    /// return type.
    pub(crate) fn new(inst: &'static str, callee: Value, args: Vec<Arg>) -> Result<(Self, Type)> {
        let callee_type = callee.typ();
        let sig = callee_type
            .pointee()
            .and_then(Type::func_type)
            .ok_or_else(|| ContractViolation::InvalidOperand {
                inst,
                expected: "pointer to function callee",
                got: callee_type.clone(),
            })?;
        let count_ok = if sig.variadic {
            args.len() >= sig.params.len()
        } else {
            args.len() == sig.params.len()
        };
        if !count_ok {
            return Err(ContractViolation::ArgCountMismatch {
                inst,
                expected: sig.params.len(),
                got: args.len(),
            });
        }
        for (index, (param, arg)) in sig.params.iter().zip(&args).enumerate() {
            let got = arg.value.typ();
            if param != &got {
                return Err(ContractViolation::ArgTypeMismatch {
                    inst,
                    index,
                    expected: param.clone(),
                    got,
                });
            }
        }
        let ret = sig.ret.clone();
        Ok((
            CallSite {
                cc: None,
                ret_attrs: Vec::new(),
                callee,
                args,
                func_attrs: Vec::new(),
            },
            ret,
        ))
    }

    /// `[cc] [ret attrs] <ty> callee(args) [fn attrs]`; `<ty>` is the full
    /// signature for variadic callees and the return type otherwise.
    pub(crate) fn fmt_call(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cc) = &self.cc {
            write!(f, " {}", cc)?;
        }
        fmt_attrs(f, &self.ret_attrs)?;
        let callee_type = self.callee.typ();
        match callee_type.pointee() {
            Some(sig) => match sig.func_type() {
                Some(ft) if ft.variadic => write!(f, " {}", sig)?,
                Some(ft) => write!(f, " {}", ft.ret)?,
                None => write!(f, " {}", sig)?,
            },
            None => write!(f, " {}", callee_type)?,
        }
        write!(f, " {}(", self.callee.ident())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")?;
        fmt_attrs(f, &self.func_attrs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstKind {
    FNeg {
        flags: Vec<OpFlag>,
        x: Value,
    },
    Binary {
        op: BinaryOp,
        flags: Vec<OpFlag>,
        x: Value,
        y: Value,
    },
    ExtractElement {
        x: Value,
        index: Value,
    },
    InsertElement {
        x: Value,
        elem: Value,
        index: Value,
    },
    ShuffleVector {
        x: Value,
        y: Value,
        mask: Value,
    },
    ExtractValue {
        x: Value,
        indices: Vec<u64>,
    },
    InsertValue {
        x: Value,
        elem: Value,
        indices: Vec<u64>,
    },
    Alloca {
        elem_type: Type,
        count: Option<Value>,
        align: Option<u64>,
        addr_space: AddrSpace,
        in_alloca: bool,
        swift_error: bool,
    },
    Load {
        elem_type: Type,
        src: Value,
        volatile: bool,
        atomic: Option<Atomic>,
        align: Option<u64>,
    },
    Store {
        src: Value,
        dst: Value,
        volatile: bool,
        atomic: Option<Atomic>,
        align: Option<u64>,
    },
    Fence {
        atomic: Atomic,
    },
    CmpXchg {
        ptr: Value,
        cmp: Value,
        new: Value,
        success: AtomicOrdering,
        failure: AtomicOrdering,
        sync_scope: Option<String>,
        weak: bool,
        volatile: bool,
    },
    AtomicRmw {
        op: AtomicOp,
        dst: Value,
        x: Value,
        atomic: Atomic,
        volatile: bool,
    },
    GetElementPtr {
        in_bounds: bool,
        elem_type: Type,
        src: Value,
        indices: Vec<Value>,
    },
    Cast {
        op: CastOp,
        from: Value,
        to: Type,
    },
    ICmp {
        pred: IPred,
        x: Value,
        y: Value,
    },
    FCmp {
        pred: FPred,
        flags: Vec<OpFlag>,
        x: Value,
        y: Value,
    },
    Phi {
        typ: Type,
        incs: Vec<Incoming>,
    },
    Select {
        cond: Value,
        x: Value,
        y: Value,
    },
    Freeze {
        x: Value,
    },
    Call {
        tail: Option<Tail>,
        flags: Vec<OpFlag>,
        site: CallSite,
    },
    VaArg {
        list: Value,
        arg_type: Type,
    },
}

impl InstKind {
    pub fn opcode(&self) -> &'static str {
        match self {
            InstKind::FNeg { .. } => "fneg",
            InstKind::Binary { op, .. } => op.as_str(),
            InstKind::ExtractElement { .. } => "extractelement",
            InstKind::InsertElement { .. } => "insertelement",
            InstKind::ShuffleVector { .. } => "shufflevector",
            InstKind::ExtractValue { .. } => "extractvalue",
            InstKind::InsertValue { .. } => "insertvalue",
            InstKind::Alloca { .. } => "alloca",
            InstKind::Load { .. } => "load",
            InstKind::Store { .. } => "store",
            InstKind::Fence { .. } => "fence",
            InstKind::CmpXchg { .. } => "cmpxchg",
            InstKind::AtomicRmw { .. } => "atomicrmw",
            InstKind::GetElementPtr { .. } => "getelementptr",
            InstKind::Cast { op, .. } => op.as_str(),
            InstKind::ICmp { .. } => "icmp",
            InstKind::FCmp { .. } => "fcmp",
            InstKind::Phi { .. } => "phi",
            InstKind::Select { .. } => "select",
            InstKind::Freeze { .. } => "freeze",
            InstKind::Call { .. } => "call",
            InstKind::VaArg { .. } => "va_arg",
        }
    }
}

/// Non-terminating instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Inst {
    result: Option<Local>,
    pub kind: InstKind,
    pub metadata: Vec<MetadataAttachment>,
}

fn require_pointer(inst: &'static str, t: &Type) -> Result<Type> {
    t.pointee()
        .cloned()
        .ok_or_else(|| ContractViolation::InvalidOperand {
            inst,
            expected: "pointer",
            got: t.clone(),
        })
}

impl Inst {
    fn new(kind: InstKind, result_type: Option<Type>) -> Self {
        Inst {
            result: result_type.filter(|t| !t.is_void()).map(Local::unnamed),
            kind,
            metadata: Vec::new(),
        }
    }

    /// Local holding the result, if the instruction produces a value
    pub fn result(&self) -> Option<&Local> {
        self.result.as_ref()
    }

    pub fn value(&self) -> Option<Value> {
        self.result.clone().map(Value::Local)
    }

    pub fn typ(&self) -> Option<Type> {
        self.result.as_ref().map(|l| l.typ().clone())
    }

    /// Replace the result local, which must have the computed result type
    pub fn with_result(mut self, local: Local) -> Result<Self> {
        let inst = self.kind.opcode();
        let expected = self
            .typ()
            .ok_or(ContractViolation::NoResult { inst })?;
        if local.typ() != &expected {
            return Err(ContractViolation::ResultTypeMismatch {
                inst,
                expected,
                got: local.typ().clone(),
            });
        }
        self.result = Some(local);
        Ok(self)
    }

    /// Give the result an explicit name (no-op for void instructions)
    pub fn named(self, name: &str) -> Self {
        if let Some(result) = &self.result {
            result.set_name(name);
        }
        self
    }

    pub fn fneg(x: impl Into<Value>) -> Result<Self> {
        let x = x.into();
        let typ = x.typ();
        check::fneg(&typ)?;
        Ok(Self::new(
            InstKind::FNeg {
                flags: Vec::new(),
                x,
            },
            Some(typ),
        ))
    }

    pub fn binary(op: BinaryOp, x: impl Into<Value>, y: impl Into<Value>) -> Result<Self> {
        let (x, y) = (x.into(), y.into());
        let typ = x.typ();
        check::binary(op, &typ, &y.typ())?;
        Ok(Self::new(
            InstKind::Binary {
                op,
                flags: Vec::new(),
                x,
                y,
            },
            Some(typ),
        ))
    }

    pub fn extract_element(x: impl Into<Value>, index: impl Into<Value>) -> Result<Self> {
        let (x, index) = (x.into(), index.into());
        let typ = check::extract_element(&x.typ(), &index.typ())?;
        Ok(Self::new(InstKind::ExtractElement { x, index }, Some(typ)))
    }

    pub fn insert_element(
        x: impl Into<Value>,
        elem: impl Into<Value>,
        index: impl Into<Value>,
    ) -> Result<Self> {
        let (x, elem, index) = (x.into(), elem.into(), index.into());
        let typ = x.typ();
        check::insert_element(&typ, &elem.typ(), &index.typ())?;
        Ok(Self::new(InstKind::InsertElement { x, elem, index }, Some(typ)))
    }

    pub fn shuffle_vector(
        x: impl Into<Value>,
        y: impl Into<Value>,
        mask: impl Into<Value>,
    ) -> Result<Self> {
        let (x, y, mask) = (x.into(), y.into(), mask.into());
        let typ = check::shuffle_vector(&x.typ(), &y.typ(), &mask.typ())?;
        Ok(Self::new(InstKind::ShuffleVector { x, y, mask }, Some(typ)))
    }

    pub fn extract_value(x: impl Into<Value>, indices: Vec<u64>) -> Result<Self> {
        let x = x.into();
        let typ = check::extract_value(&x.typ(), &indices)?;
        Ok(Self::new(InstKind::ExtractValue { x, indices }, Some(typ)))
    }

    pub fn insert_value(
        x: impl Into<Value>,
        elem: impl Into<Value>,
        indices: Vec<u64>,
    ) -> Result<Self> {
        let (x, elem) = (x.into(), elem.into());
        let typ = x.typ();
        check::insert_value(&typ, &elem.typ(), &indices)?;
        Ok(Self::new(InstKind::InsertValue { x, elem, indices }, Some(typ)))
    }

    pub fn alloca(elem_type: Type) -> Result<Self> {
        Self::alloca_in(elem_type, None, AddrSpace::default())
    }

    /// `alloca T[, <ty> count][, addrspace(N)]`
    pub fn alloca_in(elem_type: Type, count: Option<Value>, addr_space: AddrSpace) -> Result<Self> {
        if !elem_type.is_sized() {
            return Err(ContractViolation::InvalidOperand {
                inst: "alloca",
                expected: "sized element type",
                got: elem_type,
            });
        }
        if let Some(count) = &count {
            let t = count.typ();
            if !t.is_int() {
                return Err(ContractViolation::InvalidOperand {
                    inst: "alloca",
                    expected: "integer element count",
                    got: t,
                });
            }
        }
        let typ = Type::pointer_in(elem_type.clone(), addr_space);
        Ok(Self::new(
            InstKind::Alloca {
                elem_type,
                count,
                align: None,
                addr_space,
                in_alloca: false,
                swift_error: false,
            },
            Some(typ),
        ))
    }

    pub fn load(elem_type: Type, src: impl Into<Value>) -> Result<Self> {
        let src = src.into();
        let pointee = require_pointer("load", &src.typ())?;
        if pointee != elem_type {
            return Err(ContractViolation::ElemTypeMismatch {
                inst: "load",
                expected: pointee,
                got: elem_type,
            });
        }
        if !elem_type.is_sized() {
            return Err(ContractViolation::InvalidOperand {
                inst: "load",
                expected: "sized type",
                got: elem_type,
            });
        }
        Ok(Self::new(
            InstKind::Load {
                elem_type: elem_type.clone(),
                src,
                volatile: false,
                atomic: None,
                align: None,
            },
            Some(elem_type),
        ))
    }

    pub fn store(src: impl Into<Value>, dst: impl Into<Value>) -> Result<Self> {
        let (src, dst) = (src.into(), dst.into());
        let dst_type = dst.typ();
        let pointee = dst_type
            .pointee()
            .ok_or_else(|| ContractViolation::StoreDestination {
                got: dst_type.clone(),
            })?;
        let src_type = src.typ();
        if pointee != &src_type {
            return Err(ContractViolation::StoreMismatch {
                src: src_type,
                dst: dst_type,
            });
        }
        Ok(Self::new(
            InstKind::Store {
                src,
                dst,
                volatile: false,
                atomic: None,
                align: None,
            },
            None,
        ))
    }

    pub fn fence(atomic: Atomic) -> Self {
        Self::new(InstKind::Fence { atomic }, None)
    }

    pub fn cmpxchg(
        ptr: impl Into<Value>,
        cmp: impl Into<Value>,
        new: impl Into<Value>,
        success: AtomicOrdering,
        failure: AtomicOrdering,
    ) -> Result<Self> {
        let (ptr, cmp, new) = (ptr.into(), cmp.into(), new.into());
        let pointee = require_pointer("cmpxchg", &ptr.typ())?;
        let cmp_type = cmp.typ();
        if pointee != cmp_type {
            return Err(ContractViolation::ElemTypeMismatch {
                inst: "cmpxchg",
                expected: pointee,
                got: cmp_type,
            });
        }
        let new_type = new.typ();
        if new_type != cmp_type {
            return Err(ContractViolation::OperandMismatch {
                inst: "cmpxchg",
                x: cmp_type,
                y: new_type,
            });
        }
        if !cmp_type.is_int() && !cmp_type.is_pointer() {
            return Err(ContractViolation::InvalidOperand {
                inst: "cmpxchg",
                expected: "integer or pointer operand",
                got: cmp_type,
            });
        }
        let typ = Type::struct_of(vec![cmp_type, Type::i1()]);
        Ok(Self::new(
            InstKind::CmpXchg {
                ptr,
                cmp,
                new,
                success,
                failure,
                sync_scope: None,
                weak: false,
                volatile: false,
            },
            Some(typ),
        ))
    }

    pub fn atomic_rmw(
        op: AtomicOp,
        dst: impl Into<Value>,
        x: impl Into<Value>,
        atomic: Atomic,
    ) -> Result<Self> {
        let (dst, x) = (dst.into(), x.into());
        let pointee = require_pointer("atomicrmw", &dst.typ())?;
        let typ = x.typ();
        if pointee != typ {
            return Err(ContractViolation::ElemTypeMismatch {
                inst: "atomicrmw",
                expected: pointee,
                got: typ,
            });
        }
        let float_op = matches!(op, AtomicOp::FAdd | AtomicOp::FSub);
        let operand_ok = if float_op {
            typ.is_float()
        } else if op == AtomicOp::Xchg {
            typ.is_int() || typ.is_float()
        } else {
            typ.is_int()
        };
        if !operand_ok {
            return Err(ContractViolation::InvalidOperand {
                inst: "atomicrmw",
                expected: if float_op { "floating-point operand" } else { "integer operand" },
                got: typ,
            });
        }
        Ok(Self::new(
            InstKind::AtomicRmw {
                op,
                dst,
                x,
                atomic,
                volatile: false,
            },
            Some(typ),
        ))
    }

    pub fn get_element_ptr(
        elem_type: Type,
        src: impl Into<Value>,
        indices: Vec<Value>,
    ) -> Result<Self> {
        let src = src.into();
        let index_types: Vec<Type> = indices.iter().map(Value::typ).collect();
        let gep_indices: Vec<GepIndex> = indices
            .iter()
            .map(|index| match index {
                Value::Const(c) => c.gep_index(),
                other => GepIndex::of_type(&other.typ()),
            })
            .collect();
        let typ = check::get_element_ptr(&elem_type, &src.typ(), &index_types, &gep_indices)?;
        Ok(Self::new(
            InstKind::GetElementPtr {
                in_bounds: false,
                elem_type,
                src,
                indices,
            },
            Some(typ),
        ))
    }

    pub fn cast(op: CastOp, from: impl Into<Value>, to: Type) -> Result<Self> {
        let from = from.into();
        check::cast(op, &from.typ(), &to)?;
        Ok(Self::new(InstKind::Cast { op, from, to: to.clone() }, Some(to)))
    }

    pub fn icmp(pred: IPred, x: impl Into<Value>, y: impl Into<Value>) -> Result<Self> {
        let (x, y) = (x.into(), y.into());
        let typ = check::icmp(&x.typ(), &y.typ())?;
        Ok(Self::new(InstKind::ICmp { pred, x, y }, Some(typ)))
    }

    pub fn fcmp(pred: FPred, x: impl Into<Value>, y: impl Into<Value>) -> Result<Self> {
        let (x, y) = (x.into(), y.into());
        let typ = check::fcmp(&x.typ(), &y.typ())?;
        Ok(Self::new(
            InstKind::FCmp {
                pred,
                flags: Vec::new(),
                x,
                y,
            },
            Some(typ),
        ))
    }

    pub fn phi(typ: Type, incs: Vec<Incoming>) -> Result<Self> {
        if !typ.is_first_class() || typ.is_label() {
            return Err(ContractViolation::InvalidOperand {
                inst: "phi",
                expected: "first-class value type",
                got: typ,
            });
        }
        for inc in &incs {
            let got = inc.x.typ();
            if got != typ {
                return Err(ContractViolation::TypeMismatch {
                    what: "phi incoming value",
                    expected: typ,
                    got,
                });
            }
            if !inc.pred.typ().is_label() {
                return Err(ContractViolation::InvalidOperand {
                    inst: "phi",
                    expected: "label predecessor",
                    got: inc.pred.typ().clone(),
                });
            }
        }
        Ok(Self::new(InstKind::Phi { typ: typ.clone(), incs }, Some(typ)))
    }

    pub fn select(cond: impl Into<Value>, x: impl Into<Value>, y: impl Into<Value>) -> Result<Self> {
        let (cond, x, y) = (cond.into(), x.into(), y.into());
        let typ = x.typ();
        check::select(&cond.typ(), &typ, &y.typ())?;
        Ok(Self::new(InstKind::Select { cond, x, y }, Some(typ)))
    }

    pub fn freeze(x: impl Into<Value>) -> Result<Self> {
        let x = x.into();
        let typ = x.typ();
        if !typ.is_first_class() || typ.is_label() || typ.is_metadata() {
            return Err(ContractViolation::InvalidOperand {
                inst: "freeze",
                expected: "first-class value",
                got: typ,
            });
        }
        Ok(Self::new(InstKind::Freeze { x }, Some(typ)))
    }

    /// Call through a pointer-to-function `callee`; void calls produce no
    /// value.
    pub fn call(callee: impl Into<Value>, args: Vec<Arg>) -> Result<Self> {
        let (site, ret) = CallSite::new("call", callee.into(), args)?;
        Ok(Self::new(
            InstKind::Call {
                tail: None,
                flags: Vec::new(),
                site,
            },
            Some(ret),
        ))
    }

    pub fn va_arg(list: impl Into<Value>, arg_type: Type) -> Result<Self> {
        let list = list.into();
        require_pointer("va_arg", &list.typ())?;
        Ok(Self::new(
            InstKind::VaArg {
                list,
                arg_type: arg_type.clone(),
            },
            Some(arg_type),
        ))
    }

    /// Attach overflow, exactness or fast-math flags
    pub fn with_flags(mut self, new_flags: Vec<OpFlag>) -> Self {
        match &mut self.kind {
            InstKind::FNeg { flags, .. }
            | InstKind::Binary { flags, .. }
            | InstKind::FCmp { flags, .. }
            | InstKind::Call { flags, .. } => *flags = new_flags,
            _ => {}
        }
        self
    }

    /// Set the `align N` clause of alloca, load and store
    pub fn with_align(mut self, n: u64) -> Self {
        match &mut self.kind {
            InstKind::Alloca { align, .. }
            | InstKind::Load { align, .. }
            | InstKind::Store { align, .. } => *align = Some(n),
            _ => {}
        }
        self
    }
}

fn fmt_opt_align(f: &mut fmt::Formatter<'_>, align: &Option<u64>) -> fmt::Result {
    if let Some(n) = align {
        write!(f, ", align {}", n)?;
    }
    Ok(())
}

fn fmt_indices(f: &mut fmt::Formatter<'_>, indices: &[u64]) -> fmt::Result {
    for index in indices {
        write!(f, ", {}", index)?;
    }
    Ok(())
}

impl fmt::Display for InstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstKind::FNeg { flags, x } => {
                f.write_str("fneg")?;
                fmt_flags(f, flags)?;
                write!(f, " {}", x)
            }
            InstKind::Binary { op, flags, x, y } => {
                write!(f, "{}", op)?;
                fmt_flags(f, flags)?;
                write!(f, " {}, {}", x, y.ident())
            }
            InstKind::ExtractElement { x, index } => write!(f, "extractelement {}, {}", x, index),
            InstKind::InsertElement { x, elem, index } => {
                write!(f, "insertelement {}, {}, {}", x, elem, index)
            }
            InstKind::ShuffleVector { x, y, mask } => {
                write!(f, "shufflevector {}, {}, {}", x, y, mask)
            }
            InstKind::ExtractValue { x, indices } => {
                write!(f, "extractvalue {}", x)?;
                fmt_indices(f, indices)
            }
            InstKind::InsertValue { x, elem, indices } => {
                write!(f, "insertvalue {}, {}", x, elem)?;
                fmt_indices(f, indices)
            }
            InstKind::Alloca {
                elem_type,
                count,
                align,
                addr_space,
                in_alloca,
                swift_error,
            } => {
                f.write_str("alloca")?;
                if *in_alloca {
                    f.write_str(" inalloca")?;
                }
                if *swift_error {
                    f.write_str(" swifterror")?;
                }
                write!(f, " {}", elem_type)?;
                if let Some(count) = count {
                    write!(f, ", {}", count)?;
                }
                fmt_opt_align(f, align)?;
                if !addr_space.is_default() {
                    write!(f, ", {}", addr_space)?;
                }
                Ok(())
            }
            InstKind::Load {
                elem_type,
                src,
                volatile,
                atomic,
                align,
            } => {
                f.write_str("load")?;
                if atomic.is_some() {
                    f.write_str(" atomic")?;
                }
                if *volatile {
                    f.write_str(" volatile")?;
                }
                write!(f, " {}, {}", elem_type, src)?;
                if let Some(atomic) = atomic {
                    write!(f, " {}", atomic)?;
                }
                fmt_opt_align(f, align)
            }
            InstKind::Store {
                src,
                dst,
                volatile,
                atomic,
                align,
            } => {
                f.write_str("store")?;
                if atomic.is_some() {
                    f.write_str(" atomic")?;
                }
                if *volatile {
                    f.write_str(" volatile")?;
                }
                write!(f, " {}, {}", src, dst)?;
                if let Some(atomic) = atomic {
                    write!(f, " {}", atomic)?;
                }
                fmt_opt_align(f, align)
            }
            InstKind::Fence { atomic } => write!(f, "fence {}", atomic),
            InstKind::CmpXchg {
                ptr,
                cmp,
                new,
                success,
                failure,
                sync_scope,
                weak,
                volatile,
            } => {
                f.write_str("cmpxchg")?;
                if *weak {
                    f.write_str(" weak")?;
                }
                if *volatile {
                    f.write_str(" volatile")?;
                }
                write!(f, " {}, {}, {}", ptr, cmp, new)?;
                if let Some(scope) = sync_scope {
                    write!(f, " syncscope({})", crate::enc::quote(scope))?;
                }
                write!(f, " {} {}", success, failure)
            }
            InstKind::AtomicRmw {
                op,
                dst,
                x,
                atomic,
                volatile,
            } => {
                f.write_str("atomicrmw")?;
                if *volatile {
                    f.write_str(" volatile")?;
                }
                write!(f, " {} {}, {} {}", op, dst, x, atomic)
            }
            InstKind::GetElementPtr {
                in_bounds,
                elem_type,
                src,
                indices,
            } => {
                f.write_str("getelementptr")?;
                if *in_bounds {
                    f.write_str(" inbounds")?;
                }
                write!(f, " {}, {}", elem_type, src)?;
                for index in indices {
                    write!(f, ", {}", index)?;
                }
                Ok(())
            }
            InstKind::Cast { op, from, to } => write!(f, "{} {} to {}", op, from, to),
            InstKind::ICmp { pred, x, y } => write!(f, "icmp {} {}, {}", pred, x, y.ident()),
            InstKind::FCmp { pred, flags, x, y } => {
                f.write_str("fcmp")?;
                fmt_flags(f, flags)?;
                write!(f, " {} {}, {}", pred, x, y.ident())
            }
            InstKind::Phi { typ, incs } => {
                write!(f, "phi {} ", typ)?;
                for (i, inc) in incs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "[ {}, {} ]", inc.x.ident(), inc.pred.ident_string())?;
                }
                Ok(())
            }
            InstKind::Select { cond, x, y } => write!(f, "select {}, {}, {}", cond, x, y),
            InstKind::Freeze { x } => write!(f, "freeze {}", x),
            InstKind::Call { tail, flags, site } => {
                if let Some(tail) = tail {
                    write!(f, "{} ", tail)?;
                }
                f.write_str("call")?;
                fmt_flags(f, flags)?;
                site.fmt_call(f)
            }
            InstKind::VaArg { list, arg_type } => write!(f, "va_arg {}, {}", list, arg_type),
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = &self.result {
            write!(f, "{} = ", result.ident_string())?;
        }
        write!(f, "{}", self.kind)?;
        fmt_attachments(f, &self.metadata, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::metadata::Metadata;

    fn ptr_local(name: &str, elem: Type) -> Local {
        Local::named(name, Type::pointer(elem))
    }

    #[test]
    fn test_store_checks() {
        let dst = ptr_local("p", Type::i8());
        let err = Inst::store(Constant::i64(0), &dst).unwrap_err();
        assert_eq!(err.to_string(), "store operands are not compatible: src=i64; dst=i8*");

        let err = Inst::store(Constant::i8(0), Local::named("x", Type::i8())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid store dst operand type; expected pointer destination, got i8"
        );

        let store = Inst::store(Constant::i8(0), &dst).unwrap();
        assert!(store.result().is_none());
        assert_eq!(store.to_string(), "store i8 0, i8* %p");
        assert_eq!(store.with_align(1).to_string(), "store i8 0, i8* %p, align 1");
    }

    #[test]
    fn test_insert_value_chain() {
        let agg_type = Type::struct_of(vec![Type::i32(), Type::i64()]);
        let first = Inst::insert_value(Constant::undef(agg_type), Constant::i32(1), vec![0]).unwrap();
        let first_value = first.value().unwrap();
        let second = Inst::insert_value(first_value.clone(), Constant::i64(1), vec![1]).unwrap();
        assert_eq!(second.typ(), first.typ());

        let err = Inst::insert_value(first_value, Constant::i32(1), vec![1]).unwrap_err();
        assert_eq!(err.to_string(), "insertvalue elem type mismatch, expected i64, got i32");
    }

    #[test]
    fn test_load_and_alloca() {
        let slot = Inst::alloca(Type::i32()).unwrap().named("slot");
        let ptr = slot.result().unwrap().clone();
        assert_eq!(slot.to_string(), "%slot = alloca i32");

        let load = Inst::load(Type::i32(), &ptr).unwrap().named("v").with_align(4);
        assert_eq!(load.to_string(), "%v = load i32, i32* %slot, align 4");
        assert!(Inst::load(Type::i64(), &ptr).is_err());
        assert!(Inst::alloca(Type::void()).is_err());
    }

    #[test]
    fn test_binary_and_compare() {
        let a = Local::named("a", Type::i32());
        let add = Inst::binary(BinaryOp::Add, &a, Constant::i32(1))
            .unwrap()
            .with_flags(vec![OpFlag::Nsw])
            .named("sum");
        assert_eq!(add.to_string(), "%sum = add nsw i32 %a, 1");

        let cmp = Inst::icmp(IPred::Slt, &a, Constant::i32(0)).unwrap().named("neg");
        assert_eq!(cmp.typ(), Some(Type::i1()));
        assert_eq!(cmp.to_string(), "%neg = icmp slt i32 %a, 0");
        assert!(Inst::fcmp(FPred::Oeq, &a, &a).is_err());
    }

    #[test]
    fn test_call_checks() {
        let sig = Type::func(Type::i32(), vec![Type::i32()], false);
        let callee = Constant::undef(Type::pointer(sig));
        let call = Inst::call(callee.clone(), vec![Arg::new(Constant::i32(1))]).unwrap();
        assert_eq!(call.typ(), Some(Type::i32()));

        let err = Inst::call(callee.clone(), vec![]).unwrap_err();
        assert_eq!(err.to_string(), "call argument count mismatch, expected 1, got 0");
        let err = Inst::call(callee, vec![Arg::new(Constant::i64(1))]).unwrap_err();
        assert_eq!(err.to_string(), "call argument 0 type mismatch, expected i32, got i64");

        let printf = Type::func(Type::void(), vec![Type::pointer(Type::i8())], true);
        let callee = Constant::undef(Type::pointer(printf));
        let call = Inst::call(
            callee,
            vec![
                Arg::new(Constant::null(Type::pointer(Type::i8())).unwrap()),
                Arg::new(Constant::i32(3)),
            ],
        )
        .unwrap();
        assert!(call.result().is_none());
        assert_eq!(call.to_string(), "call void (i8*, ...) undef(i8* null, i32 3)");
    }

    #[test]
    fn test_with_result_checks_type() {
        let inst = Inst::freeze(Constant::i32(1)).unwrap();
        assert!(inst.clone().with_result(Local::named("x", Type::i64())).is_err());
        let inst = inst.with_result(Local::named("x", Type::i32())).unwrap();
        assert_eq!(inst.to_string(), "%x = freeze i32 1");

        let fence = Inst::fence(Atomic::new(AtomicOrdering::SeqCst));
        assert!(fence.with_result(Local::named("y", Type::i32())).is_err());
    }

    #[test]
    fn test_phi_and_metadata() {
        let entry = Local::named("entry", Type::label());
        let mut phi = Inst::phi(
            Type::i32(),
            vec![Incoming {
                x: Constant::i32(0).into(),
                pred: entry,
            }],
        )
        .unwrap()
        .named("i");
        phi.metadata.push(MetadataAttachment::new("dbg", Metadata::Ref(4)));
        assert_eq!(phi.to_string(), "%i = phi i32 [ 0, %entry ], !dbg !4");
    }

    #[test]
    fn test_atomics() {
        let p = ptr_local("p", Type::i32());
        let rmw = Inst::atomic_rmw(AtomicOp::Add, &p, Constant::i32(1), Atomic::new(AtomicOrdering::Monotonic))
            .unwrap()
            .named("old");
        assert_eq!(rmw.to_string(), "%old = atomicrmw add i32* %p, i32 1 monotonic");

        let cx = Inst::cmpxchg(
            &p,
            Constant::i32(0),
            Constant::i32(1),
            AtomicOrdering::AcqRel,
            AtomicOrdering::Acquire,
        )
        .unwrap()
        .named("r");
        assert_eq!(cx.typ().unwrap().to_string(), "{ i32, i1 }");
        assert_eq!(cx.to_string(), "%r = cmpxchg i32* %p, i32 0, i32 1 acq_rel acquire");
    }
}
