//! Instructions

use super::local::FuncScope;
use super::metadata::{attachments, attributes, ValueResolver};
use super::{keyword, keywords, optional_keyword, Result, TypeTable};
use crate::ast::{AtomicNode, CallNode, ConstNode, InstKindNode, InstNode, TypedValue, ValueNode};
use lir_ir::gep::{self, GepIndex};
use lir_ir::{
    AddrSpace, Arg, Atomic, CallSite, Constant, ContractViolation, Incoming, Inst, InstKind, Local,
    Type, Value,
};

pub(crate) fn opcode(kind: &InstKindNode) -> &'static str {
    match kind {
        InstKindNode::FNeg { .. } => "fneg",
        InstKindNode::Binary { .. } => "binary operation",
        InstKindNode::ExtractElement { .. } => "extractelement",
        InstKindNode::InsertElement { .. } => "insertelement",
        InstKindNode::ShuffleVector { .. } => "shufflevector",
        InstKindNode::ExtractValue { .. } => "extractvalue",
        InstKindNode::InsertValue { .. } => "insertvalue",
        InstKindNode::Alloca { .. } => "alloca",
        InstKindNode::Load { .. } => "load",
        InstKindNode::Store { .. } => "store",
        InstKindNode::Fence { .. } => "fence",
        InstKindNode::CmpXchg { .. } => "cmpxchg",
        InstKindNode::AtomicRmw { .. } => "atomicrmw",
        InstKindNode::GetElementPtr { .. } => "getelementptr",
        InstKindNode::Cast { .. } => "cast",
        InstKindNode::ICmp { .. } => "icmp",
        InstKindNode::FCmp { .. } => "fcmp",
        InstKindNode::Phi { .. } => "phi",
        InstKindNode::Select { .. } => "select",
        InstKindNode::Freeze { .. } => "freeze",
        InstKindNode::Call { .. } => "call",
        InstKindNode::VaArg { .. } => "va_arg",
    }
}

/// Signature of a call site: the written type when it is a function type,
/// otherwise a non-variadic signature built from the return type and the
/// argument types
pub(crate) fn call_sig(types: &TypeTable, call: &CallNode) -> Result<Type> {
    let typ = types.typ(&call.typ)?;
    if typ.is_func() {
        return Ok(typ);
    }
    let params = call
        .args
        .iter()
        .map(|arg| types.typ(&arg.value.typ))
        .collect::<Result<Vec<_>>>()?;
    Ok(Type::func(typ, params, false))
}

/// Return type of a call site, `None` for void
pub(crate) fn call_result_type(types: &TypeTable, call: &CallNode) -> Result<Option<Type>> {
    let sig = call_sig(types, call)?;
    Ok(sig.func_type().map(|ft| ft.ret.clone()).filter(|t| !t.is_void()))
}

/// What a getelementptr index contributes to the result type, as far as
/// the syntax tells
fn gep_index(types: &TypeTable, index: &TypedValue) -> Result<GepIndex> {
    let typ = types.typ(&index.typ)?;
    let vector_len = typ.vector_shape().map(|(len, _)| len);
    let value = match &index.value {
        ValueNode::Const(ConstNode::Int(v)) => i64::try_from(*v).ok(),
        ValueNode::Const(ConstNode::Vector(elems)) => {
            let mut values = elems.iter().map(|e| match e.value {
                ConstNode::Int(v) => i64::try_from(v).ok(),
                _ => None,
            });
            let first = values.next().flatten();
            // Only a splat has a single constant value.
            if values.all(|v| v == first) {
                first
            } else {
                None
            }
        }
        _ => None,
    };
    Ok(GepIndex { value, vector_len })
}

fn vector_elem(inst: &'static str, typ: &Type) -> Result<Type> {
    match (typ.vector_shape(), typ.elem()) {
        (Some(_), Some(elem)) => Ok(elem.clone()),
        _ => Err(ContractViolation::InvalidOperand {
            inst,
            expected: "vector",
            got: typ.clone(),
        }
        .into()),
    }
}

/// Result type of an instruction computed from its syntax alone, before
/// any operand is resolved; `None` for instructions without a value
pub(crate) fn result_type(types: &TypeTable, kind: &InstKindNode) -> Result<Option<Type>> {
    let typ = match kind {
        InstKindNode::FNeg { x, .. }
        | InstKindNode::Binary { x, .. }
        | InstKindNode::InsertElement { x, .. }
        | InstKindNode::InsertValue { x, .. }
        | InstKindNode::Select { x, .. }
        | InstKindNode::Freeze { x }
        | InstKindNode::AtomicRmw { x, .. } => types.typ(&x.typ)?,
        InstKindNode::ExtractElement { x, .. } => {
            vector_elem("extractelement", &types.typ(&x.typ)?)?
        }
        InstKindNode::ShuffleVector { x, mask, .. } => {
            let elem = vector_elem("shufflevector", &types.typ(&x.typ)?)?;
            match types.typ(&mask.typ)?.vector_shape() {
                Some((len, true)) => Type::scalable_vector(len, elem),
                Some((len, false)) => Type::vector(len, elem),
                None => {
                    return Err(ContractViolation::InvalidOperand {
                        inst: "shufflevector",
                        expected: "vector mask",
                        got: types.typ(&mask.typ)?,
                    }
                    .into())
                }
            }
        }
        InstKindNode::ExtractValue { x, indices } => {
            gep::aggregate_elem_type("extractvalue", &types.typ(&x.typ)?, indices)?
        }
        InstKindNode::Alloca {
            elem_type,
            addr_space,
            ..
        } => Type::pointer_in(types.typ(elem_type)?, AddrSpace(*addr_space)),
        InstKindNode::Load { elem_type, .. } => types.typ(elem_type)?,
        InstKindNode::Store { .. } | InstKindNode::Fence { .. } => return Ok(None),
        InstKindNode::CmpXchg { cmp, .. } => {
            Type::struct_of(vec![types.typ(&cmp.typ)?, Type::i1()])
        }
        InstKindNode::GetElementPtr {
            elem_type,
            src,
            indices,
            ..
        } => {
            let indices = indices
                .iter()
                .map(|index| gep_index(types, index))
                .collect::<Result<Vec<_>>>()?;
            gep::result_type(&types.typ(elem_type)?, &types.typ(&src.typ)?, &indices)?
        }
        InstKindNode::Cast { to, .. } => types.typ(to)?,
        InstKindNode::ICmp { x, .. } | InstKindNode::FCmp { x, .. } => {
            types.typ(&x.typ)?.with_scalar(Type::i1())
        }
        InstKindNode::Phi { typ, .. } => types.typ(typ)?,
        InstKindNode::Call { call, .. } => return call_result_type(types, call),
        InstKindNode::VaArg { arg_type, .. } => types.typ(arg_type)?,
    };
    Ok(Some(typ).filter(|t| !t.is_void()))
}

fn atomic(node: &AtomicNode) -> Result<Atomic> {
    Ok(Atomic {
        ordering: keyword(&node.ordering)?,
        sync_scope: node.sync_scope.clone(),
    })
}

impl FuncScope<'_> {
    /// Callee and arguments of a call site
    pub(crate) fn call_operands(&self, call: &CallNode) -> Result<(Value, Vec<Arg>)> {
        let sig = call_sig(self.types(), call)?;
        let callee = match &call.callee {
            // Functions in a non-default address space keep their own
            // pointer type.
            ValueNode::Const(ConstNode::Global(ident)) => {
                Value::Const(Constant::Global(self.globals().symbol(ident)?))
            }
            other => self.value_of(&Type::pointer(sig), other)?,
        };
        let args = call
            .args
            .iter()
            .map(|arg| {
                Ok(Arg {
                    value: self.value(&arg.value)?,
                    attrs: attributes(self.types(), &arg.attrs)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((callee, args))
    }

    /// Calling convention and attributes written around a call site
    pub(crate) fn decorate_call_site(&self, site: &mut CallSite, call: &CallNode) -> Result<()> {
        site.cc = optional_keyword(&call.calling_conv)?;
        site.ret_attrs = attributes(self.types(), &call.ret_attrs)?;
        site.func_attrs = attributes(self.types(), &call.func_attrs)?;
        Ok(())
    }

    /// Build one instruction; `result` is the local bound for it by the
    /// first pass
    pub(crate) fn inst(&self, node: &InstNode, result: Option<Local>) -> Result<Inst> {
        let mut inst = match &node.kind {
            InstKindNode::FNeg { flags, x } => {
                Inst::fneg(self.value(x)?)?.with_flags(keywords(flags)?)
            }
            InstKindNode::Binary { op, flags, x, y } => {
                let x = self.value(x)?;
                let y = self.value_of(&x.typ(), y)?;
                Inst::binary(keyword(op)?, x, y)?.with_flags(keywords(flags)?)
            }
            InstKindNode::ExtractElement { x, index } => {
                Inst::extract_element(self.value(x)?, self.value(index)?)?
            }
            InstKindNode::InsertElement { x, elem, index } => {
                Inst::insert_element(self.value(x)?, self.value(elem)?, self.value(index)?)?
            }
            InstKindNode::ShuffleVector { x, y, mask } => {
                Inst::shuffle_vector(self.value(x)?, self.value(y)?, self.value(mask)?)?
            }
            InstKindNode::ExtractValue { x, indices } => {
                Inst::extract_value(self.value(x)?, indices.clone())?
            }
            InstKindNode::InsertValue { x, elem, indices } => {
                Inst::insert_value(self.value(x)?, self.value(elem)?, indices.clone())?
            }
            InstKindNode::Alloca {
                elem_type,
                count,
                align,
                addr_space,
                in_alloca,
                swift_error,
            } => {
                let count = count.as_ref().map(|c| self.value(c)).transpose()?;
                let elem_type = self.types().typ(elem_type)?;
                let mut inst = Inst::alloca_in(elem_type, count, AddrSpace(*addr_space))?;
                if let InstKind::Alloca {
                    align: a,
                    in_alloca: i,
                    swift_error: s,
                    ..
                } = &mut inst.kind
                {
                    *a = *align;
                    *i = *in_alloca;
                    *s = *swift_error;
                }
                inst
            }
            InstKindNode::Load {
                elem_type,
                src,
                volatile,
                atomic: ordering,
                align,
            } => {
                let mut inst = Inst::load(self.types().typ(elem_type)?, self.value(src)?)?;
                if let InstKind::Load {
                    volatile: v,
                    atomic: a,
                    align: al,
                    ..
                } = &mut inst.kind
                {
                    *v = *volatile;
                    *a = ordering.as_ref().map(atomic).transpose()?;
                    *al = *align;
                }
                inst
            }
            InstKindNode::Store {
                src,
                dst,
                volatile,
                atomic: ordering,
                align,
            } => {
                let mut inst = Inst::store(self.value(src)?, self.value(dst)?)?;
                if let InstKind::Store {
                    volatile: v,
                    atomic: a,
                    align: al,
                    ..
                } = &mut inst.kind
                {
                    *v = *volatile;
                    *a = ordering.as_ref().map(atomic).transpose()?;
                    *al = *align;
                }
                inst
            }
            InstKindNode::Fence { atomic: ordering } => Inst::fence(atomic(ordering)?),
            InstKindNode::CmpXchg {
                ptr,
                cmp,
                new,
                success,
                failure,
                sync_scope,
                weak,
                volatile,
            } => {
                let mut inst = Inst::cmpxchg(
                    self.value(ptr)?,
                    self.value(cmp)?,
                    self.value(new)?,
                    keyword(success)?,
                    keyword(failure)?,
                )?;
                if let InstKind::CmpXchg {
                    sync_scope: s,
                    weak: w,
                    volatile: v,
                    ..
                } = &mut inst.kind
                {
                    *s = sync_scope.clone();
                    *w = *weak;
                    *v = *volatile;
                }
                inst
            }
            InstKindNode::AtomicRmw {
                op,
                dst,
                x,
                atomic: ordering,
                volatile,
            } => {
                let mut inst = Inst::atomic_rmw(
                    keyword(op)?,
                    self.value(dst)?,
                    self.value(x)?,
                    atomic(ordering)?,
                )?;
                if let InstKind::AtomicRmw { volatile: v, .. } = &mut inst.kind {
                    *v = *volatile;
                }
                inst
            }
            InstKindNode::GetElementPtr {
                in_bounds,
                elem_type,
                src,
                indices,
            } => {
                let indices = indices
                    .iter()
                    .map(|index| self.value(index))
                    .collect::<Result<Vec<_>>>()?;
                let elem_type = self.types().typ(elem_type)?;
                let mut inst = Inst::get_element_ptr(elem_type, self.value(src)?, indices)?;
                if let InstKind::GetElementPtr { in_bounds: b, .. } = &mut inst.kind {
                    *b = *in_bounds;
                }
                inst
            }
            InstKindNode::Cast { op, from, to } => {
                Inst::cast(keyword(op)?, self.value(from)?, self.types().typ(to)?)?
            }
            InstKindNode::ICmp { pred, x, y } => {
                let x = self.value(x)?;
                let y = self.value_of(&x.typ(), y)?;
                Inst::icmp(keyword(pred)?, x, y)?
            }
            InstKindNode::FCmp { pred, flags, x, y } => {
                let x = self.value(x)?;
                let y = self.value_of(&x.typ(), y)?;
                Inst::fcmp(keyword(pred)?, x, y)?.with_flags(keywords(flags)?)
            }
            InstKindNode::Phi { typ, incs } => {
                let typ = self.types().typ(typ)?;
                let incs = incs
                    .iter()
                    .map(|inc| {
                        Ok(Incoming {
                            x: self.value_of(&typ, &inc.x)?,
                            pred: self.label(&inc.pred)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Inst::phi(typ, incs)?
            }
            InstKindNode::Select { cond, x, y } => {
                Inst::select(self.value(cond)?, self.value(x)?, self.value(y)?)?
            }
            InstKindNode::Freeze { x } => Inst::freeze(self.value(x)?)?,
            InstKindNode::Call { tail, flags, call } => {
                let (callee, args) = self.call_operands(call)?;
                let mut inst = Inst::call(callee, args)?.with_flags(keywords(flags)?);
                if let InstKind::Call { tail: t, site, .. } = &mut inst.kind {
                    *t = optional_keyword(tail)?;
                    self.decorate_call_site(site, call)?;
                }
                inst
            }
            InstKindNode::VaArg { list, arg_type } => {
                Inst::va_arg(self.value(list)?, self.types().typ(arg_type)?)?
            }
        };
        inst.metadata = attachments(self, &node.metadata)?;
        match result {
            Some(local) => Ok(inst.with_result(local)?),
            None => Ok(inst),
        }
    }
}
