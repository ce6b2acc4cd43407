//! Static operand rules shared by instructions and constant expressions

use crate::enums::{BinaryOp, CastOp};
use crate::error::ContractViolation;
use crate::gep::{self, GepIndex};
use crate::types::Type;

type Result<T> = std::result::Result<T, ContractViolation>;

fn same_types(inst: &'static str, x: &Type, y: &Type) -> Result<()> {
    if x != y {
        return Err(ContractViolation::OperandMismatch {
            inst,
            x: x.clone(),
            y: y.clone(),
        });
    }
    Ok(())
}

fn invalid(inst: &'static str, expected: &'static str, got: &Type) -> ContractViolation {
    ContractViolation::InvalidOperand {
        inst,
        expected,
        got: got.clone(),
    }
}

pub(crate) fn fneg(x: &Type) -> Result<()> {
    if !x.is_float_or_float_vector() {
        return Err(invalid("fneg", "floating-point or floating-point vector", x));
    }
    Ok(())
}

pub(crate) fn binary(op: BinaryOp, x: &Type, y: &Type) -> Result<()> {
    let inst = op.as_str();
    same_types(inst, x, y)?;
    if op.is_float_op() {
        if !x.is_float_or_float_vector() {
            return Err(invalid(inst, "floating-point or floating-point vector", x));
        }
    } else if !x.is_int_or_int_vector() {
        return Err(invalid(inst, "integer or integer vector", x));
    }
    Ok(())
}

/// Result type of icmp: `i1`, or `<N x i1>` for vector operands
pub(crate) fn icmp(x: &Type, y: &Type) -> Result<Type> {
    same_types("icmp", x, y)?;
    if !x.is_int_or_int_vector() && !x.is_pointer_or_pointer_vector() {
        return Err(invalid("icmp", "integer, pointer or vector thereof", x));
    }
    Ok(x.with_scalar(Type::i1()))
}

pub(crate) fn fcmp(x: &Type, y: &Type) -> Result<Type> {
    same_types("fcmp", x, y)?;
    if !x.is_float_or_float_vector() {
        return Err(invalid("fcmp", "floating-point or floating-point vector", x));
    }
    Ok(x.with_scalar(Type::i1()))
}

pub(crate) fn select(cond: &Type, x: &Type, y: &Type) -> Result<()> {
    same_types("select", x, y)?;
    if !cond.scalar().is_bool() {
        return Err(invalid("select", "i1 or vector of i1 condition", cond));
    }
    if let Some(shape) = cond.vector_shape() {
        if x.vector_shape() != Some(shape) {
            return Err(ContractViolation::OperandMismatch {
                inst: "select",
                x: cond.clone(),
                y: x.clone(),
            });
        }
    }
    Ok(())
}

fn vector_elem<'a>(inst: &'static str, x: &'a Type) -> Result<&'a Type> {
    if !x.is_vector() {
        return Err(invalid(inst, "vector", x));
    }
    Ok(x.scalar())
}

fn int_index(inst: &'static str, index: &Type) -> Result<()> {
    if !index.is_int() {
        return Err(invalid(inst, "integer index", index));
    }
    Ok(())
}

pub(crate) fn extract_element(x: &Type, index: &Type) -> Result<Type> {
    let elem = vector_elem("extractelement", x)?;
    int_index("extractelement", index)?;
    Ok(elem.clone())
}

pub(crate) fn insert_element(x: &Type, elem: &Type, index: &Type) -> Result<()> {
    let expected = vector_elem("insertelement", x)?;
    if expected != elem {
        return Err(ContractViolation::ElemTypeMismatch {
            inst: "insertelement",
            expected: expected.clone(),
            got: elem.clone(),
        });
    }
    int_index("insertelement", index)
}

/// Result type of shufflevector: the mask's shape with `x`'s elements
pub(crate) fn shuffle_vector(x: &Type, y: &Type, mask: &Type) -> Result<Type> {
    let elem = vector_elem("shufflevector", x)?;
    same_types("shufflevector", x, y)?;
    if !mask.is_vector() || mask.scalar() != &Type::i32() {
        return Err(invalid("shufflevector", "vector of i32 mask", mask));
    }
    Ok(mask.with_scalar(elem.clone()))
}

pub(crate) fn extract_value(x: &Type, indices: &[u64]) -> Result<Type> {
    gep::aggregate_elem_type("extractvalue", x, indices)
}

pub(crate) fn insert_value(x: &Type, elem: &Type, indices: &[u64]) -> Result<()> {
    let expected = gep::aggregate_elem_type("insertvalue", x, indices)?;
    if &expected != elem {
        return Err(ContractViolation::ElemTypeMismatch {
            inst: "insertvalue",
            expected,
            got: elem.clone(),
        });
    }
    Ok(())
}

pub(crate) fn get_element_ptr(
    elem_type: &Type,
    src: &Type,
    index_types: &[Type],
    indices: &[GepIndex],
) -> Result<Type> {
    let pointee = src
        .scalar()
        .pointee()
        .ok_or_else(|| invalid("getelementptr", "pointer or vector of pointers", src))?;
    if pointee != elem_type {
        return Err(ContractViolation::ElemTypeMismatch {
            inst: "getelementptr",
            expected: pointee.clone(),
            got: elem_type.clone(),
        });
    }
    if let Some(bad) = index_types.iter().find(|t| !t.is_int_or_int_vector()) {
        return Err(invalid("getelementptr", "integer or integer vector index", bad));
    }
    gep::result_type(elem_type, src, indices)
}

pub(crate) fn cast(op: CastOp, from: &Type, to: &Type) -> Result<()> {
    if cast_is_valid(op, from, to) {
        Ok(())
    } else {
        Err(ContractViolation::InvalidCast {
            op,
            from: from.clone(),
            to: to.clone(),
        })
    }
}

fn cast_is_valid(op: CastOp, from: &Type, to: &Type) -> bool {
    let (fs, ts) = (from.scalar(), to.scalar());
    let same_shape = from.vector_shape() == to.vector_shape();
    let int_bits = |t: &Type| t.int_bits().unwrap_or(0);
    let float_bits = |t: &Type| t.float_kind().map(|k| k.bits()).unwrap_or(0);
    match op {
        CastOp::Trunc => same_shape && fs.is_int() && ts.is_int() && int_bits(fs) > int_bits(ts),
        CastOp::ZExt | CastOp::SExt => {
            same_shape && fs.is_int() && ts.is_int() && int_bits(fs) < int_bits(ts)
        }
        CastOp::FPTrunc => {
            same_shape && fs.is_float() && ts.is_float() && float_bits(fs) > float_bits(ts)
        }
        CastOp::FPExt => {
            same_shape && fs.is_float() && ts.is_float() && float_bits(fs) < float_bits(ts)
        }
        CastOp::FPToUI | CastOp::FPToSI => same_shape && fs.is_float() && ts.is_int(),
        CastOp::UIToFP | CastOp::SIToFP => same_shape && fs.is_int() && ts.is_float(),
        CastOp::PtrToInt => same_shape && fs.is_pointer() && ts.is_int(),
        CastOp::IntToPtr => same_shape && fs.is_int() && ts.is_pointer(),
        CastOp::BitCast => {
            if fs.is_pointer() || ts.is_pointer() {
                same_shape
                    && fs.is_pointer()
                    && ts.is_pointer()
                    && fs.addr_space() == ts.addr_space()
            } else {
                !from.is_aggregate()
                    && !to.is_aggregate()
                    && matches!(
                        (from.primitive_bits(), to.primitive_bits()),
                        (Some(a), Some(b)) if a == b
                    )
            }
        }
        CastOp::AddrSpaceCast => {
            same_shape && fs.is_pointer() && ts.is_pointer() && fs.addr_space() != ts.addr_space()
        }
    }
}
