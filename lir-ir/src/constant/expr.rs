//! Constant expressions
//!
//! Every constructor runs the same operand rules as the matching
//! instruction and stores the result type it derived.

use super::{Constant, Result};
use crate::check;
use crate::enums::{fmt_flags, BinaryOp, CastOp, FPred, IPred, OpFlag};
use crate::types::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    FNeg {
        x: Constant,
    },
    Binary {
        op: BinaryOp,
        flags: Vec<OpFlag>,
        x: Constant,
        y: Constant,
    },
    ExtractElement {
        x: Constant,
        index: Constant,
    },
    InsertElement {
        x: Constant,
        elem: Constant,
        index: Constant,
    },
    ShuffleVector {
        x: Constant,
        y: Constant,
        mask: Constant,
    },
    ExtractValue {
        x: Constant,
        indices: Vec<u64>,
    },
    InsertValue {
        x: Constant,
        elem: Constant,
        indices: Vec<u64>,
    },
    GetElementPtr {
        in_bounds: bool,
        elem_type: Type,
        src: Constant,
        indices: Vec<Constant>,
    },
    Cast {
        op: CastOp,
        from: Constant,
        to: Type,
    },
    ICmp {
        pred: IPred,
        x: Constant,
        y: Constant,
    },
    FCmp {
        pred: FPred,
        x: Constant,
        y: Constant,
    },
    Select {
        cond: Constant,
        x: Constant,
        y: Constant,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    kind: ExprKind,
    typ: Type,
}

impl Expr {
    fn build(kind: ExprKind, typ: Type) -> Result<Constant> {
        Ok(Constant::Expr(Box::new(Expr { kind, typ })))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn typ(&self) -> &Type {
        &self.typ
    }

    pub fn fneg(x: Constant) -> Result<Constant> {
        let typ = x.typ();
        check::fneg(&typ)?;
        Self::build(ExprKind::FNeg { x }, typ)
    }

    pub fn binary(op: BinaryOp, x: Constant, y: Constant) -> Result<Constant> {
        Self::binary_with_flags(op, Vec::new(), x, y)
    }

    pub fn binary_with_flags(
        op: BinaryOp,
        flags: Vec<OpFlag>,
        x: Constant,
        y: Constant,
    ) -> Result<Constant> {
        let typ = x.typ();
        check::binary(op, &typ, &y.typ())?;
        Self::build(ExprKind::Binary { op, flags, x, y }, typ)
    }

    pub fn extract_element(x: Constant, index: Constant) -> Result<Constant> {
        let typ = check::extract_element(&x.typ(), &index.typ())?;
        Self::build(ExprKind::ExtractElement { x, index }, typ)
    }

    pub fn insert_element(x: Constant, elem: Constant, index: Constant) -> Result<Constant> {
        let typ = x.typ();
        check::insert_element(&typ, &elem.typ(), &index.typ())?;
        Self::build(ExprKind::InsertElement { x, elem, index }, typ)
    }

    pub fn shuffle_vector(x: Constant, y: Constant, mask: Constant) -> Result<Constant> {
        let typ = check::shuffle_vector(&x.typ(), &y.typ(), &mask.typ())?;
        Self::build(ExprKind::ShuffleVector { x, y, mask }, typ)
    }

    pub fn extract_value(x: Constant, indices: Vec<u64>) -> Result<Constant> {
        let typ = check::extract_value(&x.typ(), &indices)?;
        Self::build(ExprKind::ExtractValue { x, indices }, typ)
    }

    pub fn insert_value(x: Constant, elem: Constant, indices: Vec<u64>) -> Result<Constant> {
        let typ = x.typ();
        check::insert_value(&typ, &elem.typ(), &indices)?;
        Self::build(ExprKind::InsertValue { x, elem, indices }, typ)
    }

    pub fn get_element_ptr(
        elem_type: Type,
        src: Constant,
        indices: Vec<Constant>,
        in_bounds: bool,
    ) -> Result<Constant> {
        let index_types: Vec<Type> = indices.iter().map(Constant::typ).collect();
        let gep_indices: Vec<_> = indices.iter().map(Constant::gep_index).collect();
        let typ = check::get_element_ptr(&elem_type, &src.typ(), &index_types, &gep_indices)?;
        Self::build(
            ExprKind::GetElementPtr {
                in_bounds,
                elem_type,
                src,
                indices,
            },
            typ,
        )
    }

    pub fn cast(op: CastOp, from: Constant, to: Type) -> Result<Constant> {
        check::cast(op, &from.typ(), &to)?;
        let typ = to.clone();
        Self::build(ExprKind::Cast { op, from, to }, typ)
    }

    pub fn icmp(pred: IPred, x: Constant, y: Constant) -> Result<Constant> {
        let typ = check::icmp(&x.typ(), &y.typ())?;
        Self::build(ExprKind::ICmp { pred, x, y }, typ)
    }

    pub fn fcmp(pred: FPred, x: Constant, y: Constant) -> Result<Constant> {
        let typ = check::fcmp(&x.typ(), &y.typ())?;
        Self::build(ExprKind::FCmp { pred, x, y }, typ)
    }

    pub fn select(cond: Constant, x: Constant, y: Constant) -> Result<Constant> {
        let typ = x.typ();
        check::select(&cond.typ(), &typ, &y.typ())?;
        Self::build(ExprKind::Select { cond, x, y }, typ)
    }
}

fn fmt_indices(f: &mut fmt::Formatter<'_>, indices: &[u64]) -> fmt::Result {
    for index in indices {
        write!(f, ", {}", index)?;
    }
    Ok(())
}

/// Expression text, e.g. `getelementptr inbounds (i8, i8* @x, i64 1)`
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::FNeg { x } => write!(f, "fneg ({})", x),
            ExprKind::Binary { op, flags, x, y } => {
                write!(f, "{}", op)?;
                fmt_flags(f, flags)?;
                write!(f, " ({}, {})", x, y)
            }
            ExprKind::ExtractElement { x, index } => {
                write!(f, "extractelement ({}, {})", x, index)
            }
            ExprKind::InsertElement { x, elem, index } => {
                write!(f, "insertelement ({}, {}, {})", x, elem, index)
            }
            ExprKind::ShuffleVector { x, y, mask } => {
                write!(f, "shufflevector ({}, {}, {})", x, y, mask)
            }
            ExprKind::ExtractValue { x, indices } => {
                write!(f, "extractvalue ({}", x)?;
                fmt_indices(f, indices)?;
                f.write_str(")")
            }
            ExprKind::InsertValue { x, elem, indices } => {
                write!(f, "insertvalue ({}, {}", x, elem)?;
                fmt_indices(f, indices)?;
                f.write_str(")")
            }
            ExprKind::GetElementPtr {
                in_bounds,
                elem_type,
                src,
                indices,
            } => {
                f.write_str("getelementptr")?;
                if *in_bounds {
                    f.write_str(" inbounds")?;
                }
                write!(f, " ({}, {}", elem_type, src)?;
                for index in indices {
                    write!(f, ", {}", index)?;
                }
                f.write_str(")")
            }
            ExprKind::Cast { op, from, to } => write!(f, "{} ({} to {})", op, from, to),
            ExprKind::ICmp { pred, x, y } => write!(f, "icmp {} ({}, {})", pred, x, y),
            ExprKind::FCmp { pred, x, y } => write!(f, "fcmp {} ({}, {})", pred, x, y),
            ExprKind::Select { cond, x, y } => write!(f, "select ({}, {}, {})", cond, x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Symbol;
    use crate::module::{GlobalId, SymbolId};
    use crate::GlobalRef;

    fn global(name: &str, content: Type) -> Constant {
        Constant::Global(GlobalRef::new(
            SymbolId::Global(GlobalId::new(0)),
            Symbol::new(name.into()),
            Type::pointer(content),
        ))
    }

    #[test]
    fn test_gep_expr() {
        let arr = Type::array(4, Type::i8());
        let c = Expr::get_element_ptr(
            arr.clone(),
            global("buf", arr),
            vec![Constant::i64(0), Constant::i64(2)],
            true,
        )
        .unwrap();
        assert_eq!(
            c.to_string(),
            "i8* getelementptr inbounds ([4 x i8], [4 x i8]* @buf, i64 0, i64 2)"
        );
    }

    #[test]
    fn test_gep_expr_elem_mismatch() {
        let err = Expr::get_element_ptr(Type::i32(), global("x", Type::i8()), vec![Constant::i64(0)], false)
            .unwrap_err();
        assert_eq!(err.to_string(), "getelementptr elem type mismatch, expected i8, got i32");
    }

    #[test]
    fn test_cast_and_binary_expr() {
        let p = Expr::cast(CastOp::PtrToInt, global("x", Type::i8()), Type::i64()).unwrap();
        assert_eq!(p.to_string(), "i64 ptrtoint (i8* @x to i64)");
        let sum = Expr::binary_with_flags(BinaryOp::Add, vec![OpFlag::Nsw], p, Constant::i64(1)).unwrap();
        assert_eq!(
            sum.ident(),
            "add nsw (i64 ptrtoint (i8* @x to i64), i64 1)"
        );
        assert!(Expr::binary(BinaryOp::Add, Constant::i32(1), Constant::i64(1)).is_err());
    }

    #[test]
    fn test_aggregate_exprs() {
        let agg = Constant::undef(Type::struct_of(vec![Type::i32(), Type::i64()]));
        let c = Expr::insert_value(agg.clone(), Constant::i64(1), vec![1]).unwrap();
        assert_eq!(c.typ(), agg.typ());
        let err = Expr::insert_value(agg.clone(), Constant::i32(1), vec![1]).unwrap_err();
        assert_eq!(err.to_string(), "insertvalue elem type mismatch, expected i64, got i32");
        let e = Expr::extract_value(agg, vec![0]).unwrap();
        assert_eq!(e.to_string(), "i32 extractvalue ({ i32, i64 } undef, 0)");
    }

    #[test]
    fn test_compare_select_expr() {
        let cmp = Expr::icmp(IPred::Eq, Constant::i32(1), Constant::i32(2)).unwrap();
        assert_eq!(cmp.to_string(), "i1 icmp eq (i32 1, i32 2)");
        let sel = Expr::select(cmp, Constant::i8(1), Constant::i8(2)).unwrap();
        assert_eq!(sel.typ(), Type::i8());
    }
}
