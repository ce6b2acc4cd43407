//! Constants and constant expressions

use super::{keyword, keywords, GlobalScope, Result};
use crate::ast::{ConstNode, ExprNode, TypedConst};
use crate::error::TranslationError;
use lir_ir::{BlockAddress, Constant, ContractViolation, Expr, Type};

/// Fails unless the written type equals the type of what was built
pub(crate) fn expect_type(what: &'static str, expected: &Type, got: &Type) -> Result<()> {
    if expected != got {
        return Err(TranslationError::TypeMismatch {
            what,
            expected: expected.clone(),
            got: got.clone(),
        });
    }
    Ok(())
}

impl GlobalScope {
    pub(crate) fn typed_const(&self, tc: &TypedConst) -> Result<Constant> {
        let typ = self.types.typ(&tc.typ)?;
        self.constant(&typ, &tc.value)
    }

    fn typed_consts(&self, tcs: &[TypedConst]) -> Result<Vec<Constant>> {
        tcs.iter().map(|tc| self.typed_const(tc)).collect()
    }

    /// Constant of the written type `typ`
    pub(crate) fn constant(&self, typ: &Type, node: &ConstNode) -> Result<Constant> {
        let c = match node {
            ConstNode::Int(value) => Constant::int(typ.clone(), *value)?,
            ConstNode::Bool(value) => {
                expect_type("boolean constant", typ, &Type::i1())?;
                Constant::bool(*value)
            }
            ConstNode::Float(value) => Constant::float(typ.clone(), *value)?,
            ConstNode::Null => Constant::null(typ.clone())?,
            ConstNode::None => {
                expect_type("none constant", typ, &Type::token())?;
                Constant::NoneToken
            }
            ConstNode::Undef => Constant::undef(typ.clone()),
            ConstNode::Poison => Constant::poison(typ.clone()),
            ConstNode::ZeroInitializer => Constant::zero(typ.clone()),
            ConstNode::Struct { fields, packed } => {
                if typ.is_struct() && typ.is_packed() != *packed {
                    return Err(ContractViolation::InvalidConstant {
                        what: if *packed { "packed struct" } else { "struct" },
                        typ: typ.clone(),
                    }
                    .into());
                }
                Constant::struct_with_type(typ.clone(), self.typed_consts(fields)?)?
            }
            ConstNode::Array(elems) => {
                let elem_type = typ
                    .elem()
                    .filter(|_| typ.is_array())
                    .cloned()
                    .ok_or_else(|| ContractViolation::InvalidConstant {
                        what: "array",
                        typ: typ.clone(),
                    })?;
                let c = Constant::array(elem_type, self.typed_consts(elems)?)?;
                expect_type("array constant", typ, &c.typ())?;
                c
            }
            ConstNode::CharArray(data) => {
                let c = Constant::char_array(data.clone());
                expect_type("character array", typ, &c.typ())?;
                c
            }
            ConstNode::Vector(elems) => {
                let c = Constant::vector(self.typed_consts(elems)?)?;
                expect_type("vector constant", typ, &c.typ())?;
                c
            }
            ConstNode::BlockAddress { func, block } => {
                // The block is attached once the function body exists.
                let addr = BlockAddress::pending(self.symbol(func)?, Some(block.clone()));
                self.defer_block_address(addr.clone());
                let c = Constant::BlockAddress(addr);
                expect_type("blockaddress", typ, &c.typ())?;
                c
            }
            ConstNode::Global(ident) => {
                let c = Constant::Global(self.symbol(ident)?);
                expect_type("global", typ, &c.typ())?;
                c
            }
            ConstNode::Expr(expr) => {
                let c = self.expr(expr)?;
                expect_type("constant expression", typ, &c.typ())?;
                c
            }
        };
        Ok(c)
    }

    pub(crate) fn expr(&self, node: &ExprNode) -> Result<Constant> {
        let c = match node {
            ExprNode::FNeg { x } => Expr::fneg(self.typed_const(x)?)?,
            ExprNode::Binary { op, flags, x, y } => Expr::binary_with_flags(
                keyword(op)?,
                keywords(flags)?,
                self.typed_const(x)?,
                self.typed_const(y)?,
            )?,
            ExprNode::ExtractElement { x, index } => {
                Expr::extract_element(self.typed_const(x)?, self.typed_const(index)?)?
            }
            ExprNode::InsertElement { x, elem, index } => Expr::insert_element(
                self.typed_const(x)?,
                self.typed_const(elem)?,
                self.typed_const(index)?,
            )?,
            ExprNode::ShuffleVector { x, y, mask } => Expr::shuffle_vector(
                self.typed_const(x)?,
                self.typed_const(y)?,
                self.typed_const(mask)?,
            )?,
            ExprNode::ExtractValue { x, indices } => {
                Expr::extract_value(self.typed_const(x)?, indices.clone())?
            }
            ExprNode::InsertValue { x, elem, indices } => Expr::insert_value(
                self.typed_const(x)?,
                self.typed_const(elem)?,
                indices.clone(),
            )?,
            ExprNode::GetElementPtr {
                in_bounds,
                elem_type,
                src,
                indices,
            } => Expr::get_element_ptr(
                self.types.typ(elem_type)?,
                self.typed_const(src)?,
                self.typed_consts(indices)?,
                *in_bounds,
            )?,
            ExprNode::Cast { op, from, to } => {
                Expr::cast(keyword(op)?, self.typed_const(from)?, self.types.typ(to)?)?
            }
            ExprNode::ICmp { pred, x, y } => {
                Expr::icmp(keyword(pred)?, self.typed_const(x)?, self.typed_const(y)?)?
            }
            ExprNode::FCmp { pred, x, y } => {
                Expr::fcmp(keyword(pred)?, self.typed_const(x)?, self.typed_const(y)?)?
            }
            ExprNode::Select { cond, x, y } => Expr::select(
                self.typed_const(cond)?,
                self.typed_const(x)?,
                self.typed_const(y)?,
            )?,
        };
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeNode;
    use crate::generator::TypeTable;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn scope() -> GlobalScope {
        GlobalScope {
            types: TypeTable::default(),
            symbols: HashMap::new(),
            comdats: HashMap::new(),
            block_addrs: Mutex::new(Vec::new()),
        }
    }

    fn int(bits: u64, value: i128) -> TypedConst {
        TypedConst::new(TypeNode::int(bits), ConstNode::Int(value))
    }

    #[test]
    fn test_aggregates() {
        let scope = scope();
        let arr = TypeNode::Array {
            len: 2,
            elem: Box::new(TypeNode::int(32)),
        };
        let c = scope.typed_const(&TypedConst::new(arr, ConstNode::Array(vec![int(32, 1), int(32, 2)]))).unwrap();
        assert_eq!(c.to_string(), "[2 x i32] [i32 1, i32 2]");

        let short = TypeNode::Array {
            len: 3,
            elem: Box::new(TypeNode::int(32)),
        };
        let err = scope.typed_const(&TypedConst::new(short, ConstNode::Array(vec![int(32, 1)]))).unwrap_err();
        assert!(matches!(err, TranslationError::TypeMismatch { .. }), "{}", err);
    }

    #[test]
    fn test_expression_keywords() {
        let scope = scope();
        let add = ExprNode::Binary {
            op: "add".to_string(),
            flags: vec!["nsw".to_string()],
            x: int(32, 1),
            y: int(32, 2),
        };
        assert_eq!(scope.expr(&add).unwrap().to_string(), "i32 add nsw (i32 1, i32 2)");

        let bogus = ExprNode::Binary {
            op: "plus".to_string(),
            flags: Vec::new(),
            x: int(32, 1),
            y: int(32, 2),
        };
        assert!(matches!(scope.expr(&bogus), Err(TranslationError::InvalidKeyword(_))));
    }

    #[test]
    fn test_bool_requires_i1() {
        let scope = scope();
        assert!(scope.constant(&Type::i1(), &ConstNode::Bool(true)).is_ok());
        assert!(scope.constant(&Type::i8(), &ConstNode::Bool(true)).is_err());
    }

    #[test]
    fn test_unknown_global() {
        let err = scope()
            .constant(&Type::pointer(Type::i8()), &ConstNode::Global("nowhere".into()))
            .unwrap_err();
        assert_eq!(err.to_string(), "unable to locate global identifier @nowhere");
    }
}
