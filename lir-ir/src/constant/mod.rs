//! Constants
//!
//! Constants are immutable values rendered as `type value` pairs. Their
//! type is known at construction except for aggregates built without an
//! explicit type, which infer it from their elements on first use and
//! keep it in a single-assignment cell.

mod expr;
mod float;

pub use expr::{Expr, ExprKind};

use crate::enc;
use crate::error::ContractViolation;
use crate::gep::GepIndex;
use crate::ident::{LocalIdent, Symbol};
use crate::module::SymbolId;
use crate::types::{FloatKind, Type};
use crate::value::Local;
use std::fmt::{self, Write};
use std::sync::{Arc, OnceLock};

type Result<T> = std::result::Result<T, ContractViolation>;

/// Address of a global entity (always pointer typed)
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalRef {
    pub id: SymbolId,
    symbol: Symbol,
    typ: Type,
}

impl GlobalRef {
    pub fn new(id: SymbolId, symbol: Symbol, typ: Type) -> Self {
        GlobalRef { id, symbol, typ }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn typ(&self) -> &Type {
        &self.typ
    }
}

#[derive(Debug)]
struct BlockTarget {
    written: Option<LocalIdent>,
    resolved: OnceLock<Local>,
}

/// `blockaddress(@f, %bb)`
///
/// The block may be resolved after the constant is built, once the body of
/// the referenced function has been translated.
#[derive(Debug, Clone)]
pub struct BlockAddress {
    pub func: GlobalRef,
    target: Arc<BlockTarget>,
}

impl BlockAddress {
    pub fn new(func: GlobalRef, block: &Local) -> Result<Self> {
        let addr = BlockAddress::pending(func, block.explicit_ident());
        addr.resolve(block.clone())?;
        Ok(addr)
    }

    /// Block address whose label is only known by its identifier
    pub fn pending(func: GlobalRef, block: Option<LocalIdent>) -> Self {
        BlockAddress {
            func,
            target: Arc::new(BlockTarget {
                written: block,
                resolved: OnceLock::new(),
            }),
        }
    }

    /// Identifier the label was referred to by
    pub fn written_ident(&self) -> Option<&LocalIdent> {
        self.target.written.as_ref()
    }

    pub fn block(&self) -> Option<&Local> {
        self.target.resolved.get()
    }

    /// Tie the address to its basic block; shared by every clone
    pub fn resolve(&self, block: Local) -> Result<()> {
        if !block.typ().is_label() {
            return Err(ContractViolation::InvalidOperand {
                inst: "blockaddress",
                expected: "label",
                got: block.typ().clone(),
            });
        }
        let _ = self.target.resolved.set(block);
        Ok(())
    }

    fn block_ident(&self) -> String {
        match (self.block(), self.written_ident()) {
            (Some(block), _) => block.ident_string(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => "%<badref>".to_string(),
        }
    }
}

impl PartialEq for BlockAddress {
    fn eq(&self, other: &BlockAddress) -> bool {
        self.func == other.func
            && (Arc::ptr_eq(&self.target, &other.target) || self.block_ident() == other.block_ident())
    }
}

/// `{ ... }`, `[ ... ]` or `< ... >` constant
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub elems: Vec<Constant>,
    packed: bool,
    typ: OnceLock<Type>,
}

impl Aggregate {
    fn inferred(elems: Vec<Constant>, packed: bool) -> Self {
        Aggregate {
            elems,
            packed,
            typ: OnceLock::new(),
        }
    }

    fn typed(elems: Vec<Constant>, typ: Type) -> Self {
        let packed = typ.is_packed();
        Aggregate {
            elems,
            packed,
            typ: OnceLock::from(typ),
        }
    }

    fn elem_types(&self) -> Vec<Type> {
        self.elems.iter().map(Constant::typ).collect()
    }

    fn fmt_elems(&self, out: &mut String) {
        for (i, elem) in self.elems.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}", elem);
        }
    }
}

impl PartialEq for Aggregate {
    fn eq(&self, other: &Aggregate) -> bool {
        self.packed == other.packed
            && self.elems == other.elems
            && (!self.elems.is_empty() || self.typ.get() == other.typ.get())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int { typ: Type, value: i128 },
    Float { typ: Type, value: f64 },
    Null(Type),
    /// `none` token
    NoneToken,
    Undef(Type),
    Poison(Type),
    Struct(Aggregate),
    Array(Aggregate),
    CharArray { typ: Type, data: Vec<u8> },
    Vector(Aggregate),
    ZeroInitializer(Type),
    BlockAddress(BlockAddress),
    Global(GlobalRef),
    Expr(Box<Expr>),
}

impl Constant {
    pub fn int(typ: Type, value: i128) -> Result<Self> {
        if !typ.is_int() {
            return Err(ContractViolation::InvalidConstant {
                what: "integer",
                typ,
            });
        }
        Ok(Constant::Int { typ, value })
    }

    pub fn bool(value: bool) -> Self {
        Constant::Int {
            typ: Type::i1(),
            value: value as i128,
        }
    }

    pub fn i8(value: i64) -> Self {
        Constant::Int {
            typ: Type::i8(),
            value: value.into(),
        }
    }

    pub fn i32(value: i64) -> Self {
        Constant::Int {
            typ: Type::i32(),
            value: value.into(),
        }
    }

    pub fn i64(value: i64) -> Self {
        Constant::Int {
            typ: Type::i64(),
            value: value.into(),
        }
    }

    /// `value` must be exactly representable in `typ`
    pub fn float(typ: Type, value: f64) -> Result<Self> {
        let Some(kind) = typ.float_kind() else {
            return Err(ContractViolation::InvalidConstant {
                what: "floating-point",
                typ,
            });
        };
        if !float::is_exact(kind, value) {
            return Err(ContractViolation::InexactFloat { value, typ });
        }
        Ok(Constant::Float { typ, value })
    }

    pub fn double(value: f64) -> Self {
        Constant::Float {
            typ: Type::double(),
            value,
        }
    }

    pub fn null(typ: Type) -> Result<Self> {
        if !typ.is_pointer() {
            return Err(ContractViolation::InvalidConstant { what: "null", typ });
        }
        Ok(Constant::Null(typ))
    }

    pub fn undef(typ: Type) -> Self {
        Constant::Undef(typ)
    }

    pub fn poison(typ: Type) -> Self {
        Constant::Poison(typ)
    }

    pub fn zero(typ: Type) -> Self {
        Constant::ZeroInitializer(typ)
    }

    /// Literal struct constant; its type is inferred from the fields
    pub fn struct_of(fields: Vec<Constant>) -> Self {
        Constant::Struct(Aggregate::inferred(fields, false))
    }

    pub fn packed_struct_of(fields: Vec<Constant>) -> Self {
        Constant::Struct(Aggregate::inferred(fields, true))
    }

    /// Struct constant of an explicit (possibly identified) struct type
    pub fn struct_with_type(typ: Type, fields: Vec<Constant>) -> Result<Self> {
        let expected = typ.struct_fields().ok_or_else(|| ContractViolation::InvalidConstant {
            what: "struct",
            typ: typ.clone(),
        })?;
        if expected.len() != fields.len() {
            return Err(ContractViolation::InvalidConstant {
                what: "struct",
                typ: typ.clone(),
            });
        }
        for (want, field) in expected.iter().zip(&fields) {
            let got = field.typ();
            if want != &got {
                return Err(ContractViolation::TypeMismatch {
                    what: "struct field",
                    expected: want.clone(),
                    got,
                });
            }
        }
        Ok(Constant::Struct(Aggregate::typed(fields, typ)))
    }

    /// Array constant with element type `elem_type`
    pub fn array(elem_type: Type, elems: Vec<Constant>) -> Result<Self> {
        check_elems("array element", &elem_type, &elems)?;
        let typ = Type::array(elems.len() as u64, elem_type);
        Ok(Constant::Array(Aggregate::typed(elems, typ)))
    }

    /// Array constant whose type is inferred from its (non-empty) elements
    pub fn array_of(elems: Vec<Constant>) -> Result<Self> {
        let first = elems.first().map(Constant::typ).ok_or_else(|| ContractViolation::InvalidConstant {
            what: "empty array without element type",
            typ: Type::array(0, Type::void()),
        })?;
        check_elems("array element", &first, &elems)?;
        Ok(Constant::Array(Aggregate::inferred(elems, false)))
    }

    /// `c"..."` constant of type `[N x i8]`
    pub fn char_array(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Constant::CharArray {
            typ: Type::array(data.len() as u64, Type::i8()),
            data,
        }
    }

    pub fn vector(elems: Vec<Constant>) -> Result<Self> {
        let first = elems.first().map(Constant::typ).ok_or_else(|| ContractViolation::InvalidConstant {
            what: "empty vector",
            typ: Type::vector(0, Type::void()),
        })?;
        if first.is_aggregate() || !first.is_first_class() {
            return Err(ContractViolation::InvalidConstant {
                what: "vector element",
                typ: first,
            });
        }
        check_elems("vector element", &first, &elems)?;
        Ok(Constant::Vector(Aggregate::inferred(elems, false)))
    }

    pub fn block_address(func: GlobalRef, block: &Local) -> Result<Self> {
        Ok(Constant::BlockAddress(BlockAddress::new(func, block)?))
    }

    pub fn typ(&self) -> Type {
        match self {
            Constant::Int { typ, .. }
            | Constant::Float { typ, .. }
            | Constant::Null(typ)
            | Constant::Undef(typ)
            | Constant::Poison(typ)
            | Constant::CharArray { typ, .. }
            | Constant::ZeroInitializer(typ) => typ.clone(),
            Constant::NoneToken => Type::token(),
            Constant::Struct(agg) => agg
                .typ
                .get_or_init(|| {
                    let fields = agg.elem_types();
                    if agg.packed {
                        Type::packed_struct_of(fields)
                    } else {
                        Type::struct_of(fields)
                    }
                })
                .clone(),
            Constant::Array(agg) => agg
                .typ
                .get_or_init(|| {
                    let elem = agg.elems.first().map(Constant::typ).unwrap_or_else(Type::void);
                    Type::array(agg.elems.len() as u64, elem)
                })
                .clone(),
            Constant::Vector(agg) => agg
                .typ
                .get_or_init(|| {
                    let elem = agg.elems.first().map(Constant::typ).unwrap_or_else(Type::void);
                    Type::vector(agg.elems.len() as u64, elem)
                })
                .clone(),
            Constant::BlockAddress(_) => Type::pointer(Type::i8()),
            Constant::Global(g) => g.typ.clone(),
            Constant::Expr(e) => e.typ().clone(),
        }
    }

    /// Value text without its type
    pub fn ident(&self) -> String {
        match self {
            Constant::Int { typ, value } => {
                if typ.is_bool() {
                    (if value & 1 == 1 { "true" } else { "false" }).to_string()
                } else {
                    value.to_string()
                }
            }
            Constant::Float { typ, value } => {
                float::format(typ.float_kind().unwrap_or(FloatKind::Double), *value)
            }
            Constant::Null(_) => "null".to_string(),
            Constant::NoneToken => "none".to_string(),
            Constant::Undef(_) => "undef".to_string(),
            Constant::Poison(_) => "poison".to_string(),
            Constant::ZeroInitializer(_) => "zeroinitializer".to_string(),
            Constant::Struct(agg) => {
                let mut out = String::new();
                if agg.packed {
                    out.push('<');
                }
                if agg.elems.is_empty() {
                    out.push_str("{}");
                } else {
                    out.push_str("{ ");
                    agg.fmt_elems(&mut out);
                    out.push_str(" }");
                }
                if agg.packed {
                    out.push('>');
                }
                out
            }
            Constant::Array(agg) => {
                let mut out = String::from("[");
                agg.fmt_elems(&mut out);
                out.push(']');
                out
            }
            Constant::CharArray { data, .. } => format!("c{}", enc::quote_bytes(data)),
            Constant::Vector(agg) => {
                let mut out = String::from("<");
                agg.fmt_elems(&mut out);
                out.push('>');
                out
            }
            Constant::BlockAddress(addr) => {
                format!("blockaddress({}, {})", addr.func.symbol, addr.block_ident())
            }
            Constant::Global(g) => g.symbol.to_string(),
            Constant::Expr(e) => e.to_string(),
        }
    }

    pub fn as_global(&self) -> Option<&GlobalRef> {
        match self {
            Constant::Global(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_expr(&self) -> bool {
        matches!(self, Constant::Expr(_))
    }

    /// Integer value, looking through splat vectors and zeroinitializer
    pub fn int_value(&self) -> Option<i128> {
        match self {
            Constant::Int { value, .. } => Some(*value),
            Constant::ZeroInitializer(t) if t.is_int_or_int_vector() => Some(0),
            Constant::Vector(agg) => {
                let first = agg.elems.first()?.int_value()?;
                agg.elems
                    .iter()
                    .all(|e| e.int_value() == Some(first))
                    .then_some(first)
            }
            _ => None,
        }
    }

    /// Index description used for getelementptr result types
    pub fn gep_index(&self) -> GepIndex {
        let typ = self.typ();
        GepIndex {
            value: self.int_value().and_then(|v| i64::try_from(v).ok()),
            vector_len: typ.vector_shape().map(|(len, _)| len),
        }
    }
}

fn check_elems(what: &'static str, expected: &Type, elems: &[Constant]) -> Result<()> {
    for elem in elems {
        let got = elem.typ();
        if &got != expected {
            return Err(ContractViolation::TypeMismatch {
                what,
                expected: expected.clone(),
                got,
            });
        }
    }
    Ok(())
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.typ(), self.ident())
    }
}

impl From<GlobalRef> for Constant {
    fn from(g: GlobalRef) -> Self {
        Constant::Global(g)
    }
}

impl From<Expr> for Constant {
    fn from(e: Expr) -> Self {
        Constant::Expr(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{GlobalId, SymbolId};

    fn global(name: &str, typ: Type) -> GlobalRef {
        GlobalRef::new(
            SymbolId::Global(GlobalId::new(0)),
            Symbol::new(name.into()),
            Type::pointer(typ),
        )
    }

    #[test]
    fn test_scalar_constants() {
        assert_eq!(Constant::i32(-5).to_string(), "i32 -5");
        assert_eq!(Constant::bool(true).to_string(), "i1 true");
        assert_eq!(Constant::double(1.5).to_string(), "double 1.5");
        assert_eq!(Constant::double(1e100).ident(), "1.0e100");
        assert_eq!(Constant::float(Type::float(), 0.5).unwrap().ident(), "0.5");
        assert_eq!(
            Constant::float(Type::float(), 0.1).unwrap_err().to_string(),
            "floating-point constant 0.1 is not exactly representable as float"
        );
        assert_eq!(Constant::float(Type::half(), 1.0).unwrap().to_string(), "half 0xH3C00");
        assert!(Constant::float(Type::half(), 0.1).is_err());
        assert_eq!(
            Constant::float(Type::float_of(FloatKind::Fp128), 0.1).unwrap().ident(),
            "0xLA0000000000000003FFB999999999999"
        );
        assert_eq!(Constant::null(Type::pointer(Type::i8())).unwrap().to_string(), "i8* null");
        assert!(Constant::null(Type::i8()).is_err());
        assert!(Constant::int(Type::float(), 1).is_err());
        assert_eq!(Constant::NoneToken.to_string(), "token none");
    }

    #[test]
    fn test_aggregates() {
        let s = Constant::struct_of(vec![Constant::i32(1), Constant::i64(2)]);
        assert_eq!(s.to_string(), "{ i32, i64 } { i32 1, i64 2 }");
        // Inference happens once and is stable.
        assert_eq!(s.typ(), s.typ());

        let a = Constant::array(Type::i8(), vec![]).unwrap();
        assert_eq!(a.to_string(), "[0 x i8] []");
        assert!(Constant::array(Type::i8(), vec![Constant::i32(0)]).is_err());

        let v = Constant::vector(vec![Constant::i32(3), Constant::i32(3)]).unwrap();
        assert_eq!(v.to_string(), "<2 x i32> <i32 3, i32 3>");
        assert_eq!(v.int_value(), Some(3));

        assert_eq!(Constant::char_array(*b"hi\0").to_string(), "[3 x i8] c\"hi\\00\"");
    }

    #[test]
    fn test_struct_with_named_type() {
        let t = Type::identified_struct("pair");
        t.set_body(vec![Type::i32(), Type::i32()], false).unwrap();
        let c = Constant::struct_with_type(t, vec![Constant::i32(1), Constant::i32(2)]).unwrap();
        assert_eq!(c.to_string(), "%pair { i32 1, i32 2 }");
    }

    #[test]
    fn test_global_and_block_address() {
        let g = Constant::from(global("x", Type::i32()));
        assert_eq!(g.to_string(), "i32* @x");

        let f = global("f", Type::func(Type::void(), vec![], false));
        let bb = Local::named("bb", Type::label());
        let addr = Constant::block_address(f.clone(), &bb).unwrap();
        assert_eq!(addr.to_string(), "i8* blockaddress(@f, %bb)");

        let pending = BlockAddress::pending(f, Some(LocalIdent::Id(2)));
        assert_eq!(Constant::BlockAddress(pending.clone()).ident(), "blockaddress(@f, %2)");
        pending.resolve(Local::named("later", Type::label())).unwrap();
        assert_eq!(Constant::BlockAddress(pending).ident(), "blockaddress(@f, %later)");
    }
}
