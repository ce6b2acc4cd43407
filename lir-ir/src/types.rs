//! IR Type System
//!
//! Types are shared, immutable nodes (`Arc`) with one exception: the body
//! of an identified struct is a single-assignment cell, which is how
//! self-referential definitions such as `%list = type { i32, %list* }` are
//! tied. Identified structs compare by name; every other type compares by
//! structure.

use crate::enc;
use crate::enums::UnknownKeyword;
use crate::error::ContractViolation;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Floating-point kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    Half,
    Float,
    Double,
    X86Fp80,
    Fp128,
    PpcFp128,
}

impl FloatKind {
    pub fn bits(self) -> u64 {
        match self {
            FloatKind::Half => 16,
            FloatKind::Float => 32,
            FloatKind::Double => 64,
            FloatKind::X86Fp80 => 80,
            FloatKind::Fp128 | FloatKind::PpcFp128 => 128,
        }
    }
}

impl fmt::Display for FloatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FloatKind::Half => "half",
            FloatKind::Float => "float",
            FloatKind::Double => "double",
            FloatKind::X86Fp80 => "x86_fp80",
            FloatKind::Fp128 => "fp128",
            FloatKind::PpcFp128 => "ppc_fp128",
        })
    }
}

impl FromStr for FloatKind {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "half" => FloatKind::Half,
            "float" => FloatKind::Float,
            "double" => FloatKind::Double,
            "x86_fp80" => FloatKind::X86Fp80,
            "fp128" => FloatKind::Fp128,
            "ppc_fp128" => FloatKind::PpcFp128,
            _ => {
                return Err(UnknownKeyword {
                    kind: "FloatKind",
                    text: s.to_string(),
                })
            }
        })
    }
}

/// Address space of a pointer; 0 is the default and is never printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AddrSpace(pub u64);

impl AddrSpace {
    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AddrSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addrspace({})", self.0)
    }
}

/// Function signature
#[derive(Debug, Clone)]
pub struct FuncType {
    pub ret: Type,
    pub params: Vec<Type>,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub enum StructBody {
    Opaque,
    Fields { packed: bool, fields: Vec<Type> },
}

/// Struct body cell; aliases made with [`Type::with_name`] share it
#[derive(Debug, Clone, Default)]
pub struct StructType {
    body: Arc<OnceLock<StructBody>>,
}

impl StructType {
    pub fn body(&self) -> Option<&StructBody> {
        self.body.get()
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Void,
    Func(FuncType),
    Int(u64),
    Float(FloatKind),
    Mmx,
    Pointer { elem: Type, addr_space: AddrSpace },
    Vector { len: u64, elem: Type, scalable: bool },
    Label,
    Token,
    Metadata,
    Array { len: u64, elem: Type },
    Struct(StructType),
}

struct TypeData {
    name: Option<String>,
    kind: TypeKind,
}

/// IR type handle (cheap to clone)
#[derive(Clone)]
pub struct Type(Arc<TypeData>);

impl Type {
    fn from_kind(kind: TypeKind) -> Self {
        Type(Arc::new(TypeData { name: None, kind }))
    }

    pub fn void() -> Self {
        Self::from_kind(TypeKind::Void)
    }

    pub fn int(bits: u64) -> Self {
        Self::from_kind(TypeKind::Int(bits))
    }

    pub fn i1() -> Self {
        Self::int(1)
    }

    pub fn i8() -> Self {
        Self::int(8)
    }

    pub fn i16() -> Self {
        Self::int(16)
    }

    pub fn i32() -> Self {
        Self::int(32)
    }

    pub fn i64() -> Self {
        Self::int(64)
    }

    pub fn i128() -> Self {
        Self::int(128)
    }

    pub fn float_of(kind: FloatKind) -> Self {
        Self::from_kind(TypeKind::Float(kind))
    }

    pub fn half() -> Self {
        Self::float_of(FloatKind::Half)
    }

    pub fn float() -> Self {
        Self::float_of(FloatKind::Float)
    }

    pub fn double() -> Self {
        Self::float_of(FloatKind::Double)
    }

    pub fn mmx() -> Self {
        Self::from_kind(TypeKind::Mmx)
    }

    pub fn label() -> Self {
        Self::from_kind(TypeKind::Label)
    }

    pub fn token() -> Self {
        Self::from_kind(TypeKind::Token)
    }

    pub fn metadata() -> Self {
        Self::from_kind(TypeKind::Metadata)
    }

    /// Pointer in the default address space
    pub fn pointer(elem: Type) -> Self {
        Self::pointer_in(elem, AddrSpace::default())
    }

    pub fn pointer_in(elem: Type, addr_space: AddrSpace) -> Self {
        Self::from_kind(TypeKind::Pointer { elem, addr_space })
    }

    pub fn vector(len: u64, elem: Type) -> Self {
        Self::from_kind(TypeKind::Vector {
            len,
            elem,
            scalable: false,
        })
    }

    pub fn scalable_vector(len: u64, elem: Type) -> Self {
        Self::from_kind(TypeKind::Vector {
            len,
            elem,
            scalable: true,
        })
    }

    pub fn array(len: u64, elem: Type) -> Self {
        Self::from_kind(TypeKind::Array { len, elem })
    }

    pub fn func(ret: Type, params: Vec<Type>, variadic: bool) -> Self {
        Self::from_kind(TypeKind::Func(FuncType {
            ret,
            params,
            variadic,
        }))
    }

    /// Literal (anonymous) struct type
    pub fn struct_of(fields: Vec<Type>) -> Self {
        Self::literal_struct(fields, false)
    }

    pub fn packed_struct_of(fields: Vec<Type>) -> Self {
        Self::literal_struct(fields, true)
    }

    fn literal_struct(fields: Vec<Type>, packed: bool) -> Self {
        let body = OnceLock::new();
        let _ = body.set(StructBody::Fields { packed, fields });
        Self::from_kind(TypeKind::Struct(StructType {
            body: Arc::new(body),
        }))
    }

    /// Identified struct without a body yet; see [`Type::set_body`]
    pub fn identified_struct(name: impl Into<String>) -> Self {
        Type(Arc::new(TypeData {
            name: Some(name.into()),
            kind: TypeKind::Struct(StructType::default()),
        }))
    }

    /// Copy of this type carrying an alias name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Type(Arc::new(TypeData {
            name: Some(name.into()),
            kind: self.0.kind.clone(),
        }))
    }

    /// Give an identified struct its fields (exactly once)
    pub fn set_body(&self, fields: Vec<Type>, packed: bool) -> Result<(), ContractViolation> {
        self.set_struct_body(StructBody::Fields { packed, fields })
    }

    pub fn set_opaque(&self) -> Result<(), ContractViolation> {
        self.set_struct_body(StructBody::Opaque)
    }

    fn set_struct_body(&self, body: StructBody) -> Result<(), ContractViolation> {
        match (&self.0.name, &self.0.kind) {
            (Some(_), TypeKind::Struct(s)) => s
                .body
                .set(body)
                .map_err(|_| ContractViolation::StructBodyRedefined { typ: self.clone() }),
            _ => Err(ContractViolation::NotIdentifiedStruct { typ: self.clone() }),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Identity of the underlying node
    pub fn ptr_eq(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind(), TypeKind::Void)
    }

    pub fn is_func(&self) -> bool {
        matches!(self.kind(), TypeKind::Func(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self.kind(), TypeKind::Int(_))
    }

    /// `i1`
    pub fn is_bool(&self) -> bool {
        matches!(self.kind(), TypeKind::Int(1))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind(), TypeKind::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind(), TypeKind::Pointer { .. })
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.kind(), TypeKind::Vector { .. })
    }

    pub fn is_label(&self) -> bool {
        matches!(self.kind(), TypeKind::Label)
    }

    pub fn is_token(&self) -> bool {
        matches!(self.kind(), TypeKind::Token)
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self.kind(), TypeKind::Metadata)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind(), TypeKind::Array { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind(), TypeKind::Struct(_))
    }

    pub fn is_aggregate(&self) -> bool {
        self.is_array() || self.is_struct()
    }

    pub fn int_bits(&self) -> Option<u64> {
        match self.kind() {
            TypeKind::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    pub fn float_kind(&self) -> Option<FloatKind> {
        match self.kind() {
            TypeKind::Float(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Pointer { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// Address space of a pointer (or of a vector of pointers)
    pub fn addr_space(&self) -> AddrSpace {
        match self.scalar().kind() {
            TypeKind::Pointer { addr_space, .. } => *addr_space,
            _ => AddrSpace::default(),
        }
    }

    pub fn func_type(&self) -> Option<&FuncType> {
        match self.kind() {
            TypeKind::Func(ft) => Some(ft),
            _ => None,
        }
    }

    /// Element type of a vector or array
    pub fn elem(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Vector { elem, .. } | TypeKind::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// Length and scalable flag of a vector
    pub fn vector_shape(&self) -> Option<(u64, bool)> {
        match self.kind() {
            TypeKind::Vector { len, scalable, .. } => Some((*len, *scalable)),
            _ => None,
        }
    }

    /// Fields of a struct with a known, non-opaque body
    pub fn struct_fields(&self) -> Option<&[Type]> {
        match self.kind() {
            TypeKind::Struct(s) => match s.body() {
                Some(StructBody::Fields { fields, .. }) => Some(fields),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_opaque_struct(&self) -> bool {
        match self.kind() {
            TypeKind::Struct(s) => !matches!(s.body(), Some(StructBody::Fields { .. })),
            _ => false,
        }
    }

    pub fn is_packed(&self) -> bool {
        match self.kind() {
            TypeKind::Struct(s) => matches!(s.body(), Some(StructBody::Fields { packed: true, .. })),
            _ => false,
        }
    }

    /// Element type of a vector, the type itself otherwise
    pub fn scalar(&self) -> &Type {
        match self.kind() {
            TypeKind::Vector { elem, .. } => elem,
            _ => self,
        }
    }

    pub fn is_int_or_int_vector(&self) -> bool {
        self.scalar().is_int()
    }

    pub fn is_float_or_float_vector(&self) -> bool {
        self.scalar().is_float()
    }

    pub fn is_pointer_or_pointer_vector(&self) -> bool {
        self.scalar().is_pointer()
    }

    /// Same vector shape as `self` with a different element type, or `elem`
    /// itself when `self` is a scalar.
    pub fn with_scalar(&self, elem: Type) -> Type {
        match self.vector_shape() {
            Some((len, true)) => Type::scalable_vector(len, elem),
            Some((len, false)) => Type::vector(len, elem),
            None => elem,
        }
    }

    /// Types that can be produced by instructions (everything but void and
    /// function types)
    pub fn is_first_class(&self) -> bool {
        !self.is_void() && !self.is_func()
    }

    pub fn is_sized(&self) -> bool {
        self.sized_with(&mut HashSet::new())
    }

    fn sized_with(&self, visited: &mut HashSet<usize>) -> bool {
        match self.kind() {
            TypeKind::Int(_) | TypeKind::Float(_) | TypeKind::Mmx | TypeKind::Pointer { .. } => true,
            TypeKind::Vector { elem, .. } | TypeKind::Array { elem, .. } => elem.sized_with(visited),
            TypeKind::Struct(s) => match s.body() {
                Some(StructBody::Fields { fields, .. }) => {
                    // `visited` holds the structs on the current path; a
                    // struct containing itself by value has no size.
                    let key = Arc::as_ptr(&self.0) as usize;
                    if !visited.insert(key) {
                        return false;
                    }
                    let sized = fields.iter().all(|field| field.sized_with(visited));
                    visited.remove(&key);
                    sized
                }
                _ => false,
            },
            TypeKind::Void
            | TypeKind::Func(_)
            | TypeKind::Label
            | TypeKind::Token
            | TypeKind::Metadata => false,
        }
    }

    /// Primitive size in bits of scalars and vectors of scalars (bitcast rule)
    pub fn primitive_bits(&self) -> Option<u64> {
        match self.kind() {
            TypeKind::Int(bits) => Some(*bits),
            TypeKind::Float(kind) => Some(kind.bits()),
            TypeKind::Mmx => Some(64),
            TypeKind::Vector { len, elem, .. } => elem.primitive_bits().map(|bits| bits * len),
            _ => None,
        }
    }

    /// Structural spelling, as used in `%T = type ...` definitions
    pub fn def_string(&self) -> String {
        DefString(self).to_string()
    }

    fn fmt_def(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Void => f.write_str("void"),
            TypeKind::Func(ft) => {
                write!(f, "{} (", ft.ret)?;
                for (i, param) in ft.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                if ft.variadic {
                    if ft.params.is_empty() {
                        f.write_str("...")?;
                    } else {
                        f.write_str(", ...")?;
                    }
                }
                f.write_str(")")
            }
            TypeKind::Int(bits) => write!(f, "i{}", bits),
            TypeKind::Float(kind) => write!(f, "{}", kind),
            TypeKind::Mmx => f.write_str("x86_mmx"),
            TypeKind::Pointer { elem, addr_space } => {
                if addr_space.is_default() {
                    write!(f, "{}*", elem)
                } else {
                    write!(f, "{} {}*", elem, addr_space)
                }
            }
            TypeKind::Vector {
                len,
                elem,
                scalable,
            } => {
                if *scalable {
                    write!(f, "<vscale x {} x {}>", len, elem)
                } else {
                    write!(f, "<{} x {}>", len, elem)
                }
            }
            TypeKind::Label => f.write_str("label"),
            TypeKind::Token => f.write_str("token"),
            TypeKind::Metadata => f.write_str("metadata"),
            TypeKind::Array { len, elem } => write!(f, "[{} x {}]", len, elem),
            TypeKind::Struct(s) => match s.body() {
                None | Some(StructBody::Opaque) => f.write_str("opaque"),
                Some(StructBody::Fields { packed, fields }) => {
                    if *packed {
                        f.write_str("<")?;
                    }
                    if fields.is_empty() {
                        f.write_str("{}")?;
                    } else {
                        f.write_str("{ ")?;
                        for (i, field) in fields.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", field)?;
                        }
                        f.write_str(" }")?;
                    }
                    if *packed {
                        f.write_str(">")?;
                    }
                    Ok(())
                }
            },
        }
    }
}

struct DefString<'a>(&'a Type);

impl fmt::Display for DefString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_def(f)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(&enc::type_name(name)),
            None => self.fmt_def(f),
        }
    }
}

// Printed through Display so that recursive struct bodies are never walked.
impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        types_equal(self, other, &mut HashSet::new())
    }
}

impl Eq for Type {}

/// Structural equality; a pair seen again while it is being compared is
/// assumed equal, which makes the relation decidable on cyclic types.
fn types_equal(t: &Type, u: &Type, visited: &mut HashSet<(usize, usize)>) -> bool {
    if t.ptr_eq(u) {
        return true;
    }
    if let (TypeKind::Struct(_), TypeKind::Struct(_)) = (t.kind(), u.kind()) {
        if t.name().is_some() || u.name().is_some() {
            return t.name() == u.name();
        }
    }
    let key = (Arc::as_ptr(&t.0) as usize, Arc::as_ptr(&u.0) as usize);
    if !visited.insert(key) {
        return true;
    }
    match (t.kind(), u.kind()) {
        (TypeKind::Void, TypeKind::Void)
        | (TypeKind::Mmx, TypeKind::Mmx)
        | (TypeKind::Label, TypeKind::Label)
        | (TypeKind::Token, TypeKind::Token)
        | (TypeKind::Metadata, TypeKind::Metadata) => true,
        (TypeKind::Int(a), TypeKind::Int(b)) => a == b,
        (TypeKind::Float(a), TypeKind::Float(b)) => a == b,
        (TypeKind::Func(a), TypeKind::Func(b)) => {
            a.variadic == b.variadic
                && a.params.len() == b.params.len()
                && types_equal(&a.ret, &b.ret, visited)
                && a
                    .params
                    .iter()
                    .zip(&b.params)
                    .all(|(x, y)| types_equal(x, y, visited))
        }
        (
            TypeKind::Pointer {
                elem: a,
                addr_space: sa,
            },
            TypeKind::Pointer {
                elem: b,
                addr_space: sb,
            },
        ) => sa == sb && types_equal(a, b, visited),
        (
            TypeKind::Vector {
                len: la,
                elem: a,
                scalable: sa,
            },
            TypeKind::Vector {
                len: lb,
                elem: b,
                scalable: sb,
            },
        ) => la == lb && sa == sb && types_equal(a, b, visited),
        (TypeKind::Array { len: la, elem: a }, TypeKind::Array { len: lb, elem: b }) => {
            la == lb && types_equal(a, b, visited)
        }
        (TypeKind::Struct(a), TypeKind::Struct(b)) => match (a.body(), b.body()) {
            (
                Some(StructBody::Fields {
                    packed: pa,
                    fields: fa,
                }),
                Some(StructBody::Fields {
                    packed: pb,
                    fields: fb,
                }),
            ) => {
                pa == pb
                    && fa.len() == fb.len()
                    && fa.iter().zip(fb).all(|(x, y)| types_equal(x, y, visited))
            }
            (Some(StructBody::Fields { .. }), _) | (_, Some(StructBody::Fields { .. })) => false,
            _ => true,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        assert_eq!(Type::i32().to_string(), "i32");
        assert_eq!(Type::pointer(Type::i8()).to_string(), "i8*");
        assert_eq!(
            Type::pointer_in(Type::i8(), AddrSpace(1)).to_string(),
            "i8 addrspace(1)*"
        );
        assert_eq!(Type::vector(4, Type::float()).to_string(), "<4 x float>");
        assert_eq!(
            Type::scalable_vector(4, Type::float()).to_string(),
            "<vscale x 4 x float>"
        );
        assert_eq!(Type::array(8, Type::i8()).to_string(), "[8 x i8]");
        assert_eq!(
            Type::func(Type::i32(), vec![Type::pointer(Type::i8())], true).to_string(),
            "i32 (i8*, ...)"
        );
        assert_eq!(Type::func(Type::void(), vec![], true).to_string(), "void (...)");
        assert_eq!(
            Type::struct_of(vec![Type::i32(), Type::i64()]).to_string(),
            "{ i32, i64 }"
        );
        assert_eq!(Type::packed_struct_of(vec![Type::i8()]).to_string(), "<{ i8 }>");
        assert_eq!(Type::struct_of(vec![]).to_string(), "{}");
        assert_eq!(Type::identified_struct("T").def_string(), "opaque");
        assert_eq!(Type::float_of(FloatKind::PpcFp128).to_string(), "ppc_fp128");
    }

    #[test]
    fn test_alias_renders_name() {
        let t = Type::i32().with_name("my int");
        assert_eq!(t.to_string(), "%\"my int\"");
        assert_eq!(t.def_string(), "i32");
        // Aliases of non-struct types compare by structure.
        assert_eq!(t, Type::i32());
    }

    #[test]
    fn test_named_structs_compare_by_name() {
        let a = Type::identified_struct("a");
        let b = Type::identified_struct("b");
        a.set_body(vec![Type::i32()], false).unwrap();
        b.set_body(vec![Type::i32()], false).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Type::identified_struct("a"));
        assert_eq!(
            Type::struct_of(vec![Type::i32()]),
            Type::struct_of(vec![Type::i32()])
        );
        assert_ne!(
            Type::struct_of(vec![Type::i32()]),
            Type::packed_struct_of(vec![Type::i32()])
        );
        assert_ne!(a, Type::struct_of(vec![Type::i32()]));
    }

    #[test]
    fn test_recursive_struct_terminates() {
        let list = Type::identified_struct("list");
        let ptr = Type::pointer(list.clone());
        list.set_body(vec![Type::i32(), ptr.clone()], false).unwrap();

        assert_eq!(ptr, Type::pointer(list.clone()));
        assert_eq!(list.def_string(), "{ i32, %list* }");
        assert_eq!(format!("{:?}", ptr), "Type(%list*)");
        assert!(list.is_sized());
    }

    #[test]
    fn test_repeated_struct_fields_are_sized() {
        let s = Type::identified_struct("s");
        s.set_body(vec![Type::i32()], false).unwrap();
        assert!(Type::struct_of(vec![s.clone(), s.clone()]).is_sized());
        assert!(Type::struct_of(vec![s.clone(), Type::array(2, s.clone())]).is_sized());

        let t = Type::identified_struct("t");
        t.set_body(vec![s.clone(), s.clone()], false).unwrap();
        assert!(t.is_sized());

        // Containing itself by value, even through an array, has no size.
        let r = Type::identified_struct("r");
        r.set_body(vec![s, Type::array(1, r.clone())], false).unwrap();
        assert!(!r.is_sized());
    }

    #[test]
    fn test_struct_body_set_once() {
        let t = Type::identified_struct("t");
        t.set_opaque().unwrap();
        let err = t.set_body(vec![], false).unwrap_err();
        assert_eq!(err.to_string(), "struct body of %t already defined");
        assert!(Type::i32().set_opaque().is_err());
    }

    #[test]
    fn test_predicates() {
        let v = Type::vector(4, Type::pointer(Type::i8()));
        assert!(v.is_pointer_or_pointer_vector());
        assert_eq!(v.with_scalar(Type::i1()).to_string(), "<4 x i1>");
        assert_eq!(Type::vector(2, Type::i32()).primitive_bits(), Some(64));
        assert!(!Type::identified_struct("o").is_sized());
        assert!(!Type::label().is_sized());
        assert!(Type::label().is_first_class());
    }
}
