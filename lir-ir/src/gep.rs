//! Aggregate indexing
//!
//! Result types of `extractvalue`/`insertvalue` index paths and of
//! `getelementptr`. Both are pure functions of types (plus the constant
//! part of gep indices), so they can be computed before the base value is
//! defined.

use crate::error::ContractViolation;
use crate::types::{Type, TypeKind};

/// What getelementptr needs to know about one index operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GepIndex {
    /// Constant value (the splat value for vector indices), if known
    pub value: Option<i64>,
    /// Length of a vector index
    pub vector_len: Option<u64>,
}

impl GepIndex {
    pub fn constant(value: i64) -> Self {
        GepIndex {
            value: Some(value),
            vector_len: None,
        }
    }

    pub fn dynamic() -> Self {
        GepIndex::default()
    }

    /// Index operand of type `typ` whose constant value is not known
    pub fn of_type(typ: &Type) -> Self {
        GepIndex {
            value: None,
            vector_len: typ.vector_shape().map(|(len, _)| len),
        }
    }
}

/// Type found by walking `indices` into the aggregate `typ`
pub fn aggregate_elem_type(
    inst: &'static str,
    typ: &Type,
    indices: &[u64],
) -> Result<Type, ContractViolation> {
    if indices.is_empty() {
        return Err(ContractViolation::MissingIndices { inst });
    }
    let mut cur = typ.clone();
    for &index in indices {
        let next = match cur.kind() {
            TypeKind::Array { len, elem } => {
                if index >= *len {
                    return Err(ContractViolation::IndexOutOfRange { inst, index, typ: cur });
                }
                elem.clone()
            }
            TypeKind::Struct(_) => {
                let field = cur
                    .struct_fields()
                    .and_then(|fields| usize::try_from(index).ok().and_then(|i| fields.get(i)));
                match field {
                    Some(field) => field.clone(),
                    None => {
                        return Err(ContractViolation::IndexOutOfRange { inst, index, typ: cur })
                    }
                }
            }
            _ => {
                return Err(ContractViolation::InvalidOperand {
                    inst,
                    expected: "struct or array aggregate",
                    got: cur,
                })
            }
        };
        cur = next;
    }
    Ok(cur)
}

/// Result type of `getelementptr elem_type, src, indices...`
///
/// The first index steps over the pointer itself; the remaining ones walk
/// into `elem_type`. The result is a pointer (in `src`'s address space) to
/// the reached type, or a vector of such pointers when `src` or any index
/// is a vector.
pub fn result_type(
    elem_type: &Type,
    src: &Type,
    indices: &[GepIndex],
) -> Result<Type, ContractViolation> {
    let inst = "getelementptr";
    if !src.scalar().is_pointer() {
        return Err(ContractViolation::InvalidOperand {
            inst,
            expected: "pointer or vector of pointers",
            got: src.clone(),
        });
    }
    let mut vector = src.vector_shape();
    let mut cur = elem_type.clone();
    for (i, index) in indices.iter().enumerate() {
        if let (None, Some(len)) = (vector, index.vector_len) {
            vector = Some((len, false));
        }
        if i == 0 {
            continue;
        }
        let next = match cur.kind() {
            TypeKind::Struct(_) => {
                let value = index
                    .value
                    .ok_or_else(|| ContractViolation::NonConstantStructIndex {
                        inst,
                        typ: cur.clone(),
                    })?;
                let field = cur
                    .struct_fields()
                    .and_then(|fields| usize::try_from(value).ok().and_then(|i| fields.get(i)));
                match field {
                    Some(field) => field.clone(),
                    None => {
                        return Err(ContractViolation::IndexOutOfRange {
                            inst,
                            index: value as u64,
                            typ: cur,
                        })
                    }
                }
            }
            TypeKind::Array { elem, .. } | TypeKind::Vector { elem, .. } => elem.clone(),
            _ => {
                return Err(ContractViolation::InvalidOperand {
                    inst,
                    expected: "indexable aggregate",
                    got: cur,
                })
            }
        };
        cur = next;
    }
    let ptr = Type::pointer_in(cur, src.addr_space());
    Ok(match vector {
        Some((len, true)) => Type::scalable_vector(len, ptr),
        Some((len, false)) => Type::vector(len, ptr),
        None => ptr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddrSpace;

    #[test]
    fn test_aggregate_path() {
        let inner = Type::array(4, Type::i16());
        let agg = Type::struct_of(vec![Type::i32(), inner]);
        assert_eq!(aggregate_elem_type("extractvalue", &agg, &[1, 3]).unwrap(), Type::i16());
        let err = aggregate_elem_type("extractvalue", &agg, &[1, 4]).unwrap_err();
        assert_eq!(err.to_string(), "extractvalue index 4 out of range for [4 x i16]");
        assert!(aggregate_elem_type("extractvalue", &agg, &[]).is_err());
        assert!(aggregate_elem_type("extractvalue", &Type::i32(), &[0]).is_err());
    }

    #[test]
    fn test_gep_into_struct() {
        let s = Type::identified_struct("S");
        s.set_body(vec![Type::i8(), Type::array(2, Type::i64())], false).unwrap();
        let src = Type::pointer_in(s.clone(), AddrSpace(3));
        let t = result_type(
            &s,
            &src,
            &[GepIndex::constant(0), GepIndex::constant(1), GepIndex::dynamic()],
        )
        .unwrap();
        assert_eq!(t.to_string(), "i64 addrspace(3)*");
    }

    #[test]
    fn test_gep_struct_index_must_be_constant() {
        let s = Type::struct_of(vec![Type::i8()]);
        let err = result_type(&s, &Type::pointer(s.clone()), &[GepIndex::dynamic(), GepIndex::dynamic()])
            .unwrap_err();
        assert!(matches!(err, ContractViolation::NonConstantStructIndex { .. }));
    }

    #[test]
    fn test_gep_vector_index() {
        let idx = GepIndex::of_type(&Type::vector(4, Type::i64()));
        let t = result_type(&Type::i32(), &Type::pointer(Type::i32()), &[idx]).unwrap();
        assert_eq!(t.to_string(), "<4 x i32*>");
    }
}
