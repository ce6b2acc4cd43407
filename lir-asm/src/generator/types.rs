//! Type definitions and type syntax

use super::Result;
use crate::ast::{TypeDefNode, TypeNode};
use crate::error::TranslationError;
use lir_ir::{AddrSpace, FloatKind, Type};
use log::trace;
use std::collections::{HashMap, HashSet};

/// Every named type of the module, fully resolved
#[derive(Debug, Default)]
pub(crate) struct TypeTable {
    named: HashMap<String, Type>,
}

impl TypeTable {
    /// Resolve all type definitions. Struct definitions may refer to
    /// themselves and to each other; a cycle made only of non-struct
    /// definitions is an error.
    pub(crate) fn resolve(defs: &[&TypeDefNode]) -> Result<Self> {
        let nodes: HashMap<&str, &TypeNode> = defs.iter().map(|d| (d.name.as_str(), &d.typ)).collect();
        let mut resolver = Resolver {
            nodes,
            table: TypeTable::default(),
            visiting: HashSet::new(),
        };

        for def in defs {
            if is_struct_body(&def.typ) {
                resolver
                    .table
                    .named
                    .insert(def.name.clone(), Type::identified_struct(def.name.as_str()));
            }
        }
        for def in defs {
            if !is_struct_body(&def.typ) {
                resolver.resolve_alias(&def.name)?;
            }
        }
        for def in defs {
            let shell = resolver.table.get(&def.name)?;
            match &def.typ {
                TypeNode::Opaque => shell.set_opaque()?,
                TypeNode::Struct { fields, packed } => {
                    let fields = fields
                        .iter()
                        .map(|f| resolver.table.typ(f))
                        .collect::<Result<Vec<_>>>()?;
                    shell.set_body(fields, *packed)?;
                }
                _ => {}
            }
            trace!("Resolved type %{} = {}", def.name, shell.def_string());
        }
        Ok(resolver.table)
    }

    pub(crate) fn get(&self, name: &str) -> Result<Type> {
        self.named
            .get(name)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Translate a type as written
    pub(crate) fn typ(&self, node: &TypeNode) -> Result<Type> {
        Ok(match node {
            TypeNode::Void => Type::void(),
            TypeNode::Func {
                ret,
                params,
                variadic,
            } => {
                let params = params.iter().map(|p| self.typ(p)).collect::<Result<Vec<_>>>()?;
                Type::func(self.typ(ret)?, params, *variadic)
            }
            TypeNode::Int(bits) => Type::int(*bits),
            TypeNode::Float(kind) => Type::float_of(kind.parse::<FloatKind>()?),
            TypeNode::Mmx => Type::mmx(),
            TypeNode::Pointer { elem, addr_space } => {
                Type::pointer_in(self.typ(elem)?, AddrSpace(*addr_space))
            }
            TypeNode::Vector {
                len,
                elem,
                scalable,
            } => {
                let elem = self.typ(elem)?;
                if *scalable {
                    Type::scalable_vector(*len, elem)
                } else {
                    Type::vector(*len, elem)
                }
            }
            TypeNode::Label => Type::label(),
            TypeNode::Token => Type::token(),
            TypeNode::Metadata => Type::metadata(),
            TypeNode::Array { len, elem } => Type::array(*len, self.typ(elem)?),
            TypeNode::Struct { fields, packed } => {
                let fields = fields.iter().map(|f| self.typ(f)).collect::<Result<Vec<_>>>()?;
                if *packed {
                    Type::packed_struct_of(fields)
                } else {
                    Type::struct_of(fields)
                }
            }
            TypeNode::Opaque => return Err(TranslationError::unsupported("opaque type outside of a type definition")),
            TypeNode::Named(name) => self.get(name)?,
        })
    }
}

fn is_struct_body(node: &TypeNode) -> bool {
    matches!(node, TypeNode::Struct { .. } | TypeNode::Opaque)
}

struct Resolver<'a> {
    nodes: HashMap<&'a str, &'a TypeNode>,
    table: TypeTable,
    visiting: HashSet<String>,
}

impl Resolver<'_> {
    fn resolve_alias(&mut self, name: &str) -> Result<Type> {
        if let Some(typ) = self.table.named.get(name) {
            return Ok(typ.clone());
        }
        let node = *self.nodes.get(name).ok_or_else(|| TranslationError::UnknownType {
            name: name.to_string(),
        })?;
        if !self.visiting.insert(name.to_string()) {
            return Err(TranslationError::RecursiveTypeDef {
                name: name.to_string(),
            });
        }
        self.resolve_refs(node)?;
        let target = self.table.typ(node)?;
        // Another name for an identified struct is that same struct.
        let typ = if target.is_struct() && target.name().is_some() {
            target
        } else {
            target.with_name(name)
        };
        self.visiting.remove(name);
        self.table.named.insert(name.to_string(), typ.clone());
        Ok(typ)
    }

    /// Resolve the aliases `node` mentions before it is translated
    fn resolve_refs(&mut self, node: &TypeNode) -> Result<()> {
        match node {
            TypeNode::Named(name) => self.resolve_alias(name).map(|_| ()),
            TypeNode::Func { ret, params, .. } => {
                self.resolve_refs(ret)?;
                params.iter().try_for_each(|p| self.resolve_refs(p))
            }
            TypeNode::Pointer { elem, .. }
            | TypeNode::Vector { elem, .. }
            | TypeNode::Array { elem, .. } => self.resolve_refs(elem),
            TypeNode::Struct { fields, .. } => fields.iter().try_for_each(|f| self.resolve_refs(f)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, typ: TypeNode) -> TypeDefNode {
        TypeDefNode {
            name: name.to_string(),
            typ,
            location: Default::default(),
        }
    }

    #[test]
    fn test_self_referential_struct() {
        let node = def(
            "node",
            TypeNode::Struct {
                fields: vec![TypeNode::int(32), TypeNode::pointer(TypeNode::named("node"))],
                packed: false,
            },
        );
        let table = TypeTable::resolve(&[&node]).unwrap();
        let typ = table.get("node").unwrap();
        assert_eq!(typ.to_string(), "%node");
        assert_eq!(typ.def_string(), "{ i32, %node* }");
    }

    #[test]
    fn test_alias_through_struct_is_allowed() {
        let ptr = def("p", TypeNode::pointer(TypeNode::named("s")));
        let s = def(
            "s",
            TypeNode::Struct {
                fields: vec![TypeNode::named("p")],
                packed: true,
            },
        );
        let table = TypeTable::resolve(&[&ptr, &s]).unwrap();
        assert_eq!(table.get("p").unwrap().def_string(), "%s*");
        assert_eq!(table.get("s").unwrap().def_string(), "<{ %p }>");
    }

    #[test]
    fn test_struct_alias_is_the_same_struct() {
        let s = def(
            "S",
            TypeNode::Struct {
                fields: vec![TypeNode::int(32)],
                packed: false,
            },
        );
        let a = def("A", TypeNode::named("S"));
        let table = TypeTable::resolve(&[&a, &s]).unwrap();
        let alias = table.get("A").unwrap();
        assert!(alias.ptr_eq(&table.get("S").unwrap()));
        assert_eq!(alias.to_string(), "%S");
    }

    #[test]
    fn test_alias_cycle_is_rejected() {
        let a = def("a", TypeNode::pointer(TypeNode::named("b")));
        let b = def("b", TypeNode::Array {
            len: 2,
            elem: Box::new(TypeNode::named("a")),
        });
        let err = TypeTable::resolve(&[&a, &b]).unwrap_err();
        assert!(matches!(err, TranslationError::RecursiveTypeDef { .. }), "{}", err);
    }

    #[test]
    fn test_unknown_type() {
        let a = def("a", TypeNode::pointer(TypeNode::named("missing")));
        let err = TypeTable::resolve(&[&a]).unwrap_err();
        assert_eq!(err.to_string(), "unable to locate type definition of named type %missing");
    }

    #[test]
    fn test_invalid_float_keyword() {
        let table = TypeTable::default();
        assert!(table.typ(&TypeNode::Float("quad".to_string())).is_err());
        assert_eq!(table.typ(&TypeNode::Float("fp128".to_string())).unwrap(), Type::float_of(FloatKind::Fp128));
    }
}
