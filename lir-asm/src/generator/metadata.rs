//! Operand resolution, metadata and attributes

use super::{GlobalScope, Result, TypeTable};
use crate::ast::{
    AttachmentNode, AttrNode, FieldNode, MetadataNode, TypeNode, TypedValue, ValueNode,
};
use crate::error::TranslationError;
use lir_ir::metadata::SpecializedNode;
use lir_ir::{
    Attribute, FieldValue, Local, LocalIdent, Metadata, MetadataAttachment, Type, Value,
};

/// Resolves written operands to values. Module-level code sees constants
/// only; function bodies also see their locals.
pub(crate) trait ValueResolver {
    fn globals(&self) -> &GlobalScope;

    fn local(&self, ident: &LocalIdent) -> Result<Local>;

    /// Operand of the already translated type `typ`
    fn value_of(&self, typ: &Type, node: &ValueNode) -> Result<Value> {
        match node {
            ValueNode::Const(c) => Ok(self.globals().constant(typ, c)?.into()),
            ValueNode::Local(ident) => {
                let local = self.local(ident)?;
                if local.typ() != typ {
                    return Err(TranslationError::TypeMismatch {
                        what: "local value",
                        expected: typ.clone(),
                        got: local.typ().clone(),
                    });
                }
                Ok(local.into())
            }
            ValueNode::Metadata(md) => Ok(metadata(self, md)?.into()),
        }
    }

    fn value(&self, tv: &TypedValue) -> Result<Value> {
        let typ = self.globals().types.typ(&tv.typ)?;
        self.value_of(&typ, &tv.value)
    }
}

impl ValueResolver for GlobalScope {
    fn globals(&self) -> &GlobalScope {
        self
    }

    fn local(&self, ident: &LocalIdent) -> Result<Local> {
        Err(TranslationError::UnknownLocal {
            ident: ident.to_string(),
            func: "<module scope>".to_string(),
        })
    }
}

pub(crate) fn metadata<R: ValueResolver + ?Sized>(values: &R, node: &MetadataNode) -> Result<Metadata> {
    Ok(match node {
        MetadataNode::String(s) => Metadata::String(s.clone()),
        MetadataNode::Value(tv) => Metadata::Value(values.value(tv)?),
        MetadataNode::Tuple(items) => Metadata::Tuple(
            items
                .iter()
                .map(|item| item.as_ref().map(|md| metadata(values, md)).transpose())
                .collect::<Result<Vec<_>>>()?,
        ),
        MetadataNode::Ref(id) => Metadata::Ref(*id),
        MetadataNode::Specialized { kind, fields } => {
            let fields = fields
                .iter()
                .map(|field| Ok((field.name.clone(), field_value(values, &field.value)?)))
                .collect::<Result<Vec<_>>>()?;
            Metadata::Specialized(SpecializedNode {
                kind: kind.clone(),
                fields,
            })
        }
    })
}

fn field_value<R: ValueResolver + ?Sized>(values: &R, node: &FieldNode) -> Result<FieldValue> {
    Ok(match node {
        FieldNode::Int(v) => FieldValue::Int(*v),
        FieldNode::Bool(v) => FieldValue::Bool(*v),
        FieldNode::Str(s) => FieldValue::Str(s.clone()),
        FieldNode::Enum(e) => FieldValue::Enum(e.clone()),
        FieldNode::Node(md) => FieldValue::Node(metadata(values, md)?),
        FieldNode::Null => FieldValue::Null,
    })
}

pub(crate) fn attachments<R: ValueResolver + ?Sized>(
    values: &R,
    nodes: &[AttachmentNode],
) -> Result<Vec<MetadataAttachment>> {
    nodes
        .iter()
        .map(|att| Ok(MetadataAttachment::new(att.name.clone(), metadata(values, &att.node)?)))
        .collect()
}

pub(crate) fn attribute(types: &TypeTable, node: &AttrNode) -> Result<Attribute> {
    let typ = |t: &Option<TypeNode>| t.as_ref().map(|t| types.typ(t)).transpose();
    Ok(match node {
        AttrNode::Keyword(name) => Attribute::Keyword(name.clone()),
        AttrNode::Str { key, value } => Attribute::Str {
            key: key.clone(),
            value: value.clone(),
        },
        AttrNode::Align(n) => Attribute::Align(*n),
        AttrNode::AlignStack(n) => Attribute::AlignStack(*n),
        AttrNode::AllocSize { elem, count } => Attribute::AllocSize {
            elem: *elem,
            count: *count,
        },
        AttrNode::Dereferenceable(n) => Attribute::Dereferenceable(*n),
        AttrNode::DereferenceableOrNull(n) => Attribute::DereferenceableOrNull(*n),
        AttrNode::ByVal(t) => Attribute::ByVal(typ(t)?),
        AttrNode::SRet(t) => Attribute::SRet(typ(t)?),
        AttrNode::Group(id) => Attribute::Group(*id),
    })
}

pub(crate) fn attributes(types: &TypeTable, nodes: &[AttrNode]) -> Result<Vec<Attribute>> {
    nodes.iter().map(|attr| attribute(types, attr)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MetadataField;
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

    #[test]
    fn test_metadata_tuple() {
        let node = MetadataNode::Tuple(vec![
            Some(MetadataNode::String("clang".to_string())),
            None,
            Some(MetadataNode::Value(Box::new(TypedValue::int(32, 4)))),
            Some(MetadataNode::Specialized {
                kind: "DILocation".to_string(),
                fields: vec![MetadataField {
                    name: "line".to_string(),
                    value: FieldNode::Int(7),
                }],
            }),
        ]);
        let md = metadata(&scope(), &node).unwrap();
        assert_eq!(md.to_string(), "!{!\"clang\", null, i32 4, !DILocation(line: 7)}");
    }

    #[test]
    fn test_module_scope_has_no_locals() {
        let node = MetadataNode::Value(Box::new(TypedValue::local(TypeNode::int(32), "x")));
        let err = metadata(&scope(), &node).unwrap_err();
        assert!(matches!(err, TranslationError::UnknownLocal { .. }), "{}", err);
    }

    #[test]
    fn test_attributes() {
        let attrs = attributes(
            &TypeTable::default(),
            &[
                AttrNode::Keyword("nounwind".to_string()),
                AttrNode::ByVal(Some(TypeNode::int(8))),
                AttrNode::Group(1),
            ],
        )
        .unwrap();
        let spelled: Vec<String> = attrs.iter().map(|a| a.to_string()).collect();
        assert_eq!(spelled, ["nounwind", "byval(i8)", "#1"]);
    }
}
