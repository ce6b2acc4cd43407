//! Metadata
//!
//! Generic metadata model. Debug-info nodes (`!DILocation(...)` and
//! friends) share one specialized variant: a kind name plus an ordered
//! field list.

use crate::enc;
use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    /// `!"text"`
    String(String),
    /// `i32 1`
    Value(Value),
    /// `!{...}`; `None` members print as `null`
    Tuple(Vec<Option<Metadata>>),
    /// `!3`
    Ref(u64),
    /// `!DIKind(field: value, ...)`
    Specialized(SpecializedNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecializedNode {
    pub kind: String,
    pub fields: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Bool(bool),
    Str(String),
    /// Bare enumerator such as `DW_TAG_base_type`
    Enum(String),
    Node(Metadata),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Str(s) => f.write_str(&enc::quote(s)),
            FieldValue::Enum(e) => f.write_str(e),
            FieldValue::Node(md) => write!(f, "{}", md),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metadata::String(s) => write!(f, "!{}", enc::quote(s)),
            Metadata::Value(v) => write!(f, "{}", v),
            Metadata::Tuple(items) => {
                f.write_str("!{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Some(md) => write!(f, "{}", md)?,
                        None => f.write_str("null")?,
                    }
                }
                f.write_str("}")
            }
            Metadata::Ref(id) => f.write_str(&enc::metadata_id(*id)),
            Metadata::Specialized(node) => {
                write!(f, "!{}(", node.kind)?;
                for (i, (name, value)) in node.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// `!dbg !3` attached to a global, function or instruction
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataAttachment {
    pub name: String,
    pub node: Metadata,
}

impl MetadataAttachment {
    pub fn new(name: impl Into<String>, node: Metadata) -> Self {
        MetadataAttachment {
            name: name.into(),
            node,
        }
    }
}

impl fmt::Display for MetadataAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", enc::metadata_name(&self.name), self.node)
    }
}

/// `!0 = distinct !{...}`
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDef {
    pub id: u64,
    pub distinct: bool,
    pub node: Metadata,
}

impl fmt::Display for MetadataDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", enc::metadata_id(self.id))?;
        if self.distinct {
            f.write_str("distinct ")?;
        }
        write!(f, "{}", self.node)
    }
}

/// `!llvm.ident = !{!0, !1}`
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMetadataDef {
    pub name: String,
    pub nodes: Vec<u64>,
}

impl fmt::Display for NamedMetadataDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = !{{", enc::metadata_name(&self.name))?;
        for (i, id) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&enc::metadata_id(*id))?;
        }
        f.write_str("}")
    }
}

/// ` !a !0, !b !1` trailing an entity; with `comma` each attachment is
/// preceded by `,` (instruction and global form).
pub(crate) fn fmt_attachments(
    f: &mut fmt::Formatter<'_>,
    attachments: &[MetadataAttachment],
    comma: bool,
) -> fmt::Result {
    for md in attachments {
        if comma {
            f.write_str(",")?;
        }
        write!(f, " {}", md)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;

    #[test]
    fn test_metadata_nodes() {
        let tuple = Metadata::Tuple(vec![
            Some(Metadata::String("clang".to_string())),
            None,
            Some(Metadata::Value(Constant::i32(4).into())),
            Some(Metadata::Ref(2)),
        ]);
        assert_eq!(tuple.to_string(), "!{!\"clang\", null, i32 4, !2}");
    }

    #[test]
    fn test_specialized_node() {
        let node = Metadata::Specialized(SpecializedNode {
            kind: "DILocation".to_string(),
            fields: vec![
                ("line".to_string(), FieldValue::Int(3)),
                ("scope".to_string(), FieldValue::Node(Metadata::Ref(1))),
                ("tag".to_string(), FieldValue::Enum("DW_TAG_member".to_string())),
            ],
        });
        assert_eq!(
            node.to_string(),
            "!DILocation(line: 3, scope: !1, tag: DW_TAG_member)"
        );
    }

    #[test]
    fn test_definitions() {
        let def = MetadataDef {
            id: 0,
            distinct: true,
            node: Metadata::Tuple(vec![]),
        };
        assert_eq!(def.to_string(), "!0 = distinct !{}");
        let named = NamedMetadataDef {
            name: "llvm.ident".to_string(),
            nodes: vec![0, 1],
        };
        assert_eq!(named.to_string(), "!llvm.ident = !{!0, !1}");
        let att = MetadataAttachment::new("dbg", Metadata::Ref(7));
        assert_eq!(att.to_string(), "!dbg !7");
    }
}
