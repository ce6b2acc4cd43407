//! Metadata and attribute syntax

use super::types::TypeNode;
use super::values::TypedValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataNode {
    String(String),
    Value(Box<TypedValue>),
    /// `null` members are `None`
    Tuple(Vec<Option<MetadataNode>>),
    Ref(u64),
    Specialized {
        kind: String,
        #[serde(default)]
        fields: Vec<MetadataField>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    pub name: String,
    pub value: FieldNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNode {
    Int(i64),
    Bool(bool),
    Str(String),
    Enum(String),
    Node(MetadataNode),
    Null,
}

/// `!name !node`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentNode {
    pub name: String,
    pub node: MetadataNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrNode {
    Keyword(String),
    Str {
        key: String,
        #[serde(default)]
        value: Option<String>,
    },
    Align(u64),
    AlignStack(u64),
    AllocSize {
        elem: u32,
        #[serde(default)]
        count: Option<u32>,
    },
    Dereferenceable(u64),
    DereferenceableOrNull(u64),
    ByVal(Option<TypeNode>),
    SRet(Option<TypeNode>),
    Group(u64),
}
