//! Constant, expression and operand syntax

use super::metadata::MetadataNode;
use super::types::TypeNode;
use lir_ir::{GlobalIdent, LocalIdent};
use serde::{Deserialize, Serialize};

/// `type value` pair whose value must be a constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedConst {
    pub typ: TypeNode,
    pub value: ConstNode,
}

impl TypedConst {
    pub fn new(typ: TypeNode, value: ConstNode) -> Self {
        TypedConst { typ, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstNode {
    Int(i128),
    /// `true` / `false`
    Bool(bool),
    Float(f64),
    Null,
    /// `none`
    None,
    Undef,
    Poison,
    Struct {
        fields: Vec<TypedConst>,
        #[serde(default)]
        packed: bool,
    },
    Array(Vec<TypedConst>),
    /// `c"..."`
    CharArray(Vec<u8>),
    Vector(Vec<TypedConst>),
    ZeroInitializer,
    BlockAddress {
        func: GlobalIdent,
        block: LocalIdent,
    },
    Global(GlobalIdent),
    Expr(Box<ExprNode>),
}

/// Constant expression; operands carry their own types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprNode {
    FNeg {
        x: TypedConst,
    },
    Binary {
        op: String,
        #[serde(default)]
        flags: Vec<String>,
        x: TypedConst,
        y: TypedConst,
    },
    ExtractElement {
        x: TypedConst,
        index: TypedConst,
    },
    InsertElement {
        x: TypedConst,
        elem: TypedConst,
        index: TypedConst,
    },
    ShuffleVector {
        x: TypedConst,
        y: TypedConst,
        mask: TypedConst,
    },
    ExtractValue {
        x: TypedConst,
        indices: Vec<u64>,
    },
    InsertValue {
        x: TypedConst,
        elem: TypedConst,
        indices: Vec<u64>,
    },
    GetElementPtr {
        #[serde(default)]
        in_bounds: bool,
        elem_type: TypeNode,
        src: TypedConst,
        #[serde(default)]
        indices: Vec<TypedConst>,
    },
    Cast {
        op: String,
        from: TypedConst,
        to: TypeNode,
    },
    ICmp {
        pred: String,
        x: TypedConst,
        y: TypedConst,
    },
    FCmp {
        pred: String,
        x: TypedConst,
        y: TypedConst,
    },
    Select {
        cond: TypedConst,
        x: TypedConst,
        y: TypedConst,
    },
}

/// Instruction operand without its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueNode {
    Const(ConstNode),
    Local(LocalIdent),
    Metadata(MetadataNode),
}

impl ValueNode {
    pub fn local(name: &str) -> Self {
        ValueNode::Local(LocalIdent::from(name))
    }

    pub fn int(value: i128) -> Self {
        ValueNode::Const(ConstNode::Int(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub typ: TypeNode,
    pub value: ValueNode,
}

impl TypedValue {
    pub fn new(typ: TypeNode, value: ValueNode) -> Self {
        TypedValue { typ, value }
    }

    pub fn local(typ: TypeNode, name: &str) -> Self {
        Self::new(typ, ValueNode::local(name))
    }

    pub fn int(bits: u64, value: i128) -> Self {
        Self::new(TypeNode::Int(bits), ValueNode::int(value))
    }
}

impl From<TypedConst> for TypedValue {
    fn from(c: TypedConst) -> Self {
        TypedValue::new(c.typ, ValueNode::Const(c.value))
    }
}
