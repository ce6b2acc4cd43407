//! Type syntax

use serde::{Deserialize, Serialize};

/// A type as written in the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeNode {
    Void,
    Func {
        ret: Box<TypeNode>,
        #[serde(default)]
        params: Vec<TypeNode>,
        #[serde(default)]
        variadic: bool,
    },
    /// `iN`
    Int(u64),
    /// `half`, `float`, `double`, `x86_fp80`, `fp128` or `ppc_fp128`
    Float(String),
    Mmx,
    Pointer {
        elem: Box<TypeNode>,
        #[serde(default)]
        addr_space: u64,
    },
    Vector {
        len: u64,
        elem: Box<TypeNode>,
        #[serde(default)]
        scalable: bool,
    },
    Label,
    Token,
    Metadata,
    Array {
        len: u64,
        elem: Box<TypeNode>,
    },
    Struct {
        fields: Vec<TypeNode>,
        #[serde(default)]
        packed: bool,
    },
    /// `opaque`; only valid as the body of a type definition
    Opaque,
    /// `%name` reference to a type definition
    Named(String),
}

impl TypeNode {
    pub fn int(bits: u64) -> Self {
        TypeNode::Int(bits)
    }

    pub fn pointer(elem: TypeNode) -> Self {
        TypeNode::Pointer {
            elem: Box::new(elem),
            addr_space: 0,
        }
    }

    pub fn named(name: &str) -> Self {
        TypeNode::Named(name.to_string())
    }

    pub fn func(ret: TypeNode, params: Vec<TypeNode>) -> Self {
        TypeNode::Func {
            ret: Box::new(ret),
            params,
            variadic: false,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeNode::Void)
    }
}
