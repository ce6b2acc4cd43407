//! Function body syntax: blocks, instructions and terminators

use super::metadata::{AttachmentNode, AttrNode};
use super::types::TypeNode;
use super::values::{TypedValue, ValueNode};
use lir_common::SourceLocation;
use lir_ir::LocalIdent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FuncBody {
    pub blocks: Vec<BlockNode>,
    #[serde(default)]
    pub use_list_orders: Vec<UseListOrderNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    /// Label; unnamed blocks take the next local ID
    #[serde(default)]
    pub name: Option<LocalIdent>,
    #[serde(default)]
    pub insts: Vec<InstNode>,
    pub term: TermNode,
}

/// `uselistorder <ty> <value>, { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseListOrderNode {
    pub value: TypedValue,
    pub indices: Vec<u64>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `ordering` with an optional `syncscope("...")`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicNode {
    pub ordering: String,
    #[serde(default)]
    pub sync_scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingNode {
    pub x: ValueNode,
    pub pred: LocalIdent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgNode {
    pub value: TypedValue,
    #[serde(default)]
    pub attrs: Vec<AttrNode>,
}

/// Callee and arguments shared by `call` and `invoke`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallNode {
    #[serde(default)]
    pub calling_conv: Option<String>,
    #[serde(default)]
    pub ret_attrs: Vec<AttrNode>,
    /// Return type, or the full signature for variadic callees
    pub typ: TypeNode,
    pub callee: ValueNode,
    #[serde(default)]
    pub args: Vec<ArgNode>,
    #[serde(default)]
    pub func_attrs: Vec<AttrNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstNode {
    /// Result name; value-producing instructions without one take the next
    /// local ID
    #[serde(default)]
    pub name: Option<LocalIdent>,
    pub kind: InstKindNode,
    #[serde(default)]
    pub metadata: Vec<AttachmentNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl InstNode {
    pub fn new(name: Option<&str>, kind: InstKindNode) -> Self {
        InstNode {
            name: name.map(LocalIdent::from),
            kind,
            metadata: Vec::new(),
            location: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstKindNode {
    FNeg {
        #[serde(default)]
        flags: Vec<String>,
        x: TypedValue,
    },
    /// Both operands share the type written before `x`
    Binary {
        op: String,
        #[serde(default)]
        flags: Vec<String>,
        x: TypedValue,
        y: ValueNode,
    },
    ExtractElement {
        x: TypedValue,
        index: TypedValue,
    },
    InsertElement {
        x: TypedValue,
        elem: TypedValue,
        index: TypedValue,
    },
    ShuffleVector {
        x: TypedValue,
        y: TypedValue,
        mask: TypedValue,
    },
    ExtractValue {
        x: TypedValue,
        indices: Vec<u64>,
    },
    InsertValue {
        x: TypedValue,
        elem: TypedValue,
        indices: Vec<u64>,
    },
    Alloca {
        elem_type: TypeNode,
        #[serde(default)]
        count: Option<TypedValue>,
        #[serde(default)]
        align: Option<u64>,
        #[serde(default)]
        addr_space: u64,
        #[serde(default)]
        in_alloca: bool,
        #[serde(default)]
        swift_error: bool,
    },
    Load {
        elem_type: TypeNode,
        src: TypedValue,
        #[serde(default)]
        volatile: bool,
        #[serde(default)]
        atomic: Option<AtomicNode>,
        #[serde(default)]
        align: Option<u64>,
    },
    Store {
        src: TypedValue,
        dst: TypedValue,
        #[serde(default)]
        volatile: bool,
        #[serde(default)]
        atomic: Option<AtomicNode>,
        #[serde(default)]
        align: Option<u64>,
    },
    Fence {
        atomic: AtomicNode,
    },
    CmpXchg {
        ptr: TypedValue,
        cmp: TypedValue,
        new: TypedValue,
        success: String,
        failure: String,
        #[serde(default)]
        sync_scope: Option<String>,
        #[serde(default)]
        weak: bool,
        #[serde(default)]
        volatile: bool,
    },
    AtomicRmw {
        op: String,
        dst: TypedValue,
        x: TypedValue,
        atomic: AtomicNode,
        #[serde(default)]
        volatile: bool,
    },
    GetElementPtr {
        #[serde(default)]
        in_bounds: bool,
        elem_type: TypeNode,
        src: TypedValue,
        #[serde(default)]
        indices: Vec<TypedValue>,
    },
    Cast {
        op: String,
        from: TypedValue,
        to: TypeNode,
    },
    ICmp {
        pred: String,
        x: TypedValue,
        y: ValueNode,
    },
    FCmp {
        pred: String,
        #[serde(default)]
        flags: Vec<String>,
        x: TypedValue,
        y: ValueNode,
    },
    Phi {
        typ: TypeNode,
        incs: Vec<IncomingNode>,
    },
    Select {
        cond: TypedValue,
        x: TypedValue,
        y: TypedValue,
    },
    Freeze {
        x: TypedValue,
    },
    Call {
        #[serde(default)]
        tail: Option<String>,
        #[serde(default)]
        flags: Vec<String>,
        call: CallNode,
    },
    VaArg {
        list: TypedValue,
        arg_type: TypeNode,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermNode {
    /// Result name of a value-producing `invoke`
    #[serde(default)]
    pub name: Option<LocalIdent>,
    pub kind: TermKindNode,
    #[serde(default)]
    pub metadata: Vec<AttachmentNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl TermNode {
    pub fn new(kind: TermKindNode) -> Self {
        TermNode {
            name: None,
            kind,
            metadata: Vec::new(),
            location: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseNode {
    pub x: TypedValue,
    pub target: LocalIdent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKindNode {
    Ret {
        #[serde(default)]
        x: Option<TypedValue>,
    },
    Br {
        target: LocalIdent,
    },
    CondBr {
        cond: TypedValue,
        target_true: LocalIdent,
        target_false: LocalIdent,
    },
    Switch {
        x: TypedValue,
        default: LocalIdent,
        #[serde(default)]
        cases: Vec<CaseNode>,
    },
    IndirectBr {
        addr: TypedValue,
        #[serde(default)]
        targets: Vec<LocalIdent>,
    },
    Invoke {
        call: CallNode,
        normal: LocalIdent,
        exception: LocalIdent,
    },
    Resume {
        x: TypedValue,
    },
    Unreachable,
}
