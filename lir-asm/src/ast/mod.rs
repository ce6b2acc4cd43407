//! Syntax tree consumed by the generator
//!
//! These are the node shapes an assembly parser produces. Keywords
//! (linkage, opcodes, predicates, orderings, ...) are kept as the text the
//! parser saw; the generator checks them. The tree is serde-serializable so
//! a parser running in another process can hand it over as JSON.

mod insts;
mod metadata;
mod types;
mod values;

pub use insts::*;
pub use metadata::*;
pub use types::TypeNode;
pub use values::*;

use crate::error::TranslationError;
use lir_common::SourceLocation;
use lir_ir::{GlobalIdent, LocalIdent};
use serde::{Deserialize, Serialize};

/// A whole assembly file, entities in source order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub entities: Vec<TopLevelEntity>,
}

impl Module {
    pub fn new(entities: Vec<TopLevelEntity>) -> Self {
        Module { entities }
    }

    pub fn from_json(json: &str) -> Result<Self, TranslationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TranslationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopLevelEntity {
    SourceFilename(String),
    DataLayout(String),
    TargetTriple(String),
    ModuleAsm(String),
    TypeDef(TypeDefNode),
    ComdatDef(ComdatDefNode),
    Global(GlobalNode),
    IndirectSymbol(IndirectSymbolNode),
    Func(FuncNode),
    AttrGroupDef(AttrGroupDefNode),
    NamedMetadataDef(NamedMetadataDefNode),
    MetadataDef(MetadataDefNode),
    UseListOrder(UseListOrderNode),
    UseListOrderBb(UseListOrderBbNode),
}

/// `%name = type <typ>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefNode {
    pub name: String,
    pub typ: TypeNode,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `$name = comdat <kind>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComdatDefNode {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `comdat` or `comdat($name)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComdatNode {
    Implicit,
    Named(String),
}

/// Linkage and storage clauses shared by every global entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageNode {
    pub linkage: Option<String>,
    pub preemption: Option<String>,
    pub visibility: Option<String>,
    pub dll_storage_class: Option<String>,
    pub tls_model: Option<String>,
    pub unnamed_addr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalNode {
    pub name: GlobalIdent,
    #[serde(default)]
    pub clauses: LinkageNode,
    #[serde(default)]
    pub addr_space: u64,
    #[serde(default)]
    pub externally_initialized: bool,
    #[serde(default)]
    pub immutable: bool,
    pub content_type: TypeNode,
    #[serde(default)]
    pub init: Option<ConstNode>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub comdat: Option<ComdatNode>,
    #[serde(default)]
    pub align: Option<u64>,
    #[serde(default)]
    pub metadata: Vec<AttachmentNode>,
    #[serde(default)]
    pub func_attrs: Vec<AttrNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl GlobalNode {
    pub fn new(name: &str, content_type: TypeNode, init: Option<ConstNode>) -> Self {
        GlobalNode {
            name: GlobalIdent::from(name),
            clauses: LinkageNode::default(),
            addr_space: 0,
            externally_initialized: false,
            immutable: false,
            content_type,
            init,
            section: None,
            partition: None,
            comdat: None,
            align: None,
            metadata: Vec::new(),
            func_attrs: Vec::new(),
            location: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndirectKind {
    Alias,
    IFunc,
}

/// Target of an alias or ifunc: a typed constant or a bare pointer
/// expression (`bitcast`, `addrspacecast`, `inttoptr`, `getelementptr`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndirectTarget {
    Const(TypedConst),
    Expr(ExprNode),
}

/// `@name = [clauses] alias|ifunc <content type>, <target>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndirectSymbolNode {
    pub name: GlobalIdent,
    pub kind: IndirectKind,
    #[serde(default)]
    pub clauses: LinkageNode,
    pub content_type: TypeNode,
    pub target: IndirectTarget,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamNode {
    pub typ: TypeNode,
    #[serde(default)]
    pub attrs: Vec<AttrNode>,
    #[serde(default)]
    pub name: Option<LocalIdent>,
}

impl ParamNode {
    pub fn new(typ: TypeNode, name: Option<&str>) -> Self {
        ParamNode {
            typ,
            attrs: Vec::new(),
            name: name.map(LocalIdent::from),
        }
    }
}

/// Everything of a function before its body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncHeader {
    pub name: GlobalIdent,
    #[serde(default)]
    pub clauses: LinkageNode,
    #[serde(default)]
    pub calling_conv: Option<String>,
    #[serde(default)]
    pub ret_attrs: Vec<AttrNode>,
    pub ret_type: TypeNode,
    #[serde(default)]
    pub params: Vec<ParamNode>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub addr_space: u64,
    #[serde(default)]
    pub func_attrs: Vec<AttrNode>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub comdat: Option<ComdatNode>,
    #[serde(default)]
    pub align: Option<u64>,
    #[serde(default)]
    pub gc: Option<String>,
    #[serde(default)]
    pub prefix: Option<TypedConst>,
    #[serde(default)]
    pub prologue: Option<TypedConst>,
    #[serde(default)]
    pub personality: Option<TypedConst>,
    #[serde(default)]
    pub metadata: Vec<AttachmentNode>,
}

impl FuncHeader {
    pub fn new(name: &str, ret_type: TypeNode, params: Vec<ParamNode>) -> Self {
        FuncHeader {
            name: GlobalIdent::from(name),
            clauses: LinkageNode::default(),
            calling_conv: None,
            ret_attrs: Vec::new(),
            ret_type,
            params,
            variadic: false,
            addr_space: 0,
            func_attrs: Vec::new(),
            section: None,
            partition: None,
            comdat: None,
            align: None,
            gc: None,
            prefix: None,
            prologue: None,
            personality: None,
            metadata: Vec::new(),
        }
    }
}

/// `declare` (no body) or `define`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncNode {
    pub header: FuncHeader,
    #[serde(default)]
    pub body: Option<FuncBody>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl FuncNode {
    pub fn declare(header: FuncHeader) -> Self {
        FuncNode {
            header,
            body: None,
            location: SourceLocation::default(),
        }
    }

    pub fn define(header: FuncHeader, body: FuncBody) -> Self {
        FuncNode {
            header,
            body: Some(body),
            location: SourceLocation::default(),
        }
    }
}

/// `attributes #id = { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrGroupDefNode {
    pub id: u64,
    pub attrs: Vec<AttrNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `!name = !{!0, ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMetadataDefNode {
    pub name: String,
    pub nodes: Vec<u64>,
}

/// `!id = [distinct] node`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDefNode {
    pub id: u64,
    #[serde(default)]
    pub distinct: bool,
    pub node: MetadataNode,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `uselistorder_bb @func, %block, { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseListOrderBbNode {
    pub func: GlobalIdent,
    pub block: LocalIdent,
    pub indices: Vec<u64>,
    #[serde(default)]
    pub location: SourceLocation,
}
