//! LIR - Intermediate Representation
//!
//! This crate defines the in-memory graph of the textual IR language:
//! types, constants, instructions, basic blocks, functions and modules,
//! together with the construction-time type checks and the canonical
//! printer (every entity implements `Display`).
//!
//! ## Architecture
//!
//! - `types` - Type system (Type, equality, rendering)
//! - `constant` - Immutable constants and constant expressions
//! - `value` - Operands: constants, function-local values, metadata
//! - `inst` - Instructions and terminators with their type checks
//! - `block`, `func`, `global`, `module` - Entities owning the graph
//! - `metadata`, `attrs`, `enums` - Clause payloads
//! - `gep` - Aggregate and getelementptr result types
//! - `enc` - Identifier and string literal encoding

pub mod attrs;
pub mod block;
pub mod constant;
pub mod enc;
pub mod enums;
pub mod error;
pub mod func;
pub mod gep;
pub mod global;
pub mod ident;
pub mod inst;
pub mod metadata;
pub mod module;
pub mod types;
pub mod value;

mod check;

pub use attrs::{AttrGroupDef, Attribute};
pub use block::Block;
pub use constant::{BlockAddress, Constant, Expr, ExprKind, GlobalRef};
pub use enums::*;
pub use error::ContractViolation;
pub use func::{Func, Param, UseListOrder};
pub use gep::GepIndex;
pub use global::{Alias, ComdatDef, Global, IFunc, LinkageClauses};
pub use ident::{GlobalIdent, LocalIdent, Symbol};
pub use inst::{Arg, Atomic, CallSite, Incoming, Inst, InstKind, Term, TermKind};
pub use metadata::{FieldValue, Metadata, MetadataAttachment, MetadataDef, NamedMetadataDef};
pub use module::{AliasId, FuncId, GlobalId, IFuncId, Module, SymbolId, TypeDef, UseListOrderBb};
pub use types::{AddrSpace, FloatKind, FuncType, Type, TypeKind};
pub use value::{Local, Value};
