//! Contract violations
//!
//! Raised by every constructor of the graph when the operands cannot form
//! a structurally valid entity. Messages carry the expected and actual
//! types in their canonical spelling.

use crate::enums::CastOp;
use crate::types::Type;
use lir_common::LirError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractViolation {
    #[error("store operands are not compatible: src={src}; dst={dst}")]
    StoreMismatch { src: Type, dst: Type },

    #[error("invalid store dst operand type; expected pointer destination, got {got}")]
    StoreDestination { got: Type },

    #[error("{inst} elem type mismatch, expected {expected}, got {got}")]
    ElemTypeMismatch {
        inst: &'static str,
        expected: Type,
        got: Type,
    },

    #[error("{inst} operand type mismatch: {x} and {y}")]
    OperandMismatch {
        inst: &'static str,
        x: Type,
        y: Type,
    },

    #[error("invalid {inst} operand type; expected {expected}, got {got}")]
    InvalidOperand {
        inst: &'static str,
        expected: &'static str,
        got: Type,
    },

    #[error("{inst} index {index} out of range for {typ}")]
    IndexOutOfRange {
        inst: &'static str,
        index: u64,
        typ: Type,
    },

    #[error("{inst} requires at least one index")]
    MissingIndices { inst: &'static str },

    #[error("invalid {inst} index into {typ}; struct indices must be constant integers")]
    NonConstantStructIndex { inst: &'static str, typ: Type },

    #[error("invalid {op} from {from} to {to}")]
    InvalidCast { op: CastOp, from: Type, to: Type },

    #[error("{inst} result type mismatch, expected {expected}, got {got}")]
    ResultTypeMismatch {
        inst: &'static str,
        expected: Type,
        got: Type,
    },

    #[error("{inst} produces no value")]
    NoResult { inst: &'static str },

    #[error("{inst} argument count mismatch, expected {expected}, got {got}")]
    ArgCountMismatch {
        inst: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{inst} argument {index} type mismatch, expected {expected}, got {got}")]
    ArgTypeMismatch {
        inst: &'static str,
        index: usize,
        expected: Type,
        got: Type,
    },

    #[error("{what} type mismatch, expected {expected}, got {got}")]
    TypeMismatch {
        what: &'static str,
        expected: Type,
        got: Type,
    },

    #[error("invalid {what} constant of type {typ}")]
    InvalidConstant { what: &'static str, typ: Type },

    #[error("floating-point constant {value} is not exactly representable as {typ}")]
    InexactFloat { value: f64, typ: Type },

    #[error("global identifier {ident} already defined")]
    DuplicateGlobal { ident: String },

    #[error("struct body of {typ} already defined")]
    StructBodyRedefined { typ: Type },

    #[error("{typ} is not an identified struct type")]
    NotIdentifiedStruct { typ: Type },

    #[error("type definition {typ} has no name")]
    UnnamedTypeDef { typ: Type },

    #[error("invalid {what} type of {ident}; expected pointer, got {got}")]
    NonPointerSymbol {
        what: &'static str,
        ident: String,
        got: Type,
    },

    #[error("invalid local ID in function {func}, expected %{expected}, got %{got}")]
    LocalIdOutOfOrder {
        func: String,
        expected: u64,
        got: u64,
    },
}

impl From<ContractViolation> for LirError {
    fn from(err: ContractViolation) -> Self {
        LirError::contract_violation(err.to_string())
    }
}
