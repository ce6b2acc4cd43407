//! LIR - Common Types and Utilities
//!
//! This crate contains the source location type and the umbrella error
//! type shared by the IR model (`lir-ir`) and the syntax tree translator
//! (`lir-asm`).

pub mod error;
pub mod source_loc;

pub use error::LirError;
pub use source_loc::SourceLocation;
