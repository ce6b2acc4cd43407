//! Error handling shared by the LIR crates
//!
//! Each crate reports its own precise error type (`ContractViolation` in
//! `lir-ir`, `TranslationError` in `lir-asm`). Both convert into
//! [`LirError`] so a caller can pick a single error type at its own API
//! boundary.

use crate::source_loc::SourceLocation;
use thiserror::Error;

/// Umbrella error type for every phase of the IR library
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LirError {
    /// Malformed or unsupported syntax tree input
    #[error("Translation error at {location}: {message}")]
    Translation {
        location: SourceLocation,
        message: String,
    },

    /// Structurally invalid IR built through the programmatic API
    #[error("Contract violation: {message}")]
    Contract { message: String },

    /// The syntax tree or configuration could not be decoded
    #[error("Malformed input: {message}")]
    Input { message: String },
}

impl LirError {
    pub fn translation_error(message: String, location: SourceLocation) -> Self {
        LirError::Translation { location, message }
    }

    pub fn contract_violation(message: String) -> Self {
        LirError::Contract { message }
    }

    pub fn input_error(message: String) -> Self {
        LirError::Input { message }
    }

    /// Source location of the error, if it has one
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            LirError::Translation { location, .. } => Some(location),
            _ => None,
        }
    }
}
