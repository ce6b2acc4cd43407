//! Translation error types

use lir_common::{LirError, SourceLocation};
use lir_ir::{ContractViolation, Type, UnknownKeyword};
use thiserror::Error;

/// Recoverable failure to translate a syntax tree
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("global identifier {ident} already present")]
    DuplicateGlobal { ident: String },

    #[error("unable to locate type definition of named type %{name}")]
    UnknownType { name: String },

    #[error("invalid recursive type definition of %{name}")]
    RecursiveTypeDef { name: String },

    #[error("unable to locate comdat identifier ${name}")]
    UnknownComdat { name: String },

    #[error("unable to locate global identifier {ident}")]
    UnknownGlobal { ident: String },

    #[error("unable to locate local identifier {ident} in function {func}")]
    UnknownLocal { ident: String, func: String },

    #[error("invalid local ID in function {func}, expected %{expected}, got %{got}")]
    LocalIdSequence { func: String, expected: u64, got: u64 },

    #[error("local identifier {ident} redefined in function {func}")]
    DuplicateLocal { ident: String, func: String },

    #[error("support for {what} not yet implemented")]
    Unsupported { what: String },

    #[error(transparent)]
    InvalidKeyword(#[from] UnknownKeyword),

    #[error("{what} type mismatch; expected {expected}, got {got}")]
    TypeMismatch {
        what: &'static str,
        expected: Type,
        got: Type,
    },

    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// Error raised while translating one entity of the module
    #[error("{entity} at {location}: {source}")]
    Context {
        entity: String,
        location: SourceLocation,
        #[source]
        source: Box<TranslationError>,
    },

    #[error("malformed syntax tree: {0}")]
    Json(#[from] serde_json::Error),
}

impl TranslationError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        TranslationError::Unsupported { what: what.into() }
    }

    /// Attach the entity being translated and its location
    pub fn context(self, entity: impl ToString, location: &SourceLocation) -> Self {
        match self {
            // The innermost entity is the most precise.
            err @ TranslationError::Context { .. } => err,
            err => TranslationError::Context {
                entity: entity.to_string(),
                location: location.clone(),
                source: Box::new(err),
            },
        }
    }

    /// The error without its entity context
    pub fn root(&self) -> &TranslationError {
        match self {
            TranslationError::Context { source, .. } => source.root(),
            err => err,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            TranslationError::Context { location, .. } => Some(location),
            _ => None,
        }
    }
}

impl From<TranslationError> for LirError {
    fn from(err: TranslationError) -> Self {
        match err {
            TranslationError::Contract(violation) => violation.into(),
            TranslationError::Json(err) => LirError::input_error(err.to_string()),
            err @ TranslationError::Context { .. } => {
                let location = err.location().cloned().unwrap_or_default();
                LirError::translation_error(err.to_string(), location)
            }
            err => LirError::translation_error(err.to_string(), SourceLocation::unknown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_once() {
        let loc = SourceLocation::new("a.ll", 4, 1);
        let err = TranslationError::UnknownComdat {
            name: "foo".to_string(),
        }
        .context("@x", &loc)
        .context("@outer", &SourceLocation::unknown());
        assert_eq!(
            err.to_string(),
            "@x at a.ll:4:1: unable to locate comdat identifier $foo"
        );
        assert!(matches!(err.root(), TranslationError::UnknownComdat { .. }));
    }

    #[test]
    fn test_conversion_into_lir_error() {
        let err: LirError = TranslationError::UnknownType {
            name: "T".to_string(),
        }
        .context("@g", &SourceLocation::new("m.ll", 2, 5))
        .into();
        assert_eq!(err.location().map(|l| l.line), Some(2));

        let contract: LirError = TranslationError::from(ContractViolation::NoResult { inst: "store" }).into();
        assert!(matches!(contract, LirError::Contract { .. }));
    }
}
