//! Source location tracking for error reporting
//!
//! Syntax tree nodes handed to the translator carry the location the
//! external parser found them at, so translation errors can point back
//! into the original assembly file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based, 0 if unknown)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Create a location with filename
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location of nodes that were built without a parser
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0, 0)
    }

    pub fn new_simple(line: u32, column: u32) -> Self {
        Self::new("<input>", line, column)
    }

    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location() {
        let loc = SourceLocation::new("foo.ll", 42, 10);
        assert_eq!(loc.filename, "foo.ll");
        assert_eq!(loc.line, 42);
        assert_eq!(loc.column, 10);
        assert_eq!(format!("{}", loc), "foo.ll:42:10");
        assert!(loc.is_known());
    }

    #[test]
    fn test_default_location_is_unknown() {
        let loc = SourceLocation::default();
        assert!(!loc.is_known());
        assert_eq!(loc.to_string(), "<unknown>:0:0");
    }
}
