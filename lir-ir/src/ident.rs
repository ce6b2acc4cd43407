//! Global and local identifiers
//!
//! A global entity's identifier lives in a shared [`Symbol`] cell; every
//! constant referring to the entity holds a clone of that cell, so a
//! rename is observed by all references.

use crate::enc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// `@name` or `@42`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlobalIdent {
    Name(String),
    Id(u64),
}

impl fmt::Display for GlobalIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalIdent::Name(name) => f.write_str(&enc::global_name(name)),
            GlobalIdent::Id(id) => f.write_str(&enc::global_id(*id)),
        }
    }
}

impl From<&str> for GlobalIdent {
    fn from(name: &str) -> Self {
        GlobalIdent::Name(name.to_string())
    }
}

impl From<String> for GlobalIdent {
    fn from(name: String) -> Self {
        GlobalIdent::Name(name)
    }
}

/// `%name` or `%42`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocalIdent {
    Name(String),
    Id(u64),
}

impl LocalIdent {
    /// Spelling at the start of a basic block, without `%`
    pub fn label(&self) -> String {
        match self {
            LocalIdent::Name(name) => enc::label_name(name),
            LocalIdent::Id(id) => id.to_string(),
        }
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            LocalIdent::Id(id) => Some(*id),
            LocalIdent::Name(_) => None,
        }
    }
}

impl fmt::Display for LocalIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalIdent::Name(name) => f.write_str(&enc::local_name(name)),
            LocalIdent::Id(id) => f.write_str(&enc::local_id(*id)),
        }
    }
}

impl From<&str> for LocalIdent {
    fn from(name: &str) -> Self {
        LocalIdent::Name(name.to_string())
    }
}

/// Shared identifier cell of a global entity
#[derive(Clone)]
pub struct Symbol(Arc<RwLock<GlobalIdent>>);

impl Symbol {
    pub fn new(ident: GlobalIdent) -> Self {
        Symbol(Arc::new(RwLock::new(ident)))
    }

    pub fn ident(&self) -> GlobalIdent {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn rename(&self, ident: GlobalIdent) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = ident;
    }

    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        self.ptr_eq(other) || self.ident() == other.ident()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ident())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.ident())
    }
}
