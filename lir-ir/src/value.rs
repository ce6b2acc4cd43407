//! Operands
//!
//! A [`Value`] is a constant, a function-local value or a metadata operand.
//! Function-local values (parameters, block labels and instruction results)
//! are [`Local`] handles: a shared identifier slot plus a fixed type. The
//! slot is either explicit (`%x`, `%3`) or left unnamed until
//! `Func::assign_ids` hands out the next sequential number.

use crate::constant::Constant;
use crate::ident::LocalIdent;
use crate::metadata::Metadata;
use crate::types::Type;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Unnamed,
    Implicit(u64),
    Explicit(LocalIdent),
}

struct LocalData {
    slot: RwLock<Slot>,
    typ: Type,
}

/// Function-local value; equality is identity
#[derive(Clone)]
pub struct Local(Arc<LocalData>);

impl Local {
    pub fn new(ident: Option<LocalIdent>, typ: Type) -> Self {
        let slot = match ident {
            Some(ident) => Slot::Explicit(ident),
            None => Slot::Unnamed,
        };
        Local(Arc::new(LocalData {
            slot: RwLock::new(slot),
            typ,
        }))
    }

    pub fn unnamed(typ: Type) -> Self {
        Self::new(None, typ)
    }

    pub fn named(name: &str, typ: Type) -> Self {
        Self::new(Some(LocalIdent::from(name)), typ)
    }

    pub fn typ(&self) -> &Type {
        &self.0.typ
    }

    /// Current identifier; `None` while unnamed and not yet numbered
    pub fn ident(&self) -> Option<LocalIdent> {
        match &*self.0.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Unnamed => None,
            Slot::Implicit(id) => Some(LocalIdent::Id(*id)),
            Slot::Explicit(ident) => Some(ident.clone()),
        }
    }

    /// Set an explicit identifier, or clear it with `None`
    pub fn set_ident(&self, ident: Option<LocalIdent>) {
        let mut slot = self.0.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = match ident {
            Some(ident) => Slot::Explicit(ident),
            None => Slot::Unnamed,
        };
    }

    pub fn set_name(&self, name: &str) {
        self.set_ident(Some(LocalIdent::from(name)));
    }

    pub fn explicit_ident(&self) -> Option<LocalIdent> {
        match &*self.0.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Explicit(ident) => Some(ident.clone()),
            _ => None,
        }
    }

    pub(crate) fn assign_implicit(&self, id: u64) {
        let mut slot = self.0.slot.write().unwrap_or_else(PoisonError::into_inner);
        if !matches!(*slot, Slot::Explicit(_)) {
            *slot = Slot::Implicit(id);
        }
    }

    pub fn ptr_eq(&self, other: &Local) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// `%x`, or `%<badref>` for a local that was never numbered
    pub fn ident_string(&self) -> String {
        match self.ident() {
            Some(ident) => ident.to_string(),
            None => "%<badref>".to_string(),
        }
    }

    /// Spelling at the start of a basic block
    pub fn label_string(&self) -> String {
        match self.ident() {
            Some(ident) => ident.label(),
            None => "<badref>".to_string(),
        }
    }
}

impl PartialEq for Local {
    fn eq(&self, other: &Local) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Local({}: {})", self.ident_string(), self.typ())
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.typ(), self.ident_string())
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Const(Constant),
    Local(Local),
    Metadata(Box<Metadata>),
}

impl Value {
    pub fn typ(&self) -> Type {
        match self {
            Value::Const(c) => c.typ(),
            Value::Local(l) => l.typ().clone(),
            Value::Metadata(_) => Type::metadata(),
        }
    }

    /// Value text without its type
    pub fn ident(&self) -> String {
        match self {
            Value::Const(c) => c.ident(),
            Value::Local(l) => l.ident_string(),
            Value::Metadata(md) => md.to_string(),
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match self {
            Value::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_local(&self) -> Option<&Local> {
        match self {
            Value::Local(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Const(c) => write!(f, "{}", c),
            Value::Local(l) => write!(f, "{}", l),
            Value::Metadata(md) => write!(f, "metadata {}", md),
        }
    }
}

impl From<Constant> for Value {
    fn from(c: Constant) -> Self {
        Value::Const(c)
    }
}

impl From<Local> for Value {
    fn from(l: Local) -> Self {
        Value::Local(l)
    }
}

impl From<&Local> for Value {
    fn from(l: &Local) -> Self {
        Value::Local(l.clone())
    }
}

impl From<Metadata> for Value {
    fn from(md: Metadata) -> Self {
        Value::Metadata(Box::new(md))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_slots() {
        let x = Local::named("x", Type::i32());
        assert_eq!(x.to_string(), "i32 %x");

        let t = Local::unnamed(Type::i32());
        assert_eq!(t.ident(), None);
        t.assign_implicit(2);
        assert_eq!(t.ident_string(), "%2");

        // Explicit identifiers survive renumbering.
        x.assign_implicit(5);
        assert_eq!(x.ident_string(), "%x");
    }

    #[test]
    fn test_local_equality_is_identity() {
        let a = Local::named("a", Type::i8());
        let b = Local::named("a", Type::i8());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_value_display() {
        let v = Value::from(Constant::i32(7));
        assert_eq!(v.to_string(), "i32 7");
        assert_eq!(v.ident(), "7");
        assert_eq!(v.typ(), Type::i32());
    }
}
