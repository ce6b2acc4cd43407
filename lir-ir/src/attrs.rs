//! Attributes
//!
//! Parameter, return and function attributes. Keyword attributes are kept
//! as their spelling so that target-specific keywords need no variant of
//! their own.

use crate::enc;
use crate::types::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// `nounwind`, `noalias`, `zeroext`, ...
    Keyword(String),
    /// `"key"` or `"key"="value"`
    Str { key: String, value: Option<String> },
    Align(u64),
    AlignStack(u64),
    AllocSize { elem: u32, count: Option<u32> },
    Dereferenceable(u64),
    DereferenceableOrNull(u64),
    ByVal(Option<Type>),
    SRet(Option<Type>),
    /// `#N`
    Group(u64),
}

impl Attribute {
    pub fn keyword(name: impl Into<String>) -> Self {
        Attribute::Keyword(name.into())
    }

    /// Spelling inside `attributes #N = { ... }`, where alignments use the
    /// `align=N` form.
    fn fmt_in_group(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Align(n) => write!(f, "align={}", n),
            Attribute::AlignStack(n) => write!(f, "alignstack={}", n),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Keyword(name) => f.write_str(name),
            Attribute::Str { key, value } => {
                f.write_str(&enc::quote(key))?;
                if let Some(value) = value {
                    write!(f, "={}", enc::quote(value))?;
                }
                Ok(())
            }
            Attribute::Align(n) => write!(f, "align {}", n),
            Attribute::AlignStack(n) => write!(f, "alignstack({})", n),
            Attribute::AllocSize { elem, count } => match count {
                Some(count) => write!(f, "allocsize({}, {})", elem, count),
                None => write!(f, "allocsize({})", elem),
            },
            Attribute::Dereferenceable(n) => write!(f, "dereferenceable({})", n),
            Attribute::DereferenceableOrNull(n) => write!(f, "dereferenceable_or_null({})", n),
            Attribute::ByVal(None) => f.write_str("byval"),
            Attribute::ByVal(Some(t)) => write!(f, "byval({})", t),
            Attribute::SRet(None) => f.write_str("sret"),
            Attribute::SRet(Some(t)) => write!(f, "sret({})", t),
            Attribute::Group(id) => f.write_str(&enc::attr_group_id(*id)),
        }
    }
}

/// `attributes #0 = { nounwind "frame-pointer"="all" }`
#[derive(Debug, Clone, PartialEq)]
pub struct AttrGroupDef {
    pub id: u64,
    pub attrs: Vec<Attribute>,
}

impl fmt::Display for AttrGroupDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attributes {} = {{", enc::attr_group_id(self.id))?;
        for attr in &self.attrs {
            f.write_str(" ")?;
            attr.fmt_in_group(f)?;
        }
        f.write_str(" }")
    }
}

/// ` a b c` with a leading space per attribute
pub(crate) fn fmt_attrs(f: &mut fmt::Formatter<'_>, attrs: &[Attribute]) -> fmt::Result {
    for attr in attrs {
        write!(f, " {}", attr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_spelling() {
        assert_eq!(Attribute::keyword("nounwind").to_string(), "nounwind");
        assert_eq!(
            Attribute::Str {
                key: "frame-pointer".to_string(),
                value: Some("all".to_string())
            }
            .to_string(),
            "\"frame-pointer\"=\"all\""
        );
        assert_eq!(Attribute::Align(8).to_string(), "align 8");
        assert_eq!(Attribute::ByVal(Some(Type::i32())).to_string(), "byval(i32)");
        assert_eq!(
            Attribute::AllocSize { elem: 0, count: Some(1) }.to_string(),
            "allocsize(0, 1)"
        );
        assert_eq!(Attribute::Group(2).to_string(), "#2");
    }

    #[test]
    fn test_group_definition() {
        let def = AttrGroupDef {
            id: 0,
            attrs: vec![Attribute::keyword("noinline"), Attribute::AlignStack(16)],
        };
        assert_eq!(def.to_string(), "attributes #0 = { noinline alignstack=16 }");
    }
}
