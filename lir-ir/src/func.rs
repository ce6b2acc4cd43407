//! Functions

use crate::attrs::{fmt_attrs, Attribute};
use crate::block::Block;
use crate::enc;
use crate::enums::{CallingConv, DllStorageClass, Linkage, Preemption, UnnamedAddr, Visibility};
use crate::error::ContractViolation;
use crate::global::{fmt_comdat, ComdatDef};
use crate::constant::Constant;
use crate::ident::{GlobalIdent, LocalIdent, Symbol};
use crate::metadata::{fmt_attachments, MetadataAttachment};
use crate::types::{AddrSpace, FuncType, Type};
use crate::value::{Local, Value};
use log::{trace, warn};
use std::fmt;

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    local: Local,
    pub attrs: Vec<Attribute>,
}

impl Param {
    pub fn new(name: Option<LocalIdent>, typ: Type) -> Self {
        Param::from_local(Local::new(name, typ))
    }

    pub fn named(name: &str, typ: Type) -> Self {
        Param::new(Some(LocalIdent::from(name)), typ)
    }

    pub fn from_local(local: Local) -> Self {
        Param {
            local,
            attrs: Vec::new(),
        }
    }

    pub fn local(&self) -> &Local {
        &self.local
    }

    pub fn typ(&self) -> &Type {
        self.local.typ()
    }

    pub fn value(&self) -> Value {
        Value::Local(self.local.clone())
    }
}

/// `uselistorder i32 %x, { 1, 0 }`
#[derive(Debug, Clone, PartialEq)]
pub struct UseListOrder {
    pub value: Value,
    pub indices: Vec<u64>,
}

pub(crate) fn fmt_index_list(f: &mut fmt::Formatter<'_>, indices: &[u64]) -> fmt::Result {
    f.write_str("{ ")?;
    for (i, index) in indices.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", index)?;
    }
    f.write_str(" }")
}

impl fmt::Display for UseListOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uselistorder {}, ", self.value)?;
        fmt_index_list(f, &self.indices)
    }
}

/// Function declaration or definition
#[derive(Debug, Clone)]
pub struct Func {
    symbol: Symbol,
    typ: Type,
    params: Vec<Param>,
    pub blocks: Vec<Block>,
    pub linkage: Option<Linkage>,
    pub preemption: Option<Preemption>,
    pub visibility: Option<Visibility>,
    pub dll_storage_class: Option<DllStorageClass>,
    pub calling_conv: Option<CallingConv>,
    pub ret_attrs: Vec<Attribute>,
    pub unnamed_addr: Option<UnnamedAddr>,
    pub func_attrs: Vec<Attribute>,
    pub section: Option<String>,
    pub partition: Option<String>,
    pub comdat: Option<ComdatDef>,
    pub align: Option<u64>,
    pub gc: Option<String>,
    pub prefix: Option<Constant>,
    pub prologue: Option<Constant>,
    pub personality: Option<Constant>,
    pub metadata: Vec<MetadataAttachment>,
    pub use_list_orders: Vec<UseListOrder>,
}

impl Func {
    /// Non-variadic function with the given parameters
    pub fn new(ident: impl Into<GlobalIdent>, ret: Type, params: Vec<Param>) -> Self {
        let sig = Type::func(ret, params.iter().map(|p| p.typ().clone()).collect(), false);
        let mut func = Func::skeleton(ident.into(), sig, AddrSpace::default());
        func.params = params;
        func
    }

    /// Function of signature `sig` (which must be a function type) with
    /// unnamed parameters
    pub fn with_sig(
        ident: impl Into<GlobalIdent>,
        sig: Type,
        addr_space: AddrSpace,
    ) -> Result<Self, ContractViolation> {
        let ident = ident.into();
        if !sig.is_func() {
            return Err(ContractViolation::InvalidOperand {
                inst: "function",
                expected: "function signature",
                got: sig,
            });
        }
        Ok(Func::skeleton(ident, sig, addr_space))
    }

    fn skeleton(ident: GlobalIdent, sig: Type, addr_space: AddrSpace) -> Self {
        let params = sig
            .func_type()
            .map(|ft| ft.params.iter().map(|t| Param::new(None, t.clone())).collect())
            .unwrap_or_default();
        Func {
            symbol: Symbol::new(ident),
            typ: Type::pointer_in(sig, addr_space),
            params,
            blocks: Vec::new(),
            linkage: None,
            preemption: None,
            visibility: None,
            dll_storage_class: None,
            calling_conv: None,
            ret_attrs: Vec::new(),
            unnamed_addr: None,
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
            use_list_orders: Vec::new(),
        }
    }

    pub fn ident(&self) -> GlobalIdent {
        self.symbol.ident()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Pointer to the signature
    pub fn typ(&self) -> &Type {
        &self.typ
    }

    pub fn sig(&self) -> &Type {
        self.typ.pointee().unwrap_or(&self.typ)
    }

    pub fn func_type(&self) -> Option<&FuncType> {
        self.sig().func_type()
    }

    pub fn addr_space(&self) -> AddrSpace {
        self.typ.addr_space()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [Param] {
        &mut self.params
    }

    /// Replace the parameters; their types must match the signature
    pub fn set_params(&mut self, params: Vec<Param>) -> Result<(), ContractViolation> {
        let expected: &[Type] = self.func_type().map(|ft| ft.params.as_slice()).unwrap_or(&[]);
        if expected.len() != params.len() {
            return Err(ContractViolation::ArgCountMismatch {
                inst: "function parameter list",
                expected: expected.len(),
                got: params.len(),
            });
        }
        for (index, (want, param)) in expected.iter().zip(&params).enumerate() {
            if want != param.typ() {
                return Err(ContractViolation::ArgTypeMismatch {
                    inst: "function parameter list",
                    index,
                    expected: want.clone(),
                    got: param.typ().clone(),
                });
            }
        }
        self.params = params;
        Ok(())
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append a new, empty basic block
    pub fn new_block(&mut self, name: Option<&str>) -> &mut Block {
        self.blocks.push(Block::new(name.map(LocalIdent::from)));
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Number every unnamed parameter, block label and instruction result
    /// in definition order, checking that explicit numbers follow the same
    /// sequence.
    pub fn assign_ids(&self) -> Result<(), ContractViolation> {
        let mut next = 0u64;
        let locals = self
            .params
            .iter()
            .map(Param::local)
            .chain(self.blocks.iter().flat_map(Block::locals));
        for local in locals {
            match local.explicit_ident() {
                Some(LocalIdent::Id(id)) => {
                    if id != next {
                        return Err(ContractViolation::LocalIdOutOfOrder {
                            func: self.ident().to_string(),
                            expected: next,
                            got: id,
                        });
                    }
                    next += 1;
                }
                Some(LocalIdent::Name(_)) => {}
                None => {
                    local.assign_implicit(next);
                    next += 1;
                }
            }
        }
        trace!("Numbered {} locals in {}", next, self.ident());
        Ok(())
    }

    fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(linkage) = &self.linkage {
            write!(f, " {}", linkage)?;
        }
        if let Some(preemption) = &self.preemption {
            write!(f, " {}", preemption)?;
        }
        if let Some(visibility) = &self.visibility {
            write!(f, " {}", visibility)?;
        }
        if let Some(dll) = &self.dll_storage_class {
            write!(f, " {}", dll)?;
        }
        if let Some(cc) = &self.calling_conv {
            write!(f, " {}", cc)?;
        }
        fmt_attrs(f, &self.ret_attrs)?;
        let (ret, variadic) = match self.func_type() {
            Some(ft) => (ft.ret.clone(), ft.variadic),
            None => (Type::void(), false),
        };
        write!(f, " {} {}(", ret, self.ident())?;
        let declaration = self.is_declaration();
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param.typ())?;
            fmt_attrs(f, &param.attrs)?;
            if !declaration || param.local.explicit_ident().is_some() {
                write!(f, " {}", param.local.ident_string())?;
            }
        }
        if variadic {
            if self.params.is_empty() {
                f.write_str("...")?;
            } else {
                f.write_str(", ...")?;
            }
        }
        f.write_str(")")?;
        if let Some(unnamed_addr) = &self.unnamed_addr {
            write!(f, " {}", unnamed_addr)?;
        }
        if !self.addr_space().is_default() {
            write!(f, " {}", self.addr_space())?;
        }
        fmt_attrs(f, &self.func_attrs)?;
        if let Some(section) = &self.section {
            write!(f, " section {}", enc::quote(section))?;
        }
        if let Some(partition) = &self.partition {
            write!(f, " partition {}", enc::quote(partition))?;
        }
        if let Some(comdat) = &self.comdat {
            fmt_comdat(f, comdat, &self.ident())?;
        }
        if let Some(align) = self.align {
            write!(f, " align {}", align)?;
        }
        if let Some(gc) = &self.gc {
            write!(f, " gc {}", enc::quote(gc))?;
        }
        if let Some(prefix) = &self.prefix {
            write!(f, " prefix {}", prefix)?;
        }
        if let Some(prologue) = &self.prologue {
            write!(f, " prologue {}", prologue)?;
        }
        if let Some(personality) = &self.personality {
            write!(f, " personality {}", personality)?;
        }
        fmt_attachments(f, &self.metadata, false)
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Explicit IDs are printed as given even when out of sequence.
        if let Err(err) = self.assign_ids() {
            warn!("Printing {} with invalid local IDs: {}", self.ident(), err);
        }
        if self.is_declaration() {
            f.write_str("declare")?;
            return self.fmt_header(f);
        }
        f.write_str("define")?;
        self.fmt_header(f)?;
        f.write_str(" {\n")?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", block)?;
        }
        for order in &self.use_list_orders {
            writeln!(f, "\t{}", order)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::BinaryOp;
    use crate::inst::{Inst, Term};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declaration() {
        let f = Func::with_sig(
            "printf",
            Type::func(Type::i32(), vec![Type::pointer(Type::i8())], true),
            AddrSpace::default(),
        )
        .unwrap();
        assert_eq!(f.to_string(), "declare i32 @printf(i8*, ...)");
        assert!(Func::with_sig("x", Type::i32(), AddrSpace::default()).is_err());
    }

    #[test]
    fn test_implicit_numbering() {
        let mut f = Func::new("inc", Type::i32(), vec![Param::new(None, Type::i32())]);
        let x = f.params()[0].value();
        let entry = f.new_block(None);
        let sum = entry
            .append(Inst::binary(BinaryOp::Add, x, Constant::i32(1)).unwrap())
            .unwrap();
        entry.set_term(Term::ret(Some(sum)).unwrap());

        assert_eq!(
            f.to_string(),
            "define i32 @inc(i32 %0) {\n1:\n\t%2 = add i32 %0, 1\n\tret i32 %2\n}"
        );
    }

    #[test]
    fn test_explicit_ids_must_follow_sequence() {
        let f = Func::new(
            "f",
            Type::void(),
            vec![Param::new(Some(LocalIdent::Id(1)), Type::i32())],
        );
        let err = f.assign_ids().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid local ID in function @f, expected %0, got %1"
        );
    }

    #[test]
    fn test_header_clause_order() {
        let mut f = Func::new("g", Type::void(), vec![]);
        f.linkage = Some(Linkage::Internal);
        f.calling_conv = Some(CallingConv::Fast);
        f.unnamed_addr = Some(UnnamedAddr::UnnamedAddr);
        f.func_attrs.push(Attribute::Group(0));
        f.section = Some(".text.g".to_string());
        f.align = Some(16);
        f.gc = Some("shadow-stack".to_string());
        f.new_block(Some("entry")).set_term(Term::ret_void());
        assert_eq!(
            f.to_string(),
            "define internal fastcc void @g() unnamed_addr #0 section \".text.g\" align 16 gc \"shadow-stack\" {\nentry:\n\tret void\n}"
        );
    }

    #[test]
    fn test_set_params_checks_signature() {
        let mut f = Func::new("h", Type::void(), vec![Param::named("a", Type::i8())]);
        assert!(f.set_params(vec![Param::named("b", Type::i16())]).is_err());
        assert!(f.set_params(vec![]).is_err());
        f.set_params(vec![Param::named("b", Type::i8())]).unwrap();
        assert_eq!(f.to_string(), "declare void @h(i8 %b)");
    }
}
