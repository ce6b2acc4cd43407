//! Global variables, aliases, indirect functions and comdats

use crate::attrs::{fmt_attrs, Attribute};
use crate::constant::Constant;
use crate::enc;
use crate::enums::{
    DllStorageClass, Linkage, Preemption, SelectionKind, TlsModel, UnnamedAddr, Visibility,
};
use crate::error::ContractViolation;
use crate::ident::{GlobalIdent, Symbol};
use crate::metadata::{fmt_attachments, MetadataAttachment};
use crate::types::{AddrSpace, Type};
use std::fmt;

/// `$name = comdat any`
#[derive(Debug, Clone, PartialEq)]
pub struct ComdatDef {
    pub name: String,
    pub kind: SelectionKind,
}

impl fmt::Display for ComdatDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = comdat {}", enc::comdat_name(&self.name), self.kind)
    }
}

/// ` comdat` when the comdat is named after its owner, ` comdat($name)`
/// otherwise
pub(crate) fn fmt_comdat(
    f: &mut fmt::Formatter<'_>,
    comdat: &ComdatDef,
    owner: &GlobalIdent,
) -> fmt::Result {
    match owner {
        GlobalIdent::Name(name) if *name == comdat.name => f.write_str(" comdat"),
        _ => write!(f, " comdat({})", enc::comdat_name(&comdat.name)),
    }
}

/// Leading clauses shared by global variables, aliases and ifuncs, printed
/// in this field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkageClauses {
    pub linkage: Option<Linkage>,
    pub preemption: Option<Preemption>,
    pub visibility: Option<Visibility>,
    pub dll_storage_class: Option<DllStorageClass>,
    pub tls_model: Option<TlsModel>,
    pub unnamed_addr: Option<UnnamedAddr>,
}

impl fmt::Display for LinkageClauses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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
        if let Some(tls) = &self.tls_model {
            write!(f, " {}", tls)?;
        }
        if let Some(unnamed_addr) = &self.unnamed_addr {
            write!(f, " {}", unnamed_addr)?;
        }
        Ok(())
    }
}

/// Global variable
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    symbol: Symbol,
    content_type: Type,
    typ: Type,
    init: Option<Constant>,
    /// `constant` rather than `global`
    pub immutable: bool,
    pub clauses: LinkageClauses,
    pub externally_initialized: bool,
    pub section: Option<String>,
    pub partition: Option<String>,
    pub comdat: Option<ComdatDef>,
    pub align: Option<u64>,
    pub metadata: Vec<MetadataAttachment>,
    pub func_attrs: Vec<Attribute>,
}

impl Global {
    /// Declaration of an external global of the given content type
    pub fn new(ident: impl Into<GlobalIdent>, content_type: Type) -> Self {
        Global::with_addr_space(ident, content_type, AddrSpace::default())
    }

    pub fn with_addr_space(
        ident: impl Into<GlobalIdent>,
        content_type: Type,
        addr_space: AddrSpace,
    ) -> Self {
        Global {
            symbol: Symbol::new(ident.into()),
            typ: Type::pointer_in(content_type.clone(), addr_space),
            content_type,
            init: None,
            immutable: false,
            clauses: LinkageClauses::default(),
            externally_initialized: false,
            section: None,
            partition: None,
            comdat: None,
            align: None,
            metadata: Vec::new(),
            func_attrs: Vec::new(),
        }
    }

    /// Definition whose content type is the initializer's type
    pub fn new_def(ident: impl Into<GlobalIdent>, init: Constant) -> Self {
        let mut global = Global::new(ident, init.typ());
        global.init = Some(init);
        global
    }

    pub fn ident(&self) -> GlobalIdent {
        self.symbol.ident()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn content_type(&self) -> &Type {
        &self.content_type
    }

    /// Pointer to the content type
    pub fn typ(&self) -> &Type {
        &self.typ
    }

    pub fn addr_space(&self) -> AddrSpace {
        self.typ.addr_space()
    }

    pub fn init(&self) -> Option<&Constant> {
        self.init.as_ref()
    }

    /// Set the initializer; its type must be the content type
    pub fn set_init(&mut self, init: Constant) -> Result<(), ContractViolation> {
        let got = init.typ();
        if got != self.content_type {
            return Err(ContractViolation::TypeMismatch {
                what: "global initializer",
                expected: self.content_type.clone(),
                got,
            });
        }
        self.init = Some(init);
        Ok(())
    }

    pub fn is_declaration(&self) -> bool {
        self.init.is_none()
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ident = self.ident();
        write!(f, "{} =", ident)?;
        if self.clauses.linkage.is_none() && self.init.is_none() {
            f.write_str(" external")?;
        }
        write!(f, "{}", self.clauses)?;
        if !self.addr_space().is_default() {
            write!(f, " {}", self.addr_space())?;
        }
        if self.externally_initialized {
            f.write_str(" externally_initialized")?;
        }
        f.write_str(if self.immutable { " constant" } else { " global" })?;
        write!(f, " {}", self.content_type)?;
        if let Some(init) = &self.init {
            write!(f, " {}", init.ident())?;
        }
        if let Some(section) = &self.section {
            write!(f, ", section {}", enc::quote(section))?;
        }
        if let Some(partition) = &self.partition {
            write!(f, ", partition {}", enc::quote(partition))?;
        }
        if let Some(comdat) = &self.comdat {
            f.write_str(",")?;
            fmt_comdat(f, comdat, &ident)?;
        }
        if let Some(align) = self.align {
            write!(f, ", align {}", align)?;
        }
        fmt_attachments(f, &self.metadata, true)?;
        fmt_attrs(f, &self.func_attrs)
    }
}

fn require_pointer(what: &'static str, ident: &GlobalIdent, c: &Constant) -> Result<(), ContractViolation> {
    let typ = c.typ();
    if !typ.is_pointer() {
        return Err(ContractViolation::NonPointerSymbol {
            what,
            ident: ident.to_string(),
            got: typ,
        });
    }
    Ok(())
}

/// Target of an alias or ifunc: either known, or only its declared type
#[derive(Debug, Clone, PartialEq)]
enum Indirect {
    Declared(Type),
    Target(Constant),
}

impl Indirect {
    fn typ(&self) -> Type {
        match self {
            Indirect::Declared(t) => t.clone(),
            Indirect::Target(c) => c.typ(),
        }
    }

    fn target(&self) -> Option<&Constant> {
        match self {
            Indirect::Target(c) => Some(c),
            Indirect::Declared(_) => None,
        }
    }

    fn fmt_target(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Expressions carry their own type spelling.
            Indirect::Target(c) if c.is_expr() => write!(f, ", {}", c.ident()),
            Indirect::Target(c) => write!(f, ", {}", c),
            Indirect::Declared(_) => Ok(()),
        }
    }
}

/// `@a = alias T, T* @target`
///
/// The alias's own type is the aliasee's type. Before the aliasee is known
/// it is the declared pointer type of the skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    symbol: Symbol,
    aliasee: Indirect,
    pub clauses: LinkageClauses,
    pub partition: Option<String>,
}

impl Alias {
    pub fn new(ident: impl Into<GlobalIdent>, aliasee: Constant) -> Result<Self, ContractViolation> {
        let ident = ident.into();
        require_pointer("aliasee", &ident, &aliasee)?;
        Ok(Alias {
            symbol: Symbol::new(ident),
            aliasee: Indirect::Target(aliasee),
            clauses: LinkageClauses::default(),
            partition: None,
        })
    }

    /// Alias without an aliasee yet; `typ` must be a pointer
    pub fn skeleton(ident: impl Into<GlobalIdent>, typ: Type) -> Result<Self, ContractViolation> {
        let ident = ident.into();
        if !typ.is_pointer() {
            return Err(ContractViolation::NonPointerSymbol {
                what: "alias",
                ident: ident.to_string(),
                got: typ,
            });
        }
        Ok(Alias {
            symbol: Symbol::new(ident),
            aliasee: Indirect::Declared(typ),
            clauses: LinkageClauses::default(),
            partition: None,
        })
    }

    pub fn ident(&self) -> GlobalIdent {
        self.symbol.ident()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn typ(&self) -> Type {
        self.aliasee.typ()
    }

    pub fn content_type(&self) -> Option<Type> {
        self.typ().pointee().cloned()
    }

    pub fn aliasee(&self) -> Option<&Constant> {
        self.aliasee.target()
    }

    pub fn set_aliasee(&mut self, aliasee: Constant) -> Result<(), ContractViolation> {
        require_pointer("aliasee", &self.ident(), &aliasee)?;
        self.aliasee = Indirect::Target(aliasee);
        Ok(())
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ={} alias ", self.ident(), self.clauses)?;
        match self.content_type() {
            Some(t) => write!(f, "{}", t)?,
            None => write!(f, "{}", self.typ())?,
        }
        self.aliasee.fmt_target(f)?;
        if let Some(partition) = &self.partition {
            write!(f, ", partition {}", enc::quote(partition))?;
        }
        Ok(())
    }
}

/// `@f = ifunc T, R* @resolver`
///
/// Its content type is declared independently of the resolver, whose type
/// is a pointer to a function returning the implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct IFunc {
    symbol: Symbol,
    typ: Type,
    resolver: Option<Constant>,
    pub clauses: LinkageClauses,
    pub partition: Option<String>,
}

impl IFunc {
    /// Indirect function whose own type is taken from the resolver
    pub fn new(ident: impl Into<GlobalIdent>, resolver: Constant) -> Result<Self, ContractViolation> {
        let ident = ident.into();
        require_pointer("resolver", &ident, &resolver)?;
        Ok(IFunc {
            symbol: Symbol::new(ident),
            typ: resolver.typ(),
            resolver: Some(resolver),
            clauses: LinkageClauses::default(),
            partition: None,
        })
    }

    /// Indirect function of pointer type `typ` without a resolver yet
    pub fn skeleton(ident: impl Into<GlobalIdent>, typ: Type) -> Result<Self, ContractViolation> {
        let ident = ident.into();
        if !typ.is_pointer() {
            return Err(ContractViolation::NonPointerSymbol {
                what: "ifunc",
                ident: ident.to_string(),
                got: typ,
            });
        }
        Ok(IFunc {
            symbol: Symbol::new(ident),
            typ,
            resolver: None,
            clauses: LinkageClauses::default(),
            partition: None,
        })
    }

    pub fn ident(&self) -> GlobalIdent {
        self.symbol.ident()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn typ(&self) -> &Type {
        &self.typ
    }

    pub fn content_type(&self) -> Option<&Type> {
        self.typ.pointee()
    }

    pub fn resolver(&self) -> Option<&Constant> {
        self.resolver.as_ref()
    }

    pub fn set_resolver(&mut self, resolver: Constant) -> Result<(), ContractViolation> {
        require_pointer("resolver", &self.ident(), &resolver)?;
        self.resolver = Some(resolver);
        Ok(())
    }
}

impl fmt::Display for IFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ={} ifunc ", self.ident(), self.clauses)?;
        match self.content_type() {
            Some(t) => write!(f, "{}", t)?,
            None => write!(f, "{}", self.typ)?,
        }
        if let Some(resolver) = &self.resolver {
            if resolver.is_expr() {
                write!(f, ", {}", resolver.ident())?;
            } else {
                write!(f, ", {}", resolver)?;
            }
        }
        if let Some(partition) = &self.partition {
            write!(f, ", partition {}", enc::quote(partition))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{Expr, GlobalRef};
    use crate::enums::CastOp;
    use crate::module::{GlobalId, SymbolId};

    fn global_ref(name: &str, typ: Type) -> Constant {
        Constant::Global(GlobalRef::new(
            SymbolId::Global(GlobalId::new(0)),
            Symbol::new(name.into()),
            typ,
        ))
    }

    #[test]
    fn test_global_clause_order() {
        let mut g = Global::new_def("counter", Constant::i32(0));
        g.clauses.linkage = Some(Linkage::Internal);
        g.clauses.preemption = Some(Preemption::DsoLocal);
        g.clauses.tls_model = Some(TlsModel::LocalExec);
        g.clauses.unnamed_addr = Some(UnnamedAddr::LocalUnnamedAddr);
        g.section = Some(".tbss".to_string());
        g.comdat = Some(ComdatDef {
            name: "counter".to_string(),
            kind: SelectionKind::Any,
        });
        g.align = Some(4);
        assert_eq!(
            g.to_string(),
            "@counter = internal dso_local thread_local(localexec) local_unnamed_addr global i32 0, section \".tbss\", comdat, align 4"
        );
    }

    #[test]
    fn test_external_declaration() {
        let mut g = Global::with_addr_space("table", Type::array(4, Type::i8()), AddrSpace(2));
        g.immutable = true;
        g.externally_initialized = true;
        g.comdat = Some(ComdatDef {
            name: "grp".to_string(),
            kind: SelectionKind::Largest,
        });
        assert_eq!(
            g.to_string(),
            "@table = external addrspace(2) externally_initialized constant [4 x i8], comdat($grp)"
        );
        assert_eq!(g.typ().to_string(), "[4 x i8] addrspace(2)*");
        assert!(g.set_init(Constant::i32(0)).is_err());
    }

    #[test]
    fn test_alias_type_follows_aliasee() {
        let mut a = Alias::new("a", global_ref("x", Type::pointer(Type::i32()))).unwrap();
        assert_eq!(a.typ().to_string(), "i32*");
        a.clauses.linkage = Some(Linkage::Private);
        a.partition = Some("part".to_string());
        assert_eq!(a.to_string(), "@a = private alias i32, i32* @x, partition \"part\"");

        a.set_aliasee(global_ref("y", Type::pointer(Type::i64()))).unwrap();
        assert_eq!(a.typ().to_string(), "i64*");
        assert!(a.set_aliasee(Constant::i32(0)).is_err());
    }

    #[test]
    fn test_alias_to_expression_prints_bare() {
        let src = global_ref("x", Type::pointer(Type::i32()));
        let cast = Expr::cast(CastOp::BitCast, src, Type::pointer(Type::i8())).unwrap();
        let a = Alias::new("b", cast).unwrap();
        assert_eq!(a.to_string(), "@b = alias i8, bitcast (i32* @x to i8*)");
    }

    #[test]
    fn test_ifunc() {
        let impl_type = Type::func(Type::i32(), vec![], false);
        let resolver_type = Type::pointer(Type::func(Type::pointer(impl_type.clone()), vec![], false));
        let mut f = IFunc::skeleton("f", Type::pointer(impl_type)).unwrap();
        f.set_resolver(global_ref("resolve_f", resolver_type)).unwrap();
        assert_eq!(f.to_string(), "@f = ifunc i32 (), i32 ()* ()* @resolve_f");
    }
}
