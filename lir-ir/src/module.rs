//! IR Module
//!
//! The module owns every global entity in one arena per kind. Entities are
//! addressed by typed handles, and the symbol table maps each global
//! identifier to the handle of the entity it names.

use crate::attrs::AttrGroupDef;
use crate::constant::{Constant, GlobalRef};
use crate::enc;
use crate::enums::SelectionKind;
use crate::error::ContractViolation;
use crate::func::{fmt_index_list, Func, Param, UseListOrder};
use crate::global::{Alias, ComdatDef, Global, IFunc};
use crate::ident::{GlobalIdent, Symbol};
use crate::metadata::{MetadataDef, NamedMetadataDef};
use crate::types::Type;
use crate::value::Local;
use log::debug;
use std::collections::HashMap;
use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                $name(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle of a global variable
    GlobalId
);
handle!(
    /// Handle of a function
    FuncId
);
handle!(
    /// Handle of an alias
    AliasId
);
handle!(
    /// Handle of an indirect function
    IFuncId
);

/// Handle of any global entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolId {
    Global(GlobalId),
    Func(FuncId),
    Alias(AliasId),
    IFunc(IFuncId),
}

impl From<GlobalId> for SymbolId {
    fn from(id: GlobalId) -> Self {
        SymbolId::Global(id)
    }
}

impl From<FuncId> for SymbolId {
    fn from(id: FuncId) -> Self {
        SymbolId::Func(id)
    }
}

impl From<AliasId> for SymbolId {
    fn from(id: AliasId) -> Self {
        SymbolId::Alias(id)
    }
}

impl From<IFuncId> for SymbolId {
    fn from(id: IFuncId) -> Self {
        SymbolId::IFunc(id)
    }
}

/// `uselistorder_bb @f, %bb, { 1, 0 }`
#[derive(Debug, Clone, PartialEq)]
pub struct UseListOrderBb {
    pub func: GlobalRef,
    pub block: Local,
    pub indices: Vec<u64>,
}

impl fmt::Display for UseListOrderBb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uselistorder_bb {}, {}, ",
            self.func.symbol(),
            self.block.ident_string()
        )?;
        fmt_index_list(f, &self.indices)
    }
}

/// `%name = type ...`
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub typ: Type,
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = type ", enc::type_name(&self.name))?;
        if self.typ.name() == Some(self.name.as_str()) {
            write!(f, "{}", self.typ.def_string())
        } else {
            // Second name of an identified struct
            write!(f, "{}", self.typ)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub source_filename: Option<String>,
    pub data_layout: Option<String>,
    pub target_triple: Option<String>,
    pub module_asms: Vec<String>,
    type_defs: Vec<TypeDef>,
    pub comdat_defs: Vec<ComdatDef>,
    globals: Vec<Global>,
    funcs: Vec<Func>,
    aliases: Vec<Alias>,
    ifuncs: Vec<IFunc>,
    pub attr_group_defs: Vec<AttrGroupDef>,
    pub named_metadata_defs: Vec<NamedMetadataDef>,
    pub metadata_defs: Vec<MetadataDef>,
    pub use_list_orders: Vec<UseListOrder>,
    pub use_list_order_bbs: Vec<UseListOrderBb>,
    symbols: HashMap<GlobalIdent, SymbolId>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named type definition and return the named type.
    ///
    /// A type already named `name` is registered as is. Another name for an
    /// identified struct denotes that same struct; any other type becomes
    /// an alias named `name`.
    pub fn new_type_def(&mut self, name: &str, typ: Type) -> Type {
        let named = match typ.name() {
            Some(own) if own == name => typ,
            Some(_) if typ.is_struct() => typ,
            _ => typ.with_name(name),
        };
        self.type_defs.push(TypeDef {
            name: name.to_string(),
            typ: named.clone(),
        });
        named
    }

    pub fn add_type_def(&mut self, typ: Type) -> Result<(), ContractViolation> {
        let Some(name) = typ.name().map(str::to_string) else {
            return Err(ContractViolation::UnnamedTypeDef { typ });
        };
        self.type_defs.push(TypeDef { name, typ });
        Ok(())
    }

    pub fn type_defs(&self) -> &[TypeDef] {
        &self.type_defs
    }

    pub fn new_comdat(&mut self, name: &str, kind: SelectionKind) -> ComdatDef {
        let comdat = ComdatDef {
            name: name.to_string(),
            kind,
        };
        self.comdat_defs.push(comdat.clone());
        comdat
    }

    fn claim(&mut self, ident: GlobalIdent, id: SymbolId) -> Result<(), ContractViolation> {
        if self.symbols.contains_key(&ident) {
            return Err(ContractViolation::DuplicateGlobal {
                ident: ident.to_string(),
            });
        }
        debug!("Registered {} as {:?}", ident, id);
        self.symbols.insert(ident, id);
        Ok(())
    }

    /// External global declaration
    pub fn new_global(
        &mut self,
        ident: impl Into<GlobalIdent>,
        content_type: Type,
    ) -> Result<GlobalId, ContractViolation> {
        self.add_global(Global::new(ident, content_type))
    }

    /// Global definition initialized with `init`
    pub fn new_global_def(
        &mut self,
        ident: impl Into<GlobalIdent>,
        init: Constant,
    ) -> Result<GlobalId, ContractViolation> {
        self.add_global(Global::new_def(ident, init))
    }

    pub fn add_global(&mut self, global: Global) -> Result<GlobalId, ContractViolation> {
        let id = GlobalId::new(self.globals.len());
        self.claim(global.ident(), id.into())?;
        self.globals.push(global);
        Ok(id)
    }

    pub fn new_func(
        &mut self,
        ident: impl Into<GlobalIdent>,
        ret: Type,
        params: Vec<Param>,
    ) -> Result<FuncId, ContractViolation> {
        self.add_func(Func::new(ident, ret, params))
    }

    pub fn add_func(&mut self, func: Func) -> Result<FuncId, ContractViolation> {
        let id = FuncId::new(self.funcs.len());
        self.claim(func.ident(), id.into())?;
        self.funcs.push(func);
        Ok(id)
    }

    pub fn new_alias(
        &mut self,
        ident: impl Into<GlobalIdent>,
        aliasee: Constant,
    ) -> Result<AliasId, ContractViolation> {
        let alias = Alias::new(ident, aliasee)?;
        self.add_alias(alias)
    }

    pub fn add_alias(&mut self, alias: Alias) -> Result<AliasId, ContractViolation> {
        let id = AliasId::new(self.aliases.len());
        self.claim(alias.ident(), id.into())?;
        self.aliases.push(alias);
        Ok(id)
    }

    pub fn new_ifunc(
        &mut self,
        ident: impl Into<GlobalIdent>,
        resolver: Constant,
    ) -> Result<IFuncId, ContractViolation> {
        let ifunc = IFunc::new(ident, resolver)?;
        self.add_ifunc(ifunc)
    }

    pub fn add_ifunc(&mut self, ifunc: IFunc) -> Result<IFuncId, ContractViolation> {
        let id = IFuncId::new(self.ifuncs.len());
        self.claim(ifunc.ident(), id.into())?;
        self.ifuncs.push(ifunc);
        Ok(id)
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn global_mut(&mut self, id: GlobalId) -> &mut Global {
        &mut self.globals[id.index()]
    }

    pub fn func(&self, id: FuncId) -> &Func {
        &self.funcs[id.index()]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut Func {
        &mut self.funcs[id.index()]
    }

    pub fn alias(&self, id: AliasId) -> &Alias {
        &self.aliases[id.index()]
    }

    pub fn alias_mut(&mut self, id: AliasId) -> &mut Alias {
        &mut self.aliases[id.index()]
    }

    pub fn ifunc(&self, id: IFuncId) -> &IFunc {
        &self.ifuncs[id.index()]
    }

    pub fn ifunc_mut(&mut self, id: IFuncId) -> &mut IFunc {
        &mut self.ifuncs[id.index()]
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn funcs(&self) -> &[Func] {
        &self.funcs
    }

    pub fn funcs_mut(&mut self) -> &mut [Func] {
        &mut self.funcs
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn ifuncs(&self) -> &[IFunc] {
        &self.ifuncs
    }

    pub fn lookup(&self, ident: &GlobalIdent) -> Option<SymbolId> {
        self.symbols.get(ident).copied()
    }

    fn symbol(&self, id: SymbolId) -> (&Symbol, Type) {
        match id {
            SymbolId::Global(g) => {
                let g = self.global(g);
                (g.symbol(), g.typ().clone())
            }
            SymbolId::Func(f) => {
                let f = self.func(f);
                (f.symbol(), f.typ().clone())
            }
            SymbolId::Alias(a) => {
                let a = self.alias(a);
                (a.symbol(), a.typ())
            }
            SymbolId::IFunc(i) => {
                let i = self.ifunc(i);
                (i.symbol(), i.typ().clone())
            }
        }
    }

    /// Reference to a global entity, usable as a constant operand
    pub fn symbol_ref(&self, id: impl Into<SymbolId>) -> GlobalRef {
        let id = id.into();
        let (symbol, typ) = self.symbol(id);
        GlobalRef::new(id, symbol.clone(), typ)
    }

    /// Address of a global entity as a constant
    pub fn address_of(&self, id: impl Into<SymbolId>) -> Constant {
        Constant::Global(self.symbol_ref(id))
    }

    /// Rename a global entity; existing references observe the new name
    pub fn rename(
        &mut self,
        id: impl Into<SymbolId>,
        ident: impl Into<GlobalIdent>,
    ) -> Result<(), ContractViolation> {
        let id = id.into();
        let ident = ident.into();
        let symbol = self.symbol(id).0.clone();
        let old = symbol.ident();
        if old == ident {
            return Ok(());
        }
        self.claim(ident.clone(), id)?;
        self.symbols.remove(&old);
        symbol.rename(ident);
        Ok(())
    }

    /// Number the unnamed locals of every function
    pub fn assign_ids(&self) -> Result<(), ContractViolation> {
        self.funcs.iter().try_for_each(Func::assign_ids)
    }
}

struct Sections<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    any: bool,
}

impl Sections<'_, '_> {
    /// Print one section, separated from the previous one by a blank line
    fn section<T: fmt::Display>(&mut self, items: impl IntoIterator<Item = T>) -> fmt::Result {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return Ok(());
        }
        if self.any {
            self.f.write_str("\n")?;
        }
        self.any = true;
        for item in items {
            writeln!(self.f, "{}", item)?;
        }
        Ok(())
    }
}


impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = Vec::new();
        if let Some(name) = &self.source_filename {
            header.push(format!("source_filename = {}", enc::quote(name)));
        }
        if let Some(layout) = &self.data_layout {
            header.push(format!("target datalayout = {}", enc::quote(layout)));
        }
        if let Some(triple) = &self.target_triple {
            header.push(format!("target triple = {}", enc::quote(triple)));
        }
        let mut out = Sections { f, any: false };
        out.section(header)?;
        out.section(
            self.module_asms
                .iter()
                .map(|asm| format!("module asm {}", enc::quote(asm))),
        )?;
        out.section(&self.type_defs)?;
        out.section(&self.comdat_defs)?;
        out.section(&self.globals)?;
        out.section(&self.aliases)?;
        out.section(&self.ifuncs)?;
        // Functions are separated from each other by blank lines.
        for func in &self.funcs {
            out.section(std::iter::once(func))?;
        }
        out.section(&self.attr_group_defs)?;
        out.section(&self.named_metadata_defs)?;
        out.section(&self.metadata_defs)?;
        out.section(&self.use_list_orders)?;
        out.section(&self.use_list_order_bbs)
    }
}
