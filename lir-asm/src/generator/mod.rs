//! Syntax tree to IR translation
//!
//! Translation runs in two phases. Phase 1 indexes the top-level entities
//! and creates a type-complete but body-empty skeleton for every global,
//! alias, ifunc and function, so that any entity can refer to any other
//! regardless of source order. Skeletons are created in source order.
//! Phase 2 fills in initializers, targets, clauses and function bodies. Block addresses are queued while bodies are
//! translated and tied to their blocks once every body exists.

mod constants;
mod global;
mod insts;
mod local;
mod metadata;
mod terms;
mod types;

use crate::ast::{self, TopLevelEntity};
use crate::config::GenConfig;
use crate::error::TranslationError;
use lir_common::SourceLocation;
use lir_ir::enc;
use lir_ir::{
    AttrGroupDef, BlockAddress, ComdatDef, GlobalIdent, GlobalRef, Local, LocalIdent, Module,
    SelectionKind, SymbolId, UnknownKeyword, UseListOrder, UseListOrderBb,
};
use log::{debug, trace};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

pub(crate) use metadata::ValueResolver;
pub(crate) use types::TypeTable;

pub(crate) type Result<T> = std::result::Result<T, TranslationError>;

pub(crate) fn keyword<T: FromStr<Err = UnknownKeyword>>(word: &str) -> Result<T> {
    Ok(word.parse()?)
}

pub(crate) fn optional_keyword<T: FromStr<Err = UnknownKeyword>>(
    word: &Option<String>,
) -> Result<Option<T>> {
    word.as_deref().map(keyword).transpose()
}

pub(crate) fn keywords<T: FromStr<Err = UnknownKeyword>>(words: &[String]) -> Result<Vec<T>> {
    words.iter().map(|word| keyword(word)).collect()
}

/// Read-only view of the module shared by every Phase 2 step
pub(crate) struct GlobalScope {
    pub(crate) types: TypeTable,
    symbols: HashMap<GlobalIdent, GlobalRef>,
    comdats: HashMap<String, ComdatDef>,
    block_addrs: Mutex<Vec<BlockAddress>>,
}

impl GlobalScope {
    pub(crate) fn symbol(&self, ident: &GlobalIdent) -> Result<GlobalRef> {
        self.symbols
            .get(ident)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownGlobal {
                ident: ident.to_string(),
            })
    }

    pub(crate) fn comdat(&self, name: &str) -> Result<ComdatDef> {
        self.comdats
            .get(name)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownComdat {
                name: name.to_string(),
            })
    }

    /// Queue a block address until the referenced function body exists
    pub(crate) fn defer_block_address(&self, addr: BlockAddress) {
        self.block_addrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(addr);
    }
}

/// Entity that gets a Phase 1 skeleton
#[derive(Clone, Copy)]
enum Symbolic<'a> {
    Global(&'a ast::GlobalNode),
    Indirect(&'a ast::IndirectSymbolNode),
    Func(&'a ast::FuncNode),
}

impl Symbolic<'_> {
    fn name(&self) -> &GlobalIdent {
        match self {
            Symbolic::Global(node) => &node.name,
            Symbolic::Indirect(node) => &node.name,
            Symbolic::Func(node) => &node.header.name,
        }
    }

    fn location(&self) -> &SourceLocation {
        match self {
            Symbolic::Global(node) => &node.location,
            Symbolic::Indirect(node) => &node.location,
            Symbolic::Func(node) => &node.location,
        }
    }
}

/// Top-level entities grouped by kind, each group in source order
#[derive(Default)]
struct Index<'a> {
    type_defs: Vec<&'a ast::TypeDefNode>,
    comdats: Vec<&'a ast::ComdatDefNode>,
    /// Globals, aliases, ifuncs and functions interleaved as written
    symbolic: Vec<Symbolic<'a>>,
    funcs: Vec<&'a ast::FuncNode>,
    attr_groups: Vec<(&'a ast::AttrGroupDefNode, Vec<&'a ast::AttrNode>)>,
    named_metadata: Vec<&'a ast::NamedMetadataDefNode>,
    metadata: Vec<&'a ast::MetadataDefNode>,
    use_list_orders: Vec<&'a ast::UseListOrderNode>,
    use_list_order_bbs: Vec<&'a ast::UseListOrderBbNode>,
}

impl<'a> Index<'a> {
    /// Walk the tree once, copying module-level strings into `module`
    fn build(tree: &'a ast::Module, module: &mut Module) -> Result<Self> {
        let mut index = Index::default();
        let mut idents = HashSet::new();
        let mut type_names = HashSet::new();
        let mut claim = |ident: &GlobalIdent, location: &SourceLocation| {
            if idents.insert(ident.clone()) {
                Ok(())
            } else {
                Err(TranslationError::DuplicateGlobal {
                    ident: ident.to_string(),
                }
                .context(ident, location))
            }
        };

        for entity in &tree.entities {
            match entity {
                TopLevelEntity::SourceFilename(name) => module.source_filename = Some(name.clone()),
                TopLevelEntity::DataLayout(layout) => module.data_layout = Some(layout.clone()),
                TopLevelEntity::TargetTriple(triple) => module.target_triple = Some(triple.clone()),
                TopLevelEntity::ModuleAsm(asm) => module.module_asms.push(asm.clone()),
                TopLevelEntity::TypeDef(def) => {
                    if !type_names.insert(def.name.as_str()) {
                        return Err(TranslationError::DuplicateGlobal {
                            ident: enc::type_name(&def.name),
                        }
                        .context(enc::type_name(&def.name), &def.location));
                    }
                    index.type_defs.push(def);
                }
                TopLevelEntity::ComdatDef(def) => index.comdats.push(def),
                TopLevelEntity::Global(node) => index.add_symbolic(Symbolic::Global(node), &mut claim)?,
                TopLevelEntity::IndirectSymbol(node) => {
                    index.add_symbolic(Symbolic::Indirect(node), &mut claim)?
                }
                TopLevelEntity::Func(node) => {
                    index.add_symbolic(Symbolic::Func(node), &mut claim)?;
                    index.funcs.push(node);
                }
                TopLevelEntity::AttrGroupDef(def) => {
                    // Repeated definitions of one group extend it.
                    match index.attr_groups.iter_mut().find(|(first, _)| first.id == def.id) {
                        Some((_, attrs)) => attrs.extend(&def.attrs),
                        None => index.attr_groups.push((def, def.attrs.iter().collect())),
                    }
                }
                TopLevelEntity::NamedMetadataDef(def) => index.named_metadata.push(def),
                TopLevelEntity::MetadataDef(def) => index.metadata.push(def),
                TopLevelEntity::UseListOrder(order) => index.use_list_orders.push(order),
                TopLevelEntity::UseListOrderBb(order) => index.use_list_order_bbs.push(order),
            }
        }
        debug!(
            "Indexed {} type definitions, {} symbols, {} functions",
            index.type_defs.len(),
            index.symbolic.len(),
            index.funcs.len()
        );
        Ok(index)
    }

    fn add_symbolic(
        &mut self,
        entity: Symbolic<'a>,
        claim: &mut impl FnMut(&GlobalIdent, &SourceLocation) -> Result<()>,
    ) -> Result<()> {
        claim(entity.name(), entity.location())?;
        self.symbolic.push(entity);
        Ok(())
    }
}

/// Translate a syntax tree into a fully linked module
pub(crate) fn generate(tree: &ast::Module, config: &GenConfig) -> Result<Module> {
    let mut module = Module::new();
    let index = Index::build(tree, &mut module)?;

    let types = TypeTable::resolve(&index.type_defs)?;
    for def in &index.type_defs {
        module.new_type_def(&def.name, types.get(&def.name)?);
    }

    let mut comdats = HashMap::new();
    for def in &index.comdats {
        let kind: SelectionKind = keyword(&def.kind)
            .map_err(|err| err.context(enc::comdat_name(&def.name), &def.location))?;
        comdats.insert(def.name.clone(), module.new_comdat(&def.name, kind));
    }

    // Phase 1: skeletons
    debug!("Creating skeletons");
    let mut symbols = HashMap::new();
    let mut ids = Vec::with_capacity(index.symbolic.len());
    for entity in &index.symbolic {
        let id: SymbolId = match *entity {
            Symbolic::Global(node) => global::global_skeleton(&types, node)
                .and_then(|skeleton| Ok(module.add_global(skeleton)?.into())),
            Symbolic::Indirect(node) => global::add_indirect_skeleton(&mut module, &types, node),
            Symbolic::Func(node) => global::func_skeleton(&types, &node.header)
                .and_then(|skeleton| Ok(module.add_func(skeleton)?.into())),
        }
        .map_err(|e| e.context(entity.name(), entity.location()))?;
        trace!("Skeleton {} -> {:?}", entity.name(), id);
        symbols.insert(entity.name().clone(), module.symbol_ref(id));
        ids.push(id);
    }

    let scope = GlobalScope {
        types,
        symbols,
        comdats,
        block_addrs: Mutex::new(Vec::new()),
    };

    // Phase 2: global entities
    debug!("Translating global entities");
    for (entity, id) in index.symbolic.iter().zip(&ids) {
        match (*entity, *id) {
            (Symbolic::Global(node), SymbolId::Global(id)) => {
                global::translate_global(&scope, module.global_mut(id), node)
            }
            (Symbolic::Indirect(node), id) => global::translate_indirect(&scope, &mut module, id, node),
            (Symbolic::Func(node), SymbolId::Func(id)) => {
                global::translate_func_header(&scope, module.func_mut(id), &node.header)
            }
            _ => Ok(()),
        }
        .map_err(|e| e.context(entity.name(), entity.location()))?;
    }

    // Phase 2: function bodies. Skeletons were added in index order, so the
    // function arena lines up with `index.funcs`.
    debug!("Translating {} function bodies (parallel: {})", index.funcs.len(), config.parallel);
    let translate_body = |(func, node): (&mut lir_ir::Func, &&ast::FuncNode)| {
        local::translate_body(&scope, config, func, node)
            .map_err(|e| e.context(&node.header.name, &node.location))
    };
    let labels: Vec<HashMap<LocalIdent, Local>> = if config.parallel {
        module
            .funcs_mut()
            .par_iter_mut()
            .zip(index.funcs.par_iter())
            .map(translate_body)
            .collect::<Result<_>>()?
    } else {
        module
            .funcs_mut()
            .iter_mut()
            .zip(index.funcs.iter())
            .map(translate_body)
            .collect::<Result<_>>()?
    };

    let labels_of = |func: &GlobalRef| match func.id {
        SymbolId::Func(id) => labels.get(id.index()),
        _ => None,
    };

    let pending = std::mem::take(
        &mut *scope
            .block_addrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner),
    );
    debug!("Resolving {} block addresses", pending.len());
    for addr in pending {
        let owner = match addr.func.id {
            SymbolId::Func(id) => index.funcs.get(id.index()).map(|node| &node.location),
            _ => None,
        };
        resolve_block_address(&addr, labels_of(&addr.func))
            .map_err(|e| e.context(addr.func.symbol(), owner.unwrap_or(&SourceLocation::default())))?;
    }

    // Module-level definitions and directives
    for (def, attrs) in &index.attr_groups {
        let attrs = attrs
            .iter()
            .map(|attr| metadata::attribute(&scope.types, attr))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.context(format!("#{}", def.id), &def.location))?;
        module.attr_group_defs.push(AttrGroupDef { id: def.id, attrs });
    }
    for def in &index.named_metadata {
        module.named_metadata_defs.push(lir_ir::NamedMetadataDef {
            name: def.name.clone(),
            nodes: def.nodes.clone(),
        });
    }
    for def in &index.metadata {
        let node = metadata::metadata(&scope, &def.node)
            .map_err(|e| e.context(format!("!{}", def.id), &def.location))?;
        module.metadata_defs.push(lir_ir::MetadataDef {
            id: def.id,
            distinct: def.distinct,
            node,
        });
    }
    for order in &index.use_list_orders {
        let value = scope
            .value(&order.value)
            .map_err(|e| e.context("uselistorder", &order.location))?;
        module.use_list_orders.push(UseListOrder {
            value,
            indices: order.indices.clone(),
        });
    }
    for order in &index.use_list_order_bbs {
        let func = scope
            .symbol(&order.func)
            .map_err(|e| e.context("uselistorder_bb", &order.location))?;
        let block = labels_of(&func)
            .and_then(|labels| labels.get(&order.block))
            .cloned()
            .ok_or_else(|| {
                TranslationError::UnknownLocal {
                    ident: order.block.to_string(),
                    func: order.func.to_string(),
                }
                .context("uselistorder_bb", &order.location)
            })?;
        module.use_list_order_bbs.push(UseListOrderBb {
            func,
            block,
            indices: order.indices.clone(),
        });
    }

    Ok(module)
}

fn resolve_block_address(addr: &BlockAddress, labels: Option<&HashMap<LocalIdent, Local>>) -> Result<()> {
    let block = addr
        .written_ident()
        .and_then(|ident| labels?.get(ident))
        .ok_or_else(|| TranslationError::UnknownLocal {
            ident: addr
                .written_ident()
                .map(|i| i.to_string())
                .unwrap_or_default(),
            func: addr.func.symbol().to_string(),
        })?;
    addr.resolve(block.clone())?;
    Ok(())
}
