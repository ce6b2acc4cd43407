//! Global variables, aliases, ifuncs and function headers

use super::constants::expect_type;
use super::metadata::{attachments, attributes};
use super::{keyword, optional_keyword, GlobalScope, Result, TypeTable};
use crate::ast::{
    ComdatNode, ExprNode, FuncHeader, GlobalNode, IndirectKind, IndirectSymbolNode, IndirectTarget,
    LinkageNode,
};
use crate::error::TranslationError;
use lir_ir::{
    AddrSpace, Alias, CastOp, ComdatDef, Func, Global, GlobalIdent, IFunc, LinkageClauses, Module,
    Param, SymbolId, Type,
};

fn clauses(node: &LinkageNode) -> Result<LinkageClauses> {
    Ok(LinkageClauses {
        linkage: optional_keyword(&node.linkage)?,
        preemption: optional_keyword(&node.preemption)?,
        visibility: optional_keyword(&node.visibility)?,
        dll_storage_class: optional_keyword(&node.dll_storage_class)?,
        tls_model: optional_keyword(&node.tls_model)?,
        unnamed_addr: optional_keyword(&node.unnamed_addr)?,
    })
}

/// A bare `comdat` names the comdat after its owner
fn comdat(scope: &GlobalScope, node: &ComdatNode, owner: &GlobalIdent) -> Result<ComdatDef> {
    match (node, owner) {
        (ComdatNode::Named(name), _) => scope.comdat(name),
        (ComdatNode::Implicit, GlobalIdent::Name(name)) => scope.comdat(name),
        (ComdatNode::Implicit, GlobalIdent::Id(id)) => scope.comdat(&id.to_string()),
    }
}

pub(crate) fn global_skeleton(types: &TypeTable, node: &GlobalNode) -> Result<Global> {
    let content_type = types.typ(&node.content_type)?;
    Ok(Global::with_addr_space(
        node.name.clone(),
        content_type,
        AddrSpace(node.addr_space),
    ))
}

pub(crate) fn translate_global(scope: &GlobalScope, global: &mut Global, node: &GlobalNode) -> Result<()> {
    global.clauses = clauses(&node.clauses)?;
    global.immutable = node.immutable;
    global.externally_initialized = node.externally_initialized;
    global.section = node.section.clone();
    global.partition = node.partition.clone();
    global.comdat = node
        .comdat
        .as_ref()
        .map(|c| comdat(scope, c, &node.name))
        .transpose()?;
    global.align = node.align;
    global.metadata = attachments(scope, &node.metadata)?;
    global.func_attrs = attributes(&scope.types, &node.func_attrs)?;
    if let Some(init) = &node.init {
        let content_type = global.content_type().clone();
        global.set_init(scope.constant(&content_type, init)?)?;
    }
    Ok(())
}

/// Address space of an alias or ifunc, read off the written target
fn target_addr_space(types: &TypeTable, target: &IndirectTarget) -> Result<AddrSpace> {
    match target {
        IndirectTarget::Const(tc) => Ok(types.typ(&tc.typ)?.addr_space()),
        IndirectTarget::Expr(ExprNode::Cast { op, to, .. }) => {
            match keyword::<CastOp>(op)? {
                CastOp::BitCast | CastOp::AddrSpaceCast | CastOp::IntToPtr => {
                    Ok(types.typ(to)?.addr_space())
                }
                other => Err(TranslationError::unsupported(format!("{} as alias target", other))),
            }
        }
        IndirectTarget::Expr(ExprNode::GetElementPtr { src, .. }) => {
            Ok(types.typ(&src.typ)?.addr_space())
        }
        IndirectTarget::Expr(_) => Err(TranslationError::unsupported("this constant expression as alias target")),
    }
}

pub(crate) fn add_indirect_skeleton(
    module: &mut Module,
    types: &TypeTable,
    node: &IndirectSymbolNode,
) -> Result<SymbolId> {
    let content_type = types.typ(&node.content_type)?;
    let typ = Type::pointer_in(content_type, target_addr_space(types, &node.target)?);
    let id: SymbolId = match node.kind {
        IndirectKind::Alias => module.add_alias(Alias::skeleton(node.name.clone(), typ)?)?.into(),
        IndirectKind::IFunc => module.add_ifunc(IFunc::skeleton(node.name.clone(), typ)?)?.into(),
    };
    Ok(id)
}

pub(crate) fn translate_indirect(
    scope: &GlobalScope,
    module: &mut Module,
    id: SymbolId,
    node: &IndirectSymbolNode,
) -> Result<()> {
    let target = match &node.target {
        IndirectTarget::Const(tc) => scope.typed_const(tc)?,
        IndirectTarget::Expr(expr) => scope.expr(expr)?,
    };
    let clauses = clauses(&node.clauses)?;
    match id {
        SymbolId::Alias(id) => {
            let alias = module.alias_mut(id);
            // References made in Phase 1 carry the skeleton type.
            expect_type("aliasee", &alias.typ(), &target.typ())?;
            alias.set_aliasee(target)?;
            alias.clauses = clauses;
            alias.partition = node.partition.clone();
        }
        SymbolId::IFunc(id) => {
            let ifunc = module.ifunc_mut(id);
            ifunc.set_resolver(target)?;
            ifunc.clauses = clauses;
            ifunc.partition = node.partition.clone();
        }
        other => {
            return Err(TranslationError::unsupported(format!(
                "{:?} as indirect symbol",
                other
            )))
        }
    }
    Ok(())
}

/// Function with its signature and parameters; everything else is left
/// for Phase 2
pub(crate) fn func_skeleton(types: &TypeTable, header: &FuncHeader) -> Result<Func> {
    let ret = types.typ(&header.ret_type)?;
    let param_types = header
        .params
        .iter()
        .map(|p| types.typ(&p.typ))
        .collect::<Result<Vec<_>>>()?;
    let sig = Type::func(ret, param_types.clone(), header.variadic);
    let mut func = Func::with_sig(header.name.clone(), sig, AddrSpace(header.addr_space))?;
    let params = header
        .params
        .iter()
        .zip(param_types)
        .map(|(node, typ)| {
            let mut param = Param::new(node.name.clone(), typ);
            param.attrs = attributes(types, &node.attrs)?;
            Ok(param)
        })
        .collect::<Result<Vec<_>>>()?;
    func.set_params(params)?;
    Ok(func)
}

pub(crate) fn translate_func_header(scope: &GlobalScope, func: &mut Func, header: &FuncHeader) -> Result<()> {
    let clauses = clauses(&header.clauses)?;
    if let Some(tls) = clauses.tls_model {
        return Err(TranslationError::unsupported(format!("{} on a function", tls)));
    }
    func.linkage = clauses.linkage;
    func.preemption = clauses.preemption;
    func.visibility = clauses.visibility;
    func.dll_storage_class = clauses.dll_storage_class;
    func.unnamed_addr = clauses.unnamed_addr;
    func.calling_conv = optional_keyword(&header.calling_conv)?;
    func.ret_attrs = attributes(&scope.types, &header.ret_attrs)?;
    func.func_attrs = attributes(&scope.types, &header.func_attrs)?;
    func.section = header.section.clone();
    func.partition = header.partition.clone();
    func.comdat = header
        .comdat
        .as_ref()
        .map(|c| comdat(scope, c, &header.name))
        .transpose()?;
    func.align = header.align;
    func.gc = header.gc.clone();
    func.prefix = header.prefix.as_ref().map(|c| scope.typed_const(c)).transpose()?;
    func.prologue = header.prologue.as_ref().map(|c| scope.typed_const(c)).transpose()?;
    func.personality = header.personality.as_ref().map(|c| scope.typed_const(c)).transpose()?;
    func.metadata = attachments(scope, &header.metadata)?;
    Ok(())
}
