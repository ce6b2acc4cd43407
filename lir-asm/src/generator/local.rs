//! Function bodies
//!
//! A body is translated in two passes. The first pass binds every local
//! identifier (parameters, block labels, instruction results) to a
//! [`Local`] whose type is read off the instruction syntax, handing out
//! implicit IDs in definition order. The second pass builds the
//! instructions, so an operand may name a local defined further down.

use super::metadata::ValueResolver;
use super::{insts, terms, GlobalScope, Result};
use crate::ast::FuncNode;
use crate::config::GenConfig;
use crate::error::TranslationError;
use lir_ir::{Block, ContractViolation, Func, GlobalIdent, Local, LocalIdent, Type, UseListOrder};
use log::trace;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Locals visible inside one function body
pub(crate) struct FuncScope<'a> {
    globals: &'a GlobalScope,
    func: GlobalIdent,
    locals: HashMap<LocalIdent, Local>,
    next_id: u64,
    strict: bool,
}

impl<'a> FuncScope<'a> {
    fn new(globals: &'a GlobalScope, func: GlobalIdent, strict: bool) -> Self {
        FuncScope {
            globals,
            func,
            locals: HashMap::new(),
            next_id: 0,
            strict,
        }
    }

    /// Register `local` under its written identifier, or under the next
    /// implicit ID when it has none
    fn bind(&mut self, local: &Local) -> Result<()> {
        let key = match local.explicit_ident() {
            Some(LocalIdent::Id(got)) => {
                let expected = self.next_id;
                self.next_id += 1;
                if got != expected {
                    if self.strict {
                        return Err(TranslationError::LocalIdSequence {
                            func: self.func.to_string(),
                            expected,
                            got,
                        });
                    }
                    // The number only identifies the local in the input.
                    local.set_ident(None);
                }
                LocalIdent::Id(got)
            }
            Some(ident) => ident,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                LocalIdent::Id(id)
            }
        };
        match self.locals.entry(key) {
            Entry::Occupied(entry) => Err(TranslationError::DuplicateLocal {
                ident: entry.key().to_string(),
                func: self.func.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(local.clone());
                Ok(())
            }
        }
    }

    /// Bind the result of a value-producing instruction; naming a void one
    /// is an error
    fn bind_result(
        &mut self,
        name: &Option<LocalIdent>,
        typ: Option<Type>,
        opcode: &'static str,
    ) -> Result<Option<Local>> {
        match typ {
            Some(typ) => {
                let local = Local::new(name.clone(), typ);
                self.bind(&local)?;
                Ok(Some(local))
            }
            None if name.is_some() => Err(ContractViolation::NoResult { inst: opcode }.into()),
            None => Ok(None),
        }
    }

    pub(crate) fn types(&self) -> &super::TypeTable {
        &self.globals.types
    }

    /// Block label named `ident`
    pub(crate) fn label(&self, ident: &LocalIdent) -> Result<Local> {
        let local = self.local(ident)?;
        if !local.typ().is_label() {
            return Err(TranslationError::TypeMismatch {
                what: "branch target",
                expected: Type::label(),
                got: local.typ().clone(),
            });
        }
        Ok(local)
    }
}

impl ValueResolver for FuncScope<'_> {
    fn globals(&self) -> &GlobalScope {
        self.globals
    }

    fn local(&self, ident: &LocalIdent) -> Result<Local> {
        self.locals
            .get(ident)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownLocal {
                ident: ident.to_string(),
                func: self.func.to_string(),
            })
    }
}

/// Locals created by the first pass for one block
struct BlockPlan {
    label: Local,
    results: Vec<Option<Local>>,
    term_result: Option<Local>,
}

/// Fill in the body of `func`. Returns the function's block labels for
/// resolving block addresses and `uselistorder_bb` directives.
pub(crate) fn translate_body(
    globals: &GlobalScope,
    config: &GenConfig,
    func: &mut Func,
    node: &FuncNode,
) -> Result<HashMap<LocalIdent, Local>> {
    let Some(body) = &node.body else {
        return Ok(HashMap::new());
    };
    let mut scope = FuncScope::new(globals, func.ident(), config.strict_local_ids);

    for param in func.params() {
        scope.bind(param.local())?;
    }
    let mut plans = Vec::with_capacity(body.blocks.len());
    for block in &body.blocks {
        let label = Local::new(block.name.clone(), Type::label());
        scope.bind(&label)?;
        let mut results = Vec::with_capacity(block.insts.len());
        for inst in &block.insts {
            let typ = insts::result_type(scope.types(), &inst.kind)?;
            results.push(scope.bind_result(&inst.name, typ, insts::opcode(&inst.kind))?);
        }
        let typ = terms::result_type(scope.types(), &block.term.kind)?;
        let term_result = scope.bind_result(&block.term.name, typ, terms::opcode(&block.term.kind))?;
        plans.push(BlockPlan {
            label,
            results,
            term_result,
        });
    }
    trace!("{}: bound {} locals", scope.func, scope.locals.len());

    let mut blocks = Vec::with_capacity(body.blocks.len());
    for (block_node, plan) in body.blocks.iter().zip(plans) {
        let mut block = Block::with_label(plan.label)?;
        for (inst_node, result) in block_node.insts.iter().zip(plan.results) {
            let inst = scope.inst(inst_node, result).map_err(|err| {
                err.context(
                    format!("{} in {}", insts::opcode(&inst_node.kind), scope.func),
                    &inst_node.location,
                )
            })?;
            block.append(inst);
        }
        let term = scope.term(&block_node.term, plan.term_result).map_err(|err| {
            err.context(
                format!("{} in {}", terms::opcode(&block_node.term.kind), scope.func),
                &block_node.term.location,
            )
        })?;
        block.set_term(term);
        blocks.push(block);
    }
    func.blocks = blocks;

    func.use_list_orders = body
        .use_list_orders
        .iter()
        .map(|order| {
            let value = scope
                .value(&order.value)
                .map_err(|err| err.context(format!("uselistorder in {}", scope.func), &order.location))?;
            Ok(UseListOrder {
                value,
                indices: order.indices.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(scope
        .locals
        .into_iter()
        .filter(|(_, local)| local.typ().is_label())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::TypeTable;
    use std::sync::Mutex;

    fn globals() -> GlobalScope {
        GlobalScope {
            types: TypeTable::default(),
            symbols: HashMap::new(),
            comdats: HashMap::new(),
            block_addrs: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_bind_implicit_and_named() {
        let globals = globals();
        let mut scope = FuncScope::new(&globals, GlobalIdent::from("f"), true);
        let a = Local::unnamed(Type::i32());
        let b = Local::named("b", Type::i32());
        let c = Local::new(Some(LocalIdent::Id(1)), Type::i32());
        scope.bind(&a).unwrap();
        scope.bind(&b).unwrap();
        scope.bind(&c).unwrap();
        assert_eq!(scope.local(&LocalIdent::Id(0)).unwrap(), a);
        assert_eq!(scope.local(&LocalIdent::from("b")).unwrap(), b);
        assert_eq!(scope.local(&LocalIdent::Id(1)).unwrap(), c);
    }

    #[test]
    fn test_bind_out_of_sequence() {
        let globals = globals();
        let mut strict = FuncScope::new(&globals, GlobalIdent::from("f"), true);
        let err = strict.bind(&Local::new(Some(LocalIdent::Id(3)), Type::i32())).unwrap_err();
        assert_eq!(err.to_string(), "invalid local ID in function @f, expected %0, got %3");

        let mut lax = FuncScope::new(&globals, GlobalIdent::from("f"), false);
        let local = Local::new(Some(LocalIdent::Id(3)), Type::i32());
        lax.bind(&local).unwrap();
        assert_eq!(local.explicit_ident(), None);
        assert_eq!(lax.local(&LocalIdent::Id(3)).unwrap(), local);
    }

    #[test]
    fn test_bind_duplicate() {
        let globals = globals();
        let mut scope = FuncScope::new(&globals, GlobalIdent::from("f"), true);
        scope.bind(&Local::named("x", Type::i32())).unwrap();
        let err = scope.bind(&Local::named("x", Type::i8())).unwrap_err();
        assert!(matches!(err, TranslationError::DuplicateLocal { .. }), "{}", err);
    }

    #[test]
    fn test_label_rejects_values() {
        let globals = globals();
        let mut scope = FuncScope::new(&globals, GlobalIdent::from("f"), true);
        scope.bind(&Local::named("x", Type::i32())).unwrap();
        assert!(scope.label(&LocalIdent::from("x")).is_err());
    }
}
