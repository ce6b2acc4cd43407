//! LIR - Syntax tree translation
//!
//! This crate turns the syntax tree produced by an assembly parser into the
//! in-memory IR of `lir-ir`:
//! - `ast` - node shapes of the parsed file (serde-serializable)
//! - `config` - translation options
//! - `error` - `TranslationError` with entity and source location
//! - `generator` - two-phase translation (skeletons, then bodies)
//!
//! ```no_run
//! let json = std::fs::read_to_string("module.json").unwrap();
//! let module = lir_asm::translate_json(&json).unwrap();
//! print!("{}", module);
//! ```

pub mod ast;
pub mod config;
pub mod error;
mod generator;

pub use config::GenConfig;
pub use error::TranslationError;

use lir_common::LirError;
use lir_ir::Module;
use log::info;

/// Translate `tree` with the default configuration
pub fn translate(tree: &ast::Module) -> Result<Module, TranslationError> {
    translate_with(tree, &GenConfig::default())
}

pub fn translate_with(tree: &ast::Module, config: &GenConfig) -> Result<Module, TranslationError> {
    let module = generator::generate(tree, config)?;
    info!(
        "Translated module: {} types, {} globals, {} aliases, {} ifuncs, {} functions",
        module.type_defs().len(),
        module.globals().len(),
        module.aliases().len(),
        module.ifuncs().len(),
        module.funcs().len()
    );
    Ok(module)
}

/// Decode a JSON syntax tree and translate it
pub fn translate_json(json: &str) -> Result<Module, LirError> {
    let tree = ast::Module::from_json(json)?;
    Ok(translate(&tree)?)
}
