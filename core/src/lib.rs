//! `scripty`: an embeddable, dynamically-typed scripting language for Rust
//! hosts.
//!
//! A host builds an [`Engine`], wires in whatever bindings it wants scripts
//! to see (its own types via [`Engine::register_member_fn`] and friends,
//! plus this crate's own numeric/string/vector/assert bindings via
//! [`defaults::install`]), then parses and evaluates source text against
//! it:
//!
//! ```
//! use scripty::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! scripty::defaults::install(&mut engine);
//! let result = scripty::parse_and_run(&mut engine, "var total = 0\nfor (var i = 0; i < 5; i++) { total += i }\ntotal").unwrap();
//! assert!(matches!(result.value().unwrap(), Value::Int(10)));
//! ```

pub mod ast;
pub mod ast_builder;
pub mod bindings;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod events;
pub mod operators;
pub mod parser;
pub mod scope;
pub mod tokenizer;
pub mod type_registry;
pub mod util;
pub mod value;

pub use engine::Engine;
pub use error::{EngineError, ParseError, RuntimeError, WithSource};
pub use value::{Value, ValueBox};

/// Parses `source` and evaluates it against `engine` in one call — the
/// usual entry point for a host that isn't doing anything fancier with the
/// parsed [`ast::Ast`] (caching it, inspecting it, running it more than
/// once). Parse errors and runtime errors are both reported with source
/// context attached.
pub fn parse_and_run(engine: &mut engine::Engine, source: &str) -> Result<ValueBox, EngineError> {
    let ast = parser::parse(source)?;
    Ok(engine.evaluate_with_source(&ast, source)?)
}
