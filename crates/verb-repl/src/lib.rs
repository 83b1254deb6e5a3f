//! This crate provides a REPL (Read-Eval-Print Loop) for the verb command language,
//! built on [`verb_lang`].
//!
//! The REPL supports:
//! - Multi-line input while a quote or parenthesis is still open
//! - Completion of command names, `$` variables and `:` commands
//! - History that persists in the config directory
//!
//! ## Example
//!
//! ```rust,no_run
//! use verb_lang::Engine;
//!
//! let mut engine = Engine::default();
//! engine.load_builtin_commands();
//! verb_repl::demo::install(&mut engine);
//!
//! verb_repl::Repl::new(engine).run().unwrap();
//! ```
mod command_context;
pub mod demo;
mod repl;

pub use command_context::{Command, CommandContext, CommandOutput};
pub use repl::Repl;
