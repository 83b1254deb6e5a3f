//! `verb-lang` is an embeddable engine for a small command language.
//!
//! Input like `create team "Red"` or `print (time ms)` is parsed and evaluated in one
//! go against the commands a host registered. Parenthesized sub-expressions are
//! evaluated first and their results become arguments of the enclosing command.
//! Global variables are addressed with `$`, and commands can route to sub-commands.
//!
//! ## Examples
//!
//! ```rust
//! use verb_lang::{Engine, Router, Value};
//!
//! let mut engine = Engine::default();
//! engine.load_builtin_commands();
//! engine.register("double", |ctx| Ok(Value::Int(ctx.get_i32_or(0, 0) * 2)));
//! engine.register_routes(
//!     "greet",
//!     Router::new().route("hello", |ctx| {
//!         Ok(Value::String(format!("hello, {}", ctx.require_str(0)?)))
//!     }),
//! );
//!
//! assert_eq!(engine.eval("double (double 3)").unwrap(), Value::Int(12));
//! assert_eq!(engine.eval("greet hello world").unwrap(), Value::from("hello, world"));
//!
//! assert_eq!(engine.process("$x = 5"), "Set $x = \"5\"");
//! assert_eq!(engine.eval("double $x").unwrap(), Value::Int(10));
//! assert_eq!(engine.eval("print $~ $x").unwrap(), Value::from("10, 5"));
//!
//! // Slot counts per node, outermost first.
//! let plan = verb_lang::slot_plan("print (time ms) done").unwrap();
//! assert_eq!(plan.counts(), &[3, 2]);
//! ```
mod engine;
mod error;
mod eval;
mod frame;
mod lexer;
mod plan;
mod value;

pub use engine::{Engine, Options};
pub use error::{Error, InnerError};
pub use error::runtime::RuntimeError;
pub use error::syntax::SyntaxError;
pub use eval::builtin::{BUILTIN_COMMAND_DOC, BuiltinCommandDoc};
pub use eval::command::{Command, Commands, Registration};
pub use eval::context::EvaluationContext;
pub use eval::globals::Globals;
pub use eval::router::{Invocable, Router};
pub use eval::{Evaluation, SIGIL};
pub use frame::{Frame, NodeId};
pub use plan::SlotPlan;
pub use value::{Function, HostObject, Value};

pub type VerbResult = Result<Value, Error>;

/// Computes the slot plan of `code` without evaluating anything.
#[allow(clippy::result_large_err)]
pub fn slot_plan(code: &str) -> Result<SlotPlan, Error> {
    SlotPlan::compute(code).map_err(|e: InnerError| Error::from_error(code, e))
}
