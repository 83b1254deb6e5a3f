use std::rc::Rc;

use smol_str::SmolStr;

use crate::{
    EvaluationContext, Router, RuntimeError, Value, VerbResult,
    error,
    eval::{
        Evaluation, Evaluator, builtin,
        command::{Command, Commands, Registration},
        globals::Globals,
    },
};

#[derive(Debug, Clone)]
pub struct Options {
    /// Characters of source shown on each side of a syntax error.
    pub context_radius: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { context_radius: 20 }
    }
}

/// The embedding entry point: a command registry, a global variable namespace and
/// the options that govern evaluation.
///
/// Values are reference counted with `Rc`, so an engine stays on the thread that
/// created it.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub(crate) evaluator: Evaluator,
    pub(crate) options: Options,
}

impl Engine {
    pub fn set_unknown_command_is_error(&mut self, value: bool) {
        self.evaluator.options.unknown_command_is_error = value;
    }

    pub fn set_last_output_name(&mut self, name: &str) {
        self.evaluator.options.last_output_name = SmolStr::new(name);
    }

    pub fn set_always_set_last_output(&mut self, value: bool) {
        self.evaluator.options.always_set_last_output = value;
    }

    pub fn set_context_radius(&mut self, radius: usize) {
        self.options.context_radius = radius;
    }

    /// Registers a function command, replacing any entry of the same name.
    pub fn register<F>(&mut self, name: &str, f: F) -> bool
    where
        F: Fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError> + 'static,
    {
        self.register_with(name, f, Registration::Replace)
    }

    pub fn register_with<F>(&mut self, name: &str, f: F, registration: Registration) -> bool
    where
        F: Fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError> + 'static,
    {
        self.evaluator
            .commands
            .define(name, Command::Function(Rc::new(f)), registration)
    }

    /// Registers a table of sub-commands under `name`.
    pub fn register_routes(&mut self, name: &str, router: Router) -> bool {
        self.register_routes_with(name, router, Registration::Replace)
    }

    pub fn register_routes_with(
        &mut self,
        name: &str,
        router: Router,
        registration: Registration,
    ) -> bool {
        self.evaluator
            .commands
            .define(name, Command::Routes(router), registration)
    }

    /// Installs `print`, `type`, `time` and `version`, keeping host commands of the same name.
    pub fn load_builtin_commands(&mut self) {
        builtin::load(&mut self.evaluator.commands);
    }

    /// Evaluates one input.
    ///
    /// Nested expressions recurse, so the stack depth grows with the parenthesis
    /// nesting depth of `code`.
    #[allow(clippy::result_large_err)]
    pub fn evaluate(&mut self, code: &str) -> Result<Evaluation, error::Error> {
        self.evaluator
            .eval(code)
            .map_err(|e| error::Error::from_error(code, e))
    }

    #[allow(clippy::result_large_err)]
    pub fn eval(&mut self, code: &str) -> VerbResult {
        self.evaluate(code).map(|evaluation| evaluation.value)
    }

    /// Evaluates `code` and renders the outcome as text: the message when one was
    /// reported, otherwise the value, or the rendered error.
    pub fn process(&mut self, code: &str) -> String {
        match self.evaluate(code) {
            Ok(evaluation) => evaluation.to_string(),
            Err(err) => err.render(self.options.context_radius),
        }
    }

    /// Evaluates `code` and panics unless it succeeds with a value accepted by `predicate`.
    pub fn assert_eval<P>(&mut self, code: &str, predicate: P)
    where
        P: FnOnce(&Value) -> bool,
    {
        match self.eval(code) {
            Ok(value) if predicate(&value) => {}
            Ok(value) => panic!("Bad behavior for \"{code}\", got: {value}"),
            Err(err) => panic!("Error during execution \"{code}\": {err}"),
        }
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.evaluator.globals.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.evaluator.globals.set(name, value.into())
    }

    pub fn remove_var(&mut self, name: &str) -> Option<Value> {
        self.evaluator.globals.remove(name)
    }

    pub fn globals(&self) -> &Globals {
        &self.evaluator.globals
    }

    pub fn commands(&self) -> &Commands {
        &self.evaluator.commands
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.evaluator.commands.names()
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_default() {
        let engine = Engine::default();
        assert_eq!(engine.options.context_radius, 20);
        assert!(engine.evaluator.options.unknown_command_is_error);
        assert_eq!(engine.evaluator.options.last_output_name, "~");
        assert!(!engine.evaluator.options.always_set_last_output);
        assert!(engine.command_names().is_empty());
    }

    #[test]
    fn test_setters() {
        let mut engine = Engine::default();
        engine.set_unknown_command_is_error(false);
        engine.set_last_output_name("last");
        engine.set_always_set_last_output(true);
        engine.set_context_radius(4);

        assert!(!engine.evaluator.options.unknown_command_is_error);
        assert_eq!(engine.evaluator.options.last_output_name, "last");
        assert!(engine.evaluator.options.always_set_last_output);
        assert_eq!(engine.options.context_radius, 4);
    }

    #[test]
    fn test_register_with() {
        let mut engine = Engine::default();
        assert!(engine.register("x", |_| Ok(Value::Int(1))));
        assert!(!engine.register_with("x", |_| Ok(Value::Int(2)), Registration::KeepExisting));
        assert_eq!(engine.eval("x"), Ok(Value::Int(1)));

        assert!(engine.register_with("x", |_| Ok(Value::Int(3)), Registration::Replace));
        assert_eq!(engine.eval("x"), Ok(Value::Int(3)));
    }

    #[test]
    fn test_register_routes() {
        let mut engine = Engine::default();
        assert!(engine.register_routes("x", Router::new().route("y", |_| Ok(Value::from("y")))));
        assert!(!engine.register_routes_with("x", Router::new(), Registration::KeepExisting));
        assert_eq!(engine.eval("x y"), Ok(Value::from("y")));
    }

    #[test]
    fn test_load_builtin_commands() {
        let mut engine = Engine::default();
        engine.load_builtin_commands();
        assert_eq!(
            engine.command_names(),
            vec!["print", "time", "type", "version"]
        );
        assert_eq!(engine.eval("version"), Ok(Value::from(Engine::version())));
    }

    #[test]
    fn test_process() {
        let mut engine = Engine::default();
        engine.load_builtin_commands();
        assert_eq!(engine.process("print a b"), "a, b");
        assert_eq!(engine.process("$x = 1"), "Set $x = \"1\"");
        assert_eq!(engine.process("nope"), "Unknown command: nope");
        assert_eq!(
            engine.process("print \"abc"),
            "Unterminated quote `\"` at offset 6\nprint \"abc\n      ^"
        );
    }

    #[test]
    fn test_vars() {
        let mut engine = Engine::default();
        assert_eq!(engine.set_var("x", 1), None);
        assert_eq!(engine.var("x"), Some(&Value::Int(1)));
        assert_eq!(engine.globals().len(), 1);
        assert_eq!(engine.remove_var("x"), Some(Value::Int(1)));
        assert!(engine.var("x").is_none());
    }

    #[test]
    fn test_assert_eval_accepts() {
        let mut engine = Engine::default();
        engine.load_builtin_commands();
        engine.assert_eval("print a", |v| v == &Value::from("a"));
    }

    #[test]
    #[should_panic(expected = "Bad behavior for \"print a\", got: a")]
    fn test_assert_eval_bad_behavior() {
        let mut engine = Engine::default();
        engine.load_builtin_commands();
        engine.assert_eval("print a", |v| v.is_none());
    }

    #[test]
    #[should_panic(expected = "Error during execution \"nope\": Unknown command: nope")]
    fn test_assert_eval_error() {
        let mut engine = Engine::default();
        engine.assert_eval("nope", |_| true);
    }

    #[test]
    fn test_version() {
        assert!(!Engine::version().is_empty());
    }
}
