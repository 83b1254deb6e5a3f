// Evaluation of one input runs in two passes over the same scanner: the sizing pass
// produces the slot plan, the frame is allocated from it, and the evaluating pass
// below fills the frame node by node. Every node is dispatched as soon as its span
// has been scanned, so nested nodes are evaluated before the node that contains them.
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use smol_str::SmolStr;

use crate::{
    Function, SlotPlan, Value,
    error::InnerError,
    frame::{Frame, NodeId},
    lexer::{NodeVisitor, Shape, walk},
};

pub mod builtin;
pub mod command;
pub mod context;
pub mod globals;
pub mod router;

use command::Commands;
use context::EvaluationContext;
use globals::Globals;

use crate::RuntimeError;

/// Prefix marking a global variable reference.
pub const SIGIL: char = '$';
const ASSIGN: &str = "=";

/// Configuration options for the evaluator.
#[derive(Debug, Clone)]
pub struct Options {
    /// Fail with an unknown-command error instead of passing unresolved names through as text.
    pub unknown_command_is_error: bool,
    /// Name of the global variable that receives the last output.
    pub last_output_name: SmolStr,
    /// Record the output of every node, not only the outermost one.
    pub always_set_last_output: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            unknown_command_is_error: true,
            last_output_name: SmolStr::new_static("~"),
            always_set_last_output: false,
        }
    }
}

/// The outcome of evaluating one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    /// Message reported by the outermost node, if any.
    pub message: Option<String>,
    nodes: usize,
}

impl Evaluation {
    /// Number of nodes that were evaluated.
    pub fn nodes(&self) -> usize {
        self.nodes
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    pub(crate) commands: Commands,
    pub(crate) globals: Globals,
    pub(crate) options: Options,
}

impl Evaluator {
    pub(crate) fn eval(&mut self, code: &str) -> Result<Evaluation, InnerError> {
        let plan = SlotPlan::compute(code)?;
        let mut pass = NodeEvaluator {
            commands: &self.commands,
            globals: &mut self.globals,
            options: &self.options,
            frame: Frame::new(&plan),
            next: 0,
            message: None,
        };

        let value = walk(code, 0..code.len(), &mut pass)?;
        debug_assert_eq!(pass.next, plan.len());

        Ok(Evaluation {
            value,
            message: pass.message,
            nodes: pass.next,
        })
    }
}

/// The evaluating visitor of one input.
struct NodeEvaluator<'e> {
    commands: &'e Commands,
    globals: &'e mut Globals,
    options: &'e Options,
    frame: Frame,
    next: usize,
    message: Option<String>,
}

impl NodeVisitor for NodeEvaluator<'_> {
    type Output = Value;

    fn begin(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    fn text(&mut self, node: usize, slot: usize, text: String) {
        self.frame.set(node.into(), slot, Value::String(text));
    }

    fn nested(&mut self, node: usize, slot: usize, output: Value) {
        self.frame.set(node.into(), slot, output);
        self.message = None;
    }

    fn end(&mut self, node: usize, shape: Shape) -> Result<Value, InnerError> {
        let node = NodeId::from(node);
        let command = match shape {
            Shape::Empty => return Ok(Value::None),
            Shape::Single(token) => match token.strip_prefix(SIGIL) {
                Some(name) => return Ok(self.retrieve(name)),
                None => Some(token),
            },
            Shape::Slots(_) => {
                if self.is_assignment(node) {
                    self.substitute(node, 2);
                    return Ok(self.assign(node));
                }
                self.substitute(node, 0);
                None
            }
        };

        let head = match &command {
            Some(token) => Some(token.as_str()),
            None => self.frame[(node, 0)].as_str(),
        };

        let context = match head {
            Some(name) => match self.commands.get(name) {
                Some(command) => {
                    tracing::debug!(node = node.index(), command = name, "resolved command");
                    command.to_value()
                }
                None if self.options.unknown_command_is_error => {
                    tracing::debug!(node = node.index(), command = name, "unknown command");
                    return Err(RuntimeError::UnknownCommand(name.to_string()).into());
                }
                None if command.is_some() => return Ok(Value::from(name)),
                None => self.frame[(node, 0)].clone(),
            },
            None => self.frame[(node, 0)].clone(),
        };

        let value = self.dispatch(node, context)?;

        if node.is_root() || self.options.always_set_last_output {
            self.globals
                .set(&self.options.last_output_name, value.clone());
        }

        Ok(value)
    }
}

impl NodeEvaluator<'_> {
    fn retrieve(&self, name: &str) -> Value {
        match self.globals.get(name) {
            Some(value) => Value::String(format!("{SIGIL}{name} = {value}")),
            None => Value::from("unset"),
        }
    }

    fn is_assignment(&self, node: NodeId) -> bool {
        self.frame.count(node) > 1
            && matches!(self.frame[(node, 0)].as_str(), Some(s) if s.starts_with(SIGIL))
            && self.frame[(node, 1)].as_str() == Some(ASSIGN)
    }

    fn assign(&mut self, node: NodeId) -> Value {
        let target = self.frame[(node, 0)].to_string();
        let name = &target[SIGIL.len_utf8()..];

        match self.frame.get(node, 2).cloned() {
            Some(value) => {
                self.globals.set(name, value.clone());
                self.message = Some(format!("Set {target} = {}", value.repr()));
                value
            }
            None => {
                self.globals.remove(name);
                self.message = Some(format!("Unset {target}"));
                Value::None
            }
        }
    }

    /// Replaces every `$name` text slot from `from` on with the bound value.
    fn substitute(&mut self, node: NodeId, from: usize) {
        let globals = &*self.globals;
        for slot in self.frame.slots_mut(node).iter_mut().skip(from) {
            let name = match slot.as_str().and_then(|s| s.strip_prefix(SIGIL)) {
                Some(name) => name,
                None => continue,
            };
            *slot = globals.get(name).cloned().unwrap_or(Value::None);
        }
    }

    /// Runs the dispatch loop of `node` starting from `context`.
    fn dispatch(&mut self, node: NodeId, mut context: Value) -> Result<Value, RuntimeError> {
        let len = self.frame.count(node);
        let mut receiver: Option<Value> = None;
        let mut k = 0;

        if len <= 1 && context.as_invocable().is_some() {
            context = self.call(node, &context, len, receiver.as_ref())?.0;
            k = 1;
        }

        while k < len {
            if k > 0 {
                if let Some(router) = context.router() {
                    if let Some(route) = self.frame[(node, k)].as_str() {
                        let Some(handler) = router.get(route) else {
                            let parent = self.frame[(node, k - 1)].to_string();
                            tracing::debug!(node = node.index(), route, parent = %parent, "unknown route");
                            return Err(RuntimeError::UnknownRoute {
                                route: route.to_string(),
                                parent,
                            });
                        };

                        tracing::debug!(node = node.index(), route, "routed");
                        if !context.is_router() {
                            receiver = Some(context);
                        }
                        context = Value::Object(Rc::new(Function::new(handler)));
                    }
                }
            }

            let (value, consumed) = self.call(node, &context, k + 1, receiver.as_ref())?;
            context = value;
            k += 1 + consumed;
        }

        Ok(context)
    }

    /// Invokes `target` with the arguments from slot `from` on; anything that is not
    /// invocable is returned unchanged.
    fn call(
        &mut self,
        node: NodeId,
        target: &Value,
        from: usize,
        receiver: Option<&Value>,
    ) -> Result<(Value, usize), RuntimeError> {
        let Some(invocable) = target.as_invocable() else {
            return Ok((target.clone(), 0));
        };

        let mut ctx = EvaluationContext::new(
            self.frame.window(node, from),
            self.globals,
            &mut self.message,
            receiver,
        );
        let value = invocable.invoke(&mut ctx).inspect_err(|err| {
            tracing::debug!(node = node.index(), error = %err, "handler failed");
        })?;

        Ok((value, ctx.consumed()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{Registration, Router, error::syntax::SyntaxError};
    use command::Command;

    fn function<F>(f: F) -> Command
    where
        F: Fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError> + 'static,
    {
        Command::Function(Rc::new(f))
    }

    #[fixture]
    fn evaluator() -> Evaluator {
        let mut evaluator = Evaluator::default();
        evaluator.commands.define(
            "join",
            function(|ctx| {
                let parts = (0..ctx.len())
                    .filter_map(|i| ctx.get(i).map(Value::to_string))
                    .collect::<Vec<_>>();
                Ok(Value::String(parts.join("+")))
            }),
            Registration::Replace,
        );
        evaluator.commands.define(
            "first",
            function(|ctx| Ok(ctx.get(0).cloned().unwrap_or(Value::None))),
            Registration::Replace,
        );
        evaluator.commands.define(
            "one",
            function(|_| Ok(Value::Int(1))),
            Registration::Replace,
        );
        evaluator.commands.define(
            "fail",
            function(|ctx| ctx.fail("boom")),
            Registration::Replace,
        );
        evaluator.commands.define(
            "say",
            function(|ctx| {
                ctx.set_message("said");
                Ok(Value::None)
            }),
            Registration::Replace,
        );
        evaluator.commands.define(
            "make",
            Command::Routes(
                Router::new()
                    .route("pair", |ctx| {
                        let a = ctx.require(0)?.to_string();
                        let b = ctx.require(1)?.to_string();
                        Ok(Value::String(format!("{a}:{b}")))
                    })
                    .route("unit", |_| Ok(Value::from("unit"))),
            ),
            Registration::Replace,
        );
        evaluator
    }

    #[rstest]
    #[case::empty("", Value::None)]
    #[case::blank("   ", Value::None)]
    #[case::niladic("one", Value::Int(1))]
    #[case::arguments("join a b c", Value::from("a+b+c"))]
    #[case::quoted("join \"a b\" c", Value::from("a b+c"))]
    #[case::nested("join (one) x", Value::from("1+x"))]
    #[case::nested_niladic_result("first (one)", Value::Int(1))]
    #[case::lone_nested("(one)", Value::Int(1))]
    #[case::route("make pair a b", Value::from("a:b"))]
    #[case::route_then_command("make unit", Value::from("unit"))]
    #[case::consumption_then_passthrough("first a b", Value::from("a"))]
    fn test_eval(mut evaluator: Evaluator, #[case] code: &str, #[case] expected: Value) {
        assert_eq!(evaluator.eval(code).map(|e| e.value), Ok(expected));
    }

    #[rstest]
    fn test_assignment_and_retrieval(mut evaluator: Evaluator) {
        let set = evaluator.eval("$x = 5").unwrap();
        assert_eq!(set.value, Value::from("5"));
        assert_eq!(set.message.as_deref(), Some("Set $x = \"5\""));

        assert_eq!(evaluator.eval("$x").unwrap().value, Value::from("$x = 5"));
        assert_eq!(evaluator.eval("join $x $x").unwrap().value, Value::from("5+5"));

        let unset = evaluator.eval("$x =").unwrap();
        assert_eq!(unset.value, Value::None);
        assert_eq!(unset.message.as_deref(), Some("Unset $x"));
        assert_eq!(evaluator.eval("$x").unwrap().value, Value::from("unset"));
    }

    #[rstest]
    fn test_assignment_substitutes_value(mut evaluator: Evaluator) {
        evaluator.eval("$a = 1").unwrap();
        assert_eq!(evaluator.eval("$b = $a").unwrap().value, Value::from("1"));
        assert_eq!(evaluator.globals.get("b"), Some(&Value::from("1")));
    }

    #[rstest]
    fn test_unbound_variable_substitutes_none(mut evaluator: Evaluator) {
        assert_eq!(
            evaluator.eval("join $nothing").unwrap().value,
            Value::from("null")
        );
    }

    #[rstest]
    fn test_last_output(mut evaluator: Evaluator) {
        evaluator.eval("join a (one)").unwrap();
        assert_eq!(evaluator.globals.get("~"), Some(&Value::from("a+1")));

        evaluator.options.last_output_name = SmolStr::new("last");
        evaluator.eval("join a (one)").unwrap();
        assert_eq!(evaluator.globals.get("last"), Some(&Value::from("a+1")));
    }

    #[rstest]
    #[case::root_only(false, "inner+seed")]
    #[case::every_node(true, "inner+inner")]
    fn test_nested_last_output(
        mut evaluator: Evaluator,
        #[case] always_set_last_output: bool,
        #[case] expected: &str,
    ) {
        evaluator.options.always_set_last_output = always_set_last_output;
        evaluator.globals.set("~", Value::from("seed"));

        let evaluation = evaluator.eval("join (first inner) $~").unwrap();
        assert_eq!(evaluation.value, Value::from(expected));
        assert_eq!(evaluator.globals.get("~"), Some(&Value::from(expected)));
    }

    #[rstest]
    fn test_nested_message_is_cleared(mut evaluator: Evaluator) {
        let evaluation = evaluator.eval("join (say) x").unwrap();
        assert_eq!(evaluation.message, None);
        assert_eq!(evaluator.eval("say").unwrap().message.as_deref(), Some("said"));
    }

    #[rstest]
    #[case::unknown_single("nope", RuntimeError::UnknownCommand("nope".to_string()))]
    #[case::unknown_head("foo bar", RuntimeError::UnknownCommand("foo".to_string()))]
    #[case::unknown_route(
        "make triple a",
        RuntimeError::UnknownRoute { route: "triple".to_string(), parent: "make".to_string() }
    )]
    #[case::handler("join (fail)", RuntimeError::handler("boom"))]
    #[case::missing_argument("make pair a", RuntimeError::handler("Missing argument at position 1"))]
    fn test_runtime_error(
        mut evaluator: Evaluator,
        #[case] code: &str,
        #[case] expected: RuntimeError,
    ) {
        assert_eq!(evaluator.eval(code), Err(InnerError::Runtime(expected)));
    }

    #[rstest]
    #[case::single("nope", Value::from("nope"))]
    #[case::head("foo bar", Value::from("foo"))]
    fn test_unknown_passthrough(
        mut evaluator: Evaluator,
        #[case] code: &str,
        #[case] expected: Value,
    ) {
        evaluator.options.unknown_command_is_error = false;
        assert_eq!(evaluator.eval(code).map(|e| e.value), Ok(expected));
    }

    #[rstest]
    fn test_syntax_error_runs_no_handler(mut evaluator: Evaluator) {
        let result = evaluator.eval("$x = (one) \"abc");
        assert_eq!(
            result,
            Err(InnerError::Syntax(SyntaxError::UnterminatedQuote {
                quote: '"',
                offset: 11
            }))
        );
        assert!(evaluator.globals.is_empty());
    }

    #[rstest]
    fn test_nodes_match_plan(mut evaluator: Evaluator) {
        let code = "join (one) (join a (one)) ()";
        let plan = SlotPlan::compute(code).unwrap();
        assert_eq!(evaluator.eval(code).unwrap().nodes(), plan.len());
    }

    #[test]
    fn test_evaluation_display() {
        let evaluation = Evaluation {
            value: Value::Int(3),
            message: None,
            nodes: 1,
        };
        assert_eq!(evaluation.to_string(), "3");
        let evaluation = Evaluation {
            message: Some("done".to_string()),
            ..evaluation
        };
        assert_eq!(evaluation.to_string(), "done");
    }
}
