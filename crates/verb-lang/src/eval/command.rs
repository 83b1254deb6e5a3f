use std::rc::Rc;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{Function, Invocable, Router, Value};

/// A top-level entry of the command registry.
#[derive(Clone)]
pub enum Command {
    Function(Rc<dyn Invocable>),
    Routes(Router),
}

impl Command {
    /// The value that starts the dispatch loop for this command.
    pub fn to_value(&self) -> Value {
        match self {
            Command::Function(f) => Value::Object(Rc::new(Function::new(Rc::clone(f)))),
            Command::Routes(router) => Value::object(router.clone()),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Function(_) => write!(f, "Function"),
            Command::Routes(router) => write!(f, "{router:?}"),
        }
    }
}

/// How a registration treats an existing entry of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Registration {
    #[default]
    Replace,
    KeepExisting,
}

#[derive(Debug, Clone, Default)]
pub struct Commands {
    entries: FxHashMap<SmolStr, Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `command` under `name`; returns whether it was stored.
    pub fn define(&mut self, name: &str, command: Command, registration: Registration) -> bool {
        match registration {
            Registration::KeepExisting if self.entries.contains_key(name) => false,
            _ => {
                self.entries.insert(SmolStr::new(name), command);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Command> {
        self.entries.remove(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(SmolStr::as_str).sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn constant(value: i32) -> Command {
        Command::Function(Rc::new(
            move |_: &mut crate::EvaluationContext<'_>| -> Result<Value, crate::RuntimeError> {
                Ok(Value::Int(value))
            },
        ))
    }

    #[rstest]
    #[case::replace(Registration::Replace, true, 2)]
    #[case::keep_existing(Registration::KeepExisting, false, 1)]
    fn test_define_existing(
        #[case] registration: Registration,
        #[case] expected_stored: bool,
        #[case] expected_value: i32,
    ) {
        let mut commands = Commands::new();
        assert!(commands.define("x", constant(1), Registration::Replace));
        assert_eq!(
            commands.define("x", constant(2), registration),
            expected_stored
        );

        let Some(Command::Function(f)) = commands.get("x") else {
            panic!("expected a function command");
        };
        let mut globals = crate::Globals::new();
        let mut message = None;
        let mut ctx = crate::EvaluationContext::new(&[], &mut globals, &mut message, None);
        assert_eq!(f.invoke(&mut ctx), Ok(Value::Int(expected_value)));
    }

    #[test]
    fn test_names_sorted() {
        let mut commands = Commands::new();
        commands.define("b", constant(1), Registration::Replace);
        commands.define("a", Command::Routes(Router::new()), Registration::Replace);
        assert_eq!(commands.names(), vec!["a", "b"]);
        assert_eq!(commands.len(), 2);
        assert!(commands.remove("a").is_some());
        assert!(!commands.contains("a"));
    }

    #[test]
    fn test_to_value() {
        assert!(constant(1).to_value().as_invocable().is_some());
        assert!(Command::Routes(Router::new()).to_value().is_router());
    }
}
