use std::rc::Rc;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::command::{Command, Commands, Registration};
use super::context::EvaluationContext;
use crate::{RuntimeError, Value};

type Builtin = fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError>;

const BUILTINS: [(&str, Builtin); 4] = [
    ("print", print),
    ("type", type_of),
    ("time", time),
    ("version", version),
];

/// Installs the built-in commands without replacing host registrations.
pub(crate) fn load(commands: &mut Commands) {
    for (name, f) in BUILTINS {
        if !commands.define(name, Command::Function(Rc::new(f)), Registration::KeepExisting) {
            tracing::debug!(command = name, "kept existing command over builtin");
        }
    }
}

fn print(ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    let text = (0..ctx.len())
        .filter_map(|i| ctx.get(i))
        .map(Value::to_string)
        .join(", ");
    Ok(Value::String(text))
}

fn type_of(ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    if ctx.is_empty() {
        return Ok(Value::None);
    }

    let names = (0..ctx.len())
        .filter_map(|i| ctx.get(i))
        .map(Value::type_name)
        .join(", ");
    Ok(Value::String(names))
}

fn time(ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    match ctx.get(0) {
        None => Ok(Value::String(
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )),
        Some(selector) => match selector.as_str() {
            Some("ms") => Ok(Value::Long(Utc::now().timestamp_millis())),
            _ => ctx.fail(format!("Invalid time selection \"{selector}\"")),
        },
    }
}

fn version(_: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    Ok(Value::from(crate::Engine::version()))
}

#[derive(Debug, Clone)]
pub struct BuiltinCommandDoc {
    pub description: &'static str,
    pub params: &'static [&'static str],
}

pub static BUILTIN_COMMAND_DOC: LazyLock<FxHashMap<SmolStr, BuiltinCommandDoc>> =
    LazyLock::new(|| {
        let mut map = FxHashMap::default();

        map.insert(
            SmolStr::new_static("print"),
            BuiltinCommandDoc {
                description: "Joins the display of every argument with \", \".",
                params: &["values..."],
            },
        );
        map.insert(
            SmolStr::new_static("type"),
            BuiltinCommandDoc {
                description: "Returns the type names of the given values.",
                params: &["values..."],
            },
        );
        map.insert(
            SmolStr::new_static("time"),
            BuiltinCommandDoc {
                description: "Returns the current time as RFC 3339 text, or epoch milliseconds with `ms`.",
                params: &["[ms]"],
            },
        );
        map.insert(
            SmolStr::new_static("version"),
            BuiltinCommandDoc {
                description: "Returns the engine version.",
                params: &[],
            },
        );

        map
    });
