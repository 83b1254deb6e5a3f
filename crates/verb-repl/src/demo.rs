//! A small team directory used to try the language interactively.
//!
//! ```text
//! create team Red
//! $bob = (create user Bob)
//! $blue = (create team Blue)
//! $blue add member $bob
//! $blue members
//! ```
use std::any::Any;
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use itertools::Itertools;
use verb_lang::{Engine, EvaluationContext, HostObject, Router, RuntimeError, Value};

#[derive(Debug)]
pub struct Team {
    name: String,
    members: RefCell<Vec<String>>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> Vec<String> {
        self.members.borrow().clone()
    }
}

impl Display for Team {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.name)
    }
}

impl HostObject for Team {
    fn type_name(&self) -> &str {
        "team"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn router(&self) -> Option<Router> {
        Some(
            Router::new()
                .route("name", |ctx| Ok(Value::from(receiving_team(ctx)?.name())))
                .route("members", |ctx| {
                    Ok(Value::String(receiving_team(ctx)?.members().join(", ")))
                })
                .route("add", |_| {
                    Ok(Value::object(Router::new().route("member", add_member)))
                })
                .route("remove", |_| {
                    Ok(Value::object(Router::new().route("member", remove_member)))
                }),
        )
    }
}

#[derive(Debug)]
pub struct User {
    name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "User({})", self.name)
    }
}

impl HostObject for User {
    fn type_name(&self) -> &str {
        "user"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn router(&self) -> Option<Router> {
        Some(Router::new().route("name", |ctx| {
            let user = ctx
                .receiver_as::<User>()
                .ok_or_else(|| RuntimeError::handler("Expected a user"))?;
            Ok(Value::from(user.name()))
        }))
    }
}

#[derive(Debug, Default)]
struct Directory {
    teams: Vec<Value>,
    users: Vec<Value>,
}

impl Directory {
    fn entries(&mut self, kind: Kind) -> &mut Vec<Value> {
        match kind {
            Kind::Team => &mut self.teams,
            Kind::User => &mut self.users,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Team,
    User,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Team => write!(f, "team"),
            Kind::User => write!(f, "user"),
        }
    }
}

fn receiving_team<'a>(ctx: &EvaluationContext<'a>) -> Result<&'a Team, RuntimeError> {
    ctx.receiver_as::<Team>()
        .ok_or_else(|| RuntimeError::handler("Expected a team"))
}

fn add_member(ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    let team = receiving_team(ctx)?;
    let user = ctx.require_object::<User>(0)?;

    let mut members = team.members.borrow_mut();
    if members.iter().any(|m| m == user.name()) {
        return ctx.fail(format!("{} is already in {}", user.name(), team.name()));
    }
    members.push(user.name().to_string());
    drop(members);

    ctx.set_message(format!("Added {} to {}", user.name(), team.name()));
    Ok(ctx.receiver().cloned().unwrap_or(Value::None))
}

fn remove_member(ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    let team = receiving_team(ctx)?;
    let user = ctx.require_object::<User>(0)?;

    let mut members = team.members.borrow_mut();
    let Some(index) = members.iter().position(|m| m == user.name()) else {
        return ctx.fail(format!("{} is not in {}", user.name(), team.name()));
    };
    members.remove(index);
    drop(members);

    ctx.set_message(format!("Removed {} from {}", user.name(), team.name()));
    Ok(ctx.receiver().cloned().unwrap_or(Value::None))
}

fn kind_router<F>(directory: &Rc<RefCell<Directory>>, handler: F) -> Router
where
    F: Fn(&mut EvaluationContext<'_>, &mut Directory, Kind) -> Result<Value, RuntimeError>
        + Clone
        + 'static,
{
    [Kind::Team, Kind::User]
        .into_iter()
        .fold(Router::new(), |router, kind| {
            let directory = Rc::clone(directory);
            let handler = handler.clone();
            router.route(&kind.to_string(), move |ctx| {
                handler(ctx, &mut directory.borrow_mut(), kind)
            })
        })
}

fn create(
    ctx: &mut EvaluationContext<'_>,
    directory: &mut Directory,
    kind: Kind,
) -> Result<Value, RuntimeError> {
    let name = ctx.require_str(0)?;
    let value = match kind {
        Kind::Team => Value::object(Team::new(name)),
        Kind::User => Value::object(User::new(name)),
    };

    directory.entries(kind).push(value.clone());
    tracing::debug!(%kind, name, "created");
    ctx.set_message(format!("Created {kind} {name}"));
    Ok(value)
}

fn list(
    _: &mut EvaluationContext<'_>,
    directory: &mut Directory,
    kind: Kind,
) -> Result<Value, RuntimeError> {
    Ok(Value::String(
        directory
            .entries(kind)
            .iter()
            .map(|entry| entry.to_string())
            .join(", "),
    ))
}

fn delete(
    ctx: &mut EvaluationContext<'_>,
    directory: &mut Directory,
    kind: Kind,
) -> Result<Value, RuntimeError> {
    let target = ctx.require(0)?;
    let Some(object) = target.as_object() else {
        return ctx.fail(format!("Expected a {kind}, got {}", target.type_name()));
    };

    let entries = directory.entries(kind);
    let Some(index) = entries
        .iter()
        .position(|entry| entry.as_object().is_some_and(|e| Rc::ptr_eq(e, object)))
    else {
        return ctx.fail(format!("{target} is not a known {kind}"));
    };

    let removed = entries.remove(index);
    ctx.set_message(format!("Deleted {removed}"));
    Ok(removed)
}

/// Registers `create`, `list` and `delete` over a fresh, empty directory.
pub fn install(engine: &mut Engine) {
    let directory = Rc::new(RefCell::new(Directory::default()));

    engine.register_routes("create", kind_router(&directory, create));
    engine.register_routes("list", kind_router(&directory, list));
    engine.register_routes("delete", kind_router(&directory, delete));
}
