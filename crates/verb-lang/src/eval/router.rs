use std::any::Any;
use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::context::EvaluationContext;
use crate::{HostObject, RuntimeError, Value};

/// Something the dispatch loop can call.
///
/// Implemented for every closure taking an [`EvaluationContext`], so most hosts never
/// implement it by hand.
pub trait Invocable {
    fn invoke(&self, ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError>;
}

impl<F> Invocable for F
where
    F: Fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError>,
{
    fn invoke(&self, ctx: &mut EvaluationContext<'_>) -> Result<Value, RuntimeError> {
        self(ctx)
    }
}

/// A fixed table of sub-commands.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone, Default)]
pub struct Router {
    routes: Rc<FxHashMap<SmolStr, Rc<dyn Invocable>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError> + 'static,
    {
        self.route_invocable(name, Rc::new(f))
    }

    pub fn route_invocable(mut self, name: &str, invocable: Rc<dyn Invocable>) -> Self {
        Rc::make_mut(&mut self.routes).insert(SmolStr::new(name), invocable);
        self
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Invocable>> {
        self.routes.get(name).map(Rc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Route names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.routes.keys().map(SmolStr::as_str).sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.names())
            .finish()
    }
}

impl Display for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Router[{}]", self.names().join(", "))
    }
}

impl HostObject for Router {
    fn type_name(&self) -> &str {
        "router"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn router(&self) -> Option<Router> {
        Some(self.clone())
    }
}
