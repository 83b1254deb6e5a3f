use std::any::Any;
use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

use crate::{EvaluationContext, Invocable, Router, RuntimeError};

/// An opaque value owned by the host application.
///
/// The engine only looks at the two capabilities below: an object that is
/// invocable can be called by the dispatch loop, and an object that returns a
/// [`Router`] acts as a namespace of sub-commands.
pub trait HostObject: Debug + Display {
    /// Name reported by the `type` command.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn as_invocable(&self) -> Option<&dyn Invocable> {
        None
    }

    /// Route source capability.
    fn router(&self) -> Option<Router> {
        None
    }
}

/// A callable command value.
pub struct Function {
    inner: Rc<dyn Invocable>,
}

impl Function {
    pub fn new(inner: Rc<dyn Invocable>) -> Self {
        Self { inner }
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Function")
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "function")
    }
}

impl HostObject for Function {
    fn type_name(&self) -> &str {
        "function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_invocable(&self) -> Option<&dyn Invocable> {
        Some(self.inner.as_ref())
    }
}

#[derive(Clone)]
pub enum Value {
    None,
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(Rc<dyn HostObject>),
}

impl Value {
    pub const NONE: Value = Self::None;

    pub fn object<T: HostObject + 'static>(object: T) -> Self {
        Value::Object(Rc::new(object))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut EvaluationContext<'_>) -> Result<Value, RuntimeError> + 'static,
    {
        Value::Object(Rc::new(Function::new(Rc::new(f))))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<dyn HostObject>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    pub fn as_invocable(&self) -> Option<&dyn Invocable> {
        self.as_object().and_then(|object| object.as_invocable())
    }

    pub fn router(&self) -> Option<Router> {
        self.as_object().and_then(|object| object.router())
    }

    /// Returns `true` for the plain [`Router`] tables, as opposed to host objects
    /// that merely expose one.
    pub fn is_router(&self) -> bool {
        self.downcast_ref::<Router>().is_some()
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "null",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Object(o) => o.type_name(),
        }
    }

    pub fn to_i32(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Long(n) => i32::try_from(*n).ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            Value::Int(n) => Some(i64::from(*n)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_f32(&self) -> Option<f32> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f32),
            Value::Long(n) => Some(*n as f32),
            Value::Double(n) => Some(*n as f32),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            Value::Float(n) => Some(f64::from(*n)),
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Like `Display`, but strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("\"{s}\""),
            _ => self.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::None)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "null"),
            Value::String(s) => write!(f, "{s}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Object(o) => write!(f, "{o}"),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int(n) => write!(f, "{n}i32"),
            Value::Long(n) => write!(f, "{n}i64"),
            Value::Float(n) => write!(f, "{n}f32"),
            Value::Double(n) => write!(f, "{n}f64"),
            Value::Object(o) => write!(f, "{o:?}"),
        }
    }
}
