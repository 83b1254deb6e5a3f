use crate::{Globals, RuntimeError, Value};

/// The view a handler gets of its invocation.
///
/// Positional arguments are the slots of the current node that follow the
/// handler's own position. Reading argument `i` through any accessor that returns
/// it claims the arguments up to and including `i`; the dispatch loop skips every
/// claimed argument before it looks for the next route. `has`, `peek` and `args`
/// look without claiming.
pub struct EvaluationContext<'a> {
    args: &'a [Value],
    consumed: usize,
    globals: &'a mut Globals,
    message: &'a mut Option<String>,
    receiver: Option<&'a Value>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        args: &'a [Value],
        globals: &'a mut Globals,
        message: &'a mut Option<String>,
        receiver: Option<&'a Value>,
    ) -> Self {
        Self {
            args,
            consumed: 0,
            globals,
            message,
            receiver,
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn has(&self, index: usize) -> bool {
        index < self.args.len()
    }

    pub fn peek(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    /// All remaining arguments, unclaimed.
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    #[inline(always)]
    fn claim(&mut self, index: usize) -> Option<&'a Value> {
        let value = self.args.get(index)?;
        self.consumed = self.consumed.max(index + 1);
        Some(value)
    }

    pub fn get(&mut self, index: usize) -> Option<&'a Value> {
        self.claim(index)
    }

    pub fn require(&mut self, index: usize) -> Result<&'a Value, RuntimeError> {
        self.claim(index)
            .ok_or_else(|| RuntimeError::handler(format!("Missing argument at position {index}")))
    }

    pub fn require_str(&mut self, index: usize) -> Result<&'a str, RuntimeError> {
        let value = self.require(index)?;
        value.as_str().ok_or_else(|| {
            RuntimeError::handler(format!(
                "Expected a string at position {index}, got {}",
                value.type_name()
            ))
        })
    }

    /// Requires a host object of type `T`.
    pub fn require_object<T: 'static>(&mut self, index: usize) -> Result<&'a T, RuntimeError> {
        let value = self.require(index)?;
        value.downcast_ref::<T>().ok_or_else(|| {
            RuntimeError::handler(format!(
                "Unexpected {} at position {index}",
                value.type_name()
            ))
        })
    }

    pub fn get_i32_or(&mut self, index: usize, default: i32) -> i32 {
        self.claim(index)
            .and_then(Value::to_i32)
            .unwrap_or(default)
    }

    pub fn get_i64_or(&mut self, index: usize, default: i64) -> i64 {
        self.claim(index)
            .and_then(Value::to_i64)
            .unwrap_or(default)
    }

    pub fn get_f32_or(&mut self, index: usize, default: f32) -> f32 {
        self.claim(index)
            .and_then(Value::to_f32)
            .unwrap_or(default)
    }

    pub fn get_f64_or(&mut self, index: usize, default: f64) -> f64 {
        self.claim(index)
            .and_then(Value::to_f64)
            .unwrap_or(default)
    }

    pub fn get_str_or<'b>(&mut self, index: usize, default: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.claim(index)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    /// Like [`get_str_or`](Self::get_str_or), but only accepts identifiers
    /// (`[A-Za-z_][A-Za-z0-9_-]*`).
    pub fn get_ident_or<'b>(&mut self, index: usize, default: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.claim(index)
            .and_then(Value::as_str)
            .filter(|s| is_ident(s))
            .unwrap_or(default)
    }

    /// Claims the first `n` arguments without reading them.
    pub fn consume(&mut self, n: usize) {
        self.consumed = self.consumed.max(n.min(self.args.len()));
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// The host object whose router supplied the running handler, if any.
    pub fn receiver(&self) -> Option<&'a Value> {
        self.receiver
    }

    pub fn receiver_as<T: 'static>(&self) -> Option<&'a T> {
        self.receiver.and_then(|receiver| receiver.downcast_ref::<T>())
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: Value) -> Option<Value> {
        self.globals.set(name, value)
    }

    pub fn remove_var(&mut self, name: &str) -> Option<Value> {
        self.globals.remove(name)
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        *self.message = Some(message.into());
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn fail<T>(&self, message: impl Into<String>) -> Result<T, RuntimeError> {
        Err(RuntimeError::Handler(message.into()))
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
