use itertools::Itertools;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smol_str::SmolStr;

use crate::Value;

/// The flat global variable namespace of an engine.
///
/// Names are stored without the sigil. Nothing is ever cleared implicitly.
#[derive(Debug, Clone)]
pub struct Globals {
    values: FxHashMap<SmolStr, Value>,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            values: FxHashMap::with_capacity_and_hasher(32, FxBuildHasher),
        }
    }
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Stores `value`, returning the previous binding.
    #[inline(always)]
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.insert(SmolStr::new(name), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bindings sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .sorted_by_key(|(name, _)| *name)
    }
}
