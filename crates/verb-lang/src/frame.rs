use std::ops::{Index, Range};

use crate::{SlotPlan, Value};

/// Pre-order index of a node within one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub const fn new(id: u32) -> NodeId {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl From<usize> for NodeId {
    fn from(id: usize) -> Self {
        Self::new(id as u32)
    }
}

/// The flat slot buffer shared by every node of one evaluation.
///
/// Allocated once from a [`SlotPlan`] and never resized. Node `n` owns the
/// contiguous region starting at the sum of the counts of the nodes before it.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    slots: Vec<Value>,
    offsets: Vec<usize>,
    counts: Vec<usize>,
}

impl Frame {
    pub fn new(plan: &SlotPlan) -> Self {
        Frame {
            slots: vec![Value::NONE; plan.total()],
            offsets: plan.offsets(),
            counts: plan.counts().to_vec(),
        }
    }

    /// Number of nodes the frame was planned for.
    pub fn nodes(&self) -> usize {
        self.counts.len()
    }

    /// Number of slots owned by `node`.
    pub fn count(&self, node: NodeId) -> usize {
        self.counts[node.index()]
    }

    fn region(&self, node: NodeId) -> Range<usize> {
        let start = self.offsets[node.index()];
        start..start + self.counts[node.index()]
    }

    pub fn set(&mut self, node: NodeId, slot: usize, value: Value) {
        debug_assert!(
            slot < self.count(node),
            "slot {slot} out of range for node {node:?}"
        );
        let offset = self.offsets[node.index()] + slot;
        self.slots[offset] = value;
    }

    pub fn get(&self, node: NodeId, slot: usize) -> Option<&Value> {
        if slot < self.count(node) {
            self.slots.get(self.offsets[node.index()] + slot)
        } else {
            None
        }
    }

    /// The slots of `node` starting at `from`; empty once `from` passes the end.
    pub fn window(&self, node: NodeId, from: usize) -> &[Value] {
        let region = self.region(node);
        let start = (region.start + from).min(region.end);
        &self.slots[start..region.end]
    }

    pub fn slots_mut(&mut self, node: NodeId) -> &mut [Value] {
        let region = self.region(node);
        &mut self.slots[region]
    }
}

impl Index<(NodeId, usize)> for Frame {
    type Output = Value;

    fn index(&self, (node, slot): (NodeId, usize)) -> &Self::Output {
        &self.slots[self.offsets[node.index()] + slot]
    }
}
