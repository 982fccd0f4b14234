use serde::{Deserialize, Serialize};

use super::frame::FrameId;

/// Index of a node in a profile's call tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Grouped call tree node. Every sample sharing the stack prefix that ends
/// here is merged into this node.
#[derive(Debug, Clone)]
pub struct CallTreeNode {
    pub frame: FrameId,
    pub parent: Option<NodeId>,
    /// Children in first-seen order.
    pub children: Vec<NodeId>,
    /// Stack depth (0 = root).
    pub depth: u32,
    /// Weight of samples whose leaf is this node.
    pub self_weight: f64,
    /// Self weight plus the total of every child.
    pub total_weight: f64,
}

impl CallTreeNode {
    pub(crate) fn new(frame: FrameId, parent: Option<NodeId>, depth: u32) -> Self {
        Self {
            frame,
            parent,
            children: Vec::new(),
            depth,
            self_weight: 0.0,
            total_weight: 0.0,
        }
    }
}

/// One recorded stack. `node` is the leaf, or `None` for an idle sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub node: Option<NodeId>,
    pub weight: f64,
}

/// A call yielded while enumerating a profile: where it starts on the
/// weight axis, how much weight it covers and how deep it sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallNode {
    pub frame: FrameId,
    pub node: NodeId,
    pub start: f64,
    pub weight: f64,
    pub depth: u32,
}

impl CallNode {
    pub fn end(&self) -> f64 {
        self.start + self.weight
    }
}
