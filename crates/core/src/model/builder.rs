use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::call_tree::{CallTreeNode, NodeId, Sample};
use super::frame::{Frame, FrameId, FrameInfo, FrameKey};
use super::profile::Profile;
use super::unit::ValueUnit;
use crate::error::ProfileError;

/// Accumulates weighted stacks into a [`Profile`].
///
/// Stacks are listed root first. Samples sharing a prefix share call tree
/// nodes, so the tree is grouped as it is built.
#[derive(Debug)]
pub struct ProfileBuilder {
    name: Option<String>,
    unit: ValueUnit,
    frames: Vec<Frame>,
    frame_index: HashMap<FrameKey, FrameId>,
    nodes: Vec<CallTreeNode>,
    roots: Vec<NodeId>,
    child_index: HashMap<(Option<NodeId>, FrameId), NodeId>,
    samples: Vec<Sample>,
    total_weight: f64,
    total_non_idle_weight: f64,
    /// Sample number each frame was last counted in, so a recursive stack
    /// adds to a frame's total only once.
    frame_epoch: Vec<u64>,
    epoch: u64,
    stack_buf: Vec<FrameId>,
}

impl ProfileBuilder {
    pub fn new(unit: ValueUnit) -> Self {
        Self {
            name: None,
            unit,
            frames: Vec::new(),
            frame_index: HashMap::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
            child_index: HashMap::new(),
            samples: Vec::new(),
            total_weight: 0.0,
            total_non_idle_weight: 0.0,
            frame_epoch: Vec::new(),
            epoch: 0,
            stack_buf: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn with_optional_name(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_owned);
        self
    }

    /// Record one stack. An empty stack is an idle sample: it counts toward
    /// the total weight but not toward the non-idle weight. Zero-weight
    /// samples are accepted and dropped.
    pub fn append_sample(&mut self, stack: &[FrameInfo], weight: f64) -> Result<(), ProfileError> {
        check_weight(weight)?;
        if weight == 0.0 {
            return Ok(());
        }
        let mut ids = std::mem::take(&mut self.stack_buf);
        ids.clear();
        ids.extend(stack.iter().map(|info| self.intern(info)));
        self.push_stack(&ids, weight);
        self.stack_buf = ids;
        Ok(())
    }

    /// Like [`append_sample`](Self::append_sample), reusing frame
    /// descriptions already shared with another profile.
    pub fn append_shared_sample<'a>(
        &mut self,
        stack: impl IntoIterator<Item = &'a Arc<FrameInfo>>,
        weight: f64,
    ) -> Result<(), ProfileError> {
        check_weight(weight)?;
        if weight == 0.0 {
            return Ok(());
        }
        let mut ids = std::mem::take(&mut self.stack_buf);
        ids.clear();
        for info in stack {
            ids.push(self.intern_shared(info));
        }
        self.push_stack(&ids, weight);
        self.stack_buf = ids;
        Ok(())
    }

    fn intern(&mut self, info: &FrameInfo) -> FrameId {
        if let Some(&id) = self.frame_index.get(&info.key) {
            return id;
        }
        self.insert_frame(Arc::new(info.clone()))
    }

    pub(crate) fn intern_shared(&mut self, info: &Arc<FrameInfo>) -> FrameId {
        if let Some(&id) = self.frame_index.get(&info.key) {
            return id;
        }
        self.insert_frame(Arc::clone(info))
    }

    fn insert_frame(&mut self, info: Arc<FrameInfo>) -> FrameId {
        let id = FrameId(self.frames.len() as u32);
        self.frame_index.insert(info.key.clone(), id);
        self.frames.push(Frame::new(info));
        self.frame_epoch.push(0);
        id
    }

    /// The child of `parent` (or the root) for `frame`, created on first use.
    pub(crate) fn child(&mut self, parent: Option<NodeId>, frame: FrameId) -> NodeId {
        if let Some(&id) = self.child_index.get(&(parent, frame)) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        let depth = parent.map_or(0, |p| self.nodes[p.index()].depth + 1);
        self.nodes.push(CallTreeNode::new(frame, parent, depth));
        match parent {
            Some(p) => self.nodes[p.index()].children.push(id),
            None => self.roots.push(id),
        }
        self.child_index.insert((parent, frame), id);
        id
    }

    fn push_stack(&mut self, ids: &[FrameId], weight: f64) {
        let mut node = None;
        for &frame in ids {
            node = Some(self.child(node, frame));
        }
        self.append_at(node, weight);
    }

    /// Attribute `weight` to a leaf node (or to idle time) and propagate it
    /// to every ancestor. The weight must already be validated.
    pub(crate) fn append_at(&mut self, leaf: Option<NodeId>, weight: f64) {
        if weight == 0.0 {
            return;
        }
        self.total_weight += weight;
        self.samples.push(Sample { node: leaf, weight });
        let Some(leaf) = leaf else {
            return;
        };
        self.total_non_idle_weight += weight;
        self.epoch += 1;

        let leaf_frame = self.nodes[leaf.index()].frame;
        self.nodes[leaf.index()].self_weight += weight;
        self.frames[leaf_frame.index()].self_weight += weight;

        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = &mut self.nodes[id.index()];
            node.total_weight += weight;
            let frame = node.frame.index();
            current = node.parent;
            if self.frame_epoch[frame] != self.epoch {
                self.frame_epoch[frame] = self.epoch;
                self.frames[frame].total_weight += weight;
            }
        }
    }

    pub fn build(self) -> Profile {
        debug!(
            frames = self.frames.len(),
            nodes = self.nodes.len(),
            samples = self.samples.len(),
            total_weight = self.total_weight,
            "built profile"
        );
        Profile {
            name: self.name,
            unit: self.unit,
            frames: self.frames,
            frame_index: self.frame_index,
            nodes: self.nodes,
            roots: self.roots,
            samples: self.samples,
            total_weight: self.total_weight,
            total_non_idle_weight: self.total_non_idle_weight,
        }
    }
}

pub(crate) fn check_weight(weight: f64) -> Result<(), ProfileError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidWeight { weight })
    }
}
