use std::collections::HashMap;

use super::call_tree::{CallNode, CallTreeNode, NodeId, Sample};
use super::frame::{Frame, FrameId, FrameKey};
use super::unit::ValueUnit;

/// An immutable call-stack profile.
///
/// Owns the frames, the grouped call tree and the samples in recording
/// order. Built through [`ProfileBuilder`](super::ProfileBuilder); every
/// transform returns a new profile. Derivation caches key on the identity
/// of an `Arc<Profile>`, not on its contents.
#[derive(Debug, Clone)]
pub struct Profile {
    pub(crate) name: Option<String>,
    pub(crate) unit: ValueUnit,
    pub(crate) frames: Vec<Frame>,
    pub(crate) frame_index: HashMap<FrameKey, FrameId>,
    pub(crate) nodes: Vec<CallTreeNode>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) samples: Vec<Sample>,
    pub(crate) total_weight: f64,
    pub(crate) total_non_idle_weight: f64,
}

impl Profile {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn unit(&self) -> ValueUnit {
        self.unit
    }

    /// Sum of every sample weight, idle samples included.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Sum of the weights of samples with a non-empty stack. This is the
    /// denominator of every percentage.
    pub fn total_non_idle_weight(&self) -> f64 {
        self.total_non_idle_weight
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.index()]
    }

    pub fn frame_id(&self, key: &FrameKey) -> Option<FrameId> {
        self.frame_index.get(key).copied()
    }

    pub fn frame_by_key(&self, key: &FrameKey) -> Option<&Frame> {
        self.frame_id(key).map(|id| self.frame(id))
    }

    pub fn node(&self, id: NodeId) -> &CallTreeNode {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Root nodes in first-seen order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Visit every distinct frame exactly once, in first-seen order.
    pub fn for_each_frame(&self, mut visit: impl FnMut(FrameId, &Frame)) {
        for (i, frame) in self.frames.iter().enumerate() {
            visit(FrameId(i as u32), frame);
        }
    }

    /// Visit the grouped call tree in pre-order.
    ///
    /// Siblings are visited heaviest first; equal weights keep first-seen
    /// order. A child starts where its parent starts plus the weight of the
    /// siblings before it, so roots tile `[0, total_non_idle_weight)`.
    pub fn for_each_call_grouped(&self, mut visit: impl FnMut(CallNode)) {
        let mut stack: Vec<(NodeId, f64)> = Vec::new();
        self.push_heaviest_first(&self.roots, 0.0, &mut stack);

        while let Some((id, start)) = stack.pop() {
            let node = self.node(id);
            visit(CallNode {
                frame: node.frame,
                node: id,
                start,
                weight: node.total_weight,
                depth: node.depth,
            });
            self.push_heaviest_first(&node.children, start, &mut stack);
        }
    }

    /// Push `ids` so that popping yields them heaviest first.
    fn push_heaviest_first(&self, ids: &[NodeId], start: f64, stack: &mut Vec<(NodeId, f64)>) {
        let mut sorted = ids.to_vec();
        sorted.sort_by(|a, b| {
            self.node(*b)
                .total_weight
                .total_cmp(&self.node(*a).total_weight)
        });
        let mut offsets = Vec::with_capacity(sorted.len());
        let mut offset = start;
        for id in &sorted {
            offsets.push((*id, offset));
            offset += self.node(*id).total_weight;
        }
        stack.extend(offsets.into_iter().rev());
    }

    /// Grouped calls collected into a vector, in visiting order.
    pub fn calls_grouped(&self) -> Vec<CallNode> {
        let mut calls = Vec::with_capacity(self.nodes.len());
        self.for_each_call_grouped(|call| calls.push(call));
        calls
    }

    /// Visit calls in recording order, in pre-order.
    ///
    /// Consecutive samples sharing a stack prefix extend the same calls
    /// instead of opening new ones. Starts are cumulative sample weights,
    /// so idle samples leave gaps.
    pub fn for_each_call(&self, mut visit: impl FnMut(CallNode)) {
        for call in self.calls_chronological() {
            visit(call);
        }
    }

    /// Chronological calls collected into a vector, in visiting order.
    pub fn calls_chronological(&self) -> Vec<CallNode> {
        let mut calls: Vec<CallNode> = Vec::new();
        // Node and index into `calls` for every open call, outermost first.
        let mut open: Vec<(NodeId, usize)> = Vec::new();
        let mut path: Vec<NodeId> = Vec::new();
        let mut now = 0.0;

        for sample in &self.samples {
            path.clear();
            let mut current = sample.node;
            while let Some(id) = current {
                path.push(id);
                current = self.node(id).parent;
            }
            path.reverse();

            let shared = open
                .iter()
                .zip(&path)
                .take_while(|((open_id, _), id)| open_id == *id)
                .count();
            for (_, index) in open.drain(shared..) {
                calls[index].weight = now - calls[index].start;
            }
            for &id in &path[shared..] {
                let node = self.node(id);
                open.push((id, calls.len()));
                calls.push(CallNode {
                    frame: node.frame,
                    node: id,
                    start: now,
                    weight: 0.0,
                    depth: node.depth,
                });
            }
            now += sample.weight;
        }
        for (_, index) in open.drain(..) {
            calls[index].weight = now - calls[index].start;
        }
        calls
    }

    /// Stack of frames from the root down to `node`, inclusive.
    pub fn stack_of(&self, node: NodeId) -> Vec<FrameId> {
        let mut stack = Vec::with_capacity(self.node(node).depth as usize + 1);
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            stack.push(n.frame);
            current = n.parent;
        }
        stack.reverse();
        stack
    }

    /// Format a weight in the profile's unit.
    pub fn format_value(&self, weight: f64) -> String {
        self.unit.format_value(weight)
    }

    /// `weight` as a percentage of the non-idle weight; 0 for an empty
    /// profile.
    pub fn percent_of_total(&self, weight: f64) -> f64 {
        if self.total_non_idle_weight > 0.0 {
            100.0 * weight / self.total_non_idle_weight
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::folded as profile;

    fn names<'a>(p: &'a Profile, calls: &[CallNode]) -> Vec<(&'a str, u32, f64, f64)> {
        calls
            .iter()
            .map(|c| (p.frame(c.frame).name(), c.depth, c.start, c.weight))
            .collect()
    }

    #[test]
    fn grouped_is_heaviest_first_preorder() {
        let p = profile(&[
            ("main;light", 10.0),
            ("main;heavy;leaf", 30.0),
            ("other", 5.0),
        ]);
        let calls = names(&p, &p.calls_grouped());
        assert_eq!(
            calls,
            vec![
                ("main", 0, 0.0, 40.0),
                ("heavy", 1, 0.0, 30.0),
                ("leaf", 2, 0.0, 30.0),
                ("light", 1, 30.0, 10.0),
                ("other", 0, 40.0, 5.0),
            ]
        );
    }

    #[test]
    fn grouped_ties_keep_first_seen_order() {
        let p = profile(&[("main;b", 5.0), ("main;a", 5.0)]);
        let calls = names(&p, &p.calls_grouped());
        assert_eq!(calls[1].0, "b");
        assert_eq!(calls[2].0, "a");
    }

    #[test]
    fn roots_sum_to_non_idle_weight() {
        let p = profile(&[("a", 1.0), ("b;c", 2.5), ("", 4.0), ("a;d", 3.0)]);
        let root_sum: f64 = p
            .calls_grouped()
            .iter()
            .filter(|c| c.depth == 0)
            .map(|c| c.weight)
            .sum();
        assert!((root_sum - p.total_non_idle_weight()).abs() < f64::EPSILON);
        assert!((p.total_weight() - 10.5).abs() < f64::EPSILON);
    }

    #[test]
    fn chronological_merges_consecutive_prefixes() {
        let p = profile(&[
            ("main;a", 1.0),
            ("main;a", 1.0),
            ("main;b", 1.0),
            ("", 1.0),
            ("main;a", 1.0),
        ]);
        let calls = names(&p, &p.calls_chronological());
        assert_eq!(
            calls,
            vec![
                ("main", 0, 0.0, 3.0),
                ("a", 1, 0.0, 2.0),
                ("b", 1, 2.0, 1.0),
                ("main", 0, 4.0, 1.0),
                ("a", 1, 4.0, 1.0),
            ]
        );
    }

    #[test]
    fn self_never_exceeds_total() {
        let p = profile(&[
            ("main;a;b;a", 3.0),
            ("main;a", 2.0),
            ("main", 1.0),
        ]);
        p.for_each_frame(|_, f| assert!(f.self_weight() <= f.total_weight()));
        let a = p.frame_by_key(&FrameKey::new("a")).unwrap();
        assert_eq!(a.total_weight(), 5.0);
        assert_eq!(a.self_weight(), 5.0);
    }

    #[test]
    fn empty_profile_is_degenerate_not_an_error() {
        let p = profile(&[]);
        assert_eq!(p.total_non_idle_weight(), 0.0);
        assert!(p.calls_grouped().is_empty());
        assert!(p.calls_chronological().is_empty());
        assert_eq!(p.percent_of_total(10.0), 0.0);
    }

    #[test]
    fn stack_of_lists_root_first() {
        let p = profile(&[("main;a;b", 1.0)]);
        let leaf = p.samples()[0].node.unwrap();
        let stack: Vec<_> = p.stack_of(leaf).iter().map(|f| p.frame(*f).name().to_owned()).collect();
        assert_eq!(stack, vec!["main", "a", "b"]);
    }
}
