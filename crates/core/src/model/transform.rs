//! Derived profiles. Each transform builds a new profile that shares the
//! source's `FrameInfo`s, so frame keys (and the colors hashed from them)
//! survive the transform.

use std::iter;
use std::sync::Arc;

use tracing::debug;

use super::builder::ProfileBuilder;
use super::call_tree::NodeId;
use super::frame::{FrameId, FrameInfo, FrameKey};
use super::profile::Profile;
use crate::error::ProfileError;

impl Profile {
    /// Re-root the profile at `key`, with callers as descendants.
    ///
    /// Every outermost occurrence of the frame contributes its total weight
    /// along the path from that occurrence up to its root, so the callers
    /// of the focal frame become its children, their callers its
    /// grandchildren, and so on. Callers at the same inverted position
    /// merge by identity.
    pub fn inverted_for_callers_of(&self, key: &FrameKey) -> Result<Profile, ProfileError> {
        let focal = self.require_frame(key)?;
        let mut builder = ProfileBuilder::new(self.unit).with_optional_name(self.name());

        for occurrence in self.outermost_occurrences(focal) {
            let weight = self.node(occurrence).total_weight;
            let stack = self.ancestors(occurrence).map(|id| self.info_of(id));
            builder.append_shared_sample(stack, weight)?;
        }

        let inverted = builder.build();
        debug!(
            frame = %key,
            weight = inverted.total_non_idle_weight(),
            "inverted profile for callers"
        );
        Ok(inverted)
    }

    /// Everything called beneath the outermost occurrences of `key`, rooted
    /// at that frame.
    pub fn callees_of(&self, key: &FrameKey) -> Result<Profile, ProfileError> {
        let focal = self.require_frame(key)?;
        let mut builder = ProfileBuilder::new(self.unit).with_optional_name(self.name());
        let mut path: Vec<&Arc<FrameInfo>> = Vec::new();
        let mut pending: Vec<(NodeId, usize)> = Vec::new();

        for occurrence in self.outermost_occurrences(focal) {
            pending.push((occurrence, 0));
            while let Some((id, depth)) = pending.pop() {
                path.truncate(depth);
                path.push(self.info_of(id));
                let node = self.node(id);
                if node.self_weight > 0.0 {
                    builder.append_shared_sample(path.iter().copied(), node.self_weight)?;
                }
                pending.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
            }
        }

        let callees = builder.build();
        debug!(
            frame = %key,
            weight = callees.total_non_idle_weight(),
            "extracted callees"
        );
        Ok(callees)
    }

    /// Collapse recursion: along every stack, only the first occurrence of
    /// each frame is kept, and calls beneath a dropped occurrence attach to
    /// the nearest kept ancestor.
    ///
    /// A sample whose leaf is a dropped occurrence lands on the node that
    /// occurrence collapses into. Direct recursion (`a;a`) keeps the self
    /// weight on `a`; indirect recursion (`a;b;a`) moves it to `b`, the
    /// caller closing the cycle. Frame totals are unchanged.
    ///
    /// Samples are replayed in recording order, so the chronological view
    /// of the result stays in time order.
    pub fn with_recursion_flattened(&self) -> Profile {
        let mut builder = ProfileBuilder::new(self.unit).with_optional_name(self.name());
        let mut mapping: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut on_path = vec![false; self.frames.len()];
        let mut kept: Vec<FrameId> = Vec::new();
        // (node, kept path length at its parent, parent's node in the result)
        let mut pending: Vec<(NodeId, usize, Option<NodeId>)> =
            self.roots.iter().rev().map(|r| (*r, 0, None)).collect();

        while let Some((id, kept_len, mapped_parent)) = pending.pop() {
            while kept.len() > kept_len {
                if let Some(frame) = kept.pop() {
                    on_path[frame.index()] = false;
                }
            }
            let node = self.node(id);
            let mapped = if on_path[node.frame.index()] {
                mapped_parent
            } else {
                kept.push(node.frame);
                on_path[node.frame.index()] = true;
                let frame = builder.intern_shared(self.frame(node.frame).info());
                Some(builder.child(mapped_parent, frame))
            };
            mapping[id.index()] = mapped;
            pending.extend(node.children.iter().rev().map(|c| (*c, kept.len(), mapped)));
        }

        for sample in &self.samples {
            let leaf = sample.node.and_then(|n| mapping[n.index()]);
            builder.append_at(leaf, sample.weight);
        }

        let flattened = builder.build();
        debug!(
            nodes_before = self.nodes.len(),
            nodes_after = flattened.node_count(),
            "flattened recursion"
        );
        flattened
    }

    fn require_frame(&self, key: &FrameKey) -> Result<FrameId, ProfileError> {
        self.frame_id(key).ok_or_else(|| ProfileError::FrameNotFound {
            key: key.to_string(),
        })
    }

    fn info_of(&self, node: NodeId) -> &Arc<FrameInfo> {
        self.frame(self.node(node).frame).info()
    }

    /// `node`, then its parent, up to the root.
    fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(Some(node), |id| self.node(*id).parent)
    }

    /// Nodes for `frame` with no ancestor of the same frame, in first-seen
    /// order. Descent stops at each match so recursion is counted once.
    fn outermost_occurrences(&self, frame: FrameId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            let node = self.node(id);
            if node.frame == frame {
                found.push(id);
            } else {
                pending.extend(node.children.iter().rev());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::folded;

    /// (name, depth, total) for every grouped call.
    fn shape(p: &Profile) -> Vec<(&str, u32, f64)> {
        p.calls_grouped()
            .iter()
            .map(|c| (p.frame(c.frame).name(), c.depth, c.weight))
            .collect()
    }

    fn node_self(p: &Profile, name: &str) -> f64 {
        p.calls_grouped()
            .iter()
            .filter(|c| p.frame(c.frame).name() == name)
            .map(|c| p.node(c.node).self_weight)
            .sum()
    }

    #[test]
    fn direct_recursion_collapses() {
        let p = folded(&[("main;a;a;b", 100.0)]);
        let flat = p.with_recursion_flattened();
        assert_eq!(
            shape(&flat),
            vec![("main", 0, 100.0), ("a", 1, 100.0), ("b", 2, 100.0)]
        );
        assert_eq!(node_self(&flat, "a"), node_self(&p, "a"));
    }

    #[test]
    fn collapsed_self_weight_is_summed() {
        let p = folded(&[("main;a", 3.0), ("main;a;a", 4.0), ("main;a;a;a", 5.0)]);
        let flat = p.with_recursion_flattened();
        assert_eq!(shape(&flat), vec![("main", 0, 12.0), ("a", 1, 12.0)]);
        assert_eq!(node_self(&flat, "a"), 12.0);
    }

    #[test]
    fn indirect_recursion_keeps_first_occurrence() {
        let p = folded(&[("main;a;b;a;c", 10.0)]);
        let flat = p.with_recursion_flattened();
        assert_eq!(
            shape(&flat),
            vec![("main", 0, 10.0), ("a", 1, 10.0), ("b", 2, 10.0), ("c", 3, 10.0)]
        );
    }

    #[test]
    fn indirect_recursion_moves_leaf_self_weight_to_caller() {
        let p = folded(&[("main;a;b;a", 3.0)]);
        let weights = |p: &Profile, name: &str| {
            p.frame_by_key(&FrameKey::new(name))
                .map(|f| (f.self_weight(), f.total_weight()))
        };
        assert_eq!(weights(&p, "a"), Some((3.0, 3.0)));
        assert_eq!(weights(&p, "b"), Some((0.0, 3.0)));

        let flat = p.with_recursion_flattened();
        assert_eq!(weights(&flat, "a"), Some((0.0, 3.0)));
        assert_eq!(weights(&flat, "b"), Some((3.0, 3.0)));
        assert_eq!(node_self(&flat, "b"), 3.0);
    }

    #[test]
    fn flattening_is_idempotent() {
        let p = folded(&[
            ("main;a;b;a;b", 2.0),
            ("main;a;a", 3.0),
            ("", 1.0),
            ("main;c;main", 4.0),
        ]);
        let once = p.with_recursion_flattened();
        let twice = once.with_recursion_flattened();
        assert_eq!(shape(&once), shape(&twice));
        for frame in once.frames() {
            let other = twice.frame_by_key(frame.key()).unwrap();
            assert_eq!(frame.self_weight(), other.self_weight());
            assert_eq!(frame.total_weight(), other.total_weight());
        }
        assert_eq!(once.total_weight(), p.total_weight());
    }

    #[test]
    fn flattening_shares_frame_info() {
        let p = folded(&[("main;a;a", 1.0)]);
        let flat = p.with_recursion_flattened();
        let before = p.frame_by_key(&FrameKey::new("a")).unwrap();
        let after = flat.frame_by_key(&FrameKey::new("a")).unwrap();
        assert!(Arc::ptr_eq(before.info(), after.info()));
    }

    #[test]
    fn inverts_callers() {
        let p = folded(&[("main;a;b", 40.0), ("main;c;b", 60.0)]);
        let inv = p.inverted_for_callers_of(&FrameKey::new("b")).unwrap();
        assert_eq!(
            shape(&inv),
            vec![
                ("b", 0, 100.0),
                ("c", 1, 60.0),
                ("main", 2, 60.0),
                ("a", 1, 40.0),
                ("main", 2, 40.0),
            ]
        );
        assert_eq!(inv.roots().len(), 1);
    }

    #[test]
    fn inversion_counts_recursive_occurrence_once() {
        let p = folded(&[("main;b;x;b", 5.0), ("b", 2.0)]);
        let inv = p.inverted_for_callers_of(&FrameKey::new("b")).unwrap();
        assert_eq!(inv.total_non_idle_weight(), 7.0);
        assert_eq!(shape(&inv)[0], ("b", 0, 7.0));
    }

    #[test]
    fn inversion_merges_callers_by_identity() {
        let p = folded(&[("main;a;leaf", 1.0), ("other;a;leaf", 2.0), ("a;leaf", 3.0)]);
        let inv = p.inverted_for_callers_of(&FrameKey::new("leaf")).unwrap();
        assert_eq!(
            shape(&inv),
            vec![("leaf", 0, 6.0), ("a", 1, 6.0), ("other", 2, 2.0), ("main", 2, 1.0)]
        );
    }

    #[test]
    fn callees_of_conserves_focal_total() {
        let p = folded(&[("main;a;b", 4.0), ("main;a", 1.0), ("x;a;c", 2.0), ("main", 9.0)]);
        let callees = p.callees_of(&FrameKey::new("a")).unwrap();
        let a = p.frame_by_key(&FrameKey::new("a")).unwrap();
        assert_eq!(callees.total_non_idle_weight(), a.total_weight());
        assert_eq!(
            shape(&callees),
            vec![("a", 0, 7.0), ("b", 1, 4.0), ("c", 1, 2.0)]
        );
    }

    #[test]
    fn unknown_frame_is_an_error() {
        let p = folded(&[("main", 1.0)]);
        let err = p.inverted_for_callers_of(&FrameKey::new("nope"));
        assert_eq!(
            err.err(),
            Some(ProfileError::FrameNotFound { key: "nope".into() })
        );
        assert!(p.callees_of(&FrameKey::new("nope")).is_err());
    }

    #[test]
    fn empty_profile_transforms_to_empty() {
        let p = folded(&[]);
        let flat = p.with_recursion_flattened();
        assert!(flat.is_empty());
        assert_eq!(flat.total_non_idle_weight(), 0.0);
        assert!(flat.frames().is_empty());
    }
}
