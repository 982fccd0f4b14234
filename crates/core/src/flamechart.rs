//! Flame graph layout: depth-indexed layers of rectangles on the weight
//! axis, built in one pass over a call enumeration.

use serde::{Deserialize, Serialize};

use crate::color::{ColorBucket, ColorBuckets};
use crate::model::{CallNode, FrameId, NodeId, Profile, ValueUnit};

/// Which enumeration a flamechart is laid out from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlamechartMode {
    /// Grouped call tree, heaviest siblings first.
    #[default]
    LeftHeavy,
    /// Calls in recording order.
    Chronological,
}

crate::shallow_eq_by_value!(FlamechartMode);

/// What a flamechart needs from a profile.
pub trait FlamechartSource {
    /// Width of the whole chart on the weight axis.
    fn total_weight(&self) -> f64;
    /// Calls in pre-order, parents before children.
    fn for_each_call(&self, visit: &mut dyn FnMut(CallNode));
    fn unit(&self) -> ValueUnit;
    fn color_bucket(&self, frame: FrameId) -> ColorBucket;

    fn format_value(&self, weight: f64) -> String {
        self.unit().format_value(weight)
    }
}

/// Left-heavy source over the grouped call tree.
#[derive(Debug, Clone, Copy)]
pub struct GroupedSource<'a> {
    pub profile: &'a Profile,
    pub buckets: &'a ColorBuckets,
}

impl FlamechartSource for GroupedSource<'_> {
    fn total_weight(&self) -> f64 {
        self.profile.total_non_idle_weight()
    }

    fn for_each_call(&self, visit: &mut dyn FnMut(CallNode)) {
        self.profile.for_each_call_grouped(visit);
    }

    fn unit(&self) -> ValueUnit {
        self.profile.unit()
    }

    fn color_bucket(&self, frame: FrameId) -> ColorBucket {
        self.buckets.bucket_for_frame(self.profile.frame(frame))
    }
}

/// Time-ordered source. Idle time takes horizontal space, so the chart
/// spans the total weight rather than the non-idle weight.
#[derive(Debug, Clone, Copy)]
pub struct ChronologicalSource<'a> {
    pub profile: &'a Profile,
    pub buckets: &'a ColorBuckets,
}

impl FlamechartSource for ChronologicalSource<'_> {
    fn total_weight(&self) -> f64 {
        self.profile.total_weight()
    }

    fn for_each_call(&self, visit: &mut dyn FnMut(CallNode)) {
        self.profile.for_each_call(visit);
    }

    fn unit(&self) -> ValueUnit {
        self.profile.unit()
    }

    fn color_bucket(&self, frame: FrameId) -> ColorBucket {
        self.buckets.bucket_for_frame(self.profile.frame(frame))
    }
}

/// Position of a rectangle: its layer and its index within the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RectId {
    pub depth: u32,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlamechartRect {
    pub frame: FrameId,
    pub node: NodeId,
    pub depth: u32,
    /// Start on the weight axis.
    pub start: f64,
    pub end: f64,
    pub color_bucket: ColorBucket,
    pub parent: Option<RectId>,
}

impl FlamechartRect {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Immutable flame graph layout. Build a new one for any change of
/// profile or mode.
#[derive(Debug, Clone)]
pub struct Flamechart {
    layers: Vec<Vec<FlamechartRect>>,
    total_weight: f64,
    min_frame_width: f64,
    unit: ValueUnit,
}

impl Flamechart {
    pub fn new(source: &impl FlamechartSource) -> Self {
        let mut layers: Vec<Vec<FlamechartRect>> = Vec::new();
        // Rect opened at each depth along the current path; `None` for a
        // dropped zero-width call.
        let mut open: Vec<Option<RectId>> = Vec::new();
        let mut min_frame_width = f64::INFINITY;

        source.for_each_call(&mut |call: CallNode| {
            let depth = call.depth as usize;
            open.resize(depth, None);
            if call.weight <= 0.0 {
                open.push(None);
                return;
            }
            let parent = depth
                .checked_sub(1)
                .and_then(|d| open.get(d).copied().flatten());
            if layers.len() <= depth {
                layers.resize_with(depth + 1, Vec::new);
            }
            let layer = &mut layers[depth];
            let id = RectId {
                depth: call.depth,
                index: layer.len() as u32,
            };
            layer.push(FlamechartRect {
                frame: call.frame,
                node: call.node,
                depth: call.depth,
                start: call.start,
                end: call.end(),
                color_bucket: source.color_bucket(call.frame),
                parent,
            });
            open.push(Some(id));
            min_frame_width = min_frame_width.min(call.weight);
        });

        Self {
            layers,
            total_weight: source.total_weight(),
            min_frame_width: if min_frame_width.is_finite() {
                min_frame_width
            } else {
                1.0
            },
            unit: source.unit(),
        }
    }

    /// Layout of `profile` in `mode`.
    pub fn build(profile: &Profile, buckets: &ColorBuckets, mode: FlamechartMode) -> Self {
        match mode {
            FlamechartMode::LeftHeavy => Self::new(&GroupedSource { profile, buckets }),
            FlamechartMode::Chronological => Self::new(&ChronologicalSource { profile, buckets }),
        }
    }

    pub fn layers(&self) -> &[Vec<FlamechartRect>] {
        &self.layers
    }

    pub fn layer(&self, depth: u32) -> &[FlamechartRect] {
        self.layers
            .get(depth as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of layers, for sizing the canvas.
    pub fn depth(&self) -> u32 {
        self.layers.len() as u32
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn min_frame_width(&self) -> f64 {
        self.min_frame_width
    }

    pub fn rect(&self, id: RectId) -> Option<&FlamechartRect> {
        self.layers.get(id.depth as usize)?.get(id.index as usize)
    }

    pub fn rects(&self) -> impl Iterator<Item = &FlamechartRect> {
        self.layers.iter().flatten()
    }

    /// The rectangle covering `offset` on the weight axis at `depth`.
    /// Rectangles are half-open, `[start, end)`.
    pub fn rect_at(&self, depth: u32, offset: f64) -> Option<&FlamechartRect> {
        let layer = self.layer(depth);
        let i = layer.partition_point(|r| r.end <= offset);
        layer.get(i).filter(|r| r.start <= offset)
    }

    /// `(x, width)` of a rectangle as fractions of the chart width.
    pub fn normalized(&self, rect: &FlamechartRect) -> (f64, f64) {
        if self.total_weight > 0.0 {
            (
                rect.start / self.total_weight,
                rect.width() / self.total_weight,
            )
        } else {
            (0.0, 0.0)
        }
    }

    pub fn format_value(&self, weight: f64) -> String {
        self.unit.format_value(weight)
    }
}
