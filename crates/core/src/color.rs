//! Stable per-frame color buckets.
//!
//! A frame's bucket is a hash of its key, so the same function gets the
//! same color in every view and in every profile derived from the one it
//! came from, whatever other frames are present.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stacklens_protocol::Color;
use xxhash_rust::xxh3::xxh3_64;

use crate::model::{Frame, FrameKey, Profile};

/// Number of regular buckets. Bucket `BUCKET_COUNT` itself is reserved for
/// the selection highlight.
pub const BUCKET_COUNT: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ColorBucket(pub u8);

impl ColorBucket {
    pub const SELECTED: ColorBucket = ColorBucket(BUCKET_COUNT);

    pub fn for_key(key: &FrameKey) -> Self {
        Self((xxh3_64(key.as_str().as_bytes()) % u64::from(BUCKET_COUNT)) as u8)
    }

    pub fn is_selected(self) -> bool {
        self == Self::SELECTED
    }

    /// Position of the bucket on the color ramp, in `[0, 1)`.
    pub fn ramp_position(self) -> f64 {
        f64::from(self.0) / f64::from(BUCKET_COUNT)
    }

    pub fn color(self) -> Color {
        if self.is_selected() {
            selection_color()
        } else {
            Color::flame_ramp(self.ramp_position())
        }
    }
}

fn selection_color() -> Color {
    Color::rgba(0.26, 0.53, 0.96, 1.0)
}

/// Bucket assignment for every frame of one profile.
#[derive(Debug, Clone, Default)]
pub struct ColorBuckets {
    buckets: HashMap<FrameKey, ColorBucket>,
}

impl ColorBuckets {
    pub fn get(&self, key: &FrameKey) -> Option<ColorBucket> {
        self.buckets.get(key).copied()
    }

    /// Bucket for `frame`, or bucket 0 for a frame from another profile.
    pub fn bucket_for_frame(&self, frame: &Frame) -> ColorBucket {
        self.get(frame.key()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

pub fn frame_to_color_bucket(profile: &Profile) -> ColorBuckets {
    let mut buckets = HashMap::with_capacity(profile.frames().len());
    profile.for_each_frame(|_, frame| {
        buckets.insert(frame.key().clone(), ColorBucket::for_key(frame.key()));
    });
    ColorBuckets { buckets }
}

pub fn color_bucket_getter(buckets: &ColorBuckets) -> impl Fn(&Frame) -> ColorBucket + '_ {
    move |frame| buckets.bucket_for_frame(frame)
}

/// CSS color per frame. The frame whose key is `selected` gets the
/// reserved selection color.
pub fn css_color_getter<'a>(
    buckets: &'a ColorBuckets,
    selected: Option<&'a FrameKey>,
) -> impl Fn(&Frame) -> String + 'a {
    move |frame| {
        let bucket = if selected.is_some_and(|key| key == frame.key()) {
            ColorBucket::SELECTED
        } else {
            buckets.bucket_for_frame(frame)
        };
        bucket.color().to_css()
    }
}
