use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable identity of one code location.
///
/// Wraps `Arc<str>` so that keys are cheap to clone into lookup maps and
/// cache inputs. Two keys are equal when their text is equal; the pointer
/// comparison is only a fast path. Memoization compares keys by pointer
/// (see [`crate::memo::ShallowEq`]), so a key cloned from a frame hits the
/// cache while a freshly built key with the same text does not.
#[derive(Debug, Clone, Eq)]
pub struct FrameKey(Arc<str>);

impl FrameKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether both keys share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for FrameKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl PartialEq<&str> for FrameKey {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl std::hash::Hash for FrameKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

impl std::borrow::Borrow<str> for FrameKey {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FrameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for FrameKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for FrameKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FrameKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

/// Descriptive data for a code location. Never mutated after creation and
/// shared between every profile derived from the one that interned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub key: FrameKey,
    /// Display name (function, method, component).
    pub name: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

impl FrameInfo {
    /// A frame identified by its name alone.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: FrameKey::new(&name),
            name,
            file: None,
            line: None,
            col: None,
        }
    }

    /// A frame at a source location. The key combines name, file and line
    /// so that same-named functions in different files stay distinct.
    pub fn at(name: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        let name = name.into();
        let file = file.into();
        Self {
            key: FrameKey::new(format!("{name}\t{file}:{line}")),
            name,
            file: Some(file),
            line: Some(line),
            col: None,
        }
    }
}

/// Index of a frame within its owning profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(pub u32);

impl FrameId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A code location plus the weight a profile attributes to it.
#[derive(Debug, Clone)]
pub struct Frame {
    info: Arc<FrameInfo>,
    pub(crate) self_weight: f64,
    pub(crate) total_weight: f64,
}

impl Frame {
    pub(crate) fn new(info: Arc<FrameInfo>) -> Self {
        Self {
            info,
            self_weight: 0.0,
            total_weight: 0.0,
        }
    }

    pub fn info(&self) -> &Arc<FrameInfo> {
        &self.info
    }

    pub fn key(&self) -> &FrameKey {
        &self.info.key
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn file(&self) -> Option<&str> {
        self.info.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.info.line
    }

    /// Weight of samples whose leaf is this frame.
    pub fn self_weight(&self) -> f64 {
        self.self_weight
    }

    /// Weight of samples this frame appears in, counted once per sample
    /// even when the stack recurses through it.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}
