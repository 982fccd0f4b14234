//! Single-slot memoization keyed by shallow (identity) equality.
//!
//! A derived view is recomputed only when one of its inputs is a different
//! object than last time. Two structurally equal but separately built
//! inputs count as different on purpose: re-running a transform yields a
//! new `Arc<Profile>`, and everything derived from it must follow.
//!
//! The derivation must be a pure function of its input. Nothing detects a
//! violation; an impure function silently returns stale results.

use std::rc::Rc;
use std::sync::Arc;

use tracing::trace;

use crate::model::FrameKey;

/// Field-by-field identity comparison.
///
/// Shared pointers compare by address, plain values by value.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

impl<T: ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for Rc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for &T {
    fn shallow_eq(&self, other: &Self) -> bool {
        std::ptr::eq(*self, *other)
    }
}

impl ShallowEq for FrameKey {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl ShallowEq for f64 {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Implement [`ShallowEq`] as `==` for `Copy` value types.
#[macro_export]
macro_rules! shallow_eq_by_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::memo::ShallowEq for $t {
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

shallow_eq_by_value!((), bool, char, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

macro_rules! shallow_eq_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: ShallowEq),+> ShallowEq for ($($name,)+) {
            fn shallow_eq(&self, other: &Self) -> bool {
                $(self.$idx.shallow_eq(&other.$idx))&&+
            }
        }
    };
}

shallow_eq_tuple!(A 0);
shallow_eq_tuple!(A 0, B 1);
shallow_eq_tuple!(A 0, B 1, C 2);
shallow_eq_tuple!(A 0, B 1, C 2, D 3);

/// Caches the most recent `(input, result)` pair of a pure derivation.
pub struct Memo<I, R, F> {
    derive: F,
    last: Option<(I, R)>,
}

/// A memo over a plain function pointer, convenient as a struct field.
pub type MemoFn<I, R> = Memo<I, R, fn(&I) -> R>;

impl<I, R, F> Memo<I, R, F>
where
    I: ShallowEq,
    F: FnMut(&I) -> R,
{
    pub fn new(derive: F) -> Self {
        Self { derive, last: None }
    }

    /// The result for `input`, recomputed only when `input` is not
    /// shallow-equal to the previous call's input.
    pub fn get(&mut self, input: I) -> &R {
        let slot = match self.last.take() {
            Some((prev, result)) if prev.shallow_eq(&input) => {
                trace!("memo hit");
                (prev, result)
            }
            _ => {
                trace!("memo miss");
                let result = (self.derive)(&input);
                (input, result)
            }
        };
        &self.last.insert(slot).1
    }

    pub fn has_value(&self) -> bool {
        self.last.is_some()
    }

    /// Drop the cached pair, releasing whatever the input kept alive.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Wrap `derive` in a single-slot [`Memo`].
pub fn memoize<I: ShallowEq, R, F: FnMut(&I) -> R>(derive: F) -> Memo<I, R, F> {
    Memo::new(derive)
}

impl<I, R, F> std::fmt::Debug for Memo<I, R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("cached", &self.last.is_some())
            .finish()
    }
}
