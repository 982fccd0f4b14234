use std::sync::Arc;

use crate::color::{ColorBuckets, frame_to_color_bucket};
use crate::error::ProfileError;
use crate::flamechart::{Flamechart, FlamechartMode};
use crate::memo::MemoFn;
use crate::model::{FrameKey, Profile};
use crate::views::table::{FrameTable, SortMethod};

type Derived = Result<Arc<Profile>, ProfileError>;

fn flatten_view((profile, flatten): &(Arc<Profile>, bool)) -> Arc<Profile> {
    if *flatten {
        Arc::new(profile.with_recursion_flattened())
    } else {
        Arc::clone(profile)
    }
}

fn inverted_view((profile, key): &(Arc<Profile>, FrameKey)) -> Derived {
    profile.inverted_for_callers_of(key).map(Arc::new)
}

fn callees_view((profile, key): &(Arc<Profile>, FrameKey)) -> Derived {
    profile.callees_of(key).map(Arc::new)
}

fn buckets_view((profile,): &(Arc<Profile>,)) -> Arc<ColorBuckets> {
    Arc::new(frame_to_color_bucket(profile))
}

fn flamechart_view(
    (profile, buckets, mode): &(Arc<Profile>, Arc<ColorBuckets>, FlamechartMode),
) -> Arc<Flamechart> {
    Arc::new(Flamechart::build(profile, buckets, *mode))
}

fn table_view((profile, sort): &(Arc<Profile>, SortMethod)) -> Arc<FrameTable> {
    Arc::new(FrameTable::new(profile, *sort))
}

/// Derived views of one profile, each cached at its own site.
///
/// Every input is passed explicitly; handing in the same `Arc`s as last
/// time returns the cached result, anything else recomputes.
#[derive(Debug)]
pub struct ProfileViews {
    flattened: MemoFn<(Arc<Profile>, bool), Arc<Profile>>,
    inverted: MemoFn<(Arc<Profile>, FrameKey), Derived>,
    callees: MemoFn<(Arc<Profile>, FrameKey), Derived>,
    buckets: MemoFn<(Arc<Profile>,), Arc<ColorBuckets>>,
    flamechart: MemoFn<(Arc<Profile>, Arc<ColorBuckets>, FlamechartMode), Arc<Flamechart>>,
    table: MemoFn<(Arc<Profile>, SortMethod), Arc<FrameTable>>,
}

impl Default for ProfileViews {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileViews {
    pub fn new() -> Self {
        Self {
            flattened: MemoFn::new(flatten_view),
            inverted: MemoFn::new(inverted_view),
            callees: MemoFn::new(callees_view),
            buckets: MemoFn::new(buckets_view),
            flamechart: MemoFn::new(flamechart_view),
            table: MemoFn::new(table_view),
        }
    }

    /// `profile` with recursion flattened, or `profile` itself when
    /// `flatten` is off.
    pub fn flattened(&mut self, profile: &Arc<Profile>, flatten: bool) -> Arc<Profile> {
        Arc::clone(self.flattened.get((Arc::clone(profile), flatten)))
    }

    pub fn inverted_for_callers_of(&mut self, profile: &Arc<Profile>, key: &FrameKey) -> Derived {
        self.inverted
            .get((Arc::clone(profile), key.clone()))
            .clone()
    }

    pub fn callees_of(&mut self, profile: &Arc<Profile>, key: &FrameKey) -> Derived {
        self.callees.get((Arc::clone(profile), key.clone())).clone()
    }

    pub fn color_buckets(&mut self, profile: &Arc<Profile>) -> Arc<ColorBuckets> {
        Arc::clone(self.buckets.get((Arc::clone(profile),)))
    }

    /// Layout of `profile`, colored with its own buckets.
    pub fn flamechart(&mut self, profile: &Arc<Profile>, mode: FlamechartMode) -> Arc<Flamechart> {
        let buckets = self.color_buckets(profile);
        Arc::clone(self.flamechart.get((Arc::clone(profile), buckets, mode)))
    }

    pub fn table(&mut self, profile: &Arc<Profile>, sort: SortMethod) -> Arc<FrameTable> {
        Arc::clone(self.table.get((Arc::clone(profile), sort)))
    }

    /// Release every cached view and the profiles they keep alive.
    pub fn clear(&mut self) {
        self.flattened.clear();
        self.inverted.clear();
        self.callees.clear();
        self.buckets.clear();
        self.flamechart.clear();
        self.table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::folded;
    use crate::views::table::SortField;

    fn shared(stacks: &[(&str, f64)]) -> Arc<Profile> {
        Arc::new(folded(stacks))
    }

    #[test]
    fn same_inputs_return_same_views() {
        let mut views = ProfileViews::new();
        let p = shared(&[("main;a;a;b", 100.0)]);

        let flat = views.flattened(&p, true);
        assert!(Arc::ptr_eq(&flat, &views.flattened(&p, true)));
        assert!(Arc::ptr_eq(&p, &views.flattened(&p, false)));

        let chart = views.flamechart(&flat, FlamechartMode::LeftHeavy);
        assert!(Arc::ptr_eq(&chart, &views.flamechart(&flat, FlamechartMode::LeftHeavy)));
        assert_eq!(chart.depth(), 3);
    }

    #[test]
    fn new_profile_invalidates_downstream() {
        let mut views = ProfileViews::new();
        let first = shared(&[("main;a", 1.0)]);
        let second = shared(&[("main;a", 1.0)]);
        let a = views.flamechart(&first, FlamechartMode::LeftHeavy);
        let b = views.flamechart(&second, FlamechartMode::LeftHeavy);
        assert!(!Arc::ptr_eq(&a, &b));

        let chrono = views.flamechart(&second, FlamechartMode::Chronological);
        assert!(!Arc::ptr_eq(&b, &chrono));
    }

    #[test]
    fn selection_views_follow_key_identity() {
        let mut views = ProfileViews::new();
        let p = shared(&[("main;a;b", 40.0), ("main;c;b", 60.0)]);
        let key = FrameKey::new("b");

        let inverted = views.inverted_for_callers_of(&p, &key).unwrap();
        let again = views.inverted_for_callers_of(&p, &key).unwrap();
        assert!(Arc::ptr_eq(&inverted, &again));
        assert_eq!(inverted.total_weight(), 100.0);

        let callees = views.callees_of(&p, &key).unwrap();
        assert_eq!(callees.total_weight(), 100.0);

        let missing = views.inverted_for_callers_of(&p, &FrameKey::new("nope"));
        assert!(matches!(missing, Err(ProfileError::FrameNotFound { .. })));
    }

    #[test]
    fn table_follows_sort() {
        let mut views = ProfileViews::new();
        let p = shared(&[("main;a", 5.0), ("main;b", 20.0)]);
        let by_total = views.table(&p, SortMethod::default());
        assert!(Arc::ptr_eq(&by_total, &views.table(&p, SortMethod::default())));
        let by_self = views.table(&p, by_total.sort().toggle_field(SortField::SelfWeight));
        assert_eq!(by_self.rows()[0].name, "b");

        views.clear();
        assert!(!Arc::ptr_eq(&by_self, &views.table(&p, by_self.sort())));
    }
}
