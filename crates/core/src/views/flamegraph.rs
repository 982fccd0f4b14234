use stacklens_protocol::{Point, Rect, RenderCommand, ThemeToken, Viewport};

use crate::config::FlamegraphConfig;
use crate::flamechart::{Flamechart, FlamechartRect};
use crate::model::{FrameKey, Profile};

/// Height of the whole chart in logical pixels.
pub fn chart_height(chart: &Flamechart, config: &FlamegraphConfig) -> f64 {
    f64::from(chart.depth()) * config.frame_height
}

/// Emit draw commands for the rectangles of `chart` that fall inside the
/// viewport. The chart's total weight spans the viewport width.
///
/// `profile` must be the profile `chart` was built from; rectangles refer to
/// its frames by index.
pub fn render_flamechart(
    chart: &Flamechart,
    viewport: &Viewport,
    selected: Option<&FrameKey>,
    profile: &Profile,
    config: &FlamegraphConfig,
) -> Vec<RenderCommand> {
    if chart.depth() == 0 || chart.total_weight() <= 0.0 {
        return Vec::new();
    }
    let x_scale = viewport.width / chart.total_weight();

    let mut commands = Vec::new();
    commands.push(RenderCommand::BeginGroup {
        id: "flamegraph".to_string(),
        label: Some("Flame Graph".to_string()),
    });

    for (depth, layer) in chart.layers().iter().enumerate() {
        let y = depth as f64 * config.frame_height;
        if !viewport.overlaps_rows(y, config.frame_height) {
            continue;
        }
        for rect in layer {
            let w = rect.width() * x_scale;
            if w < config.min_rect_width {
                continue;
            }
            let frame = profile.frame(rect.frame);
            let color = if selected.is_some_and(|key| key == frame.key()) {
                ThemeToken::SelectionHighlight
            } else {
                ThemeToken::FlameBucket(rect.color_bucket.0)
            };
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(rect.start * x_scale, y, w, config.frame_height - 1.0),
                color,
                border_color: Some(ThemeToken::Border),
                label: (w >= config.label_min_width).then(|| frame.name().to_owned()),
                frame_id: Some(rect.frame.0),
            });
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

/// The rectangle under `point`, in the same coordinates
/// [`render_flamechart`] draws in.
pub fn hit_test<'a>(
    chart: &'a Flamechart,
    viewport: &Viewport,
    point: Point,
    config: &FlamegraphConfig,
) -> Option<&'a FlamechartRect> {
    let bounds = Rect::new(0.0, 0.0, viewport.width, chart_height(chart, config));
    if !bounds.contains(point) {
        return None;
    }
    let depth = (point.y / config.frame_height).floor() as u32;
    let offset = point.x / viewport.width * chart.total_weight();
    chart.rect_at(depth, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::frame_to_color_bucket;
    use crate::flamechart::FlamechartMode;
    use crate::model::folded;

    fn draw_rects(cmds: &[RenderCommand]) -> Vec<(&Rect, &ThemeToken, Option<&str>)> {
        cmds.iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect, color, label, ..
                } => Some((rect, color, label.as_deref())),
                _ => None,
            })
            .collect()
    }

    fn setup(stacks: &[(&str, f64)]) -> (Profile, Flamechart) {
        let p = folded(stacks);
        let c = Flamechart::build(&p, &frame_to_color_bucket(&p), FlamechartMode::LeftHeavy);
        (p, c)
    }

    #[test]
    fn merged_stacks_draw_one_rect_per_node() {
        let (p, c) = setup(&[("main;a", 50.0), ("main;a", 50.0)]);
        let vp = Viewport::new(800.0, 600.0);
        let cmds = render_flamechart(&c, &vp, None, &p, &FlamegraphConfig::default());
        let rects = draw_rects(&cmds);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].0.w, 800.0);
        assert_eq!(rects[1].0.y, 20.0);
        assert!(matches!(cmds.first(), Some(RenderCommand::BeginGroup { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));
    }

    #[test]
    fn narrow_rects_are_culled_and_unlabeled() {
        let (p, c) = setup(&[("main;big", 999.0), ("main;tiny", 0.1), ("main;mid", 30.0)]);
        let vp = Viewport::new(1000.0, 600.0);
        let cmds = render_flamechart(&c, &vp, None, &p, &FlamegraphConfig::default());
        let rects = draw_rects(&cmds);
        assert_eq!(rects.len(), 3);
        let mid = rects.iter().find(|r| r.0.w < 100.0).unwrap();
        assert_eq!(mid.2, None);
        assert_eq!(rects[1].2, Some("big"));
    }

    #[test]
    fn rows_outside_viewport_are_skipped() {
        let (p, c) = setup(&[("a;b;c;d", 1.0)]);
        let mut vp = Viewport::new(400.0, 30.0);
        vp.y = 45.0;
        let cmds = render_flamechart(&c, &vp, None, &p, &FlamegraphConfig::default());
        let ys: Vec<_> = draw_rects(&cmds).iter().map(|r| r.0.y).collect();
        assert_eq!(ys, vec![40.0, 60.0]);
    }

    #[test]
    fn selected_frame_uses_highlight() {
        let (p, c) = setup(&[("main;a", 1.0), ("main;b", 1.0)]);
        let vp = Viewport::new(400.0, 300.0);
        let key = FrameKey::new("b");
        let cmds = render_flamechart(&c, &vp, Some(&key), &p, &FlamegraphConfig::default());
        let highlighted: Vec<_> = draw_rects(&cmds)
            .into_iter()
            .filter(|r| *r.1 == ThemeToken::SelectionHighlight)
            .collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].2, Some("b"));
    }

    #[test]
    fn hit_test_maps_pixels_to_rects() {
        let (p, c) = setup(&[("main;a", 3.0), ("main;b", 1.0)]);
        let vp = Viewport::new(400.0, 300.0);
        let config = FlamegraphConfig::default();
        let hit = hit_test(&c, &vp, Point::new(350.0, 25.0), &config).unwrap();
        assert_eq!(p.frame(hit.frame).name(), "b");
        let hit = hit_test(&c, &vp, Point::new(10.0, 5.0), &config).unwrap();
        assert_eq!(p.frame(hit.frame).name(), "main");
        assert!(hit_test(&c, &vp, Point::new(10.0, 45.0), &config).is_none());
        assert!(hit_test(&c, &vp, Point::new(-1.0, 5.0), &config).is_none());
        assert!(hit_test(&c, &vp, Point::new(400.0, 5.0), &config).is_none());
        assert!(hit_test(&c, &Viewport::new(0.0, 300.0), Point::new(0.0, 5.0), &config).is_none());
        assert_eq!(chart_height(&c, &config), 40.0);
    }

    #[test]
    fn empty_chart_draws_nothing() {
        let (p, c) = setup(&[]);
        let vp = Viewport::new(400.0, 300.0);
        assert!(render_flamechart(&c, &vp, None, &p, &FlamegraphConfig::default()).is_empty());
    }
}
