use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring rectangle.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// The visible region of a view, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Whether a vertical band `[y, y + h)` overlaps the viewport.
    pub fn overlaps_rows(&self, y: f64, h: f64) -> bool {
        y + h >= self.y && y <= self.y + self.height
    }
}

/// Linear RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from luma, chroma and hue (degrees).
    ///
    /// Luma uses Rec. 601 weights, so colors along a hue sweep keep a
    /// similar perceived brightness.
    pub fn from_luma_chroma_hue(luma: f64, chroma: f64, hue: f64) -> Self {
        let h_prime = hue.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - ((h_prime % 2.0) - 1.0).abs());
        let (r1, g1, b1) = match h_prime {
            h if h < 1.0 => (chroma, x, 0.0),
            h if h < 2.0 => (x, chroma, 0.0),
            h if h < 3.0 => (0.0, chroma, x),
            h if h < 4.0 => (0.0, x, chroma),
            h if h < 5.0 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = luma - (0.3 * r1 + 0.59 * g1 + 0.11 * b1);
        Self {
            r: (r1 + m).clamp(0.0, 1.0) as f32,
            g: (g1 + m).clamp(0.0, 1.0) as f32,
            b: (b1 + m).clamp(0.0, 1.0) as f32,
            a: 1.0,
        }
    }

    /// Flame graph hue ramp. `t` in `[0, 1)` sweeps most of the hue circle
    /// while a fast triangle wave varies luma and chroma so neighbouring
    /// values stay distinguishable.
    pub fn flame_ramp(t: f64) -> Self {
        let x = triangle(30.0 * t);
        let hue = 360.0 * (0.9 * t);
        let chroma = 0.25 + 0.2 * x;
        let luma = 0.8 - 0.15 * x;
        Self::from_luma_chroma_hue(luma, chroma, hue)
    }

    /// CSS `rgba(...)` notation.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            (255.0 * self.r).round() as u8,
            (255.0 * self.g).round() as u8,
            (255.0 * self.b).round() as u8,
            self.a
        )
    }
}

fn triangle(x: f64) -> f64 {
    2.0 * (x.fract().abs() - 0.5).abs() - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(r.contains(Point::new(10.0, 0.0)));
        assert!(r.contains(Point::new(29.9, 9.9)));
        assert!(!r.contains(Point::new(30.0, 5.0)));
        assert!(!r.contains(Point::new(15.0, 10.0)));
    }

    #[test]
    fn gray_when_chroma_is_zero() {
        let c = Color::from_luma_chroma_hue(0.5, 0.0, 123.0);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.g - 0.5).abs() < 1e-6);
        assert!((c.b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ramp_stays_in_gamut() {
        for i in 0..255 {
            let c = Color::flame_ramp(f64::from(i) / 255.0);
            for v in [c.r, c.g, c.b] {
                assert!((0.0..=1.0).contains(&v));
            }
            assert_eq!(c.a, 1.0);
        }
    }

    #[test]
    fn ramp_varies_across_buckets() {
        assert_ne!(Color::flame_ramp(0.1), Color::flame_ramp(0.6));
    }

    #[test]
    fn css_notation() {
        assert_eq!(Color::rgba(1.0, 0.0, 0.5, 1.0).to_css(), "rgba(255, 0, 128, 1.00)");
    }

    #[test]
    fn viewport_row_overlap() {
        let vp = Viewport::new(800.0, 100.0);
        assert!(vp.overlaps_rows(90.0, 20.0));
        assert!(!vp.overlaps_rows(120.0, 20.0));
    }
}
