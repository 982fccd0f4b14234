use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// A flame graph rectangle colored by its frame's bucket. Renderers
    /// resolve the bucket through `Color::flame_ramp` or their own palette.
    FlameBucket(u8),

    TextPrimary,
    TextSecondary,
    TextMuted,

    SelectionHighlight,
    Border,

    // Table view
    TableRowEven,
    TableRowOdd,
    TableRowSelected,
    TableHeaderBackground,
    TableBorder,
    BarFill,
}
