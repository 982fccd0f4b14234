use serde::{Deserialize, Serialize};
use stacklens_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::config::TableConfig;
use crate::model::{FrameId, FrameKey, Profile};

/// Column the frame table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    SymbolName,
    SelfWeight,
    TotalWeight,
}

impl SortField {
    /// Direction used when the user first picks this column.
    pub fn default_direction(self) -> SortDirection {
        match self {
            Self::SymbolName => SortDirection::Ascending,
            Self::SelfWeight | Self::TotalWeight => SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortMethod {
    pub field: SortField,
    pub direction: SortDirection,
}

crate::shallow_eq_by_value!(SortMethod);

impl Default for SortMethod {
    fn default() -> Self {
        Self::new(SortField::TotalWeight, SortDirection::Descending)
    }
}

impl SortMethod {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Clicking the active column flips its direction; another column
    /// starts in its default direction.
    pub fn toggle_field(self, field: SortField) -> Self {
        if field == self.field {
            Self::new(field, self.direction.toggled())
        } else {
            Self::new(field, field.default_direction())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub frame: FrameId,
    pub key: FrameKey,
    pub name: String,
    pub self_weight: f64,
    pub total_weight: f64,
    pub self_percent: f64,
    pub total_percent: f64,
}

/// One row per frame, sorted.
///
/// Rows are sorted ascending (stable, so ties keep frame order) and then
/// reversed for descending order. Toggling the direction therefore
/// reverses the list exactly.
pub fn sorted_rows(profile: &Profile, sort: SortMethod) -> Vec<TableRow> {
    let mut rows = Vec::with_capacity(profile.frames().len());
    profile.for_each_frame(|id, frame| {
        rows.push(TableRow {
            frame: id,
            key: frame.key().clone(),
            name: frame.name().to_owned(),
            self_weight: frame.self_weight(),
            total_weight: frame.total_weight(),
            self_percent: profile.percent_of_total(frame.self_weight()),
            total_percent: profile.percent_of_total(frame.total_weight()),
        });
    });

    match sort.field {
        SortField::SymbolName => {
            rows.sort_by_cached_key(|r| r.name.to_lowercase());
        }
        SortField::SelfWeight => rows.sort_by(|a, b| a.self_weight.total_cmp(&b.self_weight)),
        SortField::TotalWeight => rows.sort_by(|a, b| a.total_weight.total_cmp(&b.total_weight)),
    }

    if sort.direction == SortDirection::Descending {
        rows.reverse();
    }
    rows
}

/// Sorted rows for the aggregate table, handed out by index range to a
/// list-virtualization collaborator.
#[derive(Debug, Clone)]
pub struct FrameTable {
    rows: Vec<TableRow>,
    sort: SortMethod,
}

impl FrameTable {
    pub fn new(profile: &Profile, sort: SortMethod) -> Self {
        Self {
            rows: sorted_rows(profile, sort),
            sort,
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn sort(&self) -> SortMethod {
        self.sort
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows `first..=last`, clamped to the table.
    pub fn render_items(&self, first: usize, last: usize) -> &[TableRow] {
        if first > last || first >= self.rows.len() {
            return &[];
        }
        let last = last.min(self.rows.len() - 1);
        &self.rows[first..=last]
    }

    pub fn index_of(&self, key: &FrameKey) -> Option<usize> {
        self.rows.iter().position(|r| &r.key == key)
    }
}

/// Emit the header and rows `first..=last` of the table. `profile` must be
/// the one `table` was built from.
pub fn render_table(
    table: &FrameTable,
    profile: &Profile,
    viewport: &Viewport,
    range: (usize, usize),
    selected: Option<&FrameKey>,
    config: &TableConfig,
) -> Vec<RenderCommand> {
    let (first, last) = range;
    let rows = table.render_items(first, last);
    let mut commands = Vec::with_capacity(rows.len() * 6 + 8);
    commands.push(RenderCommand::BeginGroup {
        id: "frame-table".into(),
        label: Some("Frame Table".into()),
    });

    // Column layout: Total | Self | Symbol Name
    let col_total_x = 0.0;
    let col_self_x = viewport.width * 0.18;
    let col_name_x = viewport.width * 0.36;
    let bar_max_w = viewport.width * 0.16;

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, viewport.width, config.header_height),
        color: ThemeToken::TableHeaderBackground,
        border_color: Some(ThemeToken::TableBorder),
        label: None,
        frame_id: None,
    });

    let header_y = config.header_height / 2.0 + 4.0;
    for (field, text, x) in [
        (SortField::TotalWeight, "Total", col_total_x + 8.0),
        (SortField::SelfWeight, "Self", col_self_x + 4.0),
        (SortField::SymbolName, "Symbol Name", col_name_x + 4.0),
    ] {
        let (text, color) = if table.sort().field == field {
            let arrow = match table.sort().direction {
                SortDirection::Ascending => "▲",
                SortDirection::Descending => "▼",
            };
            (format!("{text} {arrow}"), ThemeToken::TextPrimary)
        } else {
            (text.to_owned(), ThemeToken::TextMuted)
        };
        commands.push(RenderCommand::DrawText {
            position: Point::new(x, header_y),
            text,
            color,
            font_size: 12.0,
            align: TextAlign::Left,
        });
    }

    commands.push(RenderCommand::SetClip {
        rect: Rect::new(
            0.0,
            config.header_height,
            viewport.width,
            (viewport.height - config.header_height).max(0.0),
        ),
    });

    for (offset, row) in rows.iter().enumerate() {
        let index = first + offset;
        let y = config.header_height + (index as f64) * config.row_height;
        if !viewport.overlaps_rows(y, config.row_height) {
            continue;
        }

        let row_color = if selected.is_some_and(|key| *key == row.key) {
            ThemeToken::TableRowSelected
        } else if index % 2 == 0 {
            ThemeToken::TableRowEven
        } else {
            ThemeToken::TableRowOdd
        };
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, y, viewport.width, config.row_height),
            color: row_color,
            border_color: None,
            label: None,
            frame_id: Some(row.frame.0),
        });

        let text_y = y + config.row_height / 2.0 + 4.0;
        for (x, weight, percent) in [
            (col_total_x + 8.0, row.total_weight, row.total_percent),
            (col_self_x + 4.0, row.self_weight, row.self_percent),
        ] {
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(
                    x - 2.0,
                    y + config.row_height - 4.0,
                    bar_max_w * percent / 100.0,
                    2.0,
                ),
                color: ThemeToken::BarFill,
                border_color: None,
                label: None,
                frame_id: None,
            });
            commands.push(RenderCommand::DrawText {
                position: Point::new(x, text_y),
                text: format!("{} ({})", profile.format_value(weight), format_percent(percent)),
                color: ThemeToken::TextSecondary,
                font_size: 11.0,
                align: TextAlign::Left,
            });
        }

        commands.push(RenderCommand::DrawText {
            position: Point::new(col_name_x + 4.0, text_y),
            text: row.name.clone(),
            color: ThemeToken::TextPrimary,
            font_size: 11.0,
            align: TextAlign::Left,
        });

        let frame = profile.frame(row.frame);
        if let Some(file) = frame.file() {
            let location = match frame.line() {
                Some(line) => format!("{file}:{line}"),
                None => file.to_owned(),
            };
            commands.push(RenderCommand::DrawText {
                position: Point::new(viewport.width - 8.0, text_y),
                text: location,
                color: ThemeToken::TextMuted,
                font_size: 10.0,
                align: TextAlign::Right,
            });
        }
    }

    commands.push(RenderCommand::ClearClip);
    commands.push(RenderCommand::EndGroup);
    commands
}

/// Percentage with precision that shrinks as the value grows.
pub fn format_percent(percent: f64) -> String {
    if percent == 100.0 {
        "100%".to_owned()
    } else if percent > 99.0 {
        ">99%".to_owned()
    } else if percent <= 0.0 {
        "0%".to_owned()
    } else if percent < 0.01 {
        "<0.01%".to_owned()
    } else if percent < 1.0 {
        format!("{percent:.2}%")
    } else if percent < 10.0 {
        format!("{percent:.1}%")
    } else {
        format!("{percent:.0}%")
    }
}
