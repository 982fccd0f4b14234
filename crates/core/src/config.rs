use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::views::table::SortMethod;

/// Layout settings for the flame graph views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlamegraphConfig {
    /// Row height in logical pixels.
    pub frame_height: f64,
    /// Rectangles narrower than this are culled.
    pub min_rect_width: f64,
    /// Rectangles at least this wide carry a text label.
    pub label_min_width: f64,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            frame_height: 20.0,
            min_rect_width: 0.5,
            label_min_width: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub row_height: f64,
    pub header_height: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            row_height: 24.0,
            header_height: 28.0,
        }
    }
}

/// Settings shared by every view. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub flamegraph: FlamegraphConfig,
    pub table: TableConfig,
    pub default_sort: SortMethod,
}

impl ViewConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("flamegraph.frame_height", self.flamegraph.frame_height),
            ("table.row_height", self.table.row_height),
            ("table.header_height", self.table.header_height),
        ];
        for (name, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [
            ("flamegraph.min_rect_width", self.flamegraph.min_rect_width),
            ("flamegraph.label_min_width", self.flamegraph.label_min_width),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
