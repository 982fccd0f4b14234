use serde::{Deserialize, Serialize};

/// What the weights of a profile represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    /// Sample count (perf, collapsed stacks).
    Samples,
    Bytes,
    /// Unitless weight.
    #[default]
    Weight,
}

impl ValueUnit {
    /// Nanoseconds per unit, for time units.
    pub fn nanos_per_unit(self) -> Option<f64> {
        match self {
            Self::Nanoseconds => Some(1.0),
            Self::Microseconds => Some(1e3),
            Self::Milliseconds => Some(1e6),
            Self::Seconds => Some(1e9),
            Self::Samples | Self::Bytes | Self::Weight => None,
        }
    }

    /// Format a weight in this unit for display.
    pub fn format_value(self, value: f64) -> String {
        if let Some(factor) = self.nanos_per_unit() {
            return format_nanos(value * factor);
        }
        match self {
            Self::Samples => format!("{} samples", value.round() as u64),
            Self::Bytes => format_bytes(value),
            _ => format!("{value:.0}"),
        }
    }
}

fn format_nanos(ns: f64) -> String {
    if ns >= 1e9 {
        format!("{:.2}s", ns / 1e9)
    } else if ns >= 1e6 {
        format!("{:.2}ms", ns / 1e6)
    } else if ns >= 1e3 {
        format!("{:.2}µs", ns / 1e3)
    } else {
        format!("{ns:.0}ns")
    }
}

fn format_bytes(bytes: f64) -> String {
    const KIB: f64 = 1024.0;
    if bytes >= KIB * KIB * KIB {
        format!("{:.1} GiB", bytes / (KIB * KIB * KIB))
    } else if bytes >= KIB * KIB {
        format!("{:.1} MiB", bytes / (KIB * KIB))
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{} B", bytes.round() as u64)
    }
}
