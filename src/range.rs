// src/range.rs
//! Time ranges (millions of years ago), the geologic period table, and the
//! per-label color hash used by presentation code.

use serde::Serialize;

/// Dash that separates the two bounds of a range ("201.3–145").
pub const RANGE_DASH: char = '\u{2013}';

/// Older bound first: `start >= end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(a: f64, b: f64) -> Self {
        if a < b {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Parse free text like `"~201.3–145 Ma"` into a `TimeRange`.
///
/// Everything except digits, `.`, `-` and the en dash is dropped. The remainder
/// must split into exactly two numbers. The en dash separates bounds; when the
/// text has none, a plain hyphen does (so `"100-200"` parses too).
/// Returns `None` on any malformed input.
pub fn parse_range(s: &str) -> Option<TimeRange> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, '.' | '-' | RANGE_DASH))
        .collect();

    let sep = if cleaned.contains(RANGE_DASH) {
        RANGE_DASH
    } else {
        '-'
    };
    let parts: Vec<&str> = cleaned.split(sep).collect();
    if parts.len() != 2 {
        return None;
    }

    let a = parts[0].parse::<f64>().ok()?;
    let b = parts[1].parse::<f64>().ok()?;
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    Some(TimeRange::new(a, b))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub label: &'static str,
    pub start: f64,
    pub end: f64,
}

impl Period {
    /// True when the two intervals share any span (touching bounds count).
    pub fn overlaps(&self, r: &TimeRange) -> bool {
        r.start >= self.end && r.end <= self.start
    }
}

/// Mesozoic periods, oldest first.
pub const PERIODS: &[Period] = &[
    Period {
        label: "Triassic",
        start: 230.0,
        end: 201.0,
    },
    Period {
        label: "Jurassic",
        start: 201.0,
        end: 145.0,
    },
    Period {
        label: "Cretaceous",
        start: 145.0,
        end: 66.0,
    },
];

/// Labels of every period the range touches, oldest first.
pub fn periods_for(r: &TimeRange) -> Vec<&'static str> {
    PERIODS
        .iter()
        .filter(|p| p.overlaps(r))
        .map(|p| p.label)
        .collect()
}

/// Stable hue for a label: `hsl(h,70%,60%)`, folding UTF-16 code units.
pub fn color_for(text: &str) -> String {
    let h = text
        .encode_utf16()
        .fold(0u32, |h, cu| (h * 31 + u32::from(cu)) % 360);
    format!("hsl({h},70%,60%)")
}
