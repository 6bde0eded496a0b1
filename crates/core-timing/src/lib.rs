//! Timestamp & frame calculator.
//!
//! Pure functions turning a measured interval into display text. Nothing here
//! reads a clock; callers pass milliseconds (`f64`, sub-millisecond precision).
//!
//! Rounding: frame counts use `f64::round`, i.e. round half away from zero.
//! Durations are never negative so this matches round-half-up. Display
//! strings use `{:.1}`, which rounds the exact binary value; exact decimal
//! ties (e.g. `0.25`) are practically absent from clock-derived intervals.

use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

pub const PRESS_STATUS: &str = "Mousedown";
pub const RELEASE_STATUS: &str = "Mouseup";
pub const PRESS_LABEL: &str = "Mousedown → DOM";
pub const RELEASE_LABEL: &str = "Mouseup → DOM";
pub const NO_RELEASE_NOTICE: &str = "(No mouseup before DOM change)";

/// Reference refresh rate in Hz, used only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameTarget(pub u32);

impl FrameTarget {
    pub fn hz(self) -> u32 {
        self.0
    }
}

pub const DEFAULT_FRAME_TARGETS: [FrameTarget; 2] = [FrameTarget(60), FrameTarget(120)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCount {
    pub target: FrameTarget,
    pub frames: i64,
}

pub type FrameCounts = SmallVec<[FrameCount; 4]>;

/// Milliseconds represented by `d`, keeping sub-millisecond precision.
#[inline]
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Whole milliseconds in `d` for log fields, saturating at `u64::MAX`.
pub fn whole_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Fixed one-decimal duration with unit suffix: `120.4ms`.
pub fn format_duration(ms: f64) -> String {
    format!("{ms:.1}ms")
}

/// Whole frames elapsed at each target rate: `round(ms / 1000 * hz)`.
pub fn frames_for(ms: f64, targets: &[FrameTarget]) -> FrameCounts {
    targets
        .iter()
        .map(|&target| FrameCount {
            target,
            frames: (ms / 1000.0 * f64::from(target.hz())).round() as i64,
        })
        .collect()
}

/// `7f / 14f` for the counts in target order.
pub fn format_frames(counts: &[FrameCount]) -> String {
    counts
        .iter()
        .map(|c| format!("{}f", c.frames))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// One labelled measurement split into display columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub label: String,
    pub time: String,
    pub frames: String,
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}  {}", self.label, self.time, self.frames)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLine {
    Row(ResultRow),
    /// Full-width text spanning all columns.
    Notice(String),
}

impl fmt::Display for ResultLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultLine::Row(row) => row.fmt(f),
            ResultLine::Notice(text) => f.write_str(text),
        }
    }
}

/// Structured results: rows of cells plus spanning notices. Renderers lay the
/// cells out in columns; the plain `Display` form joins lines with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsDisplay {
    lines: Vec<ResultLine>,
}

impl ResultsDisplay {
    pub fn lines(&self) -> &[ResultLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.lines.iter().filter_map(|l| match l {
            ResultLine::Row(r) => Some(r),
            ResultLine::Notice(_) => None,
        })
    }
}

impl fmt::Display for ResultsDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            line.fmt(f)?;
        }
        Ok(())
    }
}

pub fn format_row(label: &str, ms: f64, targets: &[FrameTarget]) -> ResultRow {
    ResultRow {
        label: label.to_string(),
        time: format_duration(ms),
        frames: format_frames(&frames_for(ms, targets)),
    }
}

/// Compose the results panel. A press interval without a release interval adds
/// the "no mouseup" notice in place of the second row.
pub fn format_results(
    press_to_mutation_ms: Option<f64>,
    release_to_mutation_ms: Option<f64>,
    targets: &[FrameTarget],
) -> ResultsDisplay {
    let mut lines = Vec::with_capacity(2);
    if let Some(ms) = press_to_mutation_ms {
        lines.push(ResultLine::Row(format_row(PRESS_LABEL, ms, targets)));
    }
    match release_to_mutation_ms {
        Some(ms) => lines.push(ResultLine::Row(format_row(RELEASE_LABEL, ms, targets))),
        None if press_to_mutation_ms.is_some() => {
            lines.push(ResultLine::Notice(NO_RELEASE_NOTICE.to_string()))
        }
        None => {}
    }
    ResultsDisplay { lines }
}

/// `No DOM change detected within 2s`; fractional seconds keep only the
/// significant digits (`1.5s`, `0.25s`).
pub fn timeout_notice(timeout: Duration) -> String {
    let ms = timeout.as_millis();
    let secs = if ms % 1000 == 0 {
        format!("{}", ms / 1000)
    } else {
        let s = format!("{:.3}", timeout.as_secs_f64());
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    format!("No DOM change detected within {secs}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_one_decimal_with_suffix() {
        assert_eq!(format_duration(120.4), "120.4ms");
        assert_eq!(format_duration(0.0), "0.0ms");
        assert_eq!(format_duration(200.04), "200.0ms");
    }

    #[test]
    fn whole_ms_saturates_instead_of_wrapping() {
        assert_eq!(whole_ms(Duration::from_micros(2_999)), 2);
        assert_eq!(whole_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn frames_match_documented_example() {
        let counts = frames_for(120.4, &DEFAULT_FRAME_TARGETS);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].frames, 7);
        assert_eq!(counts[1].frames, 14);
        assert_eq!(format_frames(&counts), "7f / 14f");
    }

    #[test]
    fn frames_round_half_away_from_zero() {
        // 25ms at 60Hz = 1.5 frames
        let counts = frames_for(25.0, &[FrameTarget(60)]);
        assert_eq!(counts[0].frames, 2);
    }

    #[test]
    fn press_only_results_include_notice() {
        let r = format_results(Some(120.4), None, &DEFAULT_FRAME_TARGETS);
        assert_eq!(
            r.to_string(),
            "Mousedown → DOM: 120.4ms  7f / 14f\n(No mouseup before DOM change)"
        );
        assert_eq!(r.rows().count(), 1);
    }

    #[test]
    fn press_and_release_results_have_two_rows() {
        let r = format_results(Some(200.0), Some(150.0), &DEFAULT_FRAME_TARGETS);
        let rows: Vec<_> = r.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, PRESS_LABEL);
        assert_eq!(rows[0].time, "200.0ms");
        assert_eq!(rows[0].frames, "12f / 24f");
        assert_eq!(rows[1].label, RELEASE_LABEL);
        assert_eq!(rows[1].time, "150.0ms");
        assert_eq!(rows[1].frames, "9f / 18f");
    }

    #[test]
    fn nothing_measured_yields_empty_display() {
        assert!(format_results(None, None, &DEFAULT_FRAME_TARGETS).is_empty());
    }

    #[test]
    fn timeout_notice_trims_seconds() {
        assert_eq!(
            timeout_notice(Duration::from_millis(2000)),
            "No DOM change detected within 2s"
        );
        assert_eq!(
            timeout_notice(Duration::from_millis(1500)),
            "No DOM change detected within 1.5s"
        );
        assert_eq!(
            timeout_notice(Duration::from_millis(250)),
            "No DOM change detected within 0.25s"
        );
    }

    #[test]
    fn duration_ms_keeps_fraction() {
        let ms = duration_ms(Duration::from_micros(120_400));
        assert!((ms - 120.4).abs() < 1e-9);
    }
}
