//! Content layout: turns overlay content into positioned text spans.
//!
//! Results rows are laid out in three columns (label, time, frames). Notices and
//! status text span the full width. A controls row closes every element.

use crate::geometry::Rect;
use core_timing::{ResultLine, ResultsDisplay};
use unicode_width::UnicodeWidthStr;

pub const CLOSE_LABEL: &str = "[×]";
pub const DISABLE_LABEL: &str = "[Disable]";
/// Blank columns on each side of the content.
pub const PADDING: u16 = 1;
const COLUMN_GAP: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayContent {
    /// Transient status ("Mousedown", "Mouseup").
    Status(String),
    Results(ResultsDisplay),
    /// Single message such as the timeout notice.
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayControl {
    Close,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanRole {
    Status,
    Label,
    Time,
    Frames,
    Notice,
    Control(OverlayControl),
}

/// Text placed at `column` (relative to the element's left edge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub column: u16,
    pub text: String,
    pub role: SpanRole,
}

impl Span {
    fn new(column: u16, text: impl Into<String>, role: SpanRole) -> Self {
        Self {
            column,
            text: text.into(),
            role,
        }
    }

    pub fn width(&self) -> u16 {
        text_width(&self.text)
    }

    pub fn end(&self) -> u16 {
        self.column.saturating_add(self.width())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayLine {
    pub spans: Vec<Span>,
}

impl OverlayLine {
    pub fn width(&self) -> u16 {
        self.spans.iter().map(Span::end).max().unwrap_or(0)
    }

    /// Spans joined with spaces at their columns (tests / diagnostics).
    pub fn plain(&self) -> String {
        let mut out = String::new();
        let mut col = 0u16;
        for span in &self.spans {
            while col < span.column {
                out.push(' ');
                col += 1;
            }
            out.push_str(&span.text);
            col = span.end();
        }
        out
    }
}

/// Laid-out element body in element-relative coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: u16,
    pub height: u16,
    pub lines: Vec<OverlayLine>,
    pub controls: Vec<(OverlayControl, Rect)>,
}

pub(crate) fn text_width(s: &str) -> u16 {
    u16::try_from(UnicodeWidthStr::width(s)).unwrap_or(u16::MAX)
}

fn content_lines(content: &OverlayContent) -> Vec<OverlayLine> {
    match content {
        OverlayContent::Status(text) => vec![OverlayLine {
            spans: vec![Span::new(PADDING, text.as_str(), SpanRole::Status)],
        }],
        OverlayContent::Notice(text) => vec![OverlayLine {
            spans: vec![Span::new(PADDING, text.as_str(), SpanRole::Notice)],
        }],
        OverlayContent::Results(results) => results_lines(results),
    }
}

fn results_lines(results: &ResultsDisplay) -> Vec<OverlayLine> {
    let label_w = results
        .rows()
        .map(|r| text_width(&r.label) + 1)
        .max()
        .unwrap_or(0);
    let time_w = results.rows().map(|r| text_width(&r.time)).max().unwrap_or(0);
    let time_col = PADDING + label_w + COLUMN_GAP;
    let frames_col = time_col + time_w + COLUMN_GAP;

    results
        .lines()
        .iter()
        .map(|line| match line {
            ResultLine::Row(row) => {
                // right-align times so the unit suffixes line up
                let time_pad = time_w - text_width(&row.time);
                OverlayLine {
                    spans: vec![
                        Span::new(PADDING, format!("{}:", row.label), SpanRole::Label),
                        Span::new(time_col + time_pad, row.time.as_str(), SpanRole::Time),
                        Span::new(frames_col, row.frames.as_str(), SpanRole::Frames),
                    ],
                }
            }
            ResultLine::Notice(text) => OverlayLine {
                spans: vec![Span::new(PADDING, text.as_str(), SpanRole::Notice)],
            },
        })
        .collect()
}

fn controls_line() -> OverlayLine {
    let close = Span::new(PADDING, CLOSE_LABEL, SpanRole::Control(OverlayControl::Close));
    let disable_col = close.end() + COLUMN_GAP;
    let disable = Span::new(
        disable_col,
        DISABLE_LABEL,
        SpanRole::Control(OverlayControl::Disable),
    );
    OverlayLine {
        spans: vec![close, disable],
    }
}

pub fn layout(content: &OverlayContent) -> Layout {
    let mut lines = content_lines(content);
    let controls_row = lines.len() as u16;
    let controls = controls_line();
    let control_rects = controls
        .spans
        .iter()
        .filter_map(|s| match s.role {
            SpanRole::Control(c) => Some((c, Rect::new(s.column, controls_row, s.width(), 1))),
            _ => None,
        })
        .collect();
    lines.push(controls);
    let width = lines.iter().map(OverlayLine::width).max().unwrap_or(0) + PADDING;
    Layout {
        width,
        height: lines.len() as u16,
        lines,
        controls: control_rects,
    }
}
