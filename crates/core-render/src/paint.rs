//! Painters composing one frame: page content, overlay layer, status line.
//!
//! Call order is page, overlay, status. Each painter only writes inside its
//! own area and relies on `Frame` clipping at the edges.

use crate::{CellFlags, Frame};
use core_overlay::{OverlayElement, SpanRole};
use core_page::{Page, TITLE, Widget, WidgetKind};
use unicode_width::UnicodeWidthStr;

const TITLE_COLUMN: u16 = 2;
const ACTIVITY_HEADING: &str = "Activity";

pub fn paint_page(frame: &mut Frame, page: &Page) {
    frame.put_str(TITLE_COLUMN, 0, TITLE, CellFlags::BOLD);
    for w in page.widgets() {
        paint_widget(frame, w);
    }
    let heading = page.activity_row();
    frame.put_str(TITLE_COLUMN, heading, ACTIVITY_HEADING, CellFlags::BOLD);
    if page.activity().is_empty() {
        frame.put_str(TITLE_COLUMN + 2, heading + 1, "(empty)", CellFlags::DIM);
        return;
    }
    for (i, item) in page.activity().iter().enumerate() {
        let row = heading.saturating_add(1 + i as u16);
        frame.put_str(TITLE_COLUMN + 2, row, item, CellFlags::empty());
    }
}

fn paint_widget(frame: &mut Frame, w: &Widget) {
    let r = w.rect;
    if r.width < 2 || r.height < 3 {
        return;
    }
    let inner = usize::from(r.width - 2);
    let top = format!("┌{}┐", "─".repeat(inner));
    let bottom = format!("└{}┘", "─".repeat(inner));
    frame.put_str(r.x, r.y, &top, CellFlags::empty());
    frame.put_str(r.x, r.y + 2, &bottom, CellFlags::empty());

    let label = w.label();
    let label_w = UnicodeWidthStr::width(label.as_str());
    let mut middle = String::with_capacity(r.width as usize + 4);
    middle.push_str("│ ");
    middle.push_str(&label);
    middle.push_str(&" ".repeat(inner.saturating_sub(label_w + 1)));
    middle.push('│');
    frame.put_str(r.x, r.y + 1, &middle, CellFlags::empty());

    if w.kind == WidgetKind::Toggle && w.on {
        frame.apply_flags_span(r.x + 2, r.y + 1, label_w as u16, CellFlags::REVERSE);
    }
}

fn role_flags(role: SpanRole) -> CellFlags {
    match role {
        SpanRole::Status | SpanRole::Label => CellFlags::REVERSE | CellFlags::BOLD,
        SpanRole::Time | SpanRole::Notice => CellFlags::REVERSE,
        SpanRole::Frames => CellFlags::REVERSE | CellFlags::DIM,
        // controls drop the reverse so they read as buttons on the panel
        SpanRole::Control(_) => CellFlags::BOLD,
    }
}

pub fn paint_overlay(frame: &mut Frame, element: &OverlayElement) {
    let r = element.rect;
    frame.fill(r.x, r.y, r.width, r.height, CellFlags::REVERSE);
    for (i, line) in element.layout.lines.iter().enumerate() {
        let y = r.y.saturating_add(i as u16);
        for span in &line.spans {
            frame.put_str(
                r.x.saturating_add(span.column),
                y,
                &span.text,
                role_flags(span.role),
            );
        }
    }
}

/// Bottom row, reverse video across the full width.
pub fn paint_status(frame: &mut Frame, text: &str) {
    let Some(y) = frame.height.checked_sub(1) else {
        return;
    };
    frame.fill(0, y, frame.width, 1, CellFlags::REVERSE);
    frame.put_str(0, y, text, CellFlags::REVERSE);
}
