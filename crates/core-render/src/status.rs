//! Status line composition.
//!
//! `compose_status` turns host state into ordered segments; `format_status`
//! renders them. Keeping the two apart lets tests assert on segment presence
//! without string matching.

pub const ACTIVE_MARK: &str = "● active";
pub const INACTIVE_MARK: &str = "○ inactive";
pub const KEY_HINTS: &str = "a:activate  r:reload  q:quit";
const SEPARATOR: &str = " │ ";

/// Host state shown on the bottom row.
#[derive(Debug, Clone, Copy)]
pub struct StatusContext<'a> {
    /// Whether the shell considers the page instrumented.
    pub active: bool,
    pub page: u64,
    /// Navigation count of the page.
    pub generation: u32,
    /// Ephemeral message (activation failure and the like).
    pub message: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Indicator(bool),
    Page { id: u64, generation: u32 },
    Hints,
    Message(&'a str),
}

pub fn compose_status<'a>(ctx: &StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let mut out = Vec::with_capacity(4);
    out.push(StatusSegment::Indicator(ctx.active));
    out.push(StatusSegment::Page {
        id: ctx.page,
        generation: ctx.generation,
    });
    out.push(StatusSegment::Hints);
    if let Some(msg) = ctx.message.filter(|m| !m.is_empty()) {
        out.push(StatusSegment::Message(msg));
    }
    out
}

pub fn format_status(segments: &[StatusSegment<'_>]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(64);
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            s.push_str(SEPARATOR);
        }
        match seg {
            StatusSegment::Indicator(true) => s.push_str(ACTIVE_MARK),
            StatusSegment::Indicator(false) => s.push_str(INACTIVE_MARK),
            StatusSegment::Page { id, generation } => {
                let _ = write!(s, "page#{id} load {generation}");
            }
            StatusSegment::Hints => s.push_str(KEY_HINTS),
            StatusSegment::Message(m) => s.push_str(m),
        }
    }
    s
}

pub fn build_status(ctx: &StatusContext<'_>) -> String {
    format_status(&compose_status(ctx))
}
