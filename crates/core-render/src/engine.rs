//! Row-diff render engine.
//!
//! Keeps the last emitted frame. A new frame is emitted in full when there is
//! no previous frame, the size changed, or `invalidate` was called; otherwise
//! only rows whose cells differ are repainted. Each repainted row is cleared
//! first and its trailing unstyled blanks are left to the clear.

use crate::metrics::RenderPathMetrics;
use crate::writer::Writer;
use crate::{CellFlags, Frame};
use anyhow::Result;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Full,
    Partial { rows: u16 },
    /// Identical to the previous frame; nothing written.
    Skipped,
}

#[derive(Debug, Default)]
pub struct RenderEngine {
    prev: Option<Frame>,
    metrics: RenderPathMetrics,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &RenderPathMetrics {
        &self.metrics
    }

    /// Force the next frame to be emitted in full (resize, screen corruption).
    pub fn invalidate(&mut self) {
        if self.prev.take().is_some() {
            RenderPathMetrics::add(&self.metrics.invalidations, 1);
            debug!(target: "render", "frame_cache_invalidated");
        }
    }

    pub fn render<W: Write>(&mut self, frame: Frame, out: &mut W) -> Result<RenderKind> {
        let started = Instant::now();
        let changed: Option<Vec<u16>> = self
            .prev
            .as_ref()
            .filter(|prev| prev.width == frame.width && prev.height == frame.height)
            .map(|prev| {
                (0..frame.height)
                    .filter(|&y| prev.row(y) != frame.row(y))
                    .collect()
            });
        let Some(changed) = changed else {
            let rows = self.emit(&frame, 0..frame.height, out)?;
            RenderPathMetrics::add(&self.metrics.full_frames, 1);
            self.finish(frame, started, rows);
            return Ok(RenderKind::Full);
        };
        if changed.is_empty() {
            RenderPathMetrics::add(&self.metrics.skipped_frames, 1);
            trace!(target: "render", "frame_unchanged");
            return Ok(RenderKind::Skipped);
        }
        let rows = self.emit(&frame, changed.into_iter(), out)?;
        RenderPathMetrics::add(&self.metrics.partial_frames, 1);
        RenderPathMetrics::add(
            &self.metrics.rows_skipped,
            u64::from(frame.height.saturating_sub(rows)),
        );
        self.finish(frame, started, rows);
        Ok(RenderKind::Partial { rows })
    }

    fn emit<W: Write>(
        &self,
        frame: &Frame,
        rows: impl Iterator<Item = u16>,
        out: &mut W,
    ) -> Result<u16> {
        let mut writer = Writer::new();
        let mut count = 0u16;
        for y in rows {
            writer.move_to(0, y);
            writer.clear_line();
            let last = frame
                .row_leaders(y)
                .filter(|(c, _, flags, _)| *c != " " || *flags != CellFlags::empty())
                .map(|(_, _, _, x)| x)
                .last();
            if let Some(last) = last {
                let upto = frame.row_leaders(y).take_while(|(_, _, _, x)| *x <= last);
                for (cluster, _, flags, _) in upto {
                    writer.cluster(cluster, flags);
                }
            }
            count += 1;
        }
        let stats = writer.flush_to(out)?;
        RenderPathMetrics::add(&self.metrics.rows_repainted, u64::from(count));
        RenderPathMetrics::add(&self.metrics.print_commands, stats.print_commands);
        RenderPathMetrics::add(&self.metrics.cells_printed, stats.cells_printed);
        Ok(count)
    }

    fn finish(&mut self, frame: Frame, started: Instant, rows: u16) {
        let ns = started.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
        self.metrics.last_render_ns.store(ns, Ordering::Relaxed);
        trace!(target: "render", rows, render_ns = ns, "frame_emitted");
        self.prev = Some(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(lines: &[&str]) -> Frame {
        let mut f = Frame::new(10, lines.len() as u16);
        for (y, l) in lines.iter().enumerate() {
            f.put_str(0, y as u16, l, CellFlags::empty());
        }
        f
    }

    #[test]
    fn first_frame_is_full() {
        let mut e = RenderEngine::new();
        let mut out = Vec::new();
        let kind = e.render(frame_with(&["ab", "cd"]), &mut out).unwrap();
        assert_eq!(kind, RenderKind::Full);
        let m = e.metrics().snapshot();
        assert_eq!(m.full_frames, 1);
        assert_eq!(m.rows_repainted, 2);
        assert_eq!(m.print_commands, 2);
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut e = RenderEngine::new();
        let mut out = Vec::new();
        e.render(frame_with(&["ab"]), &mut out).unwrap();
        out.clear();
        let kind = e.render(frame_with(&["ab"]), &mut out).unwrap();
        assert_eq!(kind, RenderKind::Skipped);
        assert!(out.is_empty());
        assert_eq!(e.metrics().snapshot().skipped_frames, 1);
    }

    #[test]
    fn only_changed_rows_are_repainted() {
        let mut e = RenderEngine::new();
        let mut out = Vec::new();
        e.render(frame_with(&["ab", "cd", "ef"]), &mut out).unwrap();
        out.clear();
        let kind = e.render(frame_with(&["ab", "cX", "ef"]), &mut out).unwrap();
        assert_eq!(kind, RenderKind::Partial { rows: 1 });
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, "\x1b[2;1H\x1b[2KcX");
        let m = e.metrics().snapshot();
        assert_eq!(m.rows_skipped, 2);
        assert_eq!(m.rows_repainted, 4);
    }

    #[test]
    fn size_change_and_invalidate_force_full() {
        let mut e = RenderEngine::new();
        let mut out = Vec::new();
        e.render(frame_with(&["ab"]), &mut out).unwrap();
        let kind = e.render(frame_with(&["ab", "cd"]), &mut out).unwrap();
        assert_eq!(kind, RenderKind::Full);
        e.invalidate();
        let kind = e.render(frame_with(&["ab", "cd"]), &mut out).unwrap();
        assert_eq!(kind, RenderKind::Full);
        let m = e.metrics().snapshot();
        assert_eq!(m.full_frames, 3);
        assert_eq!(m.invalidations, 1);
    }

    #[test]
    fn styled_trailing_blanks_are_kept() {
        let mut e = RenderEngine::new();
        let mut f = Frame::new(4, 1);
        f.fill(0, 0, 4, 1, CellFlags::REVERSE);
        let mut out = Vec::new();
        e.render(f, &mut out).unwrap();
        assert_eq!(e.metrics().snapshot().cells_printed, 4);
    }
}
