//! Frame composition and terminal emission.
//!
//! Every tick the host builds a fresh `Frame` (page, then overlay, then status
//! line) and hands it to `RenderEngine`, which diffs it against the previous
//! frame row by row and emits only the rows that changed.
//!
//! `Cell` stores the full grapheme cluster for leader cells along with its
//! visual width; continuation cells (width==0) occupy the remaining columns of
//! a wide cluster and never print text.
//!
//! Invariants:
//! - Leader: width >= 1, `cluster` non-empty.
//! - Continuation: width == 0, `cluster` empty.
//! - Continuations immediately follow their leader horizontally.
//! - Emission derives printable content solely from leaders.

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub mod engine;
pub mod metrics;
pub mod paint;
pub mod status;
pub mod writer;

pub use engine::{RenderEngine, RenderKind};
pub use metrics::{RenderPathMetrics, RenderPathMetricsSnapshot};
pub use paint::{paint_overlay, paint_page, paint_status};
pub use status::{StatusContext, StatusSegment, build_status, compose_status, format_status};

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        const REVERSE = 0b0000_0001;
        const BOLD    = 0b0000_0010;
        const DIM     = 0b0000_0100;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Full grapheme cluster string (leader cells only). Empty for continuation cells.
    pub cluster: String,
    /// Visual width in terminal columns. `0` designates a continuation cell.
    pub width: u8,
    pub flags: CellFlags,
}

impl Cell {
    #[inline]
    pub fn leader(cluster: &str, width: u16, flags: CellFlags) -> Self {
        Self {
            cluster: cluster.to_string(),
            width: width.clamp(1, u16::from(u8::MAX)) as u8,
            flags,
        }
    }

    #[inline]
    pub fn continuation(flags: CellFlags) -> Self {
        Self {
            cluster: String::new(),
            width: 0,
            flags,
        }
    }

    #[inline]
    pub fn is_leader(&self) -> bool {
        self.width > 0
    }

    #[inline]
    pub fn visual_width(&self) -> u16 {
        u16::from(self.width)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            cluster: " ".to_string(),
            width: 1,
            flags: CellFlags::empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Set a full cluster at (x,y) and populate continuation cells for its width.
    pub fn set_cluster(&mut self, x: u16, y: u16, cluster: &str, width: u16, flags: CellFlags) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = width.max(1).min(self.width - x);
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell::leader(cluster, w, flags);
        }
        for dx in 1..w {
            if let Some(c_idx) = self.index(x + dx, y) {
                self.cells[c_idx] = Cell::continuation(flags);
            }
        }
    }

    /// Write `text` starting at (x,y), one grapheme cluster per leader cell.
    /// Clipped at the right edge; a wide cluster that would straddle the edge
    /// is dropped. Returns the column after the last cluster written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, flags: CellFlags) -> u16 {
        let mut col = x;
        for g in text.graphemes(true) {
            let w = u16::try_from(UnicodeWidthStr::width(g)).unwrap_or(1).max(1);
            if u32::from(col) + u32::from(w) > u32::from(self.width) {
                break;
            }
            self.set_cluster(col, y, g, w, flags);
            col += w;
        }
        col
    }

    /// Blank a rectangle, leaving `flags` on every cell.
    pub fn fill(&mut self, x: u16, y: u16, width: u16, height: u16, flags: CellFlags) {
        for row in y..y.saturating_add(height).min(self.height) {
            for col in x..x.saturating_add(width).min(self.width) {
                if let Some(idx) = self.index(col, row) {
                    self.cells[idx] = Cell::leader(" ", 1, flags);
                }
            }
        }
    }

    /// Apply additional flags over an existing span (leader + continuations).
    pub fn apply_flags_span(&mut self, x: u16, y: u16, span_width: u16, flags: CellFlags) {
        let span = span_width.min(self.width.saturating_sub(x));
        for dx in 0..span {
            if let Some(idx) = self.index(x + dx, y) {
                self.cells[idx].flags |= flags;
            }
        }
    }

    /// Cells of one row, or an empty slice past the bottom edge.
    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Iterate leader cells of a row, yielding (&str, width, flags, start_x).
    pub fn row_leaders<'a>(
        &'a self,
        y: u16,
    ) -> impl Iterator<Item = (&'a str, u16, CellFlags, u16)> + 'a {
        let row = self.row(y);
        let mut x = 0usize;
        std::iter::from_fn(move || {
            while x < row.len() {
                let cell = &row[x];
                if cell.is_leader() {
                    let w = cell.visual_width();
                    let out = (&*cell.cluster, w, cell.flags, x as u16);
                    x += w as usize;
                    return Some(out);
                }
                x += 1;
            }
            None
        })
    }

    /// Row text with trailing blanks trimmed (tests / diagnostics).
    pub fn row_text(&self, y: u16) -> String {
        let s: String = self.row_leaders(y).map(|(c, _, _, _)| c).collect();
        s.trim_end().to_string()
    }
}
