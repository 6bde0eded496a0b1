//! Terminal writer abstraction.
//!
//! Collects primitive terminal operations for one frame and flushes them in
//! order to any `Write` sink. Consecutive leaders sharing the same style are
//! merged into one `Print`, and a style change is only emitted when the
//! attributes actually differ from the last ones written.
//!
//! Invariants:
//! * Commands preserve ordering; no flushing mid-frame.
//! * All positions are absolute (0,0) origin; caller ensures bounds.
//! * Every flush ends with attributes reset so the next frame starts plain.

use crate::CellFlags;
use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    /// Clears the current line; always preceded by `MoveTo(0, y)`.
    ClearLine,
    Style(CellFlags),
    Print(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub print_commands: u64,
    pub cells_printed: u64,
}

#[derive(Debug, Default)]
pub struct Writer {
    cmds: Vec<Command>,
    run: String,
    run_flags: CellFlags,
    style: CellFlags,
    stats: WriteStats,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: u16, y: u16) {
        self.end_run();
        self.cmds.push(Command::MoveTo(x, y));
    }

    pub fn clear_line(&mut self) {
        self.end_run();
        self.cmds.push(Command::ClearLine);
    }

    /// Queue one leader cluster; merged into the current run when the style matches.
    pub fn cluster(&mut self, text: &str, flags: CellFlags) {
        if !self.run.is_empty() && flags != self.run_flags {
            self.end_run();
        }
        self.run_flags = flags;
        self.run.push_str(text);
        self.stats.cells_printed += 1;
    }

    fn end_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        if self.run_flags != self.style {
            self.cmds.push(Command::Style(self.run_flags));
            self.style = self.run_flags;
        }
        self.cmds.push(Command::Print(std::mem::take(&mut self.run)));
        self.stats.print_commands += 1;
    }

    /// Pending commands (tests / diagnostics).
    pub fn commands(&mut self) -> &[Command] {
        self.end_run();
        &self.cmds
    }

    pub fn flush_to<W: Write>(mut self, out: &mut W) -> Result<WriteStats> {
        self.end_run();
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => queue!(out, MoveTo(x, y))?,
                Command::ClearLine => queue!(out, Clear(ClearType::CurrentLine))?,
                Command::Style(flags) => queue_style(out, flags)?,
                Command::Print(s) => queue!(out, Print(s))?,
            }
        }
        if !self.style.is_empty() {
            queue!(out, SetAttribute(Attribute::Reset))?;
        }
        out.flush()?;
        Ok(self.stats)
    }
}

fn queue_style<W: Write>(out: &mut W, flags: CellFlags) -> Result<()> {
    queue!(out, SetAttribute(Attribute::Reset))?;
    if flags.contains(CellFlags::BOLD) {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if flags.contains(CellFlags::DIM) {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if flags.contains(CellFlags::REVERSE) {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}
