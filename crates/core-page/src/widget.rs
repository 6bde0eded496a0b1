//! Page widgets and their geometry.

use core_overlay::Rect;
use core_watch::NodeId;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Click increments a visible count (text change).
    Counter,
    /// Press flips an attribute immediately.
    Toggle,
    /// Click appends an activity item after a delay (child list change).
    Load,
    /// Does nothing; exercises the timeout path.
    Inert,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 4] = [
        WidgetKind::Counter,
        WidgetKind::Toggle,
        WidgetKind::Load,
        WidgetKind::Inert,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub kind: WidgetKind,
    pub node: NodeId,
    pub rect: Rect,
    pub count: u32,
    pub on: bool,
}

impl Widget {
    pub fn new(kind: WidgetKind, node: NodeId, x: u16, y: u16) -> Self {
        let mut w = Self {
            kind,
            node,
            rect: Rect::default(),
            count: 0,
            on: false,
        };
        w.rect = Rect::new(x, y, w.box_width(), BOX_HEIGHT);
        w
    }

    pub fn label(&self) -> String {
        match self.kind {
            WidgetKind::Counter => format!("Count: {}", self.count),
            WidgetKind::Toggle => {
                format!("Toggle: {}", if self.on { "on" } else { "off" })
            }
            WidgetKind::Load => "Load item".to_string(),
            WidgetKind::Inert => "Does nothing".to_string(),
        }
    }

    /// Fixed per kind so relabelling never moves neighbouring widgets.
    fn box_width(&self) -> u16 {
        let widest = match self.kind {
            WidgetKind::Counter => "Count: 99999",
            WidgetKind::Toggle => "Toggle: off",
            WidgetKind::Load => "Load item",
            WidgetKind::Inert => "Does nothing",
        };
        u16::try_from(UnicodeWidthStr::width(widest)).unwrap_or(u16::MAX) + 4
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
        self.on = false;
    }
}

pub const BOX_HEIGHT: u16 = 3;
