//! Overlay presenter.
//!
//! Owns the single transient overlay element: creates it on first `show`,
//! replaces its content, keeps it fully inside the viewport and removes it on
//! `hide`. The element lives in a presentation layer above the page, so
//! showing or hiding it is never reported as a page change.
//!
//! Positions are terminal cells. `show` without an anchor reuses the last one,
//! which is how final results stay where the interaction happened.

pub mod geometry;
pub mod layout;

pub use geometry::{Point, Rect, Viewport, place};
pub use layout::{
    Layout, OverlayContent, OverlayControl, OverlayLine, Span, SpanRole, CLOSE_LABEL,
    DISABLE_LABEL,
};

use tracing::{debug, trace};

/// Result of hit-testing a point against the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayHit {
    Body,
    Control(OverlayControl),
}

/// The attached overlay element: content plus absolute placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayElement {
    pub content: OverlayContent,
    pub rect: Rect,
    pub layout: Layout,
}

impl OverlayElement {
    /// Control rectangles in viewport coordinates.
    pub fn control_rects(&self) -> impl Iterator<Item = (OverlayControl, Rect)> + '_ {
        self.layout
            .controls
            .iter()
            .map(|(c, r)| (*c, r.offset_by(&self.rect)))
    }
}

#[derive(Debug)]
pub struct OverlayPresenter {
    element: Option<OverlayElement>,
    anchor: Point,
    viewport: Viewport,
    offset: u16,
}

impl OverlayPresenter {
    pub fn new(viewport: Viewport, offset: u16) -> Self {
        Self {
            element: None,
            anchor: Point::default(),
            viewport,
            offset,
        }
    }

    /// Attach (if needed) and update the overlay. `anchor = None` keeps the last position.
    pub fn show(&mut self, content: OverlayContent, anchor: Option<Point>) {
        if let Some(a) = anchor {
            self.anchor = a;
        }
        let created = self.element.is_none();
        let layout = layout::layout(&content);
        let origin = place(
            self.anchor,
            layout.width,
            layout.height,
            self.offset,
            self.viewport,
        );
        let rect = Rect::new(origin.column, origin.row, layout.width, layout.height);
        debug!(
            target: "overlay",
            created,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "overlay_show"
        );
        self.element = Some(OverlayElement {
            content,
            rect,
            layout,
        });
    }

    /// Detach the overlay. Returns whether one was attached.
    pub fn hide(&mut self) -> bool {
        let had = self.element.take().is_some();
        if had {
            debug!(target: "overlay", "overlay_hide");
        }
        had
    }

    pub fn is_visible(&self) -> bool {
        self.element.is_some()
    }

    pub fn element(&self) -> Option<&OverlayElement> {
        self.element.as_ref()
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn hit_test(&self, p: Point) -> Option<OverlayHit> {
        let el = self.element.as_ref()?;
        if !el.rect.contains(p) {
            return None;
        }
        let hit = el
            .control_rects()
            .find(|(_, r)| r.contains(p))
            .map(|(c, _)| OverlayHit::Control(c))
            .unwrap_or(OverlayHit::Body);
        trace!(target: "overlay", ?hit, "overlay_hit");
        Some(hit)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.hit_test(p).is_some()
    }

    /// Record a new viewport size and re-place the attached element.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(el) = self.element.take() {
            self.show(el.content, None);
        }
    }
}
