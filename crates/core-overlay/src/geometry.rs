//! Cell-grid geometry for overlay placement.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub column: u16,
    pub row: u16,
}

impl Point {
    pub const fn new(column: u16, row: u16) -> Self {
        Self { column, row }
    }
}

impl From<(u16, u16)> for Point {
    fn from((column, row): (u16, u16)) -> Self {
        Self { column, row }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Half-open rectangle `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        u32::from(self.x) + u32::from(self.width)
    }

    pub fn bottom(&self) -> u32 {
        u32::from(self.y) + u32::from(self.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.column >= self.x
            && u32::from(p.column) < self.right()
            && p.row >= self.y
            && u32::from(p.row) < self.bottom()
    }

    /// Same size, shifted by the origin of `outer`.
    pub fn offset_by(&self, outer: &Rect) -> Rect {
        Rect::new(
            outer.x.saturating_add(self.x),
            outer.y.saturating_add(self.y),
            self.width,
            self.height,
        )
    }
}

/// Top-left corner for a `width x height` box anchored at `anchor`.
///
/// The box goes `offset` cells right of and below the anchor. When it would
/// overflow the right (bottom) edge it flips to the left of (above) the anchor,
/// saturating at the viewport origin.
pub fn place(anchor: Point, width: u16, height: u16, offset: u16, viewport: Viewport) -> Point {
    let flip = |a: u16, size: u16, limit: u16| -> u16 {
        let near = u32::from(a) + u32::from(offset);
        if near + u32::from(size) > u32::from(limit) {
            a.saturating_sub(size.saturating_add(offset))
        } else {
            near as u16
        }
    };
    Point {
        column: flip(anchor.column, width, viewport.width),
        row: flip(anchor.row, height, viewport.height),
    }
}
