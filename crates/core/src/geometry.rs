/// A point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned rectangle. `left <= right` and `top <= bottom` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    /// Create a rect from position and size. Negative sizes are normalized.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners(Point::new(x, y), Point::new(x + width, y + height))
    }

    /// Create a rect spanning two corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Axis-aligned overlap test.
    ///
    /// Edges that only touch do not count, so a marquee that covers exactly one
    /// row of a gapless grid does not pick up the neighbouring row. A zero-extent
    /// axis (a purely horizontal or vertical drag) counts as a line inside the
    /// other rect's span.
    pub fn intersects(&self, other: &Rect) -> bool {
        spans_overlap(self.left, self.right, other.left, other.right)
            && spans_overlap(self.top, self.bottom, other.top, other.bottom)
    }
}

fn spans_overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> bool {
    if a0 == a1 {
        b0 <= a0 && a0 < b1
    } else if b0 == b1 {
        a0 <= b0 && b0 < a1
    } else {
        a0 < b1 && b0 < a1
    }
}
