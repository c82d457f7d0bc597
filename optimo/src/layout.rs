//! Viewport geometry shared by the host document and the positioner.

use serde::{Deserialize, Serialize};

/// An axis-aligned box in viewport coordinates, as returned by
/// `getBoundingClientRect`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a new rect.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// The bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Move the rect by an offset.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

/// Absolute offsets of an overlay inside its positioned container
/// (`style.left` / `style.top`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Offset from the container's left edge.
    pub left: f64,
    /// Offset from the container's top edge.
    pub top: f64,
}

impl Placement {
    /// Create a new placement.
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 300.0, 80.0);
        assert_eq!(rect.right(), 310.0);
        assert_eq!(rect.bottom(), 100.0);

        let moved = rect.translate(-10.0, 5.0);
        assert_eq!(moved.left, 0.0);
        assert_eq!(moved.top, 25.0);
        assert_eq!(moved.width, 300.0);
    }
}
