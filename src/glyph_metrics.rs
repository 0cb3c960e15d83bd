use euclid::{Box2D, Point2D, UnknownUnit, Vector2D};

/// Pixel-space placement of one glyph.
///
/// **Y-axis goes down.** `bounds` is the ink box relative to the pen position
/// on the line top, `advance` is how far the pen moves afterwards. The box is
/// always well formed (`right >= left`, `bottom >= top`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphMetrics {
    pub bounds: Box2D<i32, UnknownUnit>,
    pub advance: i32,
}

impl GlyphMetrics {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32, advance: i32) -> Self {
        Self {
            bounds: Box2D::new(
                Point2D::new(left, top),
                Point2D::new(right.max(left), bottom.max(top)),
            ),
            advance,
        }
    }

    pub fn left(&self) -> i32 {
        self.bounds.min.x
    }

    pub fn top(&self) -> i32 {
        self.bounds.min.y
    }

    pub fn right(&self) -> i32 {
        self.bounds.max.x
    }

    pub fn bottom(&self) -> i32 {
        self.bounds.max.y
    }

    pub fn width(&self) -> u32 {
        self.bounds.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.bounds.height() as u32
    }

    /// Whether the glyph has no ink to render.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Moves the ink box without touching the advance.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.bounds = self.bounds.translate(Vector2D::new(dx, dy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_bounds_collapse() {
        let metrics = GlyphMetrics::new(4, 8, 2, 3, 10);
        assert_eq!(metrics.width(), 0);
        assert_eq!(metrics.height(), 0);
        assert!(metrics.is_empty());
    }

    #[test]
    fn translate_keeps_advance() {
        let mut metrics = GlyphMetrics::new(-3, 2, 5, 12, 9);
        metrics.translate(3, -1);
        assert_eq!(
            (metrics.left(), metrics.top(), metrics.right(), metrics.bottom()),
            (0, 1, 8, 11)
        );
        assert_eq!(metrics.advance, 9);
        assert_eq!((metrics.width(), metrics.height()), (8, 10));
    }
}
