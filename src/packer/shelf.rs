use euclid::{Box2D, Point2D, UnknownUnit};

/// Empty pixels kept right of and below every glyph.
pub const PAGE_MARGIN: u32 = 1;

/// Page indices must fit the 16-bit field of a glyph record.
pub const MAX_PAGES: usize = u16::MAX as usize + 1;

/// Where a bitmap landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub page: usize,
    pub rect: Box2D<u32, UnknownUnit>,
}

impl Placement {
    /// Placement of a glyph without ink.
    pub fn empty() -> Self {
        Self {
            page: 0,
            rect: Box2D::zero(),
        }
    }
}

/// Next-fit shelf allocator over an unbounded sequence of square pages.
///
/// Bitmaps fill the current shelf left to right. When one does not fit, a
/// new shelf opens below the current one, and when that does not fit either
/// a new page begins. Closed shelves and pages are never revisited, even
/// when a later bitmap would fit their leftover space. Placement depends only on the insertion order, so the
/// caller sorts its input to get a stable layout.
pub struct ShelfPacker {
    side_length: u32,
    pages: usize,
    cursor_x: u32,
    shelf_y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    pub fn new(side_length: u32) -> Self {
        Self {
            side_length,
            pages: 0,
            cursor_x: 0,
            shelf_y: 0,
            shelf_height: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Reserves a `width` x `height` rectangle.
    ///
    /// Returns `None` when the bitmap is larger than a page or the page
    /// limit has been reached.
    pub fn insert(&mut self, width: u32, height: u32) -> Option<Placement> {
        if width > self.side_length || height > self.side_length {
            return None;
        }

        if self.pages == 0 || !self.fits_current_shelf(width, height) {
            let next_y = self.shelf_y + self.shelf_height + PAGE_MARGIN;
            if self.pages > 0 && self.cursor_x > 0 && next_y + height <= self.side_length {
                self.shelf_y = next_y;
            } else {
                if self.pages == MAX_PAGES {
                    return None;
                }
                self.pages += 1;
                self.shelf_y = 0;
            }
            self.cursor_x = 0;
            self.shelf_height = 0;
        }

        let min = Point2D::new(self.cursor_x, self.shelf_y);
        let placement = Placement {
            page: self.pages - 1,
            rect: Box2D::new(min, Point2D::new(min.x + width, min.y + height)),
        };
        self.cursor_x += width + PAGE_MARGIN;
        self.shelf_height = self.shelf_height.max(height);
        Some(placement)
    }

    /// The last shelf of a page may grow downwards.
    fn fits_current_shelf(&self, width: u32, height: u32) -> bool {
        self.cursor_x + width <= self.side_length && self.shelf_y + height <= self.side_length
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: u32, y0: u32, x1: u32, y1: u32) -> Box2D<u32, UnknownUnit> {
        Box2D::new(Point2D::new(x0, y0), Point2D::new(x1, y1))
    }

    #[test]
    fn fills_shelves_left_to_right() {
        let mut packer = ShelfPacker::new(16);
        let a = packer.insert(6, 5).unwrap();
        let b = packer.insert(6, 4).unwrap();
        let c = packer.insert(6, 4).unwrap();

        assert_eq!(a, Placement { page: 0, rect: rect(0, 0, 6, 5) });
        assert_eq!(b, Placement { page: 0, rect: rect(7, 0, 13, 4) });
        // 14 + 6 > 16, so a new shelf starts below the tallest glyph
        assert_eq!(c, Placement { page: 0, rect: rect(0, 6, 6, 10) });
    }

    #[test]
    fn opens_new_page_when_full() {
        let mut packer = ShelfPacker::new(16);
        for _ in 0..4 {
            assert_eq!(packer.insert(7, 7).unwrap().page, 0);
        }
        let overflow = packer.insert(7, 7).unwrap();
        assert_eq!(overflow, Placement { page: 1, rect: rect(0, 0, 7, 7) });
        assert_eq!(packer.page_count(), 2);
    }

    #[test]
    fn page_sized_bitmap_fits_exactly() {
        let mut packer = ShelfPacker::new(16);
        assert_eq!(packer.insert(16, 16).unwrap().rect, rect(0, 0, 16, 16));
        assert_eq!(packer.insert(1, 1).unwrap().page, 1);
    }

    #[test]
    fn oversized_bitmap_is_rejected() {
        let mut packer = ShelfPacker::new(16);
        assert!(packer.insert(17, 1).is_none());
        assert!(packer.insert(1, 17).is_none());
        assert_eq!(packer.page_count(), 0);
    }

    #[test]
    fn same_sequence_same_layout() {
        let sizes = [(5, 9), (3, 9), (8, 7), (2, 7), (6, 3), (6, 3), (1, 1)];
        let run = || {
            let mut packer = ShelfPacker::new(16);
            sizes
                .iter()
                .map(|&(w, h)| packer.insert(w, h).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn closed_shelves_are_not_revisited() {
        let mut packer = ShelfPacker::new(16);
        assert_eq!(packer.insert(10, 4).unwrap().rect, rect(0, 0, 10, 4));
        // too wide for the rest of the first shelf
        assert_eq!(packer.insert(8, 2).unwrap().rect, rect(0, 5, 8, 7));
        // would fit right of the first bitmap, but that shelf is closed
        assert_eq!(packer.insert(4, 2).unwrap().rect, rect(9, 5, 13, 7));
    }
}
