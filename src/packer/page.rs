use euclid::{Box2D, UnknownUnit};

use crate::bitmap::AlphaBitmap;

/// Maps linear coverage to gamma corrected coverage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GammaTable([u8; 256]);

impl GammaTable {
    pub fn new(gamma: f32) -> Self {
        let mut table = [0u8; 256];
        for (value, slot) in table.iter_mut().enumerate() {
            *slot = if gamma == 1.0 {
                value as u8
            } else {
                let normalized = value as f32 / 255.0;
                (normalized.powf(1.0 / gamma) * 255.0).round().clamp(0.0, 255.0) as u8
            };
        }
        Self(table)
    }

    pub fn apply(&self, pixels: &mut [u8]) {
        for pixel in pixels {
            *pixel = self.0[*pixel as usize];
        }
    }
}

/// A square coverage texture and its reduced copies.
///
/// `levels[0]` is the full resolution page; every following level halves
/// the side length with a 2x2 box filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TexturePage {
    pub side_length: u32,
    pub levels: Vec<AlphaBitmap>,
}

impl TexturePage {
    pub fn new(side_length: u32) -> Self {
        let side = side_length as usize;
        Self {
            side_length,
            levels: vec![AlphaBitmap::new(side, side)],
        }
    }

    pub fn base(&self) -> &AlphaBitmap {
        &self.levels[0]
    }

    /// Copies a glyph bitmap so its top-left corner lands on `rect.min`.
    pub fn copy_from(&mut self, glyph: &AlphaBitmap, rect: Box2D<u32, UnknownUnit>) {
        let base = &mut self.levels[0];
        let x0 = rect.min.x as usize;
        let width = glyph.width.min(base.width.saturating_sub(x0));
        for row in 0..glyph.height {
            let y = rect.min.y as usize + row;
            if y >= base.height {
                break;
            }
            let src = &glyph.pixels[row * glyph.width..row * glyph.width + width];
            base.pixels[y * base.width + x0..y * base.width + x0 + width].copy_from_slice(src);
        }
    }

    /// Regenerates `count` reduced levels from the base level.
    pub fn build_levels(&mut self, count: u32) {
        self.levels.truncate(1);
        for _ in 0..count {
            let Some(last) = self.levels.last() else {
                break;
            };
            if last.width <= 1 {
                break;
            }
            let reduced = reduce(last);
            self.levels.push(reduced);
        }
    }
}

fn reduce(bitmap: &AlphaBitmap) -> AlphaBitmap {
    let mut reduced = AlphaBitmap::new(bitmap.width.div_ceil(2), bitmap.height.div_ceil(2));
    for y in 0..reduced.height {
        for x in 0..reduced.width {
            let mut sum = 0u32;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                sum += bitmap.get(2 * x + dx, 2 * y + dy).unwrap_or(0) as u32;
            }
            reduced.pixels[y * reduced.width + x] = ((sum + 2) / 4) as u8;
        }
    }
    reduced
}
