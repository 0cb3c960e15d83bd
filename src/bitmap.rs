//! Pixel buffers that font sources draw into.

/// 8-bit coverage bitmap.
///
/// Pixels are arranged in row-major order with the origin at the top-left.
/// Each pixel stores a single coverage value where `0` represents
/// transparent/empty and `255` is fully opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaBitmap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl AlphaBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let len = width.saturating_mul(height);
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Adds coverage to a pixel, saturating at 255. Out of bounds writes are ignored.
    pub fn accumulate(&mut self, x: usize, y: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let pixel = &mut self.pixels[y * self.width + x];
        *pixel = pixel.saturating_add(value);
    }
}

/// RGBA8888 bitmap, row-major, straight alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBitmap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 4]>,
}

impl RgbaBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        let len = width.saturating_mul(height);
        Self {
            width,
            height,
            pixels: vec![[0; 4]; len],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }
}

/// Foreground and background colors used when drawing a glyph.
///
/// For coverage surfaces only the alpha channels matter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawColors {
    pub foreground: [u8; 4],
    pub background: [u8; 4],
}

impl Default for DrawColors {
    fn default() -> Self {
        Self {
            foreground: [255, 255, 255, 255],
            background: [0, 0, 0, 0],
        }
    }
}

/// Destination of a draw call: either full color or 8-bit coverage.
pub enum Surface<'a> {
    Rgba(&'a mut RgbaBitmap),
    Alpha(&'a mut AlphaBitmap),
}

impl Surface<'_> {
    pub fn width(&self) -> usize {
        match self {
            Self::Rgba(bitmap) => bitmap.width,
            Self::Alpha(bitmap) => bitmap.width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Rgba(bitmap) => bitmap.height,
            Self::Alpha(bitmap) => bitmap.height,
        }
    }

    /// Composites a coverage mask whose top-left corner lands at `(x, y)`.
    ///
    /// The background is painted under the whole mask rectangle first, then
    /// the foreground is blended in proportion to coverage. Parts outside the
    /// surface are clipped.
    pub fn blit_coverage(
        &mut self,
        coverage: &[u8],
        mask_width: usize,
        x: i32,
        y: i32,
        colors: DrawColors,
    ) {
        if mask_width == 0 {
            return;
        }
        let mask_height = coverage.len() / mask_width;

        for row in 0..mask_height {
            let iy = y as i64 + row as i64;
            if iy < 0 || iy as usize >= self.height() {
                continue;
            }

            for col in 0..mask_width {
                let ix = x as i64 + col as i64;
                if ix < 0 || ix as usize >= self.width() {
                    continue;
                }

                let value = coverage[row * mask_width + col];
                let (ix, iy) = (ix as usize, iy as usize);
                match self {
                    Self::Alpha(bitmap) => {
                        let fg = mul_u8(value, colors.foreground[3]);
                        let bg = mul_u8(255 - value, colors.background[3]);
                        bitmap.accumulate(ix, iy, fg.saturating_add(bg));
                    }
                    Self::Rgba(bitmap) => {
                        let index = iy * bitmap.width + ix;
                        let mut pixel = bitmap.pixels[index];
                        if colors.background[3] != 0 {
                            pixel = blend(pixel, colors.background, 255);
                        }
                        bitmap.pixels[index] = blend(pixel, colors.foreground, value);
                    }
                }
            }
        }
    }
}

fn mul_u8(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}

/// Source-over blend of `src` scaled by `coverage` onto `dst`.
fn blend(dst: [u8; 4], src: [u8; 4], coverage: u8) -> [u8; 4] {
    let src_alpha = mul_u8(src[3], coverage) as u32;
    if src_alpha == 0 {
        return dst;
    }
    let dst_alpha = dst[3] as u32;
    let out_alpha = src_alpha + dst_alpha * (255 - src_alpha) / 255;
    if out_alpha == 0 {
        return [0; 4];
    }

    let mut out = [0u8; 4];
    for channel in 0..3 {
        let s = src[channel] as u32 * src_alpha;
        let d = dst[channel] as u32 * dst_alpha * (255 - src_alpha) / 255;
        out[channel] = ((s + d) / out_alpha).min(255) as u8;
    }
    out[3] = out_alpha.min(255) as u8;
    out
}
