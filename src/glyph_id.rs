pub const SUB_PIXEL_QUANTIZE: f32 = 256f32;

/// Stable key of one font face, independent of the process that loaded it.
///
/// Backends derive it from data that survives reloading (for example the
/// PostScript name and collection index), never from a pointer or a
/// database-local id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(pub u64);

impl SourceKey {
    /// Hashes any stable description of a face into a key.
    pub fn from_hashable<T: std::hash::Hash + ?Sized>(value: &T) -> Self {
        Self(fxhash::hash64(value))
    }
}

/// Content address of a rendered glyph bitmap.
///
/// Two requests with the same `GlyphId` produce identical pixels, so the
/// packer renders them once and lets every codepoint that maps to it share
/// the same rectangle. Size and transform are quantized the same way so
/// float noise does not split otherwise equal glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId {
    source: SourceKey,
    glyph_index: u32,
    font_size: u32, // font size * SUB_PIXEL_QUANTIZE as u32
    transform: [i32; 4],
}

impl GlyphId {
    pub const IDENTITY_TRANSFORM: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    pub fn new(source: SourceKey, glyph_index: u32, font_size: f32) -> Self {
        Self::with_transform(source, glyph_index, font_size, Self::IDENTITY_TRANSFORM)
    }

    /// `transform` is a row-major 2x2 matrix applied by the rasterizer.
    pub fn with_transform(
        source: SourceKey,
        glyph_index: u32,
        font_size: f32,
        transform: [f32; 4],
    ) -> Self {
        Self {
            source,
            glyph_index,
            font_size: (font_size * SUB_PIXEL_QUANTIZE).round() as u32,
            transform: transform.map(|v| (v * SUB_PIXEL_QUANTIZE).round() as i32),
        }
    }

    pub fn source(&self) -> SourceKey {
        self.source
    }

    pub fn glyph_index(&self) -> u32 {
        self.glyph_index
    }

    pub fn font_size(&self) -> f32 {
        self.font_size as f32 / SUB_PIXEL_QUANTIZE
    }

    /// A 64-bit digest usable as a key outside this process.
    pub fn fingerprint(&self) -> u64 {
        fxhash::hash64(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_quantized() {
        let source = SourceKey(7);
        let a = GlyphId::new(source, 3, 12.0);
        let b = GlyphId::new(source, 3, 12.0 + 1e-5);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.font_size(), 12.0);
    }

    #[test]
    fn transform_distinguishes_glyphs() {
        let source = SourceKey(7);
        let plain = GlyphId::new(source, 3, 12.0);
        let italic = GlyphId::with_transform(source, 3, 12.0, [1.0, 0.2, 0.0, 1.0]);
        assert_ne!(plain, italic);
    }

    #[test]
    fn source_key_is_deterministic() {
        let a = SourceKey::from_hashable(&("NotoSans-Regular", 0u32));
        let b = SourceKey::from_hashable(&("NotoSans-Regular", 0u32));
        let c = SourceKey::from_hashable(&("NotoSans-Regular", 1u32));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
