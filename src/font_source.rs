//! The capability every rasterizable font exposes.
//!
//! Concrete backends ([`FontdueFont`], [`EmptyFont`]) and the decorators built
//! on top of them ([`WrappingFont`](crate::WrappingFont),
//! [`MergedFont`](crate::MergedFont)) all implement [`FontSource`], so any of
//! them can be layered under another.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::bitmap::{DrawColors, Surface};
use crate::glyph_id::GlyphId;
use crate::glyph_metrics::GlyphMetrics;

mod empty_font;
mod fontdue_font;
#[cfg(test)]
pub(crate) mod test_font;

pub use empty_font::EmptyFont;
pub use fontdue_font::FontdueFont;

/// Signed advance adjustments keyed by `(left, right)` codepoints.
///
/// Ordered so that serialization and iteration are deterministic.
pub type KerningPairs = BTreeMap<(char, char), i32>;

/// Human readable name of a font.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontIdentity {
    pub family: String,
    pub subfamily: String,
}

/// Line metrics shared by every glyph of a font, in whole pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VerticalMetrics {
    pub ascent: i32,
    pub line_height: i32,
}

/// Read-only view of one font rendered at a fixed pixel size.
///
/// Every lookup is total: unsupported codepoints yield `None`, `false`, or
/// nothing at all instead of an error.
pub trait FontSource: Send + Sync {
    fn identity(&self) -> FontIdentity;

    /// Pixel size the font is rendered at.
    fn size(&self) -> f32;

    fn vertical_metrics(&self) -> VerticalMetrics;

    /// Every codepoint this font can draw, ascending.
    fn codepoints(&self) -> &BTreeSet<char>;

    fn glyph_metrics(&self, codepoint: char) -> Option<GlyphMetrics>;

    /// Kerning table of the font. Implementations compute it on first use and
    /// hand out the cached table afterwards.
    fn kerning_pairs(&self) -> Arc<KerningPairs>;

    /// Pairs whose both sides are in `codepoints`.
    ///
    /// Backends that enumerate pairs glyph by glyph override this to skip
    /// the rest of the font.
    fn kerning_pairs_within(&self, codepoints: &BTreeSet<char>) -> KerningPairs {
        self.kerning_pairs()
            .iter()
            .filter(|((left, right), _)| codepoints.contains(left) && codepoints.contains(right))
            .map(|(&pair, &value)| (pair, value))
            .collect()
    }

    /// Draws `codepoint` with its pen position at `(x, y)` on the line top.
    ///
    /// Returns `false` when the codepoint is not supported.
    fn draw(
        &self,
        codepoint: char,
        surface: &mut Surface<'_>,
        x: i32,
        y: i32,
        colors: DrawColors,
    ) -> bool;

    /// Content address of the bitmap `codepoint` renders to.
    fn glyph_id(&self, codepoint: char) -> Option<GlyphId>;

    /// Inverse of [`Self::glyph_id`]: a codepoint of this font rendering the glyph.
    fn codepoint_of(&self, glyph_id: &GlyphId) -> Option<char>;

    /// An independent instance that can be used from another thread while
    /// this one keeps running.
    fn thread_safe_view(&self) -> Arc<dyn FontSource>;

    fn contains(&self, codepoint: char) -> bool {
        self.codepoints().contains(&codepoint)
    }
}
