use std::collections::BTreeSet;
use std::sync::Arc;

use super::{FontIdentity, FontSource, KerningPairs, VerticalMetrics};
use crate::bitmap::{DrawColors, Surface};
use crate::glyph_id::GlyphId;
use crate::glyph_metrics::GlyphMetrics;

/// A font without glyphs.
///
/// Useful as the first layer of a face to pin its ascent and line height
/// independently of the fonts that actually supply glyphs.
#[derive(Clone, Debug, Default)]
pub struct EmptyFont {
    size: f32,
    metrics: VerticalMetrics,
    codepoints: BTreeSet<char>,
    kerning: Arc<KerningPairs>,
}

impl EmptyFont {
    pub fn new(size: f32, ascent: i32, line_height: i32) -> Self {
        Self {
            size,
            metrics: VerticalMetrics {
                ascent,
                line_height,
            },
            ..Default::default()
        }
    }
}

impl FontSource for EmptyFont {
    fn identity(&self) -> FontIdentity {
        FontIdentity {
            family: "Empty".to_string(),
            subfamily: "Regular".to_string(),
        }
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        self.metrics
    }

    fn codepoints(&self) -> &BTreeSet<char> {
        &self.codepoints
    }

    fn glyph_metrics(&self, _codepoint: char) -> Option<GlyphMetrics> {
        None
    }

    fn kerning_pairs(&self) -> Arc<KerningPairs> {
        Arc::clone(&self.kerning)
    }

    fn draw(
        &self,
        _codepoint: char,
        _surface: &mut Surface<'_>,
        _x: i32,
        _y: i32,
        _colors: DrawColors,
    ) -> bool {
        false
    }

    fn glyph_id(&self, _codepoint: char) -> Option<GlyphId> {
        None
    }

    fn codepoint_of(&self, _glyph_id: &GlyphId) -> Option<char> {
        None
    }

    fn thread_safe_view(&self) -> Arc<dyn FontSource> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_only_vertical_metrics() {
        let font = EmptyFont::new(18.0, 14, 24);
        assert_eq!(
            font.vertical_metrics(),
            VerticalMetrics {
                ascent: 14,
                line_height: 24
            }
        );
        assert!(font.codepoints().is_empty());
        assert!(font.glyph_metrics('A').is_none());
        assert!(font.kerning_pairs().is_empty());
    }
}
