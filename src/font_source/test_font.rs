//! Deterministic in-memory font for tests.
//!
//! Each glyph is a solid box of configurable metrics; the pixel value is
//! derived from the codepoint so tests can tell glyphs apart on a page.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use super::{FontIdentity, FontSource, KerningPairs, VerticalMetrics};
use crate::bitmap::{DrawColors, Surface};
use crate::glyph_id::{GlyphId, SourceKey};
use crate::glyph_metrics::GlyphMetrics;

#[derive(Clone, Debug)]
pub struct TestFont {
    pub name: String,
    pub source: SourceKey,
    pub size: f32,
    pub vertical_metrics: VerticalMetrics,
    pub glyphs: BTreeMap<char, GlyphMetrics>,
    pub codepoints: BTreeSet<char>,
    pub kerning: Arc<KerningPairs>,
    /// Sleep inside every draw call, to keep a compile busy.
    pub draw_delay: Duration,
    /// Sleep inside every kerning lookup.
    pub kerning_delay: Duration,
}

impl TestFont {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: SourceKey::from_hashable(name),
            size: 16.0,
            vertical_metrics: VerticalMetrics {
                ascent: 12,
                line_height: 16,
            },
            glyphs: BTreeMap::new(),
            codepoints: BTreeSet::new(),
            kerning: Arc::new(KerningPairs::new()),
            draw_delay: Duration::ZERO,
            kerning_delay: Duration::ZERO,
        }
    }

    /// Adds a glyph with the given ink box and advance.
    pub fn glyph(mut self, ch: char, left: i32, top: i32, width: i32, height: i32, advance: i32) -> Self {
        self.glyphs
            .insert(ch, GlyphMetrics::new(left, top, left + width, top + height, advance));
        self.codepoints.insert(ch);
        self
    }

    /// Adds every char of `chars` as a plain `width`x`height` box.
    pub fn boxes(mut self, chars: impl IntoIterator<Item = char>, width: i32, height: i32) -> Self {
        for ch in chars {
            self = self.glyph(ch, 0, 2, width, height, width + 1);
        }
        self
    }

    pub fn kern(mut self, left: char, right: char, value: i32) -> Self {
        Arc::make_mut(&mut self.kerning).insert((left, right), value);
        self
    }

    pub fn shared(self) -> Arc<dyn FontSource> {
        Arc::new(self)
    }

    pub fn pixel_value(ch: char) -> u8 {
        (ch as u32 % 200) as u8 + 50
    }
}

impl FontSource for TestFont {
    fn identity(&self) -> FontIdentity {
        FontIdentity {
            family: self.name.clone(),
            subfamily: "Regular".to_string(),
        }
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        self.vertical_metrics
    }

    fn codepoints(&self) -> &BTreeSet<char> {
        &self.codepoints
    }

    fn glyph_metrics(&self, codepoint: char) -> Option<GlyphMetrics> {
        self.glyphs.get(&codepoint).copied()
    }

    fn kerning_pairs(&self) -> Arc<KerningPairs> {
        if !self.kerning_delay.is_zero() {
            std::thread::sleep(self.kerning_delay);
        }
        Arc::clone(&self.kerning)
    }

    fn draw(
        &self,
        codepoint: char,
        surface: &mut Surface<'_>,
        x: i32,
        y: i32,
        colors: DrawColors,
    ) -> bool {
        let Some(metrics) = self.glyphs.get(&codepoint) else {
            return false;
        };
        if !self.draw_delay.is_zero() {
            std::thread::sleep(self.draw_delay);
        }
        let width = metrics.width() as usize;
        let coverage = vec![Self::pixel_value(codepoint); width * metrics.height() as usize];
        surface.blit_coverage(&coverage, width, x + metrics.left(), y + metrics.top(), colors);
        true
    }

    fn glyph_id(&self, codepoint: char) -> Option<GlyphId> {
        self.glyphs
            .contains_key(&codepoint)
            .then(|| GlyphId::new(self.source, codepoint as u32, self.size))
    }

    fn codepoint_of(&self, glyph_id: &GlyphId) -> Option<char> {
        if glyph_id.source() != self.source {
            return None;
        }
        char::from_u32(glyph_id.glyph_index()).filter(|ch| self.glyphs.contains_key(ch))
    }

    fn thread_safe_view(&self) -> Arc<dyn FontSource> {
        Arc::new(self.clone())
    }
}
