use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{FontIdentity, FontSource, KerningPairs, VerticalMetrics};
use crate::bitmap::{DrawColors, Surface};
use crate::glyph_id::{GlyphId, SourceKey};
use crate::glyph_metrics::GlyphMetrics;

struct Inner {
    font: Arc<fontdue::Font>,
    source: SourceKey,
    identity: FontIdentity,
    size: f32,
    vertical_metrics: VerticalMetrics,
    codepoints: BTreeSet<char>,
    /// glyph index -> smallest codepoint that maps to it
    glyph_to_codepoint: HashMap<u16, char, fxhash::FxBuildHasher>,
    kerning: Mutex<Option<Arc<KerningPairs>>>,
}

/// A font face rasterized by `fontdue` at one pixel size.
///
/// Cloning is cheap and clones share the parsed font as well as the lazily
/// computed kerning table. `fontdue` rasterizes through `&self`, so the
/// thread safe view is just another handle.
#[derive(Clone)]
pub struct FontdueFont {
    inner: Arc<Inner>,
}

impl FontdueFont {
    pub fn new(
        font: Arc<fontdue::Font>,
        source: SourceKey,
        identity: FontIdentity,
        size: f32,
    ) -> Self {
        let vertical_metrics = font
            .horizontal_line_metrics(size)
            .map(|line| VerticalMetrics {
                ascent: line.ascent.round() as i32,
                line_height: (line.ascent - line.descent + line.line_gap).round() as i32,
            })
            .unwrap_or_default();

        let mut codepoints = BTreeSet::new();
        let mut glyph_to_codepoint =
            HashMap::with_capacity_and_hasher(font.chars().len(), fxhash::FxBuildHasher::default());
        for (&ch, &index) in font.chars() {
            codepoints.insert(ch);
            glyph_to_codepoint
                .entry(index.get())
                .and_modify(|existing: &mut char| *existing = (*existing).min(ch))
                .or_insert(ch);
        }

        Self {
            inner: Arc::new(Inner {
                font,
                source,
                identity,
                size,
                vertical_metrics,
                codepoints,
                glyph_to_codepoint,
                kerning: Mutex::new(None),
            }),
        }
    }

    pub fn font(&self) -> &Arc<fontdue::Font> {
        &self.inner.font
    }

    pub fn source_key(&self) -> SourceKey {
        self.inner.source
    }

    fn glyph_index(&self, codepoint: char) -> Option<u16> {
        if !self.inner.codepoints.contains(&codepoint) {
            return None;
        }
        Some(self.inner.font.lookup_glyph_index(codepoint))
    }

    fn convert_metrics(&self, metrics: &fontdue::Metrics) -> GlyphMetrics {
        let left = metrics.xmin;
        let top = self.inner.vertical_metrics.ascent - (metrics.ymin + metrics.height as i32);
        GlyphMetrics::new(
            left,
            top,
            left + metrics.width as i32,
            top + metrics.height as i32,
            metrics.advance_width.round() as i32,
        )
    }

    fn compute_kerning<'a>(&self, codepoints: impl Iterator<Item = &'a char>) -> KerningPairs {
        let font = &self.inner.font;
        let size = self.inner.size;
        let glyphs: Vec<(char, u16)> = codepoints
            .filter_map(|&ch| self.glyph_index(ch).map(|index| (ch, index)))
            .filter(|&(_, index)| index != 0)
            .collect();

        let mut pairs = KerningPairs::new();
        for &(left, left_index) in &glyphs {
            for &(right, right_index) in &glyphs {
                let Some(kern) = font.horizontal_kern_indexed(left_index, right_index, size)
                else {
                    continue;
                };
                let kern = kern.round() as i32;
                if kern != 0 {
                    pairs.insert((left, right), kern);
                }
            }
        }

        log::debug!(
            "{} {}: {} kerning pairs among {} glyphs at {}px",
            self.inner.identity.family,
            self.inner.identity.subfamily,
            pairs.len(),
            glyphs.len(),
            size
        );
        pairs
    }
}

impl FontSource for FontdueFont {
    fn identity(&self) -> FontIdentity {
        self.inner.identity.clone()
    }

    fn size(&self) -> f32 {
        self.inner.size
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        self.inner.vertical_metrics
    }

    fn codepoints(&self) -> &BTreeSet<char> {
        &self.inner.codepoints
    }

    fn glyph_metrics(&self, codepoint: char) -> Option<GlyphMetrics> {
        let index = self.glyph_index(codepoint)?;
        let metrics = self.inner.font.metrics_indexed(index, self.inner.size);
        Some(self.convert_metrics(&metrics))
    }

    fn kerning_pairs(&self) -> Arc<KerningPairs> {
        let mut cache = self.inner.kerning.lock();
        if let Some(pairs) = &*cache {
            return Arc::clone(pairs);
        }
        let pairs = Arc::new(self.compute_kerning(self.inner.codepoints.iter()));
        *cache = Some(Arc::clone(&pairs));
        pairs
    }

    fn kerning_pairs_within(&self, codepoints: &BTreeSet<char>) -> KerningPairs {
        if let Some(pairs) = &*self.inner.kerning.lock() {
            return pairs
                .iter()
                .filter(|((left, right), _)| codepoints.contains(left) && codepoints.contains(right))
                .map(|(&pair, &value)| (pair, value))
                .collect();
        }
        self.compute_kerning(codepoints.iter())
    }

    fn draw(
        &self,
        codepoint: char,
        surface: &mut Surface<'_>,
        x: i32,
        y: i32,
        colors: DrawColors,
    ) -> bool {
        let Some(index) = self.glyph_index(codepoint) else {
            return false;
        };

        let (metrics, coverage) = self.inner.font.rasterize_indexed(index, self.inner.size);
        let placed = self.convert_metrics(&metrics);
        surface.blit_coverage(
            &coverage,
            metrics.width,
            x + placed.left(),
            y + placed.top(),
            colors,
        );
        true
    }

    fn glyph_id(&self, codepoint: char) -> Option<GlyphId> {
        let index = self.glyph_index(codepoint)?;
        Some(GlyphId::new(self.inner.source, index as u32, self.inner.size))
    }

    fn codepoint_of(&self, glyph_id: &GlyphId) -> Option<char> {
        if glyph_id.source() != self.inner.source
            || *glyph_id != GlyphId::new(self.inner.source, glyph_id.glyph_index(), self.inner.size)
        {
            return None;
        }
        let index = u16::try_from(glyph_id.glyph_index()).ok()?;
        self.inner.glyph_to_codepoint.get(&index).copied()
    }

    fn thread_safe_view(&self) -> Arc<dyn FontSource> {
        Arc::new(self.clone())
    }
}
