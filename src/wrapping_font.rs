use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bitmap::{DrawColors, Surface};
use crate::error::{Error, Result};
use crate::font_source::{FontIdentity, FontSource, KerningPairs, VerticalMetrics};
use crate::glyph_id::GlyphId;
use crate::glyph_metrics::GlyphMetrics;
use crate::unicode_blocks::{self, NegativeLsbGroup};

/// Per-layer codepoint filter and geometric adjustment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrapModifiers {
    /// Inclusive ranges; a codepoint is visible when any range covers it.
    pub codepoints: Vec<(char, char)>,
    /// Codepoint to the codepoint whose glyph it should borrow.
    pub replacements: BTreeMap<char, char>,
    pub letter_spacing: i32,
    pub horizontal_offset: i32,
    pub baseline_shift: i32,
}

impl WrapModifiers {
    /// Modifiers that let every codepoint through unchanged.
    pub fn all() -> Self {
        Self::default().with_range('\0', char::MAX)
    }

    pub fn with_range(mut self, first: char, last: char) -> Self {
        self.codepoints.push((first, last));
        self
    }

    pub fn with_replacement(mut self, from: char, to: char) -> Self {
        self.replacements.insert(from, to);
        self
    }

    pub fn covers(&self, codepoint: char) -> bool {
        self.codepoints
            .iter()
            .any(|&(first, last)| first <= codepoint && codepoint <= last)
    }

    /// Rejects empty or inverted ranges and replacement cycles.
    pub fn validate(&self) -> Result<()> {
        if self.codepoints.is_empty() {
            return Err(Error::EmptyCodepointRanges);
        }
        if let Some(&(first, last)) = self.codepoints.iter().find(|(first, last)| first > last) {
            return Err(Error::InvertedCodepointRange { first, last });
        }

        // every chain either leaves the table or revisits a codepoint
        for &start in self.replacements.keys() {
            let mut seen = BTreeSet::from([start]);
            let mut current = start;
            while let Some(&next) = self.replacements.get(&current) {
                if !seen.insert(next) {
                    return Err(Error::CyclicRemap(start));
                }
                current = next;
            }
        }
        Ok(())
    }
}

struct WrapInfo {
    codepoints: BTreeSet<char>,
    /// Replacements whose source codepoint survived the filter.
    mapped: BTreeMap<char, char>,
    letter_spacing: i32,
    horizontal_offset: i32,
    baseline_shift: i32,
}

impl WrapInfo {
    fn translate(&self, mut codepoint: char) -> char {
        while let Some(&next) = self.mapped.get(&codepoint) {
            codepoint = next;
        }
        codepoint
    }

    /// Applies offsets to source metrics.
    ///
    /// Ink that would start left of the origin is pulled back to it and the
    /// advance widened by the same amount. Returns the horizontal shift that
    /// was applied and, when clamping happened, the (negative) residual
    /// `left + horizontal_offset`.
    fn place(&self, metrics: &mut GlyphMetrics) -> (i32, Option<i32>) {
        let remaining = metrics.left() + self.horizontal_offset;
        if remaining >= 0 {
            metrics.translate(self.horizontal_offset, self.baseline_shift);
            metrics.advance += self.letter_spacing;
            (self.horizontal_offset, None)
        } else {
            let shift = -metrics.left();
            metrics.translate(shift, self.baseline_shift);
            metrics.advance += self.letter_spacing + shift;
            (shift, Some(remaining))
        }
    }
}

/// Decorates one [`FontSource`] with a codepoint filter, a replacement table,
/// and spacing adjustments.
///
/// The kerning table is the source's own table plus pairs synthesized for
/// glyphs whose ink was pulled right of a negative left bearing; it is built
/// on first use and shared by every view of this font.
pub struct WrappingFont {
    source: Arc<dyn FontSource>,
    info: Arc<WrapInfo>,
    kerning: Arc<Mutex<Option<Arc<KerningPairs>>>>,
}

impl WrappingFont {
    pub fn new(source: Arc<dyn FontSource>, modifiers: &WrapModifiers) -> Result<Self> {
        modifiers.validate()?;

        let codepoints: BTreeSet<char> = source
            .codepoints()
            .iter()
            .copied()
            .filter(|&c| modifiers.covers(c))
            .collect();
        let mapped = modifiers
            .replacements
            .iter()
            .filter(|(from, _)| codepoints.contains(from))
            .map(|(&from, &to)| (from, to))
            .collect();

        Ok(Self {
            source,
            info: Arc::new(WrapInfo {
                codepoints,
                mapped,
                letter_spacing: modifiers.letter_spacing,
                horizontal_offset: modifiers.horizontal_offset,
                baseline_shift: modifiers.baseline_shift,
            }),
            kerning: Arc::new(Mutex::new(None)),
        })
    }

    pub fn source(&self) -> &Arc<dyn FontSource> {
        &self.source
    }

    /// Follows the replacement table to the codepoint actually drawn.
    pub fn translate(&self, codepoint: char) -> char {
        self.info.translate(codepoint)
    }

    fn compute_kerning(&self) -> KerningPairs {
        let info = &self.info;

        // drawn codepoint -> every visible codepoint that borrows it
        let mut reverse_mapped: BTreeMap<char, BTreeSet<char>> = BTreeMap::new();
        let mut negative_lsb: BTreeMap<NegativeLsbGroup, BTreeMap<char, i32>> = BTreeMap::new();

        for &codepoint in &info.codepoints {
            let mapped = info.translate(codepoint);
            reverse_mapped.entry(mapped).or_default().insert(codepoint);

            if mapped < ' ' {
                continue;
            }
            let Some(mut metrics) = self.source.glyph_metrics(mapped) else {
                continue;
            };
            let (_, Some(remaining)) = info.place(&mut metrics) else {
                continue;
            };
            let Some(block) = unicode_blocks::block_of(mapped) else {
                continue;
            };
            if block.negative_lsb_group == NegativeLsbGroup::None || block.used_with_combining {
                continue;
            }
            negative_lsb
                .entry(block.negative_lsb_group)
                .or_default()
                .insert(mapped, remaining);
        }

        let mut pairs = self.source.kerning_pairs_within(&info.codepoints);
        for (&group, chars) in &negative_lsb {
            for (&right, &offset) in chars {
                let Some(right_unmapped) = reverse_mapped.get(&right) else {
                    continue;
                };
                for block in unicode_blocks::BLOCKS
                    .iter()
                    .filter(|block| block.combines_before(group))
                {
                    for (_, left_unmapped) in reverse_mapped.range(block.first..=block.last) {
                        for &left_visible in left_unmapped {
                            for &right_visible in right_unmapped {
                                *pairs.entry((left_visible, right_visible)).or_insert(0) += offset;
                            }
                        }
                    }
                }
            }
        }

        pairs.retain(|(left, right), value| {
            *value != 0 && info.codepoints.contains(left) && info.codepoints.contains(right)
        });
        pairs
    }
}

impl FontSource for WrappingFont {
    fn identity(&self) -> FontIdentity {
        self.source.identity()
    }

    fn size(&self) -> f32 {
        self.source.size()
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        self.source.vertical_metrics()
    }

    fn codepoints(&self) -> &BTreeSet<char> {
        &self.info.codepoints
    }

    fn glyph_metrics(&self, codepoint: char) -> Option<GlyphMetrics> {
        if !self.info.codepoints.contains(&codepoint) {
            return None;
        }
        let mut metrics = self.source.glyph_metrics(self.info.translate(codepoint))?;
        self.info.place(&mut metrics);
        Some(metrics)
    }

    fn kerning_pairs(&self) -> Arc<KerningPairs> {
        let mut cache = self.kerning.lock();
        if let Some(pairs) = &*cache {
            return Arc::clone(pairs);
        }
        let pairs = Arc::new(self.compute_kerning());
        *cache = Some(Arc::clone(&pairs));
        pairs
    }

    fn draw(
        &self,
        codepoint: char,
        surface: &mut Surface<'_>,
        x: i32,
        y: i32,
        colors: DrawColors,
    ) -> bool {
        if !self.info.codepoints.contains(&codepoint) {
            return false;
        }
        let codepoint = self.info.translate(codepoint);
        let Some(mut metrics) = self.source.glyph_metrics(codepoint) else {
            return false;
        };
        let (shift, _) = self.info.place(&mut metrics);
        self.source.draw(
            codepoint,
            surface,
            x + shift,
            y + self.info.baseline_shift,
            colors,
        )
    }

    fn glyph_id(&self, codepoint: char) -> Option<GlyphId> {
        if !self.info.codepoints.contains(&codepoint) {
            return None;
        }
        self.source.glyph_id(self.info.translate(codepoint))
    }

    fn codepoint_of(&self, glyph_id: &GlyphId) -> Option<char> {
        let codepoint = self.source.codepoint_of(glyph_id)?;
        if self.info.codepoints.contains(&codepoint) && self.info.translate(codepoint) == codepoint {
            return Some(codepoint);
        }
        // the glyph may only be reachable through a replacement
        self.info
            .mapped
            .keys()
            .copied()
            .find(|&visible| self.info.translate(visible) == codepoint)
    }

    fn thread_safe_view(&self) -> Arc<dyn FontSource> {
        Arc::new(Self {
            source: self.source.thread_safe_view(),
            info: Arc::clone(&self.info),
            kerning: Arc::clone(&self.kerning),
        })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::AlphaBitmap;
    use crate::font_source::test_font::TestFont;

    fn latin() -> TestFont {
        TestFont::new("Latin")
            .glyph('A', 1, 2, 8, 10, 10)
            .glyph('B', 1, 2, 7, 10, 9)
            .glyph('j', -3, 4, 5, 12, 4)
            .glyph('a', 0, 5, 6, 7, 7)
            .glyph('\u{0301}', -6, 0, 4, 3, 0)
            .glyph('カ', -2, 1, 14, 14, 16)
            .glyph('キ', 0, 1, 14, 14, 16)
            .kern('A', 'B', -1)
            .kern('A', 'a', 0)
    }

    #[test]
    fn filter_keeps_covered_source_codepoints() {
        let modifiers = WrapModifiers::default()
            .with_range('A', 'Z')
            .with_range('a', 'c')
            .with_range('B', 'C')
            .with_range('x', 'z');
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();

        let expected: BTreeSet<char> = ['A', 'B', 'a'].into();
        assert_eq!(font.codepoints(), &expected);
        for &ch in font.codepoints() {
            assert!(font.source().contains(ch));
            assert!(modifiers.covers(ch));
        }
        assert!(font.glyph_metrics('j').is_none());
        assert!(font.glyph_id('j').is_none());
    }

    #[test]
    fn empty_and_inverted_ranges_are_rejected() {
        assert_eq!(
            WrappingFont::new(latin().shared(), &WrapModifiers::default()).err(),
            Some(Error::EmptyCodepointRanges)
        );
        let inverted = WrapModifiers::default().with_range('z', 'a');
        assert_eq!(
            WrappingFont::new(latin().shared(), &inverted).err(),
            Some(Error::InvertedCodepointRange {
                first: 'z',
                last: 'a'
            })
        );
    }

    #[test]
    fn cyclic_replacements_are_rejected() {
        let modifiers = WrapModifiers::all()
            .with_replacement('A', 'B')
            .with_replacement('B', 'a')
            .with_replacement('a', 'A');
        assert!(matches!(
            WrappingFont::new(latin().shared(), &modifiers),
            Err(Error::CyclicRemap(_))
        ));

        let self_loop = WrapModifiers::all().with_replacement('A', 'A');
        assert_eq!(
            WrappingFont::new(latin().shared(), &self_loop).err(),
            Some(Error::CyclicRemap('A'))
        );
    }

    #[test]
    fn replacement_chains_resolve_to_a_fixed_point() {
        let modifiers = WrapModifiers::all()
            .with_replacement('A', 'B')
            .with_replacement('B', 'a');
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();

        assert_eq!(font.translate('A'), 'a');
        assert_eq!(font.glyph_metrics('A'), font.glyph_metrics('a'));
        assert_eq!(font.glyph_id('A'), font.glyph_id('a'));
        assert_eq!(font.translate('j'), 'j');
    }

    #[test]
    fn positive_bearing_is_offset() {
        let modifiers = WrapModifiers {
            letter_spacing: 2,
            horizontal_offset: 1,
            baseline_shift: -1,
            ..WrapModifiers::all()
        };
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();

        let metrics = font.glyph_metrics('A').unwrap();
        assert_eq!((metrics.left(), metrics.top()), (2, 1));
        assert_eq!(metrics.advance, 12);
    }

    #[test]
    fn negative_bearing_is_clamped_to_origin() {
        let modifiers = WrapModifiers {
            letter_spacing: 2,
            ..WrapModifiers::all()
        };
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();

        let metrics = font.glyph_metrics('j').unwrap();
        assert_eq!(metrics.left(), 0);
        assert_eq!(metrics.right(), 5);
        // 4 + 2 - (-3)
        assert_eq!(metrics.advance, 9);
    }

    #[test]
    fn source_pairs_pass_through_and_zero_pairs_drop() {
        let font = WrappingFont::new(latin().shared(), &WrapModifiers::all()).unwrap();
        let pairs = font.kerning_pairs();

        assert_eq!(pairs.get(&('A', 'B')), Some(&-1));
        assert!(!pairs.contains_key(&('A', 'a')));
    }

    #[test]
    fn pairs_outside_the_filter_drop() {
        let modifiers = WrapModifiers::default().with_range('A', 'A');
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();
        assert!(font.kerning_pairs().is_empty());
    }

    #[test]
    fn clamped_combining_mark_gets_pairs_with_base_letters() {
        let font = WrappingFont::new(latin().shared(), &WrapModifiers::all()).unwrap();
        let pairs = font.kerning_pairs();

        // U+0301 has left -6, so every latin letter before it is pulled back
        for left in ['A', 'B', 'a', 'j'] {
            assert_eq!(pairs.get(&(left, '\u{0301}')), Some(&-6), "{left}");
        }
        // kana are not used with combining marks
        assert!(!pairs.contains_key(&('カ', '\u{0301}')));
        assert!(!pairs.contains_key(&('キ', '\u{0301}')));
    }

    #[test]
    fn clamped_kana_pairs_with_its_own_group() {
        let font = WrappingFont::new(latin().shared(), &WrapModifiers::all()).unwrap();
        let pairs = font.kerning_pairs();

        assert_eq!(pairs.get(&('キ', 'カ')), Some(&-2));
        assert_eq!(pairs.get(&('カ', 'カ')), Some(&-2));
        assert!(!pairs.contains_key(&('A', 'カ')));
        // latin letters are never compensated, only combining marks and CJK are
        assert!(!pairs.keys().any(|&(_, right)| right == 'j'));
    }

    #[test]
    fn clamped_supplementary_ideograph_pairs_with_kana() {
        let source = latin()
            .glyph('\u{20BB7}', -2, 1, 14, 14, 16)
            .glyph('\u{3190}', 0, 1, 8, 8, 16);
        let font = WrappingFont::new(source.shared(), &WrapModifiers::all()).unwrap();
        let pairs = font.kerning_pairs();

        assert_eq!(pairs.get(&('キ', '\u{20BB7}')), Some(&-2));
        assert_eq!(pairs.get(&('\u{3190}', '\u{20BB7}')), Some(&-2));
        assert_eq!(pairs.get(&('\u{20BB7}', 'カ')), Some(&-2));
        assert!(!pairs.contains_key(&('A', '\u{20BB7}')));
    }

    #[test]
    fn synthesized_pairs_use_unmapped_codepoints() {
        let modifiers = WrapModifiers::all().with_replacement('B', '\u{0301}');
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();
        let pairs = font.kerning_pairs();

        assert_eq!(pairs.get(&('A', 'B')), Some(&-7));
        assert_eq!(pairs.get(&('A', '\u{0301}')), Some(&-6));
    }

    #[test]
    fn offset_absorbs_negative_bearing() {
        let modifiers = WrapModifiers {
            horizontal_offset: 6,
            ..WrapModifiers::all()
        };
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();
        assert!(!font.kerning_pairs().keys().any(|&(_, right)| right == '\u{0301}'));
    }

    #[test]
    fn draw_applies_clamp_and_shift() {
        let modifiers = WrapModifiers {
            baseline_shift: 1,
            ..WrapModifiers::all()
        };
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();
        let mut bitmap = AlphaBitmap::new(16, 20);
        assert!(font.draw('j', &mut Surface::Alpha(&mut bitmap), 0, 0, DrawColors::default()));

        let value = TestFont::pixel_value('j');
        // ink starts at x = 0 and y = 4 + 1
        assert_eq!(bitmap.get(0, 5), Some(value));
        assert_eq!(bitmap.get(4, 16), Some(value));
        assert_eq!(bitmap.get(5, 5), Some(0));
        assert_eq!(bitmap.get(0, 4), Some(0));

        assert!(!font.draw('Z', &mut Surface::Alpha(&mut bitmap), 0, 0, DrawColors::default()));
    }

    #[test]
    fn glyph_id_round_trips_through_replacements() {
        let modifiers = WrapModifiers::default()
            .with_range('A', 'A')
            .with_replacement('A', 'B');
        let font = WrappingFont::new(latin().shared(), &modifiers).unwrap();

        let id = font.glyph_id('A').unwrap();
        assert_eq!(font.codepoint_of(&id), Some('A'));
    }

    #[test]
    fn codepoint_of_skips_replaced_codepoints() {
        let modifiers = WrapModifiers::all().with_replacement('A', 'B');
        let source = latin();
        let font = WrappingFont::new(source.clone().shared(), &modifiers).unwrap();

        // 'A' draws glyph B here, so the source's own 'A' glyph has no codepoint
        let own_a = source.glyph_id('A').unwrap();
        assert_eq!(font.codepoint_of(&own_a), None);

        let b = font.glyph_id('B').unwrap();
        assert_eq!(font.glyph_id('A'), Some(b));
        assert_eq!(font.codepoint_of(&b), Some('B'));
        for codepoint in ['a', 'j', 'カ'] {
            let id = font.glyph_id(codepoint).unwrap();
            assert_eq!(font.codepoint_of(&id), Some(codepoint));
        }
    }
}
