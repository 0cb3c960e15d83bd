use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bitmap::{DrawColors, Surface};
use crate::error::{Error, Result};
use crate::font_source::{FontIdentity, FontSource, KerningPairs, VerticalMetrics};
use crate::glyph_id::GlyphId;
use crate::glyph_metrics::GlyphMetrics;

/// How a layer claims codepoints already provided by earlier layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MergeMode {
    /// Only codepoints no earlier layer provides are taken.
    #[default]
    AddNew,
    /// Every codepoint of the layer is taken, overriding earlier layers.
    AddAll,
    /// Like `AddAll`; kerning pairs of the overridden codepoints are rebuilt
    /// from this layer alone.
    Replace,
}

/// One input of a [`MergedFont`].
#[derive(Clone)]
pub struct MergedLayer {
    pub font: Arc<dyn FontSource>,
    pub mode: MergeMode,
    /// Gamma applied to this layer's coverage when packed.
    pub gamma: f32,
}

impl MergedLayer {
    pub fn new(font: Arc<dyn FontSource>, mode: MergeMode) -> Self {
        Self {
            font,
            mode,
            gamma: 1.0,
        }
    }
}

/// Several layers flattened into one logical font.
///
/// Each codepoint is owned by exactly one layer, decided when the font is
/// built. Lookups dispatch to the owner. Vertical metrics and identity come
/// from the first layer.
pub struct MergedFont {
    layers: Vec<MergedLayer>,
    codepoints: BTreeSet<char>,
    owners: BTreeMap<char, usize>,
    kerning: Arc<Mutex<Option<Arc<KerningPairs>>>>,
}

impl MergedFont {
    pub fn new(layers: Vec<MergedLayer>) -> Result<Self> {
        if let Some(layer) = layers
            .iter()
            .find(|layer| !(layer.gamma.is_finite() && layer.gamma > 0.0))
        {
            return Err(Error::InvalidGamma(layer.gamma));
        }

        let mut owners = BTreeMap::new();
        for (index, layer) in layers.iter().enumerate() {
            for &codepoint in layer.font.codepoints() {
                match layer.mode {
                    MergeMode::AddNew => {
                        owners.entry(codepoint).or_insert(index);
                    }
                    MergeMode::AddAll | MergeMode::Replace => {
                        owners.insert(codepoint, index);
                    }
                }
            }
        }
        let codepoints = owners.keys().copied().collect();

        Ok(Self {
            layers,
            codepoints,
            owners,
            kerning: Arc::new(Mutex::new(None)),
        })
    }

    pub fn layers(&self) -> &[MergedLayer] {
        &self.layers
    }

    /// Index of the layer that provides `codepoint`.
    pub fn owner_of(&self, codepoint: char) -> Option<usize> {
        self.owners.get(&codepoint).copied()
    }

    fn owner(&self, codepoint: char) -> Option<&MergedLayer> {
        self.layers.get(self.owner_of(codepoint)?)
    }

    /// Gamma of the layer that provides `codepoint`.
    pub fn gamma(&self, codepoint: char) -> f32 {
        self.owner(codepoint).map_or(1.0, |layer| layer.gamma)
    }

    /// A view whose layers are thread safe views of this font's layers.
    pub fn thread_safe_clone(&self) -> Self {
        Self {
            layers: self
                .layers
                .iter()
                .map(|layer| MergedLayer {
                    font: layer.font.thread_safe_view(),
                    ..layer.clone()
                })
                .collect(),
            codepoints: self.codepoints.clone(),
            owners: self.owners.clone(),
            kerning: Arc::clone(&self.kerning),
        }
    }

    /// Union of each layer's pairs whose both sides are owned by that layer.
    ///
    /// A pair that touches a codepoint taken over by a later `AddAll` or
    /// `Replace` layer is therefore dropped, and the new owner's own pairs
    /// for it are used instead.
    fn compute_kerning(&self) -> KerningPairs {
        let mut pairs = KerningPairs::new();
        for (index, layer) in self.layers.iter().enumerate() {
            let layer_pairs = layer.font.kerning_pairs();
            let owned = layer_pairs.iter().filter(|((left, right), _)| {
                self.owner_of(*left) == Some(index) && self.owner_of(*right) == Some(index)
            });
            let before = pairs.len();
            pairs.extend(owned.map(|(&key, &value)| (key, value)));
            log::trace!(
                "layer {index}: kept {} of {} kerning pairs",
                pairs.len() - before,
                layer_pairs.len()
            );
        }
        pairs
    }
}

impl FontSource for MergedFont {
    fn identity(&self) -> FontIdentity {
        self.layers
            .first()
            .map(|layer| layer.font.identity())
            .unwrap_or_default()
    }

    fn size(&self) -> f32 {
        self.layers.first().map_or(0.0, |layer| layer.font.size())
    }

    fn vertical_metrics(&self) -> VerticalMetrics {
        self.layers
            .first()
            .map(|layer| layer.font.vertical_metrics())
            .unwrap_or_default()
    }

    fn codepoints(&self) -> &BTreeSet<char> {
        &self.codepoints
    }

    fn glyph_metrics(&self, codepoint: char) -> Option<GlyphMetrics> {
        self.owner(codepoint)?.font.glyph_metrics(codepoint)
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
        self.owner(codepoint)
            .is_some_and(|layer| layer.font.draw(codepoint, surface, x, y, colors))
    }

    fn glyph_id(&self, codepoint: char) -> Option<GlyphId> {
        self.owner(codepoint)?.font.glyph_id(codepoint)
    }

    fn codepoint_of(&self, glyph_id: &GlyphId) -> Option<char> {
        self.layers.iter().enumerate().find_map(|(index, layer)| {
            layer
                .font
                .codepoint_of(glyph_id)
                .filter(|&codepoint| self.owner_of(codepoint) == Some(index))
        })
    }

    fn thread_safe_view(&self) -> Arc<dyn FontSource> {
        Arc::new(self.thread_safe_clone())
    }
}
