use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::font_source::FontSource;
use crate::merged_font::{MergeMode, MergedFont, MergedLayer};
use crate::packer::{CompileHandle, FontPacker, PackerConfig};
use crate::wrapping_font::{WrapModifiers, WrappingFont};

/// One configured layer of a [`Face`].
///
/// The wrapped font is built on first use and rebuilt after any setter.
pub struct FaceElement {
    source: Arc<dyn FontSource>,
    wrap_modifiers: WrapModifiers,
    merge_mode: MergeMode,
    gamma: f32,
    wrapped: Mutex<Option<Arc<WrappingFont>>>,
}

impl FaceElement {
    /// A layer showing every codepoint of `source` unchanged.
    pub fn new(source: Arc<dyn FontSource>) -> Self {
        Self {
            source,
            wrap_modifiers: WrapModifiers::all(),
            merge_mode: MergeMode::default(),
            gamma: 1.0,
            wrapped: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &Arc<dyn FontSource> {
        &self.source
    }

    pub fn wrap_modifiers(&self) -> &WrapModifiers {
        &self.wrap_modifiers
    }

    pub fn merge_mode(&self) -> MergeMode {
        self.merge_mode
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// The source wrapped with the current modifiers.
    pub fn wrapped_font(&self) -> Result<Arc<WrappingFont>> {
        let mut cache = self.wrapped.lock();
        if let Some(font) = &*cache {
            return Ok(Arc::clone(font));
        }
        let font = Arc::new(WrappingFont::new(Arc::clone(&self.source), &self.wrap_modifiers)?);
        *cache = Some(Arc::clone(&font));
        Ok(font)
    }
}

/// Setters
impl FaceElement {
    pub fn set_source(&mut self, source: Arc<dyn FontSource>) {
        self.source = source;
        self.invalidate();
    }

    /// Rejects invalid modifiers and keeps the previous ones.
    pub fn set_wrap_modifiers(&mut self, wrap_modifiers: WrapModifiers) -> Result<()> {
        wrap_modifiers.validate()?;
        self.wrap_modifiers = wrap_modifiers;
        self.invalidate();
        Ok(())
    }

    pub fn set_merge_mode(&mut self, merge_mode: MergeMode) {
        self.merge_mode = merge_mode;
    }

    pub fn set_gamma(&mut self, gamma: f32) -> Result<()> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(Error::InvalidGamma(gamma));
        }
        self.gamma = gamma;
        Ok(())
    }

    fn invalidate(&mut self) {
        *self.wrapped.get_mut() = None;
    }
}

/// A named output font composed of ordered layers.
///
/// Every mutation goes through `&mut self` and drops the cached
/// [`MergedFont`], so the next [`merged_font`](Self::merged_font) call sees
/// the new configuration.
pub struct Face {
    name: String,
    elements: Vec<FaceElement>,
    merged: Mutex<Option<Arc<MergedFont>>>,
}

impl Face {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
            merged: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn elements(&self) -> &[FaceElement] {
        &self.elements
    }

    pub fn push(&mut self, element: FaceElement) {
        self.elements.push(element);
        self.invalidate();
    }

    /// Inserts at `index`, clamped to the number of elements.
    pub fn insert(&mut self, index: usize, element: FaceElement) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        self.invalidate();
    }

    pub fn remove(&mut self, index: usize) -> Option<FaceElement> {
        if index >= self.elements.len() {
            return None;
        }
        self.invalidate();
        Some(self.elements.remove(index))
    }

    /// Moves the element at `from` so it ends up at `to`.
    pub fn move_element(&mut self, from: usize, to: usize) -> bool {
        let len = self.elements.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let element = self.elements.remove(from);
            self.elements.insert(to, element);
            self.invalidate();
        }
        true
    }

    /// Mutable access to one element. The merged font is rebuilt afterwards.
    pub fn element_mut(&mut self, index: usize) -> Option<&mut FaceElement> {
        self.invalidate();
        self.elements.get_mut(index)
    }

    pub fn merged_font(&self) -> Result<Arc<MergedFont>> {
        let mut cache = self.merged.lock();
        if let Some(font) = &*cache {
            return Ok(Arc::clone(font));
        }

        let mut layers = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            let font: Arc<dyn FontSource> = element.wrapped_font()?;
            layers.push(MergedLayer {
                font,
                mode: element.merge_mode,
                gamma: element.gamma,
            });
        }
        let font = Arc::new(MergedFont::new(layers)?);
        *cache = Some(Arc::clone(&font));
        Ok(font)
    }

    fn invalidate(&mut self) {
        *self.merged.get_mut() = None;
    }
}

/// Faces compiled together onto shared texture pages.
pub struct FontSet {
    faces: Vec<Face>,
    config: PackerConfig,
}

impl Default for FontSet {
    fn default() -> Self {
        Self {
            faces: Vec::new(),
            config: PackerConfig::default(),
        }
    }
}

impl FontSet {
    pub fn new(config: PackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            faces: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PackerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}

/// Faces
impl FontSet {
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face(&self, name: &str) -> Option<&Face> {
        self.faces.iter().find(|face| face.name == name)
    }

    pub fn face_mut(&mut self, name: &str) -> Option<&mut Face> {
        self.faces.iter_mut().find(|face| face.name == name)
    }

    pub fn push_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn remove_face(&mut self, name: &str) -> Option<Face> {
        let index = self.faces.iter().position(|face| face.name == name)?;
        Some(self.faces.remove(index))
    }
}

impl FontSet {
    /// Resolves every face and starts packing them.
    ///
    /// Configuration errors are returned here; everything that happens after
    /// the packer starts is reported through the handle.
    pub fn compile(&self) -> Result<CompileHandle> {
        log::info!("Loading base fonts...");
        let mut packer = FontPacker::new(self.config.clone())?;
        for face in &self.faces {
            packer.add_font(face.name.clone(), face.merged_font()?);
        }
        Ok(packer.compile())
    }
}
