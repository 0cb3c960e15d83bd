use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::font_source::{FontIdentity, FontdueFont};
use crate::glyph_id::SourceKey;

/// Locates font faces with `fontdb` and opens them as [`FontdueFont`] sources.
///
/// Parsed `fontdue` fonts are cached per face, so opening the same face at
/// several sizes parses the file once.
pub struct FontStorage {
    /// Every face known to fontdb.
    font_db: fontdb::Database,
    /// Parsed fontdue fonts keyed by face.
    /// Not all faces in `font_db` are necessarily parsed here.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }
}

/// Loading fonts into fontdb.
impl FontStorage {
    /// Loads a font from binary data.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) {
        self.font_db.load_font_data(data.into());
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&mut self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_db.load_font_file(path)
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&mut self, dir: PathBuf) {
        self.font_db.load_fonts_dir(dir)
    }

    /// Loads the system fonts.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
    }

    /// Removes a face by ID, dropping its parsed font.
    pub fn remove_face(&mut self, id: fontdb::ID) {
        self.font_db.remove_face(id);
        self.loaded_font.remove(&id);
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    /// Returns the number of known faces.
    pub fn len(&self) -> usize {
        self.font_db.len()
    }

    /// Iterates over the faces known to fontdb.
    pub fn faces(&self) -> impl Iterator<Item = &fontdb::FaceInfo> {
        self.font_db.faces()
    }
}

/// Opening font sources.
impl FontStorage {
    /// Opens the best face matching `query` at `size` pixels.
    pub fn open_query(&mut self, query: &fontdb::Query, size: f32) -> Option<FontdueFont> {
        let id = self.font_db.query(query)?;
        self.open(id, size)
    }

    /// Opens a face at `size` pixels, parsing it on first use.
    pub fn open(&mut self, id: fontdb::ID, size: f32) -> Option<FontdueFont> {
        let font = self.font(id)?;
        let face = self.font_db.face(id)?;

        let source = SourceKey::from_hashable(&(face.post_script_name.as_str(), face.index));
        let identity = FontIdentity {
            family: face
                .families
                .first()
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| face.post_script_name.clone()),
            subfamily: subfamily_name(face.weight, face.style),
        };

        Some(FontdueFont::new(font, source, identity, size))
    }

    /// Returns the parsed font of a face, loading it on first use.
    fn font(&mut self, id: fontdb::ID) -> Option<Arc<fontdue::Font>> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self.font_db.with_face_data(id, |data, index| {
                    fontdue::Font::from_bytes(
                        data,
                        fontdue::FontSettings {
                            collection_index: index,
                            scale: 40.0,
                            load_substitutions: false,
                        },
                    )
                })?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Some(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        None
                    }
                }
            }
        }
    }
}

fn subfamily_name(weight: fontdb::Weight, style: fontdb::Style) -> String {
    let weight = match weight.0 {
        0..=149 => "Thin",
        150..=249 => "ExtraLight",
        250..=349 => "Light",
        350..=449 => "Regular",
        450..=549 => "Medium",
        550..=649 => "SemiBold",
        650..=749 => "Bold",
        750..=849 => "ExtraBold",
        _ => "Black",
    };
    match style {
        fontdb::Style::Normal => weight.to_string(),
        fontdb::Style::Italic if weight == "Regular" => "Italic".to_string(),
        fontdb::Style::Italic => format!("{weight} Italic"),
        fontdb::Style::Oblique if weight == "Regular" => "Oblique".to_string(),
        fontdb::Style::Oblique => format!("{weight} Oblique"),
    }
}
