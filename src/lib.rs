//! # Yosegi
//!
//! Composes layered bitmap fonts and packs their glyphs into texture pages.
//!
//! ## Overview
//!
//! A [`Face`] is an ordered list of [`FaceElement`]s. Each element wraps a
//! [`FontSource`] in a [`WrappingFont`] that filters and remaps codepoints and
//! adjusts spacing. The face flattens its elements into a [`MergedFont`],
//! where every codepoint has exactly one owning layer. A [`FontSet`] hands
//! its faces to the [`FontPacker`], which deduplicates glyph bitmaps across
//! faces, shelf packs them onto square pages and emits one binary
//! [`FontTable`] per face.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use yosegi::{
//!     CompileOutcome, Face, FaceElement, FontSet, FontStorage, PackerConfig,
//!     fontdb::{Family, Query},
//! };
//!
//! let mut storage = FontStorage::new();
//! storage.load_system_fonts();
//! let query = Query {
//!     families: &[Family::SansSerif],
//!     ..Default::default()
//! };
//! let font = storage.open_query(&query, 18.0).unwrap();
//!
//! let mut face = Face::new("Body_18");
//! face.push(FaceElement::new(std::sync::Arc::new(font)));
//!
//! let mut set = FontSet::new(PackerConfig::default()).unwrap();
//! set.push_face(face);
//!
//! let handle = set.compile().unwrap();
//! while !handle.wait(Duration::from_millis(200)) {
//!     println!("{} {:?}", handle.progress_description(), handle.progress());
//! }
//! if let CompileOutcome::Completed(compiled) = handle.join() {
//!     let bytes = compiled.tables[0].to_bytes();
//!     println!("{} bytes, {} page(s)", bytes.len(), compiled.pages.len());
//! }
//! ```

pub mod bitmap;
pub mod error;
pub mod face;
pub mod font_source;
pub mod font_storage;
pub mod glyph_id;
pub mod glyph_metrics;
pub mod merged_font;
pub mod packer;
pub mod unicode_blocks;
pub mod worker_pool;
pub mod wrapping_font;

// common re-exports
pub use bitmap::{AlphaBitmap, DrawColors, RgbaBitmap, Surface};
pub use error::{Error, Result};
pub use face::{Face, FaceElement, FontSet};
pub use font_source::{EmptyFont, FontSource, FontdueFont, KerningPairs};
pub use font_storage::FontStorage;
pub use glyph_id::GlyphId;
pub use glyph_metrics::GlyphMetrics;
pub use merged_font::{MergeMode, MergedFont, MergedLayer};
pub use packer::{
    CompileHandle, CompileOutcome, CompiledFontSet, FontPacker, FontTable, PackerConfig,
    Progress, TexturePage,
};
pub use worker_pool::WorkerPool;
pub use wrapping_font::{WrapModifiers, WrappingFont};

// re-export dependencies
pub use euclid;
pub use fontdb;
pub use fontdue;
pub use parking_lot;
