//! Packs merged fonts into texture pages and binary glyph tables.
//!
//! A compile runs on its own thread through five phases:
//!
//! 1. every face's kerning table is resolved in parallel and checked against
//!    the 16-bit record limit,
//! 2. glyph bitmaps are deduplicated by [`GlyphId`] and gamma,
//! 3. distinct bitmaps are shelf packed, tallest first,
//! 4. pages are drawn in parallel,
//! 5. the per-face tables are built.
//!
//! The caller polls a [`CompileHandle`] for progress and may cancel at any
//! time; cancellation is checked before every kerning table and between
//! glyphs and pages.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use euclid::{Box2D, UnknownUnit};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::bitmap::{AlphaBitmap, DrawColors, Surface};
use crate::error::{Error, Result};
use crate::font_source::FontSource;
use crate::glyph_id::GlyphId;
use crate::glyph_metrics::GlyphMetrics;
use crate::merged_font::MergedFont;
use crate::worker_pool::WorkerPool;

mod font_table;
mod page;
mod shelf;

pub use font_table::{FontTable, GlyphEntry, KerningEntry};
pub use page::{GammaTable, TexturePage};
pub use shelf::{PAGE_MARGIN, Placement, ShelfPacker};

/// Largest kerning table a face may carry.
pub const MAX_KERNING_PAIRS: usize = u16::MAX as usize;

pub const MIN_SIDE_LENGTH: u32 = 16;
pub const MAX_SIDE_LENGTH: u32 = 32768;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackerConfig {
    /// Width and height of every page; a power of two.
    pub side_length: u32,
    /// Number of half-resolution levels generated below each page.
    pub discard_step: u32,
    /// Worker thread limit, `None` for the available parallelism.
    pub worker_threads: Option<NonZeroUsize>,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            side_length: 4096,
            discard_step: 1,
            worker_threads: None,
        }
    }
}

impl PackerConfig {
    pub fn validate(&self) -> Result<()> {
        let side = self.side_length;
        if !side.is_power_of_two() || !(MIN_SIDE_LENGTH..=MAX_SIDE_LENGTH).contains(&side) {
            return Err(Error::InvalidSideLength(side));
        }
        Ok(())
    }

    fn pool<K: Send + 'static, R: Send + 'static>(&self) -> WorkerPool<K, R> {
        match self.worker_threads {
            Some(threads) => WorkerPool::new(threads),
            None => WorkerPool::with_available_parallelism(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress {
    Indeterminate,
    /// In `[0, 1]`.
    Fraction(f32),
}

/// Result of a successful compile.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledFontSet {
    /// One table per face, in the order the faces were added.
    pub tables: Vec<FontTable>,
    pub pages: Vec<TexturePage>,
}

impl CompiledFontSet {
    pub fn table(&self, name: &str) -> Option<&FontTable> {
        self.tables.iter().find(|table| table.name == name)
    }
}

#[derive(Debug)]
pub enum CompileOutcome {
    Completed(CompiledFontSet),
    Cancelled,
    Failed(Error),
}

/// Collects the faces of one compile.
pub struct FontPacker {
    config: PackerConfig,
    fonts: Vec<(String, Arc<MergedFont>)>,
}

impl FontPacker {
    pub fn new(config: PackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fonts: Vec::new(),
        })
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    pub fn add_font(&mut self, name: impl Into<String>, font: Arc<MergedFont>) {
        self.fonts.push((name.into(), font));
    }

    /// Starts compiling on a background thread.
    pub fn compile(self) -> CompileHandle {
        let status = Arc::new(Status::new());
        let worker_status = Arc::clone(&status);
        let Self { config, fonts } = self;

        let spawned = thread::Builder::new()
            .name("yosegi-compile".to_string())
            .spawn(move || {
                let result = run(&fonts, &config, &worker_status);
                worker_status.publish(result);
            });

        let thread = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn compile thread: {e}");
                status.publish(Err(Error::ThreadSpawn(e.to_string())));
                None
            }
        };

        CompileHandle { status, thread }
    }
}

struct Status {
    description: Mutex<&'static str>,
    progress: Mutex<Progress>,
    steps: AtomicUsize,
    cancelled: AtomicBool,
    outcome: Mutex<Option<CompileOutcome>>,
    finished: Condvar,
}

impl Status {
    fn new() -> Self {
        Self {
            description: Mutex::new("Waiting..."),
            progress: Mutex::new(Progress::Indeterminate),
            steps: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            outcome: Mutex::new(None),
            finished: Condvar::new(),
        }
    }

    fn enter(&self, description: &'static str, progress: Progress) {
        log::debug!("{description}");
        *self.description.lock() = description;
        *self.progress.lock() = progress;
        self.steps.store(0, Ordering::Relaxed);
    }

    fn set_fraction(&self, done: usize, total: usize) {
        let fraction = if total == 0 {
            1.0
        } else {
            done as f32 / total as f32
        };
        *self.progress.lock() = Progress::Fraction(fraction);
    }

    /// Marks one of `total` parallel steps as finished.
    fn step(&self, total: usize) {
        let done = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        self.set_fraction(done, total);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn publish(&self, result: Result<Option<CompiledFontSet>>) {
        let mut outcome = self.outcome.lock();
        let value = match result {
            _ if self.cancelled.load(Ordering::SeqCst) => CompileOutcome::Cancelled,
            Ok(Some(set)) => CompileOutcome::Completed(set),
            Ok(None) => CompileOutcome::Cancelled,
            Err(e) => CompileOutcome::Failed(e),
        };
        let description = match &value {
            CompileOutcome::Completed(_) => "Done.",
            CompileOutcome::Cancelled => "Cancelled.",
            CompileOutcome::Failed(e) => {
                log::warn!("Compile failed: {e}");
                "Failed."
            }
        };
        *self.description.lock() = description;
        *self.progress.lock() = Progress::Fraction(1.0);
        *outcome = Some(value);
        self.finished.notify_all();
    }
}

/// Poll-based view of a running compile.
///
/// Dropping the handle cancels the compile and waits for its thread.
pub struct CompileHandle {
    status: Arc<Status>,
    thread: Option<JoinHandle<()>>,
}

impl CompileHandle {
    /// Waits up to `timeout` for the compile to finish. Returns whether it has.
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut outcome = self.status.outcome.lock();
        if outcome.is_none() {
            self.status.finished.wait_for(&mut outcome, timeout);
        }
        outcome.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.status.outcome.lock().is_some()
    }

    pub fn progress(&self) -> Progress {
        *self.status.progress.lock()
    }

    pub fn progress_description(&self) -> &'static str {
        *self.status.description.lock()
    }

    /// Requests cancellation. Has no effect once the compile has finished.
    pub fn cancel(&self) {
        let outcome = self.status.outcome.lock();
        if outcome.is_none() {
            self.status.cancelled.store(true, Ordering::SeqCst);
        }
    }

    /// Blocks until the compile finishes and returns its outcome.
    pub fn join(mut self) -> CompileOutcome {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Compile thread panicked");
            }
        }
        self.status
            .outcome
            .lock()
            .take()
            .unwrap_or(CompileOutcome::Failed(Error::WorkerPanicked("compiling")))
    }
}

impl Drop for CompileHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel();
            let _ = thread.join();
        }
    }
}

/// Content address of one bitmap on a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct BitmapKey {
    glyph: GlyphId,
    /// Gamma scaled by 1000.
    gamma: u32,
}

/// First face and codepoint that asked for a bitmap; used to draw it.
#[derive(Clone, Copy, Debug)]
struct BitmapRequest {
    face: usize,
    codepoint: char,
    metrics: GlyphMetrics,
    gamma: f32,
}

/// A codepoint of a face and the bitmap it uses, if it has ink.
struct GlyphSlot {
    codepoint: char,
    metrics: GlyphMetrics,
    key: Option<BitmapKey>,
}

type RequestMap = HashMap<BitmapKey, BitmapRequest, fxhash::FxBuildHasher>;

fn run(
    fonts: &[(String, Arc<MergedFont>)],
    config: &PackerConfig,
    status: &Arc<Status>,
) -> Result<Option<CompiledFontSet>> {
    check_kerning_limits(fonts, config, status)?;
    if status.is_cancelled() {
        return Ok(None);
    }

    status.enter("Deduplicating glyphs...", Progress::Indeterminate);
    let (layouts, requests) = deduplicate(fonts, config)?;
    if status.is_cancelled() {
        return Ok(None);
    }

    status.enter("Packing glyphs...", Progress::Fraction(0.0));
    let Some((placements, page_count)) = pack(fonts, config, &requests, status)? else {
        return Ok(None);
    };

    status.enter("Drawing glyphs...", Progress::Fraction(0.0));
    let Some(pages) = draw_pages(fonts, config, &requests, &placements, page_count, status)? else {
        return Ok(None);
    };

    status.enter("Building font tables...", Progress::Fraction(0.0));
    let mut tables = Vec::with_capacity(fonts.len());
    for (index, ((name, font), slots)) in fonts.iter().zip(&layouts).enumerate() {
        if status.is_cancelled() {
            return Ok(None);
        }
        tables.push(build_table(name, font, slots, &placements, config.side_length)?);
        status.set_fraction(index + 1, fonts.len());
    }

    log::info!(
        "Packed {} face(s), {} distinct glyph bitmap(s) onto {} page(s)",
        tables.len(),
        requests.len(),
        pages.len()
    );
    Ok(Some(CompiledFontSet { tables, pages }))
}

/// Resolves every face's kerning table in parallel and rejects the compile
/// when any of them is too large for a table.
fn check_kerning_limits(
    fonts: &[(String, Arc<MergedFont>)],
    config: &PackerConfig,
    status: &Arc<Status>,
) -> Result<()> {
    status.enter("Resolving kerning pairs...", Progress::Indeterminate);

    let mut pool = config.pool();
    for (index, (_, font)) in fonts.iter().enumerate() {
        let font = font.thread_safe_clone();
        let status = Arc::clone(status);
        pool.submit(index, move || {
            if status.is_cancelled() {
                return None;
            }
            Some(font.kerning_pairs().len())
        });
    }
    let counts = pool.wait_all();
    if status.is_cancelled() {
        return Ok(());
    }
    if counts.len() != fonts.len() {
        return Err(Error::WorkerPanicked("resolving kerning pairs"));
    }

    let mut overflowing: Vec<(String, usize)> = counts
        .into_iter()
        .filter_map(|(index, count)| Some((index, count?)))
        .filter(|&(_, count)| count > MAX_KERNING_PAIRS)
        .map(|(index, count)| (fonts[index].0.clone(), count))
        .collect();
    if overflowing.is_empty() {
        return Ok(());
    }
    overflowing.sort();
    Err(Error::TooManyKerningPairs(overflowing))
}

fn deduplicate(
    fonts: &[(String, Arc<MergedFont>)],
    config: &PackerConfig,
) -> Result<(Vec<Vec<GlyphSlot>>, RequestMap)> {
    let requests = Arc::new(RwLock::new(RequestMap::default()));

    let mut pool = config.pool();
    for (index, (_, font)) in fonts.iter().enumerate() {
        let font = font.thread_safe_clone();
        let requests = Arc::clone(&requests);
        pool.submit(index, move || collect_glyphs(index, &font, &requests));
    }
    let layouts: Vec<Vec<GlyphSlot>> = pool.wait_all().into_iter().map(|(_, slots)| slots).collect();
    if layouts.len() != fonts.len() {
        return Err(Error::WorkerPanicked("deduplicating glyphs"));
    }

    let requests = Arc::try_unwrap(requests)
        .map(RwLock::into_inner)
        .unwrap_or_else(|shared| shared.read().clone());
    Ok((layouts, requests))
}

fn collect_glyphs(face: usize, font: &MergedFont, requests: &RwLock<RequestMap>) -> Vec<GlyphSlot> {
    let mut slots = Vec::with_capacity(font.codepoints().len());
    for &codepoint in font.codepoints() {
        let Some(metrics) = font.glyph_metrics(codepoint) else {
            continue;
        };
        if metrics.is_empty() {
            slots.push(GlyphSlot {
                codepoint,
                metrics,
                key: None,
            });
            continue;
        }
        let Some(glyph) = font.glyph_id(codepoint) else {
            log::warn!("U+{:04X} has ink but no glyph id; skipped", codepoint as u32);
            continue;
        };

        let gamma = font.gamma(codepoint);
        let key = BitmapKey {
            glyph,
            gamma: (gamma * 1000.0).round() as u32,
        };
        if !requests.read().contains_key(&key) {
            requests.write().entry(key).or_insert(BitmapRequest {
                face,
                codepoint,
                metrics,
                gamma,
            });
        }
        slots.push(GlyphSlot {
            codepoint,
            metrics,
            key: Some(key),
        });
    }
    slots
}

type PlacementMap = HashMap<BitmapKey, Placement, fxhash::FxBuildHasher>;

fn pack(
    fonts: &[(String, Arc<MergedFont>)],
    config: &PackerConfig,
    requests: &RequestMap,
    status: &Status,
) -> Result<Option<(PlacementMap, usize)>> {
    let mut order: Vec<(&BitmapKey, &BitmapRequest)> = requests.iter().collect();
    order.sort_by(|(a_key, a), (b_key, b)| {
        b.metrics
            .height()
            .cmp(&a.metrics.height())
            .then(b.metrics.width().cmp(&a.metrics.width()))
            .then(a_key.cmp(b_key))
    });

    let mut packer = ShelfPacker::new(config.side_length);
    let mut placements = PlacementMap::default();
    for (index, (key, request)) in order.iter().enumerate() {
        if index % 256 == 0 {
            if status.is_cancelled() {
                return Ok(None);
            }
            status.set_fraction(index, order.len());
        }

        let (width, height) = (request.metrics.width(), request.metrics.height());
        let placement = packer.insert(width, height).ok_or_else(|| Error::GlyphTooLarge {
            face: fonts[request.face].0.clone(),
            codepoint: request.codepoint,
            width,
            height,
        })?;
        placements.insert(**key, placement);
    }

    if packer.page_count() == 0 {
        return Err(Error::NoPages);
    }
    Ok(Some((placements, packer.page_count())))
}

/// Draws every page on the worker pool. `None` when cancelled.
fn draw_pages(
    fonts: &[(String, Arc<MergedFont>)],
    config: &PackerConfig,
    requests: &RequestMap,
    placements: &PlacementMap,
    page_count: usize,
    status: &Arc<Status>,
) -> Result<Option<Vec<TexturePage>>> {
    let mut per_page: Vec<Vec<(BitmapRequest, Box2D<u32, UnknownUnit>)>> =
        vec![Vec::new(); page_count];
    for (key, request) in requests {
        if let Some(placement) = placements.get(key) {
            per_page[placement.page].push((*request, placement.rect));
        }
    }

    let mut pool = config.pool();
    for (index, glyphs) in per_page.into_iter().enumerate() {
        let views: Vec<MergedFont> = fonts.iter().map(|(_, font)| font.thread_safe_clone()).collect();
        let status = Arc::clone(status);
        let (side_length, discard_step) = (config.side_length, config.discard_step);
        pool.submit(index, move || {
            let page = draw_page(side_length, discard_step, &views, &glyphs, &status);
            status.step(page_count);
            page
        });
    }
    let pages = pool.wait_all();

    if status.is_cancelled() {
        return Ok(None);
    }
    if pages.len() != page_count {
        return Err(Error::WorkerPanicked("drawing glyphs"));
    }
    Ok(pages.into_iter().map(|(_, page)| page).collect())
}

fn draw_page(
    side_length: u32,
    discard_step: u32,
    fonts: &[MergedFont],
    glyphs: &[(BitmapRequest, Box2D<u32, UnknownUnit>)],
    status: &Status,
) -> Option<TexturePage> {
    let mut page = TexturePage::new(side_length);
    let mut gamma_tables: BTreeMap<u32, GammaTable> = BTreeMap::new();

    for (request, rect) in glyphs {
        if status.is_cancelled() {
            return None;
        }
        let metrics = &request.metrics;
        let mut bitmap = AlphaBitmap::new(metrics.width() as usize, metrics.height() as usize);
        let drawn = fonts[request.face].draw(
            request.codepoint,
            &mut Surface::Alpha(&mut bitmap),
            -metrics.left(),
            -metrics.top(),
            DrawColors::default(),
        );
        if !drawn {
            log::warn!("U+{:04X} failed to draw", request.codepoint as u32);
            continue;
        }

        gamma_tables
            .entry(request.gamma.to_bits())
            .or_insert_with(|| GammaTable::new(request.gamma))
            .apply(&mut bitmap.pixels);
        page.copy_from(&bitmap, *rect);
    }

    page.build_levels(discard_step);
    Some(page)
}

fn build_table(
    name: &str,
    font: &MergedFont,
    slots: &[GlyphSlot],
    placements: &PlacementMap,
    side_length: u32,
) -> Result<FontTable> {
    let mut glyphs = Vec::with_capacity(slots.len());
    for slot in slots {
        let placement = slot
            .key
            .and_then(|key| placements.get(&key).copied())
            .unwrap_or_else(Placement::empty);
        let entry = glyph_entry(slot, &placement).ok_or_else(|| Error::GlyphTooLarge {
            face: name.to_string(),
            codepoint: slot.codepoint,
            width: slot.metrics.width(),
            height: slot.metrics.height(),
        })?;
        glyphs.push(entry);
    }

    let has_glyph = |codepoint: char| {
        glyphs
            .binary_search_by_key(&codepoint, |glyph: &GlyphEntry| glyph.codepoint)
            .is_ok()
    };
    let kerning: Vec<KerningEntry> = font
        .kerning_pairs()
        .iter()
        .filter(|((left, right), _)| has_glyph(*left) && has_glyph(*right))
        .map(|(&(left, right), &adjustment)| KerningEntry {
            left,
            right,
            adjustment,
        })
        .collect();

    let vertical = font.vertical_metrics();
    Ok(FontTable {
        name: name.to_string(),
        size: font.size(),
        ascent: vertical.ascent.max(0) as u32,
        line_height: vertical.line_height.max(0) as u32,
        page_width: side_length as u16,
        page_height: side_length as u16,
        glyphs,
        kerning,
    })
}

/// `None` when a field does not fit its record.
fn glyph_entry(slot: &GlyphSlot, placement: &Placement) -> Option<GlyphEntry> {
    let metrics = &slot.metrics;
    let advance_delta = metrics.advance - metrics.left() - metrics.width() as i32;
    Some(GlyphEntry {
        codepoint: slot.codepoint,
        page: u16::try_from(placement.page).ok()?,
        x: u16::try_from(placement.rect.min.x).ok()?,
        y: u16::try_from(placement.rect.min.y).ok()?,
        width: u8::try_from(metrics.width()).ok()?,
        height: u8::try_from(metrics.height()).ok()?,
        offset_x: i8::try_from(metrics.left()).ok()?,
        offset_y: i8::try_from(metrics.top()).ok()?,
        advance_delta: i8::try_from(advance_delta).ok()?,
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::test_font::TestFont;
    use crate::merged_font::{MergeMode, MergedLayer};
    use crate::wrapping_font::{WrapModifiers, WrappingFont};

    fn config(side_length: u32) -> PackerConfig {
        PackerConfig {
            side_length,
            discard_step: 0,
            worker_threads: NonZeroUsize::new(2),
        }
    }

    fn single(font: Arc<dyn FontSource>) -> Arc<MergedFont> {
        Arc::new(MergedFont::new(vec![MergedLayer::new(font, MergeMode::AddNew)]).unwrap())
    }

    fn wrapped(source: &Arc<dyn FontSource>, modifiers: WrapModifiers) -> Arc<MergedFont> {
        let font = WrappingFont::new(Arc::clone(source), &modifiers).unwrap();
        single(Arc::new(font))
    }

    fn mixed_font() -> TestFont {
        TestFont::new("Mixed")
            .boxes('a'..='z', 5, 7)
            .boxes('A'..='Z', 7, 9)
            .glyph('g', 0, 4, 5, 9, 6)
            .glyph(' ', 0, 0, 0, 0, 4)
            .kern('A', 'V', -2)
    }

    fn compile(fonts: Vec<(&str, Arc<MergedFont>)>, config: PackerConfig) -> CompileOutcome {
        let mut packer = FontPacker::new(config).unwrap();
        for (name, font) in fonts {
            packer.add_font(name, font);
        }
        packer.compile().join()
    }

    fn completed(outcome: CompileOutcome) -> CompiledFontSet {
        match outcome {
            CompileOutcome::Completed(set) => set,
            other => panic!("expected a compiled set, got {other:?}"),
        }
    }

    #[test]
    fn side_length_is_validated() {
        for side in [0, 8, 1000, 65536] {
            assert_eq!(
                FontPacker::new(config(side)).err().map(|e| e.to_string()),
                Some(Error::InvalidSideLength(side).to_string())
            );
        }
        assert!(FontPacker::new(config(16)).is_ok());
        assert!(FontPacker::new(PackerConfig::default()).is_ok());
    }

    #[test]
    fn compiles_glyphs_onto_pages() {
        let set = completed(compile(vec![("Mixed", single(mixed_font().shared()))], config(64)));
        let table = set.table("Mixed").unwrap();

        assert_eq!(table.glyphs.len(), 53);
        assert_eq!((table.ascent, table.line_height), (12, 16));
        assert_eq!(table.page_width, 64);
        assert_eq!(table.kerning('A', 'V'), -2);

        let a = table.glyph('A').unwrap();
        assert_eq!((a.width, a.height, a.offset_x, a.offset_y), (7, 9, 0, 2));
        assert_eq!(a.advance(), 8);
        let base = set.pages[a.page as usize].base();
        for y in a.rect().y_range() {
            for x in a.rect().x_range() {
                assert_eq!(base.get(x as usize, y as usize), Some(TestFont::pixel_value('A')));
            }
        }
        // margin right of the glyph
        assert_eq!(base.get(a.rect().max.x as usize, a.y as usize), Some(0));
    }

    #[test]
    fn empty_glyphs_are_not_packed() {
        let set = completed(compile(vec![("Mixed", single(mixed_font().shared()))], config(64)));
        let space = set.table("Mixed").unwrap().glyph(' ').unwrap();
        assert_eq!((space.page, space.x, space.y, space.width, space.height), (0, 0, 0, 0, 0));
        assert_eq!(space.advance(), 4);
    }

    #[test]
    fn spills_onto_more_pages() {
        let set = completed(compile(vec![("Mixed", single(mixed_font().shared()))], config(32)));
        assert!(set.pages.len() > 1);
        let table = set.table("Mixed").unwrap();
        assert!(table.glyphs.iter().any(|glyph| glyph.page > 0));
    }

    #[test]
    fn packing_is_deterministic() {
        let source = mixed_font().shared();
        let faces = || {
            vec![
                ("Regular", wrapped(&source, WrapModifiers::all())),
                ("Lower", wrapped(&source, WrapModifiers::default().with_range('a', 'z'))),
            ]
        };
        let first = completed(compile(faces(), config(32)));
        let second = completed(compile(faces(), config(32)));
        assert_eq!(first, second);
    }

    #[test]
    fn shared_source_glyphs_share_rectangles() {
        let source = mixed_font().shared();
        let shifted = WrapModifiers {
            horizontal_offset: 2,
            baseline_shift: 1,
            ..WrapModifiers::all()
        };
        let set = completed(compile(
            vec![
                ("Plain", wrapped(&source, WrapModifiers::all())),
                ("Shifted", wrapped(&source, shifted)),
            ],
            config(64),
        ));

        let plain = set.table("Plain").unwrap().glyph('Q').unwrap();
        let moved = set.table("Shifted").unwrap().glyph('Q').unwrap();
        assert_eq!((plain.page, plain.rect()), (moved.page, moved.rect()));
        assert_eq!(moved.offset_x, plain.offset_x + 2);
        assert_eq!(moved.offset_y, plain.offset_y + 1);
    }

    #[test]
    fn different_gamma_gets_its_own_bitmap() {
        let source = mixed_font().shared();
        let mut layer = MergedLayer::new(Arc::clone(&source), MergeMode::AddNew);
        layer.gamma = 2.2;
        let corrected = Arc::new(MergedFont::new(vec![layer]).unwrap());

        let set = completed(compile(
            vec![("Linear", single(source)), ("Corrected", corrected)],
            config(64),
        ));
        let linear = set.table("Linear").unwrap().glyph('A').unwrap();
        let corrected = set.table("Corrected").unwrap().glyph('A').unwrap();
        assert_ne!((linear.page, linear.rect()), (corrected.page, corrected.rect()));

        let page = set.pages[corrected.page as usize].base();
        let value = page.get(corrected.x as usize, corrected.y as usize).unwrap();
        assert!(value > TestFont::pixel_value('A'));
    }

    #[test]
    fn discard_step_adds_reduced_levels() {
        let config = PackerConfig {
            discard_step: 2,
            ..config(64)
        };
        let set = completed(compile(vec![("Mixed", single(mixed_font().shared()))], config));
        let levels = &set.pages[0].levels;
        assert_eq!(levels.len(), 3);
        assert_eq!((levels[1].width, levels[2].width), (32, 16));
    }

    fn dense_kerning(name: &str, pairs: usize) -> Arc<MergedFont> {
        let chars: Vec<char> = (0x4E00..0x4F00).filter_map(char::from_u32).collect();
        let mut font = TestFont::new(name).boxes(chars.iter().copied(), 2, 2);
        let kerning = Arc::make_mut(&mut font.kerning);
        for &left in &chars {
            for &right in &chars {
                if kerning.len() == pairs {
                    break;
                }
                kerning.insert((left, right), -1);
            }
        }
        single(font.shared())
    }

    #[test]
    fn kerning_limit_is_inclusive() {
        let set = completed(compile(
            vec![("Full", dense_kerning("Full", MAX_KERNING_PAIRS))],
            config(256),
        ));
        let table = set.table("Full").unwrap();
        assert_eq!(table.kerning.len(), MAX_KERNING_PAIRS);

        let parsed = FontTable::from_bytes("Full", &table.to_bytes()).unwrap();
        assert_eq!(parsed.kerning.len(), MAX_KERNING_PAIRS);
    }

    #[test]
    fn kerning_overflow_names_every_face() {
        let outcome = compile(
            vec![
                ("Zeta", dense_kerning("Zeta", MAX_KERNING_PAIRS + 1)),
                ("Fine", single(mixed_font().shared())),
                ("Alpha", dense_kerning("Alpha", MAX_KERNING_PAIRS + 1)),
            ],
            config(256),
        );
        match outcome {
            CompileOutcome::Failed(Error::TooManyKerningPairs(faces)) => assert_eq!(
                faces,
                vec![("Alpha".to_string(), 65536), ("Zeta".to_string(), 65536)]
            ),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn empty_input_produces_no_pages() {
        let outcome = compile(vec![], config(64));
        assert!(matches!(outcome, CompileOutcome::Failed(Error::NoPages)));

        let blank = TestFont::new("Blank").glyph(' ', 0, 0, 0, 0, 4);
        let outcome = compile(vec![("Blank", single(blank.shared()))], config(64));
        assert!(matches!(outcome, CompileOutcome::Failed(Error::NoPages)));
    }

    #[test]
    fn oversized_glyph_fails() {
        let huge = TestFont::new("Huge").glyph('W', 0, 0, 40, 10, 41);
        let outcome = compile(vec![("Huge", single(huge.shared()))], config(32));
        match outcome {
            CompileOutcome::Failed(Error::GlyphTooLarge { face, codepoint, .. }) => {
                assert_eq!((face.as_str(), codepoint), ("Huge", 'W'));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        // fits the page but not the 8-bit record extent
        let wide = TestFont::new("Wide").glyph('W', 0, 0, 300, 10, 301);
        let outcome = compile(vec![("Wide", single(wide.shared()))], config(512));
        assert!(matches!(
            outcome,
            CompileOutcome::Failed(Error::GlyphTooLarge { width: 300, .. })
        ));
    }

    #[test]
    fn cancel_yields_cancelled() {
        let mut slow = mixed_font();
        slow.draw_delay = Duration::from_millis(20);
        let mut packer = FontPacker::new(config(64)).unwrap();
        packer.add_font("Slow", single(slow.shared()));

        let handle = packer.compile();
        handle.cancel();
        assert!(matches!(handle.join(), CompileOutcome::Cancelled));
    }

    #[test]
    fn cancel_skips_pending_kerning_tables() {
        let mut packer = FontPacker::new(PackerConfig {
            worker_threads: NonZeroUsize::new(1),
            ..config(64)
        })
        .unwrap();
        for name in ["One", "Two", "Three", "Four"] {
            let mut slow = TestFont::new(name).boxes('a'..='c', 4, 4);
            slow.kerning_delay = Duration::from_millis(400);
            packer.add_font(name, single(slow.shared()));
        }

        let handle = packer.compile();
        while handle.progress_description() != "Resolving kerning pairs..." {
            thread::sleep(Duration::from_millis(1));
        }
        let start = std::time::Instant::now();
        handle.cancel();
        assert!(matches!(handle.join(), CompileOutcome::Cancelled));
        // at most the table already being resolved finishes
        assert!(start.elapsed() < Duration::from_millis(1200), "{:?}", start.elapsed());
    }

    #[test]
    fn cancel_after_finish_keeps_result() {
        let mut packer = FontPacker::new(config(64)).unwrap();
        packer.add_font("Mixed", single(mixed_font().shared()));

        let handle = packer.compile();
        while !handle.wait(Duration::from_millis(200)) {}
        assert!(handle.is_finished());
        assert_eq!(handle.progress(), Progress::Fraction(1.0));
        assert_eq!(handle.progress_description(), "Done.");

        handle.cancel();
        assert!(matches!(handle.join(), CompileOutcome::Completed(_)));
    }
}
