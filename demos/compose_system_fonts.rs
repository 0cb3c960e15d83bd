use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{ImageBuffer, Luma};
use yosegi::{
    CompileOutcome, EmptyFont, Face, FaceElement, FontSet, FontStorage, MergeMode, PackerConfig,
    WrapModifiers,
    fontdb::{self, Family, Query},
};

const FONT_SIZE: f32 = 24.0;

fn open_family(storage: &mut FontStorage, family: Family<'_>) -> Option<yosegi::FontdueFont> {
    let families = [family];
    let query = Query {
        families: &families,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    storage.open_query(&query, FONT_SIZE)
}

#[allow(clippy::unwrap_used)]
fn main() {
    let mut storage = FontStorage::new();
    storage.load_system_fonts();
    assert!(!storage.is_empty(), "system fonts are required for this demo");

    let sans = open_family(&mut storage, Family::SansSerif).expect("no sans-serif font found");
    let mono = open_family(&mut storage, Family::Monospace).unwrap_or_else(|| sans.clone());
    println!("Base layer: {:?}", yosegi::FontSource::identity(&sans));
    println!("Digit layer: {:?}", yosegi::FontSource::identity(&mono));

    // pin the line metrics, take letters from the sans face and digits from the monospace one
    let mut face = Face::new("Composite_24");
    face.push(FaceElement::new(Arc::new(EmptyFont::new(FONT_SIZE, 19, 28))));

    let mut letters = FaceElement::new(Arc::new(sans));
    letters
        .set_wrap_modifiers(WrapModifiers::default().with_range(' ', '\u{024F}'))
        .unwrap();
    face.push(letters);

    let mut digits = FaceElement::new(Arc::new(mono));
    digits
        .set_wrap_modifiers(WrapModifiers {
            letter_spacing: 1,
            ..WrapModifiers::default().with_range('0', '9')
        })
        .unwrap();
    digits.set_merge_mode(MergeMode::AddAll);
    digits.set_gamma(1.4).unwrap();
    face.push(digits);

    let mut set = FontSet::new(PackerConfig {
        side_length: 1024,
        ..PackerConfig::default()
    })
    .unwrap();
    set.push_face(face);

    let timer = Instant::now();
    let handle = set.compile().unwrap();
    while !handle.wait(Duration::from_millis(200)) {
        println!("{} {:?}", handle.progress_description(), handle.progress());
    }

    let compiled = match handle.join() {
        CompileOutcome::Completed(compiled) => compiled,
        CompileOutcome::Cancelled => {
            println!("Cancelled");
            return;
        }
        CompileOutcome::Failed(e) => panic!("{e}"),
    };
    println!("Compiled in {:.2?}", timer.elapsed());

    for table in &compiled.tables {
        let bytes = table.to_bytes();
        println!(
            "{}: {} glyphs, {} kerning pairs, {} bytes",
            table.name,
            table.glyphs.len(),
            table.kerning.len(),
            bytes.len()
        );
        std::fs::write(format!("{}.fdt", table.name), bytes).unwrap();
    }

    for (index, page) in compiled.pages.iter().enumerate() {
        let base = page.base();
        let image: ImageBuffer<Luma<u8>, _> =
            ImageBuffer::from_raw(base.width as u32, base.height as u32, base.pixels.clone())
                .unwrap();
        let path = format!("page_{index}.png");
        image.save(&path).unwrap();
        println!("Saved {path} ({} level(s))", page.levels.len());
    }
}
