//! Fixed-layout, little-endian glyph and kerning table.
//!
//! ```text
//! file header     32 bytes  "fcsv0100", font header offset, kerning header offset
//! font header     32 bytes  "fthd0000", counts, page size, font size, line metrics
//! glyph records   16 bytes each, sorted by codepoint
//! kerning header  16 bytes  "knhd0000", count
//! kerning records 16 bytes each, sorted by (left, right)
//! ```

use bytemuck::{Pod, Zeroable};
use euclid::{Box2D, Point2D, UnknownUnit};

use crate::error::{Error, Result};

const FILE_MAGIC: [u8; 8] = *b"fcsv0100";
const FONT_MAGIC: [u8; 8] = *b"fthd0000";
const KERNING_MAGIC: [u8; 8] = *b"knhd0000";

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FileHeader {
    magic: [u8; 8],
    font_header_offset: u32,
    kerning_header_offset: u32,
    reserved: [u8; 16],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FontHeader {
    magic: [u8; 8],
    glyph_count: u32,
    kerning_count: u16,
    reserved: u16,
    page_width: u16,
    page_height: u16,
    size: u32, // f32 bits
    line_height: u32,
    ascent: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct GlyphRecord {
    codepoint: u32,
    page: u16,
    x: u16,
    y: u16,
    width: u8,
    height: u8,
    offset_x: i8,
    offset_y: i8,
    advance_delta: i8,
    reserved: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct KerningHeader {
    magic: [u8; 8],
    count: u32,
    reserved: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct KerningRecord {
    left: u32,
    right: u32,
    adjustment: i32,
    reserved: u32,
}

/// One glyph of a packed font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphEntry {
    pub codepoint: char,
    pub page: u16,
    pub x: u16,
    pub y: u16,
    pub width: u8,
    pub height: u8,
    /// Left bearing.
    pub offset_x: i8,
    /// Top of the ink relative to the line top.
    pub offset_y: i8,
    /// `advance - offset_x - width`.
    pub advance_delta: i8,
}

impl GlyphEntry {
    pub fn advance(&self) -> i32 {
        self.offset_x as i32 + self.width as i32 + self.advance_delta as i32
    }

    /// Page-local rectangle of the glyph bitmap.
    pub fn rect(&self) -> Box2D<u32, UnknownUnit> {
        let (x, y) = (self.x as u32, self.y as u32);
        Box2D::new(
            Point2D::new(x, y),
            Point2D::new(x + self.width as u32, y + self.height as u32),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KerningEntry {
    pub left: char,
    pub right: char,
    pub adjustment: i32,
}

/// Decoded glyph table of one face.
#[derive(Clone, Debug, PartialEq)]
pub struct FontTable {
    pub name: String,
    pub size: f32,
    pub ascent: u32,
    pub line_height: u32,
    pub page_width: u16,
    pub page_height: u16,
    /// Sorted by codepoint.
    pub glyphs: Vec<GlyphEntry>,
    /// Sorted by `(left, right)`; at most `u16::MAX` entries.
    pub kerning: Vec<KerningEntry>,
}

impl FontTable {
    pub fn glyph(&self, codepoint: char) -> Option<&GlyphEntry> {
        self.glyphs
            .binary_search_by_key(&codepoint, |glyph| glyph.codepoint)
            .ok()
            .map(|index| &self.glyphs[index])
    }

    /// Adjustment between two adjacent codepoints, zero when there is no pair.
    pub fn kerning(&self, left: char, right: char) -> i32 {
        self.kerning
            .binary_search_by_key(&(left, right), |entry| (entry.left, entry.right))
            .map_or(0, |index| self.kerning[index].adjustment)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let file_header_len = size_of::<FileHeader>();
        let font_header_len = size_of::<FontHeader>();
        let kerning_header_offset = file_header_len
            + font_header_len
            + self.glyphs.len() * size_of::<GlyphRecord>();

        let file_header = FileHeader {
            magic: FILE_MAGIC,
            font_header_offset: (file_header_len as u32).to_le(),
            kerning_header_offset: (kerning_header_offset as u32).to_le(),
            reserved: [0; 16],
        };
        let font_header = FontHeader {
            magic: FONT_MAGIC,
            glyph_count: (self.glyphs.len() as u32).to_le(),
            kerning_count: (self.kerning.len().min(u16::MAX as usize) as u16).to_le(),
            reserved: 0,
            page_width: self.page_width.to_le(),
            page_height: self.page_height.to_le(),
            size: self.size.to_bits().to_le(),
            line_height: self.line_height.to_le(),
            ascent: self.ascent.to_le(),
        };
        let kerning_header = KerningHeader {
            magic: KERNING_MAGIC,
            count: (self.kerning.len() as u32).to_le(),
            reserved: 0,
        };

        let mut bytes = Vec::with_capacity(
            kerning_header_offset
                + size_of::<KerningHeader>()
                + self.kerning.len() * size_of::<KerningRecord>(),
        );
        bytes.extend_from_slice(bytemuck::bytes_of(&file_header));
        bytes.extend_from_slice(bytemuck::bytes_of(&font_header));
        for glyph in &self.glyphs {
            let record = GlyphRecord {
                codepoint: (glyph.codepoint as u32).to_le(),
                page: glyph.page.to_le(),
                x: glyph.x.to_le(),
                y: glyph.y.to_le(),
                width: glyph.width,
                height: glyph.height,
                offset_x: glyph.offset_x,
                offset_y: glyph.offset_y,
                advance_delta: glyph.advance_delta,
                reserved: 0,
            };
            bytes.extend_from_slice(bytemuck::bytes_of(&record));
        }
        bytes.extend_from_slice(bytemuck::bytes_of(&kerning_header));
        for entry in &self.kerning {
            let record = KerningRecord {
                left: (entry.left as u32).to_le(),
                right: (entry.right as u32).to_le(),
                adjustment: entry.adjustment.to_le(),
                reserved: 0,
            };
            bytes.extend_from_slice(bytemuck::bytes_of(&record));
        }
        bytes
    }

    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let file_header: FileHeader = read(bytes, 0)?;
        if file_header.magic != FILE_MAGIC {
            return Err(Error::Malformed("bad file magic"));
        }

        let font_offset = u32::from_le(file_header.font_header_offset) as usize;
        let font_header: FontHeader = read(bytes, font_offset)?;
        if font_header.magic != FONT_MAGIC {
            return Err(Error::Malformed("bad font header magic"));
        }

        let glyph_count = u32::from_le(font_header.glyph_count) as usize;
        let glyphs_offset = font_offset + size_of::<FontHeader>();
        let mut glyphs = Vec::with_capacity(glyph_count.min(bytes.len() / size_of::<GlyphRecord>()));
        for index in 0..glyph_count {
            let record: GlyphRecord = read(bytes, glyphs_offset + index * size_of::<GlyphRecord>())?;
            glyphs.push(GlyphEntry {
                codepoint: decode_char(record.codepoint)?,
                page: u16::from_le(record.page),
                x: u16::from_le(record.x),
                y: u16::from_le(record.y),
                width: record.width,
                height: record.height,
                offset_x: record.offset_x,
                offset_y: record.offset_y,
                advance_delta: record.advance_delta,
            });
        }

        let kerning_offset = u32::from_le(file_header.kerning_header_offset) as usize;
        let kerning_header: KerningHeader = read(bytes, kerning_offset)?;
        if kerning_header.magic != KERNING_MAGIC {
            return Err(Error::Malformed("bad kerning header magic"));
        }
        let kerning_count = u32::from_le(kerning_header.count) as usize;
        if kerning_count != u16::from_le(font_header.kerning_count) as usize {
            return Err(Error::Malformed("kerning counts disagree"));
        }
        let records_offset = kerning_offset + size_of::<KerningHeader>();
        let mut kerning = Vec::with_capacity(kerning_count);
        for index in 0..kerning_count {
            let record: KerningRecord =
                read(bytes, records_offset + index * size_of::<KerningRecord>())?;
            kerning.push(KerningEntry {
                left: decode_char(record.left)?,
                right: decode_char(record.right)?,
                adjustment: i32::from_le(record.adjustment),
            });
        }

        Ok(Self {
            name: name.into(),
            size: f32::from_bits(u32::from_le(font_header.size)),
            ascent: u32::from_le(font_header.ascent),
            line_height: u32::from_le(font_header.line_height),
            page_width: u16::from_le(font_header.page_width),
            page_height: u16::from_le(font_header.page_height),
            glyphs,
            kerning,
        })
    }
}

fn read<T: Pod>(bytes: &[u8], offset: usize) -> Result<T> {
    let end = offset
        .checked_add(size_of::<T>())
        .ok_or(Error::Malformed("offset overflow"))?;
    let slice = bytes
        .get(offset..end)
        .ok_or(Error::Malformed("unexpected end of data"))?;
    bytemuck::try_pod_read_unaligned(slice).map_err(|_| Error::Malformed("misaligned record"))
}

fn decode_char(value: u32) -> Result<char> {
    char::from_u32(u32::from_le(value)).ok_or(Error::Malformed("invalid codepoint"))
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FontTable {
        FontTable {
            name: "AXIS_12".to_string(),
            size: 12.5,
            ascent: 10,
            line_height: 15,
            page_width: 1024,
            page_height: 1024,
            glyphs: vec![
                GlyphEntry {
                    codepoint: 'A',
                    page: 0,
                    x: 1,
                    y: 2,
                    width: 7,
                    height: 9,
                    offset_x: 0,
                    offset_y: 1,
                    advance_delta: 1,
                },
                GlyphEntry {
                    codepoint: 'あ',
                    page: 3,
                    x: 300,
                    y: 513,
                    width: 12,
                    height: 12,
                    offset_x: -1,
                    offset_y: 0,
                    advance_delta: 2,
                },
            ],
            kerning: vec![KerningEntry {
                left: 'A',
                right: 'V',
                adjustment: -2,
            }],
        }
    }

    #[test]
    fn records_have_fixed_sizes() {
        assert_eq!(size_of::<FileHeader>(), 32);
        assert_eq!(size_of::<FontHeader>(), 32);
        assert_eq!(size_of::<GlyphRecord>(), 16);
        assert_eq!(size_of::<KerningHeader>(), 16);
        assert_eq!(size_of::<KerningRecord>(), 16);
    }

    #[test]
    fn layout_is_little_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), 32 + 32 + 2 * 16 + 16 + 16);
        assert_eq!(&bytes[0..8], b"fcsv0100");
        assert_eq!(&bytes[8..12], &32u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &96u32.to_le_bytes());
        assert_eq!(&bytes[32..40], b"fthd0000");
        assert_eq!(&bytes[40..44], &2u32.to_le_bytes());
        assert_eq!(&bytes[44..46], &1u16.to_le_bytes());
        // second glyph record: codepoint, page, x
        assert_eq!(&bytes[80..84], &('あ' as u32).to_le_bytes());
        assert_eq!(&bytes[84..86], &3u16.to_le_bytes());
        assert_eq!(&bytes[86..88], &300u16.to_le_bytes());
        assert_eq!(bytes[92] as i8, -1);
        assert_eq!(&bytes[96..104], b"knhd0000");
        assert_eq!(&bytes[120..124], &(-2i32).to_le_bytes());
    }

    #[test]
    fn parse_restores_table() {
        let table = sample();
        let parsed = FontTable::from_bytes("AXIS_12", &table.to_bytes()).unwrap();
        assert_eq!(parsed, table);
        assert_eq!(parsed.glyph('あ').unwrap().advance(), 13);
        assert_eq!(parsed.kerning('A', 'V'), -2);
        assert_eq!(parsed.kerning('V', 'A'), 0);
        assert!(parsed.glyph('B').is_none());
    }

    #[test]
    fn truncated_or_foreign_data_is_rejected() {
        let bytes = sample().to_bytes();
        assert_eq!(
            FontTable::from_bytes("x", &bytes[..bytes.len() - 1]).err(),
            Some(Error::Malformed("unexpected end of data"))
        );

        let mut foreign = bytes.clone();
        foreign[0] = b'x';
        assert_eq!(
            FontTable::from_bytes("x", &foreign).err(),
            Some(Error::Malformed("bad file magic"))
        );
    }
}
