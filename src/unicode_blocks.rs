//! Unicode block table driving negative-bearing kerning synthesis.
//!
//! When a glyph's ink starts left of its origin, [`WrappingFont`] shifts it
//! right and widens its advance. To keep it visually attached to whatever
//! precedes it, kerning pairs are synthesized against every left-hand glyph
//! of a compatible block. Compatibility is expressed by
//! [`NegativeLsbGroup`] and the `used_with_combining` flag.
//!
//! [`WrappingFont`]: crate::WrappingFont

/// Family of blocks whose glyphs are expected to sit next to each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NegativeLsbGroup {
    /// Glyphs never receive compensating pairs.
    None,
    /// Combining marks; paired with blocks flagged `used_with_combining`.
    Combining,
    European,
    Cjk,
    Hangul,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnicodeBlock {
    pub first: char,
    pub last: char,
    pub name: &'static str,
    pub negative_lsb_group: NegativeLsbGroup,
    /// Base letters of this block commonly carry combining marks.
    pub used_with_combining: bool,
}

impl UnicodeBlock {
    pub fn contains(&self, codepoint: char) -> bool {
        self.first <= codepoint && codepoint <= self.last
    }

    /// Whether glyphs of this block precede glyphs of `group` in text, so
    /// they are candidates for the left side of a synthesized pair.
    pub fn combines_before(&self, group: NegativeLsbGroup) -> bool {
        match group {
            NegativeLsbGroup::None => false,
            NegativeLsbGroup::Combining => {
                self.negative_lsb_group == group || self.used_with_combining
            }
            _ => self.negative_lsb_group == group,
        }
    }
}

const fn block(
    first: char,
    last: char,
    name: &'static str,
    negative_lsb_group: NegativeLsbGroup,
    used_with_combining: bool,
) -> UnicodeBlock {
    UnicodeBlock {
        first,
        last,
        name,
        negative_lsb_group,
        used_with_combining,
    }
}

use NegativeLsbGroup::{Cjk, Combining, European, Hangul, None as NoGroup};

/// Blocks sorted by first codepoint, non-overlapping.
pub static BLOCKS: &[UnicodeBlock] = &[
    block('\u{0000}', '\u{007F}', "Basic Latin", European, true),
    block('\u{0080}', '\u{00FF}', "Latin-1 Supplement", European, true),
    block('\u{0100}', '\u{017F}', "Latin Extended-A", European, true),
    block('\u{0180}', '\u{024F}', "Latin Extended-B", European, true),
    block('\u{0250}', '\u{02AF}', "IPA Extensions", European, true),
    block('\u{02B0}', '\u{02FF}', "Spacing Modifier Letters", NoGroup, false),
    block('\u{0300}', '\u{036F}', "Combining Diacritical Marks", Combining, false),
    block('\u{0370}', '\u{03FF}', "Greek and Coptic", European, true),
    block('\u{0400}', '\u{04FF}', "Cyrillic", European, true),
    block('\u{0500}', '\u{052F}', "Cyrillic Supplement", European, true),
    block('\u{0530}', '\u{058F}', "Armenian", European, true),
    block('\u{0590}', '\u{05FF}', "Hebrew", NoGroup, false),
    block('\u{0600}', '\u{06FF}', "Arabic", NoGroup, false),
    block('\u{0700}', '\u{074F}', "Syriac", NoGroup, false),
    block('\u{0750}', '\u{077F}', "Arabic Supplement", NoGroup, false),
    block('\u{0780}', '\u{07BF}', "Thaana", NoGroup, false),
    block('\u{07C0}', '\u{07FF}', "NKo", NoGroup, false),
    block('\u{0800}', '\u{083F}', "Samaritan", NoGroup, false),
    block('\u{0840}', '\u{085F}', "Mandaic", NoGroup, false),
    block('\u{0860}', '\u{086F}', "Syriac Supplement", NoGroup, false),
    block('\u{0870}', '\u{089F}', "Arabic Extended-B", NoGroup, false),
    block('\u{08A0}', '\u{08FF}', "Arabic Extended-A", NoGroup, false),
    block('\u{0900}', '\u{097F}', "Devanagari", NoGroup, false),
    block('\u{0980}', '\u{09FF}', "Bengali", NoGroup, false),
    block('\u{0A00}', '\u{0A7F}', "Gurmukhi", NoGroup, false),
    block('\u{0A80}', '\u{0AFF}', "Gujarati", NoGroup, false),
    block('\u{0B00}', '\u{0B7F}', "Oriya", NoGroup, false),
    block('\u{0B80}', '\u{0BFF}', "Tamil", NoGroup, false),
    block('\u{0C00}', '\u{0C7F}', "Telugu", NoGroup, false),
    block('\u{0C80}', '\u{0CFF}', "Kannada", NoGroup, false),
    block('\u{0D00}', '\u{0D7F}', "Malayalam", NoGroup, false),
    block('\u{0D80}', '\u{0DFF}', "Sinhala", NoGroup, false),
    block('\u{0E00}', '\u{0E7F}', "Thai", NoGroup, false),
    block('\u{0E80}', '\u{0EFF}', "Lao", NoGroup, false),
    block('\u{0F00}', '\u{0FFF}', "Tibetan", NoGroup, false),
    block('\u{1000}', '\u{109F}', "Myanmar", NoGroup, false),
    block('\u{10A0}', '\u{10FF}', "Georgian", European, true),
    block('\u{1100}', '\u{11FF}', "Hangul Jamo", Hangul, false),
    block('\u{1200}', '\u{137F}', "Ethiopic", NoGroup, false),
    block('\u{1380}', '\u{139F}', "Ethiopic Supplement", NoGroup, false),
    block('\u{13A0}', '\u{13FF}', "Cherokee", NoGroup, false),
    block('\u{1400}', '\u{167F}', "Unified Canadian Aboriginal Syllabics", NoGroup, false),
    block('\u{1680}', '\u{169F}', "Ogham", NoGroup, false),
    block('\u{16A0}', '\u{16FF}', "Runic", NoGroup, false),
    block('\u{1700}', '\u{171F}', "Tagalog", NoGroup, false),
    block('\u{1720}', '\u{173F}', "Hanunoo", NoGroup, false),
    block('\u{1740}', '\u{175F}', "Buhid", NoGroup, false),
    block('\u{1760}', '\u{177F}', "Tagbanwa", NoGroup, false),
    block('\u{1780}', '\u{17FF}', "Khmer", NoGroup, false),
    block('\u{1800}', '\u{18AF}', "Mongolian", NoGroup, false),
    block('\u{18B0}', '\u{18FF}', "Unified Canadian Aboriginal Syllabics Extended", NoGroup, false),
    block('\u{1900}', '\u{194F}', "Limbu", NoGroup, false),
    block('\u{1950}', '\u{197F}', "Tai Le", NoGroup, false),
    block('\u{1980}', '\u{19DF}', "New Tai Lue", NoGroup, false),
    block('\u{19E0}', '\u{19FF}', "Khmer Symbols", NoGroup, false),
    block('\u{1A00}', '\u{1A1F}', "Buginese", NoGroup, false),
    block('\u{1A20}', '\u{1AAF}', "Tai Tham", NoGroup, false),
    block('\u{1AB0}', '\u{1AFF}', "Combining Diacritical Marks Extended", Combining, false),
    block('\u{1B00}', '\u{1B7F}', "Balinese", NoGroup, false),
    block('\u{1B80}', '\u{1BBF}', "Sundanese", NoGroup, false),
    block('\u{1BC0}', '\u{1BFF}', "Batak", NoGroup, false),
    block('\u{1C00}', '\u{1C4F}', "Lepcha", NoGroup, false),
    block('\u{1C50}', '\u{1C7F}', "Ol Chiki", NoGroup, false),
    block('\u{1C80}', '\u{1C8F}', "Cyrillic Extended-C", European, true),
    block('\u{1C90}', '\u{1CBF}', "Georgian Extended", European, true),
    block('\u{1CC0}', '\u{1CCF}', "Sundanese Supplement", NoGroup, false),
    block('\u{1CD0}', '\u{1CFF}', "Vedic Extensions", NoGroup, false),
    block('\u{1D00}', '\u{1D7F}', "Phonetic Extensions", European, true),
    block('\u{1D80}', '\u{1DBF}', "Phonetic Extensions Supplement", European, true),
    block('\u{1DC0}', '\u{1DFF}', "Combining Diacritical Marks Supplement", Combining, false),
    block('\u{1E00}', '\u{1EFF}', "Latin Extended Additional", European, true),
    block('\u{1F00}', '\u{1FFF}', "Greek Extended", European, true),
    block('\u{2000}', '\u{206F}', "General Punctuation", NoGroup, false),
    block('\u{2070}', '\u{209F}', "Superscripts and Subscripts", NoGroup, false),
    block('\u{20A0}', '\u{20CF}', "Currency Symbols", NoGroup, false),
    block('\u{20D0}', '\u{20FF}', "Combining Diacritical Marks for Symbols", Combining, false),
    block('\u{2100}', '\u{214F}', "Letterlike Symbols", NoGroup, false),
    block('\u{2150}', '\u{218F}', "Number Forms", NoGroup, false),
    block('\u{2190}', '\u{21FF}', "Arrows", NoGroup, false),
    block('\u{2200}', '\u{22FF}', "Mathematical Operators", NoGroup, false),
    block('\u{2300}', '\u{23FF}', "Miscellaneous Technical", NoGroup, false),
    block('\u{2400}', '\u{243F}', "Control Pictures", NoGroup, false),
    block('\u{2440}', '\u{245F}', "Optical Character Recognition", NoGroup, false),
    block('\u{2460}', '\u{24FF}', "Enclosed Alphanumerics", NoGroup, false),
    block('\u{2500}', '\u{257F}', "Box Drawing", NoGroup, false),
    block('\u{2580}', '\u{259F}', "Block Elements", NoGroup, false),
    block('\u{25A0}', '\u{25FF}', "Geometric Shapes", NoGroup, false),
    block('\u{2600}', '\u{26FF}', "Miscellaneous Symbols", NoGroup, false),
    block('\u{2700}', '\u{27BF}', "Dingbats", NoGroup, false),
    block('\u{27C0}', '\u{27EF}', "Miscellaneous Mathematical Symbols-A", NoGroup, false),
    block('\u{27F0}', '\u{27FF}', "Supplemental Arrows-A", NoGroup, false),
    block('\u{2800}', '\u{28FF}', "Braille Patterns", NoGroup, false),
    block('\u{2900}', '\u{297F}', "Supplemental Arrows-B", NoGroup, false),
    block('\u{2980}', '\u{29FF}', "Miscellaneous Mathematical Symbols-B", NoGroup, false),
    block('\u{2A00}', '\u{2AFF}', "Supplemental Mathematical Operators", NoGroup, false),
    block('\u{2B00}', '\u{2BFF}', "Miscellaneous Symbols and Arrows", NoGroup, false),
    block('\u{2C00}', '\u{2C5F}', "Glagolitic", European, true),
    block('\u{2C60}', '\u{2C7F}', "Latin Extended-C", European, true),
    block('\u{2C80}', '\u{2CFF}', "Coptic", European, true),
    block('\u{2D00}', '\u{2D2F}', "Georgian Supplement", European, true),
    block('\u{2D30}', '\u{2D7F}', "Tifinagh", NoGroup, false),
    block('\u{2D80}', '\u{2DDF}', "Ethiopic Extended", NoGroup, false),
    block('\u{2DE0}', '\u{2DFF}', "Cyrillic Extended-A", European, true),
    block('\u{2E00}', '\u{2E7F}', "Supplemental Punctuation", NoGroup, false),
    block('\u{2E80}', '\u{2EFF}', "CJK Radicals Supplement", Cjk, false),
    block('\u{2F00}', '\u{2FDF}', "Kangxi Radicals", Cjk, false),
    block('\u{2FF0}', '\u{2FFF}', "Ideographic Description Characters", Cjk, false),
    block('\u{3000}', '\u{303F}', "CJK Symbols and Punctuation", Cjk, false),
    block('\u{3040}', '\u{309F}', "Hiragana", Cjk, false),
    block('\u{30A0}', '\u{30FF}', "Katakana", Cjk, false),
    block('\u{3100}', '\u{312F}', "Bopomofo", Cjk, false),
    block('\u{3130}', '\u{318F}', "Hangul Compatibility Jamo", Hangul, false),
    block('\u{3190}', '\u{319F}', "Kanbun", Cjk, false),
    block('\u{31A0}', '\u{31BF}', "Bopomofo Extended", Cjk, false),
    block('\u{31C0}', '\u{31EF}', "CJK Strokes", Cjk, false),
    block('\u{31F0}', '\u{31FF}', "Katakana Phonetic Extensions", Cjk, false),
    block('\u{3200}', '\u{32FF}', "Enclosed CJK Letters and Months", Cjk, false),
    block('\u{3300}', '\u{33FF}', "CJK Compatibility", Cjk, false),
    block('\u{3400}', '\u{4DBF}', "CJK Unified Ideographs Extension A", Cjk, false),
    block('\u{4DC0}', '\u{4DFF}', "Yijing Hexagram Symbols", NoGroup, false),
    block('\u{4E00}', '\u{9FFF}', "CJK Unified Ideographs", Cjk, false),
    block('\u{A000}', '\u{A48F}', "Yi Syllables", NoGroup, false),
    block('\u{A490}', '\u{A4CF}', "Yi Radicals", NoGroup, false),
    block('\u{A4D0}', '\u{A4FF}', "Lisu", NoGroup, false),
    block('\u{A500}', '\u{A63F}', "Vai", NoGroup, false),
    block('\u{A640}', '\u{A69F}', "Cyrillic Extended-B", European, true),
    block('\u{A6A0}', '\u{A6FF}', "Bamum", NoGroup, false),
    block('\u{A700}', '\u{A71F}', "Modifier Tone Letters", NoGroup, false),
    block('\u{A720}', '\u{A7FF}', "Latin Extended-D", European, true),
    block('\u{A800}', '\u{A82F}', "Syloti Nagri", NoGroup, false),
    block('\u{A830}', '\u{A83F}', "Common Indic Number Forms", NoGroup, false),
    block('\u{A840}', '\u{A87F}', "Phags-pa", NoGroup, false),
    block('\u{A880}', '\u{A8DF}', "Saurashtra", NoGroup, false),
    block('\u{A8E0}', '\u{A8FF}', "Devanagari Extended", NoGroup, false),
    block('\u{A900}', '\u{A92F}', "Kayah Li", NoGroup, false),
    block('\u{A930}', '\u{A95F}', "Rejang", NoGroup, false),
    block('\u{A960}', '\u{A97F}', "Hangul Jamo Extended-A", Hangul, false),
    block('\u{A980}', '\u{A9DF}', "Javanese", NoGroup, false),
    block('\u{A9E0}', '\u{A9FF}', "Myanmar Extended-B", NoGroup, false),
    block('\u{AA00}', '\u{AA5F}', "Cham", NoGroup, false),
    block('\u{AA60}', '\u{AA7F}', "Myanmar Extended-A", NoGroup, false),
    block('\u{AA80}', '\u{AADF}', "Tai Viet", NoGroup, false),
    block('\u{AAE0}', '\u{AAFF}', "Meetei Mayek Extensions", NoGroup, false),
    block('\u{AB00}', '\u{AB2F}', "Ethiopic Extended-A", NoGroup, false),
    block('\u{AB30}', '\u{AB6F}', "Latin Extended-E", European, true),
    block('\u{AB70}', '\u{ABBF}', "Cherokee Supplement", NoGroup, false),
    block('\u{ABC0}', '\u{ABFF}', "Meetei Mayek", NoGroup, false),
    block('\u{AC00}', '\u{D7AF}', "Hangul Syllables", Hangul, false),
    block('\u{D7B0}', '\u{D7FF}', "Hangul Jamo Extended-B", Hangul, false),
    block('\u{E000}', '\u{F8FF}', "Private Use Area", NoGroup, false),
    block('\u{F900}', '\u{FAFF}', "CJK Compatibility Ideographs", Cjk, false),
    block('\u{FB00}', '\u{FB4F}', "Alphabetic Presentation Forms", NoGroup, false),
    block('\u{FB50}', '\u{FDFF}', "Arabic Presentation Forms-A", NoGroup, false),
    block('\u{FE00}', '\u{FE0F}', "Variation Selectors", NoGroup, false),
    block('\u{FE10}', '\u{FE1F}', "Vertical Forms", Cjk, false),
    block('\u{FE20}', '\u{FE2F}', "Combining Half Marks", Combining, false),
    block('\u{FE30}', '\u{FE4F}', "CJK Compatibility Forms", Cjk, false),
    block('\u{FE50}', '\u{FE6F}', "Small Form Variants", Cjk, false),
    block('\u{FE70}', '\u{FEFF}', "Arabic Presentation Forms-B", NoGroup, false),
    block('\u{FF00}', '\u{FFEF}', "Halfwidth and Fullwidth Forms", Cjk, false),
    block('\u{FFF0}', '\u{FFFF}', "Specials", NoGroup, false),
    block('\u{10780}', '\u{107BF}', "Latin Extended-F", European, true),
    block('\u{1AFF0}', '\u{1AFFF}', "Kana Extended-B", Cjk, false),
    block('\u{1B000}', '\u{1B0FF}', "Kana Supplement", Cjk, false),
    block('\u{1B100}', '\u{1B12F}', "Kana Extended-A", Cjk, false),
    block('\u{1B130}', '\u{1B16F}', "Small Kana Extension", Cjk, false),
    block('\u{1D300}', '\u{1D35F}', "Tai Xuan Jing Symbols", NoGroup, false),
    block('\u{1D360}', '\u{1D37F}', "Counting Rod Numerals", NoGroup, false),
    block('\u{1D400}', '\u{1D7FF}', "Mathematical Alphanumeric Symbols", NoGroup, false),
    block('\u{1DF00}', '\u{1DFFF}', "Latin Extended-G", European, true),
    block('\u{1E030}', '\u{1E08F}', "Cyrillic Extended-D", European, true),
    block('\u{1F100}', '\u{1F1FF}', "Enclosed Alphanumeric Supplement", NoGroup, false),
    block('\u{1F200}', '\u{1F2FF}', "Enclosed Ideographic Supplement", Cjk, false),
    block('\u{1F300}', '\u{1F5FF}', "Miscellaneous Symbols and Pictographs", NoGroup, false),
    block('\u{1F600}', '\u{1F64F}', "Emoticons", NoGroup, false),
    block('\u{1F680}', '\u{1F6FF}', "Transport and Map Symbols", NoGroup, false),
    block('\u{1F900}', '\u{1F9FF}', "Supplemental Symbols and Pictographs", NoGroup, false),
    block('\u{20000}', '\u{2A6DF}', "CJK Unified Ideographs Extension B", Cjk, false),
    block('\u{2A700}', '\u{2B73F}', "CJK Unified Ideographs Extension C", Cjk, false),
    block('\u{2B740}', '\u{2B81F}', "CJK Unified Ideographs Extension D", Cjk, false),
    block('\u{2B820}', '\u{2CEAF}', "CJK Unified Ideographs Extension E", Cjk, false),
    block('\u{2CEB0}', '\u{2EBEF}', "CJK Unified Ideographs Extension F", Cjk, false),
    block('\u{2EBF0}', '\u{2EE5F}', "CJK Unified Ideographs Extension I", Cjk, false),
    block('\u{2F800}', '\u{2FA1F}', "CJK Compatibility Ideographs Supplement", Cjk, false),
    block('\u{30000}', '\u{3134F}', "CJK Unified Ideographs Extension G", Cjk, false),
    block('\u{31350}', '\u{323AF}', "CJK Unified Ideographs Extension H", Cjk, false),
    block('\u{E0000}', '\u{E007F}', "Tags", NoGroup, false),
    block('\u{E0100}', '\u{E01EF}', "Variation Selectors Supplement", NoGroup, false),
    block('\u{F0000}', '\u{FFFFF}', "Supplementary Private Use Area-A", NoGroup, false),
    block('\u{100000}', '\u{10FFFF}', "Supplementary Private Use Area-B", NoGroup, false),
];

/// Finds the block containing `codepoint`.
pub fn block_of(codepoint: char) -> Option<&'static UnicodeBlock> {
    let index = BLOCKS.partition_point(|block| block.last < codepoint);
    BLOCKS.get(index).filter(|block| block.contains(codepoint))
}
