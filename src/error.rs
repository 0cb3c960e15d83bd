/// Errors raised while configuring or compiling fonts.
///
/// Configuration problems are reported when the offending object is built,
/// never deferred into a compile. Lookups never produce an error; they return
/// `None` or an empty collection instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("At least one codepoint range must be configured")]
    EmptyCodepointRanges,

    #[error("Codepoint range {}..={} is inverted", hex(.first), hex(.last))]
    InvertedCodepointRange { first: char, last: char },

    #[error("Codepoint replacement starting at {} loops back onto itself", hex(.0))]
    CyclicRemap(char),

    #[error("Page side length {0} must be a power of two between 16 and 32768")]
    InvalidSideLength(u32),

    #[error("Gamma {0} must be finite and positive")]
    InvalidGamma(f32),

    #[error("{}", too_many_kerning_pairs_message(.0))]
    TooManyKerningPairs(Vec<(String, usize)>),

    #[error("Glyph {} of \"{face}\" ({width}x{height}) does not fit a texture page or glyph record", hex(.codepoint))]
    GlyphTooLarge {
        face: String,
        codepoint: char,
        width: u32,
        height: u32,
    },

    #[error("No texture page was produced")]
    NoPages,

    #[error("A worker panicked while {0}")]
    WorkerPanicked(&'static str),

    #[error("Could not start the compile thread: {0}")]
    ThreadSpawn(String),

    #[error("Malformed font table: {0}")]
    Malformed(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

fn hex(c: &char) -> String {
    format!("U+{:04X}", *c as u32)
}

fn too_many_kerning_pairs_message(faces: &[(String, usize)]) -> String {
    let mut message = String::from(
        "The number of kerning entries of the following font(s) exceeds the limit of 65535.",
    );
    for (name, count) in faces {
        message.push_str(&format!("\n{name}: {count}"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kerning_overflow_lists_every_face() {
        let err = Error::TooManyKerningPairs(vec![
            ("AXIS_12".to_string(), 70000),
            ("Jupiter_16".to_string(), 65536),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("The number of kerning entries"));
        assert!(message.contains("\nAXIS_12: 70000"));
        assert!(message.contains("\nJupiter_16: 65536"));
    }

    #[test]
    fn spawn_failure_is_not_reported_as_a_panic() {
        let err = Error::ThreadSpawn("Resource temporarily unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Could not start the compile thread: Resource temporarily unavailable"
        );
        assert!(!err.to_string().contains("panicked"));
    }

    #[test]
    fn codepoints_are_printed_as_hex() {
        let err = Error::CyclicRemap('A');
        assert!(err.to_string().contains("U+0041"));
    }
}
