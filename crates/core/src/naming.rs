//! File names for generated documents and deck snapshots.

use chrono::NaiveDateTime;
use unicode_normalization::UnicodeNormalization;

/// Suffix appended to every document base name.
pub const OUTPUT_SUFFIX: &str = "_presentation";

/// Extension of generated documents.
pub const OUTPUT_EXTENSION: &str = "pptx";

/// Base name used when a topic has no usable characters.
pub const DEFAULT_BASE_NAME: &str = "presentation";

/// Longest base name in bytes. Common filesystems cap names at 255 bytes.
pub const MAX_BASE_BYTES: usize = 200;

/// Derive the document file name for a topic.
///
/// Keeps alphanumerics, spaces, underscores and hyphens, trims, and turns
/// spaces into underscores. Long base names are cut to [`MAX_BASE_BYTES`]
/// on a character boundary. The result is never empty and never contains a
/// path separator.
///
/// # Example
/// ```
/// use deckgen_core::naming::output_file_name;
///
/// assert_eq!(output_file_name("Hi/There:2024"), "HiThere2024_presentation.pptx");
/// assert_eq!(output_file_name("Rust in 2024"), "Rust_in_2024_presentation.pptx");
/// ```
pub fn output_file_name(topic: &str) -> String {
    let kept: String = topic
        .nfc()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let base = truncate_bytes(&kept.trim().replace(' ', "_"), MAX_BASE_BYTES).to_string();

    let base = if base.chars().all(|c| c == '_' || c == '-') {
        DEFAULT_BASE_NAME.to_string()
    } else {
        base
    };

    format!("{}{}.{}", base, OUTPUT_SUFFIX, OUTPUT_EXTENSION)
}

/// Longest prefix of `s` that fits in `max` bytes.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Name of a deck snapshot written by a pipeline run, e.g.
/// `slides_generated_20240517_093000.json`.
pub fn snapshot_file_name(mode_tag: &str, at: NaiveDateTime) -> String {
    format!("slides_{}_{}.json", mode_tag, at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_separators_are_stripped() {
        assert_eq!(output_file_name("Hi/There:2024"), "HiThere2024_presentation.pptx");
        assert_eq!(output_file_name("..\\..\\etc/passwd"), "etcpasswd_presentation.pptx");
    }

    #[test]
    fn test_quotes_and_control_characters_are_stripped() {
        for topic in ["\"quoted\" 'topic'", "tab\there", "new\nline", "a/b\\c\"d'e"] {
            let name = output_file_name(topic);
            assert!(!name.is_empty());
            for bad in ['/', '\\', '"', '\'', '\t', '\n', ':'] {
                assert!(!name.contains(bad), "{:?} kept {:?}", name, bad);
            }
        }
    }

    #[test]
    fn test_spaces_become_underscores() {
        assert_eq!(
            output_file_name("  Attention and Transformers  "),
            "Attention_and_Transformers_presentation.pptx"
        );
        assert_eq!(output_file_name("snake_case-topic"), "snake_case-topic_presentation.pptx");
    }

    #[test]
    fn test_non_ascii_topics_are_kept() {
        assert_eq!(
            output_file_name("어텐션과 트랜스포머, 그리고 GPT"),
            "어텐션과_트랜스포머_그리고_GPT_presentation.pptx"
        );
    }

    #[test]
    fn test_unusable_topics_fall_back() {
        for topic in ["", "   ", "///", "?!*", "_ -", "---"] {
            assert_eq!(output_file_name(topic), "presentation_presentation.pptx");
        }
    }

    #[test]
    fn test_long_topics_are_capped() {
        let name = output_file_name(&"a".repeat(1000));
        assert_eq!(name, format!("{}_presentation.pptx", "a".repeat(MAX_BASE_BYTES)));

        // Three-byte characters never split.
        let name = output_file_name(&"한".repeat(500));
        let base = name.strip_suffix("_presentation.pptx").unwrap();
        assert_eq!(base.len(), 198);
        assert!(base.chars().all(|c| c == '한'));
        assert!(name.len() < 255);
    }

    #[test]
    fn test_naming_is_deterministic() {
        let topic = "GPT: a history / 2024";
        assert_eq!(output_file_name(topic), output_file_name(topic));
    }

    #[test]
    fn test_snapshot_file_name() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap();
        assert_eq!(snapshot_file_name("enhanced", at), "slides_enhanced_20240517_093005.json");
    }
}
