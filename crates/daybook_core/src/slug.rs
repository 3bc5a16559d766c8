//! Filesystem-safe slug generation for vault filenames.
//!
//! # Responsibility
//! - Reduce an arbitrary title to a lowercase `[a-z0-9-]` filename stem.
//!
//! # Invariants
//! - Output is never empty; titles with no usable characters become
//!   `untitled`.
//! - Output has no leading, trailing, or repeated hyphens.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static ILLEGAL_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|]"#).unwrap());
static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Converts a title to its filename stem.
///
/// Diacritics are stripped via NFD decomposition, spaces and underscores
/// become hyphens, and everything outside `[a-z0-9-]` is dropped.
pub fn slug(title: &str) -> String {
    let decomposed: String = title.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = decomposed.to_lowercase().replace([' ', '_'], "-");

    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(&lowered, "");
    let cleaned = NON_SLUG_CHARS.replace_all(&cleaned, "");
    let cleaned = HYPHEN_RUNS.replace_all(&cleaned, "-");
    let trimmed = cleaned.trim_matches('-');

    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns the `.md` filename an item with this title would get, before
/// collision suffixing.
pub fn filename_from_title(title: &str) -> String {
    format!("{}.md", slug(title))
}

#[cfg(test)]
mod tests {
    use super::{filename_from_title, slug};

    #[test]
    fn slug_handles_common_title_shapes() {
        let cases = [
            ("Hello World", "hello-world"),
            ("helloWorld", "helloworld"),
            ("hello_world", "hello-world"),
            ("multiple   spaces", "multiple-spaces"),
            ("Hello/World*Test", "helloworldtest"),
            ("Task 123", "task-123"),
            ("  Title  ", "title"),
            ("test---title", "test-title"),
        ];
        for (input, expected) in cases {
            assert_eq!(slug(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn slug_strips_diacritics() {
        assert_eq!(slug("Tarea Española"), "tarea-espanola");
        assert_eq!(slug("Déjà vu"), "deja-vu");
    }

    #[test]
    fn slug_falls_back_to_untitled() {
        assert_eq!(slug(""), "untitled");
        assert_eq!(slug("!!!"), "untitled");
        assert_eq!(slug("???"), "untitled");
    }

    #[test]
    fn slug_output_stays_in_the_allowed_alphabet() {
        for input in ["Ünïcödé & Sons", "a  b\tc", "::<>||", "-x-"] {
            let result = slug(input);
            assert!(!result.is_empty());
            assert!(result.chars().all(|c| c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || c == '-'));
            assert!(!result.starts_with('-'));
            assert!(!result.ends_with('-'));
            assert!(!result.contains("--"));
        }
    }

    #[test]
    fn filename_appends_extension() {
        assert_eq!(filename_from_title("Write report"), "write-report.md");
    }
}
