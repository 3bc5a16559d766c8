//! Frontmatter header codec for vault item files.
//!
//! # Responsibility
//! - Split a vault file into its metadata header and free-form body.
//! - Serialize item metadata back into the same delimited format.
//!
//! # Invariants
//! - A document must open with the `---` marker; anything else is a hard
//!   parse failure, never a best-effort fallback.
//! - A parsed header must carry a non-blank `title`.
//! - Serialized output ends the body with exactly one trailing newline.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DELIMITER: &str = "---";

/// The flat key/value header persisted at the top of every item file.
///
/// `created_at` stays a string at this layer; the vault repository owns the
/// timestamp format and its fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug)]
pub enum FrontmatterError {
    /// Content does not start with the opening marker.
    NoFrontmatter,
    /// Opening marker present but the closing marker is missing.
    Unclosed,
    /// The metadata block is not the expected mapping shape.
    Invalid(String),
}

impl Display for FrontmatterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFrontmatter => write!(f, "no frontmatter found"),
            Self::Unclosed => write!(f, "unclosed frontmatter"),
            Self::Invalid(reason) => write!(f, "invalid frontmatter: {reason}"),
        }
    }
}

impl Error for FrontmatterError {}

/// Splits a document into its parsed header and verbatim body.
pub fn parse(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    if !content.starts_with(DELIMITER) {
        return Err(FrontmatterError::NoFrontmatter);
    }

    let rest = &content[DELIMITER.len()..];
    let end = rest.find("\n---").ok_or(FrontmatterError::Unclosed)?;

    let block = rest[..end].strip_prefix('\n').unwrap_or(&rest[..end]);
    let frontmatter: Frontmatter = serde_yaml::from_str(block)
        .map_err(|err| FrontmatterError::Invalid(err.to_string()))?;
    if frontmatter.title.trim().is_empty() {
        return Err(FrontmatterError::Invalid(
            "missing or blank title".to_string(),
        ));
    }

    let body_start = end + "\n---".len();
    let body = rest[body_start..]
        .strip_prefix('\n')
        .unwrap_or(&rest[body_start..]);

    Ok((frontmatter, body.to_string()))
}

/// Serializes a header and body back into document form.
///
/// An empty body emits nothing after the closing marker; a non-empty body
/// is normalized to end with exactly one newline.
pub fn serialize(frontmatter: &Frontmatter, body: &str) -> Result<String, FrontmatterError> {
    let block = serde_yaml::to_string(frontmatter)
        .map_err(|err| FrontmatterError::Invalid(err.to_string()))?;

    let mut out = String::with_capacity(block.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&block);
    out.push_str(DELIMITER);
    out.push('\n');
    if !body.is_empty() {
        out.push_str(body.trim_end_matches('\n'));
        out.push('\n');
    }
    Ok(out)
}
