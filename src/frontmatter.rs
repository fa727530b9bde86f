//! Splits a source document into its YAML frontmatter and its body.
//!
//! A document with frontmatter begins with a `---` line; the frontmatter
//! runs until the next line consisting of `---`, and the body is everything
//! after that line.

use std::fmt;

const FENCE: &str = "---";

/// Returned when a document opens a frontmatter block but never closes it.
#[derive(Debug, PartialEq)]
pub struct MissingEndFence;

impl fmt::Display for MissingEndFence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "missing closing `{}` after frontmatter", FENCE)
    }
}

impl std::error::Error for MissingEndFence {}

/// Returns `(frontmatter, body)`. `frontmatter` is `None` when the document
/// doesn't start with a fence, in which case the whole input is the body.
pub fn split(input: &str) -> Result<(Option<&str>, &str), MissingEndFence> {
    let input = input.trim_start_matches('\u{feff}');
    let rest = match input.strip_prefix(FENCE) {
        Some(rest) if rest.starts_with('\n') || rest.starts_with("\r\n") => rest,
        _ => return Ok((None, input)),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if offset > 0 && line.trim_end() == FENCE {
            return Ok((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(MissingEndFence)
}
