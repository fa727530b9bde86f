//! Defines the [`Post`] type and the normalization step which turns a raw
//! source document (frontmatter, body and storage path) into a [`Post`].
//! See [`crate::loader`] for how documents are read from disk and
//! [`crate::context`] for how posts are presented to templates.

use crate::markdown;
use crate::route::Route;
use crate::template::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The metadata header of a post source file.
#[derive(Deserialize, Clone, Debug)]
pub struct Frontmatter {
    pub title: String,

    /// Left unparsed here; see [`parse_date`].
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// An empty `tags:` key counts as no tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub description: Option<String>,

    /// Any other keys. Scalars among them are handed to templates as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A raw post as supplied by the loader, before normalization.
pub struct Document {
    /// The source path relative to the posts directory, e.g.
    /// `2024/02/hello.md`.
    pub relative_path: PathBuf,
    pub frontmatter: Frontmatter,
    pub body: String,
}

/// A normalized blog post. Posts are created once per build and never
/// modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The source file name without its extension.
    pub slug: String,
    pub title: String,

    /// `None` when the frontmatter date is absent or unparseable.
    pub date: Option<NaiveDateTime>,
    pub category: String,
    pub tags: Vec<String>,

    /// The two date segments of the source path (e.g. `2024` and `02`).
    pub year: String,
    pub month: String,

    /// The canonical URL, `/blog/{year}/{month}/{slug}.html`.
    pub url: String,
    pub description: Option<String>,

    /// The raw markdown body.
    pub content: String,

    /// The rendered body.
    pub html: String,
    pub extra: BTreeMap<String, Value>,
}

impl Post {
    /// Normalizes a [`Document`] into a [`Post`]. Posts without a category
    /// are filed under `fallback_category`. Fails if the source path doesn't
    /// carry `{year}/{month}` directory segments.
    pub fn from_document(doc: Document, fallback_category: &str) -> Result<Post> {
        let slug = doc
            .relative_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidFileName(doc.relative_path.clone()))?
            .to_owned();
        let (year, month) = date_segments(&doc.relative_path)?;
        let fm = doc.frontmatter;

        Ok(Post {
            url: format!("/blog/{}/{}/{}.html", year, month, slug),
            date: fm.date.as_deref().and_then(parse_date),
            category: fm
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| fallback_category.to_owned()),
            tags: fm.tags.unwrap_or_default(),
            description: fm.description,
            title: fm.title,
            html: markdown::to_html(&doc.body),
            content: doc.body,
            extra: fm
                .extra
                .iter()
                .filter_map(|(k, v)| yaml_scalar(v).map(|v| (k.clone(), v)))
                .collect(),
            slug,
            year,
            month,
        })
    }

    pub fn route(&self) -> Route {
        Route::Post {
            year: self.year.clone(),
            month: self.month.clone(),
            slug: self.slug.clone(),
        }
    }

    /// The date as `YYYY-MM-DD`, or an empty string for undated posts.
    pub fn date_iso(&self) -> String {
        self.format_date("%Y-%m-%d")
    }

    /// The date for display, e.g. `February 1, 2024`.
    pub fn date_formatted(&self) -> String {
        self.format_date("%B %-d, %Y")
    }

    fn format_date(&self, fmt: &str) -> String {
        match &self.date {
            Some(date) => date.format(fmt).to_string(),
            None => String::new(),
        }
    }
}

/// Sorts posts newest first. Undated posts come after every dated one, and
/// posts sharing a date are ordered by slug.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}

/// Parses a frontmatter date. Accepts RFC 3339 timestamps, `YYYY-MM-DD`
/// and `YYYY-MM-DD HH:MM[:SS]` (with either a space or a `T` separator).
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Finds the `{year}/{month}` directory segments in a post's relative
/// source path: the first four-digit directory, which must be immediately
/// followed by a two-digit one.
fn date_segments(relative_path: &Path) -> Result<(String, String)> {
    fn all_digits(s: &str, n: usize) -> bool {
        s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
    }

    let dirs: Vec<&str> = match relative_path.parent() {
        Some(parent) => parent.iter().filter_map(|c| c.to_str()).collect(),
        None => Vec::new(),
    };
    let missing = || Error::MissingDateSegments(relative_path.to_owned());

    let i = dirs.iter().position(|d| all_digits(d, 4)).ok_or_else(missing)?;
    match dirs.get(i + 1) {
        Some(month) if all_digits(month, 2) => Ok((dirs[i].to_owned(), (*month).to_owned())),
        _ => Err(missing()),
    }
}

/// Converts a scalar YAML value into a template [`Value`]. Sequences,
/// mappings and nulls have no template form.
pub(crate) fn yaml_scalar(v: &serde_yaml::Value) -> Option<Value> {
    match v {
        serde_yaml::Value::String(s) => Some(Value::String(s.clone())),
        serde_yaml::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Number(i),
            None => Value::String(n.to_string()),
        }),
        _ => None,
    }
}

/// The result of normalizing a post.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error normalizing a [`Document`] into a [`Post`].
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when the source path has no `{year}/{month}` directories.
    MissingDateSegments(PathBuf),

    /// Returned when the source file name isn't valid UTF-8.
    InvalidFileName(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDateSegments(path) => write!(
                f,
                "expected `{{year}}/{{month}}` directories in post path `{}`",
                path.display()
            ),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
        }
    }
}

impl std::error::Error for Error {}
