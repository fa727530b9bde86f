//! Reads posts and standalone pages from the content directory. Posts are
//! returned already normalized and sorted (see [`crate::post`]); nothing
//! downstream re-sorts them.

use crate::frontmatter::{self, MissingEndFence};
use crate::markdown;
use crate::post::{self, sort_posts, yaml_scalar, Document, Frontmatter, Post};
use crate::template::Context;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Walks `posts_directory` recursively and returns every post found in it,
/// newest first. A missing posts directory yields no posts.
pub fn load_posts(posts_directory: &Path, fallback_category: &str) -> Result<Vec<Post>> {
    if !posts_directory.is_dir() {
        warn!(
            "Posts directory `{}` does not exist; building without posts",
            posts_directory.display()
        );
        return Ok(Vec::new());
    }

    let mut posts = Vec::new();
    for result in WalkDir::new(posts_directory).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = result?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(MARKDOWN_EXTENSION)
        {
            continue;
        }

        let relative_path = path.strip_prefix(posts_directory).unwrap_or(path);
        let post = load_post(path, relative_path, fallback_category).map_err(|e| {
            Error::Annotated(format!("loading post `{}`", path.display()), Box::new(e))
        })?;
        if post.date.is_none() {
            warn!(
                "Post `{}` has a missing or invalid date; it will be listed last",
                path.display()
            );
        }
        debug!("Loaded post `{}`", post.slug);
        posts.push(post);
    }

    sort_posts(&mut posts);
    Ok(posts)
}

fn load_post(path: &Path, relative_path: &Path, fallback_category: &str) -> Result<Post> {
    let contents = std::fs::read_to_string(path)?;
    let (yaml, body) = frontmatter::split(&contents)?;
    let yaml = yaml.ok_or(Error::MissingFrontmatter)?;
    let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;
    Ok(Post::from_document(
        Document {
            relative_path: relative_path.to_owned(),
            frontmatter,
            body: body.to_owned(),
        },
        fallback_category,
    )?)
}

/// A standalone page such as `about.md`: arbitrary metadata and a body.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub metadata: Context,
    pub content: String,
    pub html: String,
}

/// Loads `{content_directory}/{name}.md`. Returns `None` when the file
/// doesn't exist. Frontmatter is optional for pages.
pub fn load_page(content_directory: &Path, name: &str) -> Result<Option<Page>> {
    let path = content_directory.join(format!("{}.{}", name, MARKDOWN_EXTENSION));
    if !path.is_file() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let (yaml, body) = frontmatter::split(&contents)?;
    let metadata: BTreeMap<String, serde_yaml::Value> = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
        _ => BTreeMap::new(),
    };

    Ok(Some(Page {
        metadata: metadata
            .iter()
            .filter_map(|(k, v)| yaml_scalar(v).map(|v| (k.clone(), v)))
            .collect(),
        content: body.to_owned(),
        html: markdown::to_html(body),
    }))
}

/// The result of a loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading posts or pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file doesn't begin with `---`.
    MissingFrontmatter,

    /// Returned when a source file's frontmatter is never closed.
    MissingEndFence(MissingEndFence),

    /// Returned when the frontmatter isn't valid YAML or lacks a required
    /// field.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a document can't be normalized into a post.
    Post(post::Error),

    /// Returned for I/O errors.
    Io(std::io::Error),

    /// Returned for errors walking the posts directory.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingFrontmatter => write!(f, "post must begin with `---`"),
            Error::MissingEndFence(err) => write!(f, "{}", err),
            Error::DeserializeYaml(err) => write!(f, "{}", err),
            Error::Post(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "{}", err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingFrontmatter => None,
            Error::MissingEndFence(err) => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::Post(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<MissingEndFence> for Error {
    fn from(err: MissingEndFence) -> Error {
        Error::MissingEndFence(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<post::Error> for Error {
    fn from(err: post::Error) -> Error {
        Error::Post(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}
