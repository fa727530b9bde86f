//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: cleaning the output directory,
//! copying static assets, loading the posts ([`crate::loader`]), indexing
//! them ([`crate::index`]) and rendering every page ([`crate::write`]).

use crate::config::Config;
use crate::index::build_indexes;
use crate::loader::{self, load_page, load_posts, Error as LoadError};
use crate::write::{DirectorySink, Error as WriteError, SiteMetadata, Templates, Writer};
use chrono::Datelike;
use log::info;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a build produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub posts: usize,
    pub categories: usize,
    pub tags: usize,
    pub archives: usize,
    pub pages: usize,
}

/// Builds the site described by `config` into `config.output_directory`.
///
/// The output directory is deleted first, so a failed build can leave it
/// empty or partially written. Every error aborts the build.
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    info!("Building site into `{}`", config.output_directory.display());

    // Load templates before touching the output directory so a broken theme
    // doesn't leave us with an empty site.
    let templates = Templates::from_directory(&config.templates_directory)?;

    rmdir(&config.output_directory)?;
    std::fs::create_dir_all(&config.output_directory)?;

    if config.public_directory.is_dir() {
        info!("Copying static files");
        copy_dir(&config.public_directory, &config.output_directory)?;
    }

    info!("Loading posts");
    let posts = load_posts(&config.posts_directory, &config.fallback_category)?;
    let indexes = build_indexes(&posts);
    info!("   {} posts", posts.len());
    info!("   {} categories", indexes.categories.len());
    info!("   {} tags", indexes.tags.len());

    let about = load_page(&config.content_directory, "about")?;

    let site = SiteMetadata {
        title: config.site_title.clone(),
        description: config.site_description.clone(),
        base_url: config.base_url.clone(),
        current_year: chrono::Local::now().year(),
    };
    let writer = Writer {
        templates: &templates,
        site: &site,
        posts_per_page: config.posts_per_page,
    };
    let mut sink = DirectorySink::new(&config.output_directory);
    let pages = writer.write_site(&posts, &indexes, about.as_ref(), &mut sink)?;

    // Keeps GitHub Pages from running the output through Jekyll.
    std::fs::write(config.output_directory.join(".nojekyll"), "")?;

    info!("Build complete: {} pages", pages);
    Ok(BuildSummary {
        posts: posts.len(),
        categories: indexes.categories.len(),
        tags: indexes.tags.len(),
        archives: indexes.archives.len(),
        pages,
    })
}

/// Recursively copies the contents of `src` into `dst`.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src).min_depth(1) {
        let entry = result.map_err(copy_error)?;
        // strip_prefix shouldn't fail since `src` is always an ancestor of
        // `entry.path()`
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn copy_error(err: walkdir::Error) -> Error {
    match err.into_io_error() {
        Some(err) => Error::Io(err),
        None => Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "filesystem loop while copying static files",
        )),
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading,
/// writing, cleaning output directories, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading posts and pages.
    Load(LoadError),

    /// Returned for errors rendering or writing pages (including missing
    /// templates).
    Write(WriteError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Load(err) => write!(f, "{}", err),
            Error::Write(err) => write!(f, "{}", err),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<loader::Error> for Error {
    /// Converts [`LoadError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: LoadError) -> Error {
        Error::Load(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
