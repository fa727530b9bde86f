//! Defines the [`Config`] type, which carries every setting a build needs,
//! and the logic for loading it from an `inkpot.yaml` project file.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "inkpot.yaml";

/// Posts per blog listing page. Zero, the default, keeps every post on
/// `blog/index.html`.
#[derive(Default, Deserialize)]
struct PageSize(usize);

fn default_site_title() -> String {
    String::from("My Blog")
}

fn default_fallback_category() -> String {
    String::from("uncategorized")
}

/// The contents of `inkpot.yaml`. Directories are relative to the project
/// file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default = "default_site_title")]
    site_title: String,

    #[serde(default)]
    site_description: String,

    #[serde(default)]
    base_url: String,

    #[serde(default)]
    posts_per_page: PageSize,

    #[serde(default = "default_fallback_category")]
    fallback_category: String,

    content_directory: Option<PathBuf>,
    posts_directory: Option<PathBuf>,
    templates_directory: Option<PathBuf>,
    public_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
}

/// Everything a build needs. Passed explicitly to
/// [`crate::build::build_site`].
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Holds standalone pages such as `about.md`.
    pub content_directory: PathBuf,

    /// Holds posts laid out as `{year}/{month}/{slug}.md`.
    pub posts_directory: PathBuf,
    pub templates_directory: PathBuf,

    /// Copied verbatim into the output directory.
    pub public_directory: PathBuf,

    /// Deleted and recreated by every build.
    pub output_directory: PathBuf,
    pub posts_per_page: usize,
    pub site_title: String,
    pub site_description: String,

    /// The prefix the site is served under, e.g. `/my-repo`. Only exposed to
    /// templates; generated links are relative.
    pub base_url: String,
    pub fallback_category: String,
}

impl Config {
    /// Returns the default configuration for a project rooted at `root`.
    pub fn with_root(root: &Path) -> Config {
        Config {
            content_directory: root.join("content"),
            posts_directory: root.join("content").join("posts"),
            templates_directory: root.join("templates"),
            public_directory: root.join("public"),
            output_directory: root.join("dist"),
            posts_per_page: PageSize::default().0,
            site_title: default_site_title(),
            site_description: String::new(),
            base_url: String::new(),
            fallback_category: default_fallback_category(),
        }
    }

    /// Searches `dir` and then each of its ancestors for `inkpot.yaml` and
    /// loads the first one found. `output_directory`, when given, overrides
    /// the project's output directory.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::ProjectFileNotFound),
            }
        }
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::OpenProjectFile {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let defaults = Config::with_root(root);
        let resolve = |dir: Option<PathBuf>, default: PathBuf| match dir {
            Some(dir) => root.join(dir),
            None => default,
        };

        let content_directory = resolve(project.content_directory, defaults.content_directory);
        Ok(Config {
            posts_directory: match project.posts_directory {
                Some(dir) => root.join(dir),
                None => content_directory.join("posts"),
            },
            content_directory,
            templates_directory: resolve(project.templates_directory, defaults.templates_directory),
            public_directory: resolve(project.public_directory, defaults.public_directory),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => resolve(project.output_directory, defaults.output_directory),
            },
            posts_per_page: project.posts_per_page.0,
            site_title: project.site_title,
            site_description: project.site_description,
            base_url: project.base_url,
            fallback_category: project.fallback_category,
        })
    }
}

/// The result of loading a configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when no directory up to the filesystem root contains
    /// `inkpot.yaml`.
    ProjectFileNotFound,

    /// Returned when the project file can't be opened.
    OpenProjectFile { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::OpenProjectFile { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => write!(f, "Loading configuration: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound => None,
            Error::OpenProjectFile { path: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "site_title: Notes\n").unwrap();

        let config = Config::from_directory(dir.path(), None)?;
        assert_eq!(config.posts_per_page, 0);
        assert_eq!(
            config,
            Config {
                site_title: "Notes".into(),
                ..Config::with_root(dir.path())
            }
        );
        Ok(())
    }

    #[test]
    fn test_searches_parent_directories() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("content").join("posts");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "posts_per_page: 3\ncontent_directory: src\noutput_directory: out\nbase_url: /blog-repo\n",
        )
        .unwrap();

        let config = Config::from_directory(&nested, None)?;
        assert_eq!(config.posts_per_page, 3);
        assert_eq!(config.content_directory, dir.path().join("src"));
        assert_eq!(config.posts_directory, dir.path().join("src").join("posts"));
        assert_eq!(config.output_directory, dir.path().join("out"));
        assert_eq!(config.base_url, "/blog-repo");

        let overridden = Config::from_directory(&nested, Some(Path::new("/tmp/site")))?;
        assert_eq!(overridden.output_directory, PathBuf::from("/tmp/site"));
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "site_titel: Oops\n").unwrap();
        assert!(matches!(
            Config::from_directory(dir.path(), None),
            Err(Error::DeserializeYaml(_))
        ));
    }
}
