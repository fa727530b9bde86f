//! Defines the [`Route`] type, which maps each kind of generated page onto
//! its output path, plus the [`base_path`] and [`slugify`] helpers used to
//! build relative links between pages.

use regex::Regex;
use std::sync::LazyLock;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s\x{AC00}-\x{D7A3}-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// An output page. Every route has a deterministic output path relative to
/// the output directory; see [`Route::output_path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    About,

    /// A page of the blog listing. Page numbers start at 1.
    Blog(usize),
    Post {
        year: String,
        month: String,
        slug: String,
    },
    Category(String),
    Tag(String),
    Archive {
        year: String,
        month: String,
    },
}

impl Route {
    /// The path of the page relative to the output directory, always using
    /// `/` as the separator.
    pub fn output_path(&self) -> String {
        match self {
            Route::Home => String::from("index.html"),
            Route::About => String::from("about.html"),
            Route::Blog(page) if *page <= 1 => String::from("blog/index.html"),
            Route::Blog(page) => format!("blog/page/{}.html", page),
            Route::Post { year, month, slug } => format!("blog/{}/{}/{}.html", year, month, slug),
            Route::Category(name) => format!("category/{}.html", slugify(name)),
            Route::Tag(name) => format!("tag/{}.html", slugify(name)),
            Route::Archive { year, month } => format!("archive/{}/{}.html", year, month),
        }
    }

    /// The relative prefix leading from this page back to the site root.
    pub fn base_path(&self) -> String {
        base_path(&self.output_path())
    }
}

/// Computes the prefix which leads from `output_path` back to the site root:
/// `./` for top-level pages, otherwise one `../` per directory level. Links
/// built on this prefix keep the whole output tree relocatable.
pub fn base_path(output_path: &str) -> String {
    match output_path.matches('/').count() {
        0 => String::from("./"),
        depth => "../".repeat(depth),
    }
}

/// Converts `text` into a URL-safe slug: lowercased, stripped of everything
/// but word characters, whitespace, Hangul syllables and hyphens, with runs
/// of whitespace and hyphens collapsed into a single hyphen.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(&stripped, "-");
    let collapsed = HYPHENS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_owned()
}
