use crate::context::{self, Pagination};
use crate::index::Indexes;
use crate::loader::Page as StandalonePage;
use crate::post::Post;
use crate::route::Route;
use crate::template::{render, Context};
use log::{info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// The templates a site is built from. Each is read from
/// `{templates_directory}/{name}.html`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// The outer document every page is embedded into as `{{content}}`.
    Layout,
    Home,
    About,
    BlogList,
    Post,
    Category,
    Tag,
    Archive,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 8] = [
        TemplateKind::Layout,
        TemplateKind::Home,
        TemplateKind::About,
        TemplateKind::BlogList,
        TemplateKind::Post,
        TemplateKind::Category,
        TemplateKind::Tag,
        TemplateKind::Archive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::Layout => "layout",
            TemplateKind::Home => "home",
            TemplateKind::About => "about",
            TemplateKind::BlogList => "blog-list",
            TemplateKind::Post => "post",
            TemplateKind::Category => "category",
            TemplateKind::Tag => "tag",
            TemplateKind::Archive => "archive",
        }
    }

    /// The about template is only needed when the site has an about page.
    fn is_optional(self) -> bool {
        self == TemplateKind::About
    }
}

/// The loaded template sources.
#[derive(Clone, Debug, Default)]
pub struct Templates(HashMap<TemplateKind, String>);

impl Templates {
    /// Reads every template from `dir`. A missing required template is an
    /// error.
    pub fn from_directory(dir: &Path) -> Result<Templates> {
        let mut templates = HashMap::new();
        for kind in TemplateKind::ALL.iter().copied() {
            let path = dir.join(format!("{}.html", kind.name()));
            match std::fs::read_to_string(&path) {
                Ok(source) => {
                    templates.insert(kind, source);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound && kind.is_optional() => {}
                Err(err) => return Err(Error::OpenTemplateFile { path, err }),
            }
        }
        Ok(Templates(templates))
    }

    pub fn insert(&mut self, kind: TemplateKind, source: impl Into<String>) {
        self.0.insert(kind, source.into());
    }

    fn get(&self, kind: TemplateKind) -> Result<&str> {
        self.0
            .get(&kind)
            .map(String::as_str)
            .ok_or(Error::MissingTemplate(kind.name()))
    }
}

/// Receives rendered pages. Output paths are relative and `/`-separated
/// (see [`Route::output_path`]).
pub trait Sink {
    fn write(&mut self, output_path: &str, contents: &str) -> io::Result<()>;
}

/// Writes pages below a directory on disk, creating subdirectories as
/// needed.
pub struct DirectorySink {
    root: PathBuf,
    seen_dirs: HashSet<PathBuf>,
}

impl DirectorySink {
    pub fn new(root: &Path) -> DirectorySink {
        DirectorySink {
            root: root.to_owned(),
            seen_dirs: HashSet::new(),
        }
    }
}

impl Sink for DirectorySink {
    fn write(&mut self, output_path: &str, contents: &str) -> io::Result<()> {
        let path = output_path
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment));
        if let Some(dir) = path.parent() {
            if self.seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(&path, contents)
    }
}

/// Collects pages in memory, keyed by output path.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub pages: BTreeMap<String, String>,
}

impl Sink for MemorySink {
    fn write(&mut self, output_path: &str, contents: &str) -> io::Result<()> {
        self.pages.insert(output_path.to_owned(), contents.to_owned());
        Ok(())
    }
}

/// Site-wide values available to the layout template.
#[derive(Clone, Debug)]
pub struct SiteMetadata {
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub current_year: i32,
}

/// Responsible for turning posts and indexes into rendered pages and handing
/// them to a [`Sink`].
pub struct Writer<'a> {
    pub templates: &'a Templates,
    pub site: &'a SiteMetadata,

    /// The number of posts per blog listing page. Zero puts every post on a
    /// single page.
    pub posts_per_page: usize,
}

/// A page waiting to be rendered: which template, where, and with what.
struct RoutePage {
    template: TemplateKind,
    route: Route,
    data: Context,
}

impl Writer<'_> {
    /// Renders every page of the site into `sink` in a fixed order: home,
    /// about, blog listing, posts, categories, tags, archives. Returns the
    /// number of pages written.
    pub fn write_site<S: Sink>(
        &self,
        posts: &[Post],
        indexes: &Indexes,
        about: Option<&StandalonePage>,
        sink: &mut S,
    ) -> Result<usize> {
        let mut written: HashSet<String> = HashSet::new();
        for page in pages(posts, indexes, about, self.posts_per_page) {
            let output_path = page.route.output_path();
            if !written.insert(output_path.clone()) {
                warn!("`{}` is generated more than once; the last one wins", output_path);
            }
            let html = self.render_page(page.template, &page.route, &page.data)?;
            sink.write(&output_path, &html)?;
            info!("Generated: {}", output_path);
        }
        Ok(written.len())
    }

    /// Renders a single route in two passes: the route's own template
    /// against `data`, then the layout with the result bound to `content`.
    pub fn render_page(&self, template: TemplateKind, route: &Route, data: &Context) -> Result<String> {
        let base_path = route.base_path();
        let content = render(
            self.templates.get(template)?,
            &data.clone().with("basePath", base_path.as_str()),
        );
        let page = data
            .clone()
            .with("basePath", base_path)
            .with("content", content)
            .with("siteTitle", &self.site.title)
            .with("siteDescription", &self.site.description)
            .with("baseUrl", &self.site.base_url)
            .with("currentYear", self.site.current_year);
        Ok(render(self.templates.get(TemplateKind::Layout)?, &page))
    }
}

/// Lists every page of the site, in writing order.
fn pages<'p>(
    posts: &'p [Post],
    indexes: &'p Indexes<'p>,
    about: Option<&'p StandalonePage>,
    posts_per_page: usize,
) -> impl Iterator<Item = RoutePage> + 'p {
    let home = RoutePage {
        template: TemplateKind::Home,
        route: Route::Home,
        data: context::home(posts, &indexes.categories, &indexes.tags),
    };
    let about = about.map(|page| RoutePage {
        template: TemplateKind::About,
        route: Route::About,
        data: context::page(page),
    });

    std::iter::once(home)
        .chain(about)
        .chain(blog_pages(posts, indexes, posts_per_page))
        .chain(post_pages(posts))
        .chain(indexes.categories.iter().map(|bucket| RoutePage {
            template: TemplateKind::Category,
            route: Route::Category(bucket.name.clone()),
            data: context::category(bucket),
        }))
        .chain(indexes.tags.iter().map(|bucket| RoutePage {
            template: TemplateKind::Tag,
            route: Route::Tag(bucket.name.clone()),
            data: context::tag(bucket),
        }))
        .chain(indexes.archives.iter().map(|archive| RoutePage {
            template: TemplateKind::Archive,
            route: context::archive_route(archive),
            data: context::archive(archive),
        }))
}

/// Splits the posts into blog listing pages of `posts_per_page` each. There
/// is always at least one page, even without posts.
fn blog_pages<'p>(
    posts: &'p [Post],
    indexes: &'p Indexes<'p>,
    posts_per_page: usize,
) -> impl Iterator<Item = RoutePage> + 'p {
    let chunks: Vec<&[Post]> = match posts_per_page {
        0 => vec![posts],
        _ if posts.is_empty() => vec![posts],
        n => posts.chunks(n).collect(),
    };
    let total_pages = chunks.len();

    chunks.into_iter().enumerate().map(move |(i, chunk)| {
        let route = Route::Blog(i + 1);
        let pagination = Pagination {
            page: i + 1,
            total_pages,
        };
        RoutePage {
            template: TemplateKind::BlogList,
            data: context::blog_list(chunk, &indexes.archives, pagination, &route.base_path()),
            route,
        }
    })
}

fn post_pages(posts: &[Post]) -> impl Iterator<Item = RoutePage> + '_ {
    posts.iter().enumerate().map(move |(i, post)| {
        let route = post.route();
        RoutePage {
            template: TemplateKind::Post,
            data: context::post_page(posts, i, &route.base_path()),
            route,
        }
    })
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file can't be read.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned when a page needs a template that wasn't loaded.
    MissingTemplate(&'static str),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::MissingTemplate(name) => write!(f, "Missing template '{}.html'", name),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::MissingTemplate(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::build_indexes;
    use crate::post::{sort_posts, Document};
    use crate::template::Value;

    const LAYOUT: &str = "<title>{{title}} | {{siteTitle}}</title><link href=\"{{basePath}}style.css\">{{content}}";
    const LISTING: &str = "<h1>{{title}}</h1>{{#each posts}}<a href=\"{{basePath}}{{url}}\">{{title}}</a>{{/each}}";

    fn templates() -> Templates {
        let mut t = Templates::default();
        t.insert(TemplateKind::Layout, LAYOUT);
        t.insert(TemplateKind::Home, "{{#each posts}}[{{title}}]{{/each}}");
        t.insert(TemplateKind::About, "{{html}}");
        t.insert(TemplateKind::BlogList, "{{page}}/{{totalPages}}:{{#each posts}}[{{slug}}]{{/each}}{{#if hasNextPage}}>{{nextPageUrl}}{{/if}}");
        t.insert(
            TemplateKind::Post,
            "{{html}}{{#if hasPrev}}<a href=\"{{prevPostUrl}}\">{{prevPostTitle}}</a>{{/if}}",
        );
        t.insert(TemplateKind::Category, LISTING);
        t.insert(TemplateKind::Tag, LISTING);
        t.insert(TemplateKind::Archive, LISTING);
        t
    }

    fn site() -> SiteMetadata {
        SiteMetadata {
            title: "My Blog".into(),
            description: "".into(),
            base_url: "".into(),
            current_year: 2024,
        }
    }

    fn post(path: &str, yaml: &str, body: &str) -> Post {
        Post::from_document(
            Document {
                relative_path: PathBuf::from(path),
                frontmatter: serde_yaml::from_str(yaml).unwrap(),
                body: body.to_owned(),
            },
            "uncategorized",
        )
        .unwrap()
    }

    fn corpus() -> Vec<Post> {
        let mut posts = vec![
            post("2024/01/winter.md", "title: Winter\ndate: 2024-01-01\ntags: [go]\n", "cold"),
            post("2024/02/spring.md", "title: Spring\ndate: 2024-02-01\ntags: [go]\n", "warm"),
        ];
        sort_posts(&mut posts);
        posts
    }

    fn build(posts: &[Post], posts_per_page: usize) -> MemorySink {
        let templates = templates();
        let site = site();
        let writer = Writer {
            templates: &templates,
            site: &site,
            posts_per_page,
        };
        let indexes = build_indexes(posts);
        let mut sink = MemorySink::default();
        writer.write_site(posts, &indexes, None, &mut sink).unwrap();
        sink
    }

    #[test]
    fn test_routes_generated() {
        let sink = build(&corpus(), 10);
        let paths: Vec<&str> = sink.pages.keys().map(String::as_str).collect();
        assert_eq!(
            paths,
            vec![
                "archive/2024/01.html",
                "archive/2024/02.html",
                "blog/2024/01/winter.html",
                "blog/2024/02/spring.html",
                "blog/index.html",
                "category/uncategorized.html",
                "index.html",
                "tag/go.html",
            ]
        );
    }

    #[test]
    fn test_tag_page_lists_newest_first() {
        let sink = build(&corpus(), 10);
        assert_eq!(
            sink.pages["tag/go.html"],
            "<title>Tag: go | My Blog</title><link href=\"../style.css\">\
             <h1>Tag: go</h1>\
             <a href=\"../blog/2024/02/spring.html\">Spring</a>\
             <a href=\"../blog/2024/01/winter.html\">Winter</a>"
        );
    }

    #[test]
    fn test_post_page_links_to_older_post() {
        let sink = build(&corpus(), 10);
        assert_eq!(
            sink.pages["blog/2024/02/spring.html"],
            "<title>Spring | My Blog</title><link href=\"../../../style.css\">\
             <p>warm</p>\n<a href=\"../../../blog/2024/01/winter.html\">Winter</a>"
        );
        assert!(!sink.pages["blog/2024/01/winter.html"].contains("<a href"));
    }

    #[test]
    fn test_home_page_uses_current_directory() {
        let sink = build(&corpus(), 10);
        assert_eq!(
            sink.pages["index.html"],
            "<title>Home | My Blog</title><link href=\"./style.css\">[Spring][Winter]"
        );
    }

    #[test]
    fn test_blog_pagination() {
        let sink = build(&corpus(), 1);
        assert!(sink.pages["blog/index.html"].ends_with("1/2:[spring]>../blog/page/2.html"));
        assert!(sink.pages["blog/page/2.html"].ends_with("2/2:[winter]"));
    }

    #[test]
    fn test_blog_listing_without_posts() {
        let sink = build(&[], 10);
        assert!(sink.pages["blog/index.html"].ends_with("1/1:"));
        assert_eq!(sink.pages.len(), 2);
    }

    #[test]
    fn test_about_page_only_when_present() {
        let templates = templates();
        let site = site();
        let writer = Writer {
            templates: &templates,
            site: &site,
            posts_per_page: 10,
        };
        let about = StandalonePage {
            metadata: Context::new().with("title", "About"),
            content: "me".into(),
            html: "<p>me</p>".into(),
        };
        let indexes = build_indexes(&[]);
        let mut sink = MemorySink::default();
        writer
            .write_site(&[], &indexes, Some(&about), &mut sink)
            .unwrap();
        assert_eq!(
            sink.pages["about.html"],
            "<title>About | My Blog</title><link href=\"./style.css\"><p>me</p>"
        );
    }

    #[test]
    fn test_layout_inserts_page_content_verbatim() {
        let mut templates = templates();
        templates.insert(TemplateKind::About, "{{html}}");
        let site = site();
        let writer = Writer {
            templates: &templates,
            site: &site,
            posts_per_page: 10,
        };
        // Text bound to `content` is substituted in one sweep and never
        // re-scanned by the layout.
        let data = Context::new()
            .with("title", "About")
            .with("html", Value::from("<p>{{siteTitle}}</p>"));
        let out = writer
            .render_page(TemplateKind::About, &Route::About, &data)
            .unwrap();
        assert!(out.ends_with("<p>{{siteTitle}}</p>"), "{}", out);
    }

    #[test]
    fn test_missing_template() {
        let templates = Templates::default();
        let site = site();
        let writer = Writer {
            templates: &templates,
            site: &site,
            posts_per_page: 10,
        };
        match writer.render_page(TemplateKind::Home, &Route::Home, &Context::new()) {
            Err(Error::MissingTemplate(name)) => assert_eq!(name, "home"),
            other => panic!("expected a missing template error, got {:?}", other),
        }
    }

    #[test]
    fn test_templates_from_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        for kind in TemplateKind::ALL.iter().filter(|k| **k != TemplateKind::About) {
            std::fs::write(dir.path().join(format!("{}.html", kind.name())), "x").unwrap();
        }
        assert!(Templates::from_directory(dir.path()).is_ok());

        std::fs::remove_file(dir.path().join("layout.html")).unwrap();
        match Templates::from_directory(dir.path()) {
            Err(Error::OpenTemplateFile { path, .. }) => {
                assert_eq!(path, dir.path().join("layout.html"))
            }
            other => panic!("expected a template error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_directory_sink() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.write("blog/2024/02/a.html", "hello").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("blog/2024/02/a.html")).unwrap(),
            "hello"
        );
    }
}
