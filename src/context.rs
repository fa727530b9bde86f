//! Builds the template [`Context`] for each kind of route. Every builder
//! produces a fresh context from borrowed posts and indexes; the canonical
//! [`Post`]s are never modified.

use crate::index::{Archive, Bucket, Buckets};
use crate::loader::Page;
use crate::post::Post;
use crate::route::Route;
use crate::template::Context;
use chrono::NaiveDate;

/// The number of posts featured on the home page.
pub const HOME_POST_COUNT: usize = 5;

/// The number of body characters used for an excerpt when a post has no
/// description.
pub const EXCERPT_LENGTH: usize = 150;

/// The fields every post exposes: its frontmatter extras, overridden by the
/// normalized fields.
pub fn post_fields(post: &Post) -> Context {
    let mut ctx: Context = post.extra.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    ctx.insert("slug", &post.slug);
    ctx.insert("title", &post.title);
    ctx.insert("date", post.date_iso());
    ctx.insert("category", &post.category);
    ctx.insert("year", &post.year);
    ctx.insert("month", &post.month);
    ctx.insert("url", &post.url);
    ctx.insert("content", &post.content);
    ctx.insert("html", &post.html);
    if let Some(description) = &post.description {
        ctx.insert("description", description);
    }
    ctx
}

/// A post as an element of a listing (`{{#each posts}}`). The `url` is
/// relative to the site root so templates can prefix it with `basePath`.
pub fn post_summary(post: &Post) -> Context {
    post_fields(post)
        .with("url", post.url.trim_start_matches('/'))
        .with("dateFormatted", post.date_formatted())
        .with("excerpt", excerpt(post))
        .with(
            "tagsHtml",
            post.tags
                .iter()
                .map(|t| format!("<span class=\"tag-small\">{}</span>", t))
                .collect::<String>(),
        )
}

fn excerpt(post: &Post) -> String {
    match &post.description {
        Some(description) if !description.is_empty() => description.clone(),
        _ => {
            let head: String = post.content.chars().take(EXCERPT_LENGTH).collect();
            format!("{}...", head)
        }
    }
}

fn summaries<'p>(posts: impl IntoIterator<Item = &'p Post>) -> Vec<Context> {
    posts.into_iter().map(post_summary).collect()
}

/// `{name, count, url}` records for a list of category or tag buckets.
fn bucket_links(buckets: &Buckets<Bucket>, route: fn(String) -> Route) -> Vec<Context> {
    buckets
        .iter()
        .map(|b| {
            Context::new()
                .with("name", &b.name)
                .with("count", b.posts.len())
                .with("url", route(b.name.clone()).output_path())
        })
        .collect()
}

/// The home page: the most recent posts plus category and tag links.
pub fn home(
    posts: &[Post],
    categories: &Buckets<Bucket>,
    tags: &Buckets<Bucket>,
) -> Context {
    let recent = summaries(posts.iter().take(HOME_POST_COUNT));
    Context::new()
        .with("title", "Home")
        .with("posts", recent.clone())
        .with("recentPosts", recent)
        .with("categories", bucket_links(categories, Route::Category))
        .with("tags", bucket_links(tags, Route::Tag))
}

/// A standalone page: its metadata plus its body.
pub fn page(page: &Page) -> Context {
    page.metadata
        .clone()
        .with("content", &page.content)
        .with("html", &page.html)
}

/// Which page of a paginated listing is being rendered. Pages count from 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
}

/// One page of the blog listing. `archives` are listed newest month first.
pub fn blog_list(
    posts: &[Post],
    archives: &Buckets<Archive>,
    pagination: Pagination,
    base_path: &str,
) -> Context {
    let mut sorted: Vec<&Archive> = archives.iter().collect();
    sorted.sort_by_key(|a| std::cmp::Reverse(a.key()));

    let Pagination { page, total_pages } = pagination;
    let page_url = |page: usize| format!("{}{}", base_path, Route::Blog(page).output_path());
    let has_prev = page > 1;
    let has_next = page < total_pages;

    Context::new()
        .with("title", "Blog")
        .with("posts", summaries(posts))
        .with(
            "archives",
            sorted
                .into_iter()
                .map(|a| {
                    Context::new()
                        .with("year", &a.year)
                        .with("month", &a.month)
                        .with("label", archive_label(&a.year, &a.month))
                        .with("count", a.posts.len())
                        .with("url", archive_route(a).output_path())
                })
                .collect::<Vec<_>>(),
        )
        .with("page", page)
        .with("totalPages", total_pages)
        .with("hasPrevPage", has_prev)
        .with("prevPageUrl", if has_prev { page_url(page - 1) } else { String::new() })
        .with("hasNextPage", has_next)
        .with("nextPageUrl", if has_next { page_url(page + 1) } else { String::new() })
}

/// A single post page. `posts` is the full sorted sequence and `i` the
/// post's position in it; the previous (older) post sits at `i + 1` and the
/// next (newer) one at `i - 1`.
pub fn post_page(posts: &[Post], i: usize, base_path: &str) -> Context {
    let post = &posts[i];
    let prev = posts.get(i + 1);
    let next = match i {
        0 => None,
        _ => posts.get(i - 1),
    };
    let link = |p: Option<&Post>| match p {
        Some(p) => (
            p.title.clone(),
            format!("{}{}", base_path, p.route().output_path()),
        ),
        None => (String::new(), String::new()),
    };
    let (prev_title, prev_url) = link(prev);
    let (next_title, next_url) = link(next);

    post_fields(post)
        .with("dateFormatted", post.date_formatted())
        .with(
            "tagsHtml",
            post.tags
                .iter()
                .map(|t| {
                    format!(
                        "<a href=\"{}{}\" class=\"tag\">{}</a>",
                        base_path,
                        Route::Tag(t.clone()).output_path(),
                        t
                    )
                })
                .collect::<String>(),
        )
        .with(
            "categoryUrl",
            format!(
                "{}{}",
                base_path,
                Route::Category(post.category.clone()).output_path()
            ),
        )
        .with("hasPrev", prev.is_some())
        .with("hasNext", next.is_some())
        .with("prevPostTitle", prev_title)
        .with("prevPostUrl", prev_url)
        .with("nextPostTitle", next_title)
        .with("nextPostUrl", next_url)
}

/// A category page listing every post in `bucket`.
pub fn category(bucket: &Bucket) -> Context {
    listing(format!("Category: {}", bucket.name), bucket)
}

/// A tag page listing every post in `bucket`.
pub fn tag(bucket: &Bucket) -> Context {
    listing(format!("Tag: {}", bucket.name), bucket)
}

fn listing(title: String, bucket: &Bucket) -> Context {
    Context::new()
        .with("title", title)
        .with("name", &bucket.name)
        .with("posts", summaries(bucket.posts.iter().copied()))
        .with("count", bucket.posts.len())
}

/// A monthly archive page.
pub fn archive(archive: &Archive) -> Context {
    let label = archive_label(&archive.year, &archive.month);
    Context::new()
        .with("title", format!("Archive: {}", label))
        .with("year", &archive.year)
        .with("month", &archive.month)
        .with("label", label)
        .with("posts", summaries(archive.posts.iter().copied()))
        .with("count", archive.posts.len())
}

pub fn archive_route(archive: &Archive) -> Route {
    Route::Archive {
        year: archive.year.clone(),
        month: archive.month.clone(),
    }
}

/// A human-readable month, e.g. `February 2024`.
pub fn archive_label(year: &str, month: &str) -> String {
    let date = match (year.parse(), month.parse()) {
        (Ok(y), Ok(m)) => NaiveDate::from_ymd_opt(y, m, 1),
        _ => None,
    };
    match date {
        Some(date) => date.format("%B %Y").to_string(),
        None => format!("{}-{}", year, month),
    }
}
