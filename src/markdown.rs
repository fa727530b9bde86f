//! Converts post and page bodies from markdown to HTML.

use pulldown_cmark::{html, Event, Options, Parser};

/// Renders `markdown` as HTML. GitHub-flavored extensions are enabled and,
/// as on GitHub comments, a single newline inside a paragraph becomes a
/// `<br />`.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).map(|ev| match ev {
        Event::SoftBreak => Event::HardBreak,
        _ => ev,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}
