//! The library code for the `inkpot` static blog generator. A build runs in
//! four steps:
//!
//! 1. Loading and normalizing posts from markdown files on disk
//!    ([`crate::loader`], [`crate::post`])
//! 2. Grouping the posts into category, tag and monthly archive buckets
//!    ([`crate::index`])
//! 3. Building a template context for every output page
//!    ([`crate::context`])
//! 4. Rendering each page and writing it to disk ([`crate::write`])
//!
//! Posts are sorted once, newest first, right after loading; every later
//! step relies on that order instead of re-sorting.
//!
//! Pages are rendered with a deliberately tiny template language
//! ([`crate::template`]) in two passes: first the page's own template, then
//! a shared layout with the result bound to `{{content}}`. Links between
//! pages are relative (see [`crate::route::base_path`]), so the output can be
//! served from any sub-path.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod context;
pub mod frontmatter;
pub mod index;
pub mod loader;
pub mod markdown;
pub mod post;
pub mod route;
pub mod template;
pub mod write;
