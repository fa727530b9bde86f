//! Groups the sorted post sequence into category, tag and archive buckets.
//!
//! Buckets borrow posts from the canonical sequence. Since that sequence is
//! already sorted newest-first, every bucket is too; nothing here sorts.
//! Buckets themselves are kept in the order they were first seen.

use crate::post::Post;
use std::collections::HashMap;

/// A named group of posts, e.g. everything in one category.
#[derive(Debug)]
pub struct Bucket<'a> {
    pub name: String,
    pub posts: Vec<&'a Post>,
}

/// The posts of a single `{year}-{month}`.
#[derive(Debug)]
pub struct Archive<'a> {
    pub year: String,
    pub month: String,
    pub posts: Vec<&'a Post>,
}

impl Archive<'_> {
    /// The bucket key, `{year}-{month}`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

/// A list of buckets in first-seen order with lookup by name.
#[derive(Debug)]
pub struct Buckets<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Default for Buckets<T> {
    fn default() -> Self {
        Buckets {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> Buckets<T> {
    /// Returns the bucket for `key`, creating it with `make` on first sight.
    fn entry(&mut self, key: &str, make: impl FnOnce() -> T) -> &mut T {
        let i = match self.positions.get(key) {
            Some(&i) => i,
            None => {
                self.items.push(make());
                self.positions.insert(key.to_owned(), self.items.len() - 1);
                self.items.len() - 1
            }
        };
        &mut self.items[i]
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.positions.get(key).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'b, T> IntoIterator for &'b Buckets<T> {
    type Item = &'b T;
    type IntoIter = std::slice::Iter<'b, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The three indexes built over a post sequence.
#[derive(Debug, Default)]
pub struct Indexes<'a> {
    pub categories: Buckets<Bucket<'a>>,
    pub tags: Buckets<Bucket<'a>>,
    pub archives: Buckets<Archive<'a>>,
}

/// Indexes `posts` (which must already be sorted) in a single pass.
pub fn build_indexes(posts: &[Post]) -> Indexes<'_> {
    let mut indexes = Indexes::default();

    for post in posts {
        indexes
            .categories
            .entry(&post.category, || Bucket {
                name: post.category.clone(),
                posts: Vec::new(),
            })
            .posts
            .push(post);

        for tag in &post.tags {
            indexes
                .tags
                .entry(tag, || Bucket {
                    name: tag.clone(),
                    posts: Vec::new(),
                })
                .posts
                .push(post);
        }

        let key = format!("{}-{}", post.year, post.month);
        indexes
            .archives
            .entry(&key, || Archive {
                year: post.year.clone(),
                month: post.month.clone(),
                posts: Vec::new(),
            })
            .posts
            .push(post);
    }

    indexes
}
