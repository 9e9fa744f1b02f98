use std::collections::HashSet;

use crate::feed::types::{ParsedPost, Post};

/// Returns the posts from `fresh` that are not already present in `known`.
///
/// Two posts are the same when their title, link and description are all
/// equal; ids play no part. Relative order of `fresh` is preserved and
/// repeats within `fresh` itself are kept.
pub fn unique_posts(fresh: Vec<ParsedPost>, known: &[Post]) -> Vec<ParsedPost> {
    if known.is_empty() {
        return fresh;
    }

    let seen: HashSet<(&str, &str, &str)> = known.iter().map(Post::content_key).collect();

    fresh
        .into_iter()
        .filter(|post| !seen.contains(&post.content_key()))
        .collect()
}
