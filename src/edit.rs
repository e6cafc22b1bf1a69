//! Batch tag edits over cached articles
//!
//! Edits are applied locally and then pushed with
//! [`SyncEngine::push_edits`](crate::sync::SyncEngine::push_edits).

use std::collections::BTreeSet;

use crate::client::Article;

/// Add `tag` to every article that lacks it; returns how many changed.
///
/// Surrounding whitespace is trimmed and an empty tag is ignored.
pub fn add_tag(articles: &mut [Article], tag: &str) -> usize {
    let tag = tag.trim();
    if tag.is_empty() {
        return 0;
    }

    let mut changed = 0;
    for article in articles.iter_mut() {
        let mut tags = article.tags();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
            article.set_tags(tags);
            changed += 1;
        }
    }
    changed
}

/// Remove `tag` from every article carrying it; returns how many changed.
pub fn remove_tag(articles: &mut [Article], tag: &str) -> usize {
    let tag = tag.trim();
    let mut changed = 0;
    for article in articles.iter_mut() {
        let tags = article.tags();
        let kept: Vec<String> = tags.iter().filter(|t| *t != tag).cloned().collect();
        if kept.len() != tags.len() {
            article.set_tags(kept);
            changed += 1;
        }
    }
    changed
}

/// Tags present on any of the articles, sorted
pub fn tag_union(articles: &[Article]) -> BTreeSet<String> {
    articles.iter().flat_map(|a| a.tags()).collect()
}

/// Tags present on every one of the articles, sorted. Empty for no articles.
pub fn tag_intersection(articles: &[Article]) -> BTreeSet<String> {
    let mut iter = articles.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };

    let mut common: BTreeSet<String> = first.tags().into_iter().collect();
    for article in iter {
        let tags: BTreeSet<String> = article.tags().into_iter().collect();
        common.retain(|t| tags.contains(t));
    }
    common
}
