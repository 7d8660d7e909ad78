//! Relevance ordering for search hits.
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use log::trace;

use crate::Entry;

const CONTENT_HIT: i64 = 10;
const CONTENT_PREFIX_HIT: i64 = 5;
const TAG_HIT: i64 = 8;
const URL_TITLE_HIT: i64 = 7;
const URL_HIT: i64 = 6;
const KIND_HIT: i64 = 3;

/// Orders entries by relevance to `query`, newest first on ties.
pub fn rank_entries(entries: Vec<Entry>, query: &str) -> Vec<Entry> {
    let query = query.trim().to_lowercase();
    let matcher = SkimMatcherV2::default();

    struct ScoredEntry {
        entry: Entry,
        score: i64,
    }

    let mut scored: Vec<ScoredEntry> = entries
        .into_iter()
        .map(|entry| {
            let score = score_entry(&matcher, &entry, &query);
            trace!("Entry {} scored {}", entry.id, score);
            ScoredEntry { entry, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
    });
    scored.into_iter().map(|s| s.entry).collect()
}

/// Newest first.
pub fn sort_by_recency(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

fn score_entry(matcher: &SkimMatcherV2, entry: &Entry, query: &str) -> i64 {
    if query.is_empty() {
        return 0;
    }
    let content = entry.content.to_lowercase();
    let mut score = 0;

    if content.contains(query) {
        score += CONTENT_HIT;
        if content.starts_with(query) {
            score += CONTENT_PREFIX_HIT;
        }
    }
    score += TAG_HIT
        * entry
            .tags
            .iter()
            .filter(|t| t.to_lowercase().contains(query))
            .count() as i64;
    if let Some(url) = &entry.url {
        if url.to_lowercase().contains(query) {
            score += URL_HIT;
        }
    }
    if let Some(title) = &entry.url_title {
        if title.to_lowercase().contains(query) {
            score += URL_TITLE_HIT;
        }
    }
    if entry.kind.as_str().contains(query) {
        score += KIND_HIT;
    }

    // fuzzy score only breaks ties between otherwise equal substring hits
    let fuzzy = matcher.fuzzy_match(&content, query).unwrap_or(0);
    score * 1000 + fuzzy.min(999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryKind;
    use chrono::Duration;

    fn entry(content: &str, minutes_ago: i64) -> Entry {
        let mut e = Entry::new(content);
        e.created_at -= Duration::minutes(minutes_ago);
        e
    }

    #[test]
    fn prefix_and_tag_hits_rank_first() {
        let mut tagged = entry("notes on the borrow checker", 30);
        tagged.add_tag("rust");
        let prefix = entry("rust lifetimes explained", 20);
        let mention = entry("tried some rust today", 10);

        let ranked = rank_entries(vec![mention.clone(), tagged.clone(), prefix.clone()], "Rust");
        assert_eq!(ranked[0].id, prefix.id);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn ties_prefer_newest() {
        let old = entry("same words", 60);
        let new = entry("same words", 1);
        let ranked = rank_entries(vec![old.clone(), new.clone()], "same");
        assert_eq!(ranked[0].id, new.id);
    }

    #[test]
    fn url_title_counts() {
        let mut link = entry("bookmark", 5);
        link.kind = EntryKind::Link;
        link.url = Some("https://example.com".into());
        link.url_title = Some("Tokio Tutorial".into());
        let plain = entry("bookmark", 1);
        let ranked = rank_entries(vec![plain, link.clone()], "tokio");
        assert_eq!(ranked[0].id, link.id);
    }

    #[test]
    fn recency_sort_is_descending() {
        let a = entry("a", 10);
        let b = entry("b", 0);
        let sorted = sort_by_recency(vec![a.clone(), b.clone()]);
        assert_eq!(sorted[0].id, b.id);
        assert_eq!(sorted[1].id, a.id);
    }
}
