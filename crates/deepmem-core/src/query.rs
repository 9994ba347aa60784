//! Search ranking and the filter/sort/limit pipeline used by search and list.

use crate::schema::Record;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Exact-match filters shared by search and list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub min_importance: Option<u8>,
}

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(category) = &self.category
            && &record.category != category
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !record.tags.iter().any(|t| t == tag)
        {
            return false;
        }
        if let Some(min) = self.min_importance
            && record.importance < min
        {
            return false;
        }
        true
    }
}

/// Options for [`MemoryStore::search`](crate::MemoryStore::search).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub filter: Filter,
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Sort order for listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first
    #[default]
    Created,
    /// Highest importance first, newest first among equals
    Importance,
}

/// Options for [`MemoryStore::list`](crate::MemoryStore::list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub filter: Filter,
    pub sort: SortOrder,
    pub limit: usize,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            sort: SortOrder::default(),
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

/// Split a query into distinct lowercase words, first occurrence wins.
pub fn tokenize(query: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in query.split_whitespace().map(str::to_lowercase) {
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Lowercased searchable fields of one record.
struct Haystack {
    content: String,
    tags: String,
    category: String,
}

impl Haystack {
    fn of(record: &Record) -> Self {
        Self {
            content: record.content.to_lowercase(),
            tags: record.tags.join(" ").to_lowercase(),
            category: record.category.to_lowercase(),
        }
    }

    fn matches(&self, words: &[String]) -> bool {
        words.iter().any(|w| {
            self.content.contains(w.as_str())
                || self.tags.contains(w.as_str())
                || self.category.contains(w.as_str())
        })
    }

    fn rank_key(&self, record: &Record, words: &[String]) -> (usize, u8, DateTime<Utc>) {
        let relevance = words
            .iter()
            .filter(|w| self.content.contains(w.as_str()))
            .count();
        (relevance, record.importance, record.created_at)
    }
}

/// True when at least one word occurs in content, tags or category.
pub fn is_match(record: &Record, words: &[String]) -> bool {
    Haystack::of(record).matches(words)
}

/// Composite ranking key: (relevance, importance, createdAt), compared
/// descending. Relevance counts the words found in the content only.
pub fn rank_key(record: &Record, words: &[String]) -> (usize, u8, DateTime<Utc>) {
    Haystack::of(record).rank_key(record, words)
}

/// Rank `records` against `query`, filter, then truncate.
pub fn search(records: &[Record], query: &str, options: &SearchOptions) -> Vec<Record> {
    let words = tokenize(query);
    if words.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<_> = records
        .iter()
        .filter(|r| options.filter.matches(r))
        .filter_map(|r| {
            let haystack = Haystack::of(r);
            haystack
                .matches(&words)
                .then(|| (haystack.rank_key(r, &words), r))
        })
        .collect();

    ranked.sort_by_key(|(key, _)| Reverse(*key));
    ranked
        .into_iter()
        .take(options.limit)
        .map(|(_, r)| r.clone())
        .collect()
}

/// Filter, sort and truncate a copy of `records`.
pub fn list(records: &[Record], options: &ListOptions) -> Vec<Record> {
    let mut results: Vec<&Record> = records
        .iter()
        .filter(|r| options.filter.matches(r))
        .collect();

    match options.sort {
        SortOrder::Created => results.sort_by_key(|r| Reverse(r.created_at)),
        SortOrder::Importance => results.sort_by_key(|r| Reverse((r.importance, r.created_at))),
    }

    results
        .into_iter()
        .take(options.limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Metadata;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn record(id: &str, content: &str, tags: &[&str], importance: u8, minutes: i64) -> Record {
        Record {
            id: id.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: "general".to_string(),
            importance,
            created_at: at(minutes),
            updated_at: at(minutes),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("  Dark   MODE dark "), vec!["dark", "mode"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_rank_key_counts_content_words_only() {
        let r = record("a", "User prefers dark mode", &["theme"], 7, 0);
        let words = tokenize("dark mode theme");
        assert_eq!(rank_key(&r, &words), (2, 7, at(0)));
    }

    #[test]
    fn test_match_in_tags_or_category() {
        let mut r = record("a", "nothing relevant", &["credentials"], 5, 0);
        assert!(is_match(&r, &tokenize("cred")));
        r.category = "technical".to_string();
        assert!(is_match(&r, &tokenize("techn")));
        assert!(!is_match(&r, &tokenize("missing")));
    }

    #[test]
    fn test_search_ranking() {
        let records = vec![
            record("low", "dark theme", &[], 9, 0),
            record("both", "dark mode theme", &[], 1, 1),
            record("tagonly", "unrelated", &["dark"], 10, 2),
            record("none", "light", &[], 10, 3),
        ];
        let ids: Vec<_> = search(&records, "dark mode", &SearchOptions::default())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["both", "low", "tagonly"]);
    }

    #[test]
    fn test_search_agrees_with_match_and_key() {
        let records = vec![
            record("a", "Dark mode on", &["ui"], 4, 0),
            record("b", "light", &["dark"], 9, 1),
            record("c", "nothing", &[], 2, 2),
        ];
        let words = tokenize("dark mode");
        let mut expected: Vec<_> = records
            .iter()
            .filter(|r| is_match(r, &words))
            .map(|r| (rank_key(r, &words), r.id.clone()))
            .collect();
        expected.sort_by_key(|(key, _)| Reverse(*key));
        let expected: Vec<_> = expected.into_iter().map(|(_, id)| id).collect();

        let found: Vec<_> = search(&records, "dark mode", &SearchOptions::default())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(found, expected);
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn test_search_ties_break_on_importance_then_created() {
        let records = vec![
            record("old9", "api key", &[], 9, 0),
            record("new9", "api token", &[], 9, 5),
            record("new3", "api docs", &[], 3, 10),
        ];
        let ids: Vec<_> = search(&records, "api", &SearchOptions::default())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new9", "old9", "new3"]);
    }

    #[test]
    fn test_search_filters_and_limit() {
        let mut records: Vec<Record> = (0..15)
            .map(|i| record(&format!("r{i}"), "note", &["x"], (i % 10 + 1) as u8, i))
            .collect();
        records[0].category = "work".to_string();

        assert_eq!(search(&records, "note", &SearchOptions::default()).len(), 10);

        let opts = SearchOptions {
            filter: Filter {
                category: Some("work".to_string()),
                ..Filter::default()
            },
            limit: 10,
        };
        assert_eq!(search(&records, "note", &opts).len(), 1);

        let opts = SearchOptions {
            filter: Filter {
                min_importance: Some(9),
                tag: Some("x".to_string()),
                ..Filter::default()
            },
            limit: 10,
        };
        let found = search(&records, "note", &opts);
        assert!(found.iter().all(|r| r.importance >= 9));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_search_empty_query() {
        let records = vec![record("a", "anything", &[], 5, 0)];
        assert!(search(&records, " ", &SearchOptions::default()).is_empty());
    }

    #[test]
    fn test_search_is_stable() {
        let records: Vec<Record> = (0..6)
            .map(|i| record(&format!("r{i}"), "same text", &[], 5, 0))
            .collect();
        let first = search(&records, "same", &SearchOptions::default());
        let second = search(&records, "same", &SearchOptions::default());
        assert_eq!(first, second);
        assert_eq!(first[0].id, "r0");
    }

    #[test]
    fn test_list_by_importance() {
        let records = vec![
            record("three", "a", &[], 3, 0),
            record("nine-old", "b", &[], 9, 1),
            record("nine-new", "c", &[], 9, 2),
        ];
        let opts = ListOptions {
            sort: SortOrder::Importance,
            ..ListOptions::default()
        };
        let ids: Vec<_> = list(&records, &opts).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["nine-new", "nine-old", "three"]);
    }

    #[test]
    fn test_list_default_is_newest_first_and_limited() {
        let records: Vec<Record> = (0..30)
            .map(|i| record(&format!("r{i}"), "x", &[], 5, i))
            .collect();
        let listed = list(&records, &ListOptions::default());
        assert_eq!(listed.len(), DEFAULT_LIST_LIMIT);
        assert_eq!(listed[0].id, "r29");

        let opts = ListOptions {
            limit: 3,
            ..ListOptions::default()
        };
        assert_eq!(list(&records, &opts).len(), 3);
    }

    #[test]
    fn test_list_filter_by_tag() {
        let records = vec![
            record("a", "x", &["preferences", "ui"], 5, 0),
            record("b", "x", &["pref"], 5, 1),
        ];
        let opts = ListOptions {
            filter: Filter {
                tag: Some("preferences".to_string()),
                ..Filter::default()
            },
            ..ListOptions::default()
        };
        let listed = list(&records, &opts);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "a");
    }
}
