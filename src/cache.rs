//! Per-build source cache: fetch deduplication, normalized verse stores,
//! and range slicing.
//!
//! One [`SourceCache`] lives for exactly one page build. Stores are append
//! only: records are never re-validated or deduplicated after insertion,
//! because the query memo guarantees a given effective query is flattened
//! into the store at most once.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::Error;
use crate::location::{Language, Location, VerseRecord};
use crate::range::Range;
use crate::repository::{SourceIndex, TextNode, TextRepository};

/// Base-text chains longer than this fail closed.
const MAX_BASE_TEXT_HOPS: usize = 8;

/// Sorted verse stores for one reference.
#[derive(Clone, Debug, Default)]
struct LanguageStore {
    primary: Vec<VerseRecord>,
    secondary: Vec<VerseRecord>,
}

/// Verse slices returned by [`SourceCache::fetch_source`], one per
/// language, each independently sorted by location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchedText {
    /// Canonical-language records.
    pub primary: Vec<VerseRecord>,
    /// Translation records.
    pub secondary: Vec<VerseRecord>,
}

impl FetchedText {
    /// The stream for `language`.
    pub fn stream(&self, language: Language) -> &[VerseRecord] {
        match language {
            Language::Primary => &self.primary,
            Language::Secondary => &self.secondary,
        }
    }

    /// Fold another fetch's records in, used to accumulate the slices of
    /// a multi-sub-range expression.
    ///
    /// Sub-ranges arrive in expression order, which may run backwards or
    /// overlap at a boundary; the merged streams stay sorted by location
    /// and keep one record per location, the first fetched.
    pub fn extend(&mut self, other: Self) {
        merge_records(&mut self.primary, other.primary);
        merge_records(&mut self.secondary, other.secondary);
    }

    /// True when both streams are empty.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

fn merge_records(stream: &mut Vec<VerseRecord>, incoming: Vec<VerseRecord>) {
    stream.extend(incoming);
    stream.sort_by(|a, b| a.location.compare(&b.location));
    stream.dedup_by(|a, b| a.location == b.location);
}

/// Append-only text cache with query memoization, scoped to one build.
#[derive(Debug, Default)]
pub struct SourceCache {
    texts: HashMap<String, LanguageStore>,
    queries: HashSet<String>,
    indexes: HashMap<String, SourceIndex>,
}

impl SourceCache {
    /// Fresh cache for one build invocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and memoize the detailed index for `reference`.
    pub async fn detailed_index<R: TextRepository>(
        &mut self,
        repo: &R,
        reference: &str,
    ) -> Result<&SourceIndex, Error> {
        if !self.indexes.contains_key(reference) {
            debug!("fetching detailed index for {reference:?}");
            let index = repo.fetch_detailed_index(reference).await?;
            self.indexes.insert(reference.to_string(), index);
        }
        Ok(&self.indexes[reference])
    }

    /// Fetch `range` of `reference`, deduplicating against earlier queries.
    ///
    /// A repeated effective query is free: the memo skips the repository
    /// call and the answer comes straight from the store. Either way the
    /// result is the cached slice within `[start, end-or-start]` inclusive.
    pub async fn fetch_source<R: TextRepository>(
        &mut self,
        repo: &R,
        reference: &str,
        range: &Range,
    ) -> Result<FetchedText, Error> {
        // Index resolution precedes any text query; a broken index fails
        // the fetch.
        self.detailed_index(repo, reference).await?;
        let query_string = range.query_string();
        let query_key = format!("{reference} {query_string}");
        if self.queries.insert(query_key) {
            debug!("fetching {reference:?} range {query_string}");
            let section = repo.fetch_section_text(reference, &query_string).await?;
            let hidden = hidden_location(range);
            let first_axis = hidden.len();
            let store = self.texts.entry(reference.to_string()).or_default();
            flatten_into(
                &mut store.primary,
                section.primary,
                &hidden,
                first_axis,
                &range.start,
            );
            flatten_into(
                &mut store.secondary,
                section.secondary,
                &hidden,
                first_axis,
                &range.start,
            );
            store
                .primary
                .sort_by(|a, b| a.location.compare(&b.location));
            store
                .secondary
                .sort_by(|a, b| a.location.compare(&b.location));
        } else {
            debug!("query memo hit for {reference:?} range {query_string}");
        }
        Ok(self.range_slice(reference, range))
    }

    /// Cached records of `reference` within `range`, per language.
    pub fn range_slice(&self, reference: &str, range: &Range) -> FetchedText {
        match self.texts.get(reference) {
            Some(store) => FetchedText {
                primary: slice_records(&store.primary, range),
                secondary: slice_records(&store.secondary, range),
            },
            None => FetchedText::default(),
        }
    }

    /// Whether `commentary` descends from `base` through declared
    /// base-text links.
    ///
    /// Each hop resolves the current reference's section and follows its
    /// declared base-text title, comparing against the base's resolved
    /// title. A missing link, a revisited reference, or a chain longer
    /// than the hop bound fails closed; repository errors propagate.
    pub async fn has_base_text<R: TextRepository>(
        &mut self,
        repo: &R,
        commentary: &str,
        base: &str,
    ) -> Result<bool, Error> {
        let base_title = {
            let index = self.detailed_index(repo, base).await?;
            match index.section_for(base) {
                Some(section) => section.title.clone(),
                None => return Ok(false),
            }
        };
        let mut visited = HashSet::new();
        let mut cursor = commentary.to_string();
        for _ in 0..MAX_BASE_TEXT_HOPS {
            if !visited.insert(cursor.clone()) {
                debug!("base-text chain for {commentary:?} revisits {cursor:?}");
                return Ok(false);
            }
            let parent = {
                let index = self.detailed_index(repo, &cursor).await?;
                match index
                    .section_for(&cursor)
                    .and_then(|section| section.base_text.clone())
                {
                    Some(parent) => parent,
                    None => return Ok(false),
                }
            };
            if parent == base_title {
                return Ok(true);
            }
            cursor = parent;
        }
        debug!("base-text chain for {commentary:?} exceeds {MAX_BASE_TEXT_HOPS} hops");
        Ok(false)
    }
}

fn slice_records(records: &[VerseRecord], range: &Range) -> Vec<VerseRecord> {
    records
        .iter()
        .filter(|record| range.contains(&record.location))
        .cloned()
        .collect()
}

/// The longest leading prefix of the range where start and end pin the same
/// single value. Responses collapse those levels away, so their components
/// must be re-prepended to every flattened record.
fn hidden_location(range: &Range) -> Location {
    let mut hidden = Location::new();
    for (i, &start) in range.start.components().iter().enumerate() {
        let end = range.end.component(i).unwrap_or(start);
        if start != end {
            break;
        }
        hidden = hidden.child(start);
    }
    hidden
}

/// Flatten a nested response into verse records rooted at `path`.
///
/// `first_axis` is the hidden prefix length: the level right past the
/// pinned components is numbered from the query's start component for
/// that level (a mid-chapter slice keeps its real verse numbers); deeper
/// levels are numbered from 1. A leaf at the root becomes a single record
/// at the hidden location itself.
fn flatten_into(
    store: &mut Vec<VerseRecord>,
    node: TextNode,
    path: &Location,
    first_axis: usize,
    query_start: &Location,
) {
    match node {
        TextNode::Leaf(text) => store.push(VerseRecord::new(path.clone(), text)),
        TextNode::List(children) => {
            let base = if path.len() == first_axis {
                query_start.component(first_axis).unwrap_or(1)
            } else {
                1
            };
            for (offset, child) in children.into_iter().enumerate() {
                let child_path = path.child(base + offset as u32);
                flatten_into(store, child, &child_path, first_axis, query_start);
            }
        }
    }
}
