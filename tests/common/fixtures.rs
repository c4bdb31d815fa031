use std::cell::RefCell;
use std::collections::HashMap;

use daf::{parse_ranges, Error, Range, SectionText, SourceIndex, TextNode, TextRepository};

/// One fake remote source: shape metadata plus per-chapter verse lists.
pub struct FakeSource {
    index: SourceIndex,
    primary: Vec<Vec<String>>,
    secondary: Vec<Vec<String>>,
}

impl FakeSource {
    pub fn new(index: SourceIndex) -> Self {
        Self {
            index,
            primary: Vec::new(),
            secondary: Vec::new(),
        }
    }

    pub fn with_chapter(mut self, verses: &[&str]) -> Self {
        self.primary
            .push(verses.iter().map(|verse| verse.to_string()).collect());
        self
    }

    pub fn with_secondary_chapter(mut self, verses: &[&str]) -> Self {
        self.secondary
            .push(verses.iter().map(|verse| verse.to_string()).collect());
        self
    }
}

/// In-memory repository that shapes responses the way a remote does:
/// levels pinned by the query collapse away, so a chapter query yields a
/// flat verse list and a full-depth point yields a bare leaf.
#[derive(Default)]
pub struct FakeRepository {
    sources: HashMap<String, FakeSource>,
    text_log: RefCell<Vec<String>>,
    index_log: RefCell<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &str, source: FakeSource) {
        self.sources.insert(reference.to_string(), source);
    }

    /// Every text query issued so far, as `"reference query"` lines.
    pub fn text_queries(&self) -> Vec<String> {
        self.text_log.borrow().clone()
    }

    pub fn index_fetches(&self, reference: &str) -> usize {
        self.index_log
            .borrow()
            .iter()
            .filter(|fetched| fetched.as_str() == reference)
            .count()
    }
}

impl TextRepository for FakeRepository {
    async fn fetch_section_text(
        &self,
        reference: &str,
        query: &str,
    ) -> Result<SectionText, Error> {
        self.text_log
            .borrow_mut()
            .push(format!("{reference} {query}"));
        let source = self
            .sources
            .get(reference)
            .ok_or_else(|| Error::fetch(reference, "unknown reference"))?;
        let query = range(query);
        Ok(SectionText {
            primary: clip(&source.primary, &query),
            secondary: clip(&source.secondary, &query),
        })
    }

    async fn fetch_detailed_index(&self, reference: &str) -> Result<SourceIndex, Error> {
        self.index_log.borrow_mut().push(reference.to_string());
        self.sources
            .get(reference)
            .map(|source| source.index.clone())
            .ok_or_else(|| Error::fetch(reference, "unknown reference"))
    }
}

pub fn range(expression: &str) -> Range {
    parse_ranges(expression).into_iter().next().unwrap_or_default()
}

fn chapter(chapters: &[Vec<String>], number: u32) -> &[String] {
    chapters
        .get(number.saturating_sub(1) as usize)
        .map_or(&[], Vec::as_slice)
}

fn clip(chapters: &[Vec<String>], query: &Range) -> TextNode {
    let start = &query.start;
    let end = query.effective_end();
    let first = start.component(0).unwrap_or(1);
    let last = end.component(0).unwrap_or(first);
    if first != last {
        // Chapter span: one nested list per chapter, whole chapters only.
        return TextNode::list((first..=last).map(|number| {
            TextNode::list(
                chapter(chapters, number)
                    .iter()
                    .map(|verse| TextNode::leaf(verse.as_str())),
            )
        }));
    }
    let verses = chapter(chapters, first);
    match start.component(1) {
        None => TextNode::list(verses.iter().map(|verse| TextNode::leaf(verse.as_str()))),
        Some(from) => {
            if query.end.is_empty() {
                let text = verses
                    .get(from.saturating_sub(1) as usize)
                    .map_or("", String::as_str);
                return TextNode::leaf(text);
            }
            let to = end.component(1).unwrap_or(from);
            TextNode::list(
                verses
                    .iter()
                    .skip(from.saturating_sub(1) as usize)
                    .take(to.saturating_sub(from) as usize + 1)
                    .map(|verse| TextNode::leaf(verse.as_str())),
            )
        }
    }
}

/// The standard corpus: a two-chapter main text with an aligned
/// translation, a targum on it, a supercommentary on the targum, and an
/// unrelated second book.
pub fn exodus_repository() -> FakeRepository {
    let mut repo = FakeRepository::new();
    repo.insert(
        "Shemot",
        FakeSource::new(SourceIndex::single("Shemot", None))
            .with_chapter(&[
                "These are the names of the sons",
                "Every household came along",
                "A new king arose over the land",
            ])
            .with_chapter(&["A man went out", "She bore a son"])
            .with_secondary_chapter(&["names", "household", "king"])
            .with_secondary_chapter(&["went out", "bore"]),
    );
    repo.insert(
        "Targum Shemot",
        FakeSource::new(SourceIndex::single(
            "Targum Shemot",
            Some("Shemot".to_string()),
        ))
        .with_chapter(&[
            "And these are the names",
            "And the households came",
            "And a king arose",
        ])
        .with_chapter(&["And a man went", "And a son was born"]),
    );
    repo.insert(
        "Peirush on Targum Shemot",
        FakeSource::new(SourceIndex::single(
            "Peirush on Targum Shemot",
            Some("Targum Shemot".to_string()),
        ))
        .with_chapter(&["The names teach descent"]),
    );
    repo.insert(
        "Bereshit",
        FakeSource::new(SourceIndex::single("Bereshit", None))
            .with_chapter(&["In the beginning"]),
    );
    repo
}
