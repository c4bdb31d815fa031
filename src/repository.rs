//! The remote text-repository seam.

use crate::error::Error;

/// Nested per-language payload of one section fetch.
///
/// Remote responses mirror the source hierarchy: lists of lists with
/// string leaves, one nesting level per remaining address component. A
/// leaf at the root is a single verse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextNode {
    /// One verse's raw text.
    Leaf(String),
    /// One hierarchy level.
    List(Vec<TextNode>),
}

impl TextNode {
    /// A leaf node.
    pub fn leaf(text: impl Into<String>) -> Self {
        Self::Leaf(text.into())
    }

    /// A list node.
    pub fn list(nodes: impl IntoIterator<Item = TextNode>) -> Self {
        Self::List(nodes.into_iter().collect())
    }
}

impl Default for TextNode {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Both language streams of one fetched section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionText {
    /// Canonical-language nested text.
    pub primary: TextNode,
    /// Aligned translation nested text.
    pub secondary: TextNode,
}

/// Shape metadata for one source reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceIndex {
    /// Number of address components; remote indexes default this to 2
    /// (chapter.verse).
    pub depth: u8,
    /// True when the source is split into independently titled sections.
    pub multi_section: bool,
    /// Per-section metadata; single-section sources carry one entry.
    pub sections: Vec<SectionMeta>,
}

/// Metadata of one section of a source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionMeta {
    /// Section title as it appears inside references.
    pub title: String,
    /// Title of the text this section comments on, when declared.
    pub base_text: Option<String>,
}

impl SectionMeta {
    /// Build section metadata.
    pub fn new(title: impl Into<String>, base_text: Option<String>) -> Self {
        Self {
            title: title.into(),
            base_text,
        }
    }
}

impl SourceIndex {
    /// Single-section index at the default depth of 2.
    pub fn single(title: impl Into<String>, base_text: Option<String>) -> Self {
        Self {
            depth: 2,
            multi_section: false,
            sections: vec![SectionMeta::new(title, base_text)],
        }
    }

    /// Multi-section index at the default depth of 2.
    pub fn multi(sections: Vec<SectionMeta>) -> Self {
        Self {
            depth: 2,
            multi_section: true,
            sections,
        }
    }

    /// Same index with an explicit depth.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// The section a reference resolves to.
    ///
    /// Multi-section sources pick the last section whose title occurs in
    /// the reference, falling back to the first section; single-section
    /// sources always resolve to their only entry.
    pub fn section_for(&self, reference: &str) -> Option<&SectionMeta> {
        if self.multi_section {
            self.sections
                .iter()
                .rev()
                .find(|section| reference.contains(&section.title))
                .or_else(|| self.sections.first())
        } else {
            self.sections.first()
        }
    }
}

/// Remote text repository.
///
/// The pagination pass is single threaded and awaits these futures
/// inline, so they are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait TextRepository {
    /// Fetch the nested text of `reference` restricted by `query`, a
    /// serialized range such as `"3.2-3.10"`.
    ///
    /// Must be safe to call repeatedly with overlapping queries; the
    /// cache's query memo keeps repeats off the network, not this method.
    async fn fetch_section_text(&self, reference: &str, query: &str)
        -> Result<SectionText, Error>;

    /// Fetch shape metadata for `reference`.
    async fn fetch_detailed_index(&self, reference: &str) -> Result<SourceIndex, Error>;
}
