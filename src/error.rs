//! Error taxonomy for source fetching and template resolution.

use thiserror::Error;

/// Top-level error for the core crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote fetch failed.
    ///
    /// Terminal: page building has no recovery path for missing text, so
    /// the failure is surfaced to the caller instead of a blank page.
    #[error("fetching {reference:?} failed: {message}")]
    Fetch {
        /// The reference whose fetch failed.
        reference: String,
        /// Repository-provided description.
        message: String,
    },

    /// The page template is structurally unusable.
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),

    /// A template could not be decoded from JSON.
    #[error("template JSON: {0}")]
    TemplateJson(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::Fetch`] for `reference`.
    pub fn fetch(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Structural template problems found during resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// No module is marked as the main text.
    #[error("no module is marked main")]
    NoMainModule,
    /// More than one module is marked as the main text.
    #[error("{0} modules are marked main, expected exactly one")]
    MultipleMainModules(usize),
    /// A double row names the same module on both sides.
    #[error("row places module {0:?} on both sides")]
    DuplicateModule(String),
}
