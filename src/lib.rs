//! Core model for paginating canonical texts with aligned commentaries:
//! hierarchical verse addresses, range expressions, the per-build source
//! cache, and typed page templates.
//!
//! The page-filling engine that consumes this model lives in the
//! `daf-render` crate; this crate is deliberately free of any rendering
//! or measurement concern.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod cache;
pub mod error;
pub mod location;
pub mod range;
pub mod repository;
pub mod template;

pub use cache::{FetchedText, SourceCache};
pub use error::{Error, TemplateError};
pub use location::{Language, Location, VerseRecord};
pub use range::{parse_ranges, parse_ranges_with_limit, Range};
pub use repository::{SectionMeta, SectionText, SourceIndex, TextNode, TextRepository};
pub use template::{
    ModuleConfig, ModuleOverrides, PageSide, PageTemplate, RangeSpec, ResolvedTemplate, RowConfig,
    RowOverrides, TemplateOverrides,
};
