//! Measurement-driven page filling for `daf` documents.

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

mod column;
mod emit;
mod grid;
mod ordinal;
mod page_fill;
mod surface;

pub use column::{balance_columns, effective_spacing};
pub use daf::PageSide;
pub use emit::{emit_until, EmitOutcome, SourceCursor};
pub use grid::{FixedGridSurface, GridGeometry, GridHost};
pub use ordinal::{ArabicNumerals, HebrewNumerals, OrdinalFormatter};
pub use page_fill::{BuildSummary, FillOptions, PageBuilder};
pub use surface::{
    ContainerId, ContainerKind, ContainerSpec, FinishedPage, Measure, PageHost, PageSurface, Width,
};
