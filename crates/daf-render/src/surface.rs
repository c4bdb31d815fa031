//! The measurable-container seam between the fill algorithm and any
//! concrete rendering target.
//!
//! Page capacity is only knowable by rendering and measuring, so the
//! filler works exclusively through these operations: append a fragment,
//! rebalance, measure, and react. Mutation and measurement live on the
//! same object because a measurement is only valid immediately after the
//! mutation it reflects.

use daf::PageSide;

/// Opaque handle to one container on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(pub usize);

/// What a container holds, which decides how a surface lays it out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    /// A horizontal band; child containers sit side by side.
    Row,
    /// A text block; fragments flow and wrap vertically.
    Text,
}

/// Creation-time properties of a container.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerSpec {
    /// Layout behavior.
    pub kind: ContainerKind,
    /// Text size multiplier (1.0 = body size).
    pub font_scale: f32,
    /// Font family name; surfaces without font handling ignore it.
    pub font_family: String,
}

impl ContainerSpec {
    /// A side-by-side row container.
    pub fn row() -> Self {
        Self {
            kind: ContainerKind::Row,
            font_scale: 1.0,
            font_family: "default".to_string(),
        }
    }

    /// A text block at the given scale and family.
    pub fn text(font_scale: f32, font_family: impl Into<String>) -> Self {
        Self {
            kind: ContainerKind::Text,
            font_scale,
            font_family: font_family.into(),
        }
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        Self::text(1.0, "default")
    }
}

/// Width assignment for a column inside a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    /// Percentage of the row width, minus the surface's gutter.
    Percent(u8),
    /// Content-driven: consume whatever the sibling column leaves.
    Natural,
}

/// Result of measuring a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measure {
    /// Rendered content extent, in surface units.
    pub content: u32,
    /// Space available before overflowing, in surface units.
    pub available: u32,
}

impl Measure {
    /// True when rendered content exceeds the available extent.
    pub fn overflows(&self) -> bool {
        self.content > self.available
    }
}

/// One page's mutable render target.
pub trait PageSurface {
    /// The page-level container; measuring it answers page overflow.
    fn root(&self) -> ContainerId;

    /// Create a child container under `parent`, after existing children.
    fn create_container(&mut self, parent: ContainerId, spec: ContainerSpec) -> ContainerId;

    /// Append a text fragment as a new child of `container`.
    fn append(&mut self, container: ContainerId, fragment: &str);

    /// Replace the most recently appended fragment of `container`.
    fn replace_last(&mut self, container: ContainerId, fragment: &str);

    /// Remove the most recently appended fragment of `container`.
    fn remove_last(&mut self, container: ContainerId);

    /// Number of children (containers and fragments) of `container`.
    fn child_count(&self, container: ContainerId) -> usize;

    /// Assign a column width inside its row.
    fn set_width(&mut self, container: ContainerId, width: Width);

    /// Show or hide a container; hidden containers measure as empty.
    fn set_visible(&mut self, container: ContainerId, visible: bool);

    /// Measure `container` against its available space.
    fn measure(&mut self, container: ContainerId) -> Measure;
}

/// Creates one surface per page and receives each finished page.
///
/// The surface type is the host's own, so a host gets its concrete
/// pages back with nothing erased.
pub trait PageHost {
    type Surface: PageSurface;

    /// Begin the surface for page `number` on `side`.
    fn begin_page(&mut self, number: u32, side: PageSide) -> Self::Surface;

    /// Receive a completed page.
    fn finish_page(&mut self, page: FinishedPage<Self::Surface>);
}

/// A completed page handed back to the host.
pub struct FinishedPage<S> {
    /// Zero-based build order of the page.
    pub number: u32,
    /// Physical side the page was built for.
    pub side: PageSide,
    /// The surface with all content in place.
    pub surface: S,
}
