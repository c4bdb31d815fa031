//! A character-grid surface for tests and terminal previews.
//!
//! The grid models a page as a monospaced rectangle: every fragment is
//! word-wrapped at a column's width in characters, heights are line
//! counts, and overflow means more lines than the page holds. Font
//! scale rounds up to whole line heights; wrapping width is unaffected
//! and font families are ignored.

use crate::surface::{
    ContainerId, ContainerKind, ContainerSpec, FinishedPage, Measure, PageHost, PageSurface, Width,
};
use daf::PageSide;

/// Page rectangle and column gutter, all in character cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGeometry {
    /// Page width in characters.
    pub width: u32,
    /// Page height in lines.
    pub height: u32,
    /// Blank columns between side-by-side containers.
    pub gutter: u32,
}

impl GridGeometry {
    /// A folio-like page: wide enough for two readable columns.
    pub fn folio() -> Self {
        Self {
            width: 60,
            height: 24,
            gutter: 2,
        }
    }

    /// A deliberately small page for exercising overflow paths.
    pub fn pocket() -> Self {
        Self {
            width: 20,
            height: 6,
            gutter: 1,
        }
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::folio()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum NodeKind {
    /// Children stack vertically at full width. Only the root.
    Stack,
    /// Children sit side by side.
    Row,
    /// Nested containers are blocks; fragment runs flow inline.
    Text,
}

#[derive(Clone, Debug)]
enum Child {
    Node(usize),
    Fragment(String),
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<Child>,
    width: Option<Width>,
    visible: bool,
    line_height: u32,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            width: None,
            visible: true,
            line_height: 1,
        }
    }
}

/// [`PageSurface`] backed by a character grid.
pub struct FixedGridSurface {
    geometry: GridGeometry,
    nodes: Vec<Node>,
}

impl FixedGridSurface {
    /// An empty page on the given grid.
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            nodes: vec![Node::new(NodeKind::Stack)],
        }
    }

    /// The page rendered as lines of text, one entry per grid line.
    ///
    /// Lines beyond the page height are included, so an overflowing page
    /// dumps longer than `geometry.height`.
    pub fn dump(&self) -> Vec<String> {
        self.render(0, self.geometry.width)
    }

    /// Width assigned to a container, if any was set.
    pub fn assigned_width(&self, container: ContainerId) -> Option<Width> {
        self.node(container).width
    }

    fn node(&self, id: ContainerId) -> &Node {
        &self.nodes[id.0]
    }

    fn height_of(&self, index: usize, width: u32) -> u32 {
        self.render(index, width).len() as u32
    }

    /// Lays out a node at `width` and returns its lines, unpadded.
    fn render(&self, index: usize, width: u32) -> Vec<String> {
        let node = &self.nodes[index];
        if !node.visible {
            return Vec::new();
        }
        match node.kind {
            NodeKind::Stack => {
                let mut lines = Vec::new();
                for child in &node.children {
                    if let Child::Node(i) = child {
                        lines.extend(self.render(*i, width));
                    }
                }
                lines
            }
            NodeKind::Row => self.render_row(node, width),
            NodeKind::Text => self.render_text(node, width),
        }
    }

    fn render_text(&self, node: &Node, width: u32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut inline = String::new();
        for child in &node.children {
            match child {
                Child::Node(i) => {
                    scaled(&mut lines, wrap(&inline, width), node.line_height);
                    inline.clear();
                    lines.extend(self.render(*i, width));
                }
                Child::Fragment(text) => inline.push_str(text),
            }
        }
        scaled(&mut lines, wrap(&inline, width), node.line_height);
        lines
    }

    fn render_row(&self, node: &Node, width: u32) -> Vec<String> {
        let columns: Vec<usize> = node
            .children
            .iter()
            .filter_map(|c| match c {
                Child::Node(i) if self.nodes[*i].visible => Some(*i),
                _ => None,
            })
            .collect();
        if columns.is_empty() {
            return Vec::new();
        }
        let gutters = self.geometry.gutter * (columns.len() as u32 - 1);
        let available = width.saturating_sub(gutters);
        let widths = self.column_widths(&columns, available);

        let rendered: Vec<Vec<String>> = columns
            .iter()
            .zip(&widths)
            .map(|(i, w)| self.render(*i, *w))
            .collect();
        let height = rendered.iter().map(Vec::len).max().unwrap_or(0);

        let mut lines = Vec::with_capacity(height);
        for line in 0..height {
            let mut out = String::new();
            for (column, w) in rendered.iter().zip(&widths) {
                if !out.is_empty() {
                    for _ in 0..self.geometry.gutter {
                        out.push(' ');
                    }
                }
                let text = column.get(line).map(String::as_str).unwrap_or("");
                out.push_str(text);
                for _ in text.chars().count()..*w as usize {
                    out.push(' ');
                }
            }
            lines.push(out);
        }
        lines
    }

    /// Resolves column widths inside `available` space.
    ///
    /// Percent widths take their share first; natural and unassigned
    /// columns split whatever remains. Every column gets at least one
    /// character so wrapping always terminates.
    fn column_widths(&self, columns: &[usize], available: u32) -> Vec<u32> {
        let mut widths = vec![0u32; columns.len()];
        let mut natural = Vec::new();
        let mut used = 0u32;
        for (slot, index) in columns.iter().enumerate() {
            match self.nodes[*index].width {
                Some(Width::Percent(p)) => {
                    let w = (available * u32::from(p) / 100).max(1);
                    widths[slot] = w;
                    used += w;
                }
                Some(Width::Natural) | None => natural.push(slot),
            }
        }
        if !natural.is_empty() {
            let leftover = available.saturating_sub(used);
            let share = (leftover / natural.len() as u32).max(1);
            for slot in natural {
                widths[slot] = share;
            }
        }
        widths
    }
}

impl PageSurface for FixedGridSurface {
    fn root(&self) -> ContainerId {
        ContainerId(0)
    }

    fn create_container(&mut self, parent: ContainerId, spec: ContainerSpec) -> ContainerId {
        let kind = match spec.kind {
            ContainerKind::Row => NodeKind::Row,
            ContainerKind::Text => NodeKind::Text,
        };
        let index = self.nodes.len();
        let mut node = Node::new(kind);
        node.line_height = spec.font_scale.max(1.0).ceil() as u32;
        self.nodes.push(node);
        self.nodes[parent.0].children.push(Child::Node(index));
        ContainerId(index)
    }

    fn append(&mut self, container: ContainerId, fragment: &str) {
        self.nodes[container.0]
            .children
            .push(Child::Fragment(fragment.to_string()));
    }

    fn replace_last(&mut self, container: ContainerId, fragment: &str) {
        if let Some(Child::Fragment(text)) = self.nodes[container.0].children.last_mut() {
            text.clear();
            text.push_str(fragment);
        }
    }

    fn remove_last(&mut self, container: ContainerId) {
        if let Some(Child::Fragment(_)) = self.nodes[container.0].children.last() {
            self.nodes[container.0].children.pop();
        }
    }

    fn child_count(&self, container: ContainerId) -> usize {
        self.node(container).children.len()
    }

    fn set_width(&mut self, container: ContainerId, width: Width) {
        self.nodes[container.0].width = Some(width);
    }

    fn set_visible(&mut self, container: ContainerId, visible: bool) {
        self.nodes[container.0].visible = visible;
    }

    fn measure(&mut self, container: ContainerId) -> Measure {
        let content = self.height_of(container.0, self.geometry.width);
        let available = if container.0 == 0 {
            self.geometry.height
        } else {
            // Space the rest of the page leaves this subtree.
            let mut hidden = self.clone_visibility();
            hidden[container.0] = false;
            let others = self.height_without(&hidden);
            self.geometry.height.saturating_sub(others)
        };
        Measure { content, available }
    }
}

impl FixedGridSurface {
    fn clone_visibility(&self) -> Vec<bool> {
        self.nodes.iter().map(|n| n.visible).collect()
    }

    fn height_without(&self, visible: &[bool]) -> u32 {
        let mut masked = Self {
            geometry: self.geometry,
            nodes: self.nodes.clone(),
        };
        for (node, flag) in masked.nodes.iter_mut().zip(visible) {
            node.visible = *flag;
        }
        masked.height_of(0, masked.geometry.width)
    }
}

/// Pushes wrapped lines, padding each with blank lines for oversize
/// line heights.
fn scaled(out: &mut Vec<String>, lines: Vec<String>, line_height: u32) {
    for line in lines {
        out.push(line);
        for _ in 1..line_height {
            out.push(String::new());
        }
    }
}

/// Greedy word wrap at `width` characters; words longer than a line are
/// hard-broken. Whitespace collapses, and empty text produces no lines.
fn wrap(text: &str, width: u32) -> Vec<String> {
    let width = width.max(1) as usize;
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;
    for word in text.split_whitespace() {
        let mut word_len = word.chars().count();
        let mut word = word;
        // Hard-break words that can never fit on one line.
        while word_len > width {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
            word_len = word.chars().count();
        }
        let needed = if line_len == 0 { word_len } else { word_len + 1 };
        if line_len + needed > width && line_len > 0 {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.push_str(word);
        line_len += word_len;
    }
    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// [`PageHost`] that mints grid surfaces and keeps every finished page.
pub struct GridHost {
    geometry: GridGeometry,
    /// Finished pages in build order.
    pub pages: Vec<FinishedPage<FixedGridSurface>>,
}

impl GridHost {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
        }
    }
}

impl PageHost for GridHost {
    type Surface = FixedGridSurface;

    fn begin_page(&mut self, _number: u32, _side: PageSide) -> FixedGridSurface {
        FixedGridSurface::new(self.geometry)
    }

    fn finish_page(&mut self, page: FinishedPage<FixedGridSurface>) {
        self.pages.push(page);
    }
}
