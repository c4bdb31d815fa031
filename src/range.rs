//! Range expressions over verse locations.
//!
//! A range expression is a comma-separated list of sub-ranges, each
//! `start[-end]`, each side a dotted component list: `"3.2-3.10"` spans
//! chapter 3 verses 2 through 10, `"3,5"` names chapters 3 and 5. Parsing
//! is lenient by policy: a missing or non-numeric component becomes `1`,
//! and nothing ever fails. Callers must not construct inverted ranges; the
//! parser does not enforce `start <= end`.

use log::debug;

use crate::location::Location;

/// A start/end pair of locations bounding a text query.
///
/// An empty `end` means "same as start": the range is a single point,
/// which via prefix-equal comparison may still cover a whole chapter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
    /// Inclusive lower bound.
    pub start: Location,
    /// Inclusive upper bound; empty means `start`.
    pub end: Location,
}

impl Range {
    /// Range spanning `start..=end`.
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Single-point range (empty end).
    pub fn point(start: Location) -> Self {
        Self {
            start,
            end: Location::new(),
        }
    }

    /// The upper bound, falling back to `start` when `end` is empty.
    pub fn effective_end(&self) -> &Location {
        if self.end.is_empty() {
            &self.start
        } else {
            &self.end
        }
    }

    /// Inclusive containment under the shared-prefix order.
    pub fn contains(&self, location: &Location) -> bool {
        self.start.compare(location).is_le() && location.compare(self.effective_end()).is_le()
    }

    /// Serialized form used as the remote query, e.g. `"3.2-3.10"`.
    ///
    /// Both sides are padded to `max(start.len, end.len)` components,
    /// missing or zero components defaulting to 1; the `-end` part is
    /// omitted when `end` is empty. Left inverse of [`parse_ranges`] for
    /// full-depth expressions.
    pub fn query_string(&self) -> String {
        let depth = self.start.len().max(self.end.len());
        let side = |location: &Location| {
            (0..depth)
                .map(|i| {
                    let component = location.component(i).unwrap_or(1);
                    let component = if component == 0 { 1 } else { component };
                    component.to_string()
                })
                .collect::<Vec<_>>()
                .join(".")
        };
        let mut rendered = side(&self.start);
        if !self.end.is_empty() {
            rendered.push('-');
            rendered.push_str(&side(&self.end));
        }
        rendered
    }
}

fn parse_side(side: &str) -> Location {
    side.split('.')
        .map(|part| part.trim().parse::<u32>().unwrap_or(1))
        .collect()
}

/// Parse a range expression into its sub-ranges.
pub fn parse_ranges(expression: &str) -> Vec<Range> {
    expression
        .split(',')
        .map(|sub| {
            let mut parts = sub.splitn(2, '-');
            let start = parse_side(parts.next().unwrap_or(""));
            let end = match parts.next() {
                Some(end) => parse_side(end),
                None => Location::new(),
            };
            Range::new(start, end)
        })
        .collect()
}

/// Parse a range expression, capping the number of sub-ranges.
///
/// Sub-ranges beyond `limit` are silently dropped; the cap protects the
/// primary source against unbounded comma lists.
pub fn parse_ranges_with_limit(expression: &str, limit: usize) -> Vec<Range> {
    let mut ranges = parse_ranges(expression);
    if ranges.len() > limit {
        debug!(
            "range expression {expression:?} has {} sub-ranges, keeping first {limit}",
            ranges.len()
        );
        ranges.truncate(limit);
    }
    ranges
}
