//! Verse emission with render-measure-backtrack overflow handling.
//!
//! Capacity is discovered, never computed: each verse chunk is appended
//! to its container, the page is measured, and on overflow the chunk is
//! trimmed back to the longest word boundary that fits. Whatever does
//! not fit stays addressed by the cursor and resumes on the next page.

use std::cmp::Ordering;

use daf::{Location, VerseRecord};
use log::warn;

use crate::ordinal::OrdinalFormatter;
use crate::surface::{ContainerId, PageSurface};

/// Resumable position within one source's verse list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceCursor {
    /// Index of the next verse to emit.
    pub verse_index: usize,
    /// Byte offset of the first unemitted character of that verse.
    ///
    /// Zero at a verse boundary; otherwise just past a space chosen by
    /// the overflow scan, so it always lands on a character boundary.
    pub char_offset: usize,
}

impl SourceCursor {
    /// True when nothing at or past the cursor remains in `verses`.
    pub fn exhausted(&self, verses: &[VerseRecord]) -> bool {
        self.verse_index >= verses.len()
    }
}

/// What one [`emit_until`] pass did to the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitOutcome {
    /// The page overflowed and the pass stopped early.
    pub overflowed: bool,
    /// At least one fragment stayed on the page.
    pub emitted_any: bool,
}

/// Emits verses from the cursor into `container` until `until` is
/// reached or the page overflows.
///
/// The container's first child is expected to be its heading; a pass
/// that leaves nothing beside the heading hides the container so an
/// idle module costs no page space. `rebalance` runs after every
/// mutation and before every measurement, which is how double rows keep
/// their column widths truthful while content arrives.
pub fn emit_until(
    surface: &mut dyn PageSurface,
    container: ContainerId,
    verses: &[VerseRecord],
    cursor: &mut SourceCursor,
    until: &Location,
    ordinals: &dyn OrdinalFormatter,
    rebalance: &mut dyn FnMut(&mut dyn PageSurface),
) -> EmitOutcome {
    surface.set_visible(container, true);
    let root = surface.root();
    let mut outcome = EmitOutcome::default();
    while let Some(record) = verses.get(cursor.verse_index) {
        if record.location.compare(until) != Ordering::Less {
            break;
        }
        let page_was_full = surface.measure(root).overflows();
        let text = record.data.get(cursor.char_offset..).unwrap_or("");
        let fragment = format_chunk(record, text, cursor.char_offset, ordinals);
        surface.append(container, &fragment);
        rebalance(surface);
        if !surface.measure(root).overflows() {
            outcome.emitted_any = true;
            cursor.verse_index += 1;
            cursor.char_offset = 0;
            continue;
        }
        outcome.overflowed = true;
        if backtrack(
            surface,
            container,
            record,
            cursor,
            ordinals,
            rebalance,
            page_was_full,
        ) {
            outcome.emitted_any = true;
        }
        break;
    }
    if surface.child_count(container) == 1 {
        surface.set_visible(container, false);
    }
    outcome
}

/// Trims the just-appended fragment back to the longest fitting piece.
///
/// Candidate break positions are the spaces of the verse text strictly
/// above the cursor, tried from the end downward. When a piece fits the
/// cursor moves past its trailing space. When nothing fits the fragment
/// is withdrawn and the verse carries over whole, except that a
/// container holding only its heading on a page that still had room
/// keeps the first word despite the overflow; deferring there would
/// rebuild the same empty page forever. Returns whether any piece was
/// kept.
fn backtrack(
    surface: &mut dyn PageSurface,
    container: ContainerId,
    record: &VerseRecord,
    cursor: &mut SourceCursor,
    ordinals: &dyn OrdinalFormatter,
    rebalance: &mut dyn FnMut(&mut dyn PageSurface),
    page_was_full: bool,
) -> bool {
    let root = surface.root();
    let data = record.data.as_str();
    let floor = cursor.char_offset.min(data.len());
    for at in (floor + 1..data.len().saturating_sub(1)).rev() {
        if data.as_bytes()[at] != b' ' {
            continue;
        }
        let piece = &data[floor..at];
        if piece.trim().is_empty() {
            // Every shorter piece is blank too.
            break;
        }
        let fragment = format_chunk(record, piece, floor, ordinals);
        surface.replace_last(container, &fragment);
        rebalance(surface);
        if !surface.measure(root).overflows() {
            cursor.char_offset = at + 1;
            return true;
        }
    }
    if !page_was_full && surface.child_count(container) == 2 {
        if let Some(end) = first_word_end(data, floor) {
            let fragment = format_chunk(record, &data[floor..end], floor, ordinals);
            surface.replace_last(container, &fragment);
            rebalance(surface);
            warn!(
                "verse {} overflows even as a single word; keeping it to make progress",
                record.location
            );
            if end >= data.len() {
                cursor.verse_index += 1;
                cursor.char_offset = 0;
            } else {
                cursor.char_offset = end + 1;
            }
            return true;
        }
    }
    surface.remove_last(container);
    rebalance(surface);
    false
}

/// End of the first word at or after `floor`, or `None` when only
/// whitespace remains.
fn first_word_end(data: &str, floor: usize) -> Option<usize> {
    let rest = data.get(floor..)?;
    let start = floor + rest.find(|c: char| c != ' ')?;
    Some(
        data[start..]
            .find(' ')
            .map(|i| start + i)
            .unwrap_or(data.len()),
    )
}

/// Display form of one verse chunk.
///
/// A chunk starting at the top of its verse is labeled with the verse
/// ordinal, except when a third address component past one marks it as
/// the middle of a run. Every chunk carries a trailing space so
/// adjacent verses never run together.
fn format_chunk(
    record: &VerseRecord,
    text: &str,
    char_offset: usize,
    ordinals: &dyn OrdinalFormatter,
) -> String {
    if char_offset == 0 {
        if let Some(verse) = record.location.component(1) {
            if record.location.component(2).map_or(true, |v| v <= 1) {
                return format!("{} {} ", ordinals.ordinal(verse), text);
            }
        }
    }
    format!("{text} ")
}
