//! The build loop: fetch every module's text, then fill pages until all
//! sources are spent.
//!
//! Pages alternate right and left starting on the right. Within a page,
//! filling is paced by a frontier location: the main text emits its
//! current verse, every commentary catches up to just past it, and the
//! frontier advances. A page ends when the surface overflows; the build
//! ends when every cursor is exhausted.

use std::cmp::Ordering;
use std::collections::HashMap;

use daf::{
    parse_ranges, parse_ranges_with_limit, Error, FetchedText, Location, ModuleConfig, PageSide,
    Range, RangeSpec, ResolvedTemplate, RowConfig, SourceCache, TextRepository, VerseRecord,
};
use log::{trace, warn};

use crate::column::balance_columns;
use crate::emit::{emit_until, EmitOutcome, SourceCursor};
use crate::ordinal::{HebrewNumerals, OrdinalFormatter};
use crate::surface::{ContainerId, ContainerSpec, FinishedPage, PageHost, PageSurface};

const DEFAULT_RANGE_LIMIT: usize = 5;

/// Build tunables.
pub struct FillOptions {
    range_limit: usize,
    ordinals: Box<dyn OrdinalFormatter>,
}

impl FillOptions {
    pub fn new() -> Self {
        Self {
            range_limit: DEFAULT_RANGE_LIMIT,
            ordinals: Box::new(HebrewNumerals),
        }
    }

    /// Cap on the comma-separated sub-ranges of the main module's range.
    pub fn with_range_limit(mut self, limit: usize) -> Self {
        self.range_limit = limit;
        self
    }

    /// Ordinal style for verse labels, running headers, and page slots.
    pub fn with_ordinals(mut self, ordinals: impl OrdinalFormatter + 'static) -> Self {
        self.ordinals = Box::new(ordinals);
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// What a build produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Pages handed to the host.
    pub pages: u32,
    /// Sources whose accompany link failed validation; they render empty.
    pub degraded: Vec<String>,
}

/// One source's fetched verses plus the cursor over them.
///
/// Keyed by source reference, so two rows reading the same source share
/// one cursor and continue each other's progress.
struct ModuleStream {
    verses: Vec<VerseRecord>,
    cursor: SourceCursor,
}

impl ModuleStream {
    fn from_verses(verses: Vec<VerseRecord>) -> Self {
        Self {
            verses,
            cursor: SourceCursor::default(),
        }
    }

    fn pending(&self) -> Option<&Location> {
        self.verses
            .get(self.cursor.verse_index)
            .map(|record| &record.location)
    }

    fn exhausted(&self) -> bool {
        self.cursor.exhausted(&self.verses)
    }
}

struct HeaderBinding {
    title: ContainerId,
    page: ContainerId,
}

struct SlotBinding {
    source: String,
    main: bool,
    container: ContainerId,
}

impl SlotBinding {
    fn new(module: &ModuleConfig, container: ContainerId) -> Self {
        Self {
            source: module.source.clone(),
            main: module.main,
            container,
        }
    }
}

/// This page's containers for one template row.
enum RowBinding {
    Header(HeaderBinding),
    Single(SlotBinding),
    Double {
        left: SlotBinding,
        right: SlotBinding,
        spacing: u8,
        mirrored: bool,
    },
}

/// Where the main module landed on this page.
struct MainBinding {
    container: ContainerId,
    /// Column pair, spacing, and mirroring when the main sits in a
    /// double row; its emission then rebalances the row like any other.
    columns: Option<(ContainerId, ContainerId, u8, bool)>,
}

/// Builds the full page run for one document.
pub struct PageBuilder {
    options: FillOptions,
}

impl PageBuilder {
    pub fn new(options: FillOptions) -> Self {
        Self { options }
    }

    /// Fetch every module's text, then stream filled pages to `host`.
    ///
    /// The main module's text is fetched over its parsed sub-ranges;
    /// commentaries follow their own range or the main's. An accompany
    /// module whose base-text link does not reach the main source is
    /// degraded to an empty stream and reported in the summary. A main
    /// module with no verses in its language builds zero pages.
    pub async fn build<R: TextRepository, H: PageHost>(
        &self,
        repository: &R,
        cache: &mut SourceCache,
        template: &ResolvedTemplate,
        host: &mut H,
    ) -> Result<BuildSummary, Error> {
        let ordinals = self.options.ordinals.as_ref();
        let main = template.main();
        let main_expression: String = main.range.clone().into();
        let main_ranges = parse_ranges_with_limit(&main_expression, self.options.range_limit);
        let mut summary = BuildSummary::default();

        let mut fetched = FetchedText::default();
        for range in &main_ranges {
            fetched.extend(cache.fetch_source(repository, &main.source, range).await?);
        }
        let mut main_stream = ModuleStream::from_verses(fetched.stream(main.language).to_vec());
        if main_stream.verses.is_empty() {
            warn!(
                "main module {:?} has no verses in its language; building no pages",
                main.source
            );
            return Ok(summary);
        }

        let mut streams: HashMap<String, ModuleStream> = HashMap::new();
        for module in template.modules() {
            if module.main {
                continue;
            }
            let verses = fetch_module(
                repository,
                cache,
                module,
                main,
                &main_ranges,
                &mut summary,
            )
            .await?;
            streams.insert(module.source.clone(), ModuleStream::from_verses(verses));
        }

        let mut side = PageSide::Right;
        let mut page_number: u32 = 0;
        let mut fill_content = true;
        let mut main_ended = false;
        while fill_content {
            let mut surface = host.begin_page(page_number, side);
            let (bindings, main_binding) = render_page(&mut surface, template, side);
            let current = header_location(&main_stream);
            write_header(
                &mut surface,
                &bindings,
                main,
                &current,
                page_number,
                ordinals,
            );

            let mut room_exists = true;
            while room_exists && fill_content {
                let frontier = next_frontier(&main_stream, &streams);
                let mut progressed = false;
                let mut main_overflow = false;
                if !main_ended {
                    if let Some(binding) = &main_binding {
                        let outcome = emit_into(
                            &mut surface,
                            binding.container,
                            &mut main_stream,
                            &frontier,
                            ordinals,
                            binding.columns,
                        );
                        progressed |= outcome.emitted_any;
                        main_overflow = outcome.overflowed;
                    }
                }
                for binding in &bindings {
                    match binding {
                        RowBinding::Header(_) => {}
                        RowBinding::Single(slot) => {
                            if !slot.main {
                                let outcome = emit_slot(
                                    &mut surface,
                                    slot,
                                    None,
                                    &mut streams,
                                    &frontier,
                                    ordinals,
                                );
                                progressed |= outcome.emitted_any;
                                room_exists = !outcome.overflowed;
                            }
                        }
                        RowBinding::Double {
                            left,
                            right,
                            spacing,
                            mirrored,
                        } => {
                            let columns =
                                Some((left.container, right.container, *spacing, *mirrored));
                            if !left.main {
                                let outcome = emit_slot(
                                    &mut surface,
                                    left,
                                    columns,
                                    &mut streams,
                                    &frontier,
                                    ordinals,
                                );
                                progressed |= outcome.emitted_any;
                                room_exists = !outcome.overflowed;
                            }
                            // The right column is not attempted once the
                            // left overflows.
                            if room_exists && !right.main {
                                let outcome = emit_slot(
                                    &mut surface,
                                    right,
                                    columns,
                                    &mut streams,
                                    &frontier,
                                    ordinals,
                                );
                                progressed |= outcome.emitted_any;
                                room_exists = !outcome.overflowed;
                            }
                        }
                    }
                    if !room_exists {
                        break;
                    }
                }
                if main_overflow {
                    // The other rows take one turn against the full
                    // page, then the page ends.
                    room_exists = false;
                }
                main_ended = main_stream.exhausted();
                if main_ended {
                    fill_content = !streams.values().all(ModuleStream::exhausted);
                }
                if !progressed {
                    // Nothing moved. After an overflow the next page
                    // gets a fresh try; with room still left the same
                    // pass would repeat on every later page.
                    if room_exists && fill_content {
                        warn!("fill stalled on page {page_number}; ending the build");
                        fill_content = false;
                    }
                    break;
                }
            }

            trace!("page {page_number} ({side:?}) complete");
            host.finish_page(FinishedPage {
                number: page_number,
                side,
                surface,
            });
            summary.pages += 1;
            page_number += 1;
            side = side.flipped();
        }
        Ok(summary)
    }
}

/// Fetches one commentary's verses, honoring accompany validation and
/// the range-follows-main rule.
async fn fetch_module<R: TextRepository>(
    repository: &R,
    cache: &mut SourceCache,
    module: &ModuleConfig,
    main: &ModuleConfig,
    main_ranges: &[Range],
    summary: &mut BuildSummary,
) -> Result<Vec<VerseRecord>, Error> {
    if module.accompany
        && !cache
            .has_base_text(repository, &module.source, &main.source)
            .await?
    {
        warn!(
            "{:?} does not accompany {:?}; rendering it empty",
            module.source, main.source
        );
        if !summary.degraded.contains(&module.source) {
            summary.degraded.push(module.source.clone());
        }
        return Ok(Vec::new());
    }
    let ranges = match &module.range {
        RangeSpec::All => main_ranges.to_vec(),
        RangeSpec::Expr(expression) => parse_ranges(expression),
    };
    let mut fetched = FetchedText::default();
    for range in &ranges {
        fetched.extend(cache.fetch_source(repository, &module.source, range).await?);
    }
    Ok(fetched.stream(module.language).to_vec())
}

/// Creates this page's containers for every template row.
///
/// Module containers get their heading as a first child; commentary
/// headings carry the module title, the main module's stays empty. On a
/// mirrored page the module-to-column bindings of double rows swap
/// while the columns stay put.
fn render_page(
    surface: &mut dyn PageSurface,
    template: &ResolvedTemplate,
    side: PageSide,
) -> (Vec<RowBinding>, Option<MainBinding>) {
    let (rows, mirrored) = template.rows_for(side);
    let root = surface.root();
    let mut bindings = Vec::with_capacity(rows.len());
    let mut main_binding = None;
    for row in rows {
        match row {
            RowConfig::Header => {
                let band = surface.create_container(root, ContainerSpec::row());
                let outer_left = surface.create_container(band, ContainerSpec::default());
                let center = surface.create_container(band, ContainerSpec::default());
                let outer_right = surface.create_container(band, ContainerSpec::default());
                let page = if mirrored { outer_left } else { outer_right };
                bindings.push(RowBinding::Header(HeaderBinding {
                    title: center,
                    page,
                }));
            }
            RowConfig::Single(module) => {
                let container = module_container(surface, root, module);
                if module.main {
                    main_binding = Some(MainBinding {
                        container,
                        columns: None,
                    });
                }
                bindings.push(RowBinding::Single(SlotBinding::new(module, container)));
            }
            RowConfig::Double {
                left,
                right,
                spacing,
            } => {
                let band = surface.create_container(root, ContainerSpec::row());
                let (left_module, right_module) =
                    if mirrored { (right, left) } else { (left, right) };
                let left_container = module_container(surface, band, left_module);
                let right_container = module_container(surface, band, right_module);
                let columns = Some((left_container, right_container, *spacing, mirrored));
                if left_module.main {
                    main_binding = Some(MainBinding {
                        container: left_container,
                        columns,
                    });
                }
                if right_module.main {
                    main_binding = Some(MainBinding {
                        container: right_container,
                        columns,
                    });
                }
                bindings.push(RowBinding::Double {
                    left: SlotBinding::new(left_module, left_container),
                    right: SlotBinding::new(right_module, right_container),
                    spacing: *spacing,
                    mirrored,
                });
            }
        }
    }
    (bindings, main_binding)
}

fn module_container(
    surface: &mut dyn PageSurface,
    parent: ContainerId,
    module: &ModuleConfig,
) -> ContainerId {
    let container = surface.create_container(
        parent,
        ContainerSpec::text(module.font_scale, module.font.clone()),
    );
    let heading = surface.create_container(container, ContainerSpec::default());
    if !module.main {
        surface.append(heading, &module.title);
    }
    container
}

/// The location naming the page in its running header: the main verse
/// the page starts on, clamped to the last verse once the main is spent.
fn header_location(main: &ModuleStream) -> Location {
    let position = main
        .cursor
        .verse_index
        .min(main.verses.len().saturating_sub(1));
    main.verses
        .get(position)
        .map(|record| record.location.clone())
        .unwrap_or_default()
}

fn write_header(
    surface: &mut dyn PageSurface,
    bindings: &[RowBinding],
    main: &ModuleConfig,
    current: &Location,
    page_number: u32,
    ordinals: &dyn OrdinalFormatter,
) {
    let mut title = main.title.clone();
    if let Some(chapter) = current
        .len()
        .checked_sub(2)
        .and_then(|index| current.component(index))
    {
        title.push(' ');
        title.push_str(&ordinals.ordinal(chapter));
    }
    let folio = ordinals.ordinal(page_number + 1);
    for binding in bindings {
        if let RowBinding::Header(header) = binding {
            surface.append(header.title, &title);
            surface.append(header.page, &folio);
        }
    }
}

/// The bound commentaries fill toward on this pass.
///
/// While the main text has a verse after its cursor, that verse's
/// location is the frontier. Past that point the frontier is the
/// successor of the furthest pending location anywhere, which lets the
/// main remainder and trailing commentary drain instead of freezing.
/// Ties prefer the shorter location so chapter-level entries under it
/// stay reachable.
fn next_frontier(main: &ModuleStream, streams: &HashMap<String, ModuleStream>) -> Location {
    if let Some(next) = main.verses.get(main.cursor.verse_index + 1) {
        return next.location.clone();
    }
    let mut furthest: Option<&Location> = None;
    for pending in main
        .pending()
        .into_iter()
        .chain(streams.values().filter_map(ModuleStream::pending))
    {
        furthest = Some(match furthest {
            None => pending,
            Some(best) => match pending.compare(best) {
                Ordering::Greater => pending,
                Ordering::Equal if pending.len() < best.len() => pending,
                _ => best,
            },
        });
    }
    match furthest {
        Some(location) => location.successor(),
        None => main
            .verses
            .last()
            .map(|record| record.location.successor())
            .unwrap_or_default(),
    }
}

fn emit_slot(
    surface: &mut dyn PageSurface,
    slot: &SlotBinding,
    columns: Option<(ContainerId, ContainerId, u8, bool)>,
    streams: &mut HashMap<String, ModuleStream>,
    frontier: &Location,
    ordinals: &dyn OrdinalFormatter,
) -> EmitOutcome {
    match streams.get_mut(&slot.source) {
        Some(stream) => emit_into(surface, slot.container, stream, frontier, ordinals, columns),
        None => EmitOutcome::default(),
    }
}

fn emit_into(
    surface: &mut dyn PageSurface,
    container: ContainerId,
    stream: &mut ModuleStream,
    frontier: &Location,
    ordinals: &dyn OrdinalFormatter,
    columns: Option<(ContainerId, ContainerId, u8, bool)>,
) -> EmitOutcome {
    match columns {
        Some((left, right, spacing, mirrored)) => emit_until(
            surface,
            container,
            &stream.verses,
            &mut stream.cursor,
            frontier,
            ordinals,
            &mut |s: &mut dyn PageSurface| balance_columns(s, left, right, spacing, mirrored),
        ),
        None => emit_until(
            surface,
            container,
            &stream.verses,
            &mut stream.cursor,
            frontier,
            ordinals,
            &mut |_: &mut dyn PageSurface| {},
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{FixedGridSurface, GridGeometry};
    use crate::ordinal::ArabicNumerals;
    use daf::PageTemplate;

    fn stream(locations: &[&[u32]]) -> ModuleStream {
        ModuleStream::from_verses(
            locations
                .iter()
                .map(|path| VerseRecord::new(Location::from_slice(path), "text"))
                .collect(),
        )
    }

    #[test]
    fn frontier_is_the_next_main_verse() {
        let main = stream(&[&[1, 1], &[1, 2], &[1, 3]]);
        let streams = HashMap::new();
        assert_eq!(next_frontier(&main, &streams), Location::from([1, 2]));
    }

    #[test]
    fn frontier_past_main_follows_the_furthest_pending() {
        let mut main = stream(&[&[1, 1], &[1, 2]]);
        main.cursor.verse_index = 1;
        let mut streams = HashMap::new();
        streams.insert("a".to_string(), stream(&[&[3, 4]]));
        streams.insert("b".to_string(), stream(&[&[2, 1]]));
        // Successor of the furthest pending location, here [3, 4].
        assert_eq!(next_frontier(&main, &streams), Location::from([3, 5]));
    }

    #[test]
    fn frontier_tie_prefers_the_shorter_location() {
        let mut main = stream(&[&[4, 9]]);
        main.cursor.verse_index = 1;
        let mut streams = HashMap::new();
        streams.insert("deep".to_string(), stream(&[&[4, 2]]));
        streams.insert("flat".to_string(), stream(&[&[4]]));
        // [4] and [4, 2] compare equal; successor of [4] frees both.
        assert_eq!(next_frontier(&main, &streams), Location::from([5]));
    }

    #[test]
    fn header_carries_title_chapter_and_folio() {
        let mut surface = FixedGridSurface::new(GridGeometry::folio());
        let template = ResolvedTemplate::resolve(PageTemplate {
            right: vec![
                RowConfig::Header,
                RowConfig::Single(ModuleConfig {
                    source: "Exodus".to_string(),
                    main: true,
                    ..ModuleConfig::default()
                }),
            ],
            left: vec![],
            mirror_page: true,
        })
        .unwrap();
        let (bindings, main_binding) = render_page(&mut surface, &template, PageSide::Right);
        assert!(main_binding.is_some());
        let main = ModuleConfig {
            title: "Shemot".to_string(),
            ..ModuleConfig::default()
        };
        write_header(
            &mut surface,
            &bindings,
            &main,
            &Location::from([3, 2]),
            0,
            &ArabicNumerals,
        );
        let lines = surface.dump();
        assert!(lines.iter().any(|l| l.contains("Shemot 3")));
        assert!(lines.iter().any(|l| l.contains('1')));
    }

    #[test]
    fn mirrored_page_swaps_double_bindings() {
        let mut surface = FixedGridSurface::new(GridGeometry::folio());
        let template = ResolvedTemplate::resolve(PageTemplate {
            right: vec![RowConfig::Double {
                left: ModuleConfig {
                    source: "commentary".to_string(),
                    ..ModuleConfig::default()
                },
                right: ModuleConfig {
                    source: "torah".to_string(),
                    main: true,
                    ..ModuleConfig::default()
                },
                spacing: 40,
            }],
            left: vec![],
            mirror_page: true,
        })
        .unwrap();
        let (bindings, main_binding) = render_page(&mut surface, &template, PageSide::Left);
        let main_binding = main_binding.unwrap();
        match &bindings[0] {
            RowBinding::Double {
                left,
                right,
                mirrored,
                ..
            } => {
                assert!(*mirrored);
                // The main text moves to the left column on the verso.
                assert_eq!(left.source, "torah");
                assert!(left.main);
                assert_eq!(right.source, "commentary");
                assert_eq!(main_binding.container, left.container);
            }
            _ => panic!("expected a double row binding"),
        }
    }

    #[test]
    fn header_location_clamps_to_the_last_verse() {
        let mut main = stream(&[&[1, 1], &[2, 5]]);
        main.cursor.verse_index = 17;
        assert_eq!(header_location(&main), Location::from([2, 5]));
    }
}
