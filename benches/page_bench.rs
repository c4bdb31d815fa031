use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use daf::{
    parse_ranges, Error, ModuleConfig, PageTemplate, RangeSpec, ResolvedTemplate, RowConfig,
    SectionText, SourceCache, SourceIndex, TextNode, TextRepository,
};
use daf_render::{FillOptions, GridGeometry, GridHost, PageBuilder};

/// (key, chapters, verses per chapter)
const CORPORA: &[(&str, usize, usize)] = &[
    ("pocket-2x25", 2, 25),
    ("seder-10x30", 10, 30),
    ("sefer-24x50", 24, 50),
];

const TEMPLATE_JSON: &str = r#"{
    "mirrorPage": true,
    "right": [
        {"type": "header"},
        {"type": "double",
         "left": {"source": "Targum Torah", "title": "Targum", "accompany": true},
         "right": {"source": "Torah", "title": "Torah", "main": true, "range": "1-2"},
         "spacing": 60},
        {"type": "single", "source": "Peirush", "title": "Peirush", "accompany": true}
    ]
}"#;

struct TrackingAllocator;

static CURRENT_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL_ALLOCATOR: TrackingAllocator = TrackingAllocator;

fn reset_peak_bytes() {
    PEAK_BYTES.store(CURRENT_BYTES.load(Ordering::Relaxed), Ordering::Relaxed);
}

fn peak_bytes() -> usize {
    PEAK_BYTES.load(Ordering::Relaxed)
}

// realloc and alloc_zeroed fall back to alloc/dealloc, so tracking the
// pair covers every path.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            let current = CURRENT_BYTES.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
            PEAK_BYTES.fetch_max(current, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        CURRENT_BYTES.fetch_sub(layout.size(), Ordering::Relaxed);
    }
}

const WORDS: &[&str] = &[
    "bereshit",
    "bara",
    "elohim",
    "hashamayim",
    "haaretz",
    "vayomer",
    "yehi",
    "vayar",
    "tov",
    "vayavdel",
    "layla",
    "erev",
    "boker",
];

fn synthetic_chapters(chapters: usize, verses: usize) -> Vec<Vec<String>> {
    let mut cursor = 0usize;
    (0..chapters)
        .map(|_| {
            (0..verses)
                .map(|_| {
                    let mut verse = String::new();
                    for position in 0..9 {
                        if position > 0 {
                            verse.push(' ');
                        }
                        verse.push_str(WORDS[cursor % WORDS.len()]);
                        cursor += 1;
                    }
                    verse
                })
                .collect()
        })
        .collect()
}

/// Serves the same synthetic chapters for every reference; `Targum X`
/// declares `X` as its base text so accompany validation passes.
struct BenchRepository {
    chapters: Vec<Vec<String>>,
}

impl TextRepository for BenchRepository {
    async fn fetch_section_text(
        &self,
        _reference: &str,
        _query: &str,
    ) -> Result<SectionText, Error> {
        Ok(SectionText {
            primary: TextNode::list(self.chapters.iter().map(|verses| {
                TextNode::list(verses.iter().map(|verse| TextNode::leaf(verse.as_str())))
            })),
            secondary: TextNode::default(),
        })
    }

    async fn fetch_detailed_index(&self, reference: &str) -> Result<SourceIndex, Error> {
        let base = reference.strip_prefix("Targum ").map(str::to_string);
        Ok(SourceIndex::single(reference, base))
    }
}

fn bench_template(chapters: usize) -> ResolvedTemplate {
    let template = PageTemplate {
        right: vec![
            RowConfig::Header,
            RowConfig::Double {
                left: ModuleConfig {
                    source: "Targum Torah".to_string(),
                    title: "Targum".to_string(),
                    accompany: true,
                    ..ModuleConfig::default()
                },
                right: ModuleConfig {
                    source: "Torah".to_string(),
                    title: "Torah".to_string(),
                    main: true,
                    range: RangeSpec::Expr(format!("1-{chapters}")),
                    ..ModuleConfig::default()
                },
                spacing: 60,
            },
        ],
        left: vec![],
        mirror_page: true,
    };
    ResolvedTemplate::resolve(template).unwrap_or_else(|e| panic!("template: {}", e))
}

#[derive(Clone, Debug)]
struct CaseResult {
    corpus: String,
    case: String,
    iterations: usize,
    min_ns: u128,
    median_ns: u128,
    max_ns: u128,
    median_peak_bytes: usize,
    max_peak_bytes: usize,
}

fn percentile<T: Copy>(sorted: &[T], fraction: f64) -> T {
    let index = ((sorted.len().saturating_sub(1) as f64) * fraction).round() as usize;
    sorted[index]
}

fn run_case<F>(
    corpus: &str,
    case: &str,
    warmup_iters: usize,
    measure_iters: usize,
    mut op: F,
) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup_iters {
        black_box(op());
    }

    let mut time_samples = Vec::with_capacity(measure_iters);
    let mut mem_samples = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let baseline = CURRENT_BYTES.load(Ordering::Relaxed);
        reset_peak_bytes();
        let start = Instant::now();
        black_box(op());
        time_samples.push(start.elapsed().as_nanos());
        mem_samples.push(peak_bytes().saturating_sub(baseline));
    }

    time_samples.sort_unstable();
    mem_samples.sort_unstable();

    CaseResult {
        corpus: corpus.to_string(),
        case: case.to_string(),
        iterations: measure_iters,
        min_ns: time_samples[0],
        median_ns: percentile(&time_samples, 0.5),
        max_ns: time_samples[time_samples.len() - 1],
        median_peak_bytes: percentile(&mem_samples, 0.5),
        max_peak_bytes: mem_samples[mem_samples.len() - 1],
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 2 };
    let measure_iters = if quick { 3 } else { 10 };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap_or_else(|e| panic!("runtime: {}", e));

    println!("# daf benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters
    );
    println!(
        "corpus,case,iterations,min_ns,median_ns,max_ns,median_peak_bytes,max_peak_bytes"
    );

    let range_expression = (1..=40)
        .map(|chapter| format!("{chapter}.1-{chapter}.25"))
        .collect::<Vec<_>>()
        .join(",");

    let mut results = Vec::new();
    for (corpus_key, chapters, verses) in CORPORA {
        let repository = BenchRepository {
            chapters: synthetic_chapters(*chapters, *verses),
        };
        let template = bench_template(*chapters);
        let span = format!("1-{chapters}");
        let builder = PageBuilder::new(FillOptions::new());

        results.push(run_case(
            corpus_key,
            "resolve_template",
            warmup_iters,
            measure_iters,
            || {
                let template = PageTemplate::from_json(TEMPLATE_JSON)
                    .unwrap_or_else(|e| panic!("template json: {}", e));
                let resolved = ResolvedTemplate::resolve(template)
                    .unwrap_or_else(|e| panic!("resolve: {}", e));
                resolved.modules().len()
            },
        ));

        results.push(run_case(
            corpus_key,
            "parse_range_expression",
            warmup_iters,
            measure_iters,
            || parse_ranges(&range_expression).len(),
        ));

        results.push(run_case(
            corpus_key,
            "fetch_and_flatten",
            warmup_iters,
            measure_iters,
            || {
                runtime.block_on(async {
                    let mut cache = SourceCache::new();
                    let range = parse_ranges(&span).remove(0);
                    let fetched = cache
                        .fetch_source(&repository, "Torah", &range)
                        .await
                        .unwrap_or_else(|e| panic!("fetch: {}", e));
                    fetched.primary.len()
                })
            },
        ));

        results.push(run_case(
            corpus_key,
            "build_pages",
            warmup_iters,
            measure_iters,
            || {
                runtime.block_on(async {
                    let mut cache = SourceCache::new();
                    let mut host = GridHost::new(GridGeometry::folio());
                    let summary = builder
                        .build(&repository, &mut cache, &template, &mut host)
                        .await
                        .unwrap_or_else(|e| panic!("build: {}", e));
                    summary.pages as usize
                })
            },
        ));
    }

    for result in &results {
        println!(
            "{},{},{},{},{},{},{},{}",
            result.corpus,
            result.case,
            result.iterations,
            result.min_ns,
            result.median_ns,
            result.max_ns,
            result.median_peak_bytes,
            result.max_peak_bytes
        );
    }
}
