use std::env;
use std::process::ExitCode;

use daf::{
    Error, PageSide, PageTemplate, ResolvedTemplate, SectionText, SourceCache, SourceIndex,
    TextNode, TextRepository,
};
use daf_render::{ArabicNumerals, FillOptions, GridGeometry, GridHost, PageBuilder};

const TEMPLATE_JSON: &str = r#"{
    "mirrorPage": true,
    "right": [
        {"type": "header"},
        {"type": "double",
         "left": {"source": "Targum Shemot", "title": "Targum", "accompany": true},
         "right": {"source": "Shemot", "title": "Shemot", "main": true, "range": "1-2"},
         "spacing": 60},
        {"type": "single", "source": "Peirush", "title": "Peirush", "accompany": true}
    ]
}"#;

#[derive(Clone, Debug)]
struct Args {
    width: u32,
    height: u32,
    gutter: u32,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cfg = parse_args(args)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| e.to_string())?;
    runtime.block_on(preview(cfg))
}

async fn preview(cfg: Args) -> Result<(), String> {
    let geometry = GridGeometry {
        width: cfg.width,
        height: cfg.height,
        gutter: cfg.gutter,
    };
    let template = PageTemplate::from_json(TEMPLATE_JSON).map_err(|e| e.to_string())?;
    let template = ResolvedTemplate::resolve(template).map_err(|e| e.to_string())?;
    let mut cache = SourceCache::new();
    let mut host = GridHost::new(geometry);
    let builder = PageBuilder::new(FillOptions::new().with_ordinals(ArabicNumerals));
    let summary = builder
        .build(&DemoRepository, &mut cache, &template, &mut host)
        .await
        .map_err(|e| e.to_string())?;

    let rule = "=".repeat(geometry.width as usize);
    for page in &host.pages {
        let side = match page.side {
            PageSide::Right => "right",
            PageSide::Left => "left",
        };
        println!("{rule}");
        println!("page {} ({side})", page.number + 1);
        println!("{rule}");
        for line in page.surface.dump() {
            println!("{line}");
        }
    }
    println!("{rule}");
    println!("built {} page(s)", summary.pages);
    if !summary.degraded.is_empty() {
        println!("degraded sources: {}", summary.degraded.join(", "));
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }
    let mut cfg = Args {
        width: 64,
        height: 20,
        gutter: 2,
    };
    let mut iter = args.into_iter().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for {}", flag))?;
        match flag.as_str() {
            "--width" => cfg.width = parse_number(&flag, &value)?,
            "--height" => cfg.height = parse_number(&flag, &value)?,
            "--gutter" => cfg.gutter = parse_number(&flag, &value)?,
            other => return Err(format!("unknown flag {}", other)),
        }
    }
    Ok(cfg)
}

fn parse_number(flag: &str, value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("{} expects a number, got {:?}", flag, value))
}

fn help_text() -> &'static str {
    "usage: grid-preview [--width N] [--height N] [--gutter N]\n\
     Renders a small built-in two-source document onto a character grid\n\
     and prints every page."
}

/// In-memory corpus: two chapters of a main text, an aligned targum,
/// and a short commentary, all declaring their base-text links.
struct DemoRepository;

fn chapter(verses: &[&str]) -> TextNode {
    TextNode::list(verses.iter().map(|v| TextNode::leaf(*v)))
}

impl TextRepository for DemoRepository {
    async fn fetch_section_text(
        &self,
        reference: &str,
        _query: &str,
    ) -> Result<SectionText, Error> {
        let primary = match reference {
            "Shemot" => TextNode::list([
                chapter(&[
                    "These are the names of the sons who came down",
                    "Every household arrived and the land was filled",
                    "A new king arose who knew nothing of the past",
                ]),
                chapter(&[
                    "A man went out and took a wife in those days",
                    "She bore a son and hid him three long months",
                ]),
            ]),
            "Targum Shemot" => TextNode::list([
                chapter(&[
                    "And these are the names rendered in the targum",
                    "And the households arrived as it is written",
                    "And a new king arose over the land",
                ]),
                chapter(&["And a man went out", "And a son was born and hidden"]),
            ]),
            "Peirush" => TextNode::list([
                chapter(&["The names teach descent", "The filling hints at growth"]),
                chapter(&["Going out marks a choice"]),
            ]),
            other => {
                return Err(Error::fetch(other, "unknown demo reference"));
            }
        };
        Ok(SectionText {
            primary,
            secondary: TextNode::default(),
        })
    }

    async fn fetch_detailed_index(&self, reference: &str) -> Result<SourceIndex, Error> {
        match reference {
            "Shemot" => Ok(SourceIndex::single("Shemot", None)),
            "Targum Shemot" => Ok(SourceIndex::single(
                "Targum Shemot",
                Some("Shemot".to_string()),
            )),
            "Peirush" => Ok(SourceIndex::single("Peirush", Some("Shemot".to_string()))),
            other => Err(Error::fetch(other, "unknown demo reference")),
        }
    }
}
