use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use url::Url;

use crate::app::App;
use crate::archive::{
    markup::Anchors, ArchiveController, ArchiveIndex, ArchiveView, Mounted, SkipReason,
};
use crate::config::ArchiveConfig;
use crate::dom::Document;
use crate::history::SessionHistory;

const DEFAULT_LOCATION: &str = "https://example.invalid/blog/";

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page snapshot (JSON). Reads stdin when omitted.
    #[arg()]
    pub page: Option<PathBuf>,
    /// Address the page was opened at; its query seeds the filters
    #[arg(long, default_value = DEFAULT_LOCATION)]
    pub url: String,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub page: PageArgs,
    /// Pick a year in the selector after mounting
    #[arg(long)]
    pub year: Option<String>,
    /// Type a search term after mounting
    #[arg(long)]
    pub search: Option<String>,
    /// Press "Next" this many times
    #[arg(long, default_value_t = 0)]
    pub next: u32,
}

#[derive(Args, Debug, Clone)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug, Clone)]
pub struct YearsArgs {
    /// Page snapshot (JSON). Reads stdin when omitted.
    #[arg()]
    pub page: Option<PathBuf>,
}

pub fn preview(config: &ArchiveConfig, args: PreviewArgs) -> Result<()> {
    let mut doc = load_page(args.page.page.as_ref())?;
    let history = open_history(&args.page.url)?;
    let mut archive = match ArchiveController::mount(&mut doc, history, config) {
        Mounted::Active(archive) => archive,
        Mounted::Skipped(reason) => {
            println!("Archive not applied: {reason}");
            return Ok(());
        }
    };

    if let Some(year) = &args.year {
        archive.select_year(&mut doc, year);
    }
    if let Some(term) = &args.search {
        archive.input_search(&mut doc, term, std::time::Instant::now());
        archive.flush_search(&mut doc);
    }
    for _ in 0..args.next {
        if !archive.next_page(&mut doc) {
            break;
        }
    }

    print!("{}", format_view(&archive.view(&doc)));
    Ok(())
}

pub fn browse(config: &ArchiveConfig, args: BrowseArgs) -> Result<()> {
    if args.page.page.is_none() {
        bail!("browse needs a page snapshot file; stdin is used for the terminal");
    }
    let mut doc = load_page(args.page.page.as_ref())?;
    let history = open_history(&args.page.url)?;
    let archive = match ArchiveController::mount(&mut doc, history, config) {
        Mounted::Active(archive) => archive,
        Mounted::Skipped(reason) => {
            println!("Archive not applied: {reason}");
            return Ok(());
        }
    };
    let mut app = App::new(doc, archive);
    app.run()
}

pub fn years(config: &ArchiveConfig, args: YearsArgs) -> Result<()> {
    let doc = load_page(args.page.as_ref())?;
    print!("{}", year_report(&doc, config));
    Ok(())
}

/// The year index of `doc`, or the reason the archive would skip the page.
fn year_report(doc: &Document, config: &ArchiveConfig) -> String {
    let anchors = match Anchors::locate(doc, config) {
        Ok(anchors) => anchors,
        Err(reason) => return format!("Archive not applied: {reason}\n"),
    };
    let index = ArchiveIndex::build(anchors.raw_posts(doc));
    if index.is_empty() {
        return format!("Archive not applied: {}\n", SkipReason::NoDatedPosts);
    }
    format_years(&index, config)
}

fn load_page(path: Option<&PathBuf>) -> Result<Document> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading page snapshot {}", path.display()))?,
        None => match read_stdin()? {
            Some(raw) => raw,
            None => bail!("no page snapshot given; pass a file or pipe JSON on stdin"),
        },
    };
    Document::from_json(&raw).context("loading page snapshot")
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading page snapshot from stdin")?;
    Ok(Some(buf))
}

fn open_history(location: &str) -> Result<SessionHistory> {
    let url = Url::parse(location).with_context(|| format!("parsing page url {location}"))?;
    Ok(SessionHistory::new(url))
}

pub fn format_view(view: &ArchiveView) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "Year:   {}", view.selected_year_label());
    let term = view.term.trim();
    if term.is_empty() {
        let _ = writeln!(&mut out, "Search: -");
    } else {
        let _ = writeln!(&mut out, "Search: \"{term}\"");
    }
    out.push('\n');

    if view.sections.is_empty() {
        let _ = writeln!(&mut out, "No matching posts.");
        out.push('\n');
    }
    for section in &view.sections {
        let _ = writeln!(&mut out, "{}", section.label);
        for post in &section.posts {
            match &post.datetime {
                Some(datetime) => {
                    let _ = writeln!(&mut out, "  {datetime}  {}", post.title);
                }
                None => {
                    let _ = writeln!(&mut out, "  {}", post.title);
                }
            }
        }
        out.push('\n');
    }

    if let Some(info) = &view.page_info {
        let prev = if view.prev_enabled { "[Previous]" } else { "(Previous)" };
        let next = if view.next_enabled { "[Next]" } else { "(Next)" };
        let _ = writeln!(&mut out, "{prev} {info} {next}");
    }
    let _ = writeln!(&mut out, "URL:    {}", view.location);
    out
}

fn format_years(index: &ArchiveIndex, config: &ArchiveConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{} ({})", config.locale.all_posts, index.len());
    for (year, count) in index.years().descending() {
        let _ = writeln!(&mut out, "{year} ({count})");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "tag": "html",
        "children": [{"tag": "body", "class": "blog", "children": [{"tag": "main", "children": [
            {"tag": "ul", "class": "blog-posts", "children": [
                {"tag": "li", "children": [
                    {"tag": "time", "attrs": {"datetime": "2024-02-10"}},
                    {"tag": "a", "text": "Bear sighting"}
                ]},
                {"tag": "li", "children": [
                    {"tag": "time", "attrs": {"datetime": "2023-11-05"}},
                    {"tag": "a", "text": "Autumn"}
                ]},
                {"tag": "li", "children": [
                    {"tag": "time", "attrs": {"datetime": "2024-02-01"}},
                    {"tag": "a", "text": "Winter notes"}
                ]},
                {"tag": "li", "children": [{"tag": "a", "text": "Draft"}]}
            ]}
        ]}]}]
    }"#;

    fn mounted(query: &str, page_size: usize) -> (Document, ArchiveController) {
        let mut doc = Document::from_json(PAGE).expect("page");
        let config = ArchiveConfig {
            page_size,
            ..ArchiveConfig::default()
        };
        let history =
            open_history(&format!("https://blog.example/blog/{query}")).expect("history");
        let archive = ArchiveController::mount(&mut doc, history, &config)
            .active()
            .expect("mounted");
        (doc, archive)
    }

    #[test]
    fn preview_of_second_page() {
        let (doc, archive) = mounted("?p=2", 2);
        insta::assert_snapshot!(format_view(&archive.view(&doc)), @r###"
        Year:   All posts (3)
        Search: -

        November 2023
          2023-11-05  Autumn

        [Previous] Page 2 of 2 (Next)
        URL:    https://blog.example/blog/?p=2
        "###);
    }

    #[test]
    fn preview_without_matches() {
        let (mut doc, mut archive) = mounted("", 25);
        archive.input_search(&mut doc, "moose", std::time::Instant::now());
        archive.flush_search(&mut doc);
        insta::assert_snapshot!(format_view(&archive.view(&doc)), @r###"
        Year:   All posts (3)
        Search: "moose"

        No matching posts.

        URL:    https://blog.example/blog/?s=moose
        "###);
    }

    #[test]
    fn years_lists_newest_first() {
        let doc = Document::from_json(PAGE).expect("page");
        let config = ArchiveConfig::default();
        let anchors = Anchors::locate(&doc, &config).expect("anchors");
        let index = ArchiveIndex::build(anchors.raw_posts(&doc));
        assert_eq!(format_years(&index, &config), "All posts (3)\n2024 (2)\n2023 (1)\n");
    }

    #[test]
    fn years_skips_pages_without_dated_posts() {
        let doc = Document::from_json(
            r#"{"tag": "body", "class": "blog", "children": [{"tag": "main", "children": [
                {"tag": "ul", "class": "blog-posts", "children": [
                    {"tag": "li", "children": [{"tag": "a", "text": "Draft"}]},
                    {"tag": "li", "children": [
                        {"tag": "time", "attrs": {"datetime": "someday"}},
                        {"tag": "a", "text": "Later"}
                    ]}
                ]}
            ]}]}"#,
        )
        .expect("page");
        let out = year_report(&doc, &ArchiveConfig::default());
        assert_eq!(out, "Archive not applied: no post carries a usable date\n");
        assert!(!out.contains("(0)"));
    }

    #[test]
    fn year_report_lists_dated_pages() {
        let doc = Document::from_json(PAGE).expect("page");
        assert_eq!(
            year_report(&doc, &ArchiveConfig::default()),
            "All posts (3)\n2024 (2)\n2023 (1)\n"
        );
    }

    #[test]
    fn rejects_relative_urls() {
        assert!(open_history("/blog/?y=2024").is_err());
    }
}
