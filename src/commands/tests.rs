use std::collections::HashMap;
use std::fs;

use chrono::{TimeZone, Utc};

use super::links::resolve_links;
use super::reconstruct::{DOCUMENT_JSON, reconstruct, write_outputs};
use super::status::{collect_status, latest_manifests};
use super::store::{open_store, store_counts, upsert_link_table, upsert_unparsed_targets};
use super::tag::{tag, tagger_options};
use super::targets::{TargetsReport, targets_from_lines};
use crate::cli::{LinksArgs, RuleSet, TagArgs, parse_span_range};
use crate::config::PipelineConfig;
use crate::error::FetchError;
use crate::layout::{AssemblyPath, PageSelection};
use crate::model::GlyphDocument;
use crate::references::{LinkFactory, RemoteDocument, RemoteFetcher, TargetParser};
use crate::tagging::{RuleTable, TaggerOptions};
use crate::tree::{Document, Element, ElementKind};
use crate::util::{new_run_manifest, read_json, write_run_manifest};

fn glyph_json(text: &str, x: f64, y: f64) -> String {
    text.chars()
        .enumerate()
        .map(|(index, ch)| {
            let x0 = x + index as f64 * 5.0;
            serde_json::json!({
                "x0": x0, "x1": x0 + 5.0, "y0": y, "y1": y + 10.0,
                "font_name": "ABCDEF+Times-Roman", "font_height": 10.0,
                "text": ch.to_string()
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn sample_glyphs() -> GlyphDocument {
    let page = |number: u32, rows: &[(&str, f64, f64)]| {
        let glyphs: Vec<String> = rows
            .iter()
            .map(|(text, x, y)| glyph_json(text, *x, *y))
            .collect();
        format!(
            r#"{{"page_number": {number}, "width": 600, "height": 800, "glyphs": [{}],
                "rects": [{{"x0": 50, "y0": 400, "width": 200, "height": 0.5}}]}}"#,
            glyphs.join(",")
        )
    };
    let raw = format!(
        r#"{{"source": "decision.pdf", "pages": [{}, {}]}}"#,
        page(
            2,
            &[
                ("Running header", 50.0, 760.0),
                ("Body on two", 50.0, 700.0),
                ("Page 2", 300.0, 40.0)
            ]
        ),
        page(1, &[("Decision 1/CMA.3", 50.0, 700.0), ("Page 1", 300.0, 40.0)]),
    );
    serde_json::from_str(&raw).unwrap()
}

fn citing_container(id: &str, targets: &str) -> Element {
    let mut div = Element::new(ElementKind::Div);
    div.set_attr("id", id);
    div.push(Element::with_text(ElementKind::Span, "Observed warming "));
    let mut span = Element::with_text(ElementKind::Span, targets);
    span.set_attr("class", "targets");
    div.push(span);
    div
}

struct MapFetcher {
    pages: HashMap<String, String>,
}

impl RemoteFetcher for MapFetcher {
    fn fetch(&mut self, address: &str) -> Result<RemoteDocument, FetchError> {
        self.pages
            .get(address)
            .map(|html| RemoteDocument::parse(html))
            .ok_or_else(|| FetchError::Transport {
                address: address.to_string(),
                message: "offline".to_string(),
            })
    }
}

fn links_args(out_dir: &std::path::Path) -> LinksArgs {
    LinksArgs {
        input: out_dir.join("tagged.json"),
        out_dir: out_dir.to_path_buf(),
        factory: None,
        targets_class: "targets".to_string(),
        anchor_report: None,
        anchor_chapter: None,
        timeout_secs: 5,
        db_path: None,
        fail_on_bad_links: false,
    }
}

#[test]
fn reconstruct_stream_collects_margins_and_orders_pages() {
    let glyphs = sample_glyphs();
    let reconstruction = reconstruct(
        &glyphs,
        AssemblyPath::Stream,
        None,
        &PipelineConfig::default(),
        true,
    )
    .unwrap();

    assert_eq!(reconstruction.counts.pages_total, 2);
    assert_eq!(reconstruction.counts.pages_assembled, 2);
    assert_eq!(reconstruction.counts.header_spans, 1);
    assert_eq!(reconstruction.counts.footer_spans, 2);
    assert_eq!(reconstruction.margins.len(), 2);
    assert_eq!(reconstruction.margins[1].headers, vec!["Running header"]);

    let body = &reconstruction.document.body;
    assert_eq!(body.children[0].id(), Some("page_1"));
    let text = body.text_content();
    assert!(text.starts_with("Decision 1/CMA.3"));
    assert!(!text.contains("Running header"));
    assert!(!text.contains("Page 2"));
    assert!(reconstruction.document.styles.iter().any(|style| style.starts_with("div")));
    assert!(body.children[0].children[0].attr("x0").is_none());
}

#[test]
fn reconstruct_rejects_empty_selection_and_writes_reloadable_tree() {
    let glyphs = sample_glyphs();
    let config = PipelineConfig::default();
    let selection = PageSelection::parse("5-9").unwrap();
    assert!(reconstruct(&glyphs, AssemblyPath::Lines, Some(&selection), &config, false).is_err());

    let dir = tempfile::tempdir().unwrap();
    let reconstruction = reconstruct(&glyphs, AssemblyPath::Lines, None, &config, false).unwrap();
    let outputs = write_outputs(dir.path(), &reconstruction).unwrap();

    assert_eq!(outputs.len(), 3);
    assert!(outputs.iter().all(|path| path.exists()));
    let reloaded: Document = read_json(&dir.path().join(DOCUMENT_JSON)).unwrap();
    assert_eq!(reloaded, reconstruction.document);
    let html = fs::read_to_string(&outputs[1]).unwrap();
    assert!(html.contains("class=\"decorations\""));
}

#[test]
fn tag_classifies_and_nests_reconstructed_pages() {
    let glyphs = sample_glyphs();
    let reconstruction = reconstruct(
        &glyphs,
        AssemblyPath::Stream,
        None,
        &PipelineConfig::default(),
        false,
    )
    .unwrap();
    let mut document = reconstruction.document;
    let rules = RuleTable::decisions().unwrap();

    let (report, nesting) = tag(&mut document, &rules, TaggerOptions::default(), true).unwrap();

    assert_eq!(report.class_counts.get("Decision"), Some(&1));
    let nesting = nesting.unwrap();
    assert_eq!(nesting.sections, 1);
    let decision = document
        .body
        .children
        .iter()
        .find(|child| child.attr("data-level") == Some("Decision"))
        .unwrap();
    assert!(decision.text_content().contains("Body on two"));
}

#[test]
fn citation_lines_build_report_with_commonest_values() {
    let parser = TargetParser::new().unwrap();
    let extraction = targets_from_lines(
        "WGI SPM A.1\n\nWGI SPM B.2\nWGII Chapter 7 Table 7.3\nsomething odd here\n",
        &parser,
    );

    assert_eq!(extraction.containers, 4);
    assert_eq!(extraction.unparsed, 1);
    let report = TargetsReport::from_extraction(extraction);
    assert_eq!(report.targets, 4);
    assert_eq!(report.commonest["package"], vec![("WGI".to_string(), 2)]);
    assert_eq!(report.commonest["section"], vec![("SPM".to_string(), 2)]);
    assert!(report.commonest["object"].is_empty());
    assert!(report.commonest["unparsed"].is_empty());
}

#[test]
fn links_are_resolved_and_persisted_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let factory = LinkFactory::default();
    let address = factory.target.address("wg1", "spm");
    let fetcher = MapFetcher {
        pages: HashMap::from([(
            address,
            "<div><p><span id=\"B.1\">B.1</span> Warming is unequivocal.</p></div>".to_string(),
        )]),
    };

    let mut document = Document::default();
    document
        .body
        .push(citing_container("p1", "{WGI SPM B.1; WGIII TS C.1; nonsense}"));

    let args = links_args(dir.path());
    let (table, fetches) = resolve_links(&document, &factory, fetcher, &args).unwrap();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.bad_links.len(), 2);
    assert_eq!(fetches, 2);

    let db_path = dir.path().join("links.sqlite");
    let mut connection = open_store(&db_path).unwrap();
    upsert_link_table(&mut connection, "run-1", &table).unwrap();
    upsert_link_table(&mut connection, "run-2", &table).unwrap();

    let parser = TargetParser::new().unwrap();
    let extraction = targets_from_lines("WGI SPM A.1\nWGI odd residue here", &parser);
    let written = upsert_unparsed_targets(&mut connection, "run-2", &extraction.rows).unwrap();
    assert_eq!(written, 1);

    let counts = store_counts(&connection).unwrap();
    assert_eq!(counts.link_rows, 1);
    assert_eq!(counts.bad_links, 2);
    assert_eq!(counts.unparsed_targets, 1);
}

#[test]
fn status_reports_newest_manifest_per_command() {
    let dir = tempfile::tempdir().unwrap();
    let older = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let newer = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 6).unwrap();

    let mut first = new_run_manifest("tag", older);
    first.status = "completed".to_string();
    write_run_manifest(dir.path(), &mut first).unwrap();
    let mut second = new_run_manifest("tag", newer);
    second.status = "failed".to_string();
    write_run_manifest(dir.path(), &mut second).unwrap();
    let mut links = new_run_manifest("links", older);
    write_run_manifest(dir.path(), &mut links).unwrap();
    fs::write(dir.path().join("manifests").join("broken.json"), "{").unwrap();

    let latest = latest_manifests(dir.path()).unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest["tag"].status, "failed");
    assert_eq!(latest["tag"].run_id, "run-20260102T030406Z");

    let status = collect_status(dir.path(), &dir.path().join("missing.sqlite")).unwrap();
    assert!(status.store.is_none());
}

#[test]
fn span_range_flag_parses_half_open_bounds() {
    assert_eq!(parse_span_range("0..2"), Ok((0, 2)));
    assert!(parse_span_range("3..1").is_err());
    assert!(parse_span_range("3").is_err());
}

#[test]
fn citation_targets_rule_set_feeds_link_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let factory = LinkFactory::default();
    let fetcher = MapFetcher {
        pages: HashMap::from([(
            factory.target.address("wg1", "spm"),
            "<div><p><span id=\"A.1\">A.1</span> Human influence has warmed.</p></div>"
                .to_string(),
        )]),
    };

    let mut paragraph = Element::new(ElementKind::Div);
    paragraph.set_attr("id", "para_1");
    paragraph.push(Element::with_text(
        ElementKind::Span,
        "Human influence has warmed the climate {WGI SPM A.1}",
    ));
    let mut document = Document::default();
    document.body.push(paragraph);

    let args = TagArgs {
        input: dir.path().join("document.json"),
        out_dir: dir.path().to_path_buf(),
        config: None,
        rules: None,
        rule_set: RuleSet::Targets,
        split: false,
        max_splits: None,
        span_range: None,
        nest: false,
        report_unmatched: 20,
    };
    let options = tagger_options(&args, &PipelineConfig::default());
    assert!(options.split);
    let rules = RuleTable::citation_targets().unwrap();
    let (report, _) = tag(&mut document, &rules, options, false).unwrap();
    assert_eq!(report.class_counts.get("targets"), Some(&1));
    let spans = &document.body.children[0].children;
    assert_eq!(spans[1].text, "{WGI SPM A.1}");
    assert!(spans[1].has_class("targets"));

    let (table, fetches) =
        resolve_links(&document, &factory, fetcher, &links_args(dir.path())).unwrap();
    assert_eq!(fetches, 1);
    assert_eq!(table.rows.len(), 1);
    assert!(table.bad_links.is_empty());
    assert_eq!(table.rows[0].anchor_id, "para_1");
    assert_eq!(table.rows[0].target_id, "A.1");
    assert!(table.rows[0].target_text.contains("Human influence has warmed."));
}
