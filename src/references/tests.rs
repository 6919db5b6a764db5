use std::cell::Cell;
use std::rc::Rc;

use super::resolver::TARGETS_CLASS;
use super::*;

const WG1_SPM: &str =
    "https://raw.githubusercontent.com/petermr/semanticClimate/main/ipcc/ar6/wg1/spm/fulltext.annotations.id.html";

struct StubFetcher {
    pages: HashMap<String, String>,
    calls: Rc<Cell<usize>>,
}

impl StubFetcher {
    fn new(pages: &[(&str, &str)]) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let stub = Self {
            pages: pages
                .iter()
                .map(|(address, html)| (address.to_string(), html.to_string()))
                .collect(),
            calls: Rc::clone(&calls),
        };
        (stub, calls)
    }
}

impl RemoteFetcher for StubFetcher {
    fn fetch(&mut self, address: &str) -> Result<RemoteDocument, FetchError> {
        self.calls.set(self.calls.get() + 1);
        match self.pages.get(address) {
            Some(html) => Ok(RemoteDocument::parse(html)),
            None => Err(FetchError::Status {
                address: address.to_string(),
                status: 404,
            }),
        }
    }
}

fn wg1_spm_page() -> String {
    concat!(
        "<html><body><div>",
        "<p><span id=\"A.1\">A.1</span> Human influence has warmed the climate.</p>",
        "<p><span id=\"A.2\">A.2</span> Changes are widespread.</p>",
        "</div></body></html>"
    )
    .to_string()
}

fn citing_container(id: Option<&str>, body: &str, targets: &str) -> Element {
    let mut div = Element::new(ElementKind::Div);
    if let Some(id) = id {
        div.set_attr("id", id);
    }
    div.push(Element::with_text(ElementKind::Span, body));
    let mut span = Element::with_text(ElementKind::Span, targets);
    span.set_attr("class", TARGETS_CLASS);
    div.push(span);
    div
}

fn parser() -> TargetParser {
    TargetParser::new().unwrap()
}

#[test]
fn parses_package_section_object_and_dotted_subsection() {
    let target = parser().parse_normalized("WGII Chapter 7 Table 7.3");
    assert_eq!(target.package, "WGII");
    assert_eq!(target.section, "Chapter");
    assert_eq!(target.object, "Table");
    assert_eq!(target.subsection, "7.3");
    assert_eq!(target.unparsed, "");
}

#[test]
fn clean_applies_substitutions_in_order() {
    let parser = parser();
    assert_eq!(parser.clean("WG  I   SPM.B.2"), "WGI SPM B.2");
    assert_eq!(parser.clean("Cross-Chapter Box 3"), "CCBox 3");
    assert_eq!(parser.clean("Cross-Working Group Box SRM"), "CWGBox SRM");
    assert_eq!(parser.clean("SR 1.5 Chapter 2"), "SR1.5 Chapter 2");
    assert_eq!(parser.clean("TS.C.4"), "TS C.4");
}

#[test]
fn fields_never_backtrack_and_residue_is_kept() {
    let target = parser().parse("WGI SPM A.1 and more text");
    assert_eq!(target.package, "WGI");
    assert_eq!(target.section, "SPM");
    assert_eq!(target.object, "");
    assert_eq!(target.subsection, "A.1");
    assert_eq!(target.unparsed, "and more text");
    assert!(!target.is_fully_parsed());
}

#[test]
fn section_in_residue_is_promoted_and_lone_token_becomes_subsection() {
    let target = parser().parse_normalized("WGI Figure SPM.1");
    assert_eq!(target.section, "SPM");
    assert_eq!(target.object, "Figure");
    assert_eq!(target.subsection, "1");
    assert!(target.is_fully_parsed());
}

#[test]
fn in_chapter_residue_folds_into_section() {
    let target = parser().parse_normalized("Box in Chapter 4");
    assert_eq!(target.object, "Box");
    assert_eq!(target.section, "Chapter");
    assert_eq!(target.subsection, "4");
    assert_eq!(target.unparsed, "");
}

#[test]
fn cross_chapter_box_takes_capitalised_name() {
    let target = parser().parse_normalized("Cross-Chapter Box INTERACT Figure");
    assert_eq!(target.object, "CCBox");
    assert_eq!(target.subsection, "INTERACT");
    assert_eq!(target.unparsed, "Figure");
}

#[test]
fn residue_repeating_subsection_is_dropped() {
    let target = parser().parse_normalized("Chapter 3 3");
    assert_eq!(target.subsection, "3");
    assert_eq!(target.unparsed, "");
}

#[test]
fn missing_commas_separate_run_together_citations() {
    let parser = parser();
    let fixed = parser.add_missing_commas("WGI SPM A.1 WGII TS.C");
    assert_eq!(fixed, "WGI SPM A.1, WGII TS.C");
    assert_eq!(
        parser.split_clauses(&fixed),
        vec!["WGI SPM A.1".to_string(), "WGII TS.C".to_string()]
    );
    assert_eq!(parser.split_clauses(" a ;b, c: d ,"), vec!["a", "b", "c", "d"]);
}

#[test]
fn extraction_tracks_section_labels_and_counts_unparsed() {
    let mut document = Document::default();
    let mut heading = Element::new(ElementKind::Div);
    heading.push(Element::with_text(ElementKind::Span, " A.2 "));
    document.body.push(heading);

    let mut para = Element::new(ElementKind::Div);
    para.set_attr("id", "p1");
    para.push(Element::with_text(
        ElementKind::Span,
        "Warming continues {WGI SPM A.1; WGII Chapter 7 Table 7.3 and more}",
    ));
    let mut page = Element::new(ElementKind::Div);
    page.set_attr("class", "page");
    page.push(para);
    document.body.push(page);

    let extraction = extract_targets(&document, &parser()).unwrap();

    assert_eq!(extraction.containers, 2);
    assert_eq!(extraction.rows.len(), 2);
    assert_eq!(extraction.unparsed, 1);
    assert_eq!(extraction.unparsed_fraction(), 0.5);
    let first = &extraction.rows[0];
    assert_eq!(first.paragraph_id.as_deref(), Some("p1"));
    assert_eq!(first.section_id.as_deref(), Some("A.2"));
    assert_eq!(first.target.subsection, "A.1");
    assert_eq!(first.text_prefix.chars().count(), 50);
    assert_eq!(extraction.rows[1].target.unparsed, "Table 7.3 and more");
}

#[test]
fn commonest_keeps_repeated_values_only() {
    let parser = parser();
    let rows: Vec<TargetRow> = ["WGI SPM A.1", "WGI TS B.2", "WGII Chapter 7"]
        .iter()
        .map(|raw| TargetRow {
            paragraph_id: None,
            section_id: None,
            target: parser.parse_normalized(raw),
            text_prefix: String::new(),
        })
        .collect();

    assert_eq!(
        commonest(&rows, TargetField::Package),
        vec![("WGI".to_string(), 2)]
    );
    assert!(commonest(&rows, TargetField::Section).is_empty());
}

#[test]
fn default_factory_builds_target_address() {
    let factory = LinkFactory::default();
    let resolved = factory.resolve_reference("  wgi SPM A.1 ").unwrap();
    assert_eq!(resolved.report, "wg1");
    assert_eq!(resolved.chapter, "spm");
    assert_eq!(resolved.id, "A.1");
    assert_eq!(resolved.address, WG1_SPM);
}

#[test]
fn reference_shape_errors_are_typed() {
    let factory = LinkFactory::default();
    assert_eq!(
        factory.resolve_reference("WGII XX"),
        Err(ReferenceError::WrongShape {
            reference: "WGII XX".to_string(),
            tokens: 2,
        })
    );
    assert!(matches!(
        factory.resolve_reference("WGX SPM A.1"),
        Err(ReferenceError::UnknownReport { .. })
    ));
    assert_eq!(
        factory.resolve_reference("WGI Chapter 3"),
        Err(ReferenceError::UnknownChapterKind {
            reference: "WGI Chapter 3".to_string(),
            chapter: "chapter".to_string(),
        })
    );
}

#[test]
fn factory_file_overrides_only_given_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("factory.json");
    fs::write(
        &path,
        r#"{"target": {"owner": "someone", "leaf_name": "index.html"}, "chapter_kinds": ["spm"]}"#,
    )
    .unwrap();

    let factory = LinkFactory::load(Some(&path)).unwrap();
    assert_eq!(factory.chapter_kinds, vec!["spm".to_string()]);
    assert_eq!(factory.report_aliases.get("WGIII").map(String::as_str), Some("wg3"));
    assert_eq!(
        factory.target.address("wg2", "spm"),
        "https://raw.githubusercontent.com/someone/semanticClimate/main/ipcc/ar6/wg2/spm/index.html"
    );
}

#[test]
fn one_good_and_one_malformed_reference() {
    let factory = LinkFactory::default();
    let page = wg1_spm_page();
    let (stub, _) = StubFetcher::new(&[(WG1_SPM, page.as_str())]);
    let mut resolver = LinkResolver::new(&factory, stub).unwrap();
    let container = citing_container(Some("para_3"), "Warming is unequivocal ", "{WGI SPM A.1; WGII XX}");

    let table = resolver.resolve_container(&container).unwrap();

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.bad_links.len(), 1);
    let row = &table.rows[0];
    assert_eq!(row.anchor_id, "para_3");
    assert_eq!(row.reference, "WGI SPM A.1");
    assert_eq!(row.target_id, "A.1");
    assert_eq!(row.target_text, "A.1 Human influence has warmed the climate.");
    assert!(row.anchor_text.starts_with("Warming is unequivocal"));
    assert_eq!(
        table.bad_links.iter().next().map(|bad| bad.reference.as_str()),
        Some("WGII XX")
    );
}

#[test]
fn cache_fetches_each_address_once() {
    let factory = LinkFactory::default();
    let page = wg1_spm_page();
    let (stub, calls) = StubFetcher::new(&[(WG1_SPM, page.as_str())]);
    let mut resolver = LinkResolver::new(&factory, stub)
        .unwrap()
        .with_anchor_document("syr", "lr");

    let mut document = Document::default();
    document.body.push(citing_container(Some("a"), "one ", "{WGI SPM A.1, WGI SPM A.2}"));
    document.body.push(citing_container(Some("b"), "two ", "{WGI SPM A.2; WGII SPM B.1}"));
    document.body.push(citing_container(Some("c"), "three ", "{WGII SPM B.3}"));

    let table = resolver.resolve_document(&document).unwrap();

    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.bad_links.len(), 2);
    assert_eq!(calls.get(), 2);
    assert_eq!(resolver.fetches(), 2);
    assert!(
        table.bad_links.iter().all(|bad| bad.reason.contains("status 404")),
        "{:?}",
        table.bad_links
    );
    assert_eq!(
        table.rows[0].anchor_address.as_deref(),
        Some("https://raw.githubusercontent.com/petermr/semanticClimate/main/ipcc/ar6/syr/lr")
    );
}

#[test]
fn missing_remote_anchor_is_a_bad_link() {
    let factory = LinkFactory::default();
    let page = wg1_spm_page();
    let (stub, _) = StubFetcher::new(&[(WG1_SPM, page.as_str())]);
    let mut resolver = LinkResolver::new(&factory, stub).unwrap();
    let container = citing_container(Some("p"), "text ", "{WGI SPM Z.9}");

    let table = resolver.resolve_container(&container).unwrap();

    assert!(table.rows.is_empty());
    let bad = table.bad_links.iter().next().unwrap();
    assert!(bad.reason.contains("no element with id `Z.9`"));
}

#[test]
fn anchor_id_falls_back_to_first_span_and_anonymous_is_skipped() {
    let factory = LinkFactory::default();
    let page = wg1_spm_page();
    let (stub, calls) = StubFetcher::new(&[(WG1_SPM, page.as_str())]);
    let mut resolver = LinkResolver::new(&factory, stub).unwrap();

    let mut with_span_id = citing_container(None, "text ", "{WGI SPM A.1}");
    with_span_id.children[0].set_attr("id", "span_7");
    let table = resolver.resolve_container(&with_span_id).unwrap();
    assert_eq!(table.rows[0].anchor_id, "span_7");

    let anonymous = citing_container(None, "text ", "{WGI SPM A.2}");
    let table = resolver.resolve_container(&anonymous).unwrap();
    assert!(table.rows.is_empty());
    assert_eq!(table.anonymous_anchors, 1);
    assert_eq!(calls.get(), 1);
}

#[test]
fn resolving_a_span_is_a_contract_error() {
    let factory = LinkFactory::default();
    let (stub, _) = StubFetcher::new(&[]);
    let mut resolver = LinkResolver::new(&factory, stub).unwrap();
    let span = Element::with_text(ElementKind::Span, "{WGI SPM A.1}");

    let err = resolver.resolve_container(&span).unwrap_err();
    assert_eq!(err.expected, "div");
}

#[test]
fn target_text_joins_repeated_identifiers() {
    let document = RemoteDocument::parse(
        "<div><p>first <b id=\"x\">x</b></p><p>second <b id=\"x\">x</b></p></div>",
    );
    assert_eq!(
        document.target_text("x").as_deref(),
        Some("first xSEPsecond x")
    );
    assert_eq!(document.target_text("missing"), None);
}
