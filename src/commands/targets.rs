use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::store::{open_store, upsert_unparsed_targets};
use crate::cli::TargetsArgs;
use crate::references::{
    TargetExtraction, TargetField, TargetParser, TargetRow, commonest, extract_targets,
};
use crate::tree::Document;
use crate::util::{new_run_manifest, read_json, source_hash, write_json_pretty, write_run_manifest};

pub const TARGETS_JSON: &str = "targets.json";

const SUMMARY_FIELDS: [TargetField; 5] = [
    TargetField::Package,
    TargetField::Section,
    TargetField::Object,
    TargetField::Subsection,
    TargetField::Unparsed,
];

#[derive(Debug, Clone, Serialize)]
pub struct TargetsReport {
    pub targets: usize,
    pub unparsed: usize,
    pub unparsed_fraction: f64,
    pub commonest: BTreeMap<&'static str, Vec<(String, usize)>>,
    pub rows: Vec<TargetRow>,
}

impl TargetsReport {
    pub fn from_extraction(extraction: TargetExtraction) -> Self {
        let commonest = SUMMARY_FIELDS
            .iter()
            .map(|field| (field.as_str(), commonest(&extraction.rows, *field)))
            .collect();
        Self {
            targets: extraction.rows.len(),
            unparsed: extraction.unparsed,
            unparsed_fraction: extraction.unparsed_fraction(),
            commonest,
            rows: extraction.rows,
        }
    }
}

pub fn targets_from_lines(text: &str, parser: &TargetParser) -> TargetExtraction {
    let mut extraction = TargetExtraction::default();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        extraction.containers += 1;
        let target = parser.parse_normalized(line);
        if !target.is_fully_parsed() {
            extraction.unparsed += 1;
        }
        extraction.rows.push(TargetRow {
            paragraph_id: None,
            section_id: None,
            target,
            text_prefix: line.chars().take(50).collect(),
        });
    }
    extraction
}

pub fn run(args: TargetsArgs) -> Result<()> {
    let started = Utc::now();
    let mut manifest = new_run_manifest("targets", started);
    let parser = TargetParser::new()?;

    let extraction = match (&args.input, &args.citations) {
        (Some(input), _) => {
            let document: Document = read_json(input)?;
            manifest.inputs.push(source_hash(input)?);
            extract_targets(&document, &parser)?
        }
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            manifest.inputs.push(source_hash(path)?);
            targets_from_lines(&text, &parser)
        }
        (None, None) => bail!("either --input or --citations is required"),
    };

    if extraction.unparsed > 0 {
        warn!(
            unparsed = extraction.unparsed,
            targets = extraction.rows.len(),
            "some citations kept unparsed residue"
        );
    }
    manifest.counts.targets = extraction.rows.len();
    manifest.counts.unparsed_targets = extraction.unparsed;

    if let Some(db_path) = &args.db_path {
        let mut connection = open_store(db_path)?;
        let written = upsert_unparsed_targets(&mut connection, &manifest.run_id, &extraction.rows)?;
        info!(path = %db_path.display(), written, "stored unparsed targets");
        manifest.outputs.push(db_path.display().to_string());
    }

    let report = TargetsReport::from_extraction(extraction);
    let report_path = args.out_dir.join(TARGETS_JSON);
    write_json_pretty(&report_path, &report)?;
    manifest.outputs.push(report_path.display().to_string());

    manifest.status = "completed".to_string();
    write_run_manifest(&args.out_dir, &mut manifest)?;

    info!(
        targets = report.targets,
        unparsed = report.unparsed,
        path = %report_path.display(),
        "target extraction completed"
    );
    Ok(())
}
