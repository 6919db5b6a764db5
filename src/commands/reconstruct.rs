use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ReconstructArgs;
use crate::config::PipelineConfig;
use crate::layout::{AssemblyPath, PageSelection, assemble_document};
use crate::model::{GlyphDocument, RunCounts};
use crate::tree::{Document, render_document};
use crate::util::{
    new_run_manifest, read_json, source_hash, write_json_pretty, write_run_manifest, write_text,
};

pub const DOCUMENT_JSON: &str = "document.json";
pub const DOCUMENT_HTML: &str = "document.html";
pub const MARGINS_JSON: &str = "margins.json";

#[derive(Debug, Clone, Serialize)]
pub struct PageMargins {
    pub page_number: u32,
    pub headers: Vec<String>,
    pub footers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub document: Document,
    pub margins: Vec<PageMargins>,
    pub counts: RunCounts,
    pub warnings: Vec<String>,
}

pub fn run(args: ReconstructArgs) -> Result<()> {
    let started = Utc::now();
    let mut manifest = new_run_manifest("reconstruct", started);

    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Some(height) = args.header_height {
        config.joiner.header_height = height;
    }
    if let Some(height) = args.footer_height {
        config.joiner.footer_height = height;
    }
    let selection = args
        .pages
        .as_deref()
        .map(PageSelection::parse)
        .transpose()
        .context("invalid --pages selection")?;

    info!(
        input = %args.input.display(),
        mode = args.mode.as_str(),
        run_id = %manifest.run_id,
        "starting reconstruction"
    );
    let glyphs: GlyphDocument = read_json(&args.input)?;
    manifest.inputs.push(source_hash(&args.input)?);

    let reconstruction = reconstruct(
        &glyphs,
        args.mode.path(),
        selection.as_ref(),
        &config,
        args.strip_positions,
    )?;
    let outputs = write_outputs(&args.out_dir, &reconstruction)?;

    manifest.outputs = outputs
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    manifest.counts = reconstruction.counts.clone();
    manifest.warnings = reconstruction.warnings.clone();
    manifest.status = if reconstruction.warnings.is_empty() {
        "completed".to_string()
    } else {
        "completed_with_warnings".to_string()
    };
    write_run_manifest(&args.out_dir, &mut manifest)?;

    info!(
        pages = manifest.counts.pages_total,
        failed = manifest.counts.pages_failed,
        paragraphs = manifest.counts.paragraphs,
        out_dir = %args.out_dir.display(),
        "reconstruction completed"
    );
    Ok(())
}

pub fn reconstruct(
    glyphs: &GlyphDocument,
    path: AssemblyPath,
    selection: Option<&PageSelection>,
    config: &PipelineConfig,
    strip_positions: bool,
) -> Result<Reconstruction> {
    let assembled = assemble_document(glyphs, path, selection, config);
    if assembled.pages.is_empty() {
        bail!("no pages selected for reconstruction");
    }

    let mut counts = RunCounts {
        pages_total: assembled.pages.len(),
        pages_failed: assembled.failed_pages(),
        ..RunCounts::default()
    };
    let mut margins = Vec::new();
    for page in assembled.assembled() {
        counts.pages_assembled += 1;
        counts.spans += page.span_count;
        counts.lines += page.line_count;
        counts.paragraphs += page.paragraph_count;
        counts.header_spans += page.headers.len();
        counts.footer_spans += page.footers.len();
        if !page.headers.is_empty() || !page.footers.is_empty() {
            margins.push(PageMargins {
                page_number: page.page_number,
                headers: page.headers.clone(),
                footers: page.footers.clone(),
            });
        }
    }
    if counts.pages_assembled == 0 {
        warn!(pages = counts.pages_total, "every selected page failed to assemble");
    }

    let mut document = assembled.document;
    if strip_positions {
        document.strip_positional_attributes();
    }

    Ok(Reconstruction {
        document,
        margins,
        counts,
        warnings: assembled.warnings,
    })
}

pub fn write_outputs(out_dir: &Path, reconstruction: &Reconstruction) -> Result<Vec<PathBuf>> {
    let json_path = out_dir.join(DOCUMENT_JSON);
    let html_path = out_dir.join(DOCUMENT_HTML);
    let margins_path = out_dir.join(MARGINS_JSON);

    write_json_pretty(&json_path, &reconstruction.document)?;
    write_text(&html_path, &render_document(&reconstruction.document))?;
    write_json_pretty(&margins_path, &reconstruction.margins)?;

    Ok(vec![json_path, html_path, margins_path])
}
