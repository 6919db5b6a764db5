use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::cli::{RuleSet, TagArgs};
use crate::config::PipelineConfig;
use crate::tagging::{NestReport, RuleTable, SectionTagger, TagReport, TaggerOptions, nest_sections};
use crate::tree::{Document, ElementKind, render_document};
use crate::util::{
    new_run_manifest, read_json, source_hash, write_json_pretty, write_run_manifest, write_text,
};

pub const TAGGED_JSON: &str = "tagged.json";
pub const TAGGED_HTML: &str = "tagged.html";
pub const UNMATCHED_JSON: &str = "unmatched.json";

#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    pub rule_set: String,
    pub report: TagReport,
    pub most_common_unmatched: Vec<(String, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nesting: Option<NestReport>,
}

pub fn load_rules(args: &TagArgs) -> Result<RuleTable> {
    let rules = match &args.rules {
        Some(path) => RuleTable::load(path),
        None => {
            let rules = match args.rule_set {
                RuleSet::Decisions => RuleTable::decisions(),
                RuleSet::Inline => RuleTable::inline_references(),
                RuleSet::Targets => RuleTable::citation_targets(),
            };
            rules.with_context(|| {
                format!("failed to load built-in `{}` rules", args.rule_set.as_str())
            })
        }
    }?;
    if rules.is_empty() {
        bail!("rule table has no rules");
    }
    Ok(rules)
}

pub fn tagger_options(args: &TagArgs, config: &PipelineConfig) -> TaggerOptions {
    TaggerOptions {
        split: args.split || args.rule_set.splits_spans(),
        max_splits: args.max_splits.unwrap_or(config.tagging.max_splits),
        span_range: args.span_range,
    }
}

pub fn tag(
    document: &mut Document,
    rules: &RuleTable,
    options: TaggerOptions,
    nest: bool,
) -> Result<(TagReport, Option<NestReport>)> {
    let report = SectionTagger::new(rules, options)
        .tag_document(document)
        .context("tagging aborted on a malformed document tree")?;
    let nesting = nest.then(|| nest_sections(document, rules));
    Ok((report, nesting))
}

pub fn run(args: TagArgs) -> Result<()> {
    let started = Utc::now();
    let mut manifest = new_run_manifest("tag", started);

    let config = PipelineConfig::load(args.config.as_deref())?;
    let rules = load_rules(&args)?;
    let options = tagger_options(&args, &config);

    info!(
        input = %args.input.display(),
        rules = rules.len(),
        split = options.split,
        nest = args.nest,
        "starting tagging"
    );
    let mut document: Document = read_json(&args.input)?;
    manifest.inputs.push(source_hash(&args.input)?);
    info!(spans = document.body.count_kind(ElementKind::Span), "loaded document tree");
    if let Some(path) = &args.rules {
        manifest.inputs.push(source_hash(path)?);
    }

    let (report, nesting) = tag(&mut document, &rules, options, args.nest)?;

    let most_common_unmatched: Vec<(String, usize)> = report
        .most_common_unmatched(args.report_unmatched)
        .into_iter()
        .map(|(text, count)| (text.to_string(), count))
        .collect();
    for (text, count) in most_common_unmatched.iter().take(5) {
        info!(count, text = %text, "frequent unmatched span");
    }

    manifest.counts.tagged_spans = report.tagged;
    manifest.counts.unmatched_spans = report.unmatched_total();

    let summary = TagSummary {
        rule_set: args
            .rules
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| args.rule_set.as_str().to_string()),
        report,
        most_common_unmatched,
        nesting,
    };

    let outputs: Vec<PathBuf> = vec![
        args.out_dir.join(TAGGED_JSON),
        args.out_dir.join(TAGGED_HTML),
        args.out_dir.join(UNMATCHED_JSON),
    ];
    write_json_pretty(&outputs[0], &document)?;
    write_text(&outputs[1], &render_document(&document))?;
    write_json_pretty(&outputs[2], &summary)?;

    manifest.outputs = outputs
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    manifest.status = "completed".to_string();
    write_run_manifest(&args.out_dir, &mut manifest)?;

    info!(
        tagged = manifest.counts.tagged_spans,
        unmatched = manifest.counts.unmatched_spans,
        out_dir = %args.out_dir.display(),
        "tagging completed"
    );
    Ok(())
}
