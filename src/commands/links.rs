use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use super::store::{open_store, upsert_link_table};
use crate::cli::LinksArgs;
use crate::references::{HttpFetcher, LinkFactory, LinkResolver, LinkTable, RemoteFetcher};
use crate::tree::Document;
use crate::util::{new_run_manifest, read_json, source_hash, write_json_pretty, write_run_manifest};

pub const LINKS_JSON: &str = "links.json";
pub const BAD_LINKS_JSON: &str = "bad_links.json";

pub fn resolve_links<F: RemoteFetcher>(
    document: &Document,
    factory: &LinkFactory,
    fetcher: F,
    args: &LinksArgs,
) -> Result<(LinkTable, usize)> {
    let mut resolver =
        LinkResolver::new(factory, fetcher)?.with_targets_class(args.targets_class.clone());
    if let (Some(report), Some(chapter)) = (&args.anchor_report, &args.anchor_chapter) {
        resolver = resolver.with_anchor_document(report, chapter);
    }
    let table = resolver.resolve_document(document)?;
    Ok((table, resolver.fetches()))
}

pub fn run(args: LinksArgs) -> Result<()> {
    let started = Utc::now();
    let mut manifest = new_run_manifest("links", started);

    let factory = LinkFactory::load(args.factory.as_deref())?;
    if let Some(path) = &args.factory {
        manifest.inputs.push(source_hash(path)?);
    }
    let document: Document = read_json(&args.input)?;
    manifest.inputs.push(source_hash(&args.input)?);

    info!(
        input = %args.input.display(),
        target_site = %factory.target.site,
        run_id = %manifest.run_id,
        "starting link resolution"
    );
    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs));
    let (table, fetches) = resolve_links(&document, &factory, fetcher, &args)?;

    for bad in table.bad_links.iter().take(10) {
        warn!(reference = %bad.reference, reason = %bad.reason, "unresolved citation");
    }
    manifest.counts.link_rows = table.rows.len();
    manifest.counts.bad_links = table.bad_links.len();
    manifest.counts.fetches = fetches;
    if table.anonymous_anchors > 0 {
        manifest.warnings.push(format!(
            "{} citation containers had no id and were skipped",
            table.anonymous_anchors
        ));
    }

    let links_path = args.out_dir.join(LINKS_JSON);
    let bad_links_path = args.out_dir.join(BAD_LINKS_JSON);
    write_json_pretty(&links_path, &table.rows)?;
    write_json_pretty(&bad_links_path, &table.bad_links)?;
    manifest.outputs.push(links_path.display().to_string());
    manifest.outputs.push(bad_links_path.display().to_string());

    if let Some(db_path) = &args.db_path {
        let mut connection = open_store(db_path)?;
        let written = upsert_link_table(&mut connection, &manifest.run_id, &table)?;
        info!(path = %db_path.display(), written, "stored link table");
        manifest.outputs.push(db_path.display().to_string());
    }

    let failed = args.fail_on_bad_links && !table.bad_links.is_empty();
    manifest.status = if failed { "failed" } else { "completed" }.to_string();
    write_run_manifest(&args.out_dir, &mut manifest)?;

    info!(
        rows = table.rows.len(),
        bad_links = table.bad_links.len(),
        fetches,
        "link resolution completed"
    );
    if failed {
        bail!("{} citations could not be resolved", table.bad_links.len());
    }
    Ok(())
}
