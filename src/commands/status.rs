use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::store::{LINKS_DB_FILE, StoreCounts, open_store, store_counts};
use crate::cli::StatusArgs;
use crate::model::RunManifest;
use crate::util::read_json;

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub latest: BTreeMap<String, RunManifest>,
    pub store: Option<StoreCounts>,
}

pub fn latest_manifests(out_dir: &Path) -> Result<BTreeMap<String, RunManifest>> {
    let manifest_dir = out_dir.join("manifests");
    let mut latest: BTreeMap<String, RunManifest> = BTreeMap::new();
    if !manifest_dir.exists() {
        return Ok(latest);
    }

    let entries = fs::read_dir(&manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read {}", manifest_dir.display()))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let manifest: RunManifest = match read_json(&path) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable manifest");
                continue;
            }
        };
        let newer = latest
            .get(&manifest.command)
            .is_none_or(|current| current.run_id < manifest.run_id);
        if newer {
            latest.insert(manifest.command.clone(), manifest);
        }
    }
    Ok(latest)
}

pub fn collect_status(out_dir: &Path, db_path: &Path) -> Result<StatusReport> {
    let latest = latest_manifests(out_dir)?;
    let store = if db_path.exists() {
        let connection = open_store(db_path)?;
        Some(store_counts(&connection)?)
    } else {
        None
    };
    Ok(StatusReport { latest, store })
}

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.out_dir.join(LINKS_DB_FILE));

    info!(out_dir = %args.out_dir.display(), "status requested");
    let status = collect_status(&args.out_dir, &db_path)?;

    if status.latest.is_empty() {
        warn!(path = %args.out_dir.join("manifests").display(), "no run manifests found");
    }
    for (command, manifest) in &status.latest {
        info!(
            command = %command,
            run_id = %manifest.run_id,
            status = %manifest.status,
            started_at = %manifest.started_at,
            updated_at = %manifest.updated_at,
            pages = manifest.counts.pages_total,
            pages_failed = manifest.counts.pages_failed,
            paragraphs = manifest.counts.paragraphs,
            tagged = manifest.counts.tagged_spans,
            unmatched = manifest.counts.unmatched_spans,
            targets = manifest.counts.targets,
            unparsed_targets = manifest.counts.unparsed_targets,
            link_rows = manifest.counts.link_rows,
            bad_links = manifest.counts.bad_links,
            warnings = manifest.warnings.len(),
            "latest run"
        );
    }

    match &status.store {
        Some(counts) => info!(
            path = %db_path.display(),
            link_rows = counts.link_rows,
            bad_links = counts.bad_links,
            unparsed_targets = counts.unparsed_targets,
            "database status"
        ),
        None => warn!(path = %db_path.display(), "database file missing"),
    }

    Ok(())
}
