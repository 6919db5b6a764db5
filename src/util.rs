use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::model::{RunManifest, SourceHash};

pub const MANIFEST_VERSION: u32 = 1;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn source_hash(path: &Path) -> Result<SourceHash> {
    Ok(SourceHash {
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn write_run_manifest(out_dir: &Path, manifest: &mut RunManifest) -> Result<()> {
    manifest.updated_at = now_utc_string();
    let path = out_dir
        .join("manifests")
        .join(format!("{}_{}.json", manifest.command, manifest.run_id));
    write_json_pretty(&path, manifest)
}

pub fn new_run_manifest(command: &str, started: DateTime<Utc>) -> RunManifest {
    let started_at = started.to_rfc3339_opts(SecondsFormat::Secs, true);
    RunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: format!("run-{}", utc_compact_string(started)),
        command: command.to_string(),
        status: "running".to_string(),
        started_at: started_at.clone(),
        updated_at: started_at,
        inputs: Vec::new(),
        outputs: Vec::new(),
        counts: Default::default(),
        warnings: Vec::new(),
    }
}
