use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::references::{LinkTable, TargetRow};
use crate::util::{ensure_directory, now_utc_string};

pub const LINKS_DB_FILE: &str = "doclinker.sqlite";

const DB_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub link_rows: i64,
    pub bad_links: i64,
    pub unparsed_targets: i64,
}

pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let connection =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS link_rows (
          anchor_id TEXT NOT NULL,
          reference TEXT NOT NULL,
          anchor_text TEXT,
          target_id TEXT NOT NULL,
          target_text TEXT,
          target_address TEXT NOT NULL,
          anchor_address TEXT,
          run_id TEXT NOT NULL,
          PRIMARY KEY(anchor_id, reference)
        );

        CREATE TABLE IF NOT EXISTS bad_links (
          reference TEXT PRIMARY KEY,
          reason TEXT NOT NULL,
          run_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS unparsed_targets (
          paragraph_id TEXT NOT NULL DEFAULT '',
          raw TEXT NOT NULL,
          section_id TEXT,
          package TEXT,
          section TEXT,
          object TEXT,
          subsection TEXT,
          unparsed TEXT NOT NULL,
          run_id TEXT NOT NULL,
          PRIMARY KEY(paragraph_id, raw)
        );

        CREATE INDEX IF NOT EXISTS idx_link_rows_target ON link_rows(target_address, target_id);
        ",
        )
        .context("failed to create link database schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;
    Ok(())
}

pub fn upsert_link_table(
    connection: &mut Connection,
    run_id: &str,
    table: &LinkTable,
) -> Result<usize> {
    let tx = connection.transaction()?;

    {
        let mut row_statement = tx.prepare(
            "
            INSERT INTO link_rows(
              anchor_id, reference, anchor_text, target_id, target_text,
              target_address, anchor_address, run_id
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(anchor_id, reference) DO UPDATE SET
              anchor_text=excluded.anchor_text,
              target_id=excluded.target_id,
              target_text=excluded.target_text,
              target_address=excluded.target_address,
              anchor_address=excluded.anchor_address,
              run_id=excluded.run_id
            ",
        )?;
        for row in &table.rows {
            row_statement.execute(params![
                &row.anchor_id,
                &row.reference,
                &row.anchor_text,
                &row.target_id,
                &row.target_text,
                &row.target_address,
                &row.anchor_address,
                run_id
            ])?;
        }

        let mut bad_statement = tx.prepare(
            "
            INSERT INTO bad_links(reference, reason, run_id)
            VALUES(?1, ?2, ?3)
            ON CONFLICT(reference) DO UPDATE SET
              reason=excluded.reason,
              run_id=excluded.run_id
            ",
        )?;
        for bad in &table.bad_links {
            bad_statement.execute(params![&bad.reference, &bad.reason, run_id])?;
        }
    }

    tx.commit()?;
    Ok(table.rows.len() + table.bad_links.len())
}

pub fn upsert_unparsed_targets(
    connection: &mut Connection,
    run_id: &str,
    rows: &[TargetRow],
) -> Result<usize> {
    let tx = connection.transaction()?;
    let mut written = 0;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO unparsed_targets(
              paragraph_id, raw, section_id, package, section, object,
              subsection, unparsed, run_id
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(paragraph_id, raw) DO UPDATE SET
              section_id=excluded.section_id,
              package=excluded.package,
              section=excluded.section,
              object=excluded.object,
              subsection=excluded.subsection,
              unparsed=excluded.unparsed,
              run_id=excluded.run_id
            ",
        )?;
        for row in rows.iter().filter(|row| !row.target.is_fully_parsed()) {
            statement.execute(params![
                row.paragraph_id.as_deref().unwrap_or_default(),
                &row.target.raw,
                &row.section_id,
                &row.target.package,
                &row.target.section,
                &row.target.object,
                &row.target.subsection,
                &row.target.unparsed,
                run_id
            ])?;
            written += 1;
        }
    }

    tx.commit()?;
    Ok(written)
}

pub fn store_counts(connection: &Connection) -> Result<StoreCounts> {
    Ok(StoreCounts {
        link_rows: query_count(connection, "SELECT COUNT(*) FROM link_rows")?,
        bad_links: query_count(connection, "SELECT COUNT(*) FROM bad_links")?,
        unparsed_targets: query_count(connection, "SELECT COUNT(*) FROM unparsed_targets")?,
    })
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to run `{sql}`"))?;
    Ok(count)
}
