// src/merge.rs
//! Reconcile a freshly scraped table against a previously downloaded snapshot.
//!
//! The snapshot ("existing") always wins: rows from the new table are only
//! added when their key is not already present. The key is the first of
//! [`MERGE_KEYS`](crate::schema::MERGE_KEYS) that both tables carry; with no
//! shared key every new row is kept and a warning is logged, so duplicates are
//! possible in that case.

use std::collections::HashSet;
use std::path::Path;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::schema::MERGE_KEYS;
use crate::table::{self, ResultsTable};

/// Which branch of the reconciliation produced the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeKind {
    /// No snapshot: the new table as-is.
    NewOnly,
    /// Nothing new (new table empty, or every key already present).
    ExistingOnly,
    /// Snapshot followed by the new rows it lacked.
    Combined,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciled {
    pub table: ResultsTable,
    pub kind: MergeKind,
    /// Rows taken from the new table.
    pub added: usize,
    /// Column used for dedup, if any.
    pub key: Option<&'static str>,
}

/// First merge key present on both tables.
pub fn shared_key(existing: &ResultsTable, new: &ResultsTable) -> Option<&'static str> {
    MERGE_KEYS.iter().copied().find(|k| existing.has_column(k) && new.has_column(k))
}

/// In-memory reconciliation. `None` only when both inputs are absent.
pub fn reconcile(existing: Option<ResultsTable>, new: Option<ResultsTable>) -> Option<Reconciled> {
    let Some(existing) = existing else {
        return new.map(|t| {
            let added = t.len();
            Reconciled { table: t, kind: MergeKind::NewOnly, added, key: None }
        });
    };

    let new = match new {
        Some(t) if !t.is_empty() => t,
        _ => return Some(Reconciled { table: existing, kind: MergeKind::ExistingOnly, added: 0, key: None }),
    };

    let key = shared_key(&existing, &new);
    let fresh: Vec<Vec<String>> = match key {
        Some(k) => {
            let seen: HashSet<&str> = existing.values(k).collect();
            let ix = new.column(k);
            new.rows.iter()
                .filter(|r| {
                    let cell = ix.and_then(|i| r.get(i)).map(|c| c.as_str()).unwrap_or("");
                    !seen.contains(cell)
                })
                .cloned()
                .collect()
        }
        None => {
            warn!("No GAMEID or GAMELINK column shared by both tables, appending all rows (may create duplicates)");
            new.rows.clone()
        }
    };

    if fresh.is_empty() {
        return Some(Reconciled { table: existing, kind: MergeKind::ExistingOnly, added: 0, key });
    }

    // Union of columns: snapshot order first, then columns only the new table has.
    let mut headers = existing.headers.clone();
    for h in &new.headers {
        if !headers.contains(h) {
            headers.push(h.clone());
        }
    }

    let added = fresh.len();
    let mut rows = existing.project_onto(&headers);
    rows.extend(ResultsTable::new(new.headers.clone(), fresh).project_onto(&headers));

    Some(Reconciled { table: ResultsTable::new(headers, rows), kind: MergeKind::Combined, added, key })
}

/// Read both tables, reconcile, write the result to `output_path`.
/// Unreadable inputs count as absent; `Ok(None)` when neither is usable.
pub fn try_merge(existing_path: &Path, new_path: &Path, output_path: &Path) -> Result<Option<Reconciled>> {
    let existing = table::read(existing_path);
    let new = table::read(new_path);

    if existing.is_none() {
        warn!("Existing CSV {} not found or unreadable, using new CSV only", existing_path.display());
    }

    let Some(out) = reconcile(existing, new) else { return Ok(None) };
    crate::file::write_table(output_path, &out.table)?;
    Ok(Some(out))
}

/// Merge `new_path` into `existing_path`, writing `output_path`.
/// Any failure is logged and reported as `false`; the caller should then
/// fall back to the un-merged new table.
pub fn merge(existing_path: &Path, new_path: &Path, output_path: &Path) -> bool {
    match try_merge(existing_path, new_path, output_path) {
        Ok(Some(r)) => {
            match r.kind {
                MergeKind::NewOnly => info!("Wrote new CSV only to {}", output_path.display()),
                MergeKind::ExistingOnly => info!("No new games to add, existing CSV is up to date"),
                MergeKind::Combined => info!(
                    "Merged CSV files: {} existing rows + {} new rows = {} total rows",
                    r.table.len() - r.added,
                    r.added,
                    r.table.len()
                ),
            }
            true
        }
        Ok(None) => {
            warn!("Neither {} nor {} could be read, nothing to merge", existing_path.display(), new_path.display());
            false
        }
        Err(e) => {
            error!("Error merging CSV files: {e}");
            false
        }
    }
}
