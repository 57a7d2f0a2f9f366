// src/table.rs
//
// Results tables: one CSV per (date, division, gender).
//
// Every operation here follows the same contract: a missing file is "empty",
// a bad file is logged and treated as absent, and nothing is raised to the
// caller. The `try_*` variants expose the underlying error for callers that
// want it (merge, tests).

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};
use crate::schema::{self, DUPLICATE_ACROSS_DIVISIONS, GAMEID, GAMELINK, REQUIRED_COLUMNS};

/// Row-oriented table of string cells. Rows are kept at header width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultsTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultsTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Same columns, no rows.
    pub fn empty_like(&self) -> Self {
        Self { headers: self.headers.clone(), rows: Vec::new() }
    }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// All values of a column, in row order. Empty if the column is absent.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let ix = self.column(name);
        self.rows.iter().filter_map(move |r| ix.and_then(|i| r.get(i)).map(|c| c.as_str()))
    }

    pub fn value_set(&self, name: &str) -> BTreeSet<String> {
        self.values(name).map(|v| v.to_string()).collect()
    }

    pub fn contains_value(&self, name: &str, value: &str) -> bool {
        self.values(name).any(|v| v == value)
    }

    /// Rows whose `name` cell equals `value`, as a new table with the same columns.
    pub fn select_eq(&self, name: &str, value: &str) -> Self {
        let Some(ix) = self.column(name) else { return self.empty_like() };
        let rows = self.rows.iter()
            .filter(|r| r.get(ix).map(|c| c == value).unwrap_or(false))
            .cloned()
            .collect();
        Self { headers: self.headers.clone(), rows }
    }

    /// Append a column filled with `default` if it is missing; returns its index.
    pub fn ensure_column(&mut self, name: &str, default: &str) -> usize {
        if let Some(ix) = self.column(name) {
            return ix;
        }
        self.headers.push(s!(name));
        for r in &mut self.rows {
            r.push(s!(default));
        }
        self.headers.len() - 1
    }

    /// Set `target` to `value` on every row whose `key` cell equals `key_value`.
    /// Returns how many rows changed.
    pub fn set_where(&mut self, key: &str, key_value: &str, target: &str, value: &str) -> usize {
        let (Some(k), Some(t)) = (self.column(key), self.column(target)) else { return 0 };
        let mut n = 0;
        for r in &mut self.rows {
            if r.get(k).map(|c| c == key_value).unwrap_or(false) {
                r[t] = s!(value);
                n += 1;
            }
        }
        n
    }

    /// Re-shape rows onto another header by column name. Columns the target
    /// header lacks are dropped; columns this table lacks come out empty.
    pub fn project_onto(&self, headers: &[String]) -> Vec<Vec<String>> {
        let map: Vec<Option<usize>> = headers.iter().map(|h| self.column(h)).collect();
        self.rows.iter()
            .map(|r| {
                map.iter()
                    .map(|ix| ix.and_then(|i| r.get(i)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/* ---------------- Reading ---------------- */

/// `Ok(None)` when the file does not exist; `Err` when it cannot be parsed
/// or has no header row.
pub fn try_read(path: &Path) -> Result<Option<ResultsTable>> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let table = crate::csv::read_table(file)?;
    if table.headers.is_empty() {
        return Err(StoreError::EmptyTable(path.to_path_buf()));
    }
    Ok(Some(table))
}

/// The whole table, or `None` if it is missing (silent) or unreadable (logged).
pub fn read(path: &Path) -> Option<ResultsTable> {
    match try_read(path) {
        Ok(t) => t,
        Err(e) => {
            error!("Error reading CSV file {}: {e}", path.display());
            None
        }
    }
}

/// True iff the table exists, parses, has a `GAMEID` column, and that column
/// holds `game_id`.
pub fn exists(path: &Path, game_id: &str) -> bool {
    match try_read(path) {
        Ok(Some(t)) => t.contains_value(GAMEID, game_id),
        Ok(None) => false,
        Err(e) => {
            warn!("Error reading CSV file {}: {e}", path.display());
            false
        }
    }
}

/// Every `GAMEID` present; empty when the file or the column is missing.
pub fn identity_set(path: &Path) -> BTreeSet<String> {
    read(path).map(|t| t.value_set(GAMEID)).unwrap_or_default()
}

/// Light schema check: all of the required columns are present.
pub fn validate_structure(path: &Path) -> bool {
    match read(path) {
        Some(t) => REQUIRED_COLUMNS.iter().all(|c| t.has_column(c)),
        None => false,
    }
}

/// All rows for one game link, or `None` if there are none (or no link column).
pub fn rows_for_link(path: &Path, game_link: &str) -> Option<ResultsTable> {
    let table = read(path)?;
    if !table.has_column(GAMELINK) {
        return None;
    }
    let hits = table.select_eq(GAMELINK, game_link);
    if hits.is_empty() { None } else { Some(hits) }
}

/* ---------------- Writing ---------------- */

/// Append rows; the header is written only when the file is new (or empty).
/// Identity values are not checked: call [`exists`] first to avoid duplicates.
pub fn try_append(path: &Path, table: &ResultsTable) -> Result<()> {
    let fresh = !crate::file::has_content(path);

    let rows = if fresh {
        table.rows.clone()
    } else {
        let on_disk = crate::csv::read_headers(fs::File::open(path)?)?;
        if on_disk == table.headers {
            table.rows.clone()
        } else {
            warn!(
                "Appending to {} with different columns; aligning {} rows to the file header",
                path.display(),
                table.len()
            );
            table.project_onto(&on_disk)
        }
    };

    crate::file::ensure_parent(path)?;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut out = BufWriter::new(file);
    let headers = if fresh { Some(table.headers.as_slice()) } else { None };
    crate::csv::write_rows(&mut out, headers, &rows)?;
    out.flush()?;
    Ok(())
}

pub fn append(path: &Path, table: &ResultsTable) -> bool {
    match try_append(path, table) {
        Ok(()) => {
            info!("Successfully saved {} rows to: {}", table.len(), path.display());
            true
        }
        Err(e) => {
            error!("Error saving data to {}: {e}", path.display());
            false
        }
    }
}

pub fn try_set_duplicate_flag(path: &Path, game_link: &str, value: bool) -> Result<usize> {
    let mut table = try_read(path)?.ok_or_else(|| {
        StoreError::Io(std::io::Error::new(ErrorKind::NotFound, "table does not exist"))
    })?;
    if !table.has_column(GAMELINK) {
        return Err(StoreError::MissingColumn(GAMELINK));
    }
    table.ensure_column(DUPLICATE_ACROSS_DIVISIONS, schema::FALSE);
    let changed = table.set_where(GAMELINK, game_link, DUPLICATE_ACROSS_DIVISIONS, schema::encode_bool(value));
    crate::file::write_table(path, &table)?;
    Ok(changed)
}

/// Set the cross-division duplicate flag on every row of `game_link`,
/// adding the column (default `False`) if needed. Rewrites the whole file.
pub fn set_duplicate_flag(path: &Path, game_link: &str, value: bool) -> bool {
    match try_set_duplicate_flag(path, game_link, value) {
        Ok(changed) => {
            info!("Updated {DUPLICATE_ACROSS_DIVISIONS} flag for game {game_link} in {} ({changed} rows)", path.display());
            true
        }
        Err(e) => {
            match e {
                StoreError::MissingColumn(_) => debug!("{} has no {GAMELINK} column", path.display()),
                _ => error!("Error updating duplicate flag in {}: {e}", path.display()),
            }
            false
        }
    }
}
