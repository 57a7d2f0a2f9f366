// src/file.rs

use std::{
    ffi::OsString,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::error::{Result, StoreError};
use crate::model::Slot;
use crate::table::ResultsTable;

/// `<out_dir>/<gender>/<division>/<YYYY>/<MM>/<gender>_<division>_<YYYY-MM-DD>.csv`
pub fn table_path(out_dir: &Path, slot: &Slot) -> PathBuf {
    let year = slot.date.format("%Y").to_string();
    let month = slot.date.format("%m").to_string();
    let stem = format!("{}_{}_{}", slot.gender, slot.division, slot.date.format("%Y-%m-%d"));

    out_dir
        .join(slot.gender.as_str())
        .join(slot.division.as_str())
        .join(year)
        .join(month)
        .join(join!(&stem, ".csv"))
}

/// `table.csv` + `.existing` → `table.csv.existing`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(StoreError::NotADirectory(dir.to_path_buf()));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    Ok(())
}

/// Replace `path` with `contents` through a sibling temp file, so a failed
/// write leaves the previous file untouched.
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    let tmp = with_suffix(path, ".tmp");
    let written = (|| -> Result<()> {
        let mut out = BufWriter::new(fs::File::create(&tmp)?);
        out.write_all(contents)?;
        out.flush()?;
        Ok(())
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Rewrite a whole table (header + rows).
pub fn write_table(path: &Path, table: &ResultsTable) -> Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    crate::csv::write_table(&mut buf, table)?;
    replace_file(path, &buf)
}

/// Move `from` over `to`, replacing it.
pub fn move_into_place(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    fs::rename(from, to)?;
    Ok(())
}

/// Missing or zero-length.
pub fn has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}
