// src/csv.rs
use std::io::{Read, Write};

use crate::error::Result;
use crate::table::ResultsTable;

/* ---------------- Parsing ---------------- */

/// Decode a headed CSV table. Blank lines are skipped; short rows are padded
/// with empty cells and long rows cut back to the header width.
pub fn read_table<R: Read>(r: R) -> Result<ResultsTable> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(r);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        if row.len() != width {
            tracing::debug!("row {} has {} cells, header has {width}", rows.len() + 1, row.len());
            row.resize(width, s!());
        }
        rows.push(row);
    }

    Ok(ResultsTable { headers, rows })
}

/// Only the header line of a table (first record).
pub fn read_headers<R: Read>(r: R) -> Result<Vec<String>> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(r);
    Ok(rdr.headers()?.iter().map(|h| h.to_string()).collect())
}

/* ---------------- Writing ---------------- */

/// Write `rows` (and optionally the header line) to any writer.
pub fn write_rows<W: Write>(
    w: W,
    headers: Option<&[String]>,
    rows: &[Vec<String>],
) -> Result<()> {
    let mut wtr = ::csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(w);

    if let Some(h) = headers {
        wtr.write_record(h)?;
    }
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Whole table, header first.
pub fn write_table<W: Write>(w: W, table: &ResultsTable) -> Result<()> {
    write_rows(w, Some(table.headers.as_slice()), &table.rows)
}

/// Render a table as CSV text (stdout, diagnostics).
pub fn table_to_string(table: &ResultsTable) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let _ = write_table(&mut buf, table);

    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}
