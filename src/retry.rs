// src/retry.rs
//! Game passes: walk a list of game links for one slot, append what scrapes,
//! send what fails to the ledger, and on a retry pass reconcile against the
//! remote snapshot of the table.
//!
//! Browser scraping and cloud storage stay outside this crate; they come in
//! through [`GameScraper`] and [`SnapshotSource`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::consts::*;
use crate::config::options::Options;
use crate::file::{self, with_suffix};
use crate::ledger;
use crate::merge;
use crate::model::{Division, Slot};
use crate::progress::Progress;
use crate::schema::{self, DUPLICATE_ACROSS_DIVISIONS, GAMEID};
use crate::table::{self, ResultsTable};

/// The scraping layer.
pub trait GameScraper {
    /// `Ok(Some)` rows for the game, `Ok(None)` a soft failure (page never
    /// settled, no box score), `Err` a hard failure with its message.
    fn scrape_game(&mut self, game_link: &str, slot: &Slot) -> Result<Option<ResultsTable>, String>;

    /// Called every few games so the scraper can restart its browser.
    fn recycle(&mut self) {}
}

/// Remote copy of the results tables (cloud storage).
pub trait SnapshotSource {
    /// Download the remote copy of `slot`'s table to `dest`. `false` if there is none.
    fn fetch(&mut self, slot: &Slot, dest: &Path) -> bool;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub scraped: usize,
    pub copied: usize,
    pub already_present: usize,
    pub failed: usize,
    /// A snapshot was merged into the table.
    pub merged: bool,
}

impl PassSummary {
    pub fn succeeded(&self) -> usize {
        self.scraped + self.copied + self.already_present
    }
}

enum GameResult {
    Scraped,
    Copied,
    AlreadyPresent,
    Failed { error_type: &'static str, message: String },
}

pub struct GamePass<'a> {
    options: &'a Options,
    scraper: &'a mut dyn GameScraper,
    snapshots: Option<&'a mut dyn SnapshotSource>,
    progress: Option<&'a mut dyn Progress>,
    /// Game link → division that owns the game when it is listed in several.
    primary: HashMap<String, Division>,
}

impl<'a> GamePass<'a> {
    pub fn new(options: &'a Options, scraper: &'a mut dyn GameScraper) -> Self {
        Self { options, scraper, snapshots: None, progress: None, primary: HashMap::new() }
    }

    pub fn with_snapshots(mut self, snapshots: &'a mut dyn SnapshotSource) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn with_progress(mut self, progress: &'a mut dyn Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Cross-division hints: `game link → primary division`.
    pub fn with_primary_divisions(mut self, primary: HashMap<String, Division>) -> Self {
        self.primary = primary;
        self
    }

    fn log(&mut self, msg: &str) {
        info!("{msg}");
        if let Some(p) = self.progress.as_deref_mut() {
            p.log(msg);
        }
    }

    /// Run every link for `slot`. On a retry pass, ledger records are cleared
    /// or counted and the remote snapshot (if any) is merged in at the end.
    pub fn run(&mut self, slot: &Slot, links: &[String], is_retry: bool) -> PassSummary {
        let table_path = self.options.table_path(slot);
        let ledger_path = self.options.ledger_path().to_path_buf();
        let mut summary = PassSummary::default();

        let existing_path = with_suffix(&table_path, EXISTING_SUFFIX);
        let have_snapshot = is_retry && match self.snapshots.as_deref_mut() {
            Some(src) => {
                if src.fetch(slot, &existing_path) {
                    info!("Downloaded existing CSV: {}", existing_path.display());
                    true
                } else {
                    info!("No existing CSV for {slot}, will create new file");
                    false
                }
            }
            None => false,
        };

        self.log(&format!("Scraping {} games for {slot}", links.len()));
        if let Some(p) = self.progress.as_deref_mut() {
            p.begin(links.len());
        }

        for (idx, link) in links.iter().enumerate() {
            let result = self.run_one(slot, link, &table_path);

            match &result {
                GameResult::Scraped => summary.scraped += 1,
                GameResult::Copied => summary.copied += 1,
                GameResult::AlreadyPresent => summary.already_present += 1,
                GameResult::Failed { .. } => summary.failed += 1,
            }

            match result {
                GameResult::Failed { error_type, message } => {
                    ledger::save(&ledger_path, link, slot.date, slot.division, slot.gender, error_type, &message);
                    if is_retry {
                        ledger::mark_retried(&ledger_path, link, slot.date, slot.division, slot.gender, false);
                    }
                    if let Some(p) = self.progress.as_deref_mut() {
                        p.item_failed(link, &message);
                    }
                }
                _ => {
                    if is_retry {
                        ledger::mark_retried(&ledger_path, link, slot.date, slot.division, slot.gender, true);
                    }
                    if let Some(p) = self.progress.as_deref_mut() {
                        p.item_done(link);
                    }
                }
            }

            let n = idx + 1;
            if n % DRIVER_RECYCLE_EVERY == 0 && n < links.len() {
                info!("Recycling scraper after {n} games");
                self.scraper.recycle();
            }
        }

        self.log(&format!(
            "Scraped {}/{} games successfully ({} failed)",
            summary.succeeded(),
            links.len(),
            summary.failed
        ));

        if have_snapshot && existing_path.exists() {
            summary.merged = reconcile_snapshot(&existing_path, &table_path);
        }

        if let Some(p) = self.progress.as_deref_mut() {
            p.finish();
        }
        summary
    }

    fn run_one(&mut self, slot: &Slot, link: &str, table_path: &Path) -> GameResult {
        let primary = self.primary.get(link).copied().filter(|d| *d != slot.division);

        if let Some(primary) = primary {
            let primary_path = self.options.table_path(&slot.with_division(primary));
            match table::rows_for_link(&primary_path, link) {
                Some(rows) => {
                    info!("Game is duplicate (primary: {primary}), copying from {}", primary_path.display());
                    if append_duplicate(table_path, link, rows) {
                        return GameResult::Copied;
                    }
                    warn!("Failed to copy {link} from {primary}, will scrape instead");
                }
                None => info!("Primary table for {link} not there yet, will scrape and mark as duplicate"),
            }
        }

        let rows = match self.scraper.scrape_game(link, slot) {
            Ok(Some(rows)) if !rows.is_empty() => rows,
            Ok(_) => {
                return GameResult::Failed { error_type: SOFT_FAILURE_TYPE, message: s!(SOFT_FAILURE_MESSAGE) };
            }
            Err(message) => {
                warn!("Error scraping game {link}: {message}");
                return GameResult::Failed { error_type: HARD_FAILURE_TYPE, message };
            }
        };

        if !self.options.force_rescrape {
            if let Some(id) = rows.values(GAMEID).next() {
                if table::exists(table_path, id) {
                    info!("Game {id} already in {}, skipping", table_path.display());
                    return GameResult::AlreadyPresent;
                }
            }
        }

        let written = match primary {
            Some(_) => append_duplicate(table_path, link, rows),
            None => table::append(table_path, &rows),
        };
        if !written {
            return GameResult::Failed {
                error_type: HARD_FAILURE_TYPE,
                message: format!("could not write rows to {}", table_path.display()),
            };
        }
        GameResult::Scraped
    }
}

/// Append rows of a game listed in several divisions, flagged as duplicates.
/// The flag is set on the rows before they are written; the follow-up rewrite
/// only matters for a table whose header predates the flag column.
fn append_duplicate(table_path: &Path, link: &str, mut rows: ResultsTable) -> bool {
    let ix = rows.ensure_column(DUPLICATE_ACROSS_DIVISIONS, schema::FALSE);
    for r in &mut rows.rows {
        if let Some(cell) = r.get_mut(ix) {
            *cell = s!(schema::TRUE);
        }
    }
    if !table::append(table_path, &rows) {
        return false;
    }
    if !table::set_duplicate_flag(table_path, link, true) {
        warn!("Could not rewrite {DUPLICATE_ACROSS_DIVISIONS} for {link} in {}", table_path.display());
    }
    true
}

/// Merge the downloaded snapshot with the freshly written table. On success
/// the merged file replaces the table and the snapshot is removed; on failure
/// the un-merged table stays as it is.
pub fn reconcile_snapshot(existing_path: &Path, table_path: &Path) -> bool {
    info!("Merging existing CSV with new data for {}", table_path.display());
    let merged_path = with_suffix(table_path, MERGED_SUFFIX);

    if !merge::merge(existing_path, table_path, &merged_path) {
        warn!("Failed to merge CSV files, keeping new CSV only");
        return false;
    }
    if let Err(e) = file::move_into_place(&merged_path, table_path) {
        warn!("Failed to replace {} with merged CSV: {e}", table_path.display());
        return false;
    }
    if let Err(e) = fs::remove_file(existing_path) {
        warn!("Failed to remove temporary existing CSV: {e}");
    }
    info!("Successfully merged CSV files for {}", table_path.display());
    true
}

/// Retry every pending game on `date`, slot by slot.
pub fn retry_failed(pass: &mut GamePass<'_>, date: NaiveDate) -> Vec<(Slot, PassSummary)> {
    let pending = ledger::load(pass.options.ledger_path(), Some(date));
    let count = pending.pending_count(date);
    if count == 0 {
        info!("No failed games found for {date}");
        return Vec::new();
    }
    info!("Found {count} failed game entries to retry");

    let mut out = Vec::new();
    for slot in pending.slots(date) {
        let links = ledger::query(&pending, date, slot.division, slot.gender);
        info!("Retrying {} failed games for {} {}", links.len(), slot.division, slot.gender);
        let summary = pass.run(&slot, &links, true);
        out.push((slot, summary));
    }
    out
}
