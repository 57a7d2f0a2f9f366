// src/ledger.rs
//! # Failed-game ledger
//!
//! A JSON file of games that failed to scrape, waiting for a retry pass:
//!
//! ```text
//! { "<YYYY-MM-DD>": { "<game link>": [ { "division": "d1", "gender": "men",
//!                                        "error_type": "timeout",
//!                                        "error_message": "",
//!                                        "retry_count": 0 }, … ] } }
//! ```
//!
//! ## Invariants
//! - At most one record per (date, game, division, gender). Saving the same key
//!   again overwrites the error fields and keeps `retry_count`.
//! - A successful retry deletes the record, then the game if it has no records
//!   left, then the date if it has no games left.
//! - Dates and games keep insertion order, so queries come back in the order
//!   failures were first seen.
//!
//! ## Failure policy
//! A missing or unparsable file reads as an empty ledger. A single record
//! that does not parse (unknown division, wrong field types) is kept as raw
//! JSON and written back unchanged; it is never pending. Every mutation loads,
//! changes the document in memory, and rewrites the whole file once at the end;
//! a failed read never touches the file. There is no locking: callers must not
//! run two writers against the same file.

use std::path::Path;
use std::fs;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::model::{date_key, Division, Gender, Slot};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub division: Division,
    pub gender: Gender,
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub retry_count: u32,
}

impl FailureRecord {
    fn matches(&self, division: Division, gender: Gender) -> bool {
        self.division == division && self.gender == gender
    }
}

/// One element of a game's record list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerEntry {
    Record(FailureRecord),
    Unrecognised(serde_json::Value),
}

impl LedgerEntry {
    pub fn as_record(&self) -> Option<&FailureRecord> {
        match self {
            LedgerEntry::Record(r) => Some(r),
            LedgerEntry::Unrecognised(_) => None,
        }
    }

    fn as_record_mut(&mut self) -> Option<&mut FailureRecord> {
        match self {
            LedgerEntry::Record(r) => Some(r),
            LedgerEntry::Unrecognised(_) => None,
        }
    }

    fn is_for(&self, division: Division, gender: Gender) -> bool {
        self.as_record().is_some_and(|r| r.matches(division, gender))
    }
}

pub type GameBucket = IndexMap<String, Vec<LedgerEntry>>;

/// What a retry report did to the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Record removed (and any emptied game/date bucket with it).
    Cleared,
    /// Record kept; its retry count is now this value.
    Counted(u32),
    /// No record for that key.
    NotFound,
}

/// The whole ledger document: date → game → records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    dates: IndexMap<String, GameBucket>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.dates.is_empty() }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.dates.keys().map(|k| k.as_str())
    }

    pub fn games(&self, date: NaiveDate) -> Option<&GameBucket> {
        self.dates.get(&date_key(date))
    }

    /// Parsed records for a game; unrecognised entries are skipped.
    pub fn records(&self, date: NaiveDate, game: &str) -> Vec<&FailureRecord> {
        self.games(date)
            .and_then(|g| g.get(game))
            .map(|v| v.iter().filter_map(LedgerEntry::as_record).collect())
            .unwrap_or_default()
    }

    pub fn record(&self, game: &str, slot: &Slot) -> Option<&FailureRecord> {
        self.records(slot.date, game).into_iter().find(|r| r.matches(slot.division, slot.gender))
    }

    /// Entries kept as raw JSON because they did not parse as records.
    pub fn unrecognised_count(&self) -> usize {
        self.dates.values()
            .flat_map(|g| g.values())
            .flatten()
            .filter(|e| e.as_record().is_none())
            .count()
    }

    /// Record a failure. Returns `true` when a new record was added, `false`
    /// when an existing one was overwritten.
    pub fn record_failure(&mut self, game: &str, slot: &Slot, error_type: &str, error_message: &str) -> bool {
        let records = self.dates
            .entry(date_key(slot.date))
            .or_default()
            .entry(s!(game))
            .or_default();

        if let Some(existing) = records
            .iter_mut()
            .filter_map(LedgerEntry::as_record_mut)
            .find(|r| r.matches(slot.division, slot.gender))
        {
            existing.error_type = s!(error_type);
            existing.error_message = s!(error_message);
            return false;
        }

        records.push(LedgerEntry::Record(FailureRecord {
            division: slot.division,
            gender: slot.gender,
            error_type: s!(error_type),
            error_message: s!(error_message),
            retry_count: 0,
        }));
        true
    }

    /// Games with a pending record for this slot, in insertion order, each once.
    pub fn pending(&self, slot: &Slot) -> Vec<String> {
        let Some(games) = self.games(slot.date) else { return Vec::new() };
        games.iter()
            .filter(|(_, entries)| entries.iter().any(|e| e.is_for(slot.division, slot.gender)))
            .map(|(game, _)| game.clone())
            .collect()
    }

    /// Apply a retry result for one key.
    pub fn record_retry(&mut self, game: &str, slot: &Slot, success: bool) -> RetryOutcome {
        let key = date_key(slot.date);
        let Some(games) = self.dates.get_mut(&key) else { return RetryOutcome::NotFound };
        let Some(records) = games.get_mut(game) else { return RetryOutcome::NotFound };
        let Some(ix) = records.iter().position(|e| e.is_for(slot.division, slot.gender)) else {
            return RetryOutcome::NotFound;
        };

        if !success {
            let Some(rec) = records[ix].as_record_mut() else { return RetryOutcome::NotFound };
            rec.retry_count = rec.retry_count.saturating_add(1);
            return RetryOutcome::Counted(rec.retry_count);
        }

        records.remove(ix);
        if records.is_empty() {
            games.shift_remove(game);
        }
        if games.is_empty() {
            self.dates.shift_remove(&key);
        }
        RetryOutcome::Cleared
    }

    /// A ledger holding only `date`'s bucket (empty bucket if absent).
    pub fn only_date(&self, date: NaiveDate) -> Ledger {
        let key = date_key(date);
        let bucket = self.dates.get(&key).cloned().unwrap_or_default();
        let mut dates = IndexMap::new();
        dates.insert(key, bucket);
        Ledger { dates }
    }

    /// Number of records (not games) pending for a date.
    pub fn pending_count(&self, date: NaiveDate) -> usize {
        self.games(date)
            .map(|g| g.values().flatten().filter(|e| e.as_record().is_some()).count())
            .unwrap_or(0)
    }

    /// Slots with at least one pending game on `date`, d1..d3 × men..women.
    pub fn slots(&self, date: NaiveDate) -> Vec<Slot> {
        Slot::all_for(date).into_iter().filter(|s| !self.pending(s).is_empty()).collect()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty JSON, two-space indent.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/* ---------------- File operations ---------------- */

fn read_file(path: &Path) -> Result<Ledger> {
    let text = fs::read_to_string(path)?;
    Ledger::from_json(&text)
}

fn write_file(path: &Path, ledger: &Ledger) -> Result<()> {
    let json = ledger.to_json()?;
    crate::file::replace_file(path, json.as_bytes())
}

/// Record a failure in the ledger file, creating file and parent directories
/// as needed. A corrupt file is replaced. Returns `false` if the write failed.
pub fn save(
    path: &Path,
    game: &str,
    date: NaiveDate,
    division: Division,
    gender: Gender,
    error_type: &str,
    error_message: &str,
) -> bool {
    let mut ledger = if path.exists() {
        read_file(path).unwrap_or_else(|e| {
            warn!("Error loading failed games file {}: {e}, creating new one", path.display());
            Ledger::new()
        })
    } else {
        Ledger::new()
    };

    let slot = Slot::new(date, division, gender);
    ledger.record_failure(game, &slot, error_type, error_message);

    match write_file(path, &ledger) {
        Ok(()) => {
            debug!("Saved failed game: {game} ({division} {gender})");
            true
        }
        Err(e) => {
            error!("Error writing failed games file {}: {e}", path.display());
            false
        }
    }
}

/// The whole ledger, or just `target_date`'s bucket. Never fails: missing or
/// unreadable files give an empty ledger.
pub fn load(path: &Path, target_date: Option<NaiveDate>) -> Ledger {
    if !path.exists() {
        info!("No failed games file found at {}", path.display());
        return Ledger::new();
    }

    match read_file(path) {
        Ok(ledger) => {
            let skipped = ledger.unrecognised_count();
            if skipped > 0 {
                warn!("{skipped} unrecognised entries in {}, leaving them untouched", path.display());
            }
            match target_date {
                Some(d) => ledger.only_date(d),
                None => ledger,
            }
        }
        Err(e) => {
            error!("Error loading failed games file {}: {e}", path.display());
            Ledger::new()
        }
    }
}

/// Game links pending a retry for (date, division, gender).
pub fn query(ledger: &Ledger, target_date: NaiveDate, division: Division, gender: Gender) -> Vec<String> {
    ledger.pending(&Slot::new(target_date, division, gender))
}

/// Report a retry result. A success removes the record, a failure bumps its
/// retry count. No-op (returning `false`) when the file does not exist or the
/// key is not in it; read and write errors are logged and leave the file as
/// it was.
pub fn mark_retried(
    path: &Path,
    game: &str,
    target_date: NaiveDate,
    division: Division,
    gender: Gender,
    success: bool,
) -> bool {
    if !path.exists() {
        return false;
    }

    let result = (|| -> Result<RetryOutcome> {
        let mut ledger = read_file(path)?;
        let outcome = ledger.record_retry(game, &Slot::new(target_date, division, gender), success);
        if outcome != RetryOutcome::NotFound {
            write_file(path, &ledger)?;
        }
        Ok(outcome)
    })();

    match result {
        Ok(RetryOutcome::Cleared) => {
            debug!("Cleared failed game after retry: {game} ({division} {gender})");
            true
        }
        Ok(RetryOutcome::Counted(n)) => {
            debug!("Retry failed for {game} ({division} {gender}), retry_count={n}");
            true
        }
        Ok(RetryOutcome::NotFound) => false,
        Err(e) => {
            error!("Error updating failed games file {}: {e}", path.display());
            false
        }
    }
}
