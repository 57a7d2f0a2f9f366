// src/config/options.rs
use std::path::{Path, PathBuf};

use super::consts::*;
use crate::model::Slot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Root of the results-table tree.
    pub out_dir: PathBuf,
    /// Failed-game ledger file.
    pub failed_games_file: PathBuf,
    /// Append logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Append scraped rows even when their GAMEID is already in the table.
    pub force_rescrape: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            failed_games_file: PathBuf::from(DEFAULT_FAILED_GAMES_FILE),
            log_file: None,
            force_rescrape: false,
        }
    }
}

impl Options {
    pub fn table_path(&self, slot: &Slot) -> PathBuf {
        crate::file::table_path(&self.out_dir, slot)
    }

    pub fn ledger_path(&self) -> &Path {
        &self.failed_games_file
    }
}
