// src/schema.rs
//! Results-table schema.
//!
//! Every table operation consults these names; nothing else in the crate spells
//! a column name out.

/// Identity column: unique game id, the merge dedup key.
pub const GAMEID: &str = "GAMEID";
pub const TEAM: &str = "TEAM";
pub const OPP: &str = "OPP";
/// Natural key: the game's link. Identity fallback when `GAMEID` is missing.
pub const GAMELINK: &str = "GAMELINK";
/// Optional cross-division duplicate flag.
pub const DUPLICATE_ACROSS_DIVISIONS: &str = "DUPLICATE_ACROSS_DIVISIONS";

pub const REQUIRED_COLUMNS: [&str; 4] = [GAMEID, TEAM, OPP, GAMELINK];

/// Dedup keys in order of preference.
pub const MERGE_KEYS: [&str; 2] = [GAMEID, GAMELINK];

// Existing tables were written by pandas, hence the capitalised literals.
pub const TRUE: &str = "True";
pub const FALSE: &str = "False";

pub fn encode_bool(v: bool) -> &'static str {
    if v { TRUE } else { FALSE }
}

pub fn decode_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" | "" => Some(false),
        _ => None,
    }
}
