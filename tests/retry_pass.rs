// tests/retry_pass.rs
//
// Game passes and retry passes driven by scripted scraper/snapshot fakes.
//
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use ncaa_store::config::options::Options;
use ncaa_store::ledger;
use ncaa_store::model::{Division, Gender, Slot};
use ncaa_store::progress::Progress;
use ncaa_store::retry::{retry_failed, GamePass, GameScraper, SnapshotSource};
use ncaa_store::row;
use ncaa_store::table::{self, ResultsTable};

/// Link → scripted outcome. Unknown links fail softly.
#[derive(Default)]
struct Scripted {
    games: HashMap<String, Result<Option<ResultsTable>, String>>,
    calls: Vec<String>,
    recycled: usize,
}

impl Scripted {
    fn ok(mut self, link: &str, id: &str) -> Self {
        let t = ResultsTable::new(
            row!["GAMEID", "TEAM", "OPP", "GAMELINK"],
            vec![row![id, "Home", "Away", link], row![id, "Away", "Home", link]],
        );
        self.games.insert(s(link), Ok(Some(t)));
        self
    }
    fn err(mut self, link: &str, msg: &str) -> Self {
        self.games.insert(s(link), Err(s(msg)));
        self
    }
}

impl GameScraper for Scripted {
    fn scrape_game(&mut self, game_link: &str, _slot: &Slot) -> Result<Option<ResultsTable>, String> {
        self.calls.push(s(game_link));
        self.games.get(game_link).cloned().unwrap_or(Ok(None))
    }
    fn recycle(&mut self) {
        self.recycled += 1;
    }
}

/// Serves a fixed CSV text as the remote snapshot.
struct Remote(Option<&'static str>);

impl SnapshotSource for Remote {
    fn fetch(&mut self, _slot: &Slot, dest: &Path) -> bool {
        match self.0 {
            Some(text) => {
                fs::create_dir_all(dest.parent().unwrap()).unwrap();
                fs::write(dest, text).unwrap();
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct Tally {
    begun: usize,
    done: Vec<String>,
    failed: Vec<String>,
    finished: bool,
}

impl Progress for Tally {
    fn begin(&mut self, total: usize) { self.begun = total; }
    fn item_done(&mut self, game: &str) { self.done.push(s(game)); }
    fn item_failed(&mut self, game: &str, _reason: &str) { self.failed.push(s(game)); }
    fn finish(&mut self) { self.finished = true; }
}

fn s(v: &str) -> String { v.to_string() }

fn options(dir: &tempfile::TempDir) -> Options {
    Options {
        out_dir: dir.path().join("out"),
        failed_games_file: dir.path().join("failed_games.json"),
        ..Options::default()
    }
}

fn slot(division: Division) -> Slot {
    Slot::new(NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(), division, Gender::Men)
}

#[test]
fn first_pass_appends_successes_and_records_failures() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let mut scraper = Scripted::default().ok("l1", "1").err("l3", "driver crashed");
    let mut tally = Tally::default();
    let links = vec![s("l1"), s("l2"), s("l3")];

    let summary = GamePass::new(&opts, &mut scraper)
        .with_progress(&mut tally)
        .run(&slot(Division::D1), &links, false);

    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.failed, 2);
    assert!(!summary.merged);
    assert_eq!(tally.begun, 3);
    assert_eq!(tally.done, vec!["l1"]);
    assert_eq!(tally.failed, vec!["l2", "l3"]);
    assert!(tally.finished);

    let path = opts.table_path(&slot(Division::D1));
    assert_eq!(table::read(&path).unwrap().len(), 2);

    let l = ledger::load(&opts.failed_games_file, None);
    let d = slot(Division::D1).date;
    assert_eq!(ledger::query(&l, d, Division::D1, Gender::Men), vec!["l2", "l3"]);
    assert_eq!(l.records(d, "l2")[0].error_type, "timeout");
    assert_eq!(l.records(d, "l2")[0].error_message, "Game failed to scrape");
    assert_eq!(l.records(d, "l3")[0].error_type, "exception");
    assert_eq!(l.records(d, "l3")[0].error_message, "driver crashed");
    assert_eq!(l.records(d, "l3")[0].retry_count, 0);
}

#[test]
fn already_present_games_are_not_appended_twice() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let mut scraper = Scripted::default().ok("l1", "1");
    let links = vec![s("l1")];

    GamePass::new(&opts, &mut scraper).run(&slot(Division::D1), &links, false);
    let again = GamePass::new(&opts, &mut scraper).run(&slot(Division::D1), &links, false);
    assert_eq!(again.already_present, 1);
    assert_eq!(table::read(&opts.table_path(&slot(Division::D1))).unwrap().len(), 2);

    let forced = Options { force_rescrape: true, ..opts.clone() };
    let third = GamePass::new(&forced, &mut scraper).run(&slot(Division::D1), &links, false);
    assert_eq!(third.scraped, 1);
    assert_eq!(table::read(&opts.table_path(&slot(Division::D1))).unwrap().len(), 4);
}

#[test]
fn retry_pass_clears_successes_counts_failures_and_merges_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let d = slot(Division::D2);

    ledger::save(&opts.failed_games_file, "l1", d.date, d.division, d.gender, "timeout", "");
    ledger::save(&opts.failed_games_file, "l2", d.date, d.division, d.gender, "timeout", "");

    let mut scraper = Scripted::default().ok("l1", "1");
    let mut remote = Remote(Some("GAMEID,TEAM,OPP,GAMELINK\n0,Old,Team,l0\n1,Stale,Row,l1\n"));
    let mut pass = GamePass::new(&opts, &mut scraper).with_snapshots(&mut remote);

    let results = retry_failed(&mut pass, d.date);
    assert_eq!(results.len(), 1);
    let (got_slot, summary) = &results[0];
    assert_eq!(*got_slot, d);
    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.merged);

    let l = ledger::load(&opts.failed_games_file, None);
    assert_eq!(ledger::query(&l, d.date, d.division, d.gender), vec!["l2"]);
    assert_eq!(l.records(d.date, "l2")[0].retry_count, 1);

    // Snapshot rows first; scraped GAMEID 1 was already in the snapshot
    let path = opts.table_path(&d);
    let t = table::read(&path).unwrap();
    let ids: Vec<&str> = t.values("GAMEID").collect();
    assert_eq!(ids, vec!["0", "1"]);
    assert_eq!(t.rows[1][1], "Stale");
    assert!(!path.with_file_name(format!("{}.existing", path.file_name().unwrap().to_string_lossy())).exists());
}

#[test]
fn retry_with_nothing_pending_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let mut scraper = Scripted::default();

    let mut pass = GamePass::new(&opts, &mut scraper);
    assert!(retry_failed(&mut pass, slot(Division::D1).date).is_empty());
    assert!(scraper.calls.is_empty());
    assert!(!opts.failed_games_file.exists());
}

#[test]
fn duplicate_game_is_copied_from_primary_division() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);

    // Primary (d1) table already holds the game
    let mut d1_scraper = Scripted::default().ok("shared", "42");
    GamePass::new(&opts, &mut d1_scraper).run(&slot(Division::D1), &[s("shared")], false);

    let mut d2_scraper = Scripted::default();
    let primary = HashMap::from([(s("shared"), Division::D1)]);
    let summary = GamePass::new(&opts, &mut d2_scraper)
        .with_primary_divisions(primary)
        .run(&slot(Division::D2), &[s("shared")], false);

    assert_eq!(summary.copied, 1);
    assert!(d2_scraper.calls.is_empty());

    let t = table::read(&opts.table_path(&slot(Division::D2))).unwrap();
    assert_eq!(t.len(), 2);
    let flag = t.column("DUPLICATE_ACROSS_DIVISIONS").unwrap();
    assert!(t.rows.iter().all(|r| r[flag] == "True"));
}

#[test]
fn duplicate_without_primary_table_is_scraped_and_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let mut scraper = Scripted::default().ok("shared", "42");
    let primary = HashMap::from([(s("shared"), Division::D1)]);

    let summary = GamePass::new(&opts, &mut scraper)
        .with_primary_divisions(primary)
        .run(&slot(Division::D3), &[s("shared")], false);

    assert_eq!(summary.scraped, 1);
    let t = table::read(&opts.table_path(&slot(Division::D3))).unwrap();
    let flag = t.column("DUPLICATE_ACROSS_DIVISIONS").unwrap();
    assert!(t.rows.iter().all(|r| r[flag] == "True"));
}

#[test]
fn scraper_is_recycled_every_twenty_games() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let mut scraper = Scripted::default();
    let links: Vec<String> = (0..45).map(|i| format!("l{i}")).collect();

    GamePass::new(&opts, &mut scraper).run(&slot(Division::D1), &links, false);
    assert_eq!(scraper.recycled, 2);
    assert_eq!(scraper.calls.len(), 45);
}

#[test]
fn copied_rows_carry_the_flag_even_when_the_rewrite_fails() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);

    let mut d1_scraper = Scripted::default().ok("shared", "42");
    GamePass::new(&opts, &mut d1_scraper).run(&slot(Division::D1), &[s("shared")], false);

    // A directory where the whole-file rewrite wants its temp file
    let d2_path = opts.table_path(&slot(Division::D2));
    let tmp = d2_path.with_file_name(format!("{}.tmp", d2_path.file_name().unwrap().to_string_lossy()));
    fs::create_dir_all(&tmp).unwrap();

    let mut d2_scraper = Scripted::default();
    let primary = HashMap::from([(s("shared"), Division::D1)]);
    let summary = GamePass::new(&opts, &mut d2_scraper)
        .with_primary_divisions(primary)
        .run(&slot(Division::D2), &[s("shared")], false);

    assert_eq!(summary.copied, 1);
    let t = table::read(&d2_path).unwrap();
    let flag = t.column("DUPLICATE_ACROSS_DIVISIONS").unwrap();
    assert_eq!(t.len(), 2);
    assert!(t.rows.iter().all(|r| r[flag] == "True"));
}

#[test]
fn duplicate_into_older_table_gains_the_flag_column() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(&dir);
    let d3_path = opts.table_path(&slot(Division::D3));
    fs::create_dir_all(d3_path.parent().unwrap()).unwrap();
    fs::write(&d3_path, "GAMEID,TEAM,OPP,GAMELINK\n7,X,Y,other\n").unwrap();

    let mut scraper = Scripted::default().ok("shared", "42");
    let primary = HashMap::from([(s("shared"), Division::D1)]);
    GamePass::new(&opts, &mut scraper)
        .with_primary_divisions(primary)
        .run(&slot(Division::D3), &[s("shared")], false);

    let t = table::read(&d3_path).unwrap();
    let flag = t.column("DUPLICATE_ACROSS_DIVISIONS").unwrap();
    let flags: Vec<&str> = t.rows.iter().map(|r| r[flag].as_str()).collect();
    assert_eq!(flags, vec!["False", "True", "True"]);
}
