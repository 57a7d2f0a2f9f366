// tests/merge_files.rs
//
// merge(existing, new, output) over files, including the retry-pass shapes
// (output over one of its inputs, re-running a merge).
//
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ncaa_store::merge;
use ncaa_store::table;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, text).unwrap();
    p
}

fn row_set(p: &Path) -> BTreeSet<Vec<String>> {
    table::read(p).unwrap().rows.into_iter().collect()
}

#[test]
fn existing_row_wins_for_shared_game_id() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "GAMEID,TEAM,OPP,GAMELINK\nA,t1,o1,la\nB,t2,o2,lb-old\n");
    let b = write(dir.path(), "b.csv", "GAMEID,TEAM,OPP,GAMELINK\nB,t2,o2,lb-new\nC,t3,o3,lc\n");
    let out = dir.path().join("out.csv");

    assert!(merge::merge(&a, &b, &out));

    let t = table::read(&out).unwrap();
    let ids: Vec<&str> = t.values("GAMEID").collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert_eq!(t.rows[1][3], "lb-old");
}

#[test]
fn merge_is_idempotent_on_its_output() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "GAMEID,TEAM,OPP,GAMELINK\n1,x,y,l1\n2,x,y,l2\n");
    let b = write(dir.path(), "b.csv", "GAMEID,TEAM,OPP,GAMELINK\n2,x,y,l2\n3,x,y,l3\n");
    let c = dir.path().join("c.csv");

    assert!(merge::merge(&a, &b, &c));
    let first = row_set(&c);

    // Output path is also the "new" input here
    assert!(merge::merge(&a, &c, &c));
    assert_eq!(row_set(&c), first);
    assert_eq!(table::read(&c).unwrap().len(), 3);
}

#[test]
fn missing_existing_copies_new() {
    let dir = tempfile::tempdir().unwrap();
    let b = write(dir.path(), "b.csv", "GAMEID,TEAM\n1,x\n");
    let out = dir.path().join("out.csv");

    assert!(merge::merge(&dir.path().join("nope.csv"), &b, &out));
    assert_eq!(table::read(&out).unwrap(), table::read(&b).unwrap());

    // Neither side present
    let out2 = dir.path().join("out2.csv");
    assert!(!merge::merge(&dir.path().join("nope.csv"), &dir.path().join("nope2.csv"), &out2));
    assert!(!out2.exists());
}

#[test]
fn empty_or_missing_new_keeps_existing() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "GAMEID,TEAM\n1,x\n2,y\n");
    let header_only = write(dir.path(), "b.csv", "GAMEID,TEAM\n");

    let out = dir.path().join("out.csv");
    assert!(merge::merge(&a, &header_only, &out));
    assert_eq!(table::read(&out).unwrap(), table::read(&a).unwrap());

    let out2 = dir.path().join("out2.csv");
    assert!(merge::merge(&a, &dir.path().join("nope.csv"), &out2));
    assert_eq!(table::read(&out2).unwrap().len(), 2);
}

#[test]
fn link_fallback_and_union_of_columns() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "TEAM,GAMELINK\nx,l1\n");
    let b = write(dir.path(), "b.csv", "GAMEID,TEAM,GAMELINK,DUPLICATE_ACROSS_DIVISIONS\n9,x,l1,False\n10,y,l2,True\n");
    let out = dir.path().join("out.csv");

    assert!(merge::merge(&a, &b, &out));
    let t = table::read(&out).unwrap();
    assert_eq!(t.headers, vec!["TEAM", "GAMELINK", "GAMEID", "DUPLICATE_ACROSS_DIVISIONS"]);
    assert_eq!(t.rows.len(), 2);
    assert_eq!(t.rows[0], vec!["x", "l1", "", ""]);
    assert_eq!(t.rows[1], vec!["y", "l2", "10", "True"]);
}

#[test]
fn no_key_at_all_appends_everything() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "TEAM,OPP\nx,y\n");
    let b = write(dir.path(), "b.csv", "TEAM,OPP\nx,y\n");
    let out = dir.path().join("out.csv");

    assert!(merge::merge(&a, &b, &out));
    assert_eq!(table::read(&out).unwrap().len(), 2);
}

#[test]
fn unwritable_output_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "GAMEID\n1\n");
    let b = write(dir.path(), "b.csv", "GAMEID\n2\n");
    // A plain file where the output's parent directory should be
    let blocker = write(dir.path(), "blocker", "x");

    assert!(!merge::merge(&a, &b, &blocker.join("out.csv")));
}
