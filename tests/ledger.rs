use std::fs;

use fbref_possession::ledger::Ledger;
use fbref_possession::match_page::MatchRecord;

fn record(mid: &str, tie: bool, w: u8, l: u8) -> MatchRecord {
    MatchRecord {
        match_id: mid.to_string(),
        is_tie: tie,
        winner_possession_pct: w,
        loser_possession_pct: l,
    }
}

#[test]
fn open_creates_header_in_nested_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("soccer_train.csv");
    let ledger = Ledger::open(&path).expect("open");

    assert_eq!(fs::read_to_string(&path).unwrap(), "mid,tie,w_poss,l_poss\n");
    assert!(ledger.failed_path().exists());
    assert!(ledger.load_completed().unwrap().is_empty());
}

#[test]
fn appended_rows_are_loaded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    let ledger = Ledger::open(&path).unwrap();

    ledger.append(&record("b-match", false, 61, 39)).unwrap();
    ledger.append(&record("a-match", true, 50, 50)).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "mid,tie,w_poss,l_poss\nb-match,false,61,39\na-match,true,50,50\n"
    );
    let records = ledger.load_records().unwrap();
    assert_eq!(records, vec![record("b-match", false, 61, 39), record("a-match", true, 50, 50)]);

    let completed = ledger.load_completed().unwrap();
    assert!(completed.contains("a-match"));
    assert!(completed.contains("b-match"));
}

#[test]
fn reopening_keeps_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    Ledger::open(&path).unwrap().append(&record("m1", false, 55, 45)).unwrap();

    let reopened = Ledger::open(&path).unwrap();
    assert_eq!(reopened.load_records().unwrap().len(), 1);
}

#[test]
fn failed_attempts_count_as_completed_but_not_as_records() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(dir.path().join("ledger.csv")).unwrap();

    ledger.mark_failed("broken", "possession").unwrap();

    assert!(ledger.load_records().unwrap().is_empty());
    assert!(ledger.load_completed().unwrap().contains("broken"));
    assert!(ledger.load_failed().unwrap().contains("broken"));
}

#[test]
fn reset_truncates_both_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    let ledger = Ledger::open(&path).unwrap();
    ledger.append(&record("m1", false, 55, 45)).unwrap();
    ledger.mark_failed("m2", "score").unwrap();

    ledger.reset().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "mid,tie,w_poss,l_poss\n");
    assert!(ledger.load_completed().unwrap().is_empty());
}

#[test]
fn partial_final_row_is_dropped_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    fs::write(&path, "mid,tie,w_poss,l_poss\nm1,false,55,45\nm2,tr").unwrap();

    let ledger = Ledger::open(&path).unwrap();
    ledger.append(&record("m3", true, 50, 50)).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "mid,tie,w_poss,l_poss\nm1,false,55,45\nm3,true,50,50\n"
    );
    let completed = ledger.load_completed().unwrap();
    assert!(completed.contains("m1"));
    assert!(!completed.contains("m2"));
    assert!(completed.contains("m3"));
}

#[test]
fn row_cut_inside_last_value_is_not_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    // Interrupted while writing "m1,false,61,39\n".
    fs::write(&path, "mid,tie,w_poss,l_poss\nm1,false,61,3").unwrap();

    let ledger = Ledger::open(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "mid,tie,w_poss,l_poss\n");
    assert!(ledger.load_completed().unwrap().is_empty());
    assert!(ledger.load_records().unwrap().is_empty());
}

#[test]
fn row_cut_after_last_comma_is_not_completed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    fs::write(&path, "mid,tie,w_poss,l_poss\nm0,true,50,50\nm1,false,61,").unwrap();

    let ledger = Ledger::open(&path).unwrap();

    let completed = ledger.load_completed().unwrap();
    assert!(completed.contains("m0"));
    assert!(!completed.contains("m1"));
}

#[test]
fn partial_header_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    fs::write(&path, "mid,ti").unwrap();

    Ledger::open(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "mid,tie,w_poss,l_poss\n");
}

#[test]
fn partial_failed_row_is_dropped_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    let ledger = Ledger::open(&path).unwrap();
    ledger.mark_failed("m1", "score").unwrap();
    let mut failed = fs::read_to_string(ledger.failed_path()).unwrap();
    failed.push_str("m2,possess");
    fs::write(ledger.failed_path(), failed).unwrap();

    let reopened = Ledger::open(&path).unwrap();

    let failed = reopened.load_failed().unwrap();
    assert!(failed.contains("m1"));
    assert!(!failed.contains("m2"));
}

#[test]
fn spaced_header_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    fs::write(&path, "mid, tie, w_poss, l_poss\nm1, True, 60, 40\n").unwrap();

    let ledger = Ledger::open(&path).unwrap();
    assert!(ledger.load_completed().unwrap().contains("m1"));
    assert_eq!(ledger.load_records().unwrap(), vec![record("m1", true, 60, 40)]);
}

#[test]
fn header_without_mid_column_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    fs::write(&path, "id,tie,w_poss,l_poss\nm1,false,55,45\n").unwrap();

    let ledger = Ledger::open(&path).unwrap();
    assert!(ledger.load_completed().is_err());
}
