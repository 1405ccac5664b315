use std::fs;

use proptest::prelude::*;
use wfs_core::{RunId, WfsError};
use wfs_exp::RunLedger;

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = RunLedger::open(dir.path().join("run_ids.json"));
    assert!(ledger.read_all().unwrap().is_empty());
}

#[test]
fn corrupt_file_is_reported_then_quarantined() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_ids.json");
    fs::write(&path, "not json").unwrap();
    fs::write(dir.path().join("run_ids.json.corrupt"), "older").unwrap();
    let ledger = RunLedger::open(&path);

    let err = ledger.read_all().unwrap_err();
    assert!(matches!(err, WfsError::CorruptLedger(_)));

    let receipt = ledger.append(&RunId::Numeric(4)).unwrap();
    assert_eq!(receipt.position, 0);
    let moved = receipt.quarantined.unwrap();
    assert!(moved.ends_with("run_ids.json.corrupt.1"));
    assert_eq!(fs::read_to_string(moved).unwrap(), "not json");
    assert_eq!(ledger.read_all().unwrap(), vec![RunId::Numeric(4)]);
}

#[test]
fn named_ids_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = RunLedger::open(dir.path().join("nested").join("run_ids.json"));
    ledger.append(&RunId::from(17)).unwrap();
    ledger.append(&RunId::from("pl-abc")).unwrap();
    let reopened = RunLedger::open(ledger.path());
    assert_eq!(
        reopened.read_all().unwrap(),
        vec![RunId::Numeric(17), RunId::Named("pl-abc".to_string())]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn appends_preserve_order(ids in prop::collection::vec(any::<u64>(), 0..12)) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = RunLedger::open(dir.path().join("run_ids.json"));
        for (position, id) in ids.iter().enumerate() {
            let receipt = ledger.append(&RunId::Numeric(*id)).unwrap();
            prop_assert_eq!(receipt.position, position);
        }
        let expected: Vec<RunId> = ids.into_iter().map(RunId::Numeric).collect();
        prop_assert_eq!(ledger.read_all().unwrap(), expected);
    }
}
