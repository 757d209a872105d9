use crate::tests::{Fixture, write_file};
use crate::{ErrorKind, Registry, Subject, SwapError};

use std::collections::HashSet;
use std::fs;

use googletest::assert_that;
use googletest::prelude::{anything, eq, none, some};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn given_no_file_when_load_then_absent_without_corruption() {
    let fixture = Fixture::new();

    let loaded = Registry::load(&fixture.layout.registry_file()).unwrap();

    assert_that!(loaded.registry, none());
    assert_that!(loaded.corruption_error, none());
}

#[test]
fn given_garbage_file_when_load_then_corruption_reported() {
    let fixture = Fixture::new();
    write_file(&fixture.layout.registry_file(), "{ not json");

    let loaded = Registry::load(&fixture.layout.registry_file()).unwrap();

    assert_that!(loaded.registry, none());
    assert_that!(loaded.corruption_error, some(anything()));
}

#[test]
fn given_corrupted_file_when_init_if_absent_then_moved_aside_and_empty() {
    let fixture = Fixture::new();
    let path = fixture.layout.registry_file();
    write_file(&path, "{ not json");

    let registry = Registry::init_if_absent(&path).unwrap();

    assert!(registry.is_empty());
    assert!(!path.exists());
    let backups: Vec<_> = fs::read_dir(&fixture.layout.backup_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("sequence.json.corrupted.")
        })
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "{ not json");
}

#[test]
fn given_empty_registry_when_next_account_number_then_one() {
    assert_that!(Registry::empty().next_account_number().unwrap(), eq(1));
}

#[test]
fn given_recorded_accounts_when_saved_and_loaded_then_same_registry() {
    let fixture = Fixture::new();
    let path = fixture.layout.registry_file();
    let mut registry = Registry::empty();
    let first = registry.record_account(Subject::new("sub-a"), "a@example.com".into(), Some("u-a".into())).unwrap();
    let second = registry.record_account(Subject::new("sub-b"), "unknown".into(), None).unwrap();

    registry.save(&path).unwrap();
    let loaded = Registry::load(&path).unwrap().registry.unwrap();

    assert_eq!((first, second), (1, 2));
    assert_eq!(loaded, registry);
    assert_eq!(loaded.sequence(), &[1, 2]);
    assert_that!(loaded.active_account_number(), some(eq(2)));
    assert!(loaded.last_updated().is_some());
}

#[test]
fn given_saved_registry_when_read_raw_then_camel_case_document() {
    let fixture = Fixture::new();
    let mut registry = Registry::empty();
    registry.record_account(Subject::new("sub-a"), "a@example.com".into(), Some("u-a".into())).unwrap();

    registry.save(&fixture.layout.registry_file()).unwrap();
    let raw = fixture.read_registry_json();

    assert_eq!(raw["activeAccountNumber"], json!(1));
    assert_eq!(raw["sequence"], json!([1]));
    assert_eq!(raw["accounts"]["1"]["sub"], json!("sub-a"));
    assert_eq!(raw["accounts"]["1"]["email"], json!("a@example.com"));
    assert_eq!(raw["accounts"]["1"]["uuid"], json!("u-a"));
    assert!(raw["accounts"]["1"]["added"].is_string());
    assert!(raw["lastUpdated"].is_string());
}

#[test]
fn given_legacy_record_without_sub_when_load_then_never_matched_by_identity() {
    let fixture = Fixture::new();
    fixture.write_registry_json(&json!({
        "activeAccountNumber": 1,
        "sequence": [1],
        "accounts": { "1": { "email": "old@example.com", "added": "2024-01-01T00:00:00Z" } },
        "lastUpdated": "2024-01-01T00:00:00Z"
    }));

    let registry = Registry::load(&fixture.layout.registry_file())
        .unwrap()
        .registry
        .unwrap();

    let record = registry.get(1).unwrap();
    assert!(record.is_legacy());
    assert_that!(record.sub(), none());
    assert_that!(registry.is_known_identity(&Subject::new("old@example.com")), none());
    assert_that!(registry.is_known_identity(&Subject::new("")), none());
}

#[test]
fn given_inconsistent_document_when_load_then_invariants_repaired() {
    let fixture = Fixture::new();
    fixture.write_registry_json(&json!({
        "activeAccountNumber": 9,
        "sequence": [3, 9, 1, 3],
        "accounts": {
            "1": { "email": "a@example.com", "sub": "a" },
            "2": { "email": "b@example.com", "sub": "b" },
            "3": { "email": "c@example.com", "sub": "c" },
            "oops": { "email": "x@example.com", "sub": "x" }
        }
    }));

    let registry = Registry::load(&fixture.layout.registry_file())
        .unwrap()
        .registry
        .unwrap();

    assert_eq!(registry.sequence(), &[3, 1, 2]);
    assert_that!(registry.active_account_number(), none());
    assert_that!(registry.len(), eq(3));
    assert_that!(registry.is_known_identity(&Subject::new("x")), none());
    assert_that!(registry.is_known_identity(&Subject::new("b")), some(eq(2)));
}

#[test]
fn given_high_water_mark_when_next_account_number_then_never_reuses() {
    let fixture = Fixture::new();
    fixture.write_registry_json(&json!({
        "sequence": [1],
        "accounts": { "1": { "email": "a@example.com", "sub": "a" } },
        "highestAssigned": 7
    }));

    let registry = Registry::load(&fixture.layout.registry_file())
        .unwrap()
        .registry
        .unwrap();

    assert_that!(registry.next_account_number().unwrap(), eq(8));
}

#[test]
fn given_largest_account_key_when_next_account_number_then_exhausted() {
    let fixture = Fixture::new();
    fixture.write_registry_json(&json!({
        "sequence": [4_294_967_295_u32],
        "accounts": { "4294967295": { "email": "a@example.com", "sub": "a" } }
    }));
    let mut registry = Registry::load(&fixture.layout.registry_file())
        .unwrap()
        .registry
        .unwrap();

    let error = registry.next_account_number().unwrap_err();
    let recorded = registry.record_account(Subject::new("b"), "unknown".into(), None);

    assert!(matches!(error, SwapError::AccountNumbersExhausted { .. }));
    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert!(recorded.is_err());
    assert_that!(registry.len(), eq(1));
}

#[test]
fn given_reserved_numbers_when_next_account_number_then_skips_past_them() {
    let mut registry = Registry::empty();

    registry.reserve_through(5);
    registry.reserve_through(2);

    assert_that!(registry.next_account_number().unwrap(), eq(6));
}

#[test]
fn given_corrupted_file_moved_aside_when_corrupted_backups_then_listed() {
    let fixture = Fixture::new();
    let path = fixture.layout.registry_file();
    write_file(&path, "{ broken");
    write_file(&fixture.layout.lock_file(), "{}");
    assert!(Registry::corrupted_backups(&path).is_empty());

    Registry::init_if_absent(&path).unwrap();
    let backups = Registry::corrupted_backups(&path);

    assert_that!(backups.len(), eq(1));
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "{ broken");
}

#[test]
fn given_unknown_account_when_set_active_then_not_found() {
    let mut registry = Registry::empty();

    let error = registry.set_active(5).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_that!(registry.active_account_number(), none());
}

proptest! {
    #[test]
    fn next_account_number_never_returns_an_existing_number(
        subs in proptest::collection::vec("[a-z]{1,12}", 1..20),
        removed in proptest::collection::vec(any::<prop::sample::Index>(), 0..5),
    ) {
        let fixture = Fixture::new();
        let path = fixture.layout.registry_file();
        let mut registry = Registry::empty();
        let mut seen = HashSet::new();

        for sub in &subs {
            let next = registry.next_account_number().unwrap();
            prop_assert!(!registry.contains(next));

            let assigned = registry.record_account(Subject::new(sub.clone()), "unknown".into(), None).unwrap();
            prop_assert_eq!(assigned, next);
            prop_assert!(seen.insert(assigned));
        }

        // Drop some records by hand, as a manual edit would.
        registry.save(&path).unwrap();
        let mut raw = fixture.read_registry_json();
        for index in &removed {
            let victim = index.index(subs.len()) + 1;
            raw["accounts"].as_object_mut().unwrap().remove(&victim.to_string());
        }
        fixture.write_registry_json(&raw);

        let reloaded = Registry::load(&path).unwrap().registry.unwrap();
        prop_assert!(!seen.contains(&reloaded.next_account_number().unwrap()));
    }
}
