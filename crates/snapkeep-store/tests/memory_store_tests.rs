#![allow(clippy::unwrap_used, clippy::expect_used)]

use snapkeep_store::{MemoryStore, SnapshotStore, StoreCall, StoreOp};

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_snapshot("tank/data@p_2024-01-01_00-00").unwrap();
    store.insert_snapshot("tank/data@p_2024-01-02_00-00").unwrap();
    store
}

#[test]
fn test_full_transfer_creates_target() {
    let store = seeded();

    store
        .transfer("tank/data@p_2024-01-01_00-00", "backup/data", None)
        .unwrap();

    assert_eq!(
        store.enumerate("backup/data").unwrap().into_iter().collect::<Vec<_>>(),
        vec!["backup/data@p_2024-01-01_00-00".to_string()]
    );
}

#[test]
fn test_incremental_transfer_requires_common_base() {
    let store = seeded();
    store.add_dataset("backup/data").unwrap();

    let err = store
        .transfer(
            "tank/data@p_2024-01-02_00-00",
            "backup/data",
            Some("tank/data@p_2024-01-01_00-00"),
        )
        .unwrap_err();
    assert_eq!(err.target(), Some("backup/data"));

    store
        .transfer("tank/data@p_2024-01-01_00-00", "backup/data", None)
        .unwrap();
    store
        .transfer(
            "tank/data@p_2024-01-02_00-00",
            "backup/data",
            Some("tank/data@p_2024-01-01_00-00"),
        )
        .unwrap();
    assert_eq!(store.snapshots("backup/data").unwrap().len(), 2);
}

#[test]
fn test_transfer_is_idempotent() {
    let store = seeded();
    store
        .transfer("tank/data@p_2024-01-01_00-00", "backup/data", None)
        .unwrap();
    store
        .transfer("tank/data@p_2024-01-01_00-00", "backup/data", None)
        .unwrap();

    let transfers = store
        .calls()
        .unwrap()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::Transfer { .. }))
        .count();
    assert_eq!(transfers, 1);
}

#[test]
fn test_calls_are_recorded_in_order() {
    let store = seeded();
    store
        .create("tank/data", "tank/data@p_2024-01-03_00-00", true)
        .unwrap();
    store.destroy("tank/data@p_2024-01-01_00-00").unwrap();

    assert_eq!(
        store.calls().unwrap(),
        vec![
            StoreCall::Create {
                full_name: "tank/data@p_2024-01-03_00-00".to_string(),
                recursive: true,
            },
            StoreCall::Destroy {
                full_name: "tank/data@p_2024-01-01_00-00".to_string(),
            },
        ]
    );
}

#[test]
fn test_enumerate_failure_injection() {
    let store = seeded();
    store.fail_on(StoreOp::Enumerate, "tank/data").unwrap();

    let err = store.enumerate("tank/data").unwrap_err();
    assert_eq!(err.code(), "ERR_COLLABORATOR");
}

#[test]
fn test_unknown_dataset_is_reported_missing() {
    let store = seeded();

    let err = store.enumerate("backup/data").unwrap_err();
    assert_eq!(err.code(), "ERR_DATASET_MISSING");
    assert_eq!(err.dataset(), Some("backup/data"));
}

#[test]
fn test_store_is_usable_as_trait_object() {
    let store = seeded();
    let dyn_store: &dyn SnapshotStore = &store;
    assert_eq!(dyn_store.enumerate("tank/data").unwrap().len(), 2);
}
