#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::os::unix::fs::PermissionsExt;

use snapkeep_store::{SnapshotStore, ZfsCli};
use tempfile::TempDir;

/// Write an executable shell script standing in for `zfs`
fn fake_zfs(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("zfs");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
fn test_enumerate_parses_list_output() {
    let dir = TempDir::new().unwrap();
    let zfs = ZfsCli::with_binary(fake_zfs(
        &dir,
        "printf 'tank@p_2024-01-01_00-00\\ntank@p_2024-01-02_00-00\\n'",
    ));

    let names = zfs.enumerate("tank").unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.contains("tank@p_2024-01-02_00-00"));
}

#[test]
fn test_missing_dataset_is_reported_as_such() {
    let dir = TempDir::new().unwrap();
    let zfs = ZfsCli::with_binary(fake_zfs(
        &dir,
        "echo \"cannot open 'tank': dataset does not exist\" >&2; exit 1",
    ));

    let err = zfs.enumerate("tank").unwrap_err();
    assert_eq!(err.code(), "ERR_DATASET_MISSING");
    assert_eq!(err.dataset(), Some("tank"));
}

#[test]
fn test_nonzero_exit_reports_stderr() {
    let dir = TempDir::new().unwrap();
    let zfs = ZfsCli::with_binary(fake_zfs(
        &dir,
        "echo 'permission denied' >&2; exit 1",
    ));

    let err = zfs.enumerate("tank").unwrap_err();
    assert_eq!(err.code(), "ERR_COLLABORATOR");
    assert!(err.message().contains("permission denied"));
}

#[test]
fn test_create_skips_existing_snapshot() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("calls.log");
    let body = format!(
        "echo \"$@\" >> {log}\nif [ \"$1\" = list ]; then echo 'tank@p_1'; fi",
        log = log.display()
    );
    let zfs = ZfsCli::with_binary(fake_zfs(&dir, &body));

    zfs.create("tank", "tank@p_1", true).unwrap();
    zfs.create("tank", "tank@p_2", true).unwrap();

    let calls = fs::read_to_string(&log).unwrap();
    assert!(!calls.contains("snapshot -r tank@p_1"));
    assert!(calls.contains("snapshot -r tank@p_2"));
}

#[test]
fn test_full_send_to_missing_target() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("calls.log");
    let body = format!(
        "echo \"$@\" >> {log}\n\
         case \"$1\" in\n\
           list) echo \"cannot open '$9': dataset does not exist\" >&2; exit 1 ;;\n\
           send) echo stream ;;\n\
           receive) cat > /dev/null ;;\n\
         esac",
        log = log.display()
    );
    let zfs = ZfsCli::with_binary(fake_zfs(&dir, &body));

    zfs.transfer("tank@p_1", "backup/tank", None).unwrap();

    let calls = fs::read_to_string(&log).unwrap();
    assert!(calls.contains("send tank@p_1"));
    assert!(calls.contains("receive -F backup/tank"));
}

#[test]
fn test_incremental_send_to_missing_target_fails() {
    let dir = TempDir::new().unwrap();
    let zfs = ZfsCli::with_binary(fake_zfs(
        &dir,
        "echo \"cannot open 'backup/tank': dataset does not exist\" >&2; exit 1",
    ));

    let err = zfs
        .transfer("tank@p_2", "backup/tank", Some("tank@p_1"))
        .unwrap_err();
    assert_eq!(err.code(), "ERR_DATASET_MISSING");
    assert_eq!(err.target(), Some("backup/tank"));
}

#[test]
fn test_send_with_large_stderr_completes() {
    let dir = TempDir::new().unwrap();
    // 256 KiB of stderr from the sender, well past any pipe buffer
    let zfs = ZfsCli::with_binary(fake_zfs(
        &dir,
        "case \"$1\" in\n\
           send) head -c 262144 /dev/zero | tr '\\0' x >&2; echo stream ;;\n\
           receive) cat > /dev/null ;;\n\
         esac",
    ));

    zfs.transfer("tank@p_1", "backup/tank", None).unwrap();
}
