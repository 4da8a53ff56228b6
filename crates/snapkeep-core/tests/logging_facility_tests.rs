#![allow(clippy::unwrap_used, clippy::expect_used)]

use snapkeep_core::errors::{ExError, ExErrorKind, SnapkeepError};
use snapkeep_core::logging_facility::init_test_capture;
use snapkeep_core::{log_op_end, log_op_error, log_op_start};
use snapkeep_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_records_fields() {
    let capture = init_test_capture();
    let op_name = "logging_test_start_1";

    log_op_start!(op_name, dataset = "tank/data");

    let start = capture
        .find(op_name, EVENT_START)
        .expect("start event captured");
    assert_eq!(start.dataset(), Some("tank/data"));
    assert!(start.component().is_some());
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "logging_test_end_2";

    log_op_end!(op_name, duration_ms = 42, keep_len = 3);

    let count = capture.count_events(|e| {
        e.is(op_name, EVENT_END)
            && e.field("duration_ms") == Some("42")
            && e.field("keep_len") == Some("3")
    });
    assert_eq!(count, 1);
}

#[test]
fn test_log_op_error_carries_code() {
    let capture = init_test_capture();
    let op_name = "logging_test_error_3";

    let err = SnapkeepError::InvalidPolicySpec {
        field: "preserve".to_string(),
        reason: "unknown unit 'fortnight'".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 7);

    let error = capture
        .find(op_name, EVENT_END_ERROR)
        .expect("error event captured");
    assert_eq!(error.field("err_code"), Some("ERR_INVALID_POLICY_SPEC"));
    assert_eq!(error.field("err_kind"), Some("InvalidPolicySpec"));
}

#[test]
fn test_log_op_error_accepts_ex_error() {
    let capture = init_test_capture();
    let op_name = "logging_test_error_4";

    let err = ExError::new(ExErrorKind::Collaborator)
        .with_dataset("tank/data")
        .with_message("zfs exited with status 1");
    log_op_error!(op_name, err, duration_ms = 1, dataset = "tank/data");

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
}
