//! Tests for warning deduplication and verbose switching.

use nbdeck_common::warning::{has_warned, is_verbose, set_verbose, warn_once};

#[test]
fn test_warn_once_records_message() {
    warn_once("Test", "recorded once");
    warn_once("Test", "recorded once");
    assert!(has_warned("Test", "recorded once"));
}

#[test]
fn test_warning_key_includes_component() {
    warn_once("Alpha", "same text");
    assert!(has_warned("Alpha", "same text"));
    assert!(!has_warned("Beta", "same text"));
}

#[test]
fn test_unknown_warning_not_recorded() {
    assert!(!has_warned("Test", "never emitted anywhere"));
}

#[test]
fn test_verbose_toggle() {
    set_verbose(true);
    assert!(is_verbose());
    set_verbose(false);
    assert!(!is_verbose());
}
