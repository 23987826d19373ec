//! Tests for the deduplicating warning helper.

use boxflow_common::warning::{clear_warnings, warn_once};

#[test]
fn test_warn_once_deduplicates_and_clears() {
    clear_warnings();
    assert!(warn_once("test", "unique warning for dedup test"));
    assert!(!warn_once("test", "unique warning for dedup test"));
    // Same message from a different component is a different key.
    assert!(warn_once("other", "unique warning for dedup test"));

    clear_warnings();
    assert!(warn_once("test", "unique warning for dedup test"));
}
