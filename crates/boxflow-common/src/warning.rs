//! Deduplicated warnings.
//!
//! Used by the style keyword parsers and the document loader to report
//! unsupported input without spamming the same line for every element.

use std::collections::HashSet;
use std::sync::Mutex;

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about unsupported input (logs once per unique message).
///
/// Returns `true` when the message was emitted, `false` when it had already
/// been seen.
///
/// # Example
/// ```
/// use boxflow_common::warning::warn_once;
///
/// let _ = warn_once("style", "unsupported display keyword 'flex'");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let should_log = WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_log {
        log::warn!(target: "boxflow", "[{component}] {message}");
    }
    should_log
}

/// Clear all recorded warnings (call before loading a new document).
pub fn clear_warnings() {
    let mut guard = WARNED
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
