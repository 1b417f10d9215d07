//! Deduplicated warnings for unsupported input.
//!
//! Style sheets tend to repeat the same unsupported selector or value many
//! times. Each distinct message is logged once per process (or until
//! [`clear_warnings`] is called), at `warn` level with the component as the
//! log target.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted.
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about unsupported input (logged once per unique message).
///
/// # Example
/// ```
/// trellis_common::warning::warn_once("css", "unsupported pseudo-class ':hover'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let first_time = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first_time {
        log::warn!(target: component, "{message}");
    }
}

/// Returns true if `message` has already been reported for `component`.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|set| set.contains(&key))
}

/// Forget every recorded warning (call when a new document is loaded).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
