//! Converter diagnostics with colored terminal output.
//!
//! Warnings are deduplicated so a page with hundreds of cells carrying the
//! same odd metadata reports it once. Status lines are silent unless verbose
//! mode has been switched on by the binary.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Whether [`status`] lines are printed.
static VERBOSE: AtomicBool = AtomicBool::new(false);

fn warning_key(component: &str, message: &str) -> String {
    format!("[{component}] {message}")
}

/// Warn about unexpected input (prints once per unique message)
///
/// # Example
/// ```ignore
/// warn_once("Cells", "unknown slide type 'intro', treating as content");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = warning_key(component, message);
    let should_print = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_print {
        eprintln!("{}", format!("[nbdeck {component}] ⚠ {message}").yellow());
    }
}

/// Returns true if this exact warning has been emitted since the last
/// [`clear_warnings`].
#[must_use]
pub fn has_warned(component: &str, message: &str) -> bool {
    let key = warning_key(component, message);
    let guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    guard.as_ref().is_some_and(|set| set.contains(&key))
}

/// Clear all recorded warnings (call before converting another page)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Enable or disable [`status`] output.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Returns whether verbose status output is enabled.
#[must_use]
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Print a progress line to stderr when verbose mode is on.
pub fn status(component: &str, message: &str) {
    if is_verbose() {
        eprintln!("{} {message}", format!("[nbdeck {component}]").cyan());
    }
}
