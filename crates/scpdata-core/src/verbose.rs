//! Verbose logging for dataset construction and loading.
//!
//! Informational observations (e.g. how many utterances a length threshold
//! dropped) go through the `verbose!` macro and are silent unless enabled
//! with [`set_verbose`].

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose logging for the whole process.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Check if verbose logging is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Log a formatted message if verbose mode is enabled.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!("[scpdata] {}", format!($($arg)*));
        }
    };
}
