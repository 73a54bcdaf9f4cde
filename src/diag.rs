//! Recoverable-data diagnostics.
//!
//! Warnings about missing references, malformed JSON and similar
//! non-fatal problems go through [`warning!`](crate::warning). Each one is
//! forwarded to `log::warn!` and also kept in a per-thread ring so the
//! debug console (and tests) can read back what was reported.

use std::cell::RefCell;
use std::collections::VecDeque;

/// Number of recent warnings kept per thread.
pub const CAPACITY: usize = 256;

thread_local! {
    static RECENT: RefCell<VecDeque<String>> = RefCell::new(VecDeque::with_capacity(CAPACITY));
}

/// Logs `message` as a warning and records it in the ring.
pub fn warn(message: String) {
    log::warn!("{message}");
    RECENT.with(|recent| {
        let mut recent = recent.borrow_mut();
        if recent.len() >= CAPACITY {
            recent.pop_front();
        }
        recent.push_back(message);
    });
}

/// Removes and returns every recorded warning, oldest first.
pub fn drain() -> Vec<String> {
    RECENT.with(|recent| recent.borrow_mut().drain(..).collect())
}

/// Copies the recorded warnings without clearing them.
pub fn recent() -> Vec<String> {
    RECENT.with(|recent| recent.borrow().iter().cloned().collect())
}

/// Number of warnings currently held.
pub fn count() -> usize {
    RECENT.with(|recent| recent.borrow().len())
}

/// Formats and reports a recoverable data warning.
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::diag::warn(format!($($arg)*))
    };
}
