// src/fatal.rs

//! Process termination for unrecoverable conditions.
//!
//! Used for configuration errors that reach a constructor (zero period,
//! failed CPU pinning) and for broken fork/join synchronization. These are
//! deployment defects, not runtime conditions, so there is no caller that
//! could meaningfully handle them.

use tracing::error;

/// Log `reason` and abort the process without unwinding.
pub fn abort_with(reason: &str) -> ! {
    error!(reason, "fatal condition; aborting process");
    std::process::abort()
}
