// src/trigger/clock.rs

//! Monotonic time source with absolute-deadline sleep.
//!
//! Time points are expressed as a [`Duration`] since the clock's epoch
//! (boot time for `CLOCK_MONOTONIC`). Keeping them as plain durations makes
//! the grid arithmetic in [`super::activation`] trivially testable with a
//! hand-driven clock.

use std::time::Duration;

/// A monotonic clock that can sleep until an absolute time point.
pub trait Clock: Send {
    /// Current time since the clock epoch.
    fn now(&self) -> Duration;

    /// Block the calling thread until `deadline` has been reached.
    ///
    /// Implementations must not return early when the sleep is interrupted
    /// by a signal.
    fn sleep_until(&self, deadline: Duration);
}

/// The platform monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

#[cfg(target_os = "linux")]
mod platform {
    use std::time::Duration;

    use nix::errno::Errno;
    use nix::sys::time::TimeSpec;
    use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};
    use tracing::warn;

    use crate::fatal;

    pub(super) fn now() -> Duration {
        match clock_gettime(ClockId::CLOCK_MONOTONIC) {
            Ok(ts) => Duration::new(ts.tv_sec() as u64, ts.tv_nsec() as u32),
            Err(errno) => {
                fatal::abort_with(&format!("clock_gettime(CLOCK_MONOTONIC) failed: {errno}"))
            }
        }
    }

    pub(super) fn sleep_until(deadline: Duration) {
        let request = TimeSpec::from(deadline);
        loop {
            match clock_nanosleep(
                ClockId::CLOCK_MONOTONIC,
                ClockNanosleepFlags::TIMER_ABSTIME,
                &request,
            ) {
                Ok(_) => return,
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    warn!(error = %errno, ?deadline, "clock_nanosleep failed; not sleeping");
                    return;
                }
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    fn epoch() -> Instant {
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        *EPOCH.get_or_init(Instant::now)
    }

    pub(super) fn now() -> Duration {
        epoch().elapsed()
    }

    pub(super) fn sleep_until(deadline: Duration) {
        // thread::sleep is relative; loop until the absolute deadline passed.
        loop {
            let now = now();
            if now >= deadline {
                return;
            }
            std::thread::sleep(deadline - now);
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        platform::now()
    }

    fn sleep_until(&self, deadline: Duration) {
        platform::sleep_until(deadline)
    }
}
