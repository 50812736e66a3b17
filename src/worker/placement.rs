// src/worker/placement.rs

//! CPU affinity and scheduling priority for the calling thread.
//!
//! Both functions act on the *current* thread. Some targets only allow a
//! thread to change its own run mask, so the worker calls them on itself
//! right after it starts.

#[cfg(target_os = "linux")]
mod imp {
    use nix::libc;
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    pub fn pin_current_thread(core_id: usize) -> Result<(), String> {
        let mut set = CpuSet::new();
        set.set(core_id)
            .map_err(|e| format!("core {core_id} out of range: {e}"))?;
        // Pid 0 addresses the calling thread.
        sched_setaffinity(Pid::from_raw(0), &set)
            .map_err(|e| format!("sched_setaffinity(core {core_id}): {e}"))
    }

    /// Keep the inherited policy, replace only the priority.
    pub fn set_current_thread_priority(priority: i32) -> Result<(), String> {
        // SAFETY: pthread_self is always valid for the calling thread and
        // `param` is a properly initialised sched_param owned by this frame.
        unsafe {
            let thread = libc::pthread_self();
            let mut policy: libc::c_int = 0;
            let mut param: libc::sched_param = std::mem::zeroed();

            let rc = libc::pthread_getschedparam(thread, &mut policy, &mut param);
            if rc != 0 {
                return Err(format!(
                    "pthread_getschedparam: {}",
                    std::io::Error::from_raw_os_error(rc)
                ));
            }

            param.sched_priority = priority;
            let rc = libc::pthread_setschedparam(thread, policy, &param);
            if rc != 0 {
                return Err(format!(
                    "pthread_setschedparam(priority {priority}): {}",
                    std::io::Error::from_raw_os_error(rc)
                ));
            }
        }
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    pub fn pin_current_thread(core_id: usize) -> Result<(), String> {
        Err(format!("CPU pinning (core {core_id}) is not supported on this platform"))
    }

    pub fn set_current_thread_priority(priority: i32) -> Result<(), String> {
        Err(format!("thread priority {priority} is not supported on this platform"))
    }
}

pub use imp::{pin_current_thread, set_current_thread_priority};

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn pinning_to_an_impossible_core_fails() {
        let err = std::thread::spawn(|| pin_current_thread(1 << 20))
            .join()
            .unwrap()
            .unwrap_err();
        assert!(err.contains("out of range"));
    }
}
