// src/os/mod.rs

//! Process-level sanity checks and hardening.

pub mod posix;

pub use posix::{PrivilegeConfig, SystemPosixHelper};

pub trait PosixHelper: Send {
    /// `true` if no environment variable matches `pattern`, ignoring those
    /// that also match `exception`. Variables are matched as `KEY=VALUE`.
    fn is_no_env_var_set(&self, pattern: &str, exception: &str) -> bool;

    /// Floating-point self test. `precision` must be below `0.001`.
    fn is_fpu_working(&self, precision: f32) -> bool;

    fn drop_privileges(&mut self) -> bool;

    /// Install the process-wide handler for fatal runtime errors.
    fn setup_oom_handler(&mut self);
}

impl<T: PosixHelper + ?Sized> PosixHelper for Box<T> {
    fn is_no_env_var_set(&self, pattern: &str, exception: &str) -> bool {
        (**self).is_no_env_var_set(pattern, exception)
    }

    fn is_fpu_working(&self, precision: f32) -> bool {
        (**self).is_fpu_working(precision)
    }

    fn drop_privileges(&mut self) -> bool {
        (**self).drop_privileges()
    }

    fn setup_oom_handler(&mut self) {
        (**self).setup_oom_handler()
    }
}
