// src/os/posix.rs

//! POSIX implementation of [`PosixHelper`].

use std::sync::Once;

use regex::Regex;
use serde::Deserialize;
use tracing::{error, info};

use super::PosixHelper;

/// Upper bound accepted for the FPU self-test precision.
pub const FPU_PRECISION_THRESHOLD: f32 = 0.001;

/// Privileges to give up before the cycle loop starts. Every field is
/// optional; an empty config drops nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrivilegeConfig {
    /// Hard and soft `RLIMIT_NPROC`.
    pub max_processes: Option<u64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl PrivilegeConfig {
    pub fn is_empty(&self) -> bool {
        self.max_processes.is_none() && self.uid.is_none() && self.gid.is_none()
    }
}

#[derive(Debug, Default)]
pub struct SystemPosixHelper {
    privileges: PrivilegeConfig,
}

impl SystemPosixHelper {
    pub fn new(privileges: PrivilegeConfig) -> Self {
        Self { privileges }
    }
}

/// Return the first `KEY=VALUE` entry that matches `pattern` but not
/// `exception`.
pub fn find_forbidden_var<I, K, V>(vars: I, pattern: &Regex, exception: &Regex) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    vars.into_iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .find(|entry| pattern.is_match(entry) && !exception.is_match(entry))
}

/// `sqrt(2)^2` must come back to 2 within `precision`.
pub fn fpu_self_test(precision: f32) -> bool {
    if precision >= FPU_PRECISION_THRESHOLD {
        return false;
    }
    let two = std::hint::black_box(2.0_f32);
    let root = two.sqrt();
    (root * root - two).abs() < precision
}

impl PosixHelper for SystemPosixHelper {
    fn is_no_env_var_set(&self, pattern: &str, exception: &str) -> bool {
        if pattern.is_empty() || exception.is_empty() {
            error!("environment check needs a non-empty pattern and exception");
            return false;
        }

        let (pattern_re, exception_re) = match (Regex::new(pattern), Regex::new(exception)) {
            (Ok(p), Ok(e)) => (p, e),
            (Err(err), _) | (_, Err(err)) => {
                error!(error = %err, "invalid environment check pattern");
                return false;
            }
        };

        let vars = std::env::vars_os().map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        });

        match find_forbidden_var(vars, &pattern_re, &exception_re) {
            Some(entry) => {
                let key = entry.split('=').next().unwrap_or_default();
                error!(variable = key, "forbidden environment variable is set");
                false
            }
            None => true,
        }
    }

    fn is_fpu_working(&self, precision: f32) -> bool {
        let ok = fpu_self_test(precision);
        if !ok {
            error!(precision, "FPU self test failed");
        }
        ok
    }

    fn drop_privileges(&mut self) -> bool {
        if self.privileges.is_empty() {
            return true;
        }
        match platform::apply(&self.privileges) {
            Ok(()) => {
                info!(privileges = ?self.privileges, "privileges dropped");
                true
            }
            Err(err) => {
                error!(error = %err, "failed to drop privileges");
                false
            }
        }
    }

    /// Allocation failure already aborts the process. The hook makes sure
    /// panics are visible in the structured log before the default output.
    fn setup_oom_handler(&mut self) {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                error!(panic = %info, "panic in cyclic runtime");
                previous(info);
            }));
        });
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use nix::libc::rlim_t;
    use nix::sys::resource::{Resource, getrlimit, setrlimit};
    use nix::unistd::{Gid, Uid, setgid, setuid};

    use super::PrivilegeConfig;

    /// Order matters: group before user, since setuid gives up the right
    /// to change the group.
    pub fn apply(cfg: &PrivilegeConfig) -> Result<(), String> {
        if let Some(max) = cfg.max_processes {
            let limit = max as rlim_t;
            setrlimit(Resource::RLIMIT_NPROC, limit, limit)
                .map_err(|e| format!("setrlimit(RLIMIT_NPROC, {max}): {e}"))?;
            let (soft, hard) = getrlimit(Resource::RLIMIT_NPROC)
                .map_err(|e| format!("getrlimit(RLIMIT_NPROC): {e}"))?;
            if soft != limit || hard != limit {
                return Err(format!(
                    "RLIMIT_NPROC not applied: wanted {max}, got soft={soft} hard={hard}"
                ));
            }
        }
        if let Some(gid) = cfg.gid {
            setgid(Gid::from_raw(gid)).map_err(|e| format!("setgid({gid}): {e}"))?;
        }
        if let Some(uid) = cfg.uid {
            setuid(Uid::from_raw(uid)).map_err(|e| format!("setuid({uid}): {e}"))?;
        }
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::PrivilegeConfig;

    pub fn apply(cfg: &PrivilegeConfig) -> Result<(), String> {
        Err(format!("dropping privileges is not supported on this platform: {cfg:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(s: &str) -> Regex {
        Regex::new(s).unwrap()
    }

    #[test]
    fn matching_variable_is_reported() {
        let vars = vec![("PATH", "/bin"), ("LD_PRELOAD", "/tmp/evil.so")];
        let found = find_forbidden_var(vars, &re("^LD_PRELOAD="), &re("^LD_PRELOAD=$"));
        assert_eq!(found.as_deref(), Some("LD_PRELOAD=/tmp/evil.so"));
    }

    #[test]
    fn exception_suppresses_match() {
        let vars = vec![("LD_PRELOAD", "")];
        let found = find_forbidden_var(vars, &re("^LD_PRELOAD="), &re("^LD_PRELOAD=$"));
        assert_eq!(found, None);
    }

    #[test]
    fn empty_pattern_fails_the_check() {
        let helper = SystemPosixHelper::default();
        assert!(!helper.is_no_env_var_set("", "x"));
        assert!(!helper.is_no_env_var_set("x", ""));
    }

    #[test]
    fn unlikely_pattern_passes_on_real_environment() {
        let helper = SystemPosixHelper::default();
        assert!(helper.is_no_env_var_set("^CYCLEXEC_SURELY_UNSET_[0-9]{12}=", "^$"));
    }

    #[test]
    fn invalid_regex_fails_the_check() {
        let helper = SystemPosixHelper::default();
        assert!(!helper.is_no_env_var_set("(", "x"));
    }

    #[test]
    fn fpu_check_respects_threshold() {
        assert!(fpu_self_test(0.000_001));
        assert!(!fpu_self_test(0.001));
        assert!(!fpu_self_test(0.5));
        assert!(!fpu_self_test(0.0));
    }

    #[test]
    fn nothing_to_drop_succeeds() {
        let mut helper = SystemPosixHelper::new(PrivilegeConfig::default());
        assert!(helper.drop_privileges());
    }
}
