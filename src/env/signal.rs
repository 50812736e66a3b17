// src/env/signal.rs

//! Execution environment driven by SIGINT / SIGTERM.
//!
//! Signal delivery is handled by tokio on a small dedicated runtime. The
//! executor loop stays synchronous and only polls an atomic flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info};

use crate::types::EnvState;

use super::ExecutionEnvironment;

/// Shared handle that requests termination when set.
#[derive(Debug, Clone, Default)]
pub struct TerminationFlag(Arc<AtomicBool>);

impl TerminationFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct SignalExecutionEnvironment {
    flag: TerminationFlag,
    runtime: Option<Runtime>,
    state: Option<EnvState>,
}

impl SignalExecutionEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that lets application code request a clean stop, as if a
    /// signal had arrived.
    pub fn termination_flag(&self) -> TerminationFlag {
        self.flag.clone()
    }

    pub fn state(&self) -> Option<EnvState> {
        self.state
    }

    fn start_listener(&mut self) -> std::io::Result<()> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cyclexec-signal")
            .enable_all()
            .build()?;

        // Register inside the runtime context so a signal arriving right
        // after init() is already caught.
        let listener = {
            let _guard = runtime.enter();
            Listener::register()?
        };

        let flag = self.flag.clone();
        runtime.spawn(async move {
            let which = listener.recv().await;
            info!(signal = which, "termination requested");
            flag.request();
        });

        self.runtime = Some(runtime);
        Ok(())
    }
}

#[cfg(unix)]
struct Listener {
    terminate: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Listener {
    fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.terminate.recv() => "SIGTERM",
            _ = self.interrupt.recv() => "SIGINT",
        }
    }
}

#[cfg(not(unix))]
struct Listener;

#[cfg(not(unix))]
impl Listener {
    fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> &'static str {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
        }
        "ctrl-c"
    }
}

impl ExecutionEnvironment for SignalExecutionEnvironment {
    fn init(&mut self) -> bool {
        if self.runtime.is_some() {
            return true;
        }
        match self.start_listener() {
            Ok(()) => {
                debug!("signal listener started");
                true
            }
            Err(err) => {
                error!(error = %err, "failed to install signal listener");
                false
            }
        }
    }

    fn deinit(&mut self) -> bool {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!("signal listener stopped");
        }
        true
    }

    fn set_state(&mut self, state: EnvState) {
        info!(?state, "execution state changed");
        self.state = Some(state);
    }

    fn is_sig_term(&self) -> bool {
        self.flag.is_requested()
    }

    fn refresh(&mut self) -> bool {
        true
    }
}

impl Drop for SignalExecutionEnvironment {
    fn drop(&mut self) {
        self.deinit();
    }
}
