// src/demo/mod.rs

//! Application wiring used by the `cyclexec` binary.
//!
//! The binary runs a [`HelloWorldApp`] through an iterative handler and,
//! if `[[module]]` entries are configured, a fork/join handler of
//! [`DemoModule`]s after it in the same cycle.

pub mod hello;
pub mod module;

use std::sync::{Arc, Mutex};

use crate::app::{
    ApplicationHandler, ForkJoinModuleHandler, ForkMap, IterativeApplicationHandler,
    SequentialHandlerContainer, SharedModule,
};
use crate::config::{ConfigFile, ModuleSpec};
use crate::env::signal::TerminationFlag;
use crate::trigger::PeriodicTrigger;

pub use hello::HelloWorldApp;
pub use module::DemoModule;

/// Group configured modules by stage, keeping file order within a stage.
pub fn fork_map(modules: &[ModuleSpec]) -> ForkMap {
    let mut map = ForkMap::new();
    for spec in modules {
        let module: SharedModule = Arc::new(Mutex::new(DemoModule::new(
            spec.name.clone(),
            spec.stage,
            spec.affinity,
        )));
        map.entry(spec.stage)
            .or_default()
            .push((spec.affinity, module));
    }
    map
}

/// Build the handler tree for the binary.
///
/// Lifecycle retries are paced by their own periodic trigger, on the same
/// grid as the executor's.
pub fn build_application(
    cfg: &ConfigFile,
    stop: TerminationFlag,
    cycle_limit: Option<u64>,
) -> Box<dyn ApplicationHandler> {
    let lifecycle_trigger = PeriodicTrigger::periodic(cfg.executor.period, cfg.executor.offset);
    let hello = IterativeApplicationHandler::new(
        HelloWorldApp::new(stop, cycle_limit),
        lifecycle_trigger,
        cfg.attempts.into(),
    );

    if cfg.modules.is_empty() {
        return Box::new(hello);
    }

    let fork_join = ForkJoinModuleHandler::new(cfg.worker.clone(), fork_map(&cfg.modules));
    Box::new(SequentialHandlerContainer::new(vec![
        Box::new(hello),
        Box::new(fork_join),
    ]))
}
