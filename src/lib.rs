// src/lib.rs

pub mod app;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod demo;
pub mod env;
pub mod errors;
pub mod exec;
pub mod fatal;
pub mod logging;
pub mod os;
pub mod trigger;
pub mod types;
pub mod worker;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::checkpoint::{Checkpoint, LoggingCheckpoint};
use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::env::SignalExecutionEnvironment;
use crate::exec::ExecutorBuilder;
use crate::os::SystemPosixHelper;
use crate::trigger::{NullTriggerCondition, PeriodicActivation, SimpleTrigger};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, wires the executor and runs it on the
/// calling thread until a termination request or a failure. Returns the
/// executor's verdict.
pub fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config from {}", args.config))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(true);
    }

    let env = SignalExecutionEnvironment::new();
    let stop = env.termination_flag();

    let activation = PeriodicActivation::try_new(cfg.executor.period, cfg.executor.offset)?;
    let trigger = SimpleTrigger::new(activation, NullTriggerCondition);

    let checkpoints = cfg.checkpoints.iter().map(|c| {
        Arc::new(LoggingCheckpoint::new(c.name.clone(), c.when)) as Arc<dyn Checkpoint>
    });

    let mut executor = ExecutorBuilder::new(cfg.executor_settings())
        .environment(env)
        .posix_helper(SystemPosixHelper::new(cfg.privileges.clone()))
        .trigger(trigger)
        .checkpoints(checkpoints)?
        .build();

    executor.set_application_handler(demo::build_application(&cfg, stop, args.cycles));

    info!(
        name = %cfg.executor.name,
        period = ?cfg.executor.period,
        offset = ?cfg.executor.offset,
        "starting executor"
    );
    Ok(executor.run())
}

/// Print the validated config without running anything.
fn print_dry_run(cfg: &ConfigFile) {
    println!("cyclexec dry-run");
    println!("  executor.name   = {}", cfg.executor.name);
    println!("  executor.period = {:?}", cfg.executor.period);
    println!("  executor.offset = {:?}", cfg.executor.offset);
    println!(
        "  attempts        = initialize {}, prepare_for_execute {}, prepare_for_shutdown {}, shutdown {}",
        cfg.attempts.initialize,
        cfg.attempts.prepare_for_execute,
        cfg.attempts.prepare_for_shutdown,
        cfg.attempts.shutdown
    );
    if let Some(core) = cfg.worker.core_id {
        println!("  worker.core_id  = {core}");
    }
    if let Some(priority) = cfg.worker.priority {
        println!("  worker.priority = {priority}");
    }
    if !cfg.privileges.is_empty() {
        println!("  privileges      = {:?}", cfg.privileges);
    }
    println!();

    println!("checkpoints ({}):", cfg.checkpoints.len());
    for cp in &cfg.checkpoints {
        println!("  - {} ({})", cp.name, cp.when);
    }

    println!("modules ({}):", cfg.modules.len());
    for m in &cfg.modules {
        println!("  - {} [{}] on {:?}", m.name, m.stage, m.affinity);
    }

    debug!("dry-run complete (no execution)");
}
