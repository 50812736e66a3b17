// src/config/validate.rs

use std::collections::HashSet;

use regex::Regex;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, ExecutorConfig, ModuleSpec, RawConfigFile};
use crate::errors::{CyclexecError, Result};
use crate::os::posix::FPU_PRECISION_THRESHOLD;
use crate::types::{Stage, TaskAffinity};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CyclexecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let executor = validate_executor(&raw)?;
        validate_attempts(&raw)?;
        validate_checks(&raw)?;
        validate_checkpoints(&raw)?;
        let modules = validate_modules(&raw)?;
        Ok(ConfigFile::new_unchecked(executor, raw, modules))
    }
}

fn validate_executor(cfg: &RawConfigFile) -> Result<ExecutorConfig> {
    let section = &cfg.executor;

    if section.name.trim().is_empty() {
        return Err(CyclexecError::ConfigError(
            "[executor].name must not be empty".to_string(),
        ));
    }

    let period = parse_duration(&section.period)
        .map_err(|e| CyclexecError::ConfigError(format!("[executor].period: {e}")))?;
    let period = match period.non_negative() {
        Some(p) if !p.is_zero() => p,
        _ => return Err(CyclexecError::InvalidPeriod(period.magnitude)),
    };

    let offset = parse_duration(&section.offset)
        .map_err(|e| CyclexecError::ConfigError(format!("[executor].offset: {e}")))?;
    let offset = offset
        .non_negative()
        .ok_or(CyclexecError::InvalidOffset(offset.magnitude))?;

    Ok(ExecutorConfig {
        name: section.name.clone(),
        period,
        offset,
    })
}

fn validate_attempts(cfg: &RawConfigFile) -> Result<()> {
    let a = &cfg.attempts;
    for (phase, value) in [
        ("initialize", a.initialize),
        ("prepare_for_execute", a.prepare_for_execute),
        ("prepare_for_shutdown", a.prepare_for_shutdown),
        ("shutdown", a.shutdown),
    ] {
        if value == 0 {
            return Err(CyclexecError::ConfigError(format!(
                "[attempts].{phase} must be >= 1 (got 0)"
            )));
        }
    }
    Ok(())
}

fn validate_checks(cfg: &RawConfigFile) -> Result<()> {
    let checks = &cfg.checks;

    for pattern in [&checks.env_pattern, &checks.env_exception] {
        if pattern.is_empty() {
            return Err(CyclexecError::ConfigError(
                "[checks].env_pattern and env_exception must not be empty".to_string(),
            ));
        }
        Regex::new(pattern).map_err(|source| CyclexecError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }

    let p = checks.fpu_precision;
    if !(p > 0.0 && p < FPU_PRECISION_THRESHOLD) {
        return Err(CyclexecError::ConfigError(format!(
            "[checks].fpu_precision must be in (0, {FPU_PRECISION_THRESHOLD}) (got {p})"
        )));
    }
    Ok(())
}

fn validate_checkpoints(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for cp in &cfg.checkpoint {
        if cp.name.trim().is_empty() {
            return Err(CyclexecError::ConfigError(
                "checkpoint name must not be empty".to_string(),
            ));
        }
        if !seen.insert((cp.when, cp.name.as_str())) {
            return Err(CyclexecError::ConfigError(format!(
                "duplicate checkpoint '{}' for when = \"{}\"",
                cp.name, cp.when
            )));
        }
    }
    Ok(())
}

fn validate_modules(cfg: &RawConfigFile) -> Result<Vec<ModuleSpec>> {
    let mut seen = HashSet::new();
    let mut modules = Vec::with_capacity(cfg.module.len());

    for m in &cfg.module {
        if m.name.trim().is_empty() {
            return Err(CyclexecError::ConfigError(
                "module name must not be empty".to_string(),
            ));
        }
        if !seen.insert(m.name.as_str()) {
            return Err(CyclexecError::ConfigError(format!(
                "duplicate module '{}'",
                m.name
            )));
        }

        let stage = Stage::from_index(m.stage).ok_or_else(|| {
            CyclexecError::ConfigError(format!(
                "module '{}': stage must be 1, 2 or 3 (got {})",
                m.name, m.stage
            ))
        })?;
        let affinity: TaskAffinity = m
            .affinity
            .parse()
            .map_err(|e| CyclexecError::ConfigError(format!("module '{}': {e}", m.name)))?;

        modules.push(ModuleSpec {
            name: m.name.clone(),
            stage,
            affinity,
        });
    }
    Ok(modules)
}
