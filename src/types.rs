// src/types.rs

//! Small value types shared across modules.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Outcome of a single application lifecycle call.
///
/// `OnGoing` asks the handler to call the same phase again. Not every
/// handler supports it: the sequential handlers treat it as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodState {
    Successful,
    Failed,
    OnGoing,
}

/// When a checkpoint fires relative to the application step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum When {
    Before,
    After,
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            When::Before => f.write_str("before"),
            When::After => f.write_str("after"),
        }
    }
}

/// State reported outward to the execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    Running,
    Terminate,
}

/// Which thread executes a fork/join module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAffinity {
    Main,
    Worker,
}

impl FromStr for TaskAffinity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" => Ok(TaskAffinity::Main),
            "worker" => Ok(TaskAffinity::Worker),
            other => Err(format!(
                "invalid thread affinity: {other} (expected \"main\" or \"worker\")"
            )),
        }
    }
}

/// Fork/join stage. Stages execute in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Stage1,
    Stage2,
    Stage3,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Stage1, Stage::Stage2, Stage::Stage3];

    /// Map a 1-based stage number from configuration.
    pub fn from_index(index: u8) -> Option<Stage> {
        match index {
            1 => Some(Stage::Stage1),
            2 => Some(Stage::Stage2),
            3 => Some(Stage::Stage3),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            Stage::Stage1 => 1,
            Stage::Stage2 => 2,
            Stage::Stage3 => 3,
        };
        write!(f, "stage{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_order_by_declaration() {
        let mut stages = vec![Stage::Stage3, Stage::Stage1, Stage::Stage2];
        stages.sort();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[test]
    fn affinity_parses_case_insensitively() {
        assert_eq!("Worker".parse::<TaskAffinity>(), Ok(TaskAffinity::Worker));
        assert_eq!(" main ".parse::<TaskAffinity>(), Ok(TaskAffinity::Main));
        assert!("gpu".parse::<TaskAffinity>().is_err());
    }

    #[test]
    fn stage_index_is_one_based() {
        assert_eq!(Stage::from_index(1), Some(Stage::Stage1));
        assert_eq!(Stage::from_index(0), None);
        assert_eq!(Stage::from_index(4), None);
    }
}
