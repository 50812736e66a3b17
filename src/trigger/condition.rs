// src/trigger/condition.rs

/// Gate evaluated before every activation wait.
pub trait TriggerCondition: Send {
    fn is_triggered(&mut self) -> bool;
}

/// Condition that is always met; makes a trigger purely periodic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTriggerCondition;

impl TriggerCondition for NullTriggerCondition {
    fn is_triggered(&mut self) -> bool {
        true
    }
}

impl<F> TriggerCondition for F
where
    F: FnMut() -> bool + Send,
{
    fn is_triggered(&mut self) -> bool {
        self()
    }
}
