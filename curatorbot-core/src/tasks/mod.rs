// File: src/tasks/mod.rs

pub mod escalation;

pub use escalation::{spawn_escalation_worker, EscalationScheduler};
