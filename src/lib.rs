//! Deadline CLI - deadline risk and priority estimation for project tasks
//!
//! Given a project and its dependency-linked tasks, the estimator computes a
//! recommended due date, a risk label and a priority rank for every task.
//! The computation is a pure function of the snapshot and an explicit
//! "today", so results are reproducible.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    estimate, EstimateError, EstimationResult, EstimatorConfig, PriorityHint, Project, ProjectId,
    RiskLabel, Task, TaskId, TaskStatus,
};
