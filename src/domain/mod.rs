//! Domain models for the deadline estimator
//!
//! Contains the core scheduling logic without any I/O concerns.

mod id;
mod task;
mod project;
mod graph;
mod estimator;
mod forecast;
mod insights;

pub use id::{IdError, ProjectId, TaskId, MAX_ID_LEN};
pub use task::{PriorityHint, Task, TaskStatus, TransitionError};
pub use project::Project;
pub use graph::{format_cycle, DependencyGraph, GraphError};
pub use estimator::{
    estimate, validate, EstimateError, EstimationResult, EstimatorConfig, Explanation,
    HintMultipliers, RiskLabel,
};
pub use forecast::{forecast, ProjectForecast};
pub use insights::{
    insights, recommendations, workload, Category, Insights, InsightsConfig, PriorityEntry,
    Recommendation, Severity, Summary, Workload,
};
