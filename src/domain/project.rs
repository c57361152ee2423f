//! Project domain model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::id::{ProjectId, TaskId};

/// A named collection of tasks with an overall target date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,

    pub name: String,

    /// Date the whole project should be complete by
    pub target_date: NaiveDate,

    /// Member tasks
    #[serde(default)]
    pub tasks: BTreeSet<TaskId>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, target_date: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            target_date,
            tasks: BTreeSet::new(),
        }
    }

    /// Adds a task to the project, returning false if it was already a member
    pub fn add_task(&mut self, task_id: TaskId) -> bool {
        self.tasks.insert(task_id)
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.tasks.contains(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let mut project = Project::new(
            ProjectId::new("launch").unwrap(),
            "Launch",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        let id = TaskId::new("a").unwrap();

        assert!(project.add_task(id.clone()));
        assert!(!project.add_task(id.clone()));
        assert!(project.contains(&id));
        assert_eq!(project.tasks.len(), 1);
    }

    #[test]
    fn toml_roundtrip() {
        let toml_src = r#"
id = "launch"
name = "Product launch"
target_date = "2025-06-01"
tasks = ["design", "build"]
"#;
        let project: Project = toml::from_str(toml_src).unwrap();
        assert_eq!(project.name, "Product launch");
        assert_eq!(project.tasks.len(), 2);
        assert!(project.contains(&TaskId::new("build").unwrap()));
    }
}
