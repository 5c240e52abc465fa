//! In-memory project registry.

use crate::now_rfc3339;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("Project not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub model_type: String,
    pub use_case: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub model_type: String,
    pub use_case: String,
    pub created_date: String,
    pub status: String,
    pub performance_metrics: Map<String, Value>,
}

impl Project {
    pub fn is_active(&self) -> bool { self.status == "active" }
}

#[derive(Default)]
struct Registry {
    counter: u32,
    projects: Vec<Project>, // creation order
    by_id: HashMap<String, usize>,
}

impl Registry {
    fn find(&self, id: &str) -> Option<&Project> {
        self.by_id.get(id).and_then(|&pos| self.projects.get(pos))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Project> {
        let pos = *self.by_id.get(id)?;
        self.projects.get_mut(pos)
    }
}

/// Projects keyed by generated id (`proj_0001`, `proj_0002`, ...). All mutation goes through
/// one lock, which also makes id allocation atomic.
#[derive(Default)]
pub struct ProjectStore {
    inner: Mutex<Registry>,
}

impl ProjectStore {
    pub fn new() -> Self { Self::default() }

    pub fn create(&self, new: NewProject) -> Project {
        let now = now_rfc3339();
        let mut metrics = Map::new();
        metrics.insert("accuracy".into(), Value::from(0.0));
        metrics.insert("latency".into(), Value::from(0.0));
        metrics.insert("user_satisfaction".into(), Value::from(0.0));
        metrics.insert("last_updated".into(), Value::from(now.clone()));

        let mut reg = self.inner.lock();
        reg.counter += 1;
        let project = Project {
            id: format!("proj_{:04}", reg.counter),
            name: new.name,
            description: new.description,
            model_type: new.model_type,
            use_case: new.use_case,
            created_date: now,
            status: "active".into(),
            performance_metrics: metrics,
        };
        let pos = reg.projects.len();
        reg.by_id.insert(project.id.clone(), pos);
        reg.projects.push(project.clone());
        tracing::info!(id = %project.id, "created project");
        project
    }

    pub fn list(&self) -> Vec<Project> { self.inner.lock().projects.clone() }

    pub fn get(&self, id: &str) -> Result<Project, ProjectError> {
        self.inner.lock().find(id).cloned().ok_or_else(|| ProjectError::NotFound(id.to_string()))
    }

    /// Merge `metrics` into the project's metrics and refresh `last_updated`.
    pub fn update_metrics(&self, id: &str, metrics: Map<String, Value>) -> Result<Project, ProjectError> {
        let mut reg = self.inner.lock();
        let project = reg.find_mut(id).ok_or_else(|| ProjectError::NotFound(id.to_string()))?;
        project.performance_metrics.extend(metrics);
        project.performance_metrics.insert("last_updated".into(), Value::from(now_rfc3339()));
        tracing::info!(id, "updated project metrics");
        Ok(project.clone())
    }

    pub fn len(&self) -> usize { self.inner.lock().projects.len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn active_count(&self) -> usize { self.inner.lock().projects.iter().filter(|p| p.is_active()).count() }
}
