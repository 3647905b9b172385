use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::project::BranchProject;

/// Name reserved for the template sub-project.
pub const TEMPLATE_NAME: &str = "template";

/// Identity of a multi-branch container, handed to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub name: String,
    pub root_dir: PathBuf,
}

impl ContainerInfo {
    pub fn new(name: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_dir: root_dir.into(),
        }
    }
}

/// Template lifecycle. `Loading` and `Creating` only exist inside a cycle;
/// `LoadFailed` is never cached and is retried on the next cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TemplateStatus {
    #[default]
    Absent,
    Loading,
    Creating,
    Ready,
    LoadFailed,
}

/// Persisted body of the container document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    pub name: String,
    #[serde(default)]
    pub sub_projects: Vec<String>,
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled_at: Option<DateTime<Utc>>,
}

/// In-memory committed state of one multi-branch job.
#[derive(Debug, Clone)]
pub struct MultiBranchContainer<C> {
    pub info: ContainerInfo,
    pub sub_projects: BTreeMap<String, BranchProject<C>>,
    pub template: Option<BranchProject<C>>,
    pub template_status: TemplateStatus,
    pub last_reconciled_at: Option<DateTime<Utc>>,
}

impl<C> MultiBranchContainer<C> {
    pub fn new(info: ContainerInfo) -> Self {
        Self {
            info,
            sub_projects: BTreeMap::new(),
            template: None,
            template_status: TemplateStatus::Absent,
            last_reconciled_at: None,
        }
    }

    /// Names of branch projects that can currently be built. Never includes
    /// the template.
    pub fn enabled_branches(&self) -> Vec<String> {
        self.sub_projects
            .values()
            .filter(|p| p.is_buildable())
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn orphaned_branches(&self) -> Vec<String> {
        self.sub_projects
            .values()
            .filter(|p| p.orphaned)
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn to_state(&self) -> ContainerState {
        ContainerState {
            name: self.info.name.clone(),
            sub_projects: self.sub_projects.keys().cloned().collect(),
            template: TEMPLATE_NAME.to_string(),
            last_reconciled_at: self.last_reconciled_at,
        }
    }
}
