use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    Aborted,
    NotBuilt,
}

/// One entry of a branch project's build history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub number: u32,
    /// Tag of the build-result type that produced this record.
    pub build_class: String,
    pub result: BuildResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// A single branch's buildable sub-project, or the template when
/// `is_template` is set.
///
/// `C` is the flavor-specific configuration. Everything in `config` is shared
/// with the template and overwritten on re-templating; `name`, `builds` and the
/// lifecycle flags are branch identity and never are.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BranchProject<C> {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, rename = "template")]
    is_template: bool,
    /// Set when the branch disappeared from discovery. Orphans are disabled but
    /// keep their history until an explicit purge.
    #[serde(default)]
    pub orphaned: bool,
    /// `disabled` was already set when the project was orphaned, so a
    /// returning branch stays disabled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    kept_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_revision: Option<String>,
    pub config: C,
    #[serde(default)]
    pub builds: Vec<BuildRecord>,
    pub created_at: DateTime<Utc>,
}

impl<C> BranchProject<C> {
    pub fn new(name: impl Into<String>, config: C) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            is_template: false,
            orphaned: false,
            kept_disabled: false,
            last_revision: None,
            config,
            builds: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_template(&self) -> bool {
        self.is_template
    }

    /// In-memory half of `markTemplate`: flips the flag, and a template is
    /// always disabled. Clearing the flag leaves `disabled` alone.
    pub fn set_template(&mut self, is_template: bool) {
        self.is_template = is_template;
        if is_template {
            self.disabled = true;
        }
    }

    pub fn is_buildable(&self) -> bool {
        !self.disabled && !self.is_template
    }

    /// Disable the project because its branch is gone, remembering whether it
    /// was disabled already.
    pub fn orphan(&mut self) {
        if self.orphaned {
            return;
        }
        self.kept_disabled = self.disabled;
        self.disabled = true;
        self.orphaned = true;
    }

    /// Undo [`Self::orphan`] for a returning branch. Returns whether the
    /// project became enabled again.
    pub fn adopt(&mut self) -> bool {
        if !self.orphaned {
            return false;
        }
        self.orphaned = false;
        self.disabled = std::mem::take(&mut self.kept_disabled);
        !self.disabled
    }

    pub fn next_build_number(&self) -> u32 {
        self.builds.iter().map(|b| b.number).max().unwrap_or(0) + 1
    }
}

impl<C: Clone + PartialEq> BranchProject<C> {
    /// Copy the template's shared configuration into this project.
    /// Returns whether anything changed.
    pub fn apply_template(&mut self, template: &BranchProject<C>) -> bool {
        if self.config == template.config {
            return false;
        }
        self.config = template.config.clone();
        true
    }
}
