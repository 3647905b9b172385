use async_trait::async_trait;
use regex::Regex;

use crate::error::{MultiBranchError, Result};
use crate::models::{Branch, BranchFilterConfig, ContainerInfo};

/// External collaborator that reports the live branches of a container's
/// repository. Each call computes a fresh list; timeouts are the source's
/// concern.
#[async_trait]
pub trait BranchSource: Send + Sync {
    async fn list_branches(&self, container: &ContainerInfo) -> Result<Vec<Branch>>;
}

/// Keeps a branch iff it matches `include` (when set) and does not match
/// `exclude` (when set).
#[derive(Debug, Clone, Default)]
pub struct BranchFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl BranchFilter {
    pub fn from_config(config: &BranchFilterConfig) -> Result<Self> {
        Ok(Self {
            include: compile(config.include.as_deref(), "include")?,
            exclude: compile(config.exclude.as_deref(), "exclude")?,
        })
    }

    pub fn matches(&self, branch_name: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .map_or(true, |re| re.is_match(branch_name));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|re| re.is_match(branch_name));
        included && !excluded
    }

    pub fn apply(&self, branches: Vec<Branch>) -> Vec<Branch> {
        branches
            .into_iter()
            .filter(|b| self.matches(&b.name))
            .collect()
    }
}

fn compile(pattern: Option<&str>, field: &str) -> Result<Option<Regex>> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| {
            Regex::new(p).map_err(|e| {
                MultiBranchError::InvalidConfig(format!(
                    "branches.{field} is not a valid regex: {e}"
                ))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: Option<&str>, exclude: Option<&str>) -> BranchFilter {
        BranchFilter::from_config(&BranchFilterConfig {
            include: include.map(String::from),
            exclude: exclude.map(String::from),
        })
        .unwrap()
    }

    #[test]
    fn default_filter_keeps_everything() {
        let f = BranchFilter::default();
        assert!(f.matches("main"));
        assert!(f.matches("wip/anything"));
    }

    #[test]
    fn include_and_exclude_combine() {
        let f = filter(Some("^(main|release/.*)$"), Some("-rc$"));
        assert!(f.matches("main"));
        assert!(f.matches("release/2.0"));
        assert!(!f.matches("release/2.0-rc"));
        assert!(!f.matches("dev"));
    }

    #[test]
    fn apply_preserves_order() {
        let f = filter(None, Some("^wip/"));
        let kept = f.apply(vec![
            Branch::named("dev"),
            Branch::named("wip/spike"),
            Branch::named("main"),
        ]);
        let names: Vec<_> = kept.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "main"]);
    }

    #[test]
    fn invalid_regex_is_config_error() {
        let err = BranchFilter::from_config(&BranchFilterConfig {
            include: Some("(".into()),
            exclude: None,
        })
        .unwrap_err();
        assert!(matches!(err, MultiBranchError::InvalidConfig(_)));
    }
}
