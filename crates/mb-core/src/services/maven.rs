use serde::{Deserialize, Serialize};

use crate::models::{BranchProject, ContainerInfo};

use super::flavor::{BuildClassBinding, ProjectFlavor, SubProjectFactory};

pub const MAVEN_CONTAINER_TYPE: &str = "maven-multi-branch-project";
pub const MAVEN_PROJECT_TYPE: &str = "maven-branch-project";
pub const MAVEN_BUILD_CLASS: &str = "maven-module-set-build";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MavenConfig {
    pub root_pom: String,
    pub goals: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maven_opts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jdk: Option<String>,
    #[serde(default)]
    pub incremental_build: bool,
    #[serde(default)]
    pub archiving_disabled: bool,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            root_pom: "pom.xml".into(),
            goals: "clean install".into(),
            maven_opts: None,
            settings_file: None,
            jdk: None,
            incremental_build: false,
            archiving_disabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MavenFlavor;

impl SubProjectFactory for MavenFlavor {
    type Config = MavenConfig;

    fn project_type(&self) -> &'static str {
        MAVEN_PROJECT_TYPE
    }

    fn create(
        &self,
        _container: &ContainerInfo,
        branch_name: &str,
        template: Option<&BranchProject<MavenConfig>>,
    ) -> BranchProject<MavenConfig> {
        let config = template.map(|t| t.config.clone()).unwrap_or_default();
        BranchProject::new(branch_name, config)
    }
}

impl BuildClassBinding for MavenFlavor {
    fn build_class(&self) -> &'static str {
        MAVEN_BUILD_CLASS
    }
}

impl ProjectFlavor for MavenFlavor {
    fn container_type(&self) -> &'static str {
        MAVEN_CONTAINER_TYPE
    }
}
