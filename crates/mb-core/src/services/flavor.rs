//! Adapter contracts a build-tool flavor supplies to the orchestrator.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{BranchProject, BuildRecord, ContainerInfo};

/// Flavor-specific configuration shared between the template and every branch
/// project.
pub trait ProjectConfig:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> ProjectConfig for T where
    T: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

pub trait SubProjectFactory: Send + Sync + 'static {
    type Config: ProjectConfig;

    /// Type alias sub-project documents are persisted under.
    fn project_type(&self) -> &'static str;

    /// Build a new, unpersisted sub-project for `branch_name`. Its
    /// configuration must be a structural clone of `template` when one is
    /// given, and it must not be marked as the template.
    fn create(
        &self,
        container: &ContainerInfo,
        branch_name: &str,
        template: Option<&BranchProject<Self::Config>>,
    ) -> BranchProject<Self::Config>;
}

/// Binds a sub-project type to the build-result type it produces.
pub trait BuildClassBinding: Send + Sync + 'static {
    fn build_class(&self) -> &'static str;

    fn accepts(&self, build: &BuildRecord) -> bool {
        build.build_class == self.build_class()
    }
}

/// The full capability set the orchestrator is built around.
pub trait ProjectFlavor: SubProjectFactory + BuildClassBinding {
    /// Type alias container documents are persisted under.
    fn container_type(&self) -> &'static str;
}
