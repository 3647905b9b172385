pub mod branch;
pub mod config;
pub mod container;
pub mod project;

pub use branch::Branch;
pub use config::{BranchFilterConfig, MultiBranchConfig};
pub use container::{
    ContainerInfo, ContainerState, MultiBranchContainer, TemplateStatus, TEMPLATE_NAME,
};
pub use project::{BranchProject, BuildRecord, BuildResult};
