pub mod codec;
pub mod config_loader;
pub mod discovery;
pub mod flavor;
pub mod git;
pub mod layout;
pub mod maven;
pub mod orchestrator;
pub mod reconcile_gate;
pub mod state;
pub mod template;

pub use codec::{StateDocument, TypeRegistry};
pub use discovery::{BranchFilter, BranchSource};
pub use flavor::{BuildClassBinding, ProjectConfig, ProjectFlavor, SubProjectFactory};
pub use git::{GitBranchSource, RepositoryLocation};
pub use layout::ContainerLayout;
pub use maven::{MavenConfig, MavenFlavor};
pub use orchestrator::{
    BranchFailure, BranchProjectOrchestrator, ReconcileOutcome, ReconcileReport, SkippedBranch,
    TriggerCause,
};
pub use state::{JsonFileStore, ProjectStore};
