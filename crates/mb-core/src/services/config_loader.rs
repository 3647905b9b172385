use std::path::Path;

use crate::error::{MultiBranchError, Result};
use crate::models::MultiBranchConfig;

use super::discovery::BranchFilter;

pub const CONFIG_FILENAME: &str = ".multibranch.yaml";

pub fn load(container_root: &Path) -> Result<MultiBranchConfig> {
    let config_path = container_root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Err(MultiBranchError::ConfigNotFound(config_path));
    }
    let contents = std::fs::read_to_string(&config_path)?;
    let config: MultiBranchConfig = serde_yaml::from_str(&contents)
        .map_err(|e| MultiBranchError::InvalidConfig(e.to_string()))?;
    if config.flavor.is_empty() {
        return Err(MultiBranchError::InvalidConfig(
            "flavor field is required".into(),
        ));
    }
    if config.repository.is_empty() {
        return Err(MultiBranchError::InvalidConfig(
            "repository field is required".into(),
        ));
    }
    if config.poll_interval_secs == Some(0) {
        return Err(MultiBranchError::InvalidConfig(
            "poll_interval_secs must be positive".into(),
        ));
    }
    // Surface bad patterns at load time rather than on the first cycle.
    BranchFilter::from_config(&config.branches)?;
    Ok(config)
}
