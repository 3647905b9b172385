use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MultiBranchConfig {
    pub flavor: String,
    pub repository: String,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub branches: BranchFilterConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchFilterConfig {
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub exclude: Option<String>,
}

impl MultiBranchConfig {
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
            .unwrap_or(Self::DEFAULT_POLL_INTERVAL_SECS)
    }
}
