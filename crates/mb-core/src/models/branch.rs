use serde::{Deserialize, Serialize};

/// A live branch as reported by a branch source. Read-only input to a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl Branch {
    pub fn new(name: impl Into<String>, revision: Option<String>) -> Self {
        Self {
            name: name.into(),
            revision,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}
