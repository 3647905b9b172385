use std::path::Path;

use async_trait::async_trait;

use crate::error::{MultiBranchError, Result};

use super::codec::StateDocument;

const STATE_FILENAME: &str = "config.json";
const STATE_TMP_FILENAME: &str = "config.json.tmp";

/// Load/save capability for per-directory project state. The orchestrator
/// never looks inside a document beyond the codec envelope.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// `Ok(None)` when the directory holds no persisted state.
    async fn load(&self, dir: &Path) -> Result<Option<StateDocument>>;

    async fn save(&self, dir: &Path, doc: &StateDocument) -> Result<()>;

    /// Names of the child directories of `dir`; empty if `dir` is missing.
    async fn list(&self, dir: &Path) -> Result<Vec<String>>;

    /// Remove `dir` and everything under it. Missing directories are fine.
    async fn remove(&self, dir: &Path) -> Result<()>;
}

/// Stores one pretty-printed `config.json` per directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn load(&self, dir: &Path) -> Result<Option<StateDocument>> {
        let path = dir.join(STATE_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| MultiBranchError::State(format!("failed to read state file: {e}")))?;
        let doc: StateDocument = serde_json::from_str(&json).map_err(|e| {
            MultiBranchError::InvalidState(format!("{}: {e}", path.display()))
        })?;
        Ok(Some(doc))
    }

    async fn save(&self, dir: &Path, doc: &StateDocument) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| MultiBranchError::State(format!("failed to create state dir: {e}")))?;
        let json = serde_json::to_string_pretty(doc)?;
        let tmp_path = dir.join(STATE_TMP_FILENAME);
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| MultiBranchError::State(format!("failed to write state file: {e}")))?;
        tokio::fs::rename(&tmp_path, dir.join(STATE_FILENAME))
            .await
            .map_err(|e| MultiBranchError::State(format!("failed to replace state file: {e}")))?;
        Ok(())
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| MultiBranchError::State(format!("reading {}: {e}", dir.display())))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MultiBranchError::State(format!("reading directory entry: {e}")))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn remove(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }
        tokio::fs::remove_dir_all(dir).await.map_err(|e| {
            MultiBranchError::State(format!("failed to remove {}: {e}", dir.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_doc() -> StateDocument {
        StateDocument {
            type_tag: "maven-branch-project".into(),
            schema_version: 1,
            body: serde_json::json!({ "name": "main", "disabled": false }),
        }
    }

    #[tokio::test]
    async fn round_trip_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new();
        let project_dir = dir.path().join("branches").join("main");

        store.save(&project_dir, &test_doc()).await.unwrap();

        let loaded = store.load(&project_dir).await.unwrap().unwrap();
        assert_eq!(loaded, test_doc());
        assert!(!project_dir.join(STATE_TMP_FILENAME).exists());
    }

    #[tokio::test]
    async fn load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = JsonFileStore.load(dir.path()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(STATE_FILENAME), "{ not json")
            .await
            .unwrap();
        let err = JsonFileStore.load(dir.path()).await.unwrap_err();
        assert!(matches!(err, MultiBranchError::InvalidState(_)));
    }

    #[tokio::test]
    async fn state_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileStore.save(dir.path(), &test_doc()).await.unwrap();

        let json = tokio::fs::read_to_string(dir.path().join(STATE_FILENAME))
            .await
            .unwrap();
        assert!(json.contains("\"schemaVersion\""));
        assert!(json.contains("\"type\""));
        assert!(!json.contains("\"schema_version\""));
    }

    #[tokio::test]
    async fn list_returns_sorted_child_dirs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["main", "feature%2Fx", "dev"] {
            tokio::fs::create_dir_all(dir.path().join(name)).await.unwrap();
        }
        tokio::fs::write(dir.path().join("stray.txt"), "").await.unwrap();

        let names = JsonFileStore.list(dir.path()).await.unwrap();
        assert_eq!(names, vec!["dev", "feature%2Fx", "main"]);

        let missing = JsonFileStore.list(&dir.path().join("nope")).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn remove_deletes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("branches").join("dev");
        JsonFileStore.save(&project_dir, &test_doc()).await.unwrap();

        JsonFileStore.remove(&project_dir).await.unwrap();
        assert!(!project_dir.exists());
        JsonFileStore.remove(&project_dir).await.unwrap();
    }
}
