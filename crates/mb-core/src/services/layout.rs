use std::path::{Path, PathBuf};

use crate::error::{MultiBranchError, Result};
use crate::models::TEMPLATE_NAME;

const BRANCHES_DIR: &str = "branches";
const MAX_DIR_NAME_BYTES: usize = 255;

/// Maps a container's sub-projects onto its root directory:
/// `<root>/template/` for the template, `<root>/branches/<encoded>/` per branch.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    root: PathBuf,
}

impl ContainerLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_dir(&self) -> PathBuf {
        self.root.join(TEMPLATE_NAME)
    }

    pub fn branches_dir(&self) -> PathBuf {
        self.root.join(BRANCHES_DIR)
    }

    pub fn branch_dir(&self, branch_name: &str) -> Result<PathBuf> {
        Ok(self.branches_dir().join(encode_branch_name(branch_name)?))
    }

    /// Directory for any sub-project name, template included.
    pub fn project_dir(&self, name: &str) -> Result<PathBuf> {
        if name == TEMPLATE_NAME {
            Ok(self.template_dir())
        } else {
            self.branch_dir(name)
        }
    }
}

/// Filesystem-safe encoding of a branch name. Everything outside
/// `[A-Za-z0-9._~-]` is percent-encoded, so `feature/login` becomes
/// `feature%2Flogin`.
pub fn encode_branch_name(branch_name: &str) -> Result<String> {
    if branch_name == TEMPLATE_NAME {
        return Err(MultiBranchError::ReservedName(branch_name.to_string()));
    }
    let encoded = urlencoding::encode(branch_name).into_owned();
    let reason = if encoded.is_empty() {
        Some("empty name")
    } else if encoded == "." || encoded == ".." {
        Some("relative path component")
    } else if encoded.len() > MAX_DIR_NAME_BYTES {
        Some("encoded name too long")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(MultiBranchError::UnsafeBranchName {
            name: branch_name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(encoded),
    }
}

/// Inverse of [`encode_branch_name`]. Returns `None` for directory names this
/// layout would never have produced.
pub fn decode_dir_name(dir_name: &str) -> Option<String> {
    let decoded = urlencoding::decode(dir_name).ok()?.into_owned();
    match encode_branch_name(&decoded) {
        Ok(roundtrip) if roundtrip == dir_name => Some(decoded),
        _ => None,
    }
}

/// Key under which two names collide on a case-insensitive filesystem.
pub fn collision_key(branch_name: &str) -> String {
    urlencoding::encode(branch_name).to_ascii_lowercase()
}
