use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{MultiBranchError, Result};
use crate::models::{Branch, ContainerInfo};

use super::discovery::BranchSource;

/// Run `git <args>`, optionally inside `working_directory`, and return its
/// stdout with surrounding whitespace trimmed. A non-zero exit becomes
/// [`MultiBranchError::Git`] carrying git's stderr.
async fn run_git(args: &[&str], working_directory: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = working_directory {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .await
        .map_err(|e| MultiBranchError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        return Err(MultiBranchError::Git(format!(
            "git {} failed (exit {}): {}",
            args.first().copied().unwrap_or_default(),
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Where a container's branches come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    /// A clone on this machine.
    Local(PathBuf),
    /// A URL git can reach without a clone.
    Remote(String),
}

impl RepositoryLocation {
    /// `scheme://...` and scp-style `user@host:path` are remote; anything
    /// else is a path, resolved against `root` when relative.
    pub fn resolve(root: &Path, repository: &str) -> Self {
        if is_remote_url(repository) {
            Self::Remote(repository.to_string())
        } else {
            Self::Local(root.join(repository))
        }
    }
}

fn is_remote_url(repository: &str) -> bool {
    if repository.contains("://") {
        return true;
    }
    match repository.split_once(':') {
        Some((host, _)) => host.contains('@') && !host.contains('/'),
        None => false,
    }
}

/// Reads branches with git.
///
/// A local clone is listed with `git for-each-ref`: with a remote configured
/// the remote is fetched first and its tracking refs are listed, otherwise
/// local heads are. A URL is listed with `git ls-remote --heads`.
#[derive(Debug, Clone)]
pub struct GitBranchSource {
    location: RepositoryLocation,
    remote: Option<String>,
}

impl GitBranchSource {
    pub fn new(location: RepositoryLocation, remote: Option<String>) -> Self {
        Self { location, remote }
    }

    pub fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    fn ref_prefix(&self) -> String {
        match &self.remote {
            Some(remote) => format!("refs/remotes/{remote}"),
            None => "refs/heads".to_string(),
        }
    }

    async fn list_clone(&self, repo_path: &Path) -> Result<Vec<Branch>> {
        if let Some(remote) = &self.remote {
            run_git(&["fetch", "--prune", remote.as_str()], Some(repo_path)).await?;
        }
        let prefix = self.ref_prefix();
        let output = run_git(
            &[
                "for-each-ref",
                "--format=%(refname:short)%09%(objectname)",
                prefix.as_str(),
            ],
            Some(repo_path),
        )
        .await?;
        Ok(parse_ref_listing(&output, self.remote.as_deref()))
    }
}

#[async_trait]
impl BranchSource for GitBranchSource {
    async fn list_branches(&self, container: &ContainerInfo) -> Result<Vec<Branch>> {
        let listed = match &self.location {
            RepositoryLocation::Local(path) => self.list_clone(path).await,
            RepositoryLocation::Remote(url) => {
                let output = run_git(&["ls-remote", "--heads", url.as_str()], None).await;
                output.map(|output| parse_ls_remote(&output))
            }
        };
        let branches = listed.map_err(|e| MultiBranchError::Discovery(e.to_string()))?;
        tracing::debug!(
            container = %container.name,
            count = branches.len(),
            "git_branches_listed"
        );
        Ok(branches)
    }
}

/// Parse `git ls-remote --heads` output: `<sha>\trefs/heads/<name>` lines.
pub fn parse_ls_remote(output: &str) -> Vec<Branch> {
    let mut seen = HashSet::new();
    let mut branches = Vec::new();
    for line in output.lines() {
        let Some((sha, refname)) = line.trim().split_once('\t') else {
            continue;
        };
        let Some(name) = refname.trim().strip_prefix("refs/heads/") else {
            continue;
        };
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }
        let sha = sha.trim();
        branches.push(Branch::new(
            name,
            (!sha.is_empty()).then(|| sha.to_string()),
        ));
    }
    branches
}

/// Parse `<short-ref>\t<sha>` lines. Remote prefixes are stripped, symbolic
/// `HEAD` refs dropped, and duplicates keep their first occurrence.
pub fn parse_ref_listing(output: &str, remote: Option<&str>) -> Vec<Branch> {
    let mut seen = HashSet::new();
    let mut branches = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (refname, sha) = match line.split_once('\t') {
            Some((refname, sha)) => (refname.trim(), Some(sha.trim())),
            None => (line, None),
        };
        let name = match remote {
            Some(remote) if refname == remote => continue,
            Some(remote) => refname
                .strip_prefix(remote)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(refname),
            None => refname,
        };
        if name == "HEAD" || name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            branches.push(Branch::new(
                name,
                sha.filter(|s| !s.is_empty()).map(String::from),
            ));
        }
    }
    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_heads() {
        let output = "dev\tabc123\nfeature/login\tdef456\nmain\t0011ff\n";
        let branches = parse_ref_listing(output, None);
        assert_eq!(branches.len(), 3);
        assert_eq!(branches[1].name, "feature/login");
        assert_eq!(branches[1].revision.as_deref(), Some("def456"));
    }

    #[test]
    fn strips_remote_prefix_and_head() {
        let output = "origin\t999\norigin/HEAD\t111\norigin/main\t111\norigin/release/1.x\t222";
        let branches = parse_ref_listing(output, Some("origin"));
        let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["main", "release/1.x"]);
    }

    #[test]
    fn duplicate_refs_keep_first() {
        let output = "main\taaa\nmain\tbbb";
        let branches = parse_ref_listing(output, None);
        assert_eq!(branches, vec![Branch::new("main", Some("aaa".into()))]);
    }

    #[test]
    fn missing_sha_is_tolerated() {
        let branches = parse_ref_listing("main\n", None);
        assert_eq!(branches, vec![Branch::named("main")]);
    }

    #[test]
    fn parses_ls_remote_heads() {
        let output = "abc123\trefs/heads/main\n\
                      def456\trefs/heads/feature/login\n\
                      999999\trefs/tags/v1.0\n";
        let branches = parse_ls_remote(output);
        assert_eq!(
            branches,
            vec![
                Branch::new("main", Some("abc123".into())),
                Branch::new("feature/login", Some("def456".into())),
            ]
        );
    }

    #[test]
    fn urls_are_kept_and_paths_resolved() {
        let root = Path::new("/jobs/app");
        for url in [
            "https://git.example.com/app.git",
            "ssh://git@git.example.com/app.git",
            "file:///srv/git/app.git",
            "git@git.example.com:team/app.git",
        ] {
            assert_eq!(
                RepositoryLocation::resolve(root, url),
                RepositoryLocation::Remote(url.to_string())
            );
        }
        assert_eq!(
            RepositoryLocation::resolve(root, "repo.git"),
            RepositoryLocation::Local(PathBuf::from("/jobs/app/repo.git"))
        );
        assert_eq!(
            RepositoryLocation::resolve(root, "/srv/git/app.git"),
            RepositoryLocation::Local(PathBuf::from("/srv/git/app.git"))
        );
        assert_eq!(
            RepositoryLocation::resolve(root, "clones/with:colon"),
            RepositoryLocation::Local(PathBuf::from("/jobs/app/clones/with:colon"))
        );
    }

    #[tokio::test]
    async fn git_in_a_missing_directory_is_a_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = run_git(&["for-each-ref"], Some(&missing)).await.unwrap_err();
        assert!(matches!(err, MultiBranchError::Git(_)));
    }
}
