use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

pub const GIT_MARKER_DIR: &str = ".git";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Repository path not configured (set ZONE_GPT_REPO_PATH)")]
    NotConfigured,

    #[error("Invalid git repository path")]
    InvalidRepository(PathBuf),

    #[error("Git command timed out")]
    TimedOut(Duration),

    #[error("Failed to get commit SHA: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] std::io::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitInfo {
    pub status: String,
    pub commit_sha: String,
}

pub fn validate_git_repo(repo_root: &Path) -> bool {
    repo_root.join(GIT_MARKER_DIR).is_dir()
}

/// External command that prints the current revision id on stdout.
#[derive(Clone, Debug)]
pub struct RevisionProbe {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl RevisionProbe {
    /// `<program> rev-parse HEAD`
    pub fn git(program: impl Into<String>, timeout: Duration) -> Self {
        Self::new(program, ["rev-parse", "HEAD"], timeout)
    }

    pub fn new<I, S>(program: impl Into<String>, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// Reads the revision of `repo_root`. Nothing in the repository is modified.
    pub async fn current_revision(&self, repo_root: Option<&Path>) -> Result<CommitInfo, RepositoryError> {
        let repo_root = repo_root.ok_or(RepositoryError::NotConfigured)?;
        if !validate_git_repo(repo_root) {
            return Err(RepositoryError::InvalidRepository(repo_root.to_path_buf()));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // dropping the pending future on timeout kills the child
        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| RepositoryError::TimedOut(self.timeout))??;

        if !output.status.success() {
            return Err(RepositoryError::CommandFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(CommitInfo {
            status: "ok".to_string(),
            commit_sha: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn fake_repo() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        tmp
    }

    fn sh(script: &str, timeout: Duration) -> RevisionProbe {
        RevisionProbe::new("sh", ["-c", script], timeout)
    }

    #[tokio::test]
    async fn test_returns_trimmed_stdout() {
        let repo = fake_repo();
        let probe = sh("printf '  3f2a9c1e\\n\\n'", Duration::from_secs(5));

        let info = probe.current_revision(Some(repo.path())).await.unwrap();
        assert_eq!(info, CommitInfo { status: "ok".into(), commit_sha: "3f2a9c1e".into() });
    }

    #[tokio::test]
    async fn test_runs_inside_repo_root() {
        let repo = fake_repo();
        let probe = sh("basename \"$PWD\"", Duration::from_secs(5));

        let info = probe.current_revision(Some(repo.path())).await.unwrap();
        let expected = repo.path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(info.commit_sha, expected);
    }

    #[tokio::test]
    async fn test_unconfigured_root() {
        let probe = sh("echo x", Duration::from_secs(5));
        let err = probe.current_revision(None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotConfigured));
    }

    #[tokio::test]
    async fn test_missing_marker_dir() {
        let tmp = TempDir::new().unwrap();
        let probe = sh("echo x", Duration::from_secs(5));

        let err = probe.current_revision(Some(tmp.path())).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRepository(_)));
        assert_eq!(err.to_string(), "Invalid git repository path");
    }

    #[test]
    fn test_marker_must_be_a_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".git"), "gitdir: elsewhere").unwrap();
        assert!(!validate_git_repo(tmp.path()));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let repo = fake_repo();
        let probe = sh("echo 'fatal: ambiguous HEAD' >&2; exit 128", Duration::from_secs(5));

        let err = probe.current_revision(Some(repo.path())).await.unwrap_err();
        match &err {
            RepositoryError::CommandFailed { code, stderr } => {
                assert_eq!(*code, Some(128));
                assert_eq!(stderr, "fatal: ambiguous HEAD");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Failed to get commit SHA: fatal: ambiguous HEAD");
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let repo = fake_repo();
        let probe = sh("sleep 10", Duration::from_millis(200));

        let started = Instant::now();
        let err = probe.current_revision(Some(repo.path())).await.unwrap_err();

        assert!(matches!(err, RepositoryError::TimedOut(_)));
        assert_eq!(err.to_string(), "Git command timed out");
        assert!(started.elapsed() < Duration::from_secs(5), "should not wait for the child");
    }

    #[tokio::test]
    async fn test_missing_program_is_unexpected() {
        let repo = fake_repo();
        let probe = RevisionProbe::git("definitely-not-a-real-vcs-binary", Duration::from_secs(5));

        let err = probe.current_revision(Some(repo.path())).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Unexpected(_)));
        assert!(err.to_string().starts_with("Unexpected error: "));
    }
}
