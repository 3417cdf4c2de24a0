use regex::Regex;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::error::GitError;

/// Remote used when git config names none for the branch
pub const DEFAULT_REMOTE: &str = "origin";

/// Local repository queries needed to find the GitLab project
pub trait RemoteResolver {
    /// Name of the checked-out branch
    fn current_branch(&self) -> Result<String, GitError>;

    /// Whether `name` is a configured remote
    fn is_remote(&self, name: &str) -> Result<bool, GitError>;

    /// `namespace/project` path of the remote's URL
    fn path_with_namespace(&self, remote: &str) -> Result<String, GitError>;

    /// A single git config value, `None` when unset
    fn config_value(&self, key: &str) -> Result<Option<String>, GitError>;
}

/// Pick the remote a branch pushes to.
///
/// Follows git's own precedence: `branch.<name>.pushRemote`, then
/// `remote.pushDefault`, then `branch.<name>.remote`. Lookup failures fall
/// through to the next key and finally to `origin`.
pub fn determine_source_remote<R: RemoteResolver + ?Sized>(resolver: &R, branch: &str) -> String {
    let keys = [
        format!("branch.{}.pushRemote", branch),
        "remote.pushDefault".to_string(),
        format!("branch.{}.remote", branch),
    ];

    for key in &keys {
        match resolver.config_value(key) {
            Ok(Some(remote)) if !remote.is_empty() => {
                debug!("Using remote '{}' from {}", remote, key);
                return remote;
            }
            Ok(_) => {}
            Err(e) => debug!("Could not read {}: {}", key, e),
        }
    }

    DEFAULT_REMOTE.to_string()
}

/// Extract `namespace/project` from a git remote URL
pub fn parse_path_with_namespace(url: &str) -> Result<String, GitError> {
    let url = url.trim();
    let scheme_re =
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^/]+/(?P<path>.+?)(?:\.git)?/?$").unwrap();
    let scp_re = Regex::new(r"^(?:[^@/]+@)?[^:/]+:(?P<path>.+?)(?:\.git)?/?$").unwrap();

    let caps = if url.contains("://") {
        scheme_re.captures(url)
    } else {
        scp_re.captures(url)
    };

    let path = caps
        .and_then(|c| c.name("path"))
        .map(|m| m.as_str().trim_start_matches('/'))
        .unwrap_or("");

    if path.contains('/') {
        Ok(path.to_string())
    } else {
        Err(GitError::UnsupportedRemoteUrl(url.to_string()))
    }
}

/// `RemoteResolver` backed by the `git` binary
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }

    /// Run git and return its trimmed stdout
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(Self::failure(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn output(&self, args: &[&str]) -> Result<std::process::Output, GitError> {
        debug!("git {}", args.join(" "));
        Ok(Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()?)
    }

    fn failure(args: &[&str], output: &std::process::Output) -> GitError {
        GitError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl RemoteResolver for Git {
    fn current_branch(&self) -> Result<String, GitError> {
        let branch = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch == "HEAD" {
            return Err(GitError::DetachedHead);
        }
        Ok(branch)
    }

    fn is_remote(&self, name: &str) -> Result<bool, GitError> {
        let remotes = self.run(&["remote"])?;
        Ok(remotes.lines().any(|r| r.trim() == name))
    }

    fn path_with_namespace(&self, remote: &str) -> Result<String, GitError> {
        let url = self.run(&["remote", "get-url", remote])?;
        parse_path_with_namespace(&url)
    }

    fn config_value(&self, key: &str) -> Result<Option<String>, GitError> {
        let args = ["config", "--get", key];
        let output = self.output(&args)?;
        // `git config --get` exits 1 when the key is unset
        match output.status.code() {
            Some(0) => Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(Self::failure(&args, &output)),
        }
    }
}
