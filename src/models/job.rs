use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Lifecycle status of a CI job as reported by GitLab
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    /// Queued, waiting for a runner
    Pending,
    /// Waiting for someone to start it by hand
    Manual,
    Running,
    Success,
    Failed,
    /// GitLab spells this `canceled`; `cancelled` is accepted too
    Cancelled,
    /// Any status we don't interpret (created, skipped, ...)
    Other(String),
}

impl JobStatus {
    /// Check if the job will not produce any more log output
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Manual => "manual",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "canceled",
            JobStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => JobStatus::Pending,
            "manual" => JobStatus::Manual,
            "running" => JobStatus::Running,
            "success" => JobStatus::Success,
            "failed" => JobStatus::Failed,
            "canceled" | "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        JobStatus::from(s.to_string())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A CI job within a pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Wall time between start and finish, when both are known
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// A GitLab project, as far as lab needs to know it
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
}

/// Newest pipeline entry from the pipelines listing
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    #[serde(default)]
    pub sha: Option<String>,
}

/// Which job to trace, parsed from `[[branch:]job]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub branch: String,
    /// Empty means "latest running job, else the last one"
    pub job_name: String,
}

impl JobRef {
    pub fn parse(arg: Option<&str>, current_branch: &str) -> Self {
        match arg {
            None => Self {
                branch: current_branch.to_string(),
                job_name: String::new(),
            },
            Some(arg) => match arg.split_once(':') {
                Some((branch, job)) => Self {
                    branch: branch.to_string(),
                    job_name: job.to_string(),
                },
                None => Self {
                    branch: current_branch.to_string(),
                    job_name: arg.to_string(),
                },
            },
        }
    }
}
