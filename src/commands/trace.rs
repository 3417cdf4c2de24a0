use std::io;
use std::path::Path;
use tracing::{debug, info};

use crate::core::{
    determine_source_remote, load_config, stream_trace, GitLabClient, Git, ProjectLocator,
    RemoteResolver, TraceOutcome,
};
use crate::error::LabError;
use crate::models::JobRef;

/// Positional arguments of `ci trace`
#[derive(Debug, Default, Clone)]
pub struct TraceOptions {
    /// Remote to resolve the project from (defaults to the branch's push remote)
    pub remote: Option<String>,
    /// `[branch:]job`
    pub job: Option<String>,
}

/// Everything resolved locally before talking to GitLab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceTarget {
    pub remote: String,
    pub project_path: String,
    pub job_ref: JobRef,
}

/// Resolve branch, job and remote from the repository.
///
/// A remote given on the command line must exist, checked before any
/// network call.
pub fn resolve_target<R: RemoteResolver + ?Sized>(
    resolver: &R,
    remote: Option<&str>,
    job: Option<&str>,
) -> Result<TraceTarget, LabError> {
    let current_branch = resolver.current_branch()?;
    let job_ref = JobRef::parse(job, &current_branch);

    let remote = match remote {
        Some(name) => {
            if !resolver.is_remote(name)? {
                return Err(LabError::NotARemote { name: name.to_string() });
            }
            name.to_string()
        }
        None => determine_source_remote(resolver, &job_ref.branch),
    };

    let project_path = resolver.path_with_namespace(&remote)?;
    debug!("Remote {} -> {}", remote, project_path);

    Ok(TraceTarget {
        remote,
        project_path,
        job_ref,
    })
}

/// Trace the output of a CI job
pub async fn trace_job(project_root: &Path, options: TraceOptions) -> Result<(), LabError> {
    let config = load_config(project_root)?;
    let git = Git::new(project_root.to_path_buf());
    let target = resolve_target(&git, options.remote.as_deref(), options.job.as_deref())?;

    let gitlab = GitLabClient::new(config.gitlab.clone())?;
    let project = gitlab.find_project(&target.project_path).await?;

    let job_label = if target.job_ref.job_name.is_empty() {
        "latest job"
    } else {
        target.job_ref.job_name.as_str()
    };
    info!(
        "Tracing {} on {} in {}",
        job_label,
        target.job_ref.branch,
        project.path_with_namespace
    );

    let mut out = io::stdout();
    let outcome = stream_trace(
        &mut out,
        &gitlab,
        project.id,
        &target.job_ref.branch,
        &target.job_ref.job_name,
        config.trace.poll_interval(),
    )
    .await?;

    if let TraceOutcome::Finished(status) = outcome {
        debug!("Trace finished with status {}", status);
    }

    Ok(())
}
