use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tracing::debug;

use crate::error::GitLabError;
use crate::models::{GitLabConfig, Job, JobStatus, Pipeline, Project};

/// Raw trace body, chunk by chunk
pub type TraceStream = BoxStream<'static, std::io::Result<Vec<u8>>>;

const JOBS_PER_PAGE: &str = "100";

/// The selected job and its full log so far
pub struct CiTrace {
    pub job: Job,
    pub trace: TraceStream,
}

/// Looks up a project from its `namespace/project` path
#[allow(async_fn_in_trait)]
pub trait ProjectLocator {
    async fn find_project(&self, path: &str) -> Result<Project, GitLabError>;
}

/// Finds a job on a branch and opens its trace.
///
/// An empty `job_name` selects the latest running job of the newest
/// pipeline, else that pipeline's last job.
#[allow(async_fn_in_trait)]
pub trait CiTraceSource {
    async fn ci_trace(
        &self,
        project_id: u64,
        branch: &str,
        job_name: &str,
    ) -> Result<CiTrace, GitLabError>;
}

/// Pick the job to trace from a pipeline's jobs, ordered oldest first.
///
/// The newest job named `name` wins (retries reuse the name). Otherwise
/// the newest running job, otherwise the last job.
pub fn select_job<'a>(jobs: &'a [Job], name: &str) -> Option<&'a Job> {
    let by_name = if name.is_empty() {
        None
    } else {
        jobs.iter().rev().find(|j| j.name == name)
    };

    by_name
        .or_else(|| jobs.iter().rev().find(|j| j.status == JobStatus::Running))
        .or_else(|| jobs.last())
}

/// GitLab REST v4 client
pub struct GitLabClient {
    client: Client,
    config: GitLabConfig,
    api_base: Url,
}

impl GitLabClient {
    /// Create a new GitLab client with the given configuration
    pub fn new(config: GitLabConfig) -> Result<Self, GitLabError> {
        let api_base = Url::parse(&config.host)
            .map_err(|e| GitLabError::InvalidHost(format!("{}: {}", config.host, e)))?;
        if api_base.cannot_be_a_base() {
            return Err(GitLabError::InvalidHost(config.host.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GitLabError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config, api_base })
    }

    /// Build `{host}/api/v4/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitLabError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| GitLabError::InvalidHost(self.config.host.clone()))?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<Response, GitLabError> {
        debug!("GET {}", url);

        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.config.token {
            request = request.header("PRIVATE-TOKEN", token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                GitLabError::ConnectionRefused(format!(
                    "Could not connect to GitLab at {}",
                    self.config.host
                ))
            } else if e.is_timeout() {
                GitLabError::Timeout(self.config.timeout_seconds)
            } else {
                GitLabError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GitLabError::HttpError { status, message });
        }

        Ok(response)
    }

    /// Newest pipeline for a branch
    pub async fn latest_pipeline(
        &self,
        project_id: u64,
        branch: &str,
    ) -> Result<Pipeline, GitLabError> {
        let id = project_id.to_string();
        let url = self.endpoint(&["projects", &id, "pipelines"])?;
        let pipelines: Vec<Pipeline> = self
            .get(
                url,
                &[("ref", branch), ("order_by", "id"), ("sort", "desc"), ("per_page", "1")],
            )
            .await?
            .json()
            .await
            .map_err(|e| GitLabError::ParseError(e.to_string()))?;

        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| GitLabError::NoPipeline(branch.to_string()))
    }

    /// All jobs of a pipeline, oldest first
    pub async fn pipeline_jobs(
        &self,
        project_id: u64,
        pipeline_id: u64,
    ) -> Result<Vec<Job>, GitLabError> {
        let id = project_id.to_string();
        let pipeline = pipeline_id.to_string();
        let mut jobs = Vec::new();
        let mut page = "1".to_string();

        loop {
            let url = self.endpoint(&["projects", &id, "pipelines", &pipeline, "jobs"])?;
            let response = self
                .get(url, &[("per_page", JOBS_PER_PAGE), ("page", page.as_str())])
                .await?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            let batch: Vec<Job> = response
                .json()
                .await
                .map_err(|e| GitLabError::ParseError(e.to_string()))?;
            jobs.extend(batch);

            match next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        jobs.sort_by_key(|j| j.id);
        debug!("Pipeline #{} has {} jobs", pipeline_id, jobs.len());
        Ok(jobs)
    }

    /// Open a job's trace as a byte stream
    pub async fn job_trace(
        &self,
        project_id: u64,
        job_id: u64,
    ) -> Result<TraceStream, GitLabError> {
        let id = project_id.to_string();
        let job = job_id.to_string();
        let url = self.endpoint(&["projects", &id, "jobs", &job, "trace"])?;
        let response = self.get(url, &[]).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(std::io::Error::other))
            .boxed())
    }
}

impl ProjectLocator for GitLabClient {
    async fn find_project(&self, path: &str) -> Result<Project, GitLabError> {
        let url = self.endpoint(&["projects", path])?;
        let project: Project = self
            .get(url, &[])
            .await?
            .json()
            .await
            .map_err(|e| GitLabError::ParseError(e.to_string()))?;

        debug!("Found project {} (#{})", project.path_with_namespace, project.id);
        Ok(project)
    }
}

impl CiTraceSource for GitLabClient {
    async fn ci_trace(
        &self,
        project_id: u64,
        branch: &str,
        job_name: &str,
    ) -> Result<CiTrace, GitLabError> {
        let pipeline = self.latest_pipeline(project_id, branch).await?;
        debug!(
            "Pipeline #{} on {} at {}",
            pipeline.id,
            branch,
            pipeline.sha.as_deref().unwrap_or("unknown sha")
        );
        let jobs = self.pipeline_jobs(project_id, pipeline.id).await?;
        let job = select_job(&jobs, job_name)
            .cloned()
            .ok_or(GitLabError::NoJobs(pipeline.id))?;

        debug!(
            "Selected job {} #{} [{}] in stage {} of {}",
            job.name,
            job.id,
            job.status,
            job.stage.as_deref().unwrap_or("-"),
            job.git_ref.as_deref().unwrap_or(branch)
        );
        let trace = self.job_trace(project_id, job.id).await?;
        Ok(CiTrace { job, trace })
    }
}
