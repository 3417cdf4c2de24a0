//! Common test utilities

#![allow(dead_code)]

use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

use lab_trace::core::{CiTrace, CiTraceSource, RemoteResolver};
use lab_trace::error::{GitError, GitLabError};
use lab_trace::models::{Job, JobStatus};

/// One scripted answer from the fake trace source
pub enum Poll {
    Job {
        name: String,
        id: u64,
        status: JobStatus,
        chunks: Vec<io::Result<Vec<u8>>>,
    },
    Missing(GitLabError),
}

/// Cumulative trace snapshot for a job
pub fn poll(name: &str, id: u64, status: &str, trace: &str) -> Poll {
    Poll::Job {
        name: name.to_string(),
        id,
        status: JobStatus::from(status),
        chunks: vec![Ok(trace.as_bytes().to_vec())],
    }
}

/// Snapshot whose body fails part way through
pub fn poll_broken(name: &str, id: u64, status: &str) -> Poll {
    Poll::Job {
        name: name.to_string(),
        id,
        status: JobStatus::from(status),
        chunks: vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ],
    }
}

/// `CiTraceSource` answering from a script, recording every request
#[derive(Default)]
pub struct ScriptedTraceSource {
    polls: Mutex<VecDeque<Poll>>,
    requests: Mutex<Vec<(u64, String, String)>>,
}

impl ScriptedTraceSource {
    pub fn new(polls: Vec<Poll>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(u64, String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.polls.lock().unwrap().len()
    }
}

impl CiTraceSource for ScriptedTraceSource {
    async fn ci_trace(
        &self,
        project_id: u64,
        branch: &str,
        job_name: &str,
    ) -> Result<CiTrace, GitLabError> {
        self.requests
            .lock()
            .unwrap()
            .push((project_id, branch.to_string(), job_name.to_string()));

        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(Poll::Job { name, id, status, chunks }) => Ok(CiTrace {
                job: Job {
                    id,
                    name,
                    status,
                    stage: Some("test".to_string()),
                    git_ref: Some(branch.to_string()),
                    started_at: None,
                    finished_at: None,
                },
                trace: futures::stream::iter(chunks).boxed(),
            }),
            Some(Poll::Missing(e)) => Err(e),
            None => panic!("trace source polled after the script ended"),
        }
    }
}

/// In-memory repository: current branch, remotes with URLs, git config
pub struct FakeRepo {
    pub branch: Result<String, ()>,
    pub remotes: HashMap<String, String>,
    pub config: HashMap<String, String>,
}

impl FakeRepo {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            branch: Ok(branch.to_string()),
            remotes: HashMap::new(),
            config: HashMap::new(),
        }
    }

    pub fn detached() -> Self {
        Self {
            branch: Err(()),
            ..Self::on_branch("")
        }
    }

    pub fn with_remote(mut self, name: &str, url: &str) -> Self {
        self.remotes.insert(name.to_string(), url.to_string());
        self
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }
}

impl RemoteResolver for FakeRepo {
    fn current_branch(&self) -> Result<String, GitError> {
        self.branch.clone().map_err(|_| GitError::DetachedHead)
    }

    fn is_remote(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.remotes.contains_key(name))
    }

    fn path_with_namespace(&self, remote: &str) -> Result<String, GitError> {
        match self.remotes.get(remote) {
            Some(url) => lab_trace::core::parse_path_with_namespace(url),
            None => Err(GitError::CommandFailed {
                command: format!("git remote get-url {}", remote),
                stderr: format!("error: No such remote '{}'", remote),
            }),
        }
    }

    fn config_value(&self, key: &str) -> Result<Option<String>, GitError> {
        Ok(self.config.get(key).cloned())
    }
}
