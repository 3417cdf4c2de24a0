use futures::StreamExt;
use std::io::Write;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::{CiTrace, CiTraceSource};
use crate::error::LabError;
use crate::models::JobStatus;

/// Bytes of the cumulative trace already written out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraceCursor {
    offset: usize,
}

impl TraceCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the part of `full` not yet written and move past it.
    ///
    /// A trace shorter than the offset yields nothing and leaves the
    /// offset where it is.
    pub fn advance<'a>(&mut self, full: &'a [u8]) -> &'a [u8] {
        let new = full.get(self.offset..).unwrap_or(&[]);
        self.offset += new.len();
        new
    }
}

/// How a trace session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The job reached success, failed or cancelled
    Finished(JobStatus),
    /// The job waits for a manual start, nothing to show
    ManualJob,
}

/// Poll a job's trace and write new log output until the job finishes.
///
/// The first poll happens after one full `poll_interval`. Every poll
/// fetches the whole log; only bytes past the cursor reach `out`.
pub async fn stream_trace<W, S>(
    out: &mut W,
    source: &S,
    project_id: u64,
    branch: &str,
    job_name: &str,
    poll_interval: Duration,
) -> Result<TraceOutcome, LabError>
where
    W: Write,
    S: CiTraceSource + ?Sized,
{
    let period = poll_interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut name = job_name.to_string();
    let mut cursor = TraceCursor::new();
    let mut banner_shown = false;

    loop {
        ticker.tick().await;

        let CiTrace { job, mut trace } = source
            .ci_trace(project_id, branch, &name)
            .await
            .map_err(LabError::JobNotFound)?;

        match job.status {
            JobStatus::Pending => {
                writeln!(out, "{} is pending...", job.name)?;
                out.flush()?;
                continue;
            }
            JobStatus::Manual => {
                writeln!(out, "Manual job {} not started", job.name)?;
                out.flush()?;
                return Ok(TraceOutcome::ManualJob);
            }
            _ => {}
        }

        if !banner_shown {
            if name.is_empty() {
                name = job.name.clone();
            }
            writeln!(out, "Showing logs for {} job #{}", job.name, job.id)?;
            banner_shown = true;
        }

        let mut full = Vec::new();
        while let Some(chunk) = trace.next().await {
            full.extend_from_slice(&chunk.map_err(LabError::TraceRead)?);
        }

        let new = cursor.advance(&full);
        debug!("Trace is {} bytes, {} new", full.len(), new.len());
        out.write_all(new)?;
        out.flush()?;

        if job.status.is_terminal() {
            match job.duration() {
                Some(d) => info!(
                    "Job {} #{} {} after {}s",
                    job.name,
                    job.id,
                    job.status,
                    d.num_seconds()
                ),
                None => info!("Job {} #{} {}", job.name, job.id, job.status),
            }
            return Ok(TraceOutcome::Finished(job.status));
        }
    }
}
