//! Poll stage: wait for the service to finish an OCR job.
//!
//! The service offers no push notification, so the job's status is checked
//! at a fixed interval (500 ms by default, no backoff) until it reports
//! `percent_done == 100`.
//!
//! By default the loop is unbounded. [`PollPolicy`] can cap it by wall-clock
//! time, by number of status checks, or both; the deadline also bounds a
//! status request that hangs.

use crate::config::PollPolicy;
use crate::error::OcrError;
use crate::job::{Job, JobId};
use crate::transport::Transport;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info};

/// Status endpoint for a job.
pub fn status_endpoint(job_id: &JobId) -> String {
    format!("pdf/{job_id}")
}

/// Block until `job_id` is complete, calling `on_progress` after every check.
///
/// Each iteration sleeps first, then queries `pdf/{id}`. Returns the first
/// record with 100 % done.
///
/// # Errors
/// * [`OcrError::Remote`] — status request answered with non-200
/// * [`OcrError::Protocol`] — status body is not a job record
/// * [`OcrError::JobFailed`] — the service reports status `error`
/// * [`OcrError::PollTimeout`] — a bound in `policy` was reached
pub async fn wait_for_completion<F>(
    transport: &dyn Transport,
    job_id: &JobId,
    policy: &PollPolicy,
    mut on_progress: F,
) -> Result<Job, OcrError>
where
    F: FnMut(f64),
{
    let endpoint = status_endpoint(job_id);
    let start = Instant::now();
    let deadline = policy.timeout.map(|t| start + t);
    let mut attempts = 0u32;
    let mut last_percent = 0.0;

    loop {
        let check = async {
            sleep(policy.interval).await;
            fetch_status(transport, &endpoint).await
        };
        let job = match deadline {
            Some(deadline) => match timeout_at(deadline, check).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(timed_out(job_id, attempts, start, last_percent));
                }
            },
            None => check.await?,
        };
        attempts += 1;
        last_percent = job.percent_done;

        debug!(
            "Job {}: {} ({}/{} pages, {:.02}%)",
            job_id, job.status, job.completed_pages, job.total_pages, job.percent_done
        );
        on_progress(job.percent_done);

        if job.is_failed() {
            return Err(OcrError::JobFailed {
                job_id: job_id.to_string(),
                status: job.status,
            });
        }
        if job.is_complete() {
            info!(
                "Job {} complete after {} checks ({} pages)",
                job_id, attempts, job.total_pages
            );
            return Ok(job);
        }
        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(timed_out(job_id, attempts, start, last_percent));
        }
    }
}

async fn fetch_status(transport: &dyn Transport, endpoint: &str) -> Result<Job, OcrError> {
    transport
        .get(endpoint)
        .await?
        .into_success(endpoint)?
        .json(endpoint)
        .await
}

fn timed_out(job_id: &JobId, attempts: u32, start: Instant, percent_done: f64) -> OcrError {
    OcrError::PollTimeout {
        job_id: job_id.to_string(),
        attempts,
        elapsed_ms: start.elapsed().as_millis() as u64,
        percent_done,
    }
}
