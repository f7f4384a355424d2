// Parallel plan compilation for a queue of job files

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info};
use uuid::Uuid;

use super::core::{InvocationPlan, JobFile, build_plans};

/// A loaded job waiting to be compiled
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: Uuid,
    pub path: PathBuf,
    pub job: JobFile,
}

impl QueuedJob {
    pub fn new(path: PathBuf, job: JobFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            job,
        }
    }
}

/// Result of compiling one queued job
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub job_id: Uuid,
    pub job_path: PathBuf,
    pub plans: Vec<InvocationPlan>,
    /// Rejection reason; `plans` is empty when set
    pub error: Option<String>,
}

impl BatchReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Compile every job on at most `max_workers` threads.
///
/// Reports come back in queue order regardless of which worker finished first.
pub fn compile_batch(jobs: &[QueuedJob], null_sink: &str, max_workers: usize) -> Vec<BatchReport> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let workers = max_workers.clamp(1, jobs.len());
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    info!(jobs = jobs.len(), workers, "compiling batch");

    thread::scope(|scope| {
        for worker_id in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(queued) = jobs.get(index) else {
                        break;
                    };
                    debug!(worker_id, job_id = %queued.id, path = %queued.path.display(), "compiling job");
                    let _ = tx.send((index, compile_one(queued, null_sink)));
                }
            });
        }
    });
    drop(tx);

    let mut reports: Vec<(usize, BatchReport)> = rx.into_iter().collect();
    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}

fn compile_one(queued: &QueuedJob, null_sink: &str) -> BatchReport {
    let (plans, error) = match build_plans(
        &queued.job.options,
        queued.job.side_data.as_ref(),
        null_sink,
    ) {
        Ok(plans) => (plans, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    BatchReport {
        job_id: queued.id,
        job_path: queued.path.clone(),
        plans,
        error,
    }
}
