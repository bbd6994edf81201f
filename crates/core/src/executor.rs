//! Bounded-concurrency execution of subset jobs.

use std::time::{Duration, Instant};

use cjk_subset_font_subsetter::{SubsetError, Subsetter};
use rayon::{ThreadPoolBuilder, prelude::*};

use crate::{Result, error::JobFailure, plan::SubsetJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Maximum subset jobs in flight. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Regenerate files that already exist.
    pub overwrite: bool,
}

#[derive(Debug)]
pub enum JobStatus {
    Generated { elapsed: Duration },
    /// Output already existed and `overwrite` was off.
    Reused,
    Failed(SubsetError),
}

/// Outcome of one job. Results keep the order of the submitted jobs.
#[derive(Debug)]
pub struct SubsetResult<'a> {
    pub job: &'a SubsetJob,
    pub status: JobStatus,
}

impl SubsetResult<'_> {
    /// The output file exists and can be referenced.
    pub fn is_success(&self) -> bool {
        !matches!(self.status, JobStatus::Failed(_))
    }

    pub fn failure(&self) -> Option<JobFailure> {
        match &self.status {
            JobStatus::Failed(err) => Some(JobFailure {
                rule_index: self.job.rule_index,
                format: self.job.format,
                file_name: self.job.file_name.clone(),
                message: err.to_string(),
            }),
            _ => None,
        }
    }
}

/// Counts of job outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub generated: usize,
    pub reused: usize,
    pub failed: usize,
}

impl ExecutionSummary {
    pub fn from_results(results: &[SubsetResult<'_>]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            match result.status {
                JobStatus::Generated { .. } => summary.generated += 1,
                JobStatus::Reused => summary.reused += 1,
                JobStatus::Failed(_) => summary.failed += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.generated + self.reused + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Run every job, at most `options.concurrency` at a time.
///
/// A failing job does not stop the others; its error is recorded in the
/// returned result. The call returns once every job has finished.
pub fn execute<'a, S>(subsetter: &S, jobs: &'a [SubsetJob], options: ExecutorOptions) -> Result<Vec<SubsetResult<'a>>>
where
    S: Subsetter + ?Sized,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let workers = options.concurrency.clamp(1, jobs.len());
    log::info!("Running {} subset job(s) with {workers} worker(s)", jobs.len());

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("subset-{i}"))
        .build()?;

    let results =
        pool.install(|| jobs.par_iter().map(|job| run_job(subsetter, job, options.overwrite)).collect());
    Ok(results)
}

fn run_job<'a, S>(subsetter: &S, job: &'a SubsetJob, overwrite: bool) -> SubsetResult<'a>
where
    S: Subsetter + ?Sized,
{
    if !overwrite && job.output.is_file() {
        log::info!("Reusing existing {}", job.file_name);
        return SubsetResult { job, status: JobStatus::Reused };
    }

    log::debug!("Subsetting rule {} to {} ({})", job.rule_index, job.format, job.output.display());
    let start = Instant::now();
    let status = match subsetter.subset(&job.request()) {
        Ok(()) => {
            let elapsed = start.elapsed();
            log::info!("Generated {} ({:.2}s)", job.file_name, elapsed.as_secs_f64());
            JobStatus::Generated { elapsed }
        }
        Err(err) => {
            log::error!("Failed to generate {}: {err}", job.file_name);
            JobStatus::Failed(err)
        }
    };
    SubsetResult { job, status }
}
