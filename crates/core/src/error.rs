//! Error types for the subset pipeline.

use std::{fmt, io, path::PathBuf, result};

use cjk_subset_font_subsetter::Format;

use crate::executor::ExecutionSummary;

/// Result type for pipeline operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while generating a subset stylesheet.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An option value is missing or outside its supported set.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The upstream stylesheet could not be downloaded.
    #[error("Failed to fetch stylesheet from {url}: {message}")]
    Fetch { url: String, message: String },

    /// The upstream stylesheet is not valid CSS.
    #[error("Failed to parse stylesheet at line {line}, column {column}: {message}")]
    Parse { line: u32, column: u32, message: String },

    /// The input font could not be read or has no usable names.
    #[error("Failed to read font '{}': {message}", path.display())]
    FontRead { path: PathBuf, message: String },

    /// One or more subset jobs failed. The stylesheet was still written.
    #[error(
        "{} subset job(s) failed; partial stylesheet written to '{}': {}",
        failures.len(),
        css_path.display(),
        JobFailures(failures)
    )]
    SubsetJobs { failures: Vec<JobFailure>, css_path: PathBuf, summary: ExecutionSummary },

    /// An output directory or file could not be written.
    #[error("Failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation { field, message: message.into() }
    }
}

/// A failed (rule, format) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub rule_index: usize,
    pub format: Format,
    pub file_name: String,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} ({}) {}: {}", self.rule_index, self.format, self.file_name, self.message)
    }
}

struct JobFailures<'a>(&'a [JobFailure]);

impl fmt::Display for JobFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
