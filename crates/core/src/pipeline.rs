//! End-to-end generation: font names, upstream CSS, subsets, rewritten CSS.

use std::{fs, path::PathBuf, time::Instant};

use cjk_subset_font_subsetter::Subsetter;

use crate::{
    Error, Result,
    error::JobFailure,
    executor::{self, ExecutionSummary, ExecutorOptions, SubsetResult},
    inspect::FontInspector,
    layout::OutputLayout,
    options::PipelineOptions,
    plan,
    rewrite::rewrite_all,
    source::{StylesheetRequest, StylesheetSource},
    stylesheet::{SerializeOptions, Stylesheet, serialize},
};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub css_path: PathBuf,
    pub postscript_name: String,
    /// Family assigned to every rewritten rule.
    pub family: String,
    pub font_faces: usize,
    pub summary: ExecutionSummary,
}

/// The generation pipeline with its collaborators.
pub struct Pipeline<'a> {
    source: &'a dyn StylesheetSource,
    subsetter: &'a dyn Subsetter,
    inspector: &'a dyn FontInspector,
    serialize_options: SerializeOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn StylesheetSource,
        subsetter: &'a dyn Subsetter,
        inspector: &'a dyn FontInspector,
    ) -> Self {
        Self { source, subsetter, inspector, serialize_options: SerializeOptions::default() }
    }

    pub fn with_serialize_options(mut self, options: SerializeOptions) -> Self {
        self.serialize_options = options;
        self
    }

    /// Generate the subset fonts and stylesheet for `options`.
    ///
    /// If some subset jobs fail the stylesheet is still written, referencing
    /// only the files that were produced, and [`Error::SubsetJobs`] is
    /// returned.
    pub fn run(&self, options: &PipelineOptions) -> Result<Report> {
        let start = Instant::now();

        let names = run_step("Read font names", || self.inspector.inspect(options.input()))?;
        let family = options.font_family().unwrap_or(&names.family_name).to_string();
        let layout = OutputLayout::new(options.output(), &names.postscript_name);
        run_step("Create output directories", || layout.create_dirs())?;

        let request = StylesheetRequest::from(options);
        let css = run_step("Fetch stylesheet", || self.source.fetch(&request))?;
        let mut sheet = run_step("Parse stylesheet", || Stylesheet::parse(&css))?;
        log::info!("{} @font-face rule(s)", sheet.font_face_count());

        let groups = plan::plan(&sheet, options, &layout);
        let jobs = plan::flatten(&groups);
        let executor_options = ExecutorOptions { concurrency: options.concurrency(), overwrite: options.overwrite() };
        let results = run_step("Generate subsets", || executor::execute(self.subsetter, &jobs, executor_options))?;
        let summary = ExecutionSummary::from_results(&results);

        rewrite_all(&mut sheet, &family, &results, options.src_prefix());
        let css_path = layout.css_file();
        run_step("Write stylesheet", || {
            fs::write(&css_path, serialize(&sheet, &self.serialize_options))
                .map_err(|source| Error::Write { path: css_path.clone(), source })
        })?;

        log::info!(
            "Done in {:.2}s: {} generated, {} reused, {} failed",
            start.elapsed().as_secs_f64(),
            summary.generated,
            summary.reused,
            summary.failed
        );

        let failures = collect_failures(&results);
        if !failures.is_empty() {
            return Err(Error::SubsetJobs { failures, css_path, summary });
        }

        Ok(Report {
            css_path,
            postscript_name: names.postscript_name,
            family,
            font_faces: sheet.font_face_count(),
            summary,
        })
    }
}

fn collect_failures(results: &[SubsetResult<'_>]) -> Vec<JobFailure> {
    results.iter().filter_map(SubsetResult::failure).collect()
}

fn run_step<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    log::info!("{name}");
    let start = Instant::now();
    let value = f()?;
    log::debug!("{name} ({:.2}s)", start.elapsed().as_secs_f64());
    Ok(value)
}
