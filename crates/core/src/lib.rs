//! CJK web font subsetting driven by the Google Fonts stylesheets.
//!
//! Google Fonts splits each Noto Sans CJK family into ~100 `@font-face` rules,
//! each covering a slice of Unicode chosen from real-world character usage.
//! This crate downloads that stylesheet, subsets a local font once per rule
//! and output format, and writes a copy of the stylesheet whose `src` lists
//! point at the generated files.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod layout;
pub mod options;
pub mod pipeline;
pub mod plan;
pub mod rewrite;
pub mod source;
pub mod stylesheet;

pub use cache::{CacheConfig, CachedSource, StylesheetCache};
pub use cjk_subset_font_metadata::FontNames;
pub use cjk_subset_font_subsetter::{Format, PyftSubset, SubsetError, Subsetter};
pub use error::{Error, JobFailure, Result};
pub use executor::{ExecutionSummary, ExecutorOptions, JobStatus, SubsetResult, execute};
pub use inspect::{FontInspector, NameTableInspector};
pub use layout::OutputLayout;
pub use options::{FontDisplay, FontWeight, Locale, OptionsBuilder, PipelineOptions};
pub use pipeline::{Pipeline, Report};
pub use plan::{JobGroup, SubsetJob, plan};
pub use source::{GoogleFonts, StylesheetRequest, StylesheetSource};
pub use stylesheet::{SerializeOptions, Stylesheet};
