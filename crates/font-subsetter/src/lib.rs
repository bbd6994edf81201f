//! Font subsetting as a swappable capability.
//!
//! The [`Subsetter`] trait describes one operation: produce a subset font of a
//! given [`Format`] containing the glyphs for a set of Unicode ranges. The
//! bundled implementation, [`PyftSubset`], drives the fontTools `pyftsubset`
//! executable; tests and alternative backends implement the trait directly.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use cjk_subset_font_subsetter::{Format, PyftSubset, SubsetRequest, Subsetter};
//!
//! let subsetter = PyftSubset::new().with_timeout(Some(Duration::from_secs(120)));
//! subsetter
//!     .subset(&SubsetRequest {
//!         input: Path::new("NotoSansSC-Regular.otf"),
//!         output: Path::new("NotoSansSC-Regular_0.woff2"),
//!         unicodes: "U+4E00-9FFF",
//!         format: Format::Woff2,
//!     })
//!     .unwrap();
//! ```

mod pyftsubset;

use std::{
    fmt, io,
    path::{Path, PathBuf},
    process::ExitStatus,
    str::FromStr,
    time::Duration,
};

pub use pyftsubset::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT, PyftSubset};

/// Web font container produced by a subset job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Woff2,
    Woff,
}

impl Format {
    /// Every supported format, in the default output order.
    pub const ALL: [Format; 2] = [Format::Woff2, Format::Woff];

    /// Name used for the file extension, the `format()` hint and `--flavor`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Format::Woff2 => "woff2",
            Format::Woff => "woff",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unsupported format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported format '{0}' (expected woff2 or woff)")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "woff2" => Ok(Format::Woff2),
            "woff" => Ok(Format::Woff),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// One subsetting invocation.
#[derive(Debug, Clone, Copy)]
pub struct SubsetRequest<'a> {
    /// Source font file.
    pub input: &'a Path,
    /// Where the subset font is written.
    pub output: &'a Path,
    /// Comma-separated Unicode ranges, passed through verbatim.
    pub unicodes: &'a str,
    pub format: Format,
}

/// Errors reported by a subsetter for a single request.
#[derive(Debug, thiserror::Error)]
pub enum SubsetError {
    #[error("failed to launch '{}': {source}", program.display())]
    Launch { program: PathBuf, source: io::Error },

    #[error("failed waiting for subsetter: {0}")]
    Wait(#[source] io::Error),

    #[error("subsetter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("subsetter timed out after {}s", timeout.as_secs_f64())]
    TimedOut { timeout: Duration },

    #[error("subsetter reported success but '{}' was not written", path.display())]
    MissingOutput { path: PathBuf },

    /// Failure reported by a non-process backend.
    #[error("{0}")]
    Other(String),
}

/// Capability to produce subset font files.
///
/// Implementations must be safe to call from several worker threads at once;
/// distinct requests always target distinct output paths.
pub trait Subsetter: Send + Sync {
    fn subset(&self, request: &SubsetRequest<'_>) -> Result<(), SubsetError>;
}

impl<T: Subsetter + ?Sized> Subsetter for &T {
    fn subset(&self, request: &SubsetRequest<'_>) -> Result<(), SubsetError> {
        (**self).subset(request)
    }
}

impl<T: Subsetter + ?Sized> Subsetter for Box<T> {
    fn subset(&self, request: &SubsetRequest<'_>) -> Result<(), SubsetError> {
        (**self).subset(request)
    }
}
