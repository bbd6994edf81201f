//! Optional TOML configuration file for `cjk-subset generate`.
//!
//! Every key is optional and named after the matching command-line flag:
//!
//! ```toml
//! input = "fonts/Xiaolai-Regular.ttf"
//! output = "dist"
//! locale = "sc"
//! weight = 400
//! format = ["woff2", "woff"]
//! jobs = 8
//! ```
//!
//! Relative paths are resolved against the directory containing the file.

use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub family: Option<String>,
    pub format: Option<Vec<String>>,
    pub src_prefix: Option<String>,
    pub overwrite: Option<bool>,
    pub jobs: Option<usize>,
    /// Per-job subsetter timeout in seconds; `0` disables it.
    pub timeout: Option<u64>,
    pub pyftsubset: Option<PathBuf>,
    pub line_width: Option<usize>,
    pub locale: Option<String>,
    pub weight: Option<Weight>,
    pub display: Option<String>,
    pub cache_dir: Option<PathBuf>,
    /// Seconds.
    pub cache_ttl: Option<u64>,
    pub no_cache: Option<bool>,
}

/// `weight = 700` or `weight = "bold"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Number(u16),
    Name(String),
}

impl Weight {
    pub fn as_string(&self) -> String {
        match self {
            Weight::Number(value) => value.to_string(),
            Weight::Name(name) => name.clone(),
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [&mut self.input, &mut self.output, &mut self.pyftsubset, &mut self.cache_dir]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
