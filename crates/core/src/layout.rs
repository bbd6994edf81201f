//! Output directory layout.

use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use cjk_subset_font_subsetter::Format;

use crate::{
    Error, Result,
    config::{CSS_DIR, WEBFONTS_DIR},
};

/// Paths of everything generated for one font:
///
/// ```text
/// {output}/{base}/css/{base}.css
/// {output}/{base}/webfonts/{base}_{rule}.{format}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    base_name: String,
}

impl OutputLayout {
    /// `base_name` is normally the font's PostScript name. Path separators in
    /// it are replaced so the layout never escapes `output`.
    pub fn new(output: &Path, base_name: &str) -> Self {
        let base_name = base_name.replace(['/', '\\'], "_");
        Self { root: output.join(&base_name), base_name }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn css_dir(&self) -> PathBuf {
        self.root.join(CSS_DIR)
    }

    pub fn webfonts_dir(&self) -> PathBuf {
        self.root.join(WEBFONTS_DIR)
    }

    pub fn css_file(&self) -> PathBuf {
        self.css_dir().join(format!("{}.css", self.base_name))
    }

    pub fn font_file_name(&self, rule_index: usize, format: Format) -> String {
        format!("{}_{rule_index}.{format}", self.base_name)
    }

    pub fn font_file(&self, file_name: &str) -> PathBuf {
        self.webfonts_dir().join(file_name)
    }

    /// Create the `css` and `webfonts` directories.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [self.css_dir(), self.webfonts_dir()] {
            log::info!("Creating output directory: {}", dir.display());
            create_dir_all(&dir).map_err(|source| Error::Write { path: dir.clone(), source })?;
        }
        Ok(())
    }
}
