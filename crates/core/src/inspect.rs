//! Reading the names that identify the input font.

use std::{fs, path::Path};

use cjk_subset_font_metadata::FontNames;

use crate::{Error, Result};

/// Resolves the PostScript and family names of a font file.
pub trait FontInspector: Send + Sync {
    fn inspect(&self, path: &Path) -> Result<FontNames>;
}

impl<T: FontInspector + ?Sized> FontInspector for &T {
    fn inspect(&self, path: &Path) -> Result<FontNames> {
        (**self).inspect(path)
    }
}

/// Reads names from the font's `name` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameTableInspector;

impl FontInspector for NameTableInspector {
    fn inspect(&self, path: &Path) -> Result<FontNames> {
        let font_error = |message: String| Error::FontRead { path: path.to_path_buf(), message };
        let data = fs::read(path).map_err(|err| font_error(err.to_string()))?;
        let names = FontNames::from_data(&data).map_err(|err| font_error(format!("{err:#}")))?;
        log::info!("Font: {} (family '{}')", names.postscript_name, names.family_name);
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = NameTableInspector.inspect(&dir.path().join("missing.otf")).unwrap_err();
        assert!(matches!(err, Error::FontRead { .. }));
    }

    #[test]
    fn test_not_a_font() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        write(&path, b"definitely not a font").unwrap();

        match NameTableInspector.inspect(&path) {
            Err(Error::FontRead { path: reported, message }) => {
                assert_eq!(reported, path);
                assert!(message.contains("Failed to parse font"), "{message}");
            }
            other => panic!("expected FontRead error, got {other:?}"),
        }
    }
}
