//! Font naming metadata read from the `name` table.
//!
//! The subsetter names its output after the font's PostScript name and, unless
//! overridden, assigns the font's family name to every rewritten `@font-face`.

use anyhow::{Context, Result, anyhow};
use read_fonts::{FileRef, FontRef, TableProvider, tables::name::NameRecord, types::NameId};

/// Windows platform ID.
const PLATFORM_WINDOWS: u16 = 3;
/// Macintosh platform ID.
const PLATFORM_MAC: u16 = 1;
/// Windows language ID for English (United States).
const WINDOWS_ENGLISH_US: u16 = 0x0409;
/// Macintosh language ID for English.
const MAC_ENGLISH: u16 = 0;

/// Names identifying a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontNames {
    /// Name ID 6.
    pub postscript_name: String,
    /// Name ID 1, or name ID 16 when the font has no legacy family name.
    pub family_name: String,
}

impl FontNames {
    /// Read names from font data.
    ///
    /// Font collections (TTC/OTC) use their first face.
    pub fn from_data(data: &[u8]) -> Result<Self> {
        let font = match FileRef::new(data).context("Failed to parse font")? {
            FileRef::Font(font) => font,
            FileRef::Collection(collection) => {
                collection.get(0).context("Failed to read first font of collection")?
            }
        };
        Self::from_font(&font)
    }

    pub fn from_font(font: &FontRef) -> Result<Self> {
        let postscript_name = find_name(font, &[NameId::POSTSCRIPT_NAME])?
            .ok_or_else(|| anyhow!("Font has no PostScript name (name ID 6)"))?;
        let family_name = find_name(font, &[NameId::FAMILY_NAME, NameId::TYPOGRAPHIC_FAMILY_NAME])?
            .ok_or_else(|| anyhow!("Font has no family name (name ID 1 or 16)"))?;

        Ok(Self { postscript_name, family_name })
    }
}

/// Find the best record for the first name ID in `ids` that has one.
fn find_name(font: &FontRef, ids: &[NameId]) -> Result<Option<String>> {
    let name = font.name().context("Failed to read name table")?;
    let records = name.name_record();

    for id in ids {
        let best = records
            .iter()
            .filter(|record| record.name_id() == *id)
            .filter_map(|record| {
                let value = record.string(name.string_data()).ok()?.to_string();
                let value = value.trim().to_string();
                (!value.is_empty()).then(|| (record_rank(record), value))
            })
            .min_by_key(|(rank, _)| *rank);

        if let Some((_, value)) = best {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Lower ranks are preferred: Windows English, other Windows, Mac English, anything else.
fn record_rank(record: &NameRecord) -> u8 {
    match (record.platform_id(), record.language_id()) {
        (PLATFORM_WINDOWS, WINDOWS_ENGLISH_US) => 0,
        (PLATFORM_WINDOWS, _) => 1,
        (PLATFORM_MAC, MAC_ENGLISH) => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use write_fonts::{
        FontBuilder,
        tables::name::{Name, NameRecord},
        types::NameId,
    };

    use super::*;

    /// Build a font containing only a `name` table.
    fn font_with_names(records: &[(u16, u16, u16, u16, &str)]) -> Vec<u8> {
        let mut records: Vec<_> = records
            .iter()
            .map(|&(platform, encoding, language, id, value)| {
                NameRecord::new(platform, encoding, language, NameId::new(id), value.to_string().into())
            })
            .collect();
        records.sort();
        let mut builder = FontBuilder::new();
        builder.add_table(&Name::new(records)).unwrap();
        builder.build()
    }

    #[test]
    fn test_reads_postscript_and_family() {
        let data = font_with_names(&[
            (3, 1, 0x409, 1, "Xiaolai SC"),
            (3, 1, 0x409, 6, "XiaolaiSC-Regular"),
        ]);
        let names = FontNames::from_data(&data).unwrap();
        assert_eq!(names.postscript_name, "XiaolaiSC-Regular");
        assert_eq!(names.family_name, "Xiaolai SC");
    }

    #[test]
    fn test_prefers_windows_english() {
        let data = font_with_names(&[
            (1, 0, 0, 1, "Mac Family"),
            (3, 1, 0x411, 1, "Japanese Family"),
            (3, 1, 0x409, 1, "English Family"),
            (3, 1, 0x409, 6, "Font-Regular"),
        ]);
        let names = FontNames::from_data(&data).unwrap();
        assert_eq!(names.family_name, "English Family");
    }

    #[test]
    fn test_falls_back_to_typographic_family() {
        let data = font_with_names(&[
            (3, 1, 0x409, 16, "Typographic"),
            (3, 1, 0x409, 6, "Typographic-Bold"),
        ]);
        let names = FontNames::from_data(&data).unwrap();
        assert_eq!(names.family_name, "Typographic");
    }

    #[test]
    fn test_missing_postscript_name() {
        let data = font_with_names(&[(3, 1, 0x409, 1, "No PostScript")]);
        assert!(FontNames::from_data(&data).is_err());
    }

    #[test]
    fn test_not_a_font() {
        assert!(FontNames::from_data(b"definitely not a font").is_err());
    }
}
