//! Validated pipeline configuration.
//!
//! Raw values (from flags, a config file or code) are collected in an
//! [`OptionsBuilder`] and checked once by [`OptionsBuilder::build`]. Enum-typed
//! values are validated before the only filesystem check (input font
//! existence), so an invalid value never causes I/O.

use std::{
    collections::HashSet,
    fmt,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
    thread::available_parallelism,
};

use cjk_subset_font_subsetter::Format;

use crate::{
    Error, Result,
    config::{DEFAULT_SRC_PREFIX, NOTO_SANS_FAMILY},
};

/// Locales served by Google Fonts as `Noto Sans {SUFFIX}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    Sc,
    Tc,
    Hk,
    Jp,
    Kr,
}

impl Locale {
    pub const ALL: [Locale; 5] = [Locale::Sc, Locale::Tc, Locale::Hk, Locale::Jp, Locale::Kr];

    /// Lowercase Noto font suffix.
    pub const fn suffix(self) -> &'static str {
        match self {
            Locale::Sc => "sc",
            Locale::Tc => "tc",
            Locale::Hk => "hk",
            Locale::Jp => "jp",
            Locale::Kr => "kr",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Locale::Sc => "Simplified Chinese",
            Locale::Tc => "Traditional Chinese",
            Locale::Hk => "Hong Kong",
            Locale::Jp => "Japanese",
            Locale::Kr => "Korean",
        }
    }

    /// Upstream family name, e.g. `Noto Sans SC`.
    pub fn noto_family(self) -> String {
        format!("{NOTO_SANS_FAMILY} {}", self.suffix().to_ascii_uppercase())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Locale::ALL
            .into_iter()
            .find(|locale| locale.suffix() == wanted)
            .ok_or_else(|| Error::validation("locale", format!("'{s}' (expected one of sc, tc, hk, jp, kr)")))
    }
}

/// Supported `font-weight` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    Thin,
    Light,
    #[default]
    Regular,
    Medium,
    Bold,
    Black,
}

impl FontWeight {
    pub const ALL: [FontWeight; 6] = [
        FontWeight::Thin,
        FontWeight::Light,
        FontWeight::Regular,
        FontWeight::Medium,
        FontWeight::Bold,
        FontWeight::Black,
    ];

    pub const fn value(self) -> u16 {
        match self {
            FontWeight::Thin => 100,
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Medium => 500,
            FontWeight::Bold => 700,
            FontWeight::Black => 900,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FontWeight::Thin => "Thin",
            FontWeight::Light => "Light",
            FontWeight::Regular => "Regular",
            FontWeight::Medium => "Medium",
            FontWeight::Bold => "Bold",
            FontWeight::Black => "Black",
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Accepts the numeric weight (`400`) or its name (`regular`).
impl FromStr for FontWeight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        FontWeight::ALL
            .into_iter()
            .find(|weight| {
                wanted == weight.value().to_string() || wanted.eq_ignore_ascii_case(weight.name())
            })
            .ok_or_else(|| {
                Error::validation("font weight", format!("'{s}' (expected one of 100, 300, 400, 500, 700, 900)"))
            })
    }
}

/// Supported `font-display` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontDisplay {
    Auto,
    Block,
    #[default]
    Swap,
    Fallback,
    Optional,
}

impl FontDisplay {
    pub const ALL: [FontDisplay; 5] = [
        FontDisplay::Auto,
        FontDisplay::Block,
        FontDisplay::Swap,
        FontDisplay::Fallback,
        FontDisplay::Optional,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FontDisplay::Auto => "auto",
            FontDisplay::Block => "block",
            FontDisplay::Swap => "swap",
            FontDisplay::Fallback => "fallback",
            FontDisplay::Optional => "optional",
        }
    }
}

impl fmt::Display for FontDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontDisplay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        FontDisplay::ALL
            .into_iter()
            .find(|display| display.as_str() == wanted)
            .ok_or_else(|| {
                Error::validation(
                    "font display",
                    format!("'{s}' (expected one of auto, block, swap, fallback, optional)"),
                )
            })
    }
}

/// Number of subset jobs run at once when not configured.
pub fn default_concurrency() -> usize {
    available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

/// Immutable, validated pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    font_display: FontDisplay,
    font_family: Option<String>,
    font_weight: FontWeight,
    formats: Vec<Format>,
    input: PathBuf,
    locale: Locale,
    output: PathBuf,
    overwrite: bool,
    src_prefix: String,
    concurrency: usize,
}

impl PipelineOptions {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    pub fn font_display(&self) -> FontDisplay {
        self.font_display
    }

    /// Family name override for the rewritten rules.
    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    pub fn font_weight(&self) -> FontWeight {
        self.font_weight
    }

    /// Output formats in `src` order. Never empty.
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn src_prefix(&self) -> &str {
        &self.src_prefix
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

/// Raw, unvalidated option values.
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    font_display: Option<String>,
    font_family: Option<String>,
    font_weight: Option<String>,
    formats: Option<Vec<String>>,
    input: Option<PathBuf>,
    locale: Option<String>,
    output: Option<PathBuf>,
    overwrite: bool,
    src_prefix: Option<String>,
    concurrency: Option<usize>,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font_display(mut self, display: impl Into<String>) -> Self {
        self.font_display = Some(display.into());
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn font_weight(mut self, weight: impl ToString) -> Self {
        self.font_weight = Some(weight.to_string());
        self
    }

    pub fn formats(mut self, formats: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn src_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.src_prefix = Some(prefix.into());
        self
    }

    pub fn concurrency(mut self, jobs: usize) -> Self {
        self.concurrency = Some(jobs);
        self
    }

    /// Validate every value and produce the immutable options.
    pub fn build(self) -> Result<PipelineOptions> {
        let formats = match &self.formats {
            Some(raw) => parse_formats(raw)?,
            None => Format::ALL.to_vec(),
        };
        let font_display = parse_or_default(self.font_display.as_deref())?;
        let font_weight = parse_or_default(self.font_weight.as_deref())?;
        let locale = parse_or_default(self.locale.as_deref())?;

        let concurrency = match self.concurrency {
            Some(0) => return Err(Error::validation("concurrency", "must be at least 1")),
            Some(jobs) => jobs,
            None => default_concurrency(),
        };
        let font_family = self
            .font_family
            .map(|family| family.trim().to_string())
            .filter(|family| !family.is_empty());
        let src_prefix = self.src_prefix.unwrap_or_else(|| DEFAULT_SRC_PREFIX.to_string());

        let output = self
            .output
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| Error::validation("output path", "an output directory is required"))?;
        let input = self
            .input
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| Error::validation("font file path", "an input font file is required"))?;
        if !input.is_file() {
            return Err(Error::validation("font file path", format!("'{}' is not a file", input.display())));
        }

        Ok(PipelineOptions {
            font_display,
            font_family,
            font_weight,
            formats,
            input,
            locale,
            output,
            overwrite: self.overwrite,
            src_prefix,
            concurrency,
        })
    }
}

fn parse_or_default<T>(raw: Option<&str>) -> Result<T>
where
    T: FromStr<Err = Error> + Default,
{
    raw.map(str::parse).transpose().map(Option::unwrap_or_default)
}

fn parse_formats(raw: &[String]) -> Result<Vec<Format>> {
    let mut seen = HashSet::new();
    let mut formats = Vec::with_capacity(raw.len());
    for name in raw {
        let format: Format = name
            .parse()
            .map_err(|err: cjk_subset_font_subsetter::UnknownFormat| Error::validation("formats", err.to_string()))?;
        if !seen.insert(format) {
            return Err(Error::validation("formats", format!("'{format}' is listed more than once")));
        }
        formats.push(format);
    }
    if formats.is_empty() {
        return Err(Error::validation("formats", "at least one of woff2, woff is required"));
    }
    Ok(formats)
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::TempDir;

    use super::*;

    fn with_font() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("Font.ttf");
        write(&font, b"font").unwrap();
        (dir, font)
    }

    #[test]
    fn test_defaults() {
        let (dir, font) = with_font();
        let options = PipelineOptions::builder().input(&font).output(dir.path()).build().unwrap();

        assert_eq!(options.locale(), Locale::Sc);
        assert_eq!(options.font_weight(), FontWeight::Regular);
        assert_eq!(options.font_display(), FontDisplay::Swap);
        assert_eq!(options.formats(), &[Format::Woff2, Format::Woff]);
        assert_eq!(options.src_prefix(), "../webfonts");
        assert_eq!(options.font_family(), None);
        assert!(!options.overwrite());
        assert!(options.concurrency() >= 1);
    }

    #[test]
    fn test_values_are_case_insensitive() {
        let (dir, font) = with_font();
        let options = PipelineOptions::builder()
            .input(&font)
            .output(dir.path())
            .locale("JP")
            .font_display("Fallback")
            .font_weight("bold")
            .formats(["WOFF"])
            .build()
            .unwrap();

        assert_eq!(options.locale(), Locale::Jp);
        assert_eq!(options.font_display(), FontDisplay::Fallback);
        assert_eq!(options.font_weight(), FontWeight::Bold);
        assert_eq!(options.formats(), &[Format::Woff]);
    }

    #[test]
    fn test_format_order_is_preserved() {
        let (dir, font) = with_font();
        let options = PipelineOptions::builder()
            .input(&font)
            .output(dir.path())
            .formats(["woff", "woff2"])
            .build()
            .unwrap();
        assert_eq!(options.formats(), &[Format::Woff, Format::Woff2]);
    }

    #[test]
    fn test_invalid_values() {
        let (dir, font) = with_font();
        let base = PipelineOptions::builder().input(&font).output(dir.path());

        let cases = [
            (base.clone().locale("xx"), "locale"),
            (base.clone().font_weight(450), "font weight"),
            (base.clone().font_display("instant"), "font display"),
            (base.clone().formats(["ttf"]), "formats"),
            (base.clone().formats(Vec::<String>::new()), "formats"),
            (base.clone().formats(["woff2", "WOFF2"]), "formats"),
            (base.clone().concurrency(0), "concurrency"),
        ];
        for (builder, expected) in cases {
            match builder.build() {
                Err(Error::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_enums_are_checked_before_paths() {
        let err = PipelineOptions::builder()
            .input("/definitely/missing/font.ttf")
            .locale("xx")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "locale", .. }));
    }

    #[test]
    fn test_missing_paths() {
        let (dir, font) = with_font();

        let err = PipelineOptions::builder().output(dir.path()).build().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "font file path", .. }));

        let err = PipelineOptions::builder().input(&font).build().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "output path", .. }));

        let err = PipelineOptions::builder()
            .input(dir.path().join("missing.ttf"))
            .output(dir.path())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "font file path", .. }));
    }

    #[test]
    fn test_blank_family_is_ignored() {
        let (dir, font) = with_font();
        let options = PipelineOptions::builder()
            .input(&font)
            .output(dir.path())
            .font_family("  ")
            .build()
            .unwrap();
        assert_eq!(options.font_family(), None);
    }

    #[test]
    fn test_locale_family() {
        assert_eq!(Locale::Hk.noto_family(), "Noto Sans HK");
        assert_eq!(Locale::Kr.description(), "Korean");
    }

    #[test]
    fn test_weight_display() {
        assert_eq!(FontWeight::Black.to_string(), "900");
        assert_eq!("100".parse::<FontWeight>().unwrap(), FontWeight::Thin);
    }
}
