//! Turning parsed `@font-face` rules into subset jobs.

use std::path::PathBuf;

use cjk_subset_font_subsetter::{Format, SubsetRequest};

use crate::{
    layout::OutputLayout,
    options::PipelineOptions,
    stylesheet::{FontFaceRule, Stylesheet, UnicodeRangeToken},
};

/// Codepoint set used for rules that declare no `unicode-range`.
pub const ALL_CODEPOINTS: &str = "*";

/// One (rule, format) subset invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetJob {
    pub rule_index: usize,
    pub format: Format,
    pub input: PathBuf,
    pub output: PathBuf,
    pub file_name: String,
    /// Comma-joined `unicode-range` text handed to the subsetter.
    pub unicodes: String,
}

impl SubsetJob {
    pub fn request(&self) -> SubsetRequest<'_> {
        SubsetRequest { input: &self.input, output: &self.output, unicodes: &self.unicodes, format: self.format }
    }
}

/// All jobs of one `@font-face` rule, in the requested format order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobGroup {
    pub rule_index: usize,
    pub unicodes: String,
    pub jobs: Vec<SubsetJob>,
}

/// Plan jobs for every `@font-face` rule in document order.
pub fn plan(sheet: &Stylesheet, options: &PipelineOptions, layout: &OutputLayout) -> Vec<JobGroup> {
    sheet.font_faces().map(|face| plan_rule(face, options, layout)).collect()
}

fn plan_rule(face: &FontFaceRule, options: &PipelineOptions, layout: &OutputLayout) -> JobGroup {
    let rule_index = face.index();
    let unicodes = unicodes_argument(face);
    if !face.has_unicode_range() {
        log::warn!("Rule {rule_index} has no unicode-range, subsetting all codepoints");
    }

    let jobs = options
        .formats()
        .iter()
        .map(|&format| {
            let file_name = layout.font_file_name(rule_index, format);
            SubsetJob {
                rule_index,
                format,
                input: options.input().to_path_buf(),
                output: layout.font_file(&file_name),
                file_name,
                unicodes: unicodes.clone(),
            }
        })
        .collect();

    JobGroup { rule_index, unicodes, jobs }
}

/// `--unicodes` argument for a rule: its range tokens joined by commas, or
/// [`ALL_CODEPOINTS`] when there are none.
pub fn unicodes_argument(face: &FontFaceRule) -> String {
    let ranges = face.unicode_ranges();
    if ranges.is_empty() {
        return ALL_CODEPOINTS.to_string();
    }
    ranges.iter().map(UnicodeRangeToken::as_str).collect::<Vec<_>>().join(",")
}

/// Jobs of all groups, rule-major.
pub fn flatten(groups: &[JobGroup]) -> Vec<SubsetJob> {
    groups.iter().flat_map(|group| group.jobs.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::NamedTempFile;

    use super::*;

    fn options(font: &Path, formats: &[&str]) -> PipelineOptions {
        PipelineOptions::builder()
            .input(font)
            .output("dist")
            .formats(formats.iter().copied())
            .build()
            .unwrap()
    }

    #[test]
    fn test_plan_jobs_per_rule_and_format() {
        let font = NamedTempFile::new().unwrap();
        let sheet = Stylesheet::parse(
            "@font-face { unicode-range: U+0-FF, U+131; } @font-face { unicode-range: U+4e00-9fff; }",
        )
        .unwrap();
        let layout = OutputLayout::new(Path::new("dist"), "Font-Regular");

        let groups = plan(&sheet, &options(font.path(), &["woff2", "woff"]), &layout);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].unicodes, "U+0-FF,U+131");
        assert_eq!(groups[1].unicodes, "U+4e00-9fff");

        let jobs = flatten(&groups);
        let names: Vec<_> = jobs.iter().map(|job| job.file_name.as_str()).collect();
        assert_eq!(names, ["Font-Regular_0.woff2", "Font-Regular_0.woff", "Font-Regular_1.woff2", "Font-Regular_1.woff"]);
        assert_eq!(jobs[3].output, Path::new("dist/Font-Regular/webfonts/Font-Regular_1.woff"));
        assert_eq!(jobs[3].input, font.path());

        let request = jobs[2].request();
        assert_eq!(request.unicodes, "U+4e00-9fff");
        assert_eq!(request.format, Format::Woff2);
    }

    #[test]
    fn test_format_order_follows_options() {
        let font = NamedTempFile::new().unwrap();
        let sheet = Stylesheet::parse("@font-face { unicode-range: U+0-FF; }").unwrap();
        let layout = OutputLayout::new(Path::new("dist"), "F");

        let groups = plan(&sheet, &options(font.path(), &["woff", "woff2"]), &layout);
        let formats: Vec<_> = groups[0].jobs.iter().map(|job| job.format).collect();
        assert_eq!(formats, [Format::Woff, Format::Woff2]);
    }

    #[test]
    fn test_rule_without_range_subsets_everything() {
        let font = NamedTempFile::new().unwrap();
        let sheet = Stylesheet::parse("@font-face { font-family: X; }").unwrap();
        let layout = OutputLayout::new(Path::new("dist"), "F");

        let groups = plan(&sheet, &options(font.path(), &["woff2"]), &layout);
        assert_eq!(groups[0].unicodes, ALL_CODEPOINTS);
    }

    #[test]
    fn test_duplicate_ranges_kept() {
        let sheet = Stylesheet::parse("@font-face { unicode-range: U+41, U+41; }").unwrap();
        let face = sheet.font_faces().next().unwrap();
        assert_eq!(unicodes_argument(face), "U+41,U+41");
    }

    #[test]
    fn test_plan_is_deterministic() {
        let font = NamedTempFile::new().unwrap();
        let sheet = Stylesheet::parse("@font-face { unicode-range: U+0-FF; } @font-face { unicode-range: U+100-17F; }")
            .unwrap();
        let layout = OutputLayout::new(Path::new("dist"), "F");
        let options = options(font.path(), &["woff2", "woff"]);

        assert_eq!(plan(&sheet, &options, &layout), plan(&sheet, &options, &layout));
    }

    #[test]
    fn test_no_rules_no_jobs() {
        let font = NamedTempFile::new().unwrap();
        let sheet = Stylesheet::parse("/* empty */").unwrap();
        let layout = OutputLayout::new(Path::new("dist"), "F");
        assert!(plan(&sheet, &options(font.path(), &["woff2"]), &layout).is_empty());
    }
}
