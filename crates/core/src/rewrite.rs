//! Rewriting `@font-face` rules to point at the generated files.

use crate::{
    executor::SubsetResult,
    stylesheet::{FontFaceRule, FontSource, Stylesheet},
};

/// Point `face` at its generated subset files and set its family.
///
/// Only successful results for this rule are referenced, in job order. If
/// every job for the rule failed its `src` declaration is removed.
pub fn rewrite(face: &mut FontFaceRule, family: &str, results: &[SubsetResult<'_>], src_prefix: &str) {
    let sources: Vec<_> = results
        .iter()
        .filter(|result| result.job.rule_index == face.index() && result.is_success())
        .map(|result| FontSource::url(src_url(src_prefix, &result.job.file_name), result.job.format))
        .collect();

    face.set_family(family);
    if sources.is_empty() {
        log::warn!("Rule {} has no generated files, dropping its src", face.index());
        face.remove_src();
    } else {
        face.set_src(sources);
    }
}

/// Rewrite every `@font-face` rule of the stylesheet.
pub fn rewrite_all(sheet: &mut Stylesheet, family: &str, results: &[SubsetResult<'_>], src_prefix: &str) {
    for face in sheet.font_faces_mut() {
        rewrite(face, family, results, src_prefix);
    }
}

/// `{prefix}/{file}` without doubling the separator.
pub fn src_url(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() { file_name.to_string() } else { format!("{prefix}/{file_name}") }
}
