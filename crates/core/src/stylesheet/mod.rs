//! Typed model of a Google Fonts `@font-face` stylesheet.
//!
//! Only the parts the pipeline reads or rewrites are typed: `@font-face`
//! rules with their `font-family`, `unicode-range` and `src` declarations.
//! Everything else (other declarations, other rules, top-level comments) is
//! kept as source text and written back unchanged.

mod parse;
mod serialize;

use std::fmt;

use cjk_subset_font_subsetter::Format;
use cssparser::ToCss;

use crate::Result;

pub use serialize::{SerializeOptions, serialize};

/// Parsed stylesheet. Rules are kept in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

/// A top-level stylesheet item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    FontFace(FontFaceRule),
    /// Comment text without the `/*` `*/` delimiters.
    Comment(String),
    /// Any other rule, as source text.
    Other(String),
}

impl Stylesheet {
    /// Parse CSS text.
    pub fn parse(css: &str) -> Result<Self> {
        parse::parse_stylesheet(css)
    }

    pub(crate) fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// `@font-face` rules in document order.
    pub fn font_faces(&self) -> impl Iterator<Item = &FontFaceRule> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::FontFace(face) => Some(face),
            _ => None,
        })
    }

    pub fn font_faces_mut(&mut self) -> impl Iterator<Item = &mut FontFaceRule> {
        self.rules.iter_mut().filter_map(|rule| match rule {
            Rule::FontFace(face) => Some(face),
            _ => None,
        })
    }

    pub fn font_face_count(&self) -> usize {
        self.font_faces().count()
    }
}

impl ToCss for Stylesheet {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        serialize::write_stylesheet(self, &SerializeOptions::default(), dest)
    }
}

/// One `@font-face` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceRule {
    index: usize,
    declarations: Vec<Declaration>,
}

/// A declaration inside `@font-face`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    FontFamily(String),
    UnicodeRange(Vec<UnicodeRangeToken>),
    Src(Vec<FontSource>),
    /// Declarations the pipeline does not touch, value kept as source text.
    Other { name: String, value: String },
}

impl FontFaceRule {
    pub(crate) fn new(index: usize, declarations: Vec<Declaration>) -> Self {
        Self { index, declarations }
    }

    /// Position among the stylesheet's `@font-face` rules.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// The effective (last) `font-family` value.
    pub fn family(&self) -> Option<&str> {
        self.declarations.iter().rev().find_map(|declaration| match declaration {
            Declaration::FontFamily(family) => Some(family.as_str()),
            _ => None,
        })
    }

    /// Set the family of every `font-family` declaration, adding one if missing.
    pub fn set_family(&mut self, family: impl Into<String>) {
        let family = family.into();
        let mut found = false;
        for declaration in &mut self.declarations {
            if let Declaration::FontFamily(value) = declaration {
                value.clone_from(&family);
                found = true;
            }
        }
        if !found {
            self.declarations.insert(0, Declaration::FontFamily(family));
        }
    }

    /// Range tokens as written in the source. Empty if the rule has none.
    pub fn unicode_ranges(&self) -> &[UnicodeRangeToken] {
        self.declarations
            .iter()
            .rev()
            .find_map(|declaration| match declaration {
                Declaration::UnicodeRange(ranges) => Some(ranges.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn has_unicode_range(&self) -> bool {
        self.declarations.iter().any(|declaration| matches!(declaration, Declaration::UnicodeRange(_)))
    }

    /// The effective (last) `src` list.
    pub fn src(&self) -> &[FontSource] {
        self.declarations
            .iter()
            .rev()
            .find_map(|declaration| match declaration {
                Declaration::Src(sources) => Some(sources.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Replace the `src` list wholesale. Earlier duplicate `src` declarations
    /// are dropped; a rule without one gets it appended.
    pub fn set_src(&mut self, sources: Vec<FontSource>) {
        let last = self
            .declarations
            .iter()
            .rposition(|declaration| matches!(declaration, Declaration::Src(_)));
        let Some(last) = last else {
            self.declarations.push(Declaration::Src(sources));
            return;
        };

        self.declarations[last] = Declaration::Src(sources);
        let mut position = 0;
        self.declarations.retain(|declaration| {
            let keep = position >= last || !matches!(declaration, Declaration::Src(_));
            position += 1;
            keep
        });
    }

    /// Drop every `src` declaration.
    pub fn remove_src(&mut self) {
        self.declarations.retain(|declaration| !matches!(declaration, Declaration::Src(_)));
    }

    /// Value text of an untyped declaration, e.g. `font-weight`.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.declarations.iter().rev().find_map(|declaration| match declaration {
            Declaration::Other { name: n, value } if n.eq_ignore_ascii_case(name) => Some(value.as_str()),
            _ => None,
        })
    }
}

/// One `unicode-range` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodeRangeToken {
    text: String,
    start: u32,
    end: u32,
}

impl UnicodeRangeToken {
    pub fn new(text: impl Into<String>, start: u32, end: u32) -> Self {
        Self { text: text.into(), start, end }
    }

    /// Token text exactly as written, e.g. `U+4e00-9fff`.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    /// Inclusive.
    pub fn end(&self) -> u32 {
        self.end
    }
}

impl fmt::Display for UnicodeRangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One comma-separated entry of a `src` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    pub location: FontLocation,
    /// `format()` hint.
    pub format: Option<String>,
    /// `tech()` hint, as source text.
    pub tech: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontLocation {
    Url(String),
    Local(String),
}

impl FontSource {
    /// `url(url) format("format")`.
    pub fn url(url: impl Into<String>, format: Format) -> Self {
        Self { location: FontLocation::Url(url.into()), format: Some(format.to_string()), tech: None }
    }

    pub fn url_str(&self) -> Option<&str> {
        match &self.location {
            FontLocation::Url(url) => Some(url),
            FontLocation::Local(_) => None,
        }
    }
}
