use std::fmt::{self, Write};

use cssparser::serialize_string;

use super::{Declaration, FontFaceRule, FontLocation, FontSource, Rule, Stylesheet, UnicodeRangeToken};

/// Output formatting for [`serialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Spaces per indentation level.
    pub indent: usize,
    /// Put each list item of a `src` or `unicode-range` declaration on its
    /// own line when the declaration would be longer than this.
    pub line_width: Option<usize>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { indent: 2, line_width: None }
    }
}

/// Render a stylesheet as CSS text.
pub fn serialize(sheet: &Stylesheet, options: &SerializeOptions) -> String {
    let mut css = String::new();
    // Writing to a String cannot fail.
    let _ = write_stylesheet(sheet, options, &mut css);
    css
}

pub(super) fn write_stylesheet<W: Write>(sheet: &Stylesheet, options: &SerializeOptions, dest: &mut W) -> fmt::Result {
    let mut previous: Option<&Rule> = None;

    for rule in sheet.rules() {
        match previous {
            Some(Rule::Comment(_)) => dest.write_char('\n')?,
            Some(_) => dest.write_str("\n\n")?,
            None => {}
        }
        match rule {
            Rule::FontFace(face) => write_font_face(face, options, dest)?,
            Rule::Comment(text) => write!(dest, "/* {text} */")?,
            Rule::Other(text) => dest.write_str(text)?,
        }
        previous = Some(rule);
    }

    if previous.is_some() {
        dest.write_char('\n')?;
    }
    Ok(())
}

fn write_font_face<W: Write>(face: &FontFaceRule, options: &SerializeOptions, dest: &mut W) -> fmt::Result {
    dest.write_str("@font-face {\n")?;
    for declaration in face.declarations() {
        let (name, values) = match declaration {
            Declaration::FontFamily(family) => ("font-family", vec![quoted(family)?]),
            Declaration::UnicodeRange(ranges) => {
                ("unicode-range", ranges.iter().map(UnicodeRangeToken::to_string).collect())
            }
            Declaration::Src(sources) => ("src", sources.iter().map(source_css).collect::<Result<_, _>>()?),
            Declaration::Other { name, value } => (name.as_str(), vec![value.clone()]),
        };
        write_declaration(name, &values, options, dest)?;
    }
    dest.write_char('}')
}

fn write_declaration<W: Write>(
    name: &str,
    values: &[String],
    options: &SerializeOptions,
    dest: &mut W,
) -> fmt::Result {
    let indent = " ".repeat(options.indent);
    let single_line = values.join(", ");
    let width = indent.len() + name.len() + 2 + single_line.len() + 1;

    match options.line_width {
        Some(limit) if width > limit && values.len() > 1 => {
            writeln!(dest, "{indent}{name}:")?;
            for (i, value) in values.iter().enumerate() {
                let end = if i + 1 == values.len() { ";" } else { "," };
                writeln!(dest, "{indent}{indent}{value}{end}")?;
            }
            Ok(())
        }
        _ => writeln!(dest, "{indent}{name}: {single_line};"),
    }
}

fn source_css(source: &FontSource) -> Result<String, fmt::Error> {
    let mut css = match &source.location {
        FontLocation::Url(url) => url_css(url)?,
        FontLocation::Local(name) => format!("local({})", quoted(name)?),
    };
    if let Some(format) = &source.format {
        write!(css, " format({})", quoted(format)?)?;
    }
    if let Some(tech) = &source.tech {
        write!(css, " tech({tech})")?;
    }
    Ok(css)
}

fn url_css(url: &str) -> Result<String, fmt::Error> {
    let needs_quotes = url
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '(' | ')' | '"' | '\'' | '\\'));
    if needs_quotes { Ok(format!("url({})", quoted(url)?)) } else { Ok(format!("url({url})")) }
}

fn quoted(value: &str) -> Result<String, fmt::Error> {
    let mut css = String::new();
    serialize_string(value, &mut css)?;
    Ok(css)
}
