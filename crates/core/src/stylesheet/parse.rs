use std::fmt;

use cssparser::{
    BasicParseErrorKind, Delimiter, ParseError, ParseErrorKind, Parser, ParserInput, ToCss, Token,
    UnicodeRange,
};

use super::{Declaration, FontFaceRule, FontLocation, FontSource, Rule, Stylesheet, UnicodeRangeToken};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyntaxError {
    FontFaceWithoutBlock,
    EmptyFamily,
    EmptyList(&'static str),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::FontFaceWithoutBlock => f.write_str("@font-face must be followed by a block"),
            SyntaxError::EmptyFamily => f.write_str("empty font family name"),
            SyntaxError::EmptyList(property) => write!(f, "{property} has no values"),
        }
    }
}

type ParseResult<'i, T> = std::result::Result<T, ParseError<'i, SyntaxError>>;

pub(super) fn parse_stylesheet(css: &str) -> Result<Stylesheet> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    parse_rules(&mut parser).map(Stylesheet::from_rules).map_err(to_error)
}

fn parse_rules<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<Rule>> {
    let mut rules = Vec::new();
    let mut font_faces = 0;

    loop {
        let start = parser.position();
        let Ok(token) = parser.next_including_whitespace_and_comments().cloned() else {
            break;
        };

        match token {
            Token::WhiteSpace(_) => {}
            Token::Comment(text) => rules.push(Rule::Comment(text.trim().to_string())),
            Token::AtKeyword(ref name) if name.eq_ignore_ascii_case("font-face") => {
                match parser.next().cloned()? {
                    Token::CurlyBracketBlock => {}
                    _ => return Err(parser.new_custom_error(SyntaxError::FontFaceWithoutBlock)),
                }
                let declarations = parser.parse_nested_block(parse_font_face_body)?;
                rules.push(Rule::FontFace(FontFaceRule::new(font_faces, declarations)));
                font_faces += 1;
            }
            token if is_unmatched_close(&token) => return Err(parser.new_unexpected_token_error(token)),
            token => {
                skip_rule(parser, token)?;
                rules.push(Rule::Other(parser.slice_from(start).trim().to_string()));
            }
        }
    }

    Ok(rules)
}

/// Consume tokens up to the end of the current rule: a top-level `;` or
/// the rule's `{}` block.
fn skip_rule<'i>(parser: &mut Parser<'i, '_>, first: Token<'i>) -> ParseResult<'i, ()> {
    let mut token = first;
    loop {
        match token {
            Token::Semicolon => return Ok(()),
            Token::CurlyBracketBlock => return parser.parse_nested_block(consume_all),
            token if is_unmatched_close(&token) => return Err(parser.new_unexpected_token_error(token)),
            _ => {}
        }
        token = match parser.next_including_whitespace_and_comments().cloned() {
            Ok(token) => token,
            Err(_) => return Ok(()),
        };
    }
}

/// A closing bracket seen outside the block it would close.
fn is_unmatched_close(token: &Token<'_>) -> bool {
    matches!(token, Token::CloseCurlyBracket | Token::CloseParenthesis | Token::CloseSquareBracket)
}

fn consume_all<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, ()> {
    while parser.next_including_whitespace_and_comments().is_ok() {}
    Ok(())
}

fn parse_font_face_body<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<Declaration>> {
    let mut declarations = Vec::new();

    loop {
        let Ok(token) = parser.next().cloned() else {
            break;
        };
        match token {
            Token::Semicolon => {}
            Token::Ident(name) => {
                let name = name.to_string();
                let declaration = parser.parse_until_after(Delimiter::Semicolon, |parser| {
                    parser.expect_colon()?;
                    parse_declaration(name, parser)
                })?;
                declarations.push(declaration);
            }
            token => return Err(parser.new_unexpected_token_error(token)),
        }
    }

    Ok(declarations)
}

fn parse_declaration<'i>(name: String, parser: &mut Parser<'i, '_>) -> ParseResult<'i, Declaration> {
    if name.eq_ignore_ascii_case("font-family") {
        family_argument(parser).map(Declaration::FontFamily)
    } else if name.eq_ignore_ascii_case("unicode-range") {
        parse_unicode_ranges(parser).map(Declaration::UnicodeRange)
    } else if name.eq_ignore_ascii_case("src") {
        parse_sources(parser).map(Declaration::Src)
    } else {
        raw_argument(parser).map(|value| Declaration::Other { name, value })
    }
}

fn parse_unicode_ranges<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<UnicodeRangeToken>> {
    let mut ranges = Vec::new();

    loop {
        if ranges.is_empty() && parser.is_exhausted() {
            return Err(parser.new_custom_error(SyntaxError::EmptyList("unicode-range")));
        }
        let start = parser.position();
        let range = UnicodeRange::parse(parser)?;
        let text = parser.slice_from(start).trim();
        ranges.push(UnicodeRangeToken::new(text, range.start, range.end));

        match parser.next().cloned() {
            Err(_) => return Ok(ranges),
            Ok(Token::Comma) => {}
            Ok(token) => return Err(parser.new_unexpected_token_error(token)),
        }
    }
}

fn parse_sources<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<FontSource>> {
    let mut sources = Vec::new();

    loop {
        if sources.is_empty() && parser.is_exhausted() {
            return Err(parser.new_custom_error(SyntaxError::EmptyList("src")));
        }
        let location = match parser.next().cloned()? {
            Token::UnquotedUrl(url) => FontLocation::Url(url.to_string()),
            Token::Function(ref name) if name.eq_ignore_ascii_case("url") => {
                FontLocation::Url(parser.parse_nested_block(string_argument)?)
            }
            Token::Function(ref name) if name.eq_ignore_ascii_case("local") => {
                FontLocation::Local(parser.parse_nested_block(family_argument)?)
            }
            token => return Err(parser.new_unexpected_token_error(token)),
        };
        let mut source = FontSource { location, format: None, tech: None };

        loop {
            match parser.next().cloned() {
                Err(_) => {
                    sources.push(source);
                    return Ok(sources);
                }
                Ok(Token::Comma) => break,
                Ok(Token::Function(ref name)) if name.eq_ignore_ascii_case("format") => {
                    source.format = Some(parser.parse_nested_block(string_argument)?);
                }
                Ok(Token::Function(ref name)) if name.eq_ignore_ascii_case("tech") => {
                    source.tech = Some(parser.parse_nested_block(raw_argument)?);
                }
                Ok(token) => return Err(parser.new_unexpected_token_error(token)),
            }
        }
        sources.push(source);
    }
}

/// A single string or identifier.
fn string_argument<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, String> {
    let value = match parser.next().cloned()? {
        Token::QuotedString(value) | Token::Ident(value) => value.to_string(),
        token => return Err(parser.new_unexpected_token_error(token)),
    };
    parser.expect_exhausted()?;
    Ok(value)
}

/// A quoted family name, or a run of identifiers joined by single spaces.
fn family_argument<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, String> {
    let family = match parser.next().cloned()? {
        Token::QuotedString(value) => {
            parser.expect_exhausted()?;
            value.to_string()
        }
        Token::Ident(first) => {
            let mut words = vec![first.to_string()];
            while let Ok(word) = parser.try_parse(|parser| parser.expect_ident_cloned()) {
                words.push(word.to_string());
            }
            parser.expect_exhausted()?;
            words.join(" ")
        }
        token => return Err(parser.new_unexpected_token_error(token)),
    };

    if family.trim().is_empty() {
        return Err(parser.new_custom_error(SyntaxError::EmptyFamily));
    }
    Ok(family)
}

/// Remaining source text, trimmed.
fn raw_argument<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, String> {
    let start = parser.position();
    consume_all(parser)?;
    Ok(parser.slice_from(start).trim().to_string())
}

fn to_error(err: ParseError<'_, SyntaxError>) -> Error {
    let message = match err.kind {
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected token '{}'", token.to_css_string())
        }
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => "unexpected end of input".to_string(),
        ParseErrorKind::Basic(kind) => format!("{kind:?}"),
        ParseErrorKind::Custom(err) => err.to_string(),
    };
    Error::Parse { line: err.location.line + 1, column: err.location.column, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(css: &str) -> (u32, String) {
        match parse_stylesheet(css) {
            Err(Error::Parse { line, message, .. }) => (line, message),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_keeps_other_rules_and_comments() {
        let css = "@charset \"utf-8\";\n/* a */\nbody { color: red; }\n@font-face { font-family: A; }\n";
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(
            sheet.rules()[..3],
            [
                Rule::Other("@charset \"utf-8\";".to_string()),
                Rule::Comment("a".to_string()),
                Rule::Other("body { color: red; }".to_string()),
            ]
        );
        assert!(matches!(sheet.rules()[3], Rule::FontFace(_)));
    }

    #[test]
    fn test_unquoted_family() {
        let sheet = parse_stylesheet("@font-face { font-family: Noto  Sans SC; }").unwrap();
        assert_eq!(sheet.font_faces().next().unwrap().family(), Some("Noto Sans SC"));
    }

    #[test]
    fn test_src_hints() {
        let sheet = parse_stylesheet(
            "@font-face { src: local(\"Foo Bold\"), url('a b.woff2') format(woff2) tech(variations), url(x.ttf); }",
        )
        .unwrap();
        let src = sheet.font_faces().next().unwrap().src();
        assert_eq!(src.len(), 3);
        assert_eq!(src[0].location, FontLocation::Local("Foo Bold".to_string()));
        assert_eq!(src[1].url_str(), Some("a b.woff2"));
        assert_eq!(src[1].format.as_deref(), Some("woff2"));
        assert_eq!(src[1].tech.as_deref(), Some("variations"));
        assert_eq!(src[2].format, None);
    }

    #[test]
    fn test_unicode_range_text_is_verbatim() {
        let sheet = parse_stylesheet("@font-face { unicode-range: U+0-FF,U+4??, u+1F600 ; }").unwrap();
        let ranges = sheet.font_faces().next().unwrap().unicode_ranges().to_vec();
        let text: Vec<_> = ranges.iter().map(|range| range.as_str()).collect();
        assert_eq!(text, ["U+0-FF", "U+4??", "u+1F600"]);
        assert_eq!((ranges[1].start(), ranges[1].end()), (0x400, 0x4FF));
    }

    #[test]
    fn test_other_declaration_value_kept() {
        let sheet =
            parse_stylesheet("@font-face { font-feature-settings: \"liga\" 1, \"kern\"; size-adjust: 90%; }").unwrap();
        let face = sheet.font_faces().next().unwrap();
        assert_eq!(face.property("font-feature-settings"), Some("\"liga\" 1, \"kern\""));
        assert_eq!(face.property("SIZE-ADJUST"), Some("90%"));
    }

    #[test]
    fn test_font_face_indexes_skip_other_rules() {
        let sheet = parse_stylesheet("@font-face {} p {} @font-face {}").unwrap();
        let indexes: Vec<_> = sheet.font_faces().map(FontFaceRule::index).collect();
        assert_eq!(indexes, [0, 1]);
    }

    #[test]
    fn test_error_reports_line() {
        let (line, message) = parse_err("/* x */\n@font-face {\n  src: 42;\n}\n");
        assert_eq!(line, 3);
        assert!(message.contains("unexpected token"), "{message}");
    }

    #[test]
    fn test_font_face_without_block() {
        let (_, message) = parse_err("@font-face;");
        assert_eq!(message, "@font-face must be followed by a block");
    }

    #[test]
    fn test_stray_close_bracket_rejected() {
        let (line, message) = parse_err("} @font-face { unicode-range: U+41; } @font-face { unicode-range: U+42; }");
        assert_eq!(line, 1);
        assert_eq!(message, "unexpected token '}'");

        let (_, message) = parse_err("p ) @font-face { unicode-range: U+41; }");
        assert_eq!(message, "unexpected token ')'");
    }

    #[test]
    fn test_nested_brackets_in_other_rule() {
        let sheet = parse_stylesheet("@media (min-width: 1px) { p { color: red; } } @font-face { unicode-range: U+41; }")
            .unwrap();
        assert_eq!(sheet.font_face_count(), 1);
        assert_eq!(sheet.font_faces().next().unwrap().unicode_ranges()[0].as_str(), "U+41");
    }

    #[test]
    fn test_empty_src() {
        let (_, message) = parse_err("@font-face { src: ; }");
        assert_eq!(message, "src has no values");
    }
}
