//! Template string parser
//!
//! Scans template text into literal spans and `${...}` placeholders, then
//! parses each placeholder into a property path or helper call. The
//! grammar is deliberately tiny: dotted paths with numeric indices,
//! single-level calls with path or string-literal arguments.

use super::ast::{Arg, Expr, HelperCall, PathRoot, PathSegment, PropertyPath, Segment, Template};
use crate::{CoreError, Result};

/// Cheap pre-check used to skip leaves with nothing to interpolate.
pub fn contains_placeholder(text: &str) -> bool {
    text.contains("${")
}

/// Parse one template string.
pub fn parse_template(text: &str) -> Result<Template> {
    let mut segments = Vec::new();
    let bytes = text.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if literal_start < i {
                segments.push(Segment::Literal(text[literal_start..i].to_string()));
            }

            let expr_start = i + 2;
            let expr_end = find_closing_brace(text, expr_start)
                .ok_or_else(|| parse_error(text, "unterminated '${'"))?;

            let expr = parse_expr(&text[expr_start..expr_end], text)?;
            segments.push(Segment::Placeholder(expr));

            i = expr_end + 1;
            literal_start = i;
        } else {
            i += 1;
        }
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(text[literal_start..].to_string()));
    }

    Ok(Template { segments })
}

/// Find the `}` closing a placeholder, skipping over quoted argument text.
fn find_closing_brace(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1; // skip the escaped character
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'}' => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }

    None
}

fn parse_expr(expr: &str, template: &str) -> Result<Expr> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(parse_error(template, "empty placeholder"));
    }

    match expr.find('(') {
        Some(open) => {
            let name = expr[..open].trim();
            if !is_identifier(name) {
                return Err(parse_error(
                    template,
                    &format!("invalid helper name '{name}'"),
                ));
            }
            let close = expr
                .rfind(')')
                .ok_or_else(|| parse_error(template, "unterminated helper call"))?;
            if expr[close + 1..].trim() != "" {
                return Err(parse_error(template, "trailing text after helper call"));
            }

            let args = parse_args(&expr[open + 1..close], template)?;
            Ok(Expr::Call(HelperCall {
                name: name.to_string(),
                args,
            }))
        }
        None => Ok(Expr::Path(parse_path(expr, template)?)),
    }
}

fn parse_args(args: &str, template: &str) -> Result<Vec<Arg>> {
    let mut out = Vec::new();
    for piece in split_top_level(args, template)? {
        let piece = piece.trim();
        if piece.is_empty() {
            return Err(parse_error(template, "empty helper argument"));
        }
        if piece.starts_with('\'') || piece.starts_with('"') {
            out.push(Arg::Literal(parse_string_literal(piece, template)?));
        } else {
            out.push(Arg::Path(parse_path(piece, template)?));
        }
    }
    Ok(out)
}

/// Split an argument list on commas that are not inside a quoted literal.
fn split_top_level<'a>(args: &'a str, template: &str) -> Result<Vec<&'a str>> {
    let mut pieces = Vec::new();
    let bytes = args.as_bytes();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b',' => {
                    pieces.push(&args[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }

    if quote.is_some() {
        return Err(parse_error(template, "unterminated string literal"));
    }
    if !pieces.is_empty() || !args.trim().is_empty() {
        pieces.push(&args[start..]);
    }

    Ok(pieces.into_iter().filter(|p| !p.trim().is_empty()).collect())
}

fn parse_string_literal(text: &str, template: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let quote = bytes[0];
    if bytes.len() < 2 || bytes[bytes.len() - 1] != quote {
        return Err(parse_error(template, "unterminated string literal"));
    }

    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return Err(parse_error(template, "dangling escape in string literal")),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn parse_path(path: &str, template: &str) -> Result<PropertyPath> {
    let (root, rest) = if path == "@input" {
        (PathRoot::Input, "")
    } else if let Some(rest) = path.strip_prefix("@input.") {
        (PathRoot::Input, rest)
    } else if path.starts_with('@') {
        return Err(parse_error(
            template,
            &format!("unknown reference '{path}'; only '@input' is recognized"),
        ));
    } else {
        (PathRoot::Context, path)
    };

    let mut segments = Vec::new();
    if !rest.is_empty() {
        for part in rest.split('.') {
            if part.chars().all(|c| c.is_ascii_digit()) && !part.is_empty() {
                // numeric segments index into arrays
                segments.push(PathSegment::Index(part.parse().map_err(|_| {
                    parse_error(template, &format!("index '{part}' out of range"))
                })?));
            } else if is_identifier(part) {
                segments.push(PathSegment::Key(part.to_string()));
            } else {
                return Err(parse_error(
                    template,
                    &format!("invalid path segment '{part}'"),
                ));
            }
        }
    }

    if root == PathRoot::Context && segments.is_empty() {
        return Err(parse_error(template, "empty property path"));
    }

    Ok(PropertyPath { root, segments })
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_error(template: &str, message: &str) -> CoreError {
    CoreError::TemplateParse {
        template: template.to_string(),
        message: message.to_string(),
    }
}
