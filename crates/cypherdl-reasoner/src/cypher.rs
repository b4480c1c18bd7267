//! Cypher lexical helpers: label quoting and literal rendering.

use cypherdl_model::Literal;

use crate::error::{ReasonerError, Result};

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render a schema name (label, relationship type or key) as a Cypher
/// symbolic name. Plain identifiers stay bare; anything else is wrapped in
/// backticks with embedded backticks doubled.
pub fn schema_name(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Render a URI used as a label, relationship type or attribute key.
///
/// URIs are always backtick-quoted. A URI containing a backtick is rejected
/// instead of escaped.
pub fn uri_name(uri: &str) -> Result<String> {
    if uri.is_empty() || uri.contains('`') {
        return Err(ReasonerError::InvalidIdentifier(uri.to_string()));
    }
    Ok(format!("`{uri}`"))
}

/// Single-quoted Cypher string literal.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Render a literal for inline comparison. Strings are quoted; every other
/// kind is written bare.
pub fn literal(value: &Literal) -> Result<String> {
    match value {
        Literal::Integer(v) => Ok(v.to_string()),
        Literal::Float(v) if v.is_finite() => Ok(format!("{v:?}")),
        Literal::Float(v) => Err(ReasonerError::unsupported(format!(
            "non-finite float literal {v}"
        ))),
        Literal::String(v) => Ok(string_literal(v)),
        Literal::Boolean(v) => Ok(v.to_string()),
    }
}

/// Whether `name` can be used as a query variable.
pub fn is_variable_name(name: &str) -> bool {
    is_plain_identifier(name)
}
