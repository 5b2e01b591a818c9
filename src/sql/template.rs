//! Compile `{NAME}` placeholders into PostgreSQL positional parameters.
//!
//! Braces inside quoted strings, quoted identifiers, comments and dollar-quoted
//! bodies are left alone. `{{` and `}}` produce literal braces.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("unterminated placeholder at offset {0}")]
    Unterminated(usize),
    #[error("invalid placeholder name '{0}'")]
    InvalidName(String),
    #[error("unmatched '}}' at offset {0}")]
    StrayBrace(usize),
    #[error("positional parameter at offset {0}; use {{NAME}} placeholders")]
    Positional(usize),
}

/// SQL text rewritten to `$n` form plus the placeholder names in first-occurrence order.
/// `$n` refers to `names[n - 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledSql {
    pub positional: String,
    pub names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    /// `E'...'` literal, where a backslash escapes the next character.
    EscapeQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// True when the quote at `idx` opens an `E'...'` string.
fn opens_escape_string(chars: &[char], idx: usize) -> bool {
    if idx == 0 || !matches!(chars[idx - 1], 'e' | 'E') {
        return false;
    }
    idx < 2 || !(chars[idx - 2].is_ascii_alphanumeric() || chars[idx - 2] == '_')
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `$tag$` opener starting at `idx`, if any.
fn dollar_tag(chars: &[char], idx: usize) -> Option<String> {
    let mut j = idx + 1;
    if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    while let Some(c) = chars.get(j) {
        if *c == '$' {
            return Some(chars[idx..=j].iter().collect());
        }
        if !(c.is_ascii_alphanumeric() || *c == '_') {
            return None;
        }
        j += 1;
    }
    None
}

fn starts_with_at(chars: &[char], idx: usize, tag: &str) -> bool {
    let mut k = idx;
    for t in tag.chars() {
        if chars.get(k) != Some(&t) {
            return false;
        }
        k += 1;
    }
    true
}

pub fn compile_placeholders(sql: &str) -> Result<CompiledSql, PlaceholderError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut state = State::Normal;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            State::Normal => match c {
                '\'' => {
                    state = if opens_escape_string(&chars, i) {
                        State::EscapeQuoted
                    } else {
                        State::SingleQuoted
                    };
                    out.push(c);
                }
                '"' => {
                    state = State::DoubleQuoted;
                    out.push(c);
                }
                '-' if next == Some('-') => {
                    state = State::LineComment;
                    out.push_str("--");
                    i += 1;
                }
                '/' if next == Some('*') => {
                    state = State::BlockComment(1);
                    out.push_str("/*");
                    i += 1;
                }
                '$' => {
                    if next.is_some_and(|n| n.is_ascii_digit()) {
                        return Err(PlaceholderError::Positional(i));
                    }
                    if let Some(tag) = dollar_tag(&chars, i) {
                        out.push_str(&tag);
                        i += tag.chars().count() - 1;
                        state = State::DollarQuoted(tag);
                    } else {
                        out.push(c);
                    }
                }
                '{' if next == Some('{') => {
                    out.push('{');
                    i += 1;
                }
                '{' => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|ch| *ch == '}')
                        .map(|p| i + 1 + p)
                        .ok_or(PlaceholderError::Unterminated(i))?;
                    let name: String = chars[i + 1..close].iter().collect();
                    if !is_valid_name(&name) {
                        return Err(PlaceholderError::InvalidName(name));
                    }
                    let index = match names.iter().position(|n| *n == name) {
                        Some(p) => p + 1,
                        None => {
                            names.push(name);
                            names.len()
                        }
                    };
                    out.push('$');
                    out.push_str(&index.to_string());
                    i = close;
                }
                '}' if next == Some('}') => {
                    out.push('}');
                    i += 1;
                }
                '}' => return Err(PlaceholderError::StrayBrace(i)),
                _ => out.push(c),
            },
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if state == State::SingleQuoted { '\'' } else { '"' };
                out.push(c);
                if c == quote {
                    if next == Some(quote) {
                        out.push(quote);
                        i += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::EscapeQuoted => {
                out.push(c);
                if c == '\\' {
                    if let Some(n) = next {
                        out.push(n);
                        i += 1;
                    }
                } else if c == '\'' {
                    if next == Some('\'') {
                        out.push('\'');
                        i += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                out.push(c);
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if c == '/' && next == Some('*') {
                    out.push_str("/*");
                    i += 1;
                    state = State::BlockComment(depth + 1);
                } else if c == '*' && next == Some('/') {
                    out.push_str("*/");
                    i += 1;
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                } else {
                    out.push(c);
                }
            }
            State::DollarQuoted(ref tag) => {
                if c == '$' && starts_with_at(&chars, i, tag) {
                    out.push_str(tag);
                    i += tag.chars().count() - 1;
                    state = State::Normal;
                } else {
                    out.push(c);
                }
            }
        }
        i += 1;
    }

    Ok(CompiledSql { positional: out, names })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_named_placeholders_in_order() {
        let c = compile_placeholders("SELECT * FROM widgets WHERE id={ID} AND owner = {OWNER}").unwrap();
        assert_eq!(c.positional, "SELECT * FROM widgets WHERE id=$1 AND owner = $2");
        assert_eq!(c.names, vec!["ID", "OWNER"]);
    }

    #[test]
    fn repeated_name_reuses_index() {
        let c = compile_placeholders("UPDATE t SET a = {A}, b = {B} WHERE a <> {A}").unwrap();
        assert_eq!(c.positional, "UPDATE t SET a = $1, b = $2 WHERE a <> $1");
        assert_eq!(c.names, vec!["A", "B"]);
    }

    #[test]
    fn no_placeholders() {
        let c = compile_placeholders("SELECT now()").unwrap();
        assert_eq!(c.positional, "SELECT now()");
        assert!(c.names.is_empty());
    }

    #[test]
    fn skips_literals_comments_and_dollar_bodies() {
        let sql = "SELECT '{1,2}'::int[], \"{x}\" -- {C}\n/* {D} /* {E} */ */ $f${F}$f$ FROM t WHERE k = {K}";
        let c = compile_placeholders(sql).unwrap();
        assert_eq!(c.names, vec!["K"]);
        assert_eq!(
            c.positional,
            "SELECT '{1,2}'::int[], \"{x}\" -- {C}\n/* {D} /* {E} */ */ $f${F}$f$ FROM t WHERE k = $1"
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        let c = compile_placeholders("SELECT {{N}} , {N}").unwrap();
        assert_eq!(c.positional, "SELECT {N} , $1");
        assert_eq!(c.names, vec!["N"]);
    }

    #[test]
    fn escaped_quote_stays_in_literal() {
        let c = compile_placeholders("SELECT 'it''s {not}' || {YES}").unwrap();
        assert_eq!(c.names, vec!["YES"]);
    }

    #[test]
    fn backslash_escapes_in_e_strings() {
        let c = compile_placeholders(r"SELECT E'it\'s {X}', {Y}").unwrap();
        assert_eq!(c.positional, r"SELECT E'it\'s {X}', $1");
        assert_eq!(c.names, vec!["Y"]);

        let c = compile_placeholders(r"SELECT e'a\\', {Y}").unwrap();
        assert_eq!(c.positional, r"SELECT e'a\\', $1");

        // an identifier ending in e does not start an escape string
        let c = compile_placeholders(r"SELECT name'x\', {Y}").unwrap();
        assert_eq!(c.names, vec!["Y"]);
    }

    #[test]
    fn rejects_malformed_templates() {
        assert_eq!(compile_placeholders("SELECT {ID").unwrap_err(), PlaceholderError::Unterminated(7));
        assert_eq!(
            compile_placeholders("SELECT {1x}").unwrap_err(),
            PlaceholderError::InvalidName("1x".into())
        );
        assert_eq!(compile_placeholders("SELECT }").unwrap_err(), PlaceholderError::StrayBrace(7));
        assert_eq!(compile_placeholders("SELECT $1").unwrap_err(), PlaceholderError::Positional(7));
    }
}
