//! Shell-style splitting and quoting of command strings.
//!
//! Toolchain description values are written the way a user would write them
//! on a command line, so they are split with the usual shell rules: single
//! quotes are literal, double quotes honour backslash escapes, and an
//! unquoted backslash escapes the next character.

use anyhow::{bail, Result};

/// Split a string into argv tokens using shell quoting rules.
pub fn split_shell_string(s: &str) -> Result<Vec<String>> {
    #[derive(PartialEq)]
    enum State {
        Normal,
        Single,
        Double,
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut state = State::Normal;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '\'' => {
                    state = State::Single;
                    has_token = true;
                }
                '"' => {
                    state = State::Double;
                    has_token = true;
                }
                '\\' => {
                    match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => bail!("trailing backslash in `{}`", s),
                    }
                    has_token = true;
                }
                c if c.is_whitespace() => {
                    if has_token {
                        tokens.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                }
                c => {
                    current.push(c);
                    has_token = true;
                }
            },
            State::Single => match c {
                '\'' => state = State::Normal,
                c => current.push(c),
            },
            State::Double => match c {
                '"' => state = State::Normal,
                '\\' => match chars.next() {
                    Some(escaped @ ('"' | '\\')) => current.push(escaped),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => bail!("trailing backslash in `{}`", s),
                },
                c => current.push(c),
            },
        }
    }

    if state != State::Normal {
        bail!("unterminated quote in `{}`", s);
    }
    if has_token {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Quote a single argument for display in diagnostics.
pub fn quote(arg: &str) -> String {
    let needs_quoting =
        arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'');
    if !needs_quoting {
        return arg.to_string();
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Render a full argv for display, quoting arguments as needed.
pub fn quote_command<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|a| quote(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_words() {
        let toks = split_shell_string("gcc -c   foo.c").unwrap();
        assert_eq!(toks, vec!["gcc", "-c", "foo.c"]);
    }

    #[test]
    fn splits_quoted_words() {
        let toks = split_shell_string(r#"cl.exe "/Fo out dir" '-DNAME=va l'"#).unwrap();
        assert_eq!(toks, vec!["cl.exe", "/Fo out dir", "-DNAME=va l"]);
    }

    #[test]
    fn double_quote_escapes() {
        let toks = split_shell_string(r#""a\"b" "c\\d""#).unwrap();
        assert_eq!(toks, vec![r#"a"b"#, r"c\d"]);
    }

    #[test]
    fn backslash_escapes_whitespace() {
        let toks = split_shell_string(r"a\ b c").unwrap();
        assert_eq!(toks, vec!["a b", "c"]);
    }

    #[test]
    fn empty_quotes_produce_empty_token() {
        let toks = split_shell_string(r#"a "" b"#).unwrap();
        assert_eq!(toks, vec!["a", "", "b"]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(split_shell_string(r#"gcc "unclosed"#).is_err());
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote("gcc"), "gcc");
        assert_eq!(quote("a b"), "\"a b\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(
            quote_command(["gcc", "-c", "my file.c"]),
            "gcc -c \"my file.c\""
        );
    }
}
