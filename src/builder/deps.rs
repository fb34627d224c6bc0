//! Consumption of compiler-emitted header dependency information.
//!
//! Two formats exist in the wild: the GNU family writes a makefile rule to
//! a sidecar `.d` file, and MSVC interleaves `Note: including file:` lines
//! with its normal output when `/showIncludes` is passed.

use std::path::PathBuf;

use anyhow::{bail, Result};

/// Header dependencies of one compiled object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDeps {
    /// The object file the dependencies belong to.
    pub output: PathBuf,
    /// Every input the compiler consulted, source included.
    pub inputs: Vec<PathBuf>,
}

/// Prefix of an MSVC `/showIncludes` line.
pub const MSVC_INCLUDE_PREFIX: &str = "Note: including file:";

/// Parse a GNU-make dependency rule: a single target, a colon, and
/// whitespace-separated prerequisites with `\` line continuations and
/// `\ `-escaped spaces.
pub fn parse_mkfile_deps(content: &str) -> Result<FileDeps> {
    let words = lex_mkfile_words(content);
    let Some((first, rest)) = words.split_first() else {
        bail!("empty dependency file");
    };

    let (output, inputs) = if let Some(target) = first.strip_suffix(':') {
        (target.to_string(), rest)
    } else if rest.first().map(|w| w.as_str()) == Some(":") {
        (first.clone(), &rest[1..])
    } else {
        bail!("malformed dependency file: no rule target found");
    };

    if output.is_empty() {
        bail!("malformed dependency file: empty rule target");
    }

    Ok(FileDeps {
        output: PathBuf::from(output),
        inputs: rest_to_paths(inputs),
    })
}

fn rest_to_paths(words: &[String]) -> Vec<PathBuf> {
    words.iter().map(PathBuf::from).collect()
}

/// Split makefile-rule text into words, honouring `\`-newline
/// continuations, `\ `-escaped spaces, and `$$` dollar escapes.
fn lex_mkfile_words(content: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                // Line continuation acts as plain whitespace.
                Some('\n') => {
                    chars.next();
                    flush(&mut words, &mut current);
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    flush(&mut words, &mut current);
                }
                Some(' ') => {
                    chars.next();
                    current.push(' ');
                }
                Some('\\') => {
                    chars.next();
                    current.push('\\');
                }
                _ => current.push('\\'),
            },
            '$' => {
                if chars.peek() == Some(&'$') {
                    chars.next();
                }
                current.push('$');
            }
            c if c.is_whitespace() => flush(&mut words, &mut current),
            c => current.push(c),
        }
    }
    flush(&mut words, &mut current);
    words
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

/// Strip MSVC `/showIncludes` notes out of captured compiler output.
/// Returns the included files (depth padding discarded) and the remaining
/// output with the note lines removed.
pub fn parse_msvc_deps(output: &str) -> (Vec<PathBuf>, String) {
    let mut inputs = Vec::new();
    let mut cleaned = String::new();

    for line in output.lines() {
        if let Some(path) = line.strip_prefix(MSVC_INCLUDE_PREFIX) {
            inputs.push(PathBuf::from(path.trim_start()));
        } else {
            cleaned.push_str(line);
            cleaned.push('\n');
        }
    }

    (inputs, cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rule() {
        let deps = parse_mkfile_deps("a.o: a.cpp a.hpp util.hpp\n").unwrap();
        assert_eq!(deps.output, PathBuf::from("a.o"));
        assert_eq!(
            deps.inputs,
            vec![
                PathBuf::from("a.cpp"),
                PathBuf::from("a.hpp"),
                PathBuf::from("util.hpp")
            ]
        );
    }

    #[test]
    fn parses_continuations_and_escaped_spaces() {
        let deps = parse_mkfile_deps("obj/a.cpp.o: a.cpp \\\n  my\\ header.hpp \\\n  b.hpp\n")
            .unwrap();
        assert_eq!(deps.output, PathBuf::from("obj/a.cpp.o"));
        assert_eq!(
            deps.inputs,
            vec![
                PathBuf::from("a.cpp"),
                PathBuf::from("my header.hpp"),
                PathBuf::from("b.hpp")
            ]
        );
    }

    #[test]
    fn parses_detached_colon() {
        let deps = parse_mkfile_deps("a.o : a.c\n").unwrap();
        assert_eq!(deps.output, PathBuf::from("a.o"));
        assert_eq!(deps.inputs, vec![PathBuf::from("a.c")]);
    }

    #[test]
    fn dollar_escapes_collapse() {
        let deps = parse_mkfile_deps("a.o: pa$$th.h\n").unwrap();
        assert_eq!(deps.inputs, vec![PathBuf::from("pa$th.h")]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_mkfile_deps("").is_err());
        assert!(parse_mkfile_deps("no-colon-here a.c").is_err());
    }

    #[test]
    fn msvc_notes_are_extracted_and_stripped() {
        let output = "a.cpp\n\
                      Note: including file: C:\\inc\\vector\n\
                      Note: including file:  C:\\inc\\nested.h\n\
                      a.cpp(10): warning C4100: unreferenced\n";
        let (inputs, cleaned) = parse_msvc_deps(output);
        assert_eq!(
            inputs,
            vec![
                PathBuf::from("C:\\inc\\vector"),
                PathBuf::from("C:\\inc\\nested.h")
            ]
        );
        assert!(cleaned.contains("warning C4100"));
        assert!(!cleaned.contains("including file"));
    }
}
