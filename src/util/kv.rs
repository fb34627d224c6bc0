//! Parser for the line-oriented `Key: value` format used by toolchain
//! description files. Indentation is insignificant; `#` starts a comment
//! line; keys may repeat (accumulation is the reader's concern, not the
//! parser's).

use crate::error::UserError;

/// One `Key: value` entry, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Parse a `Key: value` document into an ordered pair list.
pub fn parse_kv_text(text: &str, context: &str) -> Result<Vec<KeyValue>, UserError> {
    let mut pairs = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(UserError::MalformedKeyValue {
                context: context.to_string(),
                line: idx + 1,
            });
        };
        pairs.push(KeyValue {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        });
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_in_order() {
        let text = "Compiler-ID: GNU\nFlags: -fno-inline\nFlags: -fstack-protector\n";
        let pairs = parse_kv_text(text, "test").unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].key, "Compiler-ID");
        assert_eq!(pairs[0].value, "GNU");
        assert_eq!(pairs[2].value, "-fstack-protector");
    }

    #[test]
    fn skips_comments_and_blanks() {
        let text = "# a toolchain\n\n  Compiler-ID: Clang  \n";
        let pairs = parse_kv_text(text, "test").unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].value, "Clang");
    }

    #[test]
    fn indentation_is_ignored() {
        let pairs = parse_kv_text("    Debug: True", "test").unwrap();
        assert_eq!(pairs[0].key, "Debug");
    }

    #[test]
    fn rejects_lines_without_separator() {
        let err = parse_kv_text("Compiler-ID GNU", "tc.file").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
