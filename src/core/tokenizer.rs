// src/core/tokenizer.rs

use thiserror::Error;

/// A line that cannot be split into arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A quoted span was still open at the end of the line.
    #[error("ParseError: unterminated quote")]
    UnterminatedQuote,
    /// The line ended with a backslash.
    #[error("ParseError: stray backslash")]
    StrayBackslash,
}

/// Splits a raw input line into an argument vector.
///
/// # Rules:
/// - Whitespace outside quotes separates arguments.
/// - A backslash escapes the next character, inside quotes too.
/// - `'` and `"` open a quoted span that only the same character closes. The
///   quote characters themselves are consumed.
/// - An empty quoted span (`""`) still produces an (empty) argument.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Tracks whether `current` holds a token, even an empty one from `""`.
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or(ParseError::StrayBackslash)?;
                current.push(escaped);
                in_token = true;
            }
            '"' | '\'' if quote == Some(c) => quote = None,
            '"' | '\'' if quote.is_none() => {
                quote = Some(c);
                in_token = true;
            }
            c if c.is_whitespace() && quote.is_none() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_token {
        tokens.push(current);
    }

    log::trace!("Tokenized {:?} into {:?}", line, tokens);
    Ok(tokens)
}

/// Detects a trailing, unescaped and unquoted `&` that requests backgrounding.
/// Returns the line without it when present.
pub fn strip_background_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    let body = trimmed.strip_suffix('&')?;

    // `&&` is not a background request.
    if body.ends_with('&') {
        return None;
    }
    // An odd run of backslashes right before the `&` escapes it.
    let backslashes = body.chars().rev().take_while(|c| *c == '\\').count();
    if backslashes % 2 == 1 {
        return None;
    }
    // A quote left open before the `&` means the `&` is quoted.
    if has_open_quote(body) {
        return None;
    }

    let command = body.trim_end();
    if command.is_empty() {
        None
    } else {
        Some(command)
    }
}

fn has_open_quote(text: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' | '\'' if quote == Some(c) => quote = None,
            '"' | '\'' if quote.is_none() => quote = Some(c),
            _ => {}
        }
    }
    quote.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn test_whitespace_splits_arguments() {
        assert_eq!(toks("  ls   -la\t/tmp  "), vec!["ls", "-la", "/tmp"]);
        assert!(toks("   ").is_empty());
    }

    #[test]
    fn test_quotes_suppress_splitting_and_are_consumed() {
        assert_eq!(
            toks(r#"echo "hello world" 'single quoted'"#),
            vec!["echo", "hello world", "single quoted"]
        );
        assert_eq!(toks(r#"a"b c"d"#), vec!["ab cd"]);
        assert_eq!(toks(r#"echo """#), vec!["echo", ""]);
    }

    #[test]
    fn test_other_quote_kind_is_literal_inside_a_span() {
        assert_eq!(toks(r#"say "it's fine""#), vec!["say", "it's fine"]);
        assert_eq!(toks(r#"say 'a "b" c'"#), vec!["say", r#"a "b" c"#]);
    }

    #[test]
    fn test_backslash_escapes_next_character() {
        assert_eq!(toks(r"one\ two three"), vec!["one two", "three"]);
        assert_eq!(toks(r#""a \" b""#), vec![r#"a " b"#]);
        assert_eq!(toks(r"\\"), vec![r"\"]);
    }

    #[test]
    fn test_unterminated_quote_fails() {
        assert_eq!(tokenize(r#"echo "oops"#), Err(ParseError::UnterminatedQuote));
        assert_eq!(tokenize("echo 'oops"), Err(ParseError::UnterminatedQuote));
        assert_eq!(
            ParseError::UnterminatedQuote.to_string(),
            "ParseError: unterminated quote"
        );
    }

    #[test]
    fn test_stray_backslash_fails() {
        assert_eq!(tokenize(r"echo oops\"), Err(ParseError::StrayBackslash));
        assert_eq!(
            ParseError::StrayBackslash.to_string(),
            "ParseError: stray backslash"
        );
    }

    #[test]
    fn test_rejoining_reproduces_unquoted_content() {
        let segments = ["alpha", "\"beta gamma\"", "'delta'", "epsilon"];
        let line = segments.join(" ");
        let expected = "alpha beta gamma delta epsilon";
        assert_eq!(toks(&line).join(" "), expected);
    }

    #[test]
    fn test_background_marker_detection() {
        assert_eq!(strip_background_marker("sleep 5 &"), Some("sleep 5"));
        assert_eq!(strip_background_marker("sleep 5&"), Some("sleep 5"));
        assert_eq!(strip_background_marker("echo a && "), None);
        assert_eq!(strip_background_marker(r"echo \&"), None);
        assert_eq!(strip_background_marker("echo '&"), None);
        assert_eq!(strip_background_marker("&"), None);
        assert_eq!(strip_background_marker("echo hi"), None);
    }
}
