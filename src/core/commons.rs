// src/core/commons.rs

// Helpers shared by the parser, the renderer and the terminal frontend.

/// Escapes characters that would otherwise be interpreted as console markup.
pub fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverses `escape_markup`. Unknown entities are left untouched.
pub fn unescape_markup(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        // `&amp;` goes last so `&amp;lt;` decodes to `&lt;` and not `<`.
        .replace("&amp;", "&")
}

/// Wraps a string in single quotes when it would not survive re-tokenization as-is.
pub fn quote_for_display(value: &str) -> String {
    match shlex::try_quote(value) {
        Ok(quoted) => quoted.into_owned(),
        Err(_) => format!("'{}'", value.replace('\'', "\\'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup_replaces_unsafe_characters() {
        assert_eq!(
            escape_markup(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_markup("plain text"), "plain text");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let original = r#"a < b && c > "d" 'e'"#;
        assert_eq!(unescape_markup(&escape_markup(original)), original);
        // An escaped entity must stay an entity after one decoding pass.
        assert_eq!(unescape_markup("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_quote_for_display() {
        assert_eq!(quote_for_display("ls"), "ls");
        assert_eq!(quote_for_display("ls -l"), "'ls -l'");
    }
}
