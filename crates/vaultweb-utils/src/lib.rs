//! Utility functions and helpers

/// Escape text for use inside HTML element content and quoted attributes.
///
/// Covers `&`, `<`, `>`, `"` and `'`, so the result is safe in both single-
/// and double-quoted attribute values.
pub fn escape_html(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Encode a value as a single URL path segment, then escape it for an attribute.
pub fn path_segment(value: &str) -> String {
    escape_html(&urlencoding::encode(value))
}

/// Case-insensitive substring test; an empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_special_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_plain_text_untouched() {
        assert_eq!(escape_html("bank.com"), "bank.com");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("7"), "7");
        assert_eq!(path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(path_segment("x'y"), "x%27y");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("example.com", "EXAMPLE"));
        assert!(contains_ignore_case("example.com", ""));
        assert!(!contains_ignore_case("example.com", "bank"));
    }
}
