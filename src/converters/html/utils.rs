//! Escaping helpers for HTML output.

// --- Text Escaping ---

/// Escapes `&`, `<` and `>` for use in element content.
pub fn escape_html_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes text for use inside a double- or single-quoted attribute value.
pub fn escape_html_attr(text: &str) -> String {
    escape_html_text(text)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escapes text and turns line breaks into `<br>`.
pub fn escape_multiline(text: &str) -> String {
    escape_html_text(text).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(escape_html_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(
            escape_html_attr(r#"say "hi" it's"#),
            "say &quot;hi&quot; it&#39;s"
        );
        assert_eq!(escape_multiline("one\n<two>"), "one<br>&lt;two&gt;");
    }
}
