//! `rendered` forms of titles and bodies

use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Escaped single-line title
#[must_use]
pub fn render_title(title: &str) -> String {
    tera::escape_html(title.trim())
}

/// Escaped body split into paragraphs, single newlines becoming `<br />`
#[must_use]
pub fn render_content(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    PARAGRAPH_BREAK
        .split(normalized.trim())
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let lines: Vec<String> = p.trim().lines().map(tera::escape_html).collect();
            format!("<p>{}</p>\n", lines.join("<br />\n"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_content_paragraphs() {
        assert_eq!(
            render_content("First line\nsecond line\n\nNext"),
            "<p>First line<br />\nsecond line</p>\n<p>Next</p>\n"
        );
        assert_eq!(render_content("  "), "");
    }

    #[test]
    fn test_markup_is_escaped() {
        assert_eq!(render_title("<script>x</script>"), "&lt;script&gt;x&lt;&#x2F;script&gt;");
        assert!(render_content("a < b").contains("a &lt; b"));
    }
}
