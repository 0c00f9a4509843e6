use scraper::Html;

/// Plain text of an HTML fragment: text nodes joined by single spaces.
pub fn strip_markup(content: &str) -> String {
    let fragment = Html::parse_fragment(content);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Minimal escaping for text placed inside generated markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
