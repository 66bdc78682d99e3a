//! HTML escaping helpers shared by the renderer and page templates.

/// Escape text for an HTML text node.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a double- or single-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape_html(text).replace('\'', "&#39;")
}

/// Escape a URL for an `href`/`src` attribute.
///
/// Spaces are percent-encoded; everything else is attribute-escaped so
/// already-encoded URLs pass through untouched.
pub fn escape_href(url: &str) -> String {
    escape_attr(url).replace(' ', "%20")
}
