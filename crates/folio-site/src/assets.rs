//! Static files compiled into the binary.
//!
//! The build writes these into `{output}/assets/` unless the site's own
//! assets directory provides a file of the same name.

/// Stylesheet for generated pages.
pub const SITE_CSS: &str = include_str!("assets/site.css");

/// Scroll progress script template. `__CONTAINER_SELECTOR__` is replaced
/// with a JS string literal by [`crate::scroll::client_script`].
pub const SCROLL_JS: &str = include_str!("assets/scroll.js");

/// KaTeX and Mermaid initialisation.
pub const RENDER_JS: &str = include_str!("assets/render.js");

/// Output path of the stylesheet, relative to the site root.
pub const SITE_CSS_PATH: &str = "assets/site.css";

/// Output path of the render script, relative to the site root.
pub const RENDER_JS_PATH: &str = "assets/render.js";

/// Files the build writes, as `(relative path, contents)`.
pub fn bundled() -> [(&'static str, &'static str); 2] {
    [(SITE_CSS_PATH, SITE_CSS), (RENDER_JS_PATH, RENDER_JS)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_assets_present() {
        assert!(SITE_CSS.contains(".scroll-progress"));
        assert!(SCROLL_JS.contains("__CONTAINER_SELECTOR__"));
        assert!(RENDER_JS.contains("katex"));
        assert!(bundled().iter().all(|(path, _)| path.starts_with("assets/")));
    }
}
