use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::navigation::Navigation;

/// Name of the page shell template, looked up in the theme directory.
pub const PAGE_TEMPLATE: &str = "page.html";

/// Page shell used when the theme has no `page.html`.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
{% for sheet in stylesheets %}<link rel="stylesheet" type="text/css" href="{{ prefix | safe }}{{ sheet | safe }}">
{% endfor %}</head>
<body>
{{ body | safe }}
</body>
</html>
"#;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
}

/// Everything the page shell template can refer to.
#[derive(Debug, Serialize)]
pub struct PageShell<'a> {
    pub title: &'a str,
    /// Decorated body markup, inserted unescaped.
    pub body: String,
    /// Relative path from the page back to the site root.
    pub prefix: String,
    pub stylesheets: &'a [String],
    pub path: &'a str,
    pub navigation: Option<&'a Navigation>,
}

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Loads `page.html` from `theme_dir`, falling back to the built-in shell.
    pub fn new<P: AsRef<Path>>(theme_dir: P) -> Result<Self, TemplateError> {
        let custom = theme_dir.as_ref().join(PAGE_TEMPLATE);
        if !custom.is_file() {
            return Self::builtin();
        }

        tracing::info!(template = %custom.display(), "Using theme page template");
        let mut tera = Tera::default();
        tera.add_template_file(&custom, Some(PAGE_TEMPLATE))?;
        Ok(Self { tera })
    }

    pub fn builtin() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, DEFAULT_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, shell: &PageShell) -> Result<String, TemplateError> {
        let context = Context::from_serialize(shell)?;
        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell<'a>(stylesheets: &'a [String]) -> PageShell<'a> {
        PageShell {
            title: "Tom & Jerry",
            body: "<p>Hi</p>".into(),
            prefix: "../".into(),
            stylesheets,
            path: "cartoons/tom.html",
            navigation: None,
        }
    }

    #[test]
    fn test_builtin_template() {
        let sheets = vec!["decor.css".to_owned()];
        let html = TemplateRenderer::builtin()
            .unwrap()
            .render(&shell(&sheets))
            .unwrap();

        assert!(html.contains("<title>Tom &amp; Jerry</title>"));
        assert!(html.contains("href=\"../decor.css\""));
        assert!(html.contains("<body>\n<p>Hi</p>\n</body>"));
    }

    #[test]
    fn test_theme_template_wins() {
        let theme = tempfile::tempdir().unwrap();
        std::fs::write(
            theme.path().join(PAGE_TEMPLATE),
            "[{{ path }}]{{ body | safe }}",
        )
        .unwrap();

        let sheets = Vec::new();
        let html = TemplateRenderer::new(theme.path())
            .unwrap()
            .render(&shell(&sheets))
            .unwrap();
        assert_eq!(html, "[cartoons&#x2F;tom.html]<p>Hi</p>");
    }

    #[test]
    fn test_missing_theme_falls_back() {
        let theme = tempfile::tempdir().unwrap();
        let sheets = Vec::new();
        let html = TemplateRenderer::new(theme.path().join("nothing"))
            .unwrap()
            .render(&shell(&sheets))
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
