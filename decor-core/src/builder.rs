use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{Config, ConfigError, DEFAULT_STYLESHEET_NAME, SiteConfig};
use crate::content::{ContentError, read_page};
use crate::decorate::{DecorateError, Decorator, Footer};
use crate::dom::Document;
use crate::keywords::KeywordSet;
use crate::navigation::Navigation;
use crate::scanner::SourceScanner;
use crate::sitemap::{SiteMap, SiteMapError, relative_prefix};
use crate::template::{PageShell, TemplateError, TemplateRenderer};
use crate::tooltip::Tip;

/// Written next to the pages when the theme has no stylesheet of its own.
pub const DEFAULT_STYLESHEET: &str = r#"body { margin-right: 12em; }

.h1container, .h2container { margin-top: 1.5em; }
.h1line { border-bottom: 2px solid #404040; }
.h2line { border-bottom: 1px solid #a0a0a0; }

.navigation {
    background: #f4f4f4;
    border: 1px solid #a0a0a0;
    padding: 0.3em 0.6em;
    z-index: 10;
}
.contentsHeader { cursor: move; font-weight: bold; }
.contents { display: none; }
.contents:target, .contents.open { display: block; }
.contentsItem, .thisPageItem { white-space: nowrap; }
.thisPageItem { font-style: italic; }
#currentItem { font-weight: bold; }

.pageSwitcher { margin: 1em 0; text-align: right; }
.pageSwitcher span { color: #a0a0a0; }

.tooltip {
    display: none;
    position: absolute;
    max-width: 25em;
    background: #ffffe0;
    border: 1px solid #404040;
    padding: 0.3em 0.6em;
    z-index: 20;
}
.tooltip:target { display: block; }
.closeButton { float: right; }

.reservedWord { font-weight: bold; color: #000080; }
.warning { color: #a00000; font-weight: bold; }

.footerline { border-bottom: 1px solid #a0a0a0; margin-top: 2em; }
.footer { font-size: small; }

.printOnly, .printLink { display: none; }

@media print {
    body { margin-right: 0; }
    .navigation, .pageSwitcher, .closeButton { display: none; }
    .printOnly, .printLink { display: inline; }
    .tooltip { display: block !important; position: static; border: none; }
}
"#;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not specified")]
    MissingSourceDir,
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Site map error: {0}")]
    SiteMap(#[from] SiteMapError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Page '{path}': {source}")]
    Content {
        path: String,
        #[source]
        source: ContentError,
    },
    #[error("Page '{path}': {source}")]
    Decorate {
        path: String,
        #[source]
        source: DecorateError,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a full build.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Every page written, including aborted ones.
    pub written: Vec<String>,
    /// Site map entries without a source file.
    pub missing: Vec<String>,
    /// Pages written with a warning instead of decoration.
    pub aborted: Vec<String>,
    /// Source files no site map entry refers to.
    pub orphans: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub path: String,
    pub html: String,
    pub complete: bool,
    /// Absent when decoration was aborted.
    pub navigation: Option<Navigation>,
}

pub struct SiteBuilder {
    source_dir: Option<PathBuf>,
    output_dir: PathBuf,
    theme_dir: PathBuf,
    config: Config,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            source_dir: None,
            output_dir: PathBuf::from("./out"),
            theme_dir: PathBuf::from("./theme"),
            config: Config::default(),
        }
    }

    // Required configuration
    pub fn source_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    // Optional paths
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn theme_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.theme_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn build(self) -> Result<Site, BuildError> {
        let source_dir = self.source_dir.ok_or(BuildError::MissingSourceDir)?;
        let site_map = self.config.site_map()?;
        let renderer = TemplateRenderer::new(&self.theme_dir)?;
        let keyword_sets = self.config.keyword_sets();

        Ok(Site {
            site_map,
            keyword_sets,
            tips: self.config.tooltips,
            footer: self.config.footer,
            settings: self.config.site,
            renderer,
            scanner: SourceScanner::new(source_dir),
            output_dir: self.output_dir,
            theme_dir: self.theme_dir,
        })
    }
}

pub struct Site {
    site_map: SiteMap,
    keyword_sets: BTreeMap<String, KeywordSet>,
    tips: Option<BTreeMap<String, Tip>>,
    footer: Footer,
    settings: SiteConfig,
    renderer: TemplateRenderer,
    scanner: SourceScanner,
    output_dir: PathBuf,
    theme_dir: PathBuf,
}

impl Site {
    pub fn site_map(&self) -> &SiteMap {
        &self.site_map
    }

    pub fn source_for(&self, page_path: &str) -> PathBuf {
        self.scanner.source_for(page_path)
    }

    fn decorator(&self) -> Decorator<'_> {
        let decorator = Decorator::new(&self.site_map, &self.keyword_sets, &self.footer)
            .surface(&self.settings.surface)
            .unknown_page(self.settings.unknown_page);
        match &self.tips {
            Some(tips) => decorator.tooltips(tips),
            None => decorator,
        }
    }

    /// Decorates the page at `path` and wraps it in the page shell.
    pub fn render_page(&self, path: &str) -> Result<RenderedPage, RenderError> {
        let page = read_page(self.scanner.source_for(path)).map_err(|source| {
            RenderError::Content {
                path: path.to_owned(),
                source,
            }
        })?;

        let title = page
            .options
            .title
            .clone()
            .or_else(|| {
                let index = self.site_map.position(path)?;
                self.site_map.get(index).map(|entry| entry.title.clone())
            })
            .unwrap_or_else(|| path.to_owned());

        let decoration = self
            .decorator()
            .decorate(Document::new(title, page.body), path, &page.options)
            .map_err(|source| RenderError::Decorate {
                path: path.to_owned(),
                source,
            })?;

        let document = decoration.document();
        let shell = PageShell {
            title: &document.title,
            body: document.body_html(),
            prefix: relative_prefix(path),
            stylesheets: &self.settings.stylesheets,
            path,
            navigation: decoration.navigation(),
        };
        let html = self.renderer.render(&shell)?;

        Ok(RenderedPage {
            path: path.to_owned(),
            html,
            complete: decoration.is_complete(),
            navigation: decoration.navigation().cloned(),
        })
    }

    pub fn render_all(&self) -> Result<BuildReport, RenderError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut report = BuildReport::default();

        for entry in self.site_map.entries() {
            let source = self.scanner.source_for(&entry.path);
            if !source.is_file() {
                tracing::warn!(page = %entry.path, source = %source.display(), "Missing page source");
                report.missing.push(entry.path.clone());
                continue;
            }

            let page = self.render_page(&entry.path)?;
            let output_path = self.output_dir.join(&entry.path);
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output_path, &page.html)?;
            tracing::info!(page = %entry.path, "Wrote page");

            if !page.complete {
                report.aborted.push(entry.path.clone());
            }
            report.written.push(entry.path.clone());
        }

        for orphan in self.scanner.orphans(&self.site_map) {
            tracing::warn!(source = %orphan.display(), "Source is not listed in the site map");
            report.orphans.push(orphan);
        }

        self.write_stylesheets()?;
        Ok(report)
    }

    fn write_stylesheets(&self) -> Result<(), RenderError> {
        for sheet in &self.settings.stylesheets {
            let themed = self.theme_dir.join(sheet);
            let output_path = self.output_dir.join(sheet);
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            if themed.is_file() {
                std::fs::copy(&themed, &output_path)?;
            } else if sheet == DEFAULT_STYLESHEET_NAME {
                std::fs::write(&output_path, DEFAULT_STYLESHEET)?;
            } else {
                tracing::warn!(stylesheet = %sheet, "Stylesheet not found in theme");
            }
        }
        Ok(())
    }
}
