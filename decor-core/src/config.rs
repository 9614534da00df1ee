use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decorate::Footer;
use crate::keywords::{KeywordSet, builtin_sets};
use crate::sitemap::{PageEntry, SiteMap, SiteMapError, UnknownPagePolicy};
use crate::surface::Surface;
use crate::tooltip::Tip;

/// Stylesheet linked from every page unless configured otherwise.
pub const DEFAULT_STYLESHEET_NAME: &str = "decor.css";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

/// Contents of `decor.toml`.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub footer: Footer,
    pub pages: Vec<PageEntry>,
    /// Extra or overriding reserved word sets, by name.
    pub keywords: BTreeMap<String, KeywordSet>,
    /// Tooltip texts by trigger id. Without this table pages may not use tooltips.
    pub tooltips: Option<BTreeMap<String, Tip>>,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }

    pub fn site_map(&self) -> Result<SiteMap, SiteMapError> {
        SiteMap::new(self.pages.clone())
    }

    /// Built-in sets merged with the configured ones; configured sets win.
    pub fn keyword_sets(&self) -> BTreeMap<String, KeywordSet> {
        let mut sets = builtin_sets();
        sets.extend(self.keywords.clone());
        sets
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub stylesheets: Vec<String>,
    pub surface: Surface,
    pub unknown_page: UnknownPagePolicy,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            stylesheets: vec![DEFAULT_STYLESHEET_NAME.to_owned()],
            surface: Surface::default(),
            unknown_page: UnknownPagePolicy::default(),
        }
    }
}
