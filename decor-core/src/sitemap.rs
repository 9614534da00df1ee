use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SiteMapError {
    #[error("Site map has no pages")]
    Empty,
    #[error("First page '{0}' must have depth 0")]
    RootDepth(String),
    #[error("Page '{path}' jumps from depth {previous} to depth {depth}")]
    DepthJump {
        path: String,
        previous: usize,
        depth: usize,
    },
    #[error("Page '{0}' is not listed in the site map")]
    UnknownPage(String),
}

/// One row of the static site map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub depth: usize,
    pub title: String,
    pub path: String,
}

impl PageEntry {
    pub fn new(depth: usize, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            depth,
            title: title.into(),
            path: path.into(),
        }
    }
}

/// What to do when the current page is missing from the site map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPagePolicy {
    #[default]
    Reject,
    Home,
}

/// Ordered pre-order listing of the site's pages, with depth encoding the tree.
#[derive(Debug, Clone)]
pub struct SiteMap {
    entries: Vec<PageEntry>,
}

impl SiteMap {
    pub fn new(entries: Vec<PageEntry>) -> Result<Self, SiteMapError> {
        let first = entries.first().ok_or(SiteMapError::Empty)?;
        if first.depth != 0 {
            return Err(SiteMapError::RootDepth(first.path.clone()));
        }

        for pair in entries.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.depth > previous.depth + 1 {
                return Err(SiteMapError::DepthJump {
                    path: next.path.clone(),
                    previous: previous.depth,
                    depth: next.depth,
                });
            }
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.path.as_str()) {
                tracing::warn!(path = %entry.path, "Duplicate page path in site map, first entry wins");
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PageEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.path == path)
    }

    /// Index of the page at `path`, resolved according to `policy`.
    pub fn locate(&self, path: &str, policy: UnknownPagePolicy) -> Result<usize, SiteMapError> {
        match (self.position(path), policy) {
            (Some(index), _) => Ok(index),
            (None, UnknownPagePolicy::Home) => Ok(0),
            (None, UnknownPagePolicy::Reject) => Err(SiteMapError::UnknownPage(path.to_owned())),
        }
    }

    pub fn previous(&self, index: usize) -> Option<&PageEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn next(&self, index: usize) -> Option<&PageEntry> {
        self.entries.get(index + 1)
    }
}

/// Prefix that leads from the directory of `path` back to the site root.
pub fn relative_prefix(path: &str) -> String {
    "../".repeat(path.matches('/').count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<PageEntry> {
        vec![
            PageEntry::new(0, "Home", "index.html"),
            PageEntry::new(1, "News", "news.html"),
            PageEntry::new(1, "Compiler", "tticomp.html"),
            PageEntry::new(2, "Tutorial", "tticomp/introduction.html"),
        ]
    }

    #[test]
    fn test_rejects_empty_site_map() {
        assert_eq!(SiteMap::new(Vec::new()).unwrap_err(), SiteMapError::Empty);
    }

    #[test]
    fn test_rejects_non_root_first_page() {
        let err = SiteMap::new(vec![PageEntry::new(1, "News", "news.html")]).unwrap_err();
        assert_eq!(err, SiteMapError::RootDepth("news.html".into()));
    }

    #[test]
    fn test_rejects_depth_jump() {
        let err = SiteMap::new(vec![
            PageEntry::new(0, "Home", "index.html"),
            PageEntry::new(2, "Deep", "deep.html"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SiteMapError::DepthJump {
                path: "deep.html".into(),
                previous: 0,
                depth: 2
            }
        );
    }

    #[test]
    fn test_allows_returning_to_shallower_depth() {
        let mut entries = pages();
        entries.push(PageEntry::new(1, "Fonts", "fonts.html"));
        entries.push(PageEntry::new(0, "Elsewhere", "elsewhere.html"));
        assert!(SiteMap::new(entries).is_ok());
    }

    #[test]
    fn test_locate_first_match_wins() {
        let mut entries = pages();
        entries.push(PageEntry::new(1, "Again", "news.html"));
        let site = SiteMap::new(entries).unwrap();
        assert_eq!(site.locate("news.html", UnknownPagePolicy::Reject), Ok(1));
    }

    #[test]
    fn test_locate_unknown_page() {
        let site = SiteMap::new(pages()).unwrap();
        assert_eq!(
            site.locate("missing.html", UnknownPagePolicy::Reject),
            Err(SiteMapError::UnknownPage("missing.html".into()))
        );
        assert_eq!(site.locate("missing.html", UnknownPagePolicy::Home), Ok(0));
    }

    #[test]
    fn test_neighbours() {
        let site = SiteMap::new(pages()).unwrap();
        assert!(site.previous(0).is_none());
        assert_eq!(site.previous(2).unwrap().title, "News");
        assert_eq!(site.next(2).unwrap().title, "Tutorial");
        assert!(site.next(3).is_none());
    }

    #[test]
    fn test_relative_prefix() {
        assert_eq!(relative_prefix("index.html"), "");
        assert_eq!(relative_prefix("tticomp/language.html"), "../");
        assert_eq!(relative_prefix("a/b/c.html"), "../../");
    }
}
