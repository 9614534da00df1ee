//! Navigation tree computation.
//!
//! The site map is a flat pre-order listing where depth encodes nesting. Only
//! the path from the root to the current page is expanded: at each level on
//! that path the sibling run holding the ancestor is shown, deeper subtrees
//! stay collapsed. The current page additionally lists its own subsections.

use serde::Serialize;

use crate::sitemap::{PageEntry, SiteMap, SiteMapError, UnknownPagePolicy};

/// One line of the navigation panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationRow {
    PageLink {
        depth: usize,
        title: String,
        path: String,
    },
    SectionLink {
        depth: usize,
        title: String,
        anchor_id: String,
    },
}

impl NavigationRow {
    pub fn depth(&self) -> usize {
        match self {
            NavigationRow::PageLink { depth, .. } | NavigationRow::SectionLink { depth, .. } => {
                *depth
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            NavigationRow::PageLink { title, .. } | NavigationRow::SectionLink { title, .. } => {
                title
            }
        }
    }
}

/// Anchor name given to the `index`-th subsection heading of a page.
pub fn anchor_id(index: usize) -> String {
    format!("Header{index}")
}

/// Inclusive index range of the sibling run expanded at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRange {
    pub first: usize,
    pub last: usize,
}

impl LevelRange {
    pub fn contains(&self, index: usize) -> bool {
        self.first <= index && index <= self.last
    }
}

/// Ranges for levels `0..=depth(current)`, indexed by level.
///
/// `first` is the ancestor of `current` at that level (the most recent entry
/// at that depth up to `current`), `last` the entry just before the first
/// later entry at that depth or shallower, so a range never reaches into the
/// subtree of a later sibling.
pub fn level_ranges(pages: &[PageEntry], current: usize) -> Vec<LevelRange> {
    let current_depth = pages[current].depth;
    let end = pages.len() - 1;
    let mut ranges = vec![LevelRange { first: 0, last: end }; current_depth + 1];

    for (index, page) in pages.iter().enumerate().take(current + 1) {
        if let Some(range) = ranges.get_mut(page.depth) {
            range.first = index;
        }
    }

    // Levels from `open` upwards have already been closed.
    let mut open = current_depth + 1;
    for (index, page) in pages.iter().enumerate().skip(current + 1) {
        if page.depth < open {
            for range in &mut ranges[page.depth..open] {
                range.last = index - 1;
            }
            open = page.depth;
            if open == 0 {
                break;
            }
        }
    }

    ranges
}

/// Roots are always shown; anything else only when its parent level is expanded
/// over its position.
pub fn is_visible(pages: &[PageEntry], index: usize, ranges: &[LevelRange]) -> bool {
    match pages[index].depth {
        0 => true,
        depth => ranges
            .get(depth - 1)
            .is_some_and(|range| range.contains(index)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub current: usize,
    pub rows: Vec<NavigationRow>,
}

impl Navigation {
    /// Resolves `current_path` in the site map and builds its navigation.
    pub fn build<S: AsRef<str>>(
        site: &SiteMap,
        current_path: &str,
        policy: UnknownPagePolicy,
        sections: &[S],
    ) -> Result<Self, SiteMapError> {
        let current = site.locate(current_path, policy)?;
        Ok(Self::for_index(site, current, sections))
    }

    /// Builds the rows for the page at `current`; `sections` are the titles of
    /// that page's subsection headings in document order.
    pub fn for_index<S: AsRef<str>>(site: &SiteMap, current: usize, sections: &[S]) -> Self {
        let pages = site.entries();
        let ranges = level_ranges(pages, current);

        let mut rows = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            if !is_visible(pages, index, &ranges) {
                continue;
            }

            rows.push(NavigationRow::PageLink {
                depth: page.depth,
                title: page.title.clone(),
                path: page.path.clone(),
            });

            if index == current {
                rows.extend(sections.iter().enumerate().map(|(n, title)| {
                    NavigationRow::SectionLink {
                        depth: page.depth + 1,
                        title: title.as_ref().to_owned(),
                        anchor_id: anchor_id(n),
                    }
                }));
            }
        }

        tracing::debug!(
            page = %pages[current].path,
            rows = rows.len(),
            "Navigation built"
        );

        Self { current, rows }
    }

    pub fn page_titles(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|row| matches!(row, NavigationRow::PageLink { .. }))
            .map(NavigationRow::title)
            .collect()
    }
}
