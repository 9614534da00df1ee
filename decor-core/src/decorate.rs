//! One-pass decoration of a page: title, heading anchors and lines, links and
//! tooltips, highlighted code, page switchers, the navigation panel and the
//! footer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::PageOptions;
use crate::dom::{Document, Element, Node, contains_element, replace_elements, visit_elements_mut};
use crate::keywords::{Highlighter, KeywordSet};
use crate::navigation::{Navigation, NavigationRow, anchor_id};
use crate::session::{PANEL_START, page_script};
use crate::sitemap::{PageEntry, SiteMap, SiteMapError, UnknownPagePolicy, relative_prefix};
use crate::surface::{RenderCapabilities, Surface, panel_position};
use crate::tooltip::{TOOLTIP_LINK_CLASS, TooltipLookup, tooltip_id};

/// Heading level whose elements become the page's subsections.
pub const SECTION_TAG: &str = "h2";

const UNSUPPORTED_SURFACE: &str = "Warning: this page needs a browser supporting CSS and DOM, \
     which this rendering surface does not provide.";
const MISSING_TOOLTIPS: &str =
    "Warning: this page uses tooltips, but no tooltip texts are available.";

#[derive(Debug, thiserror::Error)]
pub enum DecorateError {
    #[error(transparent)]
    SiteMap(#[from] SiteMapError),
    #[error("Unknown keyword set '{0}'")]
    UnknownKeywordSet(String),
    #[error("Invalid reserved word pattern: {0}")]
    Keywords(#[from] regex::Error),
    #[error("Tooltip link without an id")]
    TooltipWithoutId,
    #[error("No tip configured for tooltip link '{0}'")]
    MissingTip(String),
    #[error("Could not write page script settings: {0}")]
    Script(#[from] serde_json::Error),
}

/// Attribution shown at the bottom of every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footer {
    pub last_edited: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoration {
    Complete {
        document: Document,
        navigation: Navigation,
    },
    /// A collaborator was missing; the page carries a warning instead of decoration.
    Aborted { document: Document, reason: String },
}

impl Decoration {
    pub fn document(&self) -> &Document {
        match self {
            Decoration::Complete { document, .. } | Decoration::Aborted { document, .. } => {
                document
            }
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            Decoration::Complete { document, .. } | Decoration::Aborted { document, .. } => {
                document
            }
        }
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        match self {
            Decoration::Complete { navigation, .. } => Some(navigation),
            Decoration::Aborted { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Decoration::Complete { .. })
    }
}

pub struct Decorator<'a> {
    site: &'a SiteMap,
    keyword_sets: &'a BTreeMap<String, KeywordSet>,
    footer: &'a Footer,
    tips: Option<&'a dyn TooltipLookup>,
    surface: &'a dyn RenderCapabilities,
    policy: UnknownPagePolicy,
}

impl<'a> Decorator<'a> {
    pub fn new(
        site: &'a SiteMap,
        keyword_sets: &'a BTreeMap<String, KeywordSet>,
        footer: &'a Footer,
    ) -> Self {
        Self {
            site,
            keyword_sets,
            footer,
            tips: None,
            surface: &Surface::Modern,
            policy: UnknownPagePolicy::default(),
        }
    }

    pub fn tooltips(mut self, tips: &'a dyn TooltipLookup) -> Self {
        self.tips = Some(tips);
        self
    }

    pub fn surface(mut self, surface: &'a dyn RenderCapabilities) -> Self {
        self.surface = surface;
        self
    }

    pub fn unknown_page(mut self, policy: UnknownPagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Decorates `document`, the page found at `path` in the site map.
    pub fn decorate(
        &self,
        mut document: Document,
        path: &str,
        options: &PageOptions,
    ) -> Result<Decoration, DecorateError> {
        let title = Element::new("h1").with_text(document.title.clone());
        document.body.insert(0, title.into());

        if !self.surface.supports_dom() {
            return Ok(abort(document, UNSUPPORTED_SURFACE));
        }
        if self.tips.is_none() && contains_element(&document.body, &is_tooltip_link) {
            return Ok(abort(document, MISSING_TOOLTIPS));
        }

        let highlighter = self.highlighter(&options.keywords)?;
        let current = self.site.locate(path, self.policy)?;
        let prefix = relative_prefix(path);

        let sections = anchor_sections(&mut document.body);
        let navigation = Navigation::for_index(self.site, current, &sections);

        add_heading_lines(&mut document.body);
        let tooltips = self.decorate_links(&mut document.body)?;
        if let Some(highlighter) = highlighter {
            visit_elements_mut(&mut document.body, "code", &mut |code: &mut Element| {
                highlighter.highlight_element(code)
            });
        }

        let switcher = (options.previous || options.next)
            .then(|| self.page_switcher(current, options, &prefix));
        if let Some(switcher) = &switcher {
            // Directly below the title.
            document.body.insert(1, switcher.clone().into());
        }

        document
            .body
            .push(self.navigation_panel(&navigation, &prefix).into());
        if let Some(switcher) = switcher {
            document.body.push(switcher.into());
        }
        document.body.extend(tooltips);
        document.body.extend(self.footer_nodes(options));
        let script = Element::new("script").with_child(Node::raw(page_script(self.surface)?));
        document.body.push(script.into());

        Ok(Decoration::Complete {
            document,
            navigation,
        })
    }

    fn highlighter(&self, names: &[String]) -> Result<Option<Highlighter>, DecorateError> {
        if names.is_empty() {
            return Ok(None);
        }

        let mut rules = Vec::new();
        for name in names {
            let set = self
                .keyword_sets
                .get(name)
                .ok_or_else(|| DecorateError::UnknownKeywordSet(name.clone()))?;
            rules.extend(set.rules());
        }
        Ok(Some(Highlighter::new(rules)?))
    }

    /// Adds print references to links and collects one panel per tooltip link.
    fn decorate_links(&self, body: &mut Vec<Node>) -> Result<Vec<Node>, DecorateError> {
        let mut panels: Vec<Node> = Vec::new();
        let mut failure = None;

        replace_elements(body, "a", &mut |link: Element| {
            if link.has_class(TOOLTIP_LINK_CLASS) {
                let number = panels.len() + 1;
                match self.tooltip_panel(&link, number) {
                    Ok(panel) => panels.push(panel.into()),
                    Err(err) => {
                        failure.get_or_insert(err);
                    }
                }
                let target = link.id().map(tooltip_id).unwrap_or_default();
                let link = link
                    .with_attr("href", format!("#{target}"))
                    .with_attr("data-tooltip", target);
                vec![link.into(), print_only(format!(" [{number}]")).into()]
            } else {
                let reference = match link.attr("href") {
                    Some(href) if !href.is_empty() && href != "#" => Some(
                        Element::new("span")
                            .with_class("printLink")
                            .with_text(format!(" ({href})")),
                    ),
                    _ => None,
                };
                std::iter::once(link.into())
                    .chain(reference.map(Node::from))
                    .collect()
            }
        });

        match failure {
            Some(err) => Err(err),
            None => Ok(panels),
        }
    }

    fn tooltip_panel(&self, link: &Element, number: usize) -> Result<Element, DecorateError> {
        let trigger = link.id().ok_or(DecorateError::TooltipWithoutId)?;
        let tip = self
            .tips
            .and_then(|tips| tips.tip(trigger))
            .ok_or_else(|| DecorateError::MissingTip(trigger.to_owned()))?;

        let mut panel = Element::new("div")
            .with_class("tooltip")
            .with_id(tooltip_id(trigger));
        if tip.close_button {
            panel.push(
                Element::new("div").with_class("closeButton").with_child(
                    Element::new("a")
                        .with_attr("href", "#")
                        .with_attr("data-action", "close-tooltip")
                        .with_text("close"),
                ),
            );
        }
        panel.push(print_only(format!("[{number}] ")));
        panel.push(Node::raw(tip.text));
        Ok(panel)
    }

    fn page_switcher(&self, current: usize, options: &PageOptions, prefix: &str) -> Element {
        let previous = self.switch_target(options.previous, self.site.previous(current), prefix);
        let next = self.switch_target(options.next, self.site.next(current), prefix);

        Element::new("div")
            .with_class("pageSwitcher")
            .with_child(
                previous
                    .with_attr("style", "margin-right: .5em")
                    .with_text("<< Previous"),
            )
            .with_child(
                next.with_attr("style", "margin-left: .5em")
                    .with_text("Next >>"),
            )
    }

    fn switch_target(
        &self,
        enabled: bool,
        neighbour: Option<&PageEntry>,
        prefix: &str,
    ) -> Element {
        match (enabled, neighbour) {
            (true, Some(entry)) => {
                Element::new("a").with_attr("href", format!("{prefix}{}", entry.path))
            }
            (true, None) => {
                tracing::warn!("Page switcher points past the end of the site map");
                Element::new("span")
            }
            (false, _) => Element::new("span"),
        }
    }

    fn navigation_panel(&self, navigation: &Navigation, prefix: &str) -> Element {
        let current_path = self
            .site
            .get(navigation.current)
            .map(|entry| entry.path.as_str());
        let mut current_marked = false;

        let mut contents = Element::new("div")
            .with_class("contents")
            .with_id("contents");

        for row in &navigation.rows {
            let indent = format!("margin-left: {}em", row.depth());
            let item = match row {
                NavigationRow::PageLink { title, path, .. } => {
                    let mut item = Element::new("div")
                        .with_class("contentsItem")
                        .with_attr("style", indent)
                        .with_child(
                            Element::new("a")
                                .with_attr("href", format!("{prefix}{path}"))
                                .with_text(title.clone()),
                        );
                    if !current_marked && current_path == Some(path.as_str()) {
                        item.set_attr("id", "currentItem");
                        current_marked = true;
                    }
                    item
                }
                NavigationRow::SectionLink {
                    title, anchor_id, ..
                } => Element::new("div")
                    .with_class("thisPageItem")
                    .with_attr("style", indent)
                    .with_child(
                        Element::new("a")
                            .with_attr("href", format!("#{anchor_id}"))
                            .with_id(format!("contents{anchor_id}"))
                            .with_text(title.clone()),
                    ),
            };
            contents.push(item);
        }

        let header = Element::new("div").with_class("contentsHeader").with_child(
            Element::new("a")
                .with_class("contentsToggle")
                .with_attr("href", "#contents")
                .with_text("Contents"),
        );

        let style = format!(
            "position: {}; right: {}px; top: {}px; min-width: 8em",
            panel_position(self.surface),
            PANEL_START.right,
            PANEL_START.top
        );

        Element::new("div")
            .with_class("navigation")
            .with_attr("style", style)
            .with_child(header)
            .with_child(contents)
    }

    fn footer_nodes(&self, options: &PageOptions) -> Vec<Node> {
        let mut footer = Element::new("div").with_class("footer");

        let last_edited = options
            .last_edited
            .as_deref()
            .or(self.footer.last_edited.as_deref());
        if let Some(date) = last_edited {
            footer.push(Node::text(format!("This page was last updated on {date}")));
            if let Some(author) = &self.footer.author {
                footer.push(Node::text(" by "));
                footer.push(match &self.footer.email {
                    Some(email) => Element::new("a")
                        .with_attr("href", format!("mailto:{email}"))
                        .with_text(author.clone())
                        .into(),
                    None => Node::text(author.clone()),
                });
            }
            footer.push(Node::text(". "));
        }
        if let Some(note) = &self.footer.note {
            footer.push(Node::text(note.clone()));
        }

        vec![
            Element::new("div").with_class("footerline").into(),
            footer.into(),
        ]
    }
}

fn is_tooltip_link(element: &Element) -> bool {
    element.tag == "a" && element.has_class(TOOLTIP_LINK_CLASS)
}

fn print_only(text: String) -> Element {
    Element::new("span").with_class("printOnly").with_text(text)
}

fn abort(mut document: Document, reason: &str) -> Decoration {
    tracing::warn!(page = %document.title, reason, "Page left undecorated");
    let warning = Element::new("p").with_class("warning").with_text(reason);
    document.body.insert(1, warning.into());
    Decoration::Aborted {
        document,
        reason: reason.to_owned(),
    }
}

/// Gives every subsection heading an anchor and returns the heading titles in
/// document order.
fn anchor_sections(body: &mut [Node]) -> Vec<String> {
    let mut titles = Vec::new();
    visit_elements_mut(body, SECTION_TAG, &mut |heading: &mut Element| {
        let anchor = Element::new("a").with_attr("name", anchor_id(titles.len()));
        titles.push(heading.text_content());
        heading.children.insert(0, anchor.into());
    });
    titles
}

/// Wraps level 1 and 2 headings in a container followed by a separator line.
fn add_heading_lines(body: &mut Vec<Node>) {
    for tag in ["h2", "h1"] {
        replace_elements(body, tag, &mut |heading: Element| {
            let container = Element::new("div")
                .with_class(&format!("{tag}container"))
                .with_child(heading)
                .with_child(Element::new("div").with_class(&format!("{tag}line")));
            vec![container.into()]
        });
    }
}
