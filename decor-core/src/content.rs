use std::path::Path;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Deserialize;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::dom::{Element, Node};
use crate::tooltip::{TOOLTIP_LINK_CLASS, TOOLTIP_SCHEME};

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const SYNTAX_THEME: &str = "InspiredGitHub";
const FRONT_MATTER_FENCE: &str = "+++";

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] toml::de::Error),
    #[error("Front matter is not closed with '+++'")]
    UnclosedFrontMatter,
}

/// Per-page settings declared in the page's front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    pub title: Option<String>,
    pub previous: bool,
    pub next: bool,
    /// Names of keyword sets to highlight in code.
    pub keywords: Vec<String>,
    pub last_edited: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSource {
    pub options: PageOptions,
    pub body: Vec<Node>,
}

pub fn read_page<P: AsRef<Path>>(path: P) -> Result<PageSource, ContentError> {
    let text = std::fs::read_to_string(path)?;
    parse_page(&text)
}

pub fn parse_page(text: &str) -> Result<PageSource, ContentError> {
    let (front_matter, markdown) = split_front_matter(text)?;
    let options = match front_matter {
        Some(front_matter) => toml::from_str(front_matter)?,
        None => PageOptions::default(),
    };

    Ok(PageSource {
        options,
        body: markdown_to_nodes(markdown),
    })
}

fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), ContentError> {
    let trimmed = text.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed.strip_prefix(FRONT_MATTER_FENCE) else {
        return Ok((None, text));
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            return Ok((Some(&rest[..offset]), &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(ContentError::UnclosedFrontMatter)
}

enum Frame {
    Element(Element),
    /// Children are spliced into the parent.
    Transparent(Vec<Node>),
    /// Contents are dropped.
    Skip,
    CodeBlock { language: Option<String>, code: String },
}

impl Frame {
    fn push(&mut self, node: Node) {
        match self {
            Frame::Element(element) => element.push(node),
            Frame::Transparent(children) => children.push(node),
            Frame::Skip => {}
            Frame::CodeBlock { code, .. } => {
                if let Node::Text(text) = node {
                    code.push_str(&text);
                }
            }
        }
    }

    fn finish(self) -> Vec<Node> {
        match self {
            Frame::Element(element) => vec![element.into()],
            Frame::Transparent(children) => children,
            Frame::Skip => Vec::new(),
            Frame::CodeBlock { language, code } => vec![render_code_block(language, &code)],
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
    in_table_head: bool,
}

impl TreeBuilder {
    fn open(&mut self, frame: Frame) {
        self.stack.push(frame);
    }

    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            for node in frame.finish() {
                self.push(node);
            }
        }
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.push(node),
            None => self.root.push(node),
        }
    }

    fn start(&mut self, tag: Tag) {
        let frame = match tag {
            Tag::Paragraph => Frame::Element(Element::new("p")),
            Tag::Heading { level, .. } => Frame::Element(Element::new(format!("h{}", level as u32))),
            Tag::BlockQuote(_) => Frame::Element(Element::new("blockquote")),
            Tag::CodeBlock(kind) => Frame::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                },
                code: String::new(),
            },
            Tag::List(Some(1)) => Frame::Element(Element::new("ol")),
            Tag::List(Some(start)) => {
                Frame::Element(Element::new("ol").with_attr("start", start.to_string()))
            }
            Tag::List(None) => Frame::Element(Element::new("ul")),
            Tag::Item => Frame::Element(Element::new("li")),
            Tag::Emphasis => Frame::Element(Element::new("em")),
            Tag::Strong => Frame::Element(Element::new("strong")),
            Tag::Strikethrough => Frame::Element(Element::new("del")),
            Tag::Link {
                dest_url, title, ..
            } => Frame::Element(link_element(&dest_url, &title)),
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut image = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    image.set_attr("title", title.to_string());
                }
                Frame::Element(image)
            }
            Tag::Table(_) => Frame::Element(Element::new("table")),
            Tag::TableHead => {
                self.in_table_head = true;
                self.stack.push(Frame::Element(Element::new("thead")));
                Frame::Element(Element::new("tr"))
            }
            Tag::TableRow => Frame::Element(Element::new("tr")),
            Tag::TableCell => {
                Frame::Element(Element::new(if self.in_table_head { "th" } else { "td" }))
            }
            Tag::MetadataBlock(_) => Frame::Skip,
            _ => Frame::Transparent(Vec::new()),
        };
        self.open(frame);
    }

    fn end(&mut self, tag: TagEnd) {
        if let TagEnd::Image = tag {
            // Text collected inside an image is its alt text.
            if let Some(Frame::Element(image)) = self.stack.last_mut() {
                let alt = image.text_content();
                image.children.clear();
                image.set_attr("alt", alt);
            }
        }

        self.close();

        if let TagEnd::TableHead = tag {
            self.in_table_head = false;
            self.close();
        }
    }

    fn event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push(Node::text(text.to_string())),
            Event::Code(code) => self.push(Element::new("code").with_text(code.to_string()).into()),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push(Node::text(math.to_string()))
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push(Node::raw(html.to_string())),
            Event::FootnoteReference(name) => {
                self.push(Element::new("sup").with_text(name.to_string()).into())
            }
            Event::SoftBreak => self.push(Node::text("\n")),
            Event::HardBreak => self.push(Element::new("br").into()),
            Event::Rule => self.push(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut checkbox = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    checkbox.set_attr("checked", "");
                }
                self.push(checkbox.into());
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.root
    }
}

fn link_element(dest: &str, title: &str) -> Element {
    let mut link = match dest.strip_prefix(TOOLTIP_SCHEME) {
        Some(trigger_id) => Element::new("a")
            .with_class(TOOLTIP_LINK_CLASS)
            .with_id(trigger_id)
            .with_attr("href", "#"),
        None => Element::new("a").with_attr("href", dest),
    };
    if !title.is_empty() {
        link.set_attr("title", title);
    }
    link
}

/// Fenced code in a language the highlighter knows is rendered highlighted;
/// anything else stays text so reserved words can be marked later.
fn render_code_block(language: Option<String>, code: &str) -> Node {
    let syntax = language
        .as_deref()
        .and_then(|lang| SYNTAX_SET.find_syntax_by_token(lang));

    if let Some(syntax) = syntax {
        let theme = &THEME_SET.themes[SYNTAX_THEME];
        match highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme) {
            Ok(html) => return Node::raw(html),
            Err(err) => tracing::warn!(error = %err, "Syntax highlighting failed"),
        }
    }

    let mut code_element = Element::new("code").with_text(code);
    if let Some(lang) = language {
        code_element.set_attr("class", format!("language-{lang}"));
    }
    Element::new("pre").with_child(code_element).into()
}

pub fn markdown_to_nodes(markdown: &str) -> Vec<Node> {
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, Options::all()) {
        builder.event(event);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::render;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_front_matter_options() {
        let page = parse_page(
            "+++\nprevious = true\nkeywords = [\"tti\"]\n+++\n# Language\n",
        )
        .unwrap();
        assert_eq!(
            page.options,
            PageOptions {
                previous: true,
                keywords: vec!["tti".into()],
                ..PageOptions::default()
            }
        );
        assert_eq!(render(&page.body), "<h1>Language</h1>");
    }

    #[test]
    fn test_page_without_front_matter() {
        let page = parse_page("Plain *text*.").unwrap();
        assert_eq!(page.options, PageOptions::default());
        assert_eq!(render(&page.body), "<p>Plain <em>text</em>.</p>");
    }

    #[test]
    fn test_unclosed_front_matter() {
        assert!(matches!(
            parse_page("+++\nnext = true\n"),
            Err(ContentError::UnclosedFrontMatter)
        ));
    }

    #[test]
    fn test_invalid_front_matter() {
        assert!(matches!(
            parse_page("+++\nnext = \n+++\n"),
            Err(ContentError::FrontMatter(_))
        ));
    }

    #[test]
    fn test_tooltip_links() {
        let nodes = markdown_to_nodes("Use [uint](tooltip:uint) here.");
        assert_eq!(
            render(&nodes),
            "<p>Use <a class=\"tooltipLink\" id=\"uint\" href=\"#\">uint</a> here.</p>"
        );
    }

    #[test]
    fn test_regular_links_keep_target() {
        let nodes = markdown_to_nodes("[Fonts](fonts.html \"All fonts\")");
        assert_eq!(
            render(&nodes),
            "<p><a href=\"fonts.html\" title=\"All fonts\">Fonts</a></p>"
        );
    }

    #[test]
    fn test_unknown_language_stays_text() {
        let nodes = markdown_to_nodes("```tti\nint x;\n```\n");
        assert_eq!(
            render(&nodes),
            "<pre><code class=\"language-tti\">int x;\n</code></pre>"
        );
    }

    #[test]
    fn test_known_language_is_highlighted() {
        let nodes = markdown_to_nodes("```rust\nfn main() {}\n```\n");
        assert!(matches!(&nodes[0], Node::Raw(html) if html.starts_with("<pre")));
    }

    #[test]
    fn test_inline_code_and_lists() {
        let nodes = markdown_to_nodes("- `sub` a\n- b\n");
        assert_eq!(
            render(&nodes),
            "<ul><li><code>sub</code> a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_image_alt_text() {
        let nodes = markdown_to_nodes("![A glyph](glyph.png)");
        assert_eq!(
            render(&nodes),
            "<p><img src=\"glyph.png\" alt=\"A glyph\"></p>"
        );
    }

    #[test]
    fn test_table_head_cells() {
        let nodes = markdown_to_nodes("| a |\n|---|\n| b |\n");
        assert_eq!(
            render(&nodes),
            "<table><thead><tr><th>a</th></tr></thead><tr><td>b</td></tr></table>"
        );
    }
}
