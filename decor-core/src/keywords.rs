//! Reserved-word highlighting for code samples.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{Element, Node};

pub const TTI_RESERVED_WORDS: &[&str] = &[
    "uint", "int", "const", "fixed", "bool", "void", "false", "true", "#input", "#output", "#gasp",
    "#twilight", "#stack", "#cvt", "if", "else", "while", "return",
];

pub const OT_RESERVED_WORDS: &[&str] = &[
    "#input", "#output", "script", "language", "required", "feature", "lookup", "sub", "pos",
    "mark", "ignore", "base", "ligature", "component", "group",
];

pub const C_RESERVED_WORDS: &[&str] = &["#include", "#pragma", "pack"];

/// Class put on the span wrapping a reserved word.
pub const RESERVED_WORD_CLASS: &str = "reservedWord";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub word: String,
    /// Highlight even when the match sits inside a longer word.
    pub unconditional: bool,
}

impl KeywordRule {
    pub fn guarded(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            unconditional: false,
        }
    }

    pub fn unconditional(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            unconditional: true,
        }
    }
}

/// A named list of reserved words as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub words: Vec<String>,
    #[serde(default)]
    pub unconditional: Vec<String>,
}

impl KeywordSet {
    pub fn from_words(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|w| (*w).to_owned()).collect(),
            unconditional: Vec::new(),
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = KeywordRule> + '_ {
        let guarded = self.words.iter().map(KeywordRule::guarded);
        let unconditional = self.unconditional.iter().map(KeywordRule::unconditional);
        guarded.chain(unconditional)
    }
}

/// The built-in `tti`, `ot` and `c` sets.
pub fn builtin_sets() -> BTreeMap<String, KeywordSet> {
    BTreeMap::from([
        ("tti".to_owned(), KeywordSet::from_words(TTI_RESERVED_WORDS)),
        ("ot".to_owned(), KeywordSet::from_words(OT_RESERVED_WORDS)),
        ("c".to_owned(), KeywordSet::from_words(C_RESERVED_WORDS)),
    ])
}

/// True when neither neighbour of `text[start..end]` is a lowercase ASCII letter.
pub fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    [before, after]
        .into_iter()
        .flatten()
        .all(|c| !c.is_ascii_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    Plain(&'a str),
    Reserved(&'a str),
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
    unconditional: HashSet<String>,
}

impl Highlighter {
    pub fn new<I>(rules: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = KeywordRule>,
    {
        let mut words = Vec::new();
        let mut unconditional = HashSet::new();
        for rule in rules {
            if rule.word.is_empty() {
                continue;
            }
            if rule.unconditional {
                unconditional.insert(rule.word.clone());
            }
            words.push(rule.word);
        }

        // Longest first so that "uint" wins over "int" at the same position.
        words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        words.dedup();

        let pattern = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self {
            pattern,
            unconditional,
        })
    }

    /// Splits `text` into plain runs and reserved words, in order.
    pub fn fragments<'a>(&self, text: &'a str) -> Vec<Fragment<'a>> {
        let Some(pattern) = &self.pattern else {
            return vec![Fragment::Plain(text)];
        };

        let mut fragments = Vec::new();
        let mut plain_start = 0;
        let mut position = 0;

        while let Some(found) = pattern.find_at(text, position) {
            let accepted = self.unconditional.contains(found.as_str())
                || is_word_boundary(text, found.start(), found.end());

            if accepted {
                if plain_start < found.start() {
                    fragments.push(Fragment::Plain(&text[plain_start..found.start()]));
                }
                fragments.push(Fragment::Reserved(found.as_str()));
                position = found.end();
                plain_start = position;
            } else {
                let step = text[found.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                position = found.start() + step;
            }

            if position >= text.len() {
                break;
            }
        }

        if plain_start < text.len() {
            fragments.push(Fragment::Plain(&text[plain_start..]));
        }

        fragments
    }

    pub fn highlight_nodes(&self, text: &str) -> Vec<Node> {
        self.fragments(text)
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Plain(plain) => Node::text(plain),
                Fragment::Reserved(word) => Element::new("span")
                    .with_class(RESERVED_WORD_CLASS)
                    .with_text(word)
                    .into(),
            })
            .collect()
    }

    /// Highlights every text node below `element`, leaving existing markup alone.
    pub fn highlight_element(&self, element: &mut Element) {
        let children = std::mem::take(&mut element.children);
        for child in children {
            match child {
                Node::Text(text) => element.children.extend(self.highlight_nodes(&text)),
                Node::Element(mut inner) => {
                    if !inner.has_class(RESERVED_WORD_CLASS) {
                        self.highlight_element(&mut inner);
                    }
                    element.children.push(Node::Element(inner));
                }
                raw @ Node::Raw(_) => element.children.push(raw),
            }
        }
    }
}
