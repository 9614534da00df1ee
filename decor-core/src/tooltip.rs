use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Class marking a link that opens a tooltip instead of navigating.
pub const TOOLTIP_LINK_CLASS: &str = "tooltipLink";

/// Scheme used in page sources for tooltip links: `[text](tooltip:ID)`.
pub const TOOLTIP_SCHEME: &str = "tooltip:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    /// Markup shown in the tooltip panel.
    pub text: String,
    /// With a close button the tooltip stays open until closed explicitly.
    #[serde(default)]
    pub close_button: bool,
}

impl Tip {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            close_button: false,
        }
    }

    pub fn with_close_button(mut self) -> Self {
        self.close_button = true;
        self
    }
}

/// Finds the tip for a tooltip-triggering link by the link's id.
pub trait TooltipLookup {
    fn tip(&self, trigger_id: &str) -> Option<Tip>;
}

impl TooltipLookup for HashMap<String, Tip> {
    fn tip(&self, trigger_id: &str) -> Option<Tip> {
        self.get(trigger_id).cloned()
    }
}

impl TooltipLookup for BTreeMap<String, Tip> {
    fn tip(&self, trigger_id: &str) -> Option<Tip> {
        self.get(trigger_id).cloned()
    }
}

impl<T: TooltipLookup + ?Sized> TooltipLookup for &T {
    fn tip(&self, trigger_id: &str) -> Option<Tip> {
        (**self).tip(trigger_id)
    }
}

/// Element id of the tooltip panel opened by `trigger_id`.
pub fn tooltip_id(trigger_id: &str) -> String {
    format!("tooltip{trigger_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup() {
        let tips = HashMap::from([("uint".to_owned(), Tip::new("Unsigned").with_close_button())]);
        assert_eq!(
            tips.tip("uint"),
            Some(Tip {
                text: "Unsigned".into(),
                close_button: true
            })
        );
        assert_eq!(tips.tip("int"), None);
    }

    #[test]
    fn test_tooltip_id() {
        assert_eq!(tooltip_id("cvt"), "tooltipcvt");
    }

    #[test]
    fn test_close_button_defaults_off() {
        let tip: Tip = toml::from_str("text = \"x\"").unwrap();
        assert!(!tip.close_button);
    }
}
