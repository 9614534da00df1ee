use serde::{Deserialize, Serialize};

/// What the rendering surface can do, decided once at startup.
pub trait RenderCapabilities {
    /// Without a DOM nothing can be decorated.
    fn supports_dom(&self) -> bool {
        true
    }

    /// Without fixed positioning the panel is absolutely positioned and has to
    /// follow the scroll offset itself.
    fn supports_fixed_positioning(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    #[default]
    Modern,
    Legacy,
    Text,
}

impl RenderCapabilities for Surface {
    fn supports_dom(&self) -> bool {
        !matches!(self, Surface::Text)
    }

    fn supports_fixed_positioning(&self) -> bool {
        matches!(self, Surface::Modern)
    }
}

/// CSS `position` value the navigation panel uses on `surface`.
pub fn panel_position(surface: &dyn RenderCapabilities) -> &'static str {
    if surface.supports_fixed_positioning() {
        "fixed"
    } else {
        "absolute"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_capabilities() {
        assert!(Surface::Modern.supports_fixed_positioning());
        assert!(!Surface::Legacy.supports_fixed_positioning());
        assert!(Surface::Legacy.supports_dom());
        assert!(!Surface::Text.supports_dom());
    }

    #[test]
    fn test_panel_position() {
        assert_eq!(panel_position(&Surface::Modern), "fixed");
        assert_eq!(panel_position(&Surface::Legacy), "absolute");
    }
}
