pub mod builder;
pub mod config;
pub mod content;
pub mod decorate;
pub mod dom;
pub mod keywords;
pub mod navigation;
pub mod scanner;
pub mod session;
pub mod sitemap;
pub mod surface;
pub mod template;
pub mod tooltip;

// Re-export main types
pub use builder::{BuildError, BuildReport, RenderError, Site, SiteBuilder};
pub use config::{Config, ConfigError};
pub use decorate::{Decoration, Decorator, Footer};
pub use navigation::{Navigation, NavigationRow};
pub use session::{Effect, UiEvent, UiSession};
pub use sitemap::{PageEntry, SiteMap, SiteMapError, UnknownPagePolicy};
pub use surface::{RenderCapabilities, Surface};
pub use template::{TemplateError, TemplateRenderer};
pub use tooltip::{Tip, TooltipLookup};
