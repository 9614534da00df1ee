//! Interactive state of a decorated page.
//!
//! The host feeds pointer, focus, scroll and timer events into a [`UiSession`]
//! and applies the [`Effect`]s it answers with. All state that the page needs
//! between events lives here.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;

use crate::surface::RenderCapabilities;
use crate::tooltip::{TooltipLookup, tooltip_id};

/// Initial offset of the navigation panel from the top right corner.
pub const PANEL_START: PanelOffset = PanelOffset { right: 10, top: 10 };

pub const TOOLTIP_HIDE_DELAY: Duration = Duration::from_millis(1500);

pub const PANEL_RESYNC_INTERVAL: Duration = Duration::from_millis(100);

/// Tooltips open this far below the pointer.
pub const TOOLTIP_POINTER_GAP: i32 = 10;

/// Browser-side handler for the events a [`UiSession`] models, called with a
/// settings object. It never contains a closing script tag.
const PAGE_SCRIPT: &str = r#"(function (settings) {
    var panel = document.querySelector(".navigation");
    var contents = document.getElementById("contents");
    var right = settings.panelRight;
    var top = settings.panelTop;
    var drag = null;

    function place() {
        if (!panel) return;
        panel.style.right = right + "px";
        panel.style.top = (settings.fixedPositioning ? top : window.pageYOffset + top) + "px";
    }
    place();
    if (!settings.fixedPositioning) window.setInterval(place, settings.resyncMs);

    var header = document.querySelector(".contentsHeader");
    if (header) header.addEventListener("mousedown", function (e) {
        drag = { x: e.screenX, y: e.screenY };
    });
    document.addEventListener("mousemove", function (e) {
        if (!drag) return;
        right -= e.screenX - drag.x;
        top += e.screenY - drag.y;
        drag = { x: e.screenX, y: e.screenY };
        place();
    });
    document.addEventListener("mouseup", function () { drag = null; });

    var toggle = document.querySelector(".contentsToggle");
    if (toggle && contents) toggle.addEventListener("click", function (e) {
        e.preventDefault();
        contents.classList.toggle("open");
    });

    var open = null;
    var delayHiding = false;
    var pending = {};

    function hide(id) {
        var tip = document.getElementById(id);
        if (tip) tip.style.display = "none";
    }

    function bindLink(link) {
        link.addEventListener("click", function (e) {
            e.preventDefault();
            var id = link.getAttribute("data-tooltip");
            var tip = document.getElementById(id);
            if (!tip) return;
            if (pending[id]) {
                window.clearTimeout(pending[id]);
                delete pending[id];
            }
            if (open && open.id !== id) hide(open.id);
            tip.style.left = e.pageX + "px";
            tip.style.top = (e.pageY + settings.pointerGap) + "px";
            tip.style.display = "block";
            open = { id: id, hideOnBlur: !tip.querySelector("[data-action=close-tooltip]") };
            link.focus();
        });
        link.addEventListener("blur", function () {
            if (!open || !open.hideOnBlur) return;
            var id = open.id;
            open = null;
            if (!delayHiding) {
                hide(id);
                return;
            }
            delayHiding = false;
            pending[id] = window.setTimeout(function () {
                delete pending[id];
                hide(id);
            }, settings.hideDelayMs);
        });
    }

    var links = document.querySelectorAll("a[data-tooltip]");
    for (var i = 0; i < links.length; i++) bindLink(links[i]);

    var tips = document.querySelectorAll(".tooltip");
    for (var j = 0; j < tips.length; j++) {
        tips[j].addEventListener("mousedown", function () { delayHiding = true; });
    }

    var closers = document.querySelectorAll("[data-action=close-tooltip]");
    for (var k = 0; k < closers.length; k++) {
        closers[k].addEventListener("click", function (e) {
            e.preventDefault();
            delayHiding = false;
            if (open) hide(open.id);
            open = null;
        });
    }
})"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptSettings {
    panel_right: i32,
    panel_top: i32,
    fixed_positioning: bool,
    hide_delay_ms: u64,
    resync_ms: u64,
    pointer_gap: i32,
}

/// Script that gives a decorated page its panel dragging, contents toggle and
/// tooltips, with the same timings and offsets as [`UiSession`].
pub fn page_script(surface: &dyn RenderCapabilities) -> Result<String, serde_json::Error> {
    let settings = ScriptSettings {
        panel_right: PANEL_START.right,
        panel_top: PANEL_START.top,
        fixed_positioning: surface.supports_fixed_positioning(),
        hide_delay_ms: TOOLTIP_HIDE_DELAY.as_millis() as u64,
        resync_ms: PANEL_RESYNC_INTERVAL.as_millis() as u64,
        pointer_gap: TOOLTIP_POINTER_GAP,
    };
    Ok(format!("{PAGE_SCRIPT}({});", serde_json::to_string(&settings)?))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelOffset {
    pub right: i32,
    pub top: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Hides the tooltip panel with this id.
    TooltipHide(String),
    PanelResync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Pointer pressed on the contents header, in screen coordinates.
    HeaderPointerDown { screen: Point },
    PointerMove { screen: Point },
    PointerUp,
    ToggleContents,
    /// A tooltip link was clicked, in page coordinates.
    TooltipLinkClick { trigger_id: String, page: Point },
    /// Pointer pressed inside the open tooltip.
    TooltipPointerDown,
    /// The tooltip link lost focus.
    TriggerBlur,
    CloseTooltip,
    Scroll { top: i32 },
    TimerFired(Timer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PositionPanel { right: i32, top: i32 },
    SetContentsVisible(bool),
    ShowTooltip { id: String, left: i32, top: i32 },
    HideTooltip { id: String },
    StartTimer {
        timer: Timer,
        delay: Duration,
        repeat: bool,
    },
}

#[derive(Debug, Clone)]
struct OpenTooltip {
    id: String,
    hide_on_blur: bool,
}

pub struct UiSession<L> {
    lookup: L,
    fixed_positioning: bool,
    panel: PanelOffset,
    scroll_top: i32,
    contents_visible: bool,
    /// Last pointer position, set only between header pointer-down and pointer-up.
    drag: Option<Point>,
    tooltip: Option<OpenTooltip>,
    delay_hiding: bool,
    /// Tooltips waiting for their hide timer.
    pending_hide: HashSet<String>,
}

impl<L: TooltipLookup> UiSession<L> {
    pub fn new(lookup: L, surface: &dyn RenderCapabilities) -> Self {
        Self {
            lookup,
            fixed_positioning: surface.supports_fixed_positioning(),
            panel: PANEL_START,
            scroll_top: 0,
            contents_visible: false,
            drag: None,
            tooltip: None,
            delay_hiding: false,
            pending_hide: HashSet::new(),
        }
    }

    /// Effects to apply once after the page is decorated.
    pub fn start(&mut self) -> Vec<Effect> {
        self.contents_visible = false;
        let mut effects = vec![self.position_panel(), Effect::SetContentsVisible(false)];
        if !self.fixed_positioning {
            effects.push(Effect::StartTimer {
                timer: Timer::PanelResync,
                delay: PANEL_RESYNC_INTERVAL,
                repeat: true,
            });
        }
        effects
    }

    pub fn handle(&mut self, event: UiEvent) -> Vec<Effect> {
        match event {
            UiEvent::HeaderPointerDown { screen } => {
                self.drag = Some(screen);
                Vec::new()
            }
            UiEvent::PointerMove { screen } => self.drag_to(screen),
            UiEvent::PointerUp => {
                self.drag = None;
                Vec::new()
            }
            UiEvent::ToggleContents => {
                self.contents_visible = !self.contents_visible;
                vec![Effect::SetContentsVisible(self.contents_visible)]
            }
            UiEvent::TooltipLinkClick { trigger_id, page } => self.show_tooltip(&trigger_id, page),
            UiEvent::TooltipPointerDown => {
                self.delay_hiding = true;
                Vec::new()
            }
            UiEvent::TriggerBlur => self.blur_trigger(),
            UiEvent::CloseTooltip => self.close_tooltip(),
            UiEvent::Scroll { top } => {
                self.scroll_top = top;
                Vec::new()
            }
            UiEvent::TimerFired(Timer::TooltipHide(id)) => {
                if self.pending_hide.remove(&id) {
                    vec![Effect::HideTooltip { id }]
                } else {
                    Vec::new()
                }
            }
            UiEvent::TimerFired(Timer::PanelResync) => {
                if self.fixed_positioning {
                    Vec::new()
                } else {
                    vec![self.position_panel()]
                }
            }
        }
    }

    pub fn panel_offset(&self) -> PanelOffset {
        self.panel
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn contents_visible(&self) -> bool {
        self.contents_visible
    }

    pub fn open_tooltip(&self) -> Option<&str> {
        self.tooltip.as_ref().map(|open| open.id.as_str())
    }

    fn position_panel(&self) -> Effect {
        let top = if self.fixed_positioning {
            self.panel.top
        } else {
            self.scroll_top + self.panel.top
        };
        Effect::PositionPanel {
            right: self.panel.right,
            top,
        }
    }

    fn drag_to(&mut self, screen: Point) -> Vec<Effect> {
        let Some(last) = self.drag else {
            return Vec::new();
        };
        // The panel is anchored on the right, so it moves against the pointer horizontally.
        self.panel.right -= screen.x - last.x;
        self.panel.top += screen.y - last.y;
        self.drag = Some(screen);
        vec![self.position_panel()]
    }

    fn show_tooltip(&mut self, trigger_id: &str, page: Point) -> Vec<Effect> {
        let Some(tip) = self.lookup.tip(trigger_id) else {
            tracing::warn!(trigger = trigger_id, "No tip for tooltip link");
            return Vec::new();
        };

        let id = tooltip_id(trigger_id);
        // Shown again before its timer fired: the timer no longer applies.
        self.pending_hide.remove(&id);
        let mut effects = Vec::new();
        if let Some(previous) = self.tooltip.take()
            && previous.id != id
        {
            effects.push(Effect::HideTooltip { id: previous.id });
        }

        effects.push(Effect::ShowTooltip {
            id: id.clone(),
            left: page.x,
            top: page.y + TOOLTIP_POINTER_GAP,
        });
        self.tooltip = Some(OpenTooltip {
            id,
            hide_on_blur: !tip.close_button,
        });
        effects
    }

    fn blur_trigger(&mut self) -> Vec<Effect> {
        let Some(open) = self.tooltip.take_if(|open| open.hide_on_blur) else {
            return Vec::new();
        };

        if std::mem::take(&mut self.delay_hiding) {
            self.pending_hide.insert(open.id.clone());
            vec![Effect::StartTimer {
                timer: Timer::TooltipHide(open.id),
                delay: TOOLTIP_HIDE_DELAY,
                repeat: false,
            }]
        } else {
            vec![Effect::HideTooltip { id: open.id }]
        }
    }

    fn close_tooltip(&mut self) -> Vec<Effect> {
        self.delay_hiding = false;
        self.tooltip
            .take()
            .map(|open| Effect::HideTooltip { id: open.id })
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;
    use crate::tooltip::Tip;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn tips() -> HashMap<String, Tip> {
        HashMap::from([
            ("uint".to_owned(), Tip::new("Unsigned integer")),
            ("cvt".to_owned(), Tip::new("Control values").with_close_button()),
        ])
    }

    fn session(surface: Surface) -> UiSession<HashMap<String, Tip>> {
        let mut session = UiSession::new(tips(), &surface);
        session.start();
        session
    }

    fn click(trigger: &str) -> UiEvent {
        UiEvent::TooltipLinkClick {
            trigger_id: trigger.into(),
            page: Point::new(40, 200),
        }
    }

    #[test]
    fn test_start_positions_and_collapses() {
        let mut session = UiSession::new(tips(), &Surface::Modern);
        assert_eq!(
            session.start(),
            vec![
                Effect::PositionPanel { right: 10, top: 10 },
                Effect::SetContentsVisible(false),
            ]
        );
    }

    #[test]
    fn test_legacy_start_schedules_resync() {
        let mut session = UiSession::new(tips(), &Surface::Legacy);
        let effects = session.start();
        assert_eq!(
            effects.last(),
            Some(&Effect::StartTimer {
                timer: Timer::PanelResync,
                delay: PANEL_RESYNC_INTERVAL,
                repeat: true
            })
        );
    }

    #[test]
    fn test_drag_moves_panel_by_pointer_delta() {
        let mut session = session(Surface::Modern);
        session.handle(UiEvent::HeaderPointerDown {
            screen: Point::new(100, 100),
        });
        let effects = session.handle(UiEvent::PointerMove {
            screen: Point::new(105, 97),
        });
        assert_eq!(effects, vec![Effect::PositionPanel { right: 5, top: 7 }]);
        assert_eq!(session.panel_offset(), PanelOffset { right: 5, top: 7 });
    }

    #[test]
    fn test_drag_accumulates_from_last_position() {
        let mut session = session(Surface::Modern);
        session.handle(UiEvent::HeaderPointerDown {
            screen: Point::new(0, 0),
        });
        session.handle(UiEvent::PointerMove {
            screen: Point::new(-4, 6),
        });
        session.handle(UiEvent::PointerMove {
            screen: Point::new(-10, 8),
        });
        assert_eq!(session.panel_offset(), PanelOffset { right: 20, top: 18 });
    }

    #[test]
    fn test_pointer_up_ends_drag() {
        let mut session = session(Surface::Modern);
        session.handle(UiEvent::HeaderPointerDown {
            screen: Point::new(0, 0),
        });
        assert!(session.is_dragging());
        session.handle(UiEvent::PointerUp);
        assert!(!session.is_dragging());
        let effects = session.handle(UiEvent::PointerMove {
            screen: Point::new(50, 50),
        });
        assert!(effects.is_empty());
        assert_eq!(session.panel_offset(), PANEL_START);
    }

    #[test]
    fn test_legacy_panel_follows_scroll() {
        let mut session = session(Surface::Legacy);
        session.handle(UiEvent::Scroll { top: 300 });
        assert_eq!(
            session.handle(UiEvent::TimerFired(Timer::PanelResync)),
            vec![Effect::PositionPanel { right: 10, top: 310 }]
        );
    }

    #[test]
    fn test_modern_panel_ignores_resync() {
        let mut session = session(Surface::Modern);
        session.handle(UiEvent::Scroll { top: 300 });
        assert!(session.handle(UiEvent::TimerFired(Timer::PanelResync)).is_empty());
    }

    #[test]
    fn test_toggle_contents() {
        let mut session = session(Surface::Modern);
        assert_eq!(
            session.handle(UiEvent::ToggleContents),
            vec![Effect::SetContentsVisible(true)]
        );
        assert_eq!(
            session.handle(UiEvent::ToggleContents),
            vec![Effect::SetContentsVisible(false)]
        );
    }

    #[test]
    fn test_tooltip_opens_below_pointer() {
        let mut session = session(Surface::Modern);
        assert_eq!(
            session.handle(click("uint")),
            vec![Effect::ShowTooltip {
                id: "tooltipuint".into(),
                left: 40,
                top: 210
            }]
        );
        assert_eq!(session.open_tooltip(), Some("tooltipuint"));
    }

    #[test]
    fn test_blur_hides_tooltip() {
        let mut session = session(Surface::Modern);
        session.handle(click("uint"));
        assert_eq!(
            session.handle(UiEvent::TriggerBlur),
            vec![Effect::HideTooltip {
                id: "tooltipuint".into()
            }]
        );
        assert_eq!(session.open_tooltip(), None);
    }

    #[test]
    fn test_pointer_in_tooltip_delays_hiding() {
        let mut session = session(Surface::Modern);
        session.handle(click("uint"));
        session.handle(UiEvent::TooltipPointerDown);
        assert_eq!(
            session.handle(UiEvent::TriggerBlur),
            vec![Effect::StartTimer {
                timer: Timer::TooltipHide("tooltipuint".into()),
                delay: TOOLTIP_HIDE_DELAY,
                repeat: false
            }]
        );
        let fired = UiEvent::TimerFired(Timer::TooltipHide("tooltipuint".into()));
        assert_eq!(
            session.handle(fired.clone()),
            vec![Effect::HideTooltip {
                id: "tooltipuint".into()
            }]
        );
        assert!(session.handle(fired).is_empty());
    }

    fn open_and_leave(session: &mut UiSession<HashMap<String, Tip>>, trigger: &str) {
        session.handle(click(trigger));
        session.handle(UiEvent::TooltipPointerDown);
        session.handle(UiEvent::TriggerBlur);
    }

    #[test]
    fn test_each_delayed_hide_hides_its_own_tooltip() {
        let tips = HashMap::from([
            ("a".to_owned(), Tip::new("First")),
            ("b".to_owned(), Tip::new("Second")),
        ]);
        let mut session = UiSession::new(tips, &Surface::Modern);
        session.start();
        open_and_leave(&mut session, "a");
        open_and_leave(&mut session, "b");

        let mut hidden = Vec::new();
        for id in ["tooltipa", "tooltipb"] {
            hidden.extend(session.handle(UiEvent::TimerFired(Timer::TooltipHide(id.into()))));
        }
        assert_eq!(
            hidden,
            vec![
                Effect::HideTooltip { id: "tooltipa".into() },
                Effect::HideTooltip { id: "tooltipb".into() },
            ]
        );
    }

    #[test]
    fn test_reopened_tooltip_survives_stale_timer() {
        let mut session = session(Surface::Modern);
        open_and_leave(&mut session, "uint");
        session.handle(click("uint"));

        let fired = UiEvent::TimerFired(Timer::TooltipHide("tooltipuint".into()));
        assert!(session.handle(fired).is_empty());
        assert_eq!(session.open_tooltip(), Some("tooltipuint"));
    }

    #[test]
    fn test_close_button_suppresses_blur() {
        let mut session = session(Surface::Modern);
        session.handle(click("cvt"));
        assert!(session.handle(UiEvent::TriggerBlur).is_empty());
        assert_eq!(session.open_tooltip(), Some("tooltipcvt"));
        assert_eq!(
            session.handle(UiEvent::CloseTooltip),
            vec![Effect::HideTooltip {
                id: "tooltipcvt".into()
            }]
        );
    }

    #[test]
    fn test_opening_another_tooltip_hides_previous() {
        let mut session = session(Surface::Modern);
        session.handle(click("cvt"));
        let effects = session.handle(click("uint"));
        assert_eq!(
            effects[0],
            Effect::HideTooltip {
                id: "tooltipcvt".into()
            }
        );
        assert_eq!(session.open_tooltip(), Some("tooltipuint"));
    }

    #[test]
    fn test_page_script_carries_session_settings() {
        let script = page_script(&Surface::Modern).unwrap();
        assert!(script.ends_with(
            "({\"panelRight\":10,\"panelTop\":10,\"fixedPositioning\":true,\"hideDelayMs\":1500,\"resyncMs\":100,\"pointerGap\":10});"
        ));
        assert!(!script.contains("</"));
    }

    #[test]
    fn test_legacy_page_script_resyncs_panel() {
        let script = page_script(&Surface::Legacy).unwrap();
        assert!(script.contains("\"fixedPositioning\":false"));
        assert!(script.contains("window.setInterval(place, settings.resyncMs)"));
    }

    #[test]
    fn test_unknown_trigger_is_ignored() {
        let mut session = session(Surface::Modern);
        assert!(session.handle(click("nothing")).is_empty());
        assert_eq!(session.open_tooltip(), None);
    }
}
