use crate::layout::{CellMetrics, Key, Point, ScreenSize, ScrollOffset, Skin};
use crate::notes::LabelMode;
use crate::viewport::{self, CellRange};

use bitflags::bitflags;

bitflags! {
    /// What a frontend should do after handing an event to the engine.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Effects: u16 {
        const Redraw = 1 << 0;
        /// A key was struck; frontends with a vibrator tick it.
        const Haptic = 1 << 1;
        const SkinChanged = 1 << 2;
        const SettingsToggled = 1 << 3;
        /// The user left the keyboard screen.
        const ExitRequested = 1 << 4;
        /// Fades are running; keep ticking.
        const Animating = 1 << 5;
    }
}

/// Where the keyboard is looking and how it is drawn.
///
/// Each skin remembers its own scroll position, so switching back and forth
/// returns to the same spot. The visible key list is cached and rebuilt
/// whenever the viewport moves.
pub struct KeyboardState {
    skin: Skin,
    scrolls: [ScrollOffset; 2],
    screen: ScreenSize,
    metrics: CellMetrics,
    keys: Vec<Key>,

    pub scroll_locked: bool,
    pub label_mode: LabelMode,
}

impl KeyboardState {
    pub fn new(screen: ScreenSize, skin: Skin) -> Self {
        let metrics = CellMetrics::for_screen_width(screen.width);
        let initial = viewport::initial_scroll(metrics, screen);
        let mut state = Self {
            skin,
            scrolls: [initial; 2],
            screen,
            metrics,
            keys: Vec::new(),
            scroll_locked: false,
            label_mode: LabelMode::NoteName,
        };
        state.refresh_keys();
        state
    }

    pub fn skin(&self) -> Skin {
        self.skin
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.scrolls[self.skin.index()]
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn visible_range(&self) -> CellRange {
        viewport::visible_range(self.skin, self.metrics, self.screen, self.scroll())
    }

    pub fn key_at(&self, p: Point) -> Option<&Key> {
        self.skin.nearest_key(p, &self.keys, self.metrics)
    }

    /// Rough radius of a drawn key, for overlay suppression.
    pub fn key_radius(&self) -> f32 {
        match self.skin {
            Skin::Hex => self.metrics.cell_size,
            Skin::Rect => self.metrics.vertical_spacing() / 2.0,
        }
    }

    /// Returns false if `skin` was already active.
    pub fn set_skin(&mut self, skin: Skin) -> bool {
        if skin == self.skin {
            return false;
        }
        self.skin = skin;
        self.refresh_keys();
        true
    }

    /// New screen size: cells are resized and both skins start over from the
    /// initial position.
    pub fn resize(&mut self, screen: ScreenSize) -> bool {
        if screen == self.screen {
            return false;
        }
        self.screen = screen;
        self.metrics = CellMetrics::for_screen_width(screen.width);
        self.scrolls = [viewport::initial_scroll(self.metrics, screen); 2];
        self.refresh_keys();
        true
    }

    pub fn refresh_keys(&mut self) {
        self.keys = viewport::visible_keys(self.skin, self.metrics, self.screen, self.scroll());
    }

    /// Split borrow for the touch router: current keys plus the live scroll.
    pub fn touch_parts(&mut self) -> (&[Key], &mut ScrollOffset) {
        (&self.keys, &mut self.scrolls[self.skin.index()])
    }
}
