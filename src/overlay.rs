//! Control overlay: a persistent anchor button at the top-right corner with a
//! fan of handles that opens around it.
//!
//! The overlay claims touches before key lookup. Its rectangular interaction
//! region is reserved even while the menu is closed; handle zones only exist
//! while it is open.

use crate::layout::{Point, Rect, ScreenSize};

use std::time::{Duration, Instant};

pub const ANCHOR_MARGIN: f32 = 12.0;
pub const ANCHOR_SIZE: f32 = 65.0;
pub const HANDLE_SIZE: f32 = 70.0;
pub const FAN_RADIUS: f32 = 100.0;
pub const INTERACTION_REGION_SIZE: f32 = 300.0;
pub const AUTO_CLOSE: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HandleKind {
    Close,
    Skin,
    Settings,
    Lock,
    Exit,
}

impl HandleKind {
    pub const ALL: [HandleKind; 5] = [
        HandleKind::Close,
        HandleKind::Skin,
        HandleKind::Settings,
        HandleKind::Lock,
        HandleKind::Exit,
    ];

    /// Screen angle (y grows downwards) from the anchor centre.
    pub fn angle_degrees(self) -> f32 {
        match self {
            HandleKind::Close => 180.0,
            HandleKind::Skin => 150.0,
            HandleKind::Settings => 120.0,
            HandleKind::Lock => 90.0,
            HandleKind::Exit => 210.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HandleKind::Close => "X",
            HandleKind::Skin => "SKIN",
            HandleKind::Settings => "SET",
            HandleKind::Lock => "LOCK",
            HandleKind::Exit => "EXIT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleZone {
    pub kind: HandleKind,
    pub center: Point,
    pub radius: f32,
}

impl HandleZone {
    pub fn contains(&self, p: Point) -> bool {
        p.distance_sq(self.center) <= self.radius * self.radius
    }
}

pub struct ControlOverlay {
    screen: ScreenSize,
    /// Density factor applied to every overlay dimension.
    scale: f32,
    open: bool,
    deadline: Option<Instant>,
    zones: Vec<HandleZone>,
    hovered: Option<HandleKind>,
}

impl ControlOverlay {
    pub fn new(screen: ScreenSize, scale: f32) -> Self {
        Self {
            screen,
            scale: scale.max(0.1),
            open: false,
            deadline: None,
            zones: Vec::new(),
            hovered: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn hovered(&self) -> Option<HandleKind> {
        self.hovered
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Live handle zones; empty while closed.
    pub fn zones(&self) -> &[HandleZone] {
        &self.zones
    }

    pub fn handle_radius(&self) -> f32 {
        HANDLE_SIZE * self.scale / 2.0
    }

    pub fn anchor_radius(&self) -> f32 {
        ANCHOR_SIZE * self.scale / 2.0
    }

    pub fn anchor(&self) -> Point {
        let offset = (ANCHOR_MARGIN + ANCHOR_SIZE / 2.0) * self.scale;
        Point::new(self.screen.width - offset, offset)
    }

    pub fn interaction_region(&self) -> Rect {
        let size = INTERACTION_REGION_SIZE * self.scale;
        Rect {
            left: self.screen.width - size,
            top: 0.0,
            right: self.screen.width,
            bottom: size,
        }
    }

    pub fn resize(&mut self, screen: ScreenSize) {
        self.screen = screen;
        self.rebuild_zones();
    }

    /// True when a touch at `p` belongs to the overlay and must not reach key lookup.
    pub fn claims(&self, p: Point) -> bool {
        self.interaction_region().contains(p) || self.zone_at(p).is_some()
    }

    pub fn zone_at(&self, p: Point) -> Option<HandleKind> {
        self.zones.iter().find(|z| z.contains(p)).map(|z| z.kind)
    }

    fn on_anchor(&self, p: Point) -> bool {
        let r = self.anchor_radius();
        p.distance_sq(self.anchor()) <= r * r
    }

    fn rebuild_zones(&mut self) {
        self.zones.clear();
        if !self.open {
            return;
        }
        let anchor = self.anchor();
        let fan = FAN_RADIUS * self.scale;
        let radius = self.handle_radius();
        self.zones.extend(HandleKind::ALL.iter().map(|&kind| {
            let rad = kind.angle_degrees().to_radians();
            HandleZone {
                kind,
                center: Point::new(anchor.x + fan * rad.cos(), anchor.y + fan * rad.sin()),
                radius,
            }
        }));
    }

    /// The auto-close deadline is armed when the menu opens. Opening an
    /// already open menu leaves it alone.
    pub fn open(&mut self, now: Instant) {
        if self.open {
            return;
        }
        log::debug!("overlay: open");
        self.open = true;
        self.hovered = None;
        self.deadline = Some(now + AUTO_CLOSE);
        self.rebuild_zones();
    }

    /// Close and cancel any pending auto-close.
    pub fn close(&mut self) {
        if self.open {
            log::debug!("overlay: close");
        }
        self.open = false;
        self.hovered = None;
        self.deadline = None;
        self.rebuild_zones();
    }

    /// Returns true when anything visible changed.
    pub fn pointer_down(&mut self, p: Point, now: Instant) -> bool {
        if self.on_anchor(p) {
            self.open(now);
            return true;
        }
        false
    }

    pub fn pointer_moved(&mut self, p: Point) -> bool {
        if !self.open {
            return false;
        }
        let hovered = self.zone_at(p);
        let changed = hovered != self.hovered;
        self.hovered = hovered;
        changed
    }

    /// Activates the handle under the lift point, if any.
    pub fn pointer_up(&mut self, p: Point) -> Option<HandleKind> {
        if !self.open {
            return None;
        }
        let action = self.zone_at(p);
        self.hovered = None;
        if let Some(kind) = action {
            log::debug!("overlay: activate {kind:?}");
            if kind == HandleKind::Close {
                self.close();
            }
        }
        action
    }

    /// Auto-close once the idle deadline passes. Returns true if it closed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                log::debug!("overlay: auto-close");
                self.close();
                true
            }
            _ => false,
        }
    }

    /// Keys this close to a handle get no glow, even when held.
    pub fn is_key_inactive(&self, key_center: Point, key_radius: f32) -> bool {
        self.zones.iter().any(|z| {
            let limit = key_radius + z.radius;
            key_center.distance_sq(z.center) < limit * limit
        })
    }
}
