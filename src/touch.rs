use crate::audio::AudioBackend;
use crate::layout::{CellId, CellMetrics, Key, Point, ScrollOffset, Skin};
use crate::notes::MidiNote;
use crate::overlay::{ControlOverlay, HandleKind};
use crate::voices::{NoteVoiceTracker, StopReason};

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// A pointer has to travel this far from its down point before it may take
/// over scrolling. Kept high so a held chord survives small finger drift.
pub const DRAG_THRESHOLD_PX: f32 = 40.0;

/// Scroll distance per pixel of finger travel.
pub const SCROLL_GAIN: f32 = 1.5;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub id: PointerId,
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
}

impl TouchEvent {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointerRole {
    Idle,
    KeyInput,
    Scrolling,
    OverlayConsumed,
}

struct Pointer {
    start: Point,
    last: Point,
    drag_distance: f32,
    owned: BTreeMap<CellId, MidiNote>,
    role: PointerRole,
}

impl Pointer {
    fn new(at: Point, role: PointerRole) -> Self {
        Self {
            start: at,
            last: at,
            drag_distance: 0.0,
            owned: BTreeMap::new(),
            role,
        }
    }
}

/// Everything a touch event may read or write besides the router itself.
pub struct TouchContext<'a, B> {
    pub skin: Skin,
    pub metrics: CellMetrics,
    /// Keys materialised for the current viewport.
    pub keys: &'a [Key],
    pub overlay: &'a mut ControlOverlay,
    pub scroll: &'a mut ScrollOffset,
    pub scroll_locked: bool,
    pub voices: &'a mut NoteVoiceTracker<B>,
    pub now: Instant,
}

/// Result of processing a touch event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TouchOutput {
    /// Cells that went down (and sounded) on this event.
    pub struck: Vec<CellId>,
    /// Cells this event let go of.
    pub released: Vec<CellId>,
    pub scrolled: bool,
    pub overlay_changed: bool,
    /// Overlay handle activated by this event.
    pub action: Option<HandleKind>,
}

impl TouchOutput {
    pub fn is_empty(&self) -> bool {
        *self == TouchOutput::default()
    }
}

/// Per-finger state machine.
///
/// Pointers are independent except for two shared resources: at most one of
/// them drives scrolling, and a cell belongs to whichever pointer claimed it
/// first. Frontends feed events in arrival order; desktop mouse and Android
/// multitouch both come through here.
#[derive(Default)]
pub struct TouchRouter {
    pointers: HashMap<PointerId, Pointer>,
    scroll_driver: Option<PointerId>,
}

impl TouchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self, id: PointerId) -> Option<PointerRole> {
        self.pointers.get(&id).map(|p| p.role)
    }

    pub fn scroll_driver(&self) -> Option<PointerId> {
        self.scroll_driver
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn owned_by(&self, id: PointerId) -> Vec<CellId> {
        self.pointers
            .get(&id)
            .map(|p| p.owned.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn handle_event<B: AudioBackend>(
        &mut self,
        event: TouchEvent,
        ctx: &mut TouchContext<'_, B>,
    ) -> TouchOutput {
        match event.phase {
            TouchPhase::Down => self.down(event.id, event.point(), ctx),
            TouchPhase::Move => self.moved(event.id, event.point(), ctx),
            TouchPhase::Up => self.lift(event.id, event.point(), true, ctx),
            TouchPhase::Cancel => self.lift(event.id, event.point(), false, ctx),
        }
    }

    fn down<B: AudioBackend>(
        &mut self,
        id: PointerId,
        at: Point,
        ctx: &mut TouchContext<'_, B>,
    ) -> TouchOutput {
        let mut out = TouchOutput::default();

        if self.pointers.contains_key(&id) {
            // A lost Up; don't leak whatever that pointer held.
            log::warn!("touch: pointer {} down twice, releasing stale state", id.0);
            out = self.lift(id, at, false, ctx);
        }

        if ctx.overlay.claims(at) {
            log::debug!("touch: pointer {} consumed by overlay", id.0);
            out.overlay_changed |= ctx.overlay.pointer_down(at, ctx.now);
            self.pointers
                .insert(id, Pointer::new(at, PointerRole::OverlayConsumed));
            return out;
        }

        let mut pointer = Pointer::new(at, PointerRole::Idle);
        if let Some(key) = ctx.skin.nearest_key(at, ctx.keys, ctx.metrics) {
            if ctx.voices.claim(key.cell, key.pitch) {
                log::debug!(
                    "touch: pointer {} claims {:?} pitch {}",
                    id.0,
                    key.cell,
                    key.pitch.0
                );
                pointer.owned.insert(key.cell, key.pitch);
                pointer.role = PointerRole::KeyInput;
                out.struck.push(key.cell);
            } else {
                log::debug!("touch: pointer {} on already-held {:?}", id.0, key.cell);
            }
        }
        self.pointers.insert(id, pointer);
        out
    }

    fn moved<B: AudioBackend>(
        &mut self,
        id: PointerId,
        at: Point,
        ctx: &mut TouchContext<'_, B>,
    ) -> TouchOutput {
        let mut out = TouchOutput::default();
        let Some(pointer) = self.pointers.get_mut(&id) else {
            return out;
        };
        let delta = Point::new(at.x - pointer.last.x, at.y - pointer.last.y);
        pointer.last = at;

        match pointer.role {
            PointerRole::OverlayConsumed => {
                out.overlay_changed = ctx.overlay.pointer_moved(at);
                return out;
            }
            PointerRole::Idle | PointerRole::KeyInput => {
                pointer.drag_distance = pointer.start.distance(at);
                if pointer.drag_distance <= DRAG_THRESHOLD_PX || self.scroll_driver.is_some() {
                    return out;
                }

                log::debug!("touch: pointer {} becomes scroll driver", id.0);
                for (cell, _) in std::mem::take(&mut pointer.owned) {
                    ctx.voices.release(cell);
                    out.released.push(cell);
                }
                pointer.role = PointerRole::Scrolling;
                self.scroll_driver = Some(id);
            }
            PointerRole::Scrolling => {}
        }

        if self.scroll_driver == Some(id) && !ctx.scroll_locked {
            ctx.scroll.x -= delta.x * SCROLL_GAIN;
            ctx.scroll.y -= delta.y * SCROLL_GAIN;
            out.scrolled = delta.x != 0.0 || delta.y != 0.0;
        }
        out
    }

    /// Up (`activate`) or Cancel: release everything the pointer owns.
    fn lift<B: AudioBackend>(
        &mut self,
        id: PointerId,
        at: Point,
        activate: bool,
        ctx: &mut TouchContext<'_, B>,
    ) -> TouchOutput {
        let mut out = TouchOutput::default();
        let Some(pointer) = self.pointers.remove(&id) else {
            return out;
        };

        for (cell, _) in pointer.owned {
            ctx.voices.release(cell);
            out.released.push(cell);
        }

        if self.scroll_driver == Some(id) {
            log::debug!("touch: pointer {} releases scrolling", id.0);
            self.scroll_driver = None;
        }

        if pointer.role == PointerRole::OverlayConsumed && activate {
            out.action = ctx.overlay.pointer_up(at);
            out.overlay_changed = true;
        }
        out
    }

    /// Drop every key held by any pointer, leaving the fingers themselves
    /// tracked (a scrolling finger keeps scrolling). Silences the backend once.
    pub fn drop_keys<B: AudioBackend>(
        &mut self,
        voices: &mut NoteVoiceTracker<B>,
        reason: StopReason,
    ) {
        for pointer in self.pointers.values_mut() {
            pointer.owned.clear();
            if pointer.role == PointerRole::KeyInput {
                pointer.role = PointerRole::Idle;
            }
        }
        voices.stop_all(reason);
    }

    /// Forget all pointers as if every finger had lifted, with a single
    /// stop-all instead of per-key note-offs.
    pub fn cancel_all<B: AudioBackend>(
        &mut self,
        voices: &mut NoteVoiceTracker<B>,
        reason: StopReason,
    ) {
        if !self.pointers.is_empty() {
            log::info!(
                "touch: cancelling {} pointers ({reason:?})",
                self.pointers.len()
            );
        }
        self.pointers.clear();
        self.scroll_driver = None;
        voices.stop_all(reason);
    }
}
