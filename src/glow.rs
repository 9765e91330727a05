//! Release fade for key glow.
//!
//! Pressed keys glow at full strength. When a key leaves the pressed set its
//! glow fades out over `RELEASE_FADE`. One shared tick advances every fade; a
//! key pressed again mid-fade drops its fade entirely.

use crate::layout::CellId;

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

pub const RELEASE_FADE: Duration = Duration::from_secs(4);

/// Animation frame period while any fade is running.
pub const TICK: Duration = Duration::from_millis(30);

/// Levels below this are not worth drawing.
pub const MIN_VISIBLE_LEVEL: f32 = 0.001;

/// Fast start, long tail.
fn ease_out(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[derive(Clone, Copy, Debug)]
struct Fade {
    start: Instant,
    level: f32,
}

pub struct GlowAnimator {
    duration: Duration,
    fades: HashMap<CellId, Fade>,
    last_pressed: BTreeSet<CellId>,
}

impl Default for GlowAnimator {
    fn default() -> Self {
        Self::new(RELEASE_FADE)
    }
}

impl GlowAnimator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            fades: HashMap::new(),
            last_pressed: BTreeSet::new(),
        }
    }

    /// Diff against the previous pressed set: releases start fading,
    /// re-presses cancel their fade.
    pub fn sync(&mut self, pressed: impl IntoIterator<Item = CellId>, now: Instant) {
        let pressed: BTreeSet<CellId> = pressed.into_iter().collect();

        for cell in self.last_pressed.difference(&pressed) {
            self.fades.insert(
                *cell,
                Fade {
                    start: now,
                    level: 1.0,
                },
            );
        }
        for cell in &pressed {
            self.fades.remove(cell);
        }
        self.last_pressed = pressed;
    }

    /// Advance every fade. Returns true while any are still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let duration = self.duration.as_secs_f32().max(f32::EPSILON);
        self.fades.retain(|_, fade| {
            let t = now.saturating_duration_since(fade.start).as_secs_f32() / duration;
            fade.level = 1.0 - ease_out(t);
            t < 1.0 && fade.level > MIN_VISIBLE_LEVEL
        });
        self.is_animating()
    }

    pub fn is_animating(&self) -> bool {
        !self.fades.is_empty()
    }

    pub fn level(&self, cell: CellId, pressed: bool) -> f32 {
        if pressed {
            return 1.0;
        }
        self.fades.get(&cell).map_or(0.0, |f| f.level)
    }

    /// Drop all fades, e.g. when cells change meaning.
    pub fn clear(&mut self) {
        self.fades.clear();
        self.last_pressed.clear();
    }
}
