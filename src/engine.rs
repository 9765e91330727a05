use crate::app_state::{Effects, KeyboardState};
use crate::audio::{AudioBackend, GuardedBackend};
use crate::glow::{self, GlowAnimator};
use crate::layout::{Key, ScreenSize, Skin};
use crate::notes::LabelMode;
use crate::overlay::{ControlOverlay, HandleKind};
use crate::settings_panel::{SettingsPanel, SettingsRow};
use crate::touch::{PointerId, PointerRole, TouchContext, TouchEvent, TouchPhase, TouchRouter};
use crate::voices::{NoteVoiceTracker, StopReason};

use std::collections::HashMap;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Screen {
    Keyboard,
    /// The timeline screen. Not implemented here; only a place to navigate to.
    Arranger,
}

/// Platform-agnostic keyboard core.
/// UI frontends translate their input into touches and commands and feed them here.
pub struct Engine<B> {
    state: KeyboardState,
    router: TouchRouter,
    voices: NoteVoiceTracker<B>,
    overlay: ControlOverlay,
    glow: GlowAnimator,
    screen: Screen,
    show_settings: bool,
    show_debug: bool,
    focused: bool,
    /// Pointers that went down while the settings panel was up, with the row
    /// they started on.
    panel_pointers: HashMap<PointerId, Option<SettingsRow>>,
}

impl<B: AudioBackend> Engine<B> {
    /// `density` scales the overlay to the display.
    pub fn new(audio: GuardedBackend<B>, screen: ScreenSize, density: f32) -> Self {
        Self {
            state: KeyboardState::new(screen, Skin::Hex),
            router: TouchRouter::new(),
            voices: NoteVoiceTracker::new(audio),
            overlay: ControlOverlay::new(screen, density),
            glow: GlowAnimator::default(),
            screen: Screen::Keyboard,
            show_settings: false,
            show_debug: false,
            focused: true,
            panel_pointers: HashMap::new(),
        }
    }

    pub fn initialize_audio(&mut self) -> bool {
        self.voices.initialize()
    }

    pub fn state(&self) -> &KeyboardState {
        &self.state
    }

    pub fn voices(&self) -> &NoteVoiceTracker<B> {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut NoteVoiceTracker<B> {
        &mut self.voices
    }

    pub fn overlay(&self) -> &ControlOverlay {
        &self.overlay
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn show_settings(&self) -> bool {
        self.show_settings
    }

    pub fn show_debug(&self) -> bool {
        self.show_debug
    }

    pub fn pointer_role(&self, id: PointerId) -> Option<PointerRole> {
        self.router.role(id)
    }

    pub fn handle_touch(&mut self, event: TouchEvent, now: Instant) -> Effects {
        if self.screen != Screen::Keyboard {
            return Effects::empty();
        }
        if let Some(effects) = self.settings_touch(event, now) {
            return effects;
        }
        self.route_touch(event, now)
    }

    /// While the settings panel is up it owns every new touch. Rows act on
    /// lift and a touch outside the panel dismisses it. Returns None for
    /// touches that belong to the keyboard.
    fn settings_touch(&mut self, event: TouchEvent, now: Instant) -> Option<Effects> {
        let p = event.point();
        match event.phase {
            TouchPhase::Down => {
                self.panel_pointers.remove(&event.id);
                if !self.show_settings {
                    return None;
                }
                let mut effects = Effects::empty();
                if self.router.role(event.id).is_some() {
                    // A lost Up; let the router release what it held.
                    let cancel = TouchEvent {
                        phase: TouchPhase::Cancel,
                        ..event
                    };
                    effects |= self.route_touch(cancel, now);
                }

                let panel = SettingsPanel::layout(self.state.screen());
                if panel.contains(p) {
                    let row = panel.row_at(p);
                    log::debug!("engine: pointer {} on settings row {row:?}", event.id.0);
                    self.panel_pointers.insert(event.id, row);
                } else {
                    self.panel_pointers.insert(event.id, None);
                    effects |= self.toggle_settings();
                }
                Some(effects)
            }
            TouchPhase::Move => self
                .panel_pointers
                .contains_key(&event.id)
                .then(Effects::empty),
            TouchPhase::Up => {
                let row = self.panel_pointers.remove(&event.id)?;
                let panel = SettingsPanel::layout(self.state.screen());
                match row {
                    Some(row) if self.show_settings && panel.row_at(p) == Some(row) => {
                        Some(self.apply_settings_row(row, now))
                    }
                    _ => Some(Effects::empty()),
                }
            }
            TouchPhase::Cancel => self
                .panel_pointers
                .remove(&event.id)
                .map(|_| Effects::empty()),
        }
    }

    fn route_touch(&mut self, event: TouchEvent, now: Instant) -> Effects {
        let skin = self.state.skin();
        let metrics = self.state.metrics();
        let scroll_locked = self.state.scroll_locked;
        let (keys, scroll) = self.state.touch_parts();
        let mut ctx = TouchContext {
            skin,
            metrics,
            keys,
            overlay: &mut self.overlay,
            scroll,
            scroll_locked,
            voices: &mut self.voices,
            now,
        };
        let out = self.router.handle_event(event, &mut ctx);

        let mut effects = Effects::empty();
        if out.scrolled {
            self.state.refresh_keys();
            effects |= Effects::Redraw;
        }
        if !out.struck.is_empty() {
            effects |= Effects::Redraw | Effects::Haptic;
        }
        if !out.released.is_empty() || out.overlay_changed {
            effects |= Effects::Redraw;
        }
        if let Some(kind) = out.action {
            effects |= self.apply_action(kind, now);
        }
        effects | self.sync_glow(now)
    }

    fn sync_glow(&mut self, now: Instant) -> Effects {
        self.glow.sync(self.voices.pressed().keys().copied(), now);
        if self.glow.is_animating() {
            Effects::Animating
        } else {
            Effects::empty()
        }
    }

    pub fn apply_action(&mut self, kind: HandleKind, now: Instant) -> Effects {
        match kind {
            HandleKind::Close => Effects::Redraw,
            HandleKind::Skin => self.toggle_skin(now),
            HandleKind::Settings => self.toggle_settings(),
            HandleKind::Lock => self.set_scroll_lock(!self.state.scroll_locked),
            HandleKind::Exit => self.navigate(Screen::Arranger),
        }
    }

    /// Same commands as the matching `UiButton`s.
    pub fn apply_settings_row(&mut self, row: SettingsRow, now: Instant) -> Effects {
        match row {
            SettingsRow::Skin => self.toggle_skin(now),
            SettingsRow::Labels => self.cycle_label_mode(),
            SettingsRow::ScrollLock => self.set_scroll_lock(!self.state.scroll_locked),
            SettingsRow::Debug => self.toggle_debug(),
        }
    }

    pub fn toggle_skin(&mut self, now: Instant) -> Effects {
        let next = self.state.skin().toggle();
        self.set_skin(next, now)
    }

    /// Silences everything before the new layout can sound.
    pub fn set_skin(&mut self, skin: Skin, now: Instant) -> Effects {
        if skin == self.state.skin() {
            return Effects::empty();
        }
        log::info!("engine: skin -> {}", skin.as_str());
        self.router.drop_keys(&mut self.voices, StopReason::SkinSwitch);
        self.glow.clear();
        self.state.set_skin(skin);
        Effects::SkinChanged | Effects::Redraw | self.sync_glow(now)
    }

    pub fn set_scroll_lock(&mut self, locked: bool) -> Effects {
        log::debug!("engine: scroll lock {locked}");
        self.state.scroll_locked = locked;
        Effects::Redraw
    }

    pub fn set_label_mode(&mut self, mode: LabelMode) -> Effects {
        self.state.label_mode = mode;
        Effects::Redraw
    }

    pub fn cycle_label_mode(&mut self) -> Effects {
        self.set_label_mode(self.state.label_mode.cycle())
    }

    pub fn toggle_settings(&mut self) -> Effects {
        self.show_settings = !self.show_settings;
        Effects::SettingsToggled | Effects::Redraw
    }

    pub fn set_debug(&mut self, show: bool) -> Effects {
        self.show_debug = show;
        Effects::Redraw
    }

    pub fn toggle_debug(&mut self) -> Effects {
        self.set_debug(!self.show_debug)
    }

    /// Escape: settings panel first, then the overlay menu.
    pub fn dismiss(&mut self) -> Effects {
        if self.show_settings {
            self.toggle_settings()
        } else if self.overlay.is_open() {
            self.overlay.close();
            Effects::Redraw
        } else {
            Effects::empty()
        }
    }

    /// Losing focus ends every gesture with a single stop-all.
    pub fn set_focus(&mut self, focused: bool, now: Instant) -> Effects {
        if focused == self.focused {
            return Effects::empty();
        }
        self.focused = focused;
        if focused {
            log::info!("engine: focus gained");
            return Effects::Redraw;
        }
        log::info!("engine: focus lost");
        self.router
            .cancel_all(&mut self.voices, StopReason::LostForeground);
        self.panel_pointers.clear();
        self.overlay.close();
        Effects::Redraw | self.sync_glow(now)
    }

    pub fn navigate(&mut self, screen: Screen) -> Effects {
        if screen == self.screen {
            return Effects::empty();
        }
        self.screen = screen;
        match screen {
            Screen::Keyboard => Effects::Redraw,
            Screen::Arranger => {
                log::info!("engine: leaving keyboard");
                self.router
                    .cancel_all(&mut self.voices, StopReason::NavigateAway);
                self.panel_pointers.clear();
                self.overlay.close();
                self.show_settings = false;
                self.glow.clear();
                Effects::ExitRequested | Effects::Redraw
            }
        }
    }

    pub fn resize(&mut self, screen: ScreenSize) -> Effects {
        if !self.state.resize(screen) {
            return Effects::empty();
        }
        self.overlay.resize(screen);
        Effects::Redraw
    }

    /// Periodic work: overlay auto-close and glow fades.
    pub fn tick(&mut self, now: Instant) -> Effects {
        let mut effects = Effects::empty();
        if self.overlay.poll(now) {
            effects |= Effects::Redraw;
        }
        if self.glow.is_animating() {
            effects |= Effects::Redraw;
            if self.glow.tick(now) {
                effects |= Effects::Animating;
            }
        }
        effects
    }

    /// When the frontend should next call `tick`, if at all.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        let fade = self.glow.is_animating().then(|| now + glow::TICK);
        match (fade, self.overlay.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Glow strength for a visible key, zero under the overlay handles.
    pub fn glow_level(&self, key: &Key) -> f32 {
        if self.overlay.is_key_inactive(key.center, self.state.key_radius()) {
            return 0.0;
        }
        self.glow.level(key.cell, self.voices.is_pressed(key.cell))
    }

    pub fn shutdown(&mut self) {
        log::info!("engine: shutdown");
        self.router.cancel_all(&mut self.voices, StopReason::Shutdown);
        self.panel_pointers.clear();
        self.voices.audio_mut().shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{ready_backend, Call, RecordingBackend};
    use crate::layout::{CellId, Point, Rect};
    use std::time::Duration;

    const SCREEN: ScreenSize = ScreenSize {
        width: 800.0,
        height: 600.0,
    };

    fn engine() -> Engine<RecordingBackend> {
        Engine::new(ready_backend(), SCREEN, 1.0)
    }

    fn touch(id: u64, phase: TouchPhase, p: Point) -> TouchEvent {
        TouchEvent {
            id: PointerId(id),
            phase,
            x: p.x,
            y: p.y,
        }
    }

    /// Centres of visible keys well away from the overlay corner.
    fn free_keys(e: &Engine<RecordingBackend>, n: usize) -> Vec<Key> {
        let mut keys: Vec<Key> = e
            .state()
            .keys()
            .iter()
            .filter(|k| {
                k.center.x > 60.0
                    && k.center.x < 400.0
                    && k.center.y > 350.0
                    && k.center.y < 550.0
            })
            .cloned()
            .collect();
        keys.dedup_by_key(|k| k.pitch);
        keys.truncate(n);
        assert_eq!(keys.len(), n);
        keys
    }

    fn calls(e: &Engine<RecordingBackend>) -> Vec<Call> {
        e.voices().audio().backend().unwrap().calls[1..].to_vec()
    }

    #[test]
    fn strike_reports_haptic_and_release_fades() {
        let mut e = engine();
        let now = Instant::now();
        let k = free_keys(&e, 1).remove(0);

        let fx = e.handle_touch(touch(1, TouchPhase::Down, k.center), now);
        assert!(fx.contains(Effects::Haptic | Effects::Redraw));
        assert_eq!(e.glow_level(&k), 1.0);

        let fx = e.handle_touch(touch(1, TouchPhase::Up, k.center), now);
        assert!(fx.contains(Effects::Animating));
        assert_eq!(e.next_wakeup(now), Some(now + glow::TICK));

        let fx = e.tick(now + Duration::from_secs(1));
        assert!(fx.contains(Effects::Animating));
        assert!(e.glow_level(&k) < 1.0 && e.glow_level(&k) > 0.0);

        let fx = e.tick(now + Duration::from_secs(5));
        assert!(!fx.contains(Effects::Animating));
        assert_eq!(e.glow_level(&k), 0.0);
        assert_eq!(e.next_wakeup(now), None);
    }

    #[test]
    fn losing_focus_stops_all_exactly_once() {
        let mut e = engine();
        let now = Instant::now();
        for (i, k) in free_keys(&e, 3).iter().enumerate() {
            e.handle_touch(touch(i as u64, TouchPhase::Down, k.center), now);
        }
        assert_eq!(e.voices().pressed().len(), 3);

        e.set_focus(false, now);
        e.set_focus(false, now);
        assert!(e.voices().is_empty());
        assert_eq!(
            calls(&e).iter().filter(|c| **c == Call::StopAll).count(),
            1
        );
        assert!(e.set_focus(true, now).contains(Effects::Redraw));
    }

    #[test]
    fn skin_switch_silences_before_new_notes() {
        let mut e = engine();
        let now = Instant::now();
        let k = free_keys(&e, 1).remove(0);
        e.handle_touch(touch(1, TouchPhase::Down, k.center), now);

        let fx = e.toggle_skin(now);
        assert!(fx.contains(Effects::SkinChanged));
        assert_eq!(e.state().skin(), Skin::Rect);
        assert!(e.voices().is_empty());

        let k2 = free_keys(&e, 1).remove(0);
        e.handle_touch(touch(2, TouchPhase::Down, k2.center), now);
        let c = calls(&e);
        let stop_all = c.iter().position(|c| *c == Call::StopAll).unwrap();
        assert_eq!(c[stop_all + 1], Call::Play(k2.pitch.0));

        // The finger from before the switch lifts without a stray note-off.
        e.handle_touch(touch(1, TouchPhase::Up, k.center), now);
        assert!(e.voices().is_pressed(k2.cell));
    }

    #[test]
    fn overlay_handles_drive_engine_actions() {
        let mut e = engine();
        let now = Instant::now();
        let anchor = e.overlay().anchor();
        let zone = |e: &Engine<RecordingBackend>, kind: HandleKind| {
            e.overlay()
                .zones()
                .iter()
                .find(|z| z.kind == kind)
                .unwrap()
                .center
        };

        e.handle_touch(touch(1, TouchPhase::Down, anchor), now);
        let lock = zone(&e, HandleKind::Lock);
        e.handle_touch(touch(1, TouchPhase::Move, lock), now);
        e.handle_touch(touch(1, TouchPhase::Up, lock), now);
        assert!(e.state().scroll_locked);

        let settings = zone(&e, HandleKind::Settings);
        e.handle_touch(touch(2, TouchPhase::Down, settings), now);
        let fx = e.handle_touch(touch(2, TouchPhase::Up, settings), now);
        assert!(fx.contains(Effects::SettingsToggled));
        assert!(e.show_settings());

        let skin = zone(&e, HandleKind::Skin);
        e.handle_touch(touch(3, TouchPhase::Down, skin), now);
        let fx = e.handle_touch(touch(3, TouchPhase::Up, skin), now);
        assert!(fx.contains(Effects::SkinChanged));

        let exit = zone(&e, HandleKind::Exit);
        e.handle_touch(touch(4, TouchPhase::Down, exit), now);
        let fx = e.handle_touch(touch(4, TouchPhase::Up, exit), now);
        assert!(fx.contains(Effects::ExitRequested));
        assert_eq!(e.screen(), Screen::Arranger);
        assert!(!e.show_settings());
        assert!(!e.overlay().is_open());
    }

    #[test]
    fn touches_are_ignored_off_the_keyboard_screen() {
        let mut e = engine();
        let now = Instant::now();
        let k = free_keys(&e, 1).remove(0);
        e.handle_touch(touch(1, TouchPhase::Down, k.center), now);

        e.navigate(Screen::Arranger);
        assert!(e.voices().is_empty());
        assert_eq!(
            calls(&e),
            vec![Call::Play(k.pitch.0), Call::StopAll]
        );

        let fx = e.handle_touch(touch(2, TouchPhase::Down, k.center), now);
        assert!(fx.is_empty());
        assert!(e.voices().is_empty());

        assert_eq!(e.navigate(Screen::Keyboard), Effects::Redraw);
        e.handle_touch(touch(2, TouchPhase::Down, k.center), now);
        assert!(e.voices().is_pressed(k.cell));
    }

    #[test]
    fn overlay_auto_closes_on_tick() {
        let mut e = engine();
        let now = Instant::now();
        let anchor = e.overlay().anchor();
        e.handle_touch(touch(1, TouchPhase::Down, anchor), now);
        e.handle_touch(touch(1, TouchPhase::Up, anchor), now);
        assert!(e.overlay().is_open());
        assert_eq!(e.next_wakeup(now), e.overlay().deadline());

        assert!(e.tick(now + Duration::from_secs(4)).is_empty());
        assert!(e.tick(now + Duration::from_secs(5)).contains(Effects::Redraw));
        assert!(!e.overlay().is_open());
    }

    #[test]
    fn keys_under_open_handles_do_not_glow() {
        let mut e = engine();
        let now = Instant::now();
        e.set_skin(Skin::Rect, now);
        e.overlay.open(now);
        let lock = e.overlay().zones()[3].center;
        let key = e.state().key_at(lock).cloned().unwrap();

        // Held from outside the overlay's reach, the key would glow.
        e.voices.claim(key.cell, key.pitch);
        assert_eq!(e.glow_level(&key), 0.0);
        e.overlay.close();
        assert_eq!(e.glow_level(&key), 1.0);
    }

    #[test]
    fn scrolling_rebuilds_visible_keys() {
        let mut e = engine();
        let now = Instant::now();
        let before: Vec<CellId> = e.state().keys().iter().map(|k| k.cell).collect();
        let p = Point::new(200.0, 450.0);
        e.handle_touch(touch(1, TouchPhase::Down, p), now);
        let fx = e.handle_touch(touch(1, TouchPhase::Move, Point::new(200.0, 300.0)), now);
        assert!(fx.contains(Effects::Redraw));
        let after: Vec<CellId> = e.state().keys().iter().map(|k| k.cell).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn dismiss_closes_settings_then_overlay() {
        let mut e = engine();
        let now = Instant::now();
        e.toggle_settings();
        e.overlay.open(now);
        e.dismiss();
        assert!(!e.show_settings());
        assert!(e.overlay().is_open());
        e.dismiss();
        assert!(!e.overlay().is_open());
        assert!(e.dismiss().is_empty());
    }

    /// A point on `row` with a key underneath it.
    fn row_point(e: &Engine<RecordingBackend>, row: SettingsRow) -> Point {
        let panel = SettingsPanel::layout(SCREEN);
        let r: Rect = panel.rows.iter().find(|(r, _)| *r == row).unwrap().1;
        let y = (r.top + r.bottom) / 2.0;
        (r.left as i32 + 1..r.right as i32)
            .map(|x| Point::new(x as f32, y))
            .find(|p| e.state().key_at(*p).is_some())
            .unwrap()
    }

    #[test]
    fn settings_rows_claim_touches_without_sounding() {
        let mut e = engine();
        let now = Instant::now();
        e.toggle_settings();
        let lock = row_point(&e, SettingsRow::ScrollLock);

        let fx = e.handle_touch(touch(1, TouchPhase::Down, lock), now);
        assert!(!fx.contains(Effects::Haptic));
        assert!(e.voices().is_empty());
        assert!(!e.state().scroll_locked, "rows act on lift");

        e.handle_touch(touch(1, TouchPhase::Move, lock), now);
        e.handle_touch(touch(1, TouchPhase::Up, lock), now);
        assert!(e.state().scroll_locked);
        assert!(e.show_settings());
        assert!(calls(&e).is_empty());

        let labels = row_point(&e, SettingsRow::Labels);
        e.handle_touch(touch(2, TouchPhase::Down, labels), now);
        e.handle_touch(touch(2, TouchPhase::Up, labels), now);
        assert_eq!(e.state().label_mode, LabelMode::Solfege);
    }

    #[test]
    fn lifting_off_the_row_does_nothing() {
        let mut e = engine();
        let now = Instant::now();
        e.toggle_settings();
        let lock = row_point(&e, SettingsRow::ScrollLock);
        e.handle_touch(touch(1, TouchPhase::Down, lock), now);
        let debug = row_point(&e, SettingsRow::Debug);
        e.handle_touch(touch(1, TouchPhase::Up, debug), now);
        assert!(!e.state().scroll_locked);
        assert!(!e.show_debug());

        e.handle_touch(touch(2, TouchPhase::Down, lock), now);
        e.handle_touch(touch(2, TouchPhase::Cancel, lock), now);
        assert!(!e.state().scroll_locked);
    }

    #[test]
    fn touch_outside_settings_dismisses_without_sounding() {
        let mut e = engine();
        let now = Instant::now();
        let k = free_keys(&e, 1).remove(0);
        e.toggle_settings();

        let fx = e.handle_touch(touch(1, TouchPhase::Down, k.center), now);
        assert!(fx.contains(Effects::SettingsToggled));
        assert!(!e.show_settings());
        assert!(e.voices().is_empty());
        e.handle_touch(touch(1, TouchPhase::Up, k.center), now);
        assert!(calls(&e).is_empty());

        e.handle_touch(touch(2, TouchPhase::Down, k.center), now);
        assert!(e.voices().is_pressed(k.cell));
    }

    #[test]
    fn keys_held_before_settings_open_still_release() {
        let mut e = engine();
        let now = Instant::now();
        let k = free_keys(&e, 1).remove(0);
        e.handle_touch(touch(1, TouchPhase::Down, k.center), now);
        e.toggle_settings();

        e.handle_touch(touch(1, TouchPhase::Up, k.center), now);
        assert!(e.voices().is_empty());
        assert!(e.show_settings());
        assert_eq!(calls(&e), vec![Call::Play(k.pitch.0), Call::Stop(k.pitch.0)]);
    }

    #[test]
    fn shutdown_silences_and_closes_backend() {
        let mut e = engine();
        let now = Instant::now();
        let k = free_keys(&e, 1).remove(0);
        e.handle_touch(touch(1, TouchPhase::Down, k.center), now);
        e.shutdown();
        assert_eq!(
            calls(&e),
            vec![Call::Play(k.pitch.0), Call::StopAll, Call::Shutdown]
        );
    }
}
