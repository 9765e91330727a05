use crate::app_state::Effects;
use crate::audio::AudioBackend;
use crate::engine::{Engine, Screen};
use crate::input_map::{self, Command, KeyState, UiButton, UiKey};
use crate::layout::{ScreenSize, Skin};
use crate::notes::LabelMode;
use crate::touch::TouchEvent;

use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    Key { state: KeyState, key: UiKey },
    Button(UiButton),
    Touch(TouchEvent),
    Focus(bool),
    Resize(ScreenSize),
    Navigate(Screen),
    SetSkin(Skin),
    SetLabelMode(LabelMode),
    SetScrollLock(bool),
    /// Periodic animation/timeout tick.
    Tick,
}

/// Platform-agnostic UI event processor.
///
/// Frontends (desktop, Android, future) can translate their raw input into `UiEvent`s,
/// and optionally record/replay those streams for regression testing.
pub struct UiSession<B> {
    engine: Engine<B>,
}

impl<B: AudioBackend> UiSession<B> {
    pub fn new(engine: Engine<B>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<B> {
        &mut self.engine
    }

    pub fn into_engine(self) -> Engine<B> {
        self.engine
    }

    pub fn handle(&mut self, event: UiEvent, now: Instant) -> Effects {
        match event {
            UiEvent::Key { state, key } => match input_map::command_from_key(state, key) {
                Some(cmd) => self.apply(cmd, now),
                None => Effects::empty(),
            },
            UiEvent::Button(button) => self.apply(input_map::command_from_button(button), now),
            UiEvent::Touch(te) => self.engine.handle_touch(te, now),
            UiEvent::Focus(focused) => self.engine.set_focus(focused, now),
            UiEvent::Resize(size) => self.engine.resize(size),
            UiEvent::Navigate(screen) => self.engine.navigate(screen),
            UiEvent::SetSkin(skin) => self.engine.set_skin(skin, now),
            UiEvent::SetLabelMode(mode) => self.engine.set_label_mode(mode),
            UiEvent::SetScrollLock(locked) => self.engine.set_scroll_lock(locked),
            UiEvent::Tick => self.engine.tick(now),
        }
    }

    pub fn apply(&mut self, command: Command, now: Instant) -> Effects {
        match command {
            Command::ToggleSkin => self.engine.toggle_skin(now),
            Command::ToggleScrollLock => {
                let locked = !self.engine.state().scroll_locked;
                self.engine.set_scroll_lock(locked)
            }
            Command::CycleLabels => self.engine.cycle_label_mode(),
            Command::ToggleDebug => self.engine.toggle_debug(),
            Command::ToggleSettings => self.engine.toggle_settings(),
            Command::Dismiss => self.engine.dismiss(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimedEvent {
    /// Offset from the start of the recording.
    pub at: Duration,
    pub event: UiEvent,
}

/// A recorded event stream. Replaying it into a fresh session at the same
/// relative times reproduces the same keyboard state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiEventLog {
    pub events: Vec<TimedEvent>,
}

impl UiEventLog {
    pub fn record(&mut self, at: Duration, event: UiEvent) {
        self.events.push(TimedEvent { at, event });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn replay<B: AudioBackend>(&self, session: &mut UiSession<B>, start: Instant) -> Effects {
        let mut effects = Effects::empty();
        for e in &self.events {
            effects |= session.handle(e.event.clone(), start + e.at);
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{ready_backend, Call, RecordingBackend};
    use crate::layout::{CellId, Point};
    use crate::touch::{PointerId, TouchPhase};

    const SCREEN: ScreenSize = ScreenSize {
        width: 800.0,
        height: 600.0,
    };

    fn session() -> UiSession<RecordingBackend> {
        UiSession::new(Engine::new(ready_backend(), SCREEN, 1.0))
    }

    fn touch(id: u64, phase: TouchPhase, x: f32, y: f32) -> UiEvent {
        UiEvent::Touch(TouchEvent {
            id: PointerId(id),
            phase,
            x,
            y,
        })
    }

    fn pressed(s: &UiSession<RecordingBackend>) -> Vec<CellId> {
        s.engine().voices().pressed().keys().copied().collect()
    }

    #[test]
    fn ui_event_log_replay_matches_state() {
        let t0 = Instant::now();
        let mut s1 = session();
        let mut log = UiEventLog::default();

        let script = [
            (0, touch(1, TouchPhase::Down, 120.0, 420.0)),
            (10, touch(2, TouchPhase::Down, 300.0, 500.0)),
            (20, touch(3, TouchPhase::Down, 200.0, 480.0)),
            (30, touch(3, TouchPhase::Move, 200.0, 380.0)),
            (40, touch(3, TouchPhase::Move, 150.0, 330.0)),
            (50, touch(2, TouchPhase::Up, 300.0, 500.0)),
            (60, UiEvent::Key {
                state: KeyState::Pressed,
                key: UiKey::Char('n'),
            }),
        ];
        for (ms, e) in script {
            let at = Duration::from_millis(ms);
            log.record(at, e.clone());
            s1.handle(e, t0 + at);
        }
        let fresh = session();
        assert_ne!(s1.engine().state().scroll(), fresh.engine().state().scroll());

        let mut s2 = session();
        log.replay(&mut s2, t0);

        assert_eq!(pressed(&s1), pressed(&s2));
        assert_eq!(s1.engine().state().scroll(), s2.engine().state().scroll());
        assert_eq!(
            s1.engine().state().label_mode,
            s2.engine().state().label_mode
        );
        assert_eq!(
            s1.engine().voices().audio().backend().unwrap().calls,
            s2.engine().voices().audio().backend().unwrap().calls
        );
    }

    #[test]
    fn replay_honours_recorded_timing() {
        let mut s = session();
        let anchor = s.engine().overlay().anchor();
        let mut log = UiEventLog::default();
        log.record(
            Duration::ZERO,
            touch(1, TouchPhase::Down, anchor.x, anchor.y),
        );
        log.record(Duration::from_millis(100), touch(1, TouchPhase::Up, anchor.x, anchor.y));
        log.record(Duration::from_secs(6), UiEvent::Tick);

        let t0 = Instant::now();
        log.replay(&mut s, t0);
        assert!(!s.engine().overlay().is_open(), "closed by the tick after 5 s");
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn shortcuts_drive_the_engine() {
        let now = Instant::now();
        let mut s = session();

        let fx = s.handle(
            UiEvent::Key {
                state: KeyState::Pressed,
                key: UiKey::Tab,
            },
            now,
        );
        assert!(fx.contains(Effects::SkinChanged));
        assert_eq!(s.engine().state().skin(), Skin::Rect);

        s.handle(UiEvent::Button(UiButton::ScrollLock), now);
        assert!(s.engine().state().scroll_locked);

        s.handle(UiEvent::Button(UiButton::Debug), now);
        assert!(s.engine().show_debug());

        s.handle(UiEvent::Button(UiButton::Settings), now);
        s.handle(
            UiEvent::Key {
                state: KeyState::Pressed,
                key: UiKey::Escape,
            },
            now,
        );
        assert!(!s.engine().show_settings());

        let fx = s.handle(
            UiEvent::Key {
                state: KeyState::Released,
                key: UiKey::Tab,
            },
            now,
        );
        assert!(fx.is_empty());
    }

    #[test]
    fn focus_loss_through_session_stops_all() {
        let now = Instant::now();
        let mut s = session();
        s.handle(touch(1, TouchPhase::Down, 120.0, 420.0), now);
        s.handle(touch(2, TouchPhase::Down, 300.0, 500.0), now);
        s.handle(UiEvent::Focus(false), now);

        assert!(pressed(&s).is_empty());
        let backend = s.engine().voices().audio().backend().unwrap();
        assert_eq!(backend.count(Call::StopAll), 1);
        assert!(backend.stops().is_empty());
    }

    #[test]
    fn direct_setters() {
        let now = Instant::now();
        let mut s = session();
        s.handle(UiEvent::SetLabelMode(LabelMode::Hidden), now);
        s.handle(UiEvent::SetScrollLock(true), now);
        s.handle(UiEvent::SetSkin(Skin::Rect), now);
        s.handle(
            UiEvent::Resize(ScreenSize {
                width: 640.0,
                height: 480.0,
            }),
            now,
        );
        let e = s.engine();
        assert_eq!(e.state().label_mode, LabelMode::Hidden);
        assert!(e.state().scroll_locked);
        assert_eq!(e.state().skin(), Skin::Rect);
        assert_eq!(e.state().screen().width, 640.0);
        assert!(e.state().key_at(Point::new(320.0, 240.0)).is_some());

        let fx = s.handle(UiEvent::Navigate(Screen::Arranger), now);
        assert!(fx.contains(Effects::ExitRequested));
    }
}
