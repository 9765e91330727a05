use crate::app_state::Effects;
use crate::audio::{AudioBackend, AudioError, GuardedBackend, Result};
use crate::engine::Engine;
use crate::layout::ScreenSize;
use crate::notes::MidiNote;
use crate::render::{self, PixelCanvas};
use crate::touch::TouchPhase;
use crate::ui_events::{UiEvent, UiSession};

use crossbeam_channel::{Receiver, Sender};
use std::time::Instant;

/// What the Activity's native audio engine should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCommand {
    Init,
    Shutdown,
    Play(MidiNote),
    Stop(MidiNote),
    StopAll,
}

impl AudioCommand {
    pub const OP_INIT: i32 = 0;
    pub const OP_SHUTDOWN: i32 = 1;
    pub const OP_PLAY: i32 = 2;
    pub const OP_STOP: i32 = 3;
    pub const OP_STOP_ALL: i32 = 4;

    /// `[opcode, pitch]`; pitch is 0 for commands without one.
    pub fn encode(self) -> [i32; 2] {
        match self {
            AudioCommand::Init => [Self::OP_INIT, 0],
            AudioCommand::Shutdown => [Self::OP_SHUTDOWN, 0],
            AudioCommand::Play(n) => [Self::OP_PLAY, n.0 as i32],
            AudioCommand::Stop(n) => [Self::OP_STOP, n.0 as i32],
            AudioCommand::StopAll => [Self::OP_STOP_ALL, 0],
        }
    }

    pub fn decode(pair: [i32; 2]) -> Option<Self> {
        let pitch = || u8::try_from(pair[1]).ok().filter(|p| *p < 128).map(MidiNote);
        match pair[0] {
            Self::OP_INIT => Some(AudioCommand::Init),
            Self::OP_SHUTDOWN => Some(AudioCommand::Shutdown),
            Self::OP_PLAY => pitch().map(AudioCommand::Play),
            Self::OP_STOP => pitch().map(AudioCommand::Stop),
            Self::OP_STOP_ALL => Some(AudioCommand::StopAll),
            _ => None,
        }
    }
}

/// Backend that only queues commands. The Activity drains the queue after
/// each call into Rust and forwards it to the native engine, so no JNI
/// callbacks happen from inside the core.
pub struct QueueBackend {
    tx: Sender<AudioCommand>,
    started: Instant,
}

impl QueueBackend {
    pub fn new(tx: Sender<AudioCommand>) -> Self {
        Self {
            tx,
            started: Instant::now(),
        }
    }

    fn send(&self, cmd: AudioCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .map_err(|_| AudioError::Unavailable("audio command queue closed".into()))
    }
}

impl AudioBackend for QueueBackend {
    fn init(&mut self) -> Result<()> {
        self.started = Instant::now();
        self.send(AudioCommand::Init)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.send(AudioCommand::Shutdown)
    }

    fn play_note_polyphonic(&mut self, note: MidiNote) -> Result<()> {
        self.send(AudioCommand::Play(note))
    }

    fn stop_note_polyphonic(&mut self, note: MidiNote) -> Result<()> {
        self.send(AudioCommand::Stop(note))
    }

    fn stop_all_notes(&mut self) -> Result<()> {
        self.send(AudioCommand::StopAll)
    }

    fn current_time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// `MotionEvent` action codes, masked with `ACTION_MASK`.
pub fn touch_phase_from_android(action: i32) -> Option<TouchPhase> {
    match action & 0xFF {
        0 | 5 => Some(TouchPhase::Down), // ACTION_DOWN / ACTION_POINTER_DOWN
        1 | 6 => Some(TouchPhase::Up),   // ACTION_UP / ACTION_POINTER_UP
        2 => Some(TouchPhase::Move),
        3 => Some(TouchPhase::Cancel),
        _ => None,
    }
}

/// Android-facing wrapper that owns the core Engine.
///
/// Audio goes out through a channel the Activity drains, see `QueueBackend`.
pub struct AndroidFrontend {
    ui: UiSession<QueueBackend>,
    audio_rx: Receiver<AudioCommand>,
}

impl AndroidFrontend {
    /// `native_audio_loaded` is false when the Activity failed to load its
    /// audio library; the keyboard still works, silently.
    pub fn new(screen: ScreenSize, density: f32, native_audio_loaded: bool) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let audio = if native_audio_loaded {
            GuardedBackend::new(QueueBackend::new(tx))
        } else {
            GuardedBackend::unavailable("native audio library not loaded")
        };
        let mut engine = Engine::new(audio, screen, density);
        engine.initialize_audio();
        Self {
            ui: UiSession::new(engine),
            audio_rx: rx,
        }
    }

    pub fn engine(&self) -> &Engine<QueueBackend> {
        self.ui.engine()
    }

    pub fn engine_mut(&mut self) -> &mut Engine<QueueBackend> {
        self.ui.engine_mut()
    }

    pub fn handle(&mut self, event: UiEvent) -> Effects {
        self.handle_at(event, Instant::now())
    }

    pub fn handle_at(&mut self, event: UiEvent, now: Instant) -> Effects {
        self.ui.handle(event, now)
    }

    /// Milliseconds until the next tick is due, or -1 when idle.
    pub fn next_wakeup_ms(&self, now: Instant) -> i64 {
        match self.engine().next_wakeup(now) {
            Some(at) => at.saturating_duration_since(now).as_millis() as i64,
            None => -1,
        }
    }

    pub fn drain_audio_commands(&self) -> Vec<AudioCommand> {
        self.audio_rx.try_iter().collect()
    }

    /// Drained commands flattened to `[op, pitch, op, pitch, ...]`.
    pub fn drain_encoded_audio_commands(&self) -> Vec<i32> {
        self.audio_rx.try_iter().flat_map(AudioCommand::encode).collect()
    }

    /// Draw a frame as opaque ARGB_8888 for an Android `Bitmap`.
    pub fn render_argb(&self, width: usize, height: usize) -> Vec<i32> {
        let mut pixels = vec![0u32; width * height];
        render::draw_frame(&mut PixelCanvas::new(&mut pixels, width, height), self.engine());
        pixels.into_iter().map(|p| (p | 0xFF00_0000) as i32).collect()
    }

    pub fn shutdown(&mut self) {
        self.engine_mut().shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::{PointerId, TouchEvent};

    const SCREEN: ScreenSize = ScreenSize {
        width: 800.0,
        height: 600.0,
    };

    fn touch(id: u64, phase: TouchPhase, x: f32, y: f32) -> UiEvent {
        UiEvent::Touch(TouchEvent {
            id: PointerId(id),
            phase,
            x,
            y,
        })
    }

    fn key_point(f: &AndroidFrontend) -> (f32, f32) {
        let k = f
            .engine()
            .state()
            .keys()
            .iter()
            .find(|k| k.center.x > 50.0 && k.center.x < 400.0 && k.center.y > 350.0 && k.center.y < 550.0)
            .unwrap();
        (k.center.x, k.center.y)
    }

    #[test]
    fn android_frontend_queues_play_and_stop() {
        let mut f = AndroidFrontend::new(SCREEN, 1.0, true);
        assert_eq!(f.drain_audio_commands(), vec![AudioCommand::Init]);

        let (x, y) = key_point(&f);
        f.handle(touch(7, TouchPhase::Down, x, y));
        f.handle(touch(7, TouchPhase::Up, x, y));

        let cmds = f.drain_audio_commands();
        assert_eq!(cmds.len(), 2);
        let (AudioCommand::Play(a), AudioCommand::Stop(b)) = (cmds[0], cmds[1]) else {
            panic!("expected play then stop, got {cmds:?}");
        };
        assert_eq!(a, b);
        assert!(f.drain_audio_commands().is_empty());
    }

    #[test]
    fn losing_focus_queues_one_stop_all() {
        let mut f = AndroidFrontend::new(SCREEN, 1.0, true);
        let (x, y) = key_point(&f);
        f.handle(touch(1, TouchPhase::Down, x, y));
        f.drain_audio_commands();

        f.handle(UiEvent::Focus(false));
        assert_eq!(f.drain_encoded_audio_commands(), vec![AudioCommand::OP_STOP_ALL, 0]);
    }

    #[test]
    fn missing_native_library_stays_silent() {
        let mut f = AndroidFrontend::new(SCREEN, 1.0, false);
        let (x, y) = key_point(&f);
        let fx = f.handle(touch(1, TouchPhase::Down, x, y));
        assert!(fx.contains(Effects::Haptic));
        assert!(f.drain_audio_commands().is_empty());
        assert!(!f.engine().voices().status().is_ready());
    }

    #[test]
    fn touches_on_the_settings_panel_queue_no_audio() {
        use crate::settings_panel::{SettingsPanel, SettingsRow};

        let mut f = AndroidFrontend::new(SCREEN, 1.0, true);
        f.drain_audio_commands();
        f.handle(UiEvent::Button(crate::input_map::UiButton::Settings));

        let panel = SettingsPanel::layout(SCREEN);
        let (_, lock) = panel.rows[2];
        let (x, y) = (lock.left + 20.0, (lock.top + lock.bottom) / 2.0);
        assert_eq!(panel.row_at(crate::layout::Point::new(x, y)), Some(SettingsRow::ScrollLock));

        let fx = f.handle(touch(3, TouchPhase::Down, x, y));
        assert!(!fx.contains(Effects::Haptic));
        f.handle(touch(3, TouchPhase::Up, x, y));
        assert!(f.engine().state().scroll_locked);
        assert!(f.drain_audio_commands().is_empty());
    }

    #[test]
    fn audio_command_encoding_is_stable() {
        assert_eq!(AudioCommand::Play(MidiNote(60)).encode(), [2, 60]);
        assert_eq!(AudioCommand::decode([3, 61]), Some(AudioCommand::Stop(MidiNote(61))));
        assert_eq!(AudioCommand::decode([2, 200]), None);
        assert_eq!(AudioCommand::decode([9, 0]), None);
    }

    #[test]
    fn motion_event_actions() {
        assert_eq!(touch_phase_from_android(0), Some(TouchPhase::Down));
        // ACTION_POINTER_DOWN for pointer index 1.
        assert_eq!(touch_phase_from_android(0x0105), Some(TouchPhase::Down));
        assert_eq!(touch_phase_from_android(6), Some(TouchPhase::Up));
        assert_eq!(touch_phase_from_android(3), Some(TouchPhase::Cancel));
        assert_eq!(touch_phase_from_android(7), None);
    }

    #[test]
    fn renders_opaque_pixels() {
        let f = AndroidFrontend::new(SCREEN, 1.0, true);
        let px = f.render_argb(80, 60);
        assert_eq!(px.len(), 80 * 60);
        assert!(px.iter().all(|p| (*p as u32) >> 24 == 0xFF));
    }
}
