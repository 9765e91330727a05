//! The pressed-key set and its pairing with backend voices.
//!
//! Every note-on and note-off in the crate goes through `NoteVoiceTracker`.
//! Two cells can wrap to the same pitch, so each pitch carries a count of the
//! pressed cells that map to it: the backend hears `play` when the count
//! leaves zero and `stop` when it returns to zero.

use crate::audio::{AudioBackend, BackendStatus, Diagnostics, GuardedBackend};
use crate::layout::CellId;
use crate::notes::MidiNote;

use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    SkinSwitch,
    LostForeground,
    NavigateAway,
    Shutdown,
}

pub struct NoteVoiceTracker<B> {
    audio: GuardedBackend<B>,
    pressed: BTreeMap<CellId, MidiNote>,
    voices: BTreeMap<MidiNote, usize>,
}

impl<B: AudioBackend> NoteVoiceTracker<B> {
    pub fn new(audio: GuardedBackend<B>) -> Self {
        Self {
            audio,
            pressed: BTreeMap::new(),
            voices: BTreeMap::new(),
        }
    }

    /// Mark `cell` pressed. Returns false if it already was.
    pub fn claim(&mut self, cell: CellId, pitch: MidiNote) -> bool {
        if self.pressed.contains_key(&cell) {
            return false;
        }
        self.pressed.insert(cell, pitch);

        let count = self.voices.entry(pitch).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.audio.play(pitch);
        } else {
            log::debug!("voices: {} already sounding ({count} cells)", pitch.0);
        }
        true
    }

    /// Un-press `cell`, returning the pitch it held.
    pub fn release(&mut self, cell: CellId) -> Option<MidiNote> {
        let pitch = self.pressed.remove(&cell)?;

        let count = self.voices.get(&pitch).copied().unwrap_or(0);
        if count > 1 {
            self.voices.insert(pitch, count - 1);
            log::debug!("voices: {} still held by {} cells", pitch.0, count - 1);
        } else {
            self.voices.remove(&pitch);
            self.audio.stop(pitch);
        }
        Some(pitch)
    }

    /// Forget everything and silence the backend with one call.
    pub fn stop_all(&mut self, reason: StopReason) {
        log::info!(
            "voices: stop all ({reason:?}), {} keys held",
            self.pressed.len()
        );
        self.pressed.clear();
        self.voices.clear();
        self.audio.stop_all();
    }

    pub fn is_pressed(&self, cell: CellId) -> bool {
        self.pressed.contains_key(&cell)
    }

    pub fn is_sounding(&self, pitch: MidiNote) -> bool {
        self.voices.contains_key(&pitch)
    }

    pub fn pressed(&self) -> &BTreeMap<CellId, MidiNote> {
        &self.pressed
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    /// Distinct pitches currently sounding, ascending.
    pub fn sounding(&self) -> impl Iterator<Item = MidiNote> + '_ {
        self.voices.keys().copied()
    }

    pub fn initialize(&mut self) -> bool {
        self.audio.initialize()
    }

    pub fn shutdown(&mut self) {
        self.stop_all(StopReason::Shutdown);
        self.audio.shutdown();
    }

    pub fn status(&self) -> BackendStatus {
        self.audio.status()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.audio.diagnostics()
    }

    pub fn audio(&self) -> &GuardedBackend<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut GuardedBackend<B> {
        &mut self.audio
    }
}
