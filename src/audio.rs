//! Boundary to the sound-producing backend.
//!
//! Backends are fallible and may be missing entirely. `GuardedBackend` turns
//! every failure into a logged diagnostic so nothing upstream ever sees one.

use crate::notes::MidiNote;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio backend unavailable: {0}")]
    Unavailable(String),
    #[error("audio backend not initialized")]
    NotInitialized,
    #[error("audio backend call failed: {0}")]
    CallFailed(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// A note sink keyed by pitch.
pub trait AudioBackend {
    fn init(&mut self) -> Result<()>;
    fn shutdown(&mut self) -> Result<()>;

    fn play_note_polyphonic(&mut self, note: MidiNote) -> Result<()>;
    fn stop_note_polyphonic(&mut self, note: MidiNote) -> Result<()>;
    fn stop_all_notes(&mut self) -> Result<()>;

    /// Monotonic seconds since the backend started.
    fn current_time(&self) -> f64;

    /// Legacy monophonic path: one voice at a time.
    fn play_note(&mut self, note: MidiNote) -> Result<()> {
        self.stop_all_notes()?;
        self.play_note_polyphonic(note)
    }

    fn stop_note(&mut self) -> Result<()> {
        self.stop_all_notes()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendStatus {
    /// Permanently missing for this process.
    Unavailable(String),
    /// Present, but `init` has not succeeded yet.
    Uninitialized,
    Ready,
}

impl BackendStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, BackendStatus::Ready)
    }

    pub fn describe(&self) -> String {
        match self {
            BackendStatus::Unavailable(reason) => format!("unavailable: {reason}"),
            BackendStatus::Uninitialized => "not initialized".to_string(),
            BackendStatus::Ready => "ready".to_string(),
        }
    }
}

/// Counters for the debug overlay. Display only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub notes_played: u64,
    pub last_note: Option<MidiNote>,
    pub last_error: Option<String>,
}

enum Slot<B> {
    Missing(String),
    Present { backend: B, initialized: bool },
}

pub struct GuardedBackend<B> {
    slot: Slot<B>,
    diagnostics: Diagnostics,
    warned_unavailable: bool,
}

impl<B: AudioBackend> GuardedBackend<B> {
    pub fn new(backend: B) -> Self {
        Self {
            slot: Slot::Present {
                backend,
                initialized: false,
            },
            diagnostics: Diagnostics::default(),
            warned_unavailable: false,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::error!("audio: backend unavailable: {reason}");
        Self {
            diagnostics: Diagnostics {
                last_error: Some(reason.clone()),
                ..Diagnostics::default()
            },
            slot: Slot::Missing(reason),
            warned_unavailable: true,
        }
    }

    pub fn status(&self) -> BackendStatus {
        match &self.slot {
            Slot::Missing(reason) => BackendStatus::Unavailable(reason.clone()),
            Slot::Present {
                initialized: false, ..
            } => BackendStatus::Uninitialized,
            Slot::Present {
                initialized: true, ..
            } => BackendStatus::Ready,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn backend(&self) -> Option<&B> {
        match &self.slot {
            Slot::Present { backend, .. } => Some(backend),
            Slot::Missing(_) => None,
        }
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        match &mut self.slot {
            Slot::Present { backend, .. } => Some(backend),
            Slot::Missing(_) => None,
        }
    }

    /// Try to bring the backend up. Safe to call again after a failure.
    pub fn initialize(&mut self) -> bool {
        match &mut self.slot {
            Slot::Missing(reason) => {
                log::warn!("audio: cannot initialize, backend unavailable: {reason}");
                false
            }
            Slot::Present {
                initialized: true, ..
            } => true,
            Slot::Present {
                backend,
                initialized,
            } => match backend.init() {
                Ok(()) => {
                    log::info!("audio: initialized");
                    *initialized = true;
                    self.diagnostics.last_error = None;
                    true
                }
                Err(e) => {
                    log::error!("audio: init failed: {e}");
                    self.diagnostics.last_error = Some(e.to_string());
                    false
                }
            },
        }
    }

    pub fn shutdown(&mut self) {
        if let Slot::Present {
            backend,
            initialized,
        } = &mut self.slot
        {
            if !*initialized {
                return;
            }
            *initialized = false;
            if let Err(e) = backend.shutdown() {
                log::error!("audio: shutdown failed: {e}");
                self.diagnostics.last_error = Some(e.to_string());
            } else {
                log::info!("audio: shut down");
            }
        }
    }

    /// Borrow the backend for one call, or explain why it cannot be used.
    fn ready(&mut self) -> Result<&mut B> {
        match &mut self.slot {
            Slot::Missing(reason) => Err(AudioError::Unavailable(reason.clone())),
            Slot::Present {
                initialized: false, ..
            } => Err(AudioError::NotInitialized),
            Slot::Present { backend, .. } => Ok(backend),
        }
    }

    fn record_failure(&mut self, what: &str, e: AudioError) {
        match &e {
            AudioError::Unavailable(_) if self.warned_unavailable => {
                log::debug!("audio: {what} skipped: {e}");
            }
            AudioError::Unavailable(_) => {
                self.warned_unavailable = true;
                log::warn!("audio: {what} skipped: {e}");
            }
            AudioError::NotInitialized => log::warn!("audio: {what} skipped: {e}"),
            AudioError::CallFailed(_) => log::error!("audio: {what} failed: {e}"),
        }
        self.diagnostics.last_error = Some(e.to_string());
    }

    pub fn play(&mut self, note: MidiNote) {
        match self.ready().and_then(|b| b.play_note_polyphonic(note)) {
            Ok(()) => {
                self.diagnostics.notes_played += 1;
                self.diagnostics.last_note = Some(note);
                self.diagnostics.last_error = None;
                log::debug!("audio: play {} ({})", note.0, note.name());
            }
            Err(e) => self.record_failure("play", e),
        }
    }

    pub fn stop(&mut self, note: MidiNote) {
        match self.ready().and_then(|b| b.stop_note_polyphonic(note)) {
            Ok(()) => log::debug!("audio: stop {}", note.0),
            Err(e) => self.record_failure("stop", e),
        }
    }

    pub fn stop_all(&mut self) {
        match self.ready().and_then(|b| b.stop_all_notes()) {
            Ok(()) => log::debug!("audio: stop all"),
            Err(e) => self.record_failure("stop all", e),
        }
    }

    /// Zero when the backend cannot be asked.
    pub fn current_time(&self) -> f64 {
        match &self.slot {
            Slot::Present {
                backend,
                initialized: true,
            } => backend.current_time(),
            _ => 0.0,
        }
    }
}
