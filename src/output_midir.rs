use crate::audio::{AudioBackend, AudioError, GuardedBackend, Result};
use crate::notes::MidiNote;
use crate::output_midi::{self, DEFAULT_VELOCITY};

use midir::{MidiOutput, MidiOutputConnection};

use std::time::Instant;

pub const CLIENT_NAME: &str = "Iso Keys Client";
pub const PORT_NAME: &str = "Iso Keys Output";

/// Sends notes to a MIDI output port. Without a connection every call reports
/// `Unavailable`.
pub struct MidiBackend {
    conn: Option<MidiOutputConnection>,
    pub channel: u8,
    pub program: Option<u8>,
    started: Instant,
}

impl MidiBackend {
    pub fn new(conn: Option<MidiOutputConnection>, channel: u8) -> Self {
        Self {
            conn,
            channel: channel & 0x0F,
            program: None,
            started: Instant::now(),
        }
    }

    /// Virtual port on Unix, otherwise the first hardware port.
    pub fn connect(channel: u8) -> Self {
        match open_output() {
            Ok(conn) => Self::new(Some(conn), channel),
            Err(e) => {
                log::warn!("midi: no output ({e})");
                Self::new(None, channel)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// Without a port the backend is unavailable for the whole session, not
    /// merely uninitialized.
    pub fn into_guarded(self) -> GuardedBackend<Self> {
        if self.is_available() {
            GuardedBackend::new(self)
        } else {
            GuardedBackend::unavailable("no MIDI output port")
        }
    }

    fn send(&mut self, msg: &[u8]) -> Result<()> {
        let Some(c) = self.conn.as_mut() else {
            return Err(AudioError::Unavailable("no MIDI output port".into()));
        };
        c.send(msg)
            .map_err(|e| AudioError::CallFailed(e.to_string()))
    }
}

fn open_output() -> std::result::Result<MidiOutputConnection, String> {
    #[cfg(unix)]
    {
        use midir::os::unix::VirtualOutput;

        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
        match midi_out.create_virtual(PORT_NAME) {
            Ok(conn) => {
                log::info!("midi: created virtual port '{PORT_NAME}'");
                return Ok(conn);
            }
            Err(e) => log::debug!("midi: virtual port failed ({e}), trying hardware ports"),
        }
    }

    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
    let ports = midi_out.ports();
    let port = ports.first().ok_or_else(|| "no MIDI output ports".to_string())?;
    let name = midi_out.port_name(port).unwrap_or_else(|_| "unknown".into());
    let conn = midi_out
        .connect(port, PORT_NAME)
        .map_err(|e| e.to_string())?;
    log::info!("midi: connected to '{name}'");
    Ok(conn)
}

impl AudioBackend for MidiBackend {
    fn init(&mut self) -> Result<()> {
        if !self.is_available() {
            return Err(AudioError::Unavailable("no MIDI output port".into()));
        }
        if let Some(program) = self.program {
            self.send(&output_midi::program_change(self.channel, program))?;
        }
        self.started = Instant::now();
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.conn.is_some() {
            self.stop_all_notes()?;
        }
        if let Some(conn) = self.conn.take() {
            conn.close();
        }
        Ok(())
    }

    fn play_note_polyphonic(&mut self, note: MidiNote) -> Result<()> {
        let ch = self.channel;
        // Off first so a re-struck pitch rearticulates.
        self.send(&output_midi::note_off(ch, note))?;
        self.send(&output_midi::note_on(ch, note, DEFAULT_VELOCITY))
    }

    fn stop_note_polyphonic(&mut self, note: MidiNote) -> Result<()> {
        self.send(&output_midi::note_off(self.channel, note))
    }

    fn stop_all_notes(&mut self) -> Result<()> {
        self.send(&output_midi::all_notes_off(self.channel))
    }

    fn current_time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
