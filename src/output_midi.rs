use crate::notes::MidiNote;

/// Fixed strike velocity; touches carry no pressure information.
pub const DEFAULT_VELOCITY: u8 = 100;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;

const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

fn status(kind: u8, channel: u8) -> u8 {
    kind | (channel & 0x0F)
}

/// Velocity 0 is sent as a note-off so receivers don't disagree about it.
pub fn note_on(channel: u8, note: MidiNote, velocity: u8) -> [u8; 3] {
    if velocity == 0 {
        return note_off(channel, note);
    }
    [status(NOTE_ON, channel), note.0 & 0x7F, velocity.min(127)]
}

pub fn note_off(channel: u8, note: MidiNote) -> [u8; 3] {
    [status(NOTE_OFF, channel), note.0 & 0x7F, 0]
}

pub fn all_notes_off(channel: u8) -> [u8; 3] {
    [status(CONTROL_CHANGE, channel), CC_ALL_NOTES_OFF, 0]
}

/// Harder than all-notes-off: also cuts sustain and release tails.
pub fn all_sound_off(channel: u8) -> [u8; 3] {
    [status(CONTROL_CHANGE, channel), CC_ALL_SOUND_OFF, 0]
}

pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [status(PROGRAM_CHANGE, channel), program & 0x7F]
}
