/// Number of addressable pitch values. Grid pitches wrap into `0..PITCH_RANGE`.
pub const PITCH_RANGE: i64 = 128;

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MidiNote(pub u8);

impl MidiNote {
    /// Wrap an unbounded grid pitch into `0..128` with a positive modulo.
    pub fn wrapping(raw: i64) -> Self {
        MidiNote(raw.rem_euclid(PITCH_RANGE) as u8)
    }

    pub fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    pub fn is_accidental(self) -> bool {
        matches!(self.pitch_class(), 1 | 3 | 6 | 8 | 10)
    }

    pub fn is_tonic(self) -> bool {
        self.pitch_class() == 0
    }

    /// Display name. Only the tonic carries its octave ("C3"); every other
    /// natural and every accidental is shown bare ("D", "C#").
    pub fn name(self) -> String {
        let base = pitch_class_label(self.pitch_class());
        if self.is_tonic() {
            format!("{base}{}", self.octave())
        } else {
            base.to_string()
        }
    }
}

pub fn pitch_class_label(pc: u8) -> &'static str {
    match pc % 12 {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "D#",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "G#",
        9 => "A",
        10 => "A#",
        11 => "B",
        _ => "?",
    }
}

/// Chromatic movable-do, sharps on the way up.
pub fn solfege_label(pc: u8) -> &'static str {
    match pc % 12 {
        0 => "Do",
        1 => "Di",
        2 => "Re",
        3 => "Ri",
        4 => "Mi",
        5 => "Fa",
        6 => "Fi",
        7 => "Sol",
        8 => "Si",
        9 => "La",
        10 => "Li",
        11 => "Ti",
        _ => "?",
    }
}

/// What gets printed on each key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LabelMode {
    NoteName,
    Solfege,
    Number,
    Hidden,
}

impl LabelMode {
    pub fn label(self, note: MidiNote) -> Option<String> {
        match self {
            LabelMode::NoteName => Some(note.name()),
            LabelMode::Solfege => {
                let base = solfege_label(note.pitch_class());
                if note.is_tonic() {
                    Some(format!("{base}{}", note.octave()))
                } else {
                    Some(base.to_string())
                }
            }
            LabelMode::Number => Some(note.0.to_string()),
            LabelMode::Hidden => None,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            LabelMode::NoteName => LabelMode::Solfege,
            LabelMode::Solfege => LabelMode::Number,
            LabelMode::Number => LabelMode::Hidden,
            LabelMode::Hidden => LabelMode::NoteName,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LabelMode::NoteName => "name",
            LabelMode::Solfege => "solfege",
            LabelMode::Number => "number",
            LabelMode::Hidden => "hidden",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(LabelMode::NoteName),
            "solfege" => Some(LabelMode::Solfege),
            "number" => Some(LabelMode::Number),
            "hidden" => Some(LabelMode::Hidden),
            _ => None,
        }
    }
}
