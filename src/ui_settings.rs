use crate::audio::AudioBackend;
use crate::engine::Engine;
use crate::layout::Skin;
use crate::notes::LabelMode;

use std::time::Instant;

/// User preferences that outlive a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiSettings {
    pub skin: Skin,
    pub label_mode: LabelMode,
    pub scroll_locked: bool,
    pub show_debug: bool,

    // MIDI output (desktop). Channel is 0-based on the wire.
    pub midi_channel: u8,
    pub midi_program: Option<u8>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            skin: Skin::Hex,
            label_mode: LabelMode::NoteName,
            scroll_locked: false,
            show_debug: false,
            midi_channel: 0,
            midi_program: None,
        }
    }
}

impl UiSettings {
    /// Push the persisted view preferences into a fresh engine.
    pub fn apply_to<B: AudioBackend>(&self, engine: &mut Engine<B>, now: Instant) {
        engine.set_skin(self.skin, now);
        engine.set_label_mode(self.label_mode);
        engine.set_scroll_lock(self.scroll_locked);
        engine.set_debug(self.show_debug);
    }

    /// These settings updated with whatever the user changed in `engine`.
    pub fn capture<B: AudioBackend>(&self, engine: &Engine<B>) -> Self {
        let state = engine.state();
        Self {
            skin: state.skin(),
            label_mode: state.label_mode,
            scroll_locked: state.scroll_locked,
            show_debug: engine.show_debug(),
            ..*self
        }
    }
}

#[cfg(feature = "desktop")]
fn encode_settings(s: &UiSettings) -> String {
    let program = s
        .midi_program
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".to_string());

    format!(
        "skin={}\nlabel_mode={}\nscroll_locked={}\nshow_debug={}\nmidi_channel={}\nmidi_program={}\n",
        s.skin.as_str(),
        s.label_mode.as_str(),
        s.scroll_locked,
        s.show_debug,
        s.midi_channel,
        program
    )
}

#[cfg(feature = "desktop")]
fn decode_settings(input: &str) -> UiSettings {
    let mut s = UiSettings::default();

    for line in input.lines() {
        let Some((k, v)) = line.split_once('=') else { continue };
        let v = v.trim();
        match k.trim() {
            "skin" => {
                if let Some(skin) = Skin::parse(v) {
                    s.skin = skin;
                }
            }
            "label_mode" => {
                if let Some(mode) = LabelMode::parse(v) {
                    s.label_mode = mode;
                }
            }
            "scroll_locked" => s.scroll_locked = v == "true",
            "show_debug" => s.show_debug = v == "true",
            "midi_channel" => {
                if let Ok(ch) = v.parse::<u8>() {
                    s.midi_channel = ch.min(15);
                }
            }
            "midi_program" => s.midi_program = v.parse::<u8>().ok().map(|p| p.min(127)),
            _ => {}
        }
    }

    s
}

#[cfg(feature = "desktop")]
fn desktop_settings_path() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;

    #[cfg(windows)]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("iso-keys").join("settings.txt"));
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("iso-keys").join("settings.txt"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("iso-keys").join("settings.txt"));
    }

    None
}

#[cfg(feature = "desktop")]
pub fn load_desktop_settings() -> UiSettings {
    use std::fs;

    let Some(path) = desktop_settings_path() else {
        return UiSettings::default();
    };

    match fs::read_to_string(&path) {
        Ok(s) => decode_settings(&s),
        Err(e) => {
            log::debug!("settings: {} not read ({e}), using defaults", path.display());
            UiSettings::default()
        }
    }
}

#[cfg(feature = "desktop")]
pub fn save_desktop_settings(s: &UiSettings) {
    use std::fs;

    let Some(path) = desktop_settings_path() else {
        return;
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    if let Err(e) = fs::write(&path, encode_settings(s)) {
        log::warn!("settings: failed to write {}: {e}", path.display());
    }
}
