#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiKey {
    Char(char),
    Tab,
    Escape,
}

/// Virtual buttons for frontends without a keyboard (settings screens, menus).
///
/// These intentionally map onto the same commands as keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiButton {
    Skin,
    ScrollLock,
    Labels,
    Debug,
    Settings,
    Back,
}

/// Keyboard-core commands that don't come from touches on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ToggleSkin,
    ToggleScrollLock,
    CycleLabels,
    ToggleDebug,
    ToggleSettings,
    /// Close whatever is on top: settings panel, then overlay menu.
    Dismiss,
}

/// Shortcuts fire on press; releases are ignored.
pub fn command_from_key(state: KeyState, key: UiKey) -> Option<Command> {
    use UiKey::*;

    if state != KeyState::Pressed {
        return None;
    }
    match key {
        Tab => Some(Command::ToggleSkin),
        Escape => Some(Command::Dismiss),
        Char(c) => match c.to_ascii_lowercase() {
            'l' => Some(Command::ToggleScrollLock),
            'n' => Some(Command::CycleLabels),
            'g' => Some(Command::ToggleDebug),
            's' => Some(Command::ToggleSettings),
            _ => None,
        },
    }
}

pub fn command_from_button(button: UiButton) -> Command {
    match button {
        UiButton::Skin => Command::ToggleSkin,
        UiButton::ScrollLock => Command::ToggleScrollLock,
        UiButton::Labels => Command::CycleLabels,
        UiButton::Debug => Command::ToggleDebug,
        UiButton::Settings => Command::ToggleSettings,
        UiButton::Back => Command::Dismiss,
    }
}
