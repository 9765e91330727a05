//! winit input -> `UiEvent`.

use crate::input_map::{KeyState, UiKey};
use crate::layout::Point;
use crate::touch::{PointerId, TouchEvent, TouchPhase};
use crate::ui_events::UiEvent;

/// The mouse is pointer 0; touchscreen contacts are shifted up by one so the
/// two never collide.
pub const MOUSE_POINTER: PointerId = PointerId(0);

pub fn touch_pointer(winit_id: u64) -> PointerId {
    PointerId(winit_id.wrapping_add(1))
}

fn ui_key_for(key: &winit::keyboard::Key) -> Option<UiKey> {
    use winit::keyboard::Key::{Character, Named};
    use winit::keyboard::NamedKey;

    match key {
        Named(NamedKey::Tab) => Some(UiKey::Tab),
        Named(NamedKey::Escape) => Some(UiKey::Escape),
        Character(s) => {
            let mut chars = s.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(UiKey::Char(c))
        }
        _ => None,
    }
}

/// Auto-repeat is dropped; shortcuts are toggles.
pub fn ui_event_from_winit(event: &winit::event::KeyEvent) -> Option<UiEvent> {
    if event.repeat {
        return None;
    }
    let state = match event.state {
        winit::event::ElementState::Pressed => KeyState::Pressed,
        winit::event::ElementState::Released => KeyState::Released,
    };
    let key = ui_key_for(&event.logical_key)?;
    Some(UiEvent::Key { state, key })
}

pub fn touch_event_from_winit(touch: &winit::event::Touch) -> UiEvent {
    let phase = match touch.phase {
        winit::event::TouchPhase::Started => TouchPhase::Down,
        winit::event::TouchPhase::Moved => TouchPhase::Move,
        winit::event::TouchPhase::Ended => TouchPhase::Up,
        winit::event::TouchPhase::Cancelled => TouchPhase::Cancel,
    };
    UiEvent::Touch(TouchEvent {
        id: touch_pointer(touch.id),
        phase,
        x: touch.location.x as f32,
        y: touch.location.y as f32,
    })
}

/// Turns cursor positions plus left-button state into pointer events.
///
/// winit reports the button without a position, so the last cursor position
/// is remembered.
#[derive(Clone, Debug, Default)]
pub struct MouseTracker {
    pos: Option<Point>,
    down: bool,
}

impl MouseTracker {
    pub fn is_down(&self) -> bool {
        self.down
    }

    fn event(&self, phase: TouchPhase) -> Option<UiEvent> {
        let p = self.pos?;
        Some(UiEvent::Touch(TouchEvent {
            id: MOUSE_POINTER,
            phase,
            x: p.x,
            y: p.y,
        }))
    }

    pub fn moved(&mut self, x: f32, y: f32) -> Option<UiEvent> {
        self.pos = Some(Point::new(x, y));
        if self.down {
            self.event(TouchPhase::Move)
        } else {
            None
        }
    }

    pub fn button(&mut self, pressed: bool) -> Option<UiEvent> {
        if pressed == self.down {
            return None;
        }
        self.down = pressed;
        self.event(if pressed { TouchPhase::Down } else { TouchPhase::Up })
    }

    /// Cursor left the window mid-drag.
    pub fn left(&mut self) -> Option<UiEvent> {
        if !self.down {
            return None;
        }
        self.down = false;
        self.event(TouchPhase::Cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(e: Option<UiEvent>) -> Option<TouchPhase> {
        match e {
            Some(UiEvent::Touch(t)) => Some(t.phase),
            _ => None,
        }
    }

    #[test]
    fn mouse_drag_becomes_pointer_zero() {
        let mut m = MouseTracker::default();
        assert_eq!(m.moved(10.0, 20.0), None);
        let down = m.button(true);
        assert_eq!(
            down,
            Some(UiEvent::Touch(TouchEvent {
                id: MOUSE_POINTER,
                phase: TouchPhase::Down,
                x: 10.0,
                y: 20.0,
            }))
        );
        assert_eq!(phase(m.moved(15.0, 25.0)), Some(TouchPhase::Move));
        assert_eq!(phase(m.button(true)), None);
        assert_eq!(phase(m.button(false)), Some(TouchPhase::Up));
        assert_eq!(m.moved(0.0, 0.0), None);
    }

    #[test]
    fn click_before_any_motion_is_dropped() {
        let mut m = MouseTracker::default();
        assert_eq!(m.button(true), None);
        assert!(m.is_down());
        assert_eq!(phase(m.moved(1.0, 1.0)), Some(TouchPhase::Move));
    }

    #[test]
    fn leaving_mid_drag_cancels() {
        let mut m = MouseTracker::default();
        m.moved(5.0, 5.0);
        m.button(true);
        assert_eq!(phase(m.left()), Some(TouchPhase::Cancel));
        assert_eq!(m.left(), None);
        assert!(!m.is_down());
    }

    #[test]
    fn touch_ids_never_collide_with_the_mouse() {
        assert_ne!(touch_pointer(0), MOUSE_POINTER);
        assert_eq!(touch_pointer(4), PointerId(5));
    }

    #[test]
    fn named_and_character_keys() {
        use winit::keyboard::{Key, NamedKey};
        assert_eq!(ui_key_for(&Key::Named(NamedKey::Tab)), Some(UiKey::Tab));
        assert_eq!(ui_key_for(&Key::Named(NamedKey::Escape)), Some(UiKey::Escape));
        assert_eq!(ui_key_for(&Key::Character("l".into())), Some(UiKey::Char('l')));
        assert_eq!(ui_key_for(&Key::Character("ll".into())), None);
        assert_eq!(ui_key_for(&Key::Named(NamedKey::Control)), None);
    }
}
