//! Geometry of the settings panel. The engine hit-tests it and `render` draws it.

use crate::input_map::UiButton;
use crate::layout::{Point, Rect, ScreenSize};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SettingsRow {
    Skin,
    Labels,
    ScrollLock,
    Debug,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 4] = [
        SettingsRow::Skin,
        SettingsRow::Labels,
        SettingsRow::ScrollLock,
        SettingsRow::Debug,
    ];

    pub fn button(self) -> UiButton {
        match self {
            SettingsRow::Skin => UiButton::Skin,
            SettingsRow::Labels => UiButton::Labels,
            SettingsRow::ScrollLock => UiButton::ScrollLock,
            SettingsRow::Debug => UiButton::Debug,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsRow::Skin => "SKIN",
            SettingsRow::Labels => "LABELS",
            SettingsRow::ScrollLock => "LOCK",
            SettingsRow::Debug => "DEBUG",
        }
    }
}

const PANEL_MARGIN: f32 = 12.0;
const PANEL_WIDTH: f32 = 240.0;
const PANEL_ROW_H: f32 = 32.0;

/// Settings panel at the top-left, clear of the overlay corner.
/// Narrower than `PANEL_WIDTH` only when the screen is.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingsPanel {
    pub frame: Rect,
    pub rows: Vec<(SettingsRow, Rect)>,
}

impl SettingsPanel {
    pub fn layout(screen: ScreenSize) -> Self {
        let width = PANEL_WIDTH.min(screen.width - 2.0 * PANEL_MARGIN).max(0.0);
        let left = PANEL_MARGIN;
        let right = left + width;
        // First row slot is the title.
        let rows = SettingsRow::ALL
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let top = PANEL_MARGIN + (i as f32 + 1.0) * PANEL_ROW_H;
                (
                    *row,
                    Rect {
                        left,
                        top,
                        right,
                        bottom: top + PANEL_ROW_H,
                    },
                )
            })
            .collect::<Vec<_>>();
        let frame = Rect {
            left,
            top: PANEL_MARGIN,
            right,
            bottom: PANEL_MARGIN + (rows.len() as f32 + 1.0) * PANEL_ROW_H,
        };
        Self { frame, rows }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.frame.contains(p)
    }

    pub fn row_at(&self, p: Point) -> Option<SettingsRow> {
        self.rows
            .iter()
            .find(|(_, r)| r.contains(p))
            .map(|(row, _)| *row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenSize = ScreenSize {
        width: 400.0,
        height: 300.0,
    };

    #[test]
    fn settings_rows_map_to_buttons() {
        let panel = SettingsPanel::layout(SCREEN);
        assert_eq!(panel.rows.len(), 4);
        let (_, lock) = panel.rows[2];
        let inside = Point::new(lock.left + 5.0, lock.top + 5.0);
        assert_eq!(panel.row_at(inside), Some(SettingsRow::ScrollLock));
        assert_eq!(SettingsRow::ScrollLock.button(), UiButton::ScrollLock);

        // The title strip belongs to the panel but is not a row.
        let title = Point::new(panel.frame.left + 5.0, panel.frame.top + 5.0);
        assert!(panel.contains(title));
        assert_eq!(panel.row_at(title), None);
    }

    #[test]
    fn narrow_screens_shrink_the_panel() {
        let wide = SettingsPanel::layout(SCREEN);
        assert_eq!(wide.frame.right - wide.frame.left, 240.0);

        let narrow = SettingsPanel::layout(ScreenSize {
            width: 200.0,
            height: 300.0,
        });
        assert_eq!(narrow.frame.left, 12.0);
        assert_eq!(narrow.frame.right, 188.0);
        assert!(narrow.rows.iter().all(|(_, r)| r.right == 188.0));
        assert!(!narrow.contains(Point::new(195.0, 20.0)));

        let tiny = SettingsPanel::layout(ScreenSize {
            width: 10.0,
            height: 10.0,
        });
        assert_eq!(tiny.frame.right, tiny.frame.left);
        assert_eq!(tiny.row_at(Point::new(12.0, 50.0)), None);
    }
}
