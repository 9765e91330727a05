//! Windowed materialisation of the unbounded grid.
//!
//! Only cells whose footprint overlaps the screen (grown by one cell on every
//! side, so fast pans don't pop) are turned into `Key`s. The work is bounded by
//! screen area over cell area, regardless of where the grid is scrolled to.

use crate::layout::{CellId, CellMetrics, Key, Rect, ScreenSize, ScrollOffset, Skin};

/// Inclusive row/column bounds. Empty when a min exceeds its max.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellRange {
    pub row_min: i32,
    pub row_max: i32,
    pub col_min: i32,
    pub col_max: i32,
}

impl CellRange {
    pub const EMPTY: CellRange = CellRange {
        row_min: 0,
        row_max: -1,
        col_min: 0,
        col_max: -1,
    };

    pub fn is_empty(&self) -> bool {
        self.row_min > self.row_max || self.col_min > self.col_max
    }

    pub fn rows(&self) -> usize {
        (self.row_max - self.row_min + 1).max(0) as usize
    }

    pub fn cols(&self) -> usize {
        (self.col_max - self.col_min + 1).max(0) as usize
    }

    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn contains(&self, cell: CellId) -> bool {
        (self.row_min..=self.row_max).contains(&cell.row)
            && (self.col_min..=self.col_max).contains(&cell.col)
    }

    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        (self.row_min..=self.row_max)
            .flat_map(move |row| (self.col_min..=self.col_max).map(move |col| CellId::new(row, col)))
    }
}

/// The screen rectangle grown by one cell spacing on each side.
pub fn expanded_bounds(metrics: CellMetrics, screen: ScreenSize) -> Rect {
    let mx = metrics.horizontal_spacing();
    let my = metrics.vertical_spacing();
    Rect {
        left: -mx,
        top: -my,
        right: screen.width + mx,
        bottom: screen.height + my,
    }
}

/// Smallest integer strictly greater than `v`.
fn above(v: f32) -> i32 {
    v.floor() as i32 + 1
}

/// Largest integer strictly less than `v`.
fn below(v: f32) -> i32 {
    v.ceil() as i32 - 1
}

fn row_bounds(skin: Skin, metrics: CellMetrics, bounds: &Rect, scroll: ScrollOffset) -> (i32, i32) {
    let (_, hh) = skin.half_extents(metrics);
    let v = metrics.vertical_spacing();
    // centre_y = -row * v - scroll.y, and rows grow upwards, so the bottom
    // edge bounds the lowest row.
    let lo = -(bounds.bottom + hh + scroll.y) / v;
    let hi = (hh - bounds.top - scroll.y) / v;
    (above(lo), below(hi))
}

fn col_bounds(
    skin: Skin,
    row: i32,
    metrics: CellMetrics,
    bounds: &Rect,
    scroll: ScrollOffset,
) -> (i32, i32) {
    let (hw, _) = skin.half_extents(metrics);
    let h = metrics.horizontal_spacing();
    let offset = skin.row_offset(row, metrics);
    let lo = (bounds.left - hw + scroll.x - offset) / h;
    let hi = (bounds.right + hw + scroll.x - offset) / h;
    (above(lo), below(hi))
}

/// Bounding row/column rectangle of every cell that overlaps the expanded screen.
pub fn visible_range(
    skin: Skin,
    metrics: CellMetrics,
    screen: ScreenSize,
    scroll: ScrollOffset,
) -> CellRange {
    let bounds = expanded_bounds(metrics, screen);
    let (row_min, row_max) = row_bounds(skin, metrics, &bounds, scroll);
    if row_min > row_max {
        return CellRange::EMPTY;
    }

    // Column spans only differ by row parity (hex stagger).
    let mut col_min = i32::MAX;
    let mut col_max = i32::MIN;
    for row in row_min..=row_max.min(row_min + 1) {
        let (lo, hi) = col_bounds(skin, row, metrics, &bounds, scroll);
        col_min = col_min.min(lo);
        col_max = col_max.max(hi);
    }

    CellRange {
        row_min,
        row_max,
        col_min,
        col_max,
    }
}

/// Materialise the visible cells. Each row gets its own column span, so no
/// key lies entirely outside the expanded screen.
pub fn visible_keys(
    skin: Skin,
    metrics: CellMetrics,
    screen: ScreenSize,
    scroll: ScrollOffset,
) -> Vec<Key> {
    let bounds = expanded_bounds(metrics, screen);
    let (row_min, row_max) = row_bounds(skin, metrics, &bounds, scroll);

    let mut keys = Vec::new();
    for row in row_min..=row_max {
        let (col_min, col_max) = col_bounds(skin, row, metrics, &bounds, scroll);
        for col in col_min..=col_max {
            keys.push(skin.key_for_cell(CellId::new(row, col), metrics, scroll));
        }
    }
    keys
}

/// Starting position: base note near the middle, a couple of rows above centre.
pub fn initial_scroll(metrics: CellMetrics, screen: ScreenSize) -> ScrollOffset {
    ScrollOffset {
        x: screen.width / 2.0 - metrics.horizontal_spacing(),
        y: -2.0 * metrics.vertical_spacing() - screen.height / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Point;
    use std::collections::BTreeSet;

    const M: CellMetrics = CellMetrics { cell_size: 30.0 };
    const SCREEN: ScreenSize = ScreenSize {
        width: 640.0,
        height: 480.0,
    };

    fn brute_force(skin: Skin, scroll: ScrollOffset) -> BTreeSet<CellId> {
        let bounds = expanded_bounds(M, SCREEN);
        let mut out = BTreeSet::new();
        let (r0, c0) = ((-scroll.y / M.vertical_spacing()) as i32, (scroll.x / M.horizontal_spacing()) as i32);
        for row in (r0 - 40)..(r0 + 40) {
            for col in (c0 - 40)..(c0 + 40) {
                let cell = CellId::new(row, col);
                let center = skin.center_for_cell(cell, M, scroll);
                if skin.footprint(center, M).overlaps(&bounds) {
                    out.insert(cell);
                }
            }
        }
        out
    }

    #[test]
    fn visible_keys_match_exact_intersection() {
        let scrolls = [
            ScrollOffset { x: 13.7, y: -211.3 },
            ScrollOffset { x: -500.25, y: 333.9 },
            ScrollOffset { x: 2047.1, y: -3071.6 },
        ];
        for skin in [Skin::Hex, Skin::Rect] {
            for scroll in scrolls {
                let got: BTreeSet<CellId> = visible_keys(skin, M, SCREEN, scroll)
                    .iter()
                    .map(|k| k.cell)
                    .collect();
                assert_eq!(got, brute_force(skin, scroll), "{skin:?} {scroll:?}");
            }
        }
    }

    #[test]
    fn visible_range_is_the_tight_bounding_rectangle() {
        for skin in [Skin::Hex, Skin::Rect] {
            let scroll = ScrollOffset { x: 13.7, y: -211.3 };
            let expected = brute_force(skin, scroll);
            let range = visible_range(skin, M, SCREEN, scroll);

            assert!(expected.iter().all(|c| range.contains(*c)));
            assert_eq!(range.row_min, expected.iter().map(|c| c.row).min().unwrap());
            assert_eq!(range.row_max, expected.iter().map(|c| c.row).max().unwrap());
            assert_eq!(range.col_min, expected.iter().map(|c| c.col).min().unwrap());
            assert_eq!(range.col_max, expected.iter().map(|c| c.col).max().unwrap());
        }
    }

    #[test]
    fn rect_range_has_no_wasted_cells() {
        let scroll = ScrollOffset { x: -500.25, y: 333.9 };
        let range = visible_range(Skin::Rect, M, SCREEN, scroll);
        let keys = visible_keys(Skin::Rect, M, SCREEN, scroll);
        assert_eq!(range.len(), keys.len());
        assert_eq!(range.cells().count(), keys.len());
    }

    #[test]
    fn work_does_not_depend_on_scroll_distance() {
        let near = visible_range(Skin::Hex, M, SCREEN, ScrollOffset { x: 13.7, y: -211.3 });
        let far = visible_range(
            Skin::Hex,
            M,
            SCREEN,
            ScrollOffset {
                x: 90_013.7,
                y: -70_211.3,
            },
        );
        assert!(near.rows().abs_diff(far.rows()) <= 1);
        assert!(near.cols().abs_diff(far.cols()) <= 1);
        assert!(far.len() < 400);
    }

    #[test]
    fn keys_carry_pitch_and_centre_from_the_layout() {
        let scroll = initial_scroll(M, SCREEN);
        for k in visible_keys(Skin::Hex, M, SCREEN, scroll) {
            assert_eq!(k.pitch, Skin::Hex.pitch_for_cell(k.cell));
            assert_eq!(k.center, Skin::Hex.center_for_cell(k.cell, M, scroll));
            assert_eq!(k.is_accidental, k.pitch.is_accidental());
        }
    }

    #[test]
    fn initial_scroll_places_rows_above_the_base_row() {
        let scroll = initial_scroll(M, SCREEN);
        assert!((scroll.x - (320.0 - M.horizontal_spacing())).abs() < 1e-3);
        assert!((scroll.y - (-90.0 - 240.0)).abs() < 1e-3);

        // Row 0 sits two rows below the vertical centre.
        let base_row_y = Skin::Rect.center_for_cell(CellId::new(0, 0), M, scroll).y;
        assert!((base_row_y - (240.0 + 2.0 * M.vertical_spacing())).abs() < 1e-3);

        let keys = visible_keys(Skin::Rect, M, SCREEN, scroll);
        let centre = Point::new(SCREEN.width / 2.0, SCREEN.height / 2.0);
        assert!(Skin::Rect.nearest_key(centre, &keys, M).is_some());
    }

    #[test]
    fn degenerate_screen_still_has_margin_cells() {
        let keys = visible_keys(Skin::Rect, M, ScreenSize::default(), ScrollOffset::default());
        assert!(!keys.is_empty());
        assert!(CellRange::EMPTY.is_empty());
        assert_eq!(CellRange::EMPTY.len(), 0);
    }
}
