//! Cell geometry for the two isomorphic tessellations.
//!
//! Both skins share one contract: cell -> pitch, cell -> screen centre, and
//! screen point -> key. Row growth maps to decreasing screen y, so a higher row
//! is a higher pitch and sits visually higher.

use crate::notes::MidiNote;

pub const SQRT_3: f32 = 1.732_050_8;

/// Column pitch in cell sizes. Shared by both skins so they line up visually.
pub const HORIZONTAL_SPACING_FACTOR: f32 = SQRT_3;
pub const VERTICAL_SPACING_FACTOR: f32 = 1.5;

/// Hex touches further than this (in cell sizes) from the nearest centre fall in
/// the rounded-corner dead zone and are rejected.
pub const HEX_HIT_RADIUS_FACTOR: f32 = 0.85;

/// Pitch at cell (0, 0): C3.
pub const BASE_NOTE: i64 = 48;

/// Roughly this many columns fit across the screen.
pub const VISIBLE_COLUMNS: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn from_center(center: Point, half_w: f32, half_h: f32) -> Self {
        Self {
            left: center.x - half_w,
            top: center.y - half_h,
            right: center.x + half_w,
            bottom: center.y + half_h,
        }
    }

    /// Half-open containment: a shared edge belongs to exactly one rect.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Strict overlap; rects that only touch do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }
}

/// Scroll position of the grid, in pixels. Subtracted from cell positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffset {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CellId {
    pub row: i32,
    pub col: i32,
}

impl CellId {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// A materialised grid cell. Regenerated on every viewport recompute; only
/// `cell` identifies it across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    pub cell: CellId,
    pub pitch: MidiNote,
    pub name: String,
    pub center: Point,
    pub is_accidental: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellMetrics {
    /// Hexagon circumradius; the rect skin derives its key size from it too.
    pub cell_size: f32,
}

impl CellMetrics {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
        }
    }

    pub fn for_screen_width(width: f32) -> Self {
        Self::new(width / (VISIBLE_COLUMNS * SQRT_3))
    }

    pub fn horizontal_spacing(&self) -> f32 {
        self.cell_size * HORIZONTAL_SPACING_FACTOR
    }

    pub fn vertical_spacing(&self) -> f32 {
        self.cell_size * VERTICAL_SPACING_FACTOR
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Skin {
    /// Wicki-Hayden style: +7 per row (with an octave correction every two
    /// rows), +2 per column, staggered rows.
    Hex,
    /// Chromatic fourths: +5 per row, +1 per column, plain grid.
    Rect,
}

impl Skin {
    pub fn toggle(self) -> Self {
        match self {
            Skin::Hex => Skin::Rect,
            Skin::Rect => Skin::Hex,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Skin::Hex => 0,
            Skin::Rect => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Skin::Hex => "hex",
            Skin::Rect => "rect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hex" => Some(Skin::Hex),
            "rect" => Some(Skin::Rect),
            _ => None,
        }
    }

    pub fn pitch_for_cell(self, cell: CellId) -> MidiNote {
        // Widened so extreme cells cannot overflow before the wrap.
        let (row, col) = (cell.row as i64, cell.col as i64);
        let raw = match self {
            Skin::Hex => BASE_NOTE + row * 7 - row.div_euclid(2) * 2 + col * 2,
            Skin::Rect => BASE_NOTE + row * 5 + col,
        };
        MidiNote::wrapping(raw)
    }

    /// Horizontal offset of a row. Hex shifts even rows right by half a column.
    pub fn row_offset(self, row: i32, metrics: CellMetrics) -> f32 {
        match self {
            Skin::Hex if row.rem_euclid(2) == 0 => metrics.horizontal_spacing() / 2.0,
            _ => 0.0,
        }
    }

    pub fn center_for_cell(self, cell: CellId, metrics: CellMetrics, scroll: ScrollOffset) -> Point {
        let x = cell.col as f32 * metrics.horizontal_spacing() + self.row_offset(cell.row, metrics)
            - scroll.x;
        let y = -(cell.row as f32) * metrics.vertical_spacing() - scroll.y;
        Point::new(x, y)
    }

    /// Half extents of the drawn footprint around a cell centre.
    ///
    /// Rect keys tile without gaps. Hex keys use the bounding box of a
    /// pointy-top hexagon of circumradius `cell_size`.
    pub fn half_extents(self, metrics: CellMetrics) -> (f32, f32) {
        let half_w = metrics.horizontal_spacing() / 2.0;
        match self {
            Skin::Hex => (half_w, metrics.cell_size),
            Skin::Rect => (half_w, metrics.vertical_spacing() / 2.0),
        }
    }

    pub fn footprint(self, center: Point, metrics: CellMetrics) -> Rect {
        let (hw, hh) = self.half_extents(metrics);
        Rect::from_center(center, hw, hh)
    }

    pub fn key_for_cell(self, cell: CellId, metrics: CellMetrics, scroll: ScrollOffset) -> Key {
        let pitch = self.pitch_for_cell(cell);
        Key {
            cell,
            pitch,
            name: pitch.name(),
            center: self.center_for_cell(cell, metrics, scroll),
            is_accidental: pitch.is_accidental(),
        }
    }

    /// Find the key under `touch` among the currently materialised keys.
    pub fn nearest_key<'a>(self, touch: Point, keys: &'a [Key], metrics: CellMetrics) -> Option<&'a Key> {
        match self {
            Skin::Rect => keys
                .iter()
                .find(|k| self.footprint(k.center, metrics).contains(touch)),
            Skin::Hex => {
                let nearest = keys.iter().min_by(|a, b| {
                    touch
                        .distance_sq(a.center)
                        .total_cmp(&touch.distance_sq(b.center))
                })?;
                let limit = metrics.cell_size * HEX_HIT_RADIUS_FACTOR;
                (touch.distance(nearest.center) < limit).then_some(nearest)
            }
        }
    }
}
