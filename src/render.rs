//! Software drawing of the keyboard screen.
//!
//! Everything here draws through the small `Canvas` trait so the same frame
//! code serves the desktop softbuffer window and the Android bitmap.

use crate::audio::AudioBackend;
use crate::engine::Engine;
use crate::layout::{Key, Point, Rect, ScreenSize, Skin, SQRT_3};
use crate::notes::LabelMode;
use crate::overlay::HandleKind;
use crate::pixel_font;
use crate::settings_panel::{SettingsPanel, SettingsRow};

pub const BACKGROUND: u32 = 0x000D0D0F;
const NATURAL_FILL: u32 = 0x002E2E34;
const ACCIDENTAL_FILL: u32 = 0x00101013;
const TONIC_FILL: u32 = 0x00234048;
const HEX_GLOW: u32 = 0x0000ACC1;
const RECT_GLOW: u32 = 0x008E44FF;
const LABEL_NATURAL: u32 = 0x00CCCCCC;
const LABEL_ACCIDENTAL: u32 = 0x00FFFFFF;

const ANCHOR_FILL: u32 = 0x00E8E8EC;
const HANDLE_FILL: u32 = 0x00141418;
const HANDLE_HOVER: u32 = 0x00C65A1A;
const PANEL_FILL: u32 = 0x001A1A1A;
const PANEL_ROW: u32 = 0x002A2A2A;
const TEXT: u32 = 0x00FFFFFF;
const TEXT_DIM: u32 = 0x00B0B0B5;

/// Gap between neighbouring keys, in pixels.
const KEY_GAP: f32 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Pointy-top hexagon of the given circumradius.
    Hexagon { radius: f32 },
    Rect { half_w: f32, half_h: f32 },
    Circle { radius: f32 },
}

impl Shape {
    pub fn half_extents(self) -> (f32, f32) {
        match self {
            Shape::Hexagon { radius } => (radius * SQRT_3 / 2.0, radius),
            Shape::Rect { half_w, half_h } => (half_w, half_h),
            Shape::Circle { radius } => (radius, radius),
        }
    }

    /// Is the offset (`dx`, `dy`) from the shape's centre inside it?
    pub fn contains(self, dx: f32, dy: f32) -> bool {
        let (ax, ay) = (dx.abs(), dy.abs());
        match self {
            Shape::Hexagon { radius } => {
                ax <= radius * SQRT_3 / 2.0 && ay <= radius - ax / SQRT_3
            }
            Shape::Rect { half_w, half_h } => ax <= half_w && ay <= half_h,
            Shape::Circle { radius } => ax * ax + ay * ay <= radius * radius,
        }
    }
}

/// Minimal drawing surface. Colours are `0x00RRGGBB`.
pub trait Canvas {
    fn size(&self) -> ScreenSize;
    fn clear(&mut self, color: u32);
    fn fill_shape(&mut self, center: Point, shape: Shape, color: u32, opacity: f32);
    /// (width, height) of `text` at `scale` pixels per font unit.
    fn measure_text(&self, text: &str, scale: f32) -> (f32, f32);
    fn draw_text(&mut self, top_left: Point, text: &str, color: u32, scale: f32);
}

fn font_scale(scale: f32) -> (i32, i32) {
    (((scale * 5.0).round() as i32).max(1), 5)
}

fn blend(dst: u32, src: u32, a: f32) -> u32 {
    let a = a.clamp(0.0, 1.0);
    let mix = |shift: u32| {
        let d = ((dst >> shift) & 0xFF) as f32;
        let s = ((src >> shift) & 0xFF) as f32;
        ((s * a + d * (1.0 - a)).round() as u32).min(255) << shift
    };
    mix(16) | mix(8) | mix(0)
}

/// `Canvas` over a row-major XRGB `u32` buffer.
pub struct PixelCanvas<'a> {
    pixels: &'a mut [u32],
    width: usize,
    height: usize,
}

impl<'a> PixelCanvas<'a> {
    /// Rows that don't fit in `pixels` are dropped.
    pub fn new(pixels: &'a mut [u32], width: usize, height: usize) -> Self {
        let height = if width == 0 {
            0
        } else {
            height.min(pixels.len() / width)
        };
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }
}

impl Canvas for PixelCanvas<'_> {
    fn size(&self) -> ScreenSize {
        ScreenSize {
            width: self.width as f32,
            height: self.height as f32,
        }
    }

    fn clear(&mut self, color: u32) {
        let len = self.width * self.height;
        self.pixels[..len].fill(color);
    }

    fn fill_shape(&mut self, center: Point, shape: Shape, color: u32, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let (hw, hh) = shape.half_extents();
        let (w, h) = (self.width as f32, self.height as f32);
        let (left, right) = ((center.x - hw).floor().max(0.0), (center.x + hw).ceil().min(w));
        let (top, bottom) = ((center.y - hh).floor().max(0.0), (center.y + hh).ceil().min(h));
        if left >= right || top >= bottom {
            return;
        }

        for py in top as usize..bottom as usize {
            let row = py * self.width;
            let dy = py as f32 + 0.5 - center.y;
            for px in left as usize..right as usize {
                let dx = px as f32 + 0.5 - center.x;
                if !shape.contains(dx, dy) {
                    continue;
                }
                let p = &mut self.pixels[row + px];
                *p = if opacity >= 1.0 {
                    color
                } else {
                    blend(*p, color, opacity)
                };
            }
        }
    }

    fn measure_text(&self, text: &str, scale: f32) -> (f32, f32) {
        let (num, den) = font_scale(scale);
        (
            pixel_font::text_width(text, num, den) as f32,
            pixel_font::text_height(num, den) as f32,
        )
    }

    fn draw_text(&mut self, top_left: Point, text: &str, color: u32, scale: f32) {
        let (num, den) = font_scale(scale);
        pixel_font::draw_text(
            self.pixels,
            self.width,
            self.height,
            top_left.x.round() as i32,
            top_left.y.round() as i32,
            text,
            color,
            num,
            den,
        );
    }
}

fn draw_text_centered(canvas: &mut impl Canvas, center: Point, text: &str, color: u32, scale: f32) {
    let (tw, th) = canvas.measure_text(text, scale);
    canvas.draw_text(
        Point::new(center.x - tw / 2.0, center.y - th / 2.0),
        text,
        color,
        scale,
    );
}

fn rect_center(r: &Rect) -> Point {
    Point::new((r.left + r.right) / 2.0, (r.top + r.bottom) / 2.0)
}

fn fill_rect(canvas: &mut impl Canvas, r: &Rect, color: u32, opacity: f32) {
    canvas.fill_shape(
        rect_center(r),
        Shape::Rect {
            half_w: (r.right - r.left) / 2.0,
            half_h: (r.bottom - r.top) / 2.0,
        },
        color,
        opacity,
    );
}

fn key_shape(skin: Skin, metrics: crate::layout::CellMetrics) -> Shape {
    match skin {
        Skin::Hex => Shape::Hexagon {
            radius: (metrics.cell_size - KEY_GAP).max(1.0),
        },
        Skin::Rect => {
            let (hw, hh) = skin.half_extents(metrics);
            Shape::Rect {
                half_w: (hw - KEY_GAP / 2.0).max(0.5),
                half_h: (hh - KEY_GAP / 2.0).max(0.5),
            }
        }
    }
}

fn key_fill(key: &Key) -> u32 {
    if key.is_accidental {
        ACCIDENTAL_FILL
    } else if key.pitch.is_tonic() {
        TONIC_FILL
    } else {
        NATURAL_FILL
    }
}

/// Draw one full frame of the keyboard screen.
pub fn draw_frame<C: Canvas, B: AudioBackend>(canvas: &mut C, engine: &Engine<B>) {
    canvas.clear(BACKGROUND);

    let state = engine.state();
    let skin = state.skin();
    let metrics = state.metrics();
    let shape = key_shape(skin, metrics);
    let glow_color = match skin {
        Skin::Hex => HEX_GLOW,
        Skin::Rect => RECT_GLOW,
    };

    for key in state.keys() {
        canvas.fill_shape(key.center, shape, key_fill(key), 1.0);
    }
    for key in state.keys() {
        let level = engine.glow_level(key);
        if level > crate::glow::MIN_VISIBLE_LEVEL {
            canvas.fill_shape(key.center, shape, glow_color, level);
        }
    }

    draw_labels(canvas, state.keys(), state.label_mode, metrics.cell_size);
    draw_overlay(canvas, engine);

    if engine.show_settings() {
        draw_settings(canvas, engine);
    }
    if engine.show_debug() {
        draw_debug(canvas, engine);
    }
}

fn draw_labels(canvas: &mut impl Canvas, keys: &[Key], mode: LabelMode, cell_size: f32) {
    if mode == LabelMode::Hidden {
        return;
    }
    let scale = (cell_size * 0.4 / pixel_font::GLYPH_H as f32).clamp(1.0, 4.0);
    for key in keys {
        let Some(text) = mode.label(key.pitch) else { continue };
        let color = if key.is_accidental {
            LABEL_ACCIDENTAL
        } else {
            LABEL_NATURAL
        };
        draw_text_centered(canvas, key.center, &text, color, scale);
    }
}

fn draw_overlay<B: AudioBackend>(canvas: &mut impl Canvas, engine: &Engine<B>) {
    let overlay = engine.overlay();
    let anchor = overlay.anchor();
    let r = overlay.anchor_radius();

    // Crescent: a light disc with a dark disc bitten out of its upper right.
    canvas.fill_shape(anchor, Shape::Circle { radius: r }, ANCHOR_FILL, 0.9);
    canvas.fill_shape(
        Point::new(anchor.x + r * 0.35, anchor.y - r * 0.25),
        Shape::Circle { radius: r * 0.8 },
        BACKGROUND,
        1.0,
    );

    if !overlay.is_open() {
        return;
    }
    let locked = engine.state().scroll_locked;
    for zone in overlay.zones() {
        let hovered = overlay.hovered() == Some(zone.kind);
        let fill = if hovered { HANDLE_HOVER } else { HANDLE_FILL };
        canvas.fill_shape(
            zone.center,
            Shape::Circle {
                radius: zone.radius,
            },
            fill,
            0.9,
        );
        let text_color = if zone.kind == HandleKind::Lock && locked {
            HANDLE_HOVER
        } else {
            TEXT
        };
        let text_color = if hovered { TEXT } else { text_color };
        draw_text_centered(canvas, zone.center, zone.kind.label(), text_color, 2.0);
    }
}

fn settings_value<B: AudioBackend>(row: SettingsRow, engine: &Engine<B>) -> String {
    let state = engine.state();
    let on_off = |b: bool| (if b { "ON" } else { "OFF" }).to_string();
    match row {
        SettingsRow::Skin => state.skin().as_str().to_ascii_uppercase(),
        SettingsRow::Labels => state.label_mode.as_str().to_ascii_uppercase(),
        SettingsRow::ScrollLock => on_off(state.scroll_locked),
        SettingsRow::Debug => on_off(engine.show_debug()),
    }
}

fn draw_settings<B: AudioBackend>(canvas: &mut impl Canvas, engine: &Engine<B>) {
    let panel = SettingsPanel::layout(engine.state().screen());
    fill_rect(canvas, &panel.frame, PANEL_FILL, 0.95);
    canvas.draw_text(
        Point::new(panel.frame.left + 10.0, panel.frame.top + 9.0),
        "SETTINGS",
        TEXT,
        2.0,
    );

    for (i, (row, r)) in panel.rows.iter().enumerate() {
        if i % 2 == 0 {
            fill_rect(canvas, r, PANEL_ROW, 1.0);
        }
        canvas.draw_text(Point::new(r.left + 10.0, r.top + 9.0), row.label(), TEXT_DIM, 2.0);
        let value = settings_value(*row, engine);
        let (tw, _) = canvas.measure_text(&value, 2.0);
        canvas.draw_text(Point::new(r.right - 10.0 - tw, r.top + 9.0), &value, TEXT, 2.0);
    }
}

/// Lines shown by the debug overlay.
pub fn debug_lines<B: AudioBackend>(engine: &Engine<B>) -> Vec<String> {
    let voices = engine.voices();
    let diag = voices.diagnostics();
    let mut lines = vec![
        format!("KEYS: {}", engine.state().keys().len()),
        format!("AUDIO: {}", voices.status().describe()),
        format!("NOTES: {}", diag.notes_played),
        format!(
            "LAST: {}",
            diag.last_note.map_or_else(|| "-".to_string(), |n| n.name())
        ),
    ];
    if let Some(err) = &diag.last_error {
        lines.push(format!("ERR: {err}"));
    }
    let held: Vec<String> = voices.sounding().map(|n| n.name()).collect();
    lines.push(format!("HELD: {}", held.join(" ")));
    lines.into_iter().map(|l| l.to_ascii_uppercase()).collect()
}

fn draw_debug<B: AudioBackend>(canvas: &mut impl Canvas, engine: &Engine<B>) {
    let lines = debug_lines(engine);
    let scale = 2.0;
    let (_, line_h) = canvas.measure_text("X", scale);
    let line_h = line_h + 6.0;
    let width = lines
        .iter()
        .map(|l| canvas.measure_text(l, scale).0)
        .fold(0.0f32, f32::max)
        + 20.0;
    let height = lines.len() as f32 * line_h + 14.0;
    let bottom = canvas.size().height - 12.0;
    let frame = Rect {
        left: 12.0,
        top: bottom - height,
        right: 12.0 + width,
        bottom,
    };
    fill_rect(canvas, &frame, 0x00000000, 0.75);
    for (i, line) in lines.iter().enumerate() {
        canvas.draw_text(
            Point::new(frame.left + 10.0, frame.top + 10.0 + i as f32 * line_h),
            line,
            TEXT,
            scale,
        );
    }
}
