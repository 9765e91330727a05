/// Minimal 5x7 pixel font and text blitter used by both Android and desktop UIs.
///
/// Letters are drawn uppercase; key labels and panel text don't need more.

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;

pub fn glyph_5x7(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],

        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],

        '#' => [0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b01010],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '=' => [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],

        // Separators
        ' ' => [0; 7],
        _ => [0; 7],
    }
}

/// Width in pixels of `text` at the given scale, without trailing spacing.
pub fn text_width(text: &str, scale_num: i32, scale_den: i32) -> i32 {
    let map = |u: i32| (u * scale_num) / scale_den;
    let n = text.chars().count() as i32;
    if n == 0 {
        return 0;
    }
    n * map(GLYPH_W) + (n - 1) * map(1).max(1)
}

pub fn text_height(scale_num: i32, scale_den: i32) -> i32 {
    (GLYPH_H * scale_num) / scale_den
}

/// Blit `text` into a row-major pixel buffer. Pixels outside `w` x `h` are clipped.
///
/// Generic over the pixel type: softbuffer hands out `u32`, JNI `IntArray`s are `i32`.
pub fn draw_text<P: Copy>(
    pixels: &mut [P],
    w: usize,
    h: usize,
    x_left: i32,
    y_top: i32,
    text: &str,
    color: P,
    scale_num: i32,
    scale_den: i32,
) {
    let map = |u: i32| (u * scale_num) / scale_den;

    let char_w: i32 = map(GLYPH_W);
    let spacing: i32 = map(1).max(1);

    let mut x = x_left;
    for ch in text.chars() {
        let g = glyph_5x7(ch);
        for (row, bits) in g.iter().enumerate() {
            for col in 0..5 {
                if (bits & (1 << (4 - col))) == 0 {
                    continue;
                }

                let x0 = x + map(col as i32);
                let x1 = x + map(col as i32 + 1);
                let y0 = y_top + map(row as i32);
                let y1 = y_top + map(row as i32 + 1);

                for py in y0..y1 {
                    for px in x0..x1 {
                        if px < 0 || py < 0 {
                            continue;
                        }
                        let (px, py) = (px as usize, py as usize);
                        if px >= w || py >= h {
                            continue;
                        }
                        pixels[py * w + px] = color;
                    }
                }
            }
        }
        x += char_w + spacing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_character_has_a_glyph() {
        use crate::notes::{LabelMode, MidiNote};

        for mode in [LabelMode::NoteName, LabelMode::Solfege, LabelMode::Number] {
            for n in 0..128u8 {
                let label = mode.label(MidiNote(n)).unwrap();
                for ch in label.chars() {
                    assert_ne!(glyph_5x7(ch), [0; 7], "missing glyph {ch:?} in {label}");
                }
            }
        }
    }

    #[test]
    fn width_counts_inner_spacing_only() {
        assert_eq!(text_width("", 1, 1), 0);
        assert_eq!(text_width("C", 1, 1), 5);
        assert_eq!(text_width("C#", 1, 1), 11);
        assert_eq!(text_width("C#", 2, 1), 22);
    }

    #[test]
    fn draws_clipped_glyphs() {
        let (w, h) = (8, 8);
        let mut px = vec![0u32; w * h];
        draw_text(&mut px, w, h, 0, 0, "T", 7, 1, 1);
        // Top bar of the T.
        assert!(px[..5].iter().all(|&p| p == 7));
        assert_eq!(px[5], 0);
        // Stem.
        assert_eq!(px[6 * w + 2], 7);

        // Fully off-screen text leaves the buffer alone.
        let mut px = vec![0i32; w * h];
        draw_text(&mut px, w, h, -100, 50, "A", -1, 1, 1);
        assert!(px.iter().all(|&p| p == 0));
    }
}
