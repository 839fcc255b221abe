//! "Waiting for stream" placeholder.
//!
//! Rendering is a pure function of its inputs: the same size and the
//! same status lines always produce the same pixels.

use image::{Rgb, RgbImage};

const BACKGROUND: Rgb<u8> = Rgb([12, 20, 38]);
const TITLE: Rgb<u8> = Rgb([233, 196, 106]);
const TEXT: Rgb<u8> = Rgb([241, 250, 238]);

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
/// Horizontal advance and line height at scale 1.
const ADVANCE: u32 = GLYPH_W + 1;
const LINE_H: u32 = GLYPH_H + 3;
const MARGIN: u32 = 4;

/// Supplies the identity text shown while waiting (hostname, network).
pub trait StatusSource: Send {
    fn status_lines(&mut self) -> Vec<String>;
}

/// Fixed status text.
#[derive(Debug, Clone, Default)]
pub struct StaticStatus(pub Vec<String>);

impl StatusSource for StaticStatus {
    fn status_lines(&mut self) -> Vec<String> {
        self.0.clone()
    }
}

/// Render the placeholder: `title` in accent colour, then `lines`,
/// vertically centred, each line horizontally centred.
pub fn render_placeholder(width: u32, height: u32, title: &str, lines: &[String]) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let rows: Vec<(&str, Rgb<u8>)> = std::iter::once((title, TITLE))
        .chain(lines.iter().map(|l| (l.as_str(), TEXT)))
        .filter(|(s, _)| !s.is_empty())
        .collect();
    if rows.is_empty() {
        return img;
    }

    let longest = rows.iter().map(|(s, _)| s.chars().count() as u32).max().unwrap_or(0);
    let scale = (1..=3)
        .rev()
        .find(|&s| {
            longest * ADVANCE * s <= width.saturating_sub(2 * MARGIN)
                && rows.len() as u32 * LINE_H * s <= height.saturating_sub(2 * MARGIN)
        })
        .unwrap_or(1);

    let block_h = rows.len() as u32 * LINE_H * scale;
    let mut y = height.saturating_sub(block_h) / 2;
    for (text, colour) in rows {
        let max_chars = (width.saturating_sub(2 * MARGIN) / (ADVANCE * scale)) as usize;
        let shown: Vec<char> = text.chars().take(max_chars).collect();
        let line_w = shown.len() as u32 * ADVANCE * scale;
        let mut x = width.saturating_sub(line_w) / 2;
        for c in shown {
            draw_glyph(&mut img, x, y, scale, glyph(c), colour);
            x += ADVANCE * scale;
        }
        y += LINE_H * scale;
    }
    img
}

fn draw_glyph(img: &mut RgbImage, x0: u32, y0: u32, scale: u32, rows: [u8; 7], colour: Rgb<u8>) {
    for (gy, bits) in rows.iter().enumerate() {
        for gx in 0..GLYPH_W {
            if bits & (0x10 >> gx) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x0 + gx * scale + dx;
                    let py = y0 + gy as u32 * scale + dy;
                    if px < img.width() && py < img.height() {
                        img.put_pixel(px, py, colour);
                    }
                }
            }
        }
    }
}

/// 5×7 bitmap, one byte per row, bit 4 = leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

// ── Tests ────────────────────────────────────────────────────────
