use image::{GrayImage, Luma};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
// Rows per em, including a blank row above and below the glyph.
const EM_ROWS: u32 = GLYPH_HEIGHT + 2;
const GAP: u32 = 1;

const MISSING: [u8; 7] = [
    0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111,
];

fn glyph(ch: char) -> [u8; 7] {
    match ch {
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
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '/' => [0, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0],
        ':' => [0, 0b01100, 0b01100, 0, 0b01100, 0b01100, 0],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        ' ' => [0; 7],
        _ => MISSING,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFace {
    block: u32,
}

impl BitmapFace {
    pub fn for_size(font_size: f32) -> Self {
        let block = (font_size / EM_ROWS as f32).round().max(1.0) as u32;
        Self { block }
    }

    pub fn measure(&self, text: &str) -> (u32, u32) {
        let count = text.chars().count() as u32;
        let width = if count == 0 {
            0
        } else {
            (count * (GLYPH_WIDTH + GAP) - GAP) * self.block
        };
        (width, GLYPH_HEIGHT * self.block)
    }

    pub fn rasterize(&self, text: &str, mask: &mut GrayImage, x: i32, y: i32) {
        let block = self.block as i32;
        for (index, ch) in text.chars().enumerate() {
            let origin_x = x + index as i32 * (GLYPH_WIDTH + GAP) as i32 * block;
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let left = origin_x + col as i32 * block;
                    let top = y + row as i32 * block;
                    fill_block(mask, left, top, block);
                }
            }
        }
    }
}

fn fill_block(mask: &mut GrayImage, left: i32, top: i32, size: i32) {
    let (width, height) = (mask.width() as i32, mask.height() as i32);
    for py in top.max(0)..(top + size).min(height) {
        for px in left.max(0)..(left + size).min(width) {
            mask.put_pixel(px as u32, py as u32, Luma([255]));
        }
    }
}
