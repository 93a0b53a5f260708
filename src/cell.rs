// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// Upper half block: foreground paints the top raster pixel, background the
/// bottom one.
pub const HALF_BLOCK: char = '▀';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }

    pub fn half_block(top: Color, bottom: Color) -> Self {
        // Equal halves print as a space; fewer glyphs, same picture.
        if top == bottom {
            return Self::blank(Some(bottom));
        }
        Self {
            ch: HALF_BLOCK,
            fg: Some(top),
            bg: Some(bottom),
            bold: false,
        }
    }

    pub fn glyph(ch: char, fg: Option<Color>, bg: Option<Color>, bold: bool) -> Self {
        Self { ch, fg, bg, bold }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_half_block_collapses_to_blank() {
        let c = Color::Rgb { r: 2, g: 6, b: 23 };
        assert_eq!(Cell::half_block(c, c), Cell::blank(Some(c)));
        let d = Cell::half_block(Color::White, c);
        assert_eq!((d.ch, d.fg, d.bg), (HALF_BLOCK, Some(Color::White), Some(c)));
    }
}
