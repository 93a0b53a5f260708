// Copyright (c) 2026 rezky_nightky

use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

impl ColorMode {
    /// Parse a `--colormode` value. Both bit depths and color counts are
    /// accepted: `0`, `16`, `8`/`256`, `24`/`32`.
    pub fn from_flag(v: u16) -> Option<Self> {
        match v {
            0 => Some(ColorMode::Mono),
            16 => Some(ColorMode::Color16),
            8 | 256 => Some(ColorMode::Color256),
            24 | 32 => Some(ColorMode::TrueColor),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorMode::TrueColor => "24-bit truecolor",
            ColorMode::Color256 => "8-bit (256-color)",
            ColorMode::Color16 => "16-color",
            ColorMode::Mono => "mono",
        }
    }
}

pub fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM").unwrap_or_default();
    let term = env::var("TERM").unwrap_or_default();
    color_mode_from_env(&colorterm, &term)
}

fn color_mode_from_env(colorterm: &str, term: &str) -> ColorMode {
    let colorterm = colorterm.to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }
    let term = term.to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term == "linux" || term == "vt100" || term == "ansi" {
        return ColorMode::Color16;
    }
    ColorMode::Color256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colormode_flag_accepts_bits_and_counts() {
        assert_eq!(ColorMode::from_flag(0), Some(ColorMode::Mono));
        assert_eq!(ColorMode::from_flag(16), Some(ColorMode::Color16));
        assert_eq!(ColorMode::from_flag(8), Some(ColorMode::Color256));
        assert_eq!(ColorMode::from_flag(256), Some(ColorMode::Color256));
        assert_eq!(ColorMode::from_flag(32), Some(ColorMode::TrueColor));
        assert_eq!(ColorMode::from_flag(4), None);
    }

    #[test]
    fn env_detection() {
        assert_eq!(color_mode_from_env("truecolor", ""), ColorMode::TrueColor);
        assert_eq!(color_mode_from_env("", "dumb"), ColorMode::Mono);
        assert_eq!(color_mode_from_env("", "linux"), ColorMode::Color16);
        assert_eq!(color_mode_from_env("", "xterm-256color"), ColorMode::Color256);
        assert_eq!(color_mode_from_env("", ""), ColorMode::Color256);
    }
}
