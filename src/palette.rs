// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::ColorMode;
use crate::sky::SkyMode;

pub type Rgb = (u8, u8, u8);

const SLATE_950: Rgb = (0x02, 0x06, 0x17);
const SLATE_900: Rgb = (0x0f, 0x17, 0x2a);
const INDIGO_950: Rgb = (0x1e, 0x1b, 0x4b);
const GRAY_950: Rgb = (0x03, 0x07, 0x12);

const VIGNETTE_MID: f32 = 0.45;
const VIGNETTE_EDGE: f32 = 0.65;
const VIGNETTE_KNEE: f32 = 0.7;

pub fn backdrop_stops(mode: SkyMode) -> [Rgb; 3] {
    match mode {
        SkyMode::Snow => [SLATE_950, SLATE_900, INDIGO_950],
        SkyMode::Rain => [SLATE_950, SLATE_900, SLATE_950],
        SkyMode::Cloudy => [SLATE_950, SLATE_900, GRAY_950],
        SkyMode::Partly => [SLATE_950, INDIGO_950, SLATE_950],
        SkyMode::Clear => [SLATE_950, SLATE_900, SLATE_950],
    }
}

/// Backdrop color at height fraction `t` (0 = top, 1 = bottom).
pub fn backdrop_at(mode: SkyMode, t: f32) -> Rgb {
    let [top, mid, bottom] = backdrop_stops(mode);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    if t <= 0.5 {
        lerp_rgb(top, mid, t * 2.0)
    } else {
        lerp_rgb(mid, bottom, (t - 0.5) * 2.0)
    }
}

/// Black overlay opacity at a point given relative to the centre, with the
/// viewport edges at ±1 on each axis.
pub fn vignette_alpha(nx: f32, ny: f32) -> f32 {
    let d = (nx.hypot(ny) / std::f32::consts::SQRT_2).clamp(0.0, 1.0);
    if d <= VIGNETTE_KNEE {
        VIGNETTE_MID * (d / VIGNETTE_KNEE)
    } else {
        VIGNETTE_MID + (VIGNETTE_EDGE - VIGNETTE_MID) * ((d - VIGNETTE_KNEE) / (1.0 - VIGNETTE_KNEE))
    }
}

pub fn accent(mode: SkyMode) -> Rgb {
    match mode {
        SkyMode::Snow => (224, 231, 255),
        SkyMode::Rain => (170, 210, 255),
        SkyMode::Cloudy => (203, 213, 225),
        SkyMode::Partly => (199, 210, 254),
        SkyMode::Clear => (255, 230, 160),
    }
}

pub fn quantize(rgb: Rgb, mode: ColorMode) -> Option<Color> {
    let (r, g, b) = rgb;
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
        ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
    }
}

pub fn lerp_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    (lerp_u8(a.0, b.0, t), lerp_u8(a.1, b.1, t), lerp_u8(a.2, b.2, t))
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn dist2(a: Rgb, b: Rgb) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let step = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (step(r), step(g), step(b));
    let cube = (
        LEVELS[r6 as usize],
        LEVELS[g6 as usize],
        LEVELS[b6 as usize],
    );
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    // Dark skies sit mostly on the grayscale ramp, which is finer than the cube.
    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = match avg {
        0..=7 => (16, (0, 0, 0)),
        239..=255 => (231, (255, 255, 255)),
        _ => {
            let i = (avg - 8) / 10;
            let v = 8 + 10 * i;
            (232 + i, (v, v, v))
        }
    };

    if dist2((r, g, b), gray) < dist2((r, g, b), cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, Rgb); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, c)| dist2((r, g, b), *c))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}
