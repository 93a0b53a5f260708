// Copyright (c) 2026 rezky_nightky

use tiny_skia::Pixmap;

use crate::cell::{Cell, HALF_BLOCK};
use crate::frame::Frame;
use crate::palette::{backdrop_at, quantize, vignette_alpha, Rgb};
use crate::runtime::ColorMode;
use crate::sky::SkyMode;

// Effect coverage needed to light a half cell in mono.
const MONO_COVERAGE: f32 = 0.2;

// Peak brightness jitter of the static film grain.
const GRAIN: f32 = 0.05;

#[derive(Clone, Copy, Debug)]
pub struct PresentOptions {
    pub color_mode: ColorMode,
    pub vignette: bool,
    pub grain: bool,
}

pub fn compose(frame: &mut Frame, pixmap: &Pixmap, mode: SkyMode, opts: &PresentOptions) {
    let cols = frame.width;
    let rows = frame.height;
    if cols == 0 || rows == 0 {
        return;
    }
    let raster_rows = rows as u32 * 2;

    for cy in 0..rows {
        let top_y = cy as u32 * 2;
        for cx in 0..cols {
            let top = sample(pixmap, cx as u32, top_y);
            let bottom = sample(pixmap, cx as u32, top_y + 1);

            if opts.color_mode == ColorMode::Mono {
                frame.set(cx, cy, mono_cell(top.3, bottom.3));
                continue;
            }

            let shade = |px: (f32, f32, f32, f32), ry: u32| {
                let t = (ry as f32 + 0.5) / raster_rows as f32;
                let mut rgb = over(px, backdrop_at(mode, t));
                if opts.grain {
                    rgb = jitter(rgb, grain_at(cx as u32, ry));
                }
                if opts.vignette {
                    let nx = (cx as f32 + 0.5) / cols as f32 * 2.0 - 1.0;
                    let ny = t * 2.0 - 1.0;
                    rgb = darken(rgb, vignette_alpha(nx, ny));
                }
                rgb
            };
            let top_rgb = shade(top, top_y);
            let bottom_rgb = shade(bottom, top_y + 1);

            let cell = match (
                quantize(top_rgb, opts.color_mode),
                quantize(bottom_rgb, opts.color_mode),
            ) {
                (Some(t), Some(b)) => Cell::half_block(t, b),
                _ => Cell::blank(None),
            };
            frame.set(cx, cy, cell);
        }
    }
}

/// Premultiplied pixel as floats in `0..=1`. Outside the pixmap is empty.
fn sample(pixmap: &Pixmap, x: u32, y: u32) -> (f32, f32, f32, f32) {
    match pixmap.pixel(x, y) {
        Some(p) => (
            p.red() as f32 / 255.0,
            p.green() as f32 / 255.0,
            p.blue() as f32 / 255.0,
            p.alpha() as f32 / 255.0,
        ),
        None => (0.0, 0.0, 0.0, 0.0),
    }
}

fn over(src: (f32, f32, f32, f32), bg: Rgb) -> Rgb {
    let (r, g, b, a) = src;
    let k = 1.0 - a;
    let mix = |s: f32, d: u8| ((s + d as f32 / 255.0 * k) * 255.0).round().clamp(0.0, 255.0) as u8;
    (mix(r, bg.0), mix(g, bg.1), mix(b, bg.2))
}

fn darken(rgb: Rgb, alpha: f32) -> Rgb {
    let k = 1.0 - alpha.clamp(0.0, 1.0);
    let f = |v: u8| (v as f32 * k).round() as u8;
    (f(rgb.0), f(rgb.1), f(rgb.2))
}

/// Fixed noise in `-1..=1` per raster pixel, so the grain holds still.
fn grain_at(x: u32, y: u32) -> f32 {
    let mut h = x.wrapping_mul(0x9e37_79b1) ^ y.wrapping_mul(0x85eb_ca77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2c1b_3c6d);
    h ^= h >> 12;
    (h & 0xffff) as f32 / 32_767.5 - 1.0
}

fn jitter(rgb: Rgb, n: f32) -> Rgb {
    let k = 1.0 + GRAIN * n;
    let f = |v: u8| (v as f32 * k).round().clamp(0.0, 255.0) as u8;
    (f(rgb.0), f(rgb.1), f(rgb.2))
}

fn mono_cell(top: f32, bottom: f32) -> Cell {
    let ch = match (top >= MONO_COVERAGE, bottom >= MONO_COVERAGE) {
        (true, true) => '█',
        (true, false) => HALF_BLOCK,
        (false, true) => '▄',
        (false, false) => ' ',
    };
    Cell::glyph(ch, None, None, false)
}

#[cfg(test)]
mod tests {
    use crossterm::style::Color;
    use tiny_skia::PremultipliedColorU8;

    use super::*;

    fn opts(color_mode: ColorMode, vignette: bool) -> PresentOptions {
        PresentOptions {
            color_mode,
            vignette,
            grain: false,
        }
    }

    fn lit(pixmap: &mut Pixmap, x: u32, y: u32) {
        let w = pixmap.width();
        let px = PremultipliedColorU8::from_rgba(255, 255, 255, 255).unwrap();
        pixmap.pixels_mut()[(y * w + x) as usize] = px;
    }

    fn rgb(c: Rgb) -> Color {
        Color::Rgb {
            r: c.0,
            g: c.1,
            b: c.2,
        }
    }

    #[test]
    fn empty_raster_shows_the_backdrop() {
        let pixmap = Pixmap::new(4, 4).unwrap();
        let mut frame = Frame::new(4, 2);
        compose(&mut frame, &pixmap, SkyMode::Snow, &opts(ColorMode::TrueColor, false));

        let c = frame.get(0, 1).copied().unwrap();
        assert_eq!(c.fg, Some(rgb(backdrop_at(SkyMode::Snow, 2.5 / 4.0))));
        assert_eq!(c.bg, Some(rgb(backdrop_at(SkyMode::Snow, 3.5 / 4.0))));
    }

    #[test]
    fn lit_pixel_lands_in_its_half() {
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        lit(&mut pixmap, 1, 2);
        let mut frame = Frame::new(4, 2);
        compose(&mut frame, &pixmap, SkyMode::Rain, &opts(ColorMode::TrueColor, false));

        let c = frame.get(1, 1).copied().unwrap();
        assert_eq!(c.ch, HALF_BLOCK);
        assert_eq!(c.fg, Some(Color::Rgb { r: 255, g: 255, b: 255 }));
    }

    #[test]
    fn vignette_darkens_corners_more_than_centre() {
        let mut pixmap = Pixmap::new(8, 8).unwrap();
        for (x, y) in [(0, 0), (4, 4)] {
            lit(&mut pixmap, x, y);
        }
        let mut frame = Frame::new(8, 4);
        compose(&mut frame, &pixmap, SkyMode::Clear, &opts(ColorMode::TrueColor, true));

        let level = |c: Cell| match c.fg {
            Some(Color::Rgb { r, .. }) => r,
            _ => 0,
        };
        let corner = level(frame.get(0, 0).copied().unwrap());
        let centre = level(frame.get(4, 2).copied().unwrap());
        assert!(corner < centre, "{} vs {}", corner, centre);
    }

    #[test]
    fn mono_uses_block_glyphs() {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        lit(&mut pixmap, 0, 0);
        lit(&mut pixmap, 0, 1);
        lit(&mut pixmap, 1, 1);
        let mut frame = Frame::new(3, 1);
        compose(&mut frame, &pixmap, SkyMode::Clear, &opts(ColorMode::Mono, true));

        let chars: String = (0..3).filter_map(|x| frame.get(x, 0)).map(|c| c.ch).collect();
        assert_eq!(chars, "█▄ ");
    }

    #[test]
    fn grain_jitters_brightness_within_five_percent() {
        let mut pixmap = Pixmap::new(16, 16).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(128, 128, 128, 255));
        let mut plain = Frame::new(16, 8);
        let mut grainy = Frame::new(16, 8);
        compose(&mut plain, &pixmap, SkyMode::Cloudy, &opts(ColorMode::TrueColor, false));
        let with_grain = PresentOptions {
            grain: true,
            ..opts(ColorMode::TrueColor, false)
        };
        compose(&mut grainy, &pixmap, SkyMode::Cloudy, &with_grain);

        let red = |c: Option<Color>| match c {
            Some(Color::Rgb { r, .. }) => r as f32,
            _ => 0.0,
        };
        let mut changed = 0;
        for y in 0..8 {
            for x in 0..16 {
                let a = red(plain.get(x, y).and_then(|c| c.fg));
                let b = red(grainy.get(x, y).and_then(|c| c.fg));
                assert!((a - b).abs() <= a * GRAIN + 1.0, "{} vs {}", a, b);
                if a != b {
                    changed += 1;
                }
            }
        }
        assert!(changed > 16, "only {} cells moved", changed);

        let mut again = Frame::new(16, 8);
        compose(&mut again, &pixmap, SkyMode::Cloudy, &with_grain);
        assert_eq!(again.get(5, 3).copied(), grainy.get(5, 3).copied());
    }

    #[test]
    fn grain_noise_spans_both_signs() {
        let samples: Vec<f32> = (0..64).flat_map(|y| (0..64).map(move |x| grain_at(x, y))).collect();
        assert!(samples.iter().all(|n| (-1.0..=1.0).contains(n)));
        assert!(samples.iter().any(|n| *n < -0.5));
        assert!(samples.iter().any(|n| *n > 0.5));
    }
}
