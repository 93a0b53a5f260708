// Copyright (c) 2026 rezky_nightky

use std::f32::consts::TAU;

use rand::Rng;

use crate::particle::{Body, CloudPuff, Layer, Particle, Raindrop, Snowflake, SunGlint};
use crate::sky::SkyMode;

/// Uniform sample in `[min, max)`; a degenerate range yields `min`.
pub fn span<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

fn area_count(w: f32, h: f32, per: f32, min: usize, max: usize) -> usize {
    let base = ((w.max(0.0) as f64 * h.max(0.0) as f64) / per as f64).floor() as usize;
    base.clamp(min, max)
}

pub fn population_size(mode: SkyMode, w: f32, h: f32) -> usize {
    match mode {
        SkyMode::Snow => area_count(w, h, 18_000.0, 80, 220),
        SkyMode::Rain => area_count(w, h, 22_000.0, 120, 320),
        SkyMode::Clear => area_count(w, h, 65_000.0, 18, 48),
        SkyMode::Cloudy | SkyMode::Partly => {
            let base = if mode == SkyMode::Cloudy { 10 } else { 6 };
            (base + (w.max(0.0) / 420.0).floor() as usize).clamp(6, 14)
        }
    }
}

pub fn build_particles<R: Rng>(
    mode: SkyMode,
    w: f32,
    h: f32,
    rng: &mut R,
) -> Vec<Particle> {
    let count = population_size(mode, w, h);
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let layer = Layer::for_index(i);
        let p = match mode {
            SkyMode::Snow => snowflake(layer, w, h, rng),
            SkyMode::Rain => raindrop(layer, w, h, rng),
            SkyMode::Clear => sun_glint(layer, w, h, rng),
            SkyMode::Cloudy | SkyMode::Partly => cloud(mode, layer, w, h, rng),
        };
        out.push(p);
    }
    out
}

fn snowflake<R: Rng>(layer: Layer, w: f32, h: f32, rng: &mut R) -> Particle {
    let (r_lo, r_hi) = layer.pick((0.8, 1.6), (1.0, 2.0), (1.2, 2.3));
    let (vy_lo, vy_hi) = layer.pick((18.0, 38.0), (28.0, 55.0), (42.0, 72.0));
    let body = Snowflake {
        x: span(rng, 0.0, w),
        y: span(rng, 0.0, h),
        radius: span(rng, r_lo, r_hi),
        vy: span(rng, vy_lo, vy_hi),
        vx: span(rng, -12.0, 12.0),
        wobble_phase: span(rng, 0.0, TAU),
        wobble_speed: span(rng, 0.6, 1.4),
    };
    Particle {
        layer,
        alpha: layer.base_alpha() * span(rng, 0.55, 0.95),
        body: Body::Snow(body),
    }
}

fn raindrop<R: Rng>(layer: Layer, w: f32, h: f32, rng: &mut R) -> Particle {
    let (len_lo, len_hi) = layer.pick((10.0, 18.0), (12.0, 22.0), (14.0, 26.0));
    let (vy_lo, vy_hi) = layer.pick((520.0, 820.0), (600.0, 900.0), (700.0, 1000.0));
    let (t_lo, t_hi) = layer.pick((0.9, 1.3), (1.0, 1.5), (1.2, 1.8));
    let body = Raindrop {
        x: span(rng, 0.0, w),
        y: span(rng, 0.0, h),
        length: span(rng, len_lo, len_hi),
        vy: span(rng, vy_lo, vy_hi),
        vx: span(rng, -90.0, -40.0),
        thickness: span(rng, t_lo, t_hi),
    };
    Particle {
        layer,
        alpha: layer.base_alpha() * span(rng, 0.25, 0.55),
        body: Body::Rain(body),
    }
}

fn sun_glint<R: Rng>(layer: Layer, w: f32, h: f32, rng: &mut R) -> Particle {
    let (r_lo, r_hi) = layer.pick((14.0, 30.0), (18.0, 40.0), (24.0, 54.0));
    let body = SunGlint {
        x: span(rng, 0.0, w),
        y: span(rng, 0.0, h * 0.65),
        radius: span(rng, r_lo, r_hi),
        pulse_phase: span(rng, 0.0, TAU),
        pulse_speed: span(rng, 0.6, 1.1),
    };
    Particle {
        layer,
        alpha: layer.base_alpha() * span(rng, 0.18, 0.5),
        body: Body::Sun(body),
    }
}

fn cloud<R: Rng>(mode: SkyMode, layer: Layer, w: f32, h: f32, rng: &mut R) -> Particle {
    let (s_lo, s_hi) = layer.pick((0.75, 1.1), (0.9, 1.3), (1.05, 1.5));
    let scale = span(rng, s_lo, s_hi);
    let width = span(rng, 240.0, 420.0) * scale;
    let height = span(rng, 120.0, 220.0) * scale;
    let y = span(rng, h * 0.06, h * 0.42);
    let (vx_lo, vx_hi) = layer.pick((4.0, 10.0), (7.0, 14.0), (10.0, 18.0));
    let vx = span(rng, vx_lo, vx_hi);
    let (a_lo, a_hi) = if mode == SkyMode::Cloudy {
        (0.28, 0.55)
    } else {
        (0.22, 0.45)
    };
    let alpha = layer.base_alpha() * span(rng, a_lo, a_hi);
    let body = CloudPuff {
        x: span(rng, -w * 0.2, w * 1.2),
        y,
        width,
        height,
        vx,
        blur_radius: layer.pick(22.0, 28.0, 34.0),
        seed: rng.random::<f32>(),
    };
    Particle {
        layer,
        alpha,
        body: Body::Cloud(body),
    }
}
