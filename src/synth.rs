// Copyright (c) 2026 rezky_nightky

// Procedural ambience, so the soundscape needs no audio assets.
#![cfg_attr(not(feature = "sound"), allow(dead_code))]

use std::f32::consts::{PI, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio::Track;

pub const SAMPLE_RATE: u32 = 22_050;

const BIRDS_LEN_S: f32 = 2.4;
const CHIRP_LEN_S: f32 = 0.12;
const CHIRP_STARTS_S: [f32; 3] = [0.2, 0.5, 1.4];
const CHIRP_FROM_HZ: f32 = 2400.0;
const CHIRP_TO_HZ: f32 = 4200.0;

// Chance per sample of a single drop landing close by.
const RAIN_TICK_CHANCE: f32 = 0.0015;

/// Mono sample stream for one track. Loops never end; birds is a short clip.
pub struct Texture {
    track: Track,
    rng: StdRng,
    n: u64,
    len: Option<u64>,
    low: f32,
    brown: f32,
}

impl Texture {
    pub fn new(track: Track, seed: u64) -> Self {
        let len = match track {
            Track::Birds => Some((BIRDS_LEN_S * SAMPLE_RATE as f32) as u64),
            Track::Rain | Track::Snow | Track::Wind => None,
        };
        Self {
            track,
            rng: StdRng::seed_from_u64(seed),
            n: 0,
            len,
            low: 0.0,
            brown: 0.0,
        }
    }

    pub fn len_samples(&self) -> Option<u64> {
        self.len
    }

    fn white(&mut self) -> f32 {
        self.rng.random::<f32>() * 2.0 - 1.0
    }

    fn brown(&mut self) -> f32 {
        let w = self.white();
        self.brown = (self.brown + w * 0.02).clamp(-1.0, 1.0) * 0.998;
        self.brown
    }

    fn lowpass(&mut self, x: f32, k: f32) -> f32 {
        self.low += k * (x - self.low);
        self.low
    }

    fn sample(&mut self) -> f32 {
        let t = self.n as f32 / SAMPLE_RATE as f32;
        let v = match self.track {
            Track::Rain => {
                let hiss = self.white();
                let body = self.lowpass(hiss, 0.35);
                let tick = if self.rng.random::<f32>() < RAIN_TICK_CHANCE {
                    self.white() * 0.8
                } else {
                    0.0
                };
                body * 0.6 + hiss * 0.15 + tick
            }
            Track::Snow => {
                let b = self.brown();
                self.lowpass(b, 0.05) * 1.5
            }
            Track::Wind => {
                let b = self.brown();
                let gust = 0.55 + 0.45 * (TAU * 0.13 * t).sin() * (TAU * 0.031 * t + 1.0).sin();
                b * 2.5 * gust
            }
            Track::Birds => chirps(t),
        };
        v.clamp(-1.0, 1.0)
    }
}

impl Iterator for Texture {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.len.is_some_and(|len| self.n >= len) {
            return None;
        }
        let v = self.sample();
        self.n += 1;
        Some(v)
    }
}

fn chirps(t: f32) -> f32 {
    for start in CHIRP_STARTS_S {
        let u = t - start;
        if (0.0..CHIRP_LEN_S).contains(&u) {
            let env = (PI * u / CHIRP_LEN_S).sin();
            // Linear sweep: phase is the integral of the instantaneous frequency.
            let sweep = (CHIRP_TO_HZ - CHIRP_FROM_HZ) / CHIRP_LEN_S;
            let phase = TAU * (CHIRP_FROM_HZ * u + 0.5 * sweep * u * u);
            return phase.sin() * env * 0.8;
        }
    }
    0.0
}
