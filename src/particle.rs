// Copyright (c) 2026 rezky_nightky

/// Parallax depth bucket. Far particles are slow and faint, near ones fast and bold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Far,
    Mid,
    Near,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Far, Layer::Mid, Layer::Near];

    /// Round-robin assignment over generation order.
    pub fn for_index(i: usize) -> Self {
        Self::ALL[i % 3]
    }

    #[cfg(test)]
    pub fn index(self) -> usize {
        match self {
            Layer::Far => 0,
            Layer::Mid => 1,
            Layer::Near => 2,
        }
    }

    pub fn base_alpha(self) -> f32 {
        match self {
            Layer::Far => 0.35,
            Layer::Mid => 0.55,
            Layer::Near => 0.80,
        }
    }

    pub fn pick<T: Copy>(self, far: T, mid: T, near: T) -> T {
        match self {
            Layer::Far => far,
            Layer::Mid => mid,
            Layer::Near => near,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Snow,
    Rain,
    Sun,
    Cloud,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snowflake {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub vy: f32,
    pub vx: f32,
    pub wobble_phase: f32,
    pub wobble_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Raindrop {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub vy: f32,
    pub vx: f32,
    pub thickness: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunGlint {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub pulse_phase: f32,
    pub pulse_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudPuff {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub blur_radius: f32,
    pub seed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Body {
    Snow(Snowflake),
    Rain(Raindrop),
    Sun(SunGlint),
    Cloud(CloudPuff),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub layer: Layer,
    pub alpha: f32,
    pub body: Body,
}

impl Particle {
    pub fn kind(&self) -> ParticleKind {
        match self.body {
            Body::Snow(_) => ParticleKind::Snow,
            Body::Rain(_) => ParticleKind::Rain,
            Body::Sun(_) => ParticleKind::Sun,
            Body::Cloud(_) => ParticleKind::Cloud,
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> (f32, f32) {
        match self.body {
            Body::Snow(s) => (s.x, s.y),
            Body::Rain(r) => (r.x, r.y),
            Body::Sun(s) => (s.x, s.y),
            Body::Cloud(c) => (c.x, c.y),
        }
    }
}
