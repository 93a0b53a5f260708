// Copyright (c) 2026 rezky_nightky

use rand::Rng;

use crate::factory::span;
use crate::particle::{Body, Layer, Particle};

const SNOW_WRAP_MARGIN: f32 = 40.0;
const RAIN_WRAP_MARGIN: f32 = 120.0;

#[derive(Clone, Copy, Debug)]
pub struct StepContext {
    /// Seconds since the previous frame, already clamped.
    pub dt: f32,
    /// Host clock in seconds; drives the sun bob.
    pub t: f32,
    pub width: f32,
    pub height: f32,
}

pub fn step<R: Rng>(p: &mut Particle, ctx: &StepContext, rng: &mut R) {
    let (dt, w, h) = (ctx.dt, ctx.width, ctx.height);
    let layer = p.layer;

    match &mut p.body {
        Body::Snow(s) => {
            s.wobble_phase += dt * s.wobble_speed;
            let sway = s.wobble_phase.sin() * layer.pick(7.0, 10.0, 14.0);
            s.x += (s.vx + sway) * dt;
            s.y += s.vy * dt;

            if s.y - s.radius > h {
                s.y = -s.radius - span(rng, 0.0, h * 0.05);
                s.x = span(rng, 0.0, w);
            }
            s.x = wrap_x(s.x, w, SNOW_WRAP_MARGIN);
        }
        Body::Rain(r) => {
            r.x += r.vx * dt;
            r.y += r.vy * dt;

            if r.y - r.length > h {
                r.y = -r.length - span(rng, 0.0, h * 0.12);
                r.x = span(rng, 0.0, w);
            }
            r.x = wrap_x(r.x, w, RAIN_WRAP_MARGIN);
        }
        Body::Sun(s) => {
            s.x += sun_drift(layer) * dt;
            s.y += (ctx.t * 0.35 + s.pulse_phase).sin() * layer.pick(4.0, 4.0, 6.0) * dt;

            if s.x - s.radius > w {
                s.x = -s.radius - span(rng, 0.0, w * 0.1);
                s.y = span(rng, 0.0, h * 0.55);
            }
        }
        Body::Cloud(c) => {
            c.x += c.vx * dt * cloud_speed_factor(layer);

            if c.x - c.width > w * 1.25 {
                c.x = -c.width - span(rng, 0.0, w * 0.3);
                c.y = span(rng, h * 0.06, h * 0.42);
            }
        }
    }
}

fn wrap_x(x: f32, w: f32, margin: f32) -> f32 {
    if x < -margin {
        w + margin
    } else if x > w + margin {
        -margin
    } else {
        x
    }
}

fn sun_drift(layer: Layer) -> f32 {
    layer.pick(2.0, 4.0, 6.0)
}

fn cloud_speed_factor(layer: Layer) -> f32 {
    layer.pick(0.7, 0.85, 1.0)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::factory::build_particles;
    use crate::particle::{CloudPuff, Raindrop, Snowflake, SunGlint};
    use crate::sky::SkyMode;

    const MAX_DT: f32 = 0.033;

    fn ctx(dt: f32, t: f32) -> StepContext {
        StepContext {
            dt,
            t,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn falling_particles_never_overshoot_more_than_one_frame() {
        let mut rng = StdRng::seed_from_u64(3);
        for mode in [SkyMode::Snow, SkyMode::Rain] {
            let mut parts = build_particles(mode, 800.0, 600.0, &mut rng);
            for frame in 0..2_000 {
                let c = ctx(MAX_DT, frame as f32 * MAX_DT);
                for p in &mut parts {
                    step(p, &c, &mut rng);
                    match p.body {
                        Body::Snow(s) => {
                            assert!(s.y - s.radius <= c.height + s.vy * MAX_DT);
                            assert!(s.x >= -SNOW_WRAP_MARGIN - 1.0);
                            assert!(s.x <= c.width + SNOW_WRAP_MARGIN + 1.0);
                        }
                        Body::Rain(r) => {
                            assert!(r.y - r.length <= c.height + r.vy * MAX_DT);
                            assert!(r.x >= -RAIN_WRAP_MARGIN - 1.0);
                            assert!(r.x <= c.width + RAIN_WRAP_MARGIN + 1.0);
                        }
                        _ => unreachable!(),
                    }
                }
            }
        }
    }

    #[test]
    fn raindrop_recycles_above_the_viewport_keeping_its_shape() {
        let mut rng = StdRng::seed_from_u64(5);
        let drop = Raindrop {
            x: 400.0,
            y: 620.0,
            length: 20.0,
            vy: 900.0,
            vx: -60.0,
            thickness: 1.4,
        };
        let mut p = Particle {
            layer: Layer::Near,
            alpha: 0.3,
            body: Body::Rain(drop),
        };
        step(&mut p, &ctx(0.01, 0.0), &mut rng);
        let Body::Rain(r) = p.body else {
            panic!("kind changed");
        };
        assert!(r.y <= -r.length && r.y >= -r.length - 600.0 * 0.12);
        assert!((0.0..=800.0).contains(&r.x));
        assert_eq!((r.length, r.vy, r.vx, r.thickness), (20.0, 900.0, -60.0, 1.4));
        assert_eq!(p.alpha, 0.3);
        assert_eq!(p.layer, Layer::Near);
    }

    #[test]
    fn snowflake_wraps_horizontally() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = Particle {
            layer: Layer::Far,
            alpha: 0.2,
            body: Body::Snow(Snowflake {
                x: -45.0,
                y: 100.0,
                radius: 1.0,
                vy: 20.0,
                vx: 0.0,
                wobble_phase: 0.0,
                wobble_speed: 0.0,
            }),
        };
        step(&mut p, &ctx(0.001, 0.0), &mut rng);
        let Body::Snow(s) = p.body else {
            panic!("kind changed");
        };
        assert_eq!(s.x, 800.0 + SNOW_WRAP_MARGIN);
    }

    #[test]
    fn sun_glint_re_enters_from_the_left_in_upper_sky() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut p = Particle {
            layer: Layer::Mid,
            alpha: 0.1,
            body: Body::Sun(SunGlint {
                x: 830.0,
                y: 50.0,
                radius: 20.0,
                pulse_phase: 1.0,
                pulse_speed: 0.8,
            }),
        };
        step(&mut p, &ctx(0.02, 3.0), &mut rng);
        let Body::Sun(s) = p.body else {
            panic!("kind changed");
        };
        assert!(s.x <= -20.0 && s.x >= -20.0 - 80.0);
        assert!((0.0..=600.0 * 0.55).contains(&s.y));
        assert_eq!(s.radius, 20.0);
    }

    #[test]
    fn far_clouds_move_slower_than_near_ones() {
        let mut rng = StdRng::seed_from_u64(2);
        let puff = CloudPuff {
            x: 0.0,
            y: 100.0,
            width: 300.0,
            height: 150.0,
            vx: 10.0,
            blur_radius: 22.0,
            seed: 0.5,
        };
        let mut far = Particle {
            layer: Layer::Far,
            alpha: 0.2,
            body: Body::Cloud(puff),
        };
        let mut near = Particle {
            layer: Layer::Near,
            ..far
        };
        step(&mut far, &ctx(0.03, 0.0), &mut rng);
        step(&mut near, &ctx(0.03, 0.0), &mut rng);
        let (fx, _) = far.position();
        let (nx, _) = near.position();
        assert!((fx - 0.21).abs() < 1e-4);
        assert!((nx - 0.3).abs() < 1e-4);
    }

    #[test]
    fn cloud_recycles_left_of_viewport_into_the_sky_band() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut p = Particle {
            layer: Layer::Near,
            alpha: 0.2,
            body: Body::Cloud(CloudPuff {
                x: 800.0 * 1.25 + 301.0,
                y: 100.0,
                width: 300.0,
                height: 150.0,
                vx: 10.0,
                blur_radius: 34.0,
                seed: 0.5,
            }),
        };
        step(&mut p, &ctx(0.01, 0.0), &mut rng);
        let Body::Cloud(c) = p.body else {
            panic!("kind changed");
        };
        assert!(c.x <= -300.0 && c.x >= -300.0 - 240.0);
        assert!((36.0..=252.0).contains(&c.y));
        assert_eq!((c.width, c.height, c.blur_radius), (300.0, 150.0, 34.0));
    }
}
