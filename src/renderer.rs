// Copyright (c) 2026 rezky_nightky

use crate::particle::{Body, CloudPuff, Layer, Particle, Raindrop, Snowflake, SunGlint};
use crate::sky::SkyMode;
use crate::surface::{
    ColorStop, DrawSurface, LinearGradient, Paint, RadialGradient, Rgba, Shadow, Shape,
    StrokeStyle,
};

const SNOW_FILL: Rgba = Rgba::new(255, 255, 255, 0.95);
const SNOW_GLOW: Rgba = Rgba::new(255, 255, 255, 0.55);
const RAIN_STROKE: Rgba = Rgba::new(170, 210, 255, 0.85);
const RAY_STROKE: Rgba = Rgba::new(255, 235, 190, 0.9);
const CLOUD_SHADOW: Rgba = Rgba::new(255, 255, 255, 0.9);

const SUN_STOPS: [ColorStop; 3] = [
    ColorStop::new(0.0, Rgba::new(255, 255, 255, 0.95)),
    ColorStop::new(0.25, Rgba::new(255, 230, 160, 0.55)),
    ColorStop::new(1.0, Rgba::new(255, 200, 120, 0.0)),
];

const CLOUD_STOPS: [ColorStop; 2] = [
    ColorStop::new(0.0, Rgba::new(255, 255, 255, 0.85)),
    ColorStop::new(1.0, Rgba::new(210, 225, 255, 0.55)),
];

const WASH_STOPS: [ColorStop; 2] = [
    ColorStop::new(0.0, Rgba::new(255, 255, 255, 0.25)),
    ColorStop::new(1.0, Rgba::new(255, 255, 255, 0.0)),
];

/// Lobes of the cloud silhouette: (offset x, offset y, width, height),
/// each relative to the particle's box.
const CLOUD_LOBES: [(f32, f32, f32, f32); 4] = [
    (0.12, 0.55, 0.55, 0.55),
    (0.32, 0.35, 0.62, 0.70),
    (0.56, 0.45, 0.62, 0.60),
    (0.76, 0.60, 0.52, 0.52),
];

// Rain streaks lean by this many seconds of horizontal travel.
const RAIN_SKEW: f32 = 0.02;

pub fn draw_particle<S: DrawSurface + ?Sized>(surface: &mut S, p: &Particle, t: f32) {
    match &p.body {
        Body::Snow(s) => draw_snowflake(surface, s, p.alpha, p.layer),
        Body::Rain(r) => draw_raindrop(surface, r, p.alpha),
        Body::Sun(s) => draw_sun_glint(surface, s, p.alpha, t),
        Body::Cloud(c) => draw_cloud(surface, c, p.alpha),
    }
}

/// Full-viewport glow behind precipitation. Other modes draw nothing.
pub fn draw_ambient_wash<S: DrawSurface + ?Sized>(surface: &mut S, mode: SkyMode, w: f32, h: f32) {
    if !mode.has_ambient_wash() {
        return;
    }
    let alpha = if mode == SkyMode::Rain { 0.08 } else { 0.06 };
    let paint = Paint::Radial(RadialGradient {
        focus: (w * 0.4, h * 0.2),
        center: (w * 0.5, h * 0.5),
        radius: w.max(h) * 0.8,
        stops: &WASH_STOPS,
    });

    surface.save();
    surface.set_alpha(alpha);
    surface.fill(&[Shape::Rect { x: 0.0, y: 0.0, w, h }], &paint);
    surface.restore();
}

fn draw_snowflake<S: DrawSurface + ?Sized>(surface: &mut S, s: &Snowflake, alpha: f32, layer: Layer) {
    surface.save();
    surface.set_alpha(alpha);
    surface.set_shadow(Some(Shadow {
        color: SNOW_GLOW,
        blur: layer.pick(4.0, 6.0, 8.0),
    }));
    surface.fill(
        &[Shape::Circle {
            cx: s.x,
            cy: s.y,
            r: s.radius,
        }],
        &Paint::Solid(SNOW_FILL),
    );
    surface.restore();
}

fn draw_raindrop<S: DrawSurface + ?Sized>(surface: &mut S, r: &Raindrop, alpha: f32) {
    surface.save();
    surface.set_alpha(alpha);
    surface.stroke(
        &[Shape::Line {
            from: (r.x, r.y),
            to: (r.x + r.vx * RAIN_SKEW, r.y + r.length),
        }],
        &Paint::Solid(RAIN_STROKE),
        &StrokeStyle::round(r.thickness),
    );
    surface.restore();
}

pub fn sun_pulse(s: &SunGlint, t: f32) -> f32 {
    ((t * s.pulse_speed + s.pulse_phase).sin() + 1.0) * 0.5
}

fn draw_sun_glint<S: DrawSurface + ?Sized>(surface: &mut S, s: &SunGlint, alpha: f32, t: f32) {
    let pulse = sun_pulse(s, t);
    let a = alpha * (0.35 + 0.65 * pulse);
    let r = s.radius * (0.8 + pulse * 0.6);

    surface.save();
    surface.set_alpha(a);
    let glow = Paint::Radial(RadialGradient {
        focus: (s.x, s.y),
        center: (s.x, s.y),
        radius: r,
        stops: &SUN_STOPS,
    });
    surface.fill(&[Shape::Circle { cx: s.x, cy: s.y, r }], &glow);

    surface.set_alpha(a * 0.6);
    surface.stroke(
        &[
            Shape::Line {
                from: (s.x - r * 1.8, s.y),
                to: (s.x + r * 1.8, s.y),
            },
            Shape::Line {
                from: (s.x, s.y - r * 1.4),
                to: (s.x, s.y + r * 1.4),
            },
        ],
        &Paint::Solid(RAY_STROKE),
        &StrokeStyle::round(1.0),
    );
    surface.restore();
}

pub fn cloud_silhouette(c: &CloudPuff) -> [Shape; 5] {
    let (x, y, w, h) = (c.x, c.y, c.width, c.height);
    let base_y = y + h * 0.72;
    let lobe = |(ox, oy, rw, rh): (f32, f32, f32, f32)| {
        let ew = w * rw;
        let eh = h * rh;
        Shape::Ellipse {
            cx: x + w * ox + ew * 0.35,
            cy: y + h * oy,
            rx: ew * 0.35,
            ry: eh * 0.35,
        }
    };
    [
        Shape::RoundedRect {
            x: x + w * 0.12,
            y: base_y - h * 0.22,
            w: w * 0.78,
            h: h * 0.32,
            radius: h * 0.18,
        },
        lobe(CLOUD_LOBES[0]),
        lobe(CLOUD_LOBES[1]),
        lobe(CLOUD_LOBES[2]),
        lobe(CLOUD_LOBES[3]),
    ]
}

fn draw_cloud<S: DrawSurface + ?Sized>(surface: &mut S, c: &CloudPuff, alpha: f32) {
    surface.save();
    surface.set_alpha(alpha);
    surface.set_shadow(Some(Shadow {
        color: CLOUD_SHADOW,
        blur: c.blur_radius,
    }));
    let paint = Paint::Linear(LinearGradient {
        from: (c.x, c.y),
        to: (c.x + c.width, c.y + c.height),
        stops: &CLOUD_STOPS,
    });
    surface.fill(&cloud_silhouette(c), &paint);
    surface.restore();
}
