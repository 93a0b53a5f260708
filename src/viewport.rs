// Copyright (c) 2026 rezky_nightky

use tracing::debug;

use crate::engine::EffectsState;
use crate::factory::build_particles;

pub const CELL_WIDTH_PX: f32 = 8.0;
pub const CELL_HEIGHT_PX: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportChange {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl ViewportChange {
    pub fn from_terminal(cols: u16, rows: u16, dpr: f32) -> Self {
        Self {
            width: cols as f32 * CELL_WIDTH_PX,
            height: rows as f32 * CELL_HEIGHT_PX,
            dpr,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
}

impl Viewport {
    pub fn from_change(change: ViewportChange) -> Self {
        let dpr = if change.dpr.is_finite() && change.dpr > 0.0 {
            change.dpr
        } else {
            1.0
        };
        let device = |v: f32| {
            if v.is_finite() && v > 0.0 {
                (v * dpr).floor() as u32
            } else {
                0
            }
        };
        Self {
            width: device(change.width),
            height: device(change.height),
            dpr,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Raster pixels per device pixel when one raster pixel covers half a
    /// terminal cell.
    pub fn half_cell_scale(&self) -> f32 {
        1.0 / (CELL_WIDTH_PX * self.dpr)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            dpr: 1.0,
        }
    }
}

/// Recompute the viewport and rebuild the population in one step.
pub fn apply_resize(state: &mut EffectsState, change: ViewportChange) -> Viewport {
    let vp = Viewport::from_change(change);
    state.viewport = vp;
    let (w, h) = vp.size();
    state.particles = build_particles(state.mode, w, h, &mut state.rng);
    debug!(
        width = vp.width,
        height = vp.height,
        dpr = vp.dpr,
        particles = state.particles.len(),
        "viewport resized"
    );
    vp
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::particle::Layer;
    use crate::sky::SkyMode;

    fn layer_counts(state: &EffectsState) -> [usize; 3] {
        let mut c = [0; 3];
        for p in &state.particles {
            c[p.layer.index()] += 1;
        }
        c
    }

    #[test]
    fn device_size_is_floored_after_scaling() {
        let vp = Viewport::from_change(ViewportChange {
            width: 333.0,
            height: 201.0,
            dpr: 1.5,
        });
        assert_eq!((vp.width, vp.height), (499, 301));
    }

    #[test]
    fn bad_ratio_falls_back_to_one() {
        let vp = Viewport::from_change(ViewportChange {
            width: 100.0,
            height: 50.0,
            dpr: f32::NAN,
        });
        assert_eq!((vp.width, vp.height, vp.dpr), (100, 50, 1.0));
    }

    #[test]
    fn terminal_cells_map_to_nominal_pixels() {
        let c = ViewportChange::from_terminal(80, 24, 2.0);
        let vp = Viewport::from_change(c);
        assert_eq!((vp.width, vp.height), (1280, 768));
        let s = vp.half_cell_scale();
        assert_eq!(((vp.width as f32 * s), (vp.height as f32 * s)), (80.0, 48.0));
    }

    #[test]
    fn identical_resizes_give_identical_distributions() {
        let mut state = EffectsState::new(SkyMode::Snow, StdRng::seed_from_u64(9));
        let change = ViewportChange {
            width: 1280.0,
            height: 720.0,
            dpr: 1.0,
        };
        apply_resize(&mut state, change);
        let first = (state.particles.len(), layer_counts(&state));
        apply_resize(&mut state, change);
        let second = (state.particles.len(), layer_counts(&state));
        assert_eq!(first, second);
        assert!(state.particles.iter().all(|p| p.kind() == SkyMode::Snow.particle_kind()));
        assert_eq!(state.particles[0].layer, Layer::Far);
    }
}
