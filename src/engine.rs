// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::factory::build_particles;
use crate::particle::Particle;
use crate::physics::{step, StepContext};
use crate::renderer::{draw_ambient_wash, draw_particle};
use crate::scheduler::{FrameHost, TaskToken};
use crate::sky::SkyMode;
use crate::surface::DrawSurface;
use crate::viewport::{apply_resize, Viewport, ViewportChange};

const MIN_DT: f32 = 0.001;
const MAX_DT: f32 = 0.033;

/// Everything the loop mutates between frames.
pub struct EffectsState {
    pub mode: SkyMode,
    pub particles: Vec<Particle>,
    pub viewport: Viewport,
    pub last_frame: Option<Duration>,
    pub rng: StdRng,
}

impl EffectsState {
    pub fn new(mode: SkyMode, rng: StdRng) -> Self {
        Self {
            mode,
            particles: Vec::new(),
            viewport: Viewport::default(),
            last_frame: None,
            rng,
        }
    }

    pub fn rebuild(&mut self) {
        let (w, h) = self.viewport.size();
        self.particles = build_particles(self.mode, w, h, &mut self.rng);
    }

    pub fn population_mismatch(&self) -> bool {
        let want = self.mode.particle_kind();
        self.particles.iter().any(|p| p.kind() != want)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running { frame: TaskToken },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub dt: f32,
    pub particles: usize,
    pub rebuilt: bool,
}

pub struct EffectsEngine<S> {
    phase: Phase,
    surface: Option<S>,
    state: EffectsState,
}

impl<S: DrawSurface> EffectsEngine<S> {
    pub fn new(mode: SkyMode, viewport: ViewportChange, rng: StdRng) -> Self {
        let mut state = EffectsState::new(mode, rng);
        apply_resize(&mut state, viewport);
        Self {
            phase: Phase::Stopped,
            surface: None,
            state,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn mode(&self) -> SkyMode {
        self.state.mode
    }

    pub fn viewport(&self) -> Viewport {
        self.state.viewport
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.state.particles
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn start<H: FrameHost + ?Sized>(
        &mut self,
        surface: Option<S>,
        now: Duration,
        host: &mut H,
    ) -> bool {
        if self.is_running() {
            return true;
        }
        if let Some(s) = surface {
            self.surface = Some(s);
        }
        let Some(surface) = self.surface.as_mut() else {
            debug!("no drawing surface; effects stay stopped");
            return false;
        };
        let vp = self.state.viewport;
        if (surface.width(), surface.height()) != (vp.width, vp.height) {
            surface.resize(vp.width, vp.height);
        }
        self.state.last_frame = Some(now);
        self.phase = Phase::Running {
            frame: host.request_frame(),
        };
        info!(mode = self.state.mode.label(), "effects started");
        true
    }

    pub fn stop<H: FrameHost + ?Sized>(&mut self, host: &mut H) -> Option<S> {
        if let Phase::Running { frame } = self.phase {
            host.cancel_frame(frame);
            info!("effects stopped");
        }
        self.phase = Phase::Stopped;
        self.state.last_frame = None;
        self.surface.take()
    }

    // Stale tokens and callbacks after stop are ignored.
    pub fn frame<H: FrameHost + ?Sized>(
        &mut self,
        token: TaskToken,
        now: Duration,
        host: &mut H,
    ) -> Option<FrameReport> {
        if self.phase != (Phase::Running { frame: token }) {
            return None;
        }
        let surface = self.surface.as_mut()?;
        let state = &mut self.state;

        let elapsed = state
            .last_frame
            .map(|last| now.saturating_sub(last).as_secs_f32())
            .unwrap_or(MAX_DT);
        let dt = elapsed.clamp(MIN_DT, MAX_DT);
        state.last_frame = Some(now);

        let (w, h) = state.viewport.size();
        let ctx = StepContext {
            dt,
            t: now.as_secs_f32(),
            width: w,
            height: h,
        };

        surface.clear();
        draw_ambient_wash(surface, state.mode, w, h);
        for p in state.particles.iter_mut() {
            step(p, &ctx, &mut state.rng);
            draw_particle(surface, p, ctx.t);
        }

        let rebuilt = state.population_mismatch();
        if rebuilt {
            state.rebuild();
            debug!(
                mode = state.mode.label(),
                particles = state.particles.len(),
                "population did not match mode; rebuilt"
            );
        }

        self.phase = Phase::Running {
            frame: host.request_frame(),
        };

        Some(FrameReport {
            dt,
            particles: self.state.particles.len(),
            rebuilt,
        })
    }

    pub fn set_mode(&mut self, mode: SkyMode) -> bool {
        if self.state.mode == mode {
            return false;
        }
        info!(from = self.state.mode.label(), to = mode.label(), "sky mode changed");
        self.state.mode = mode;
        self.state.rebuild();
        true
    }

    pub fn regenerate(&mut self) {
        self.state.rebuild();
    }

    pub fn resize(&mut self, change: ViewportChange) -> Viewport {
        let vp = apply_resize(&mut self.state, change);
        if let Some(s) = self.surface.as_mut() {
            s.resize(vp.width, vp.height);
        }
        vp
    }
}
