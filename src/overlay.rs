// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rand::rngs::StdRng;
use tracing::debug;

use crate::audio::{AudioTrack, Deck};
use crate::engine::EffectsEngine;
use crate::scheduler::{FrameHost, TaskToken, TimerHost};
use crate::sky::{classify, SkyMode};
use crate::soundscape::{SoundState, Soundscape};
use crate::surface::DrawSurface;
use crate::viewport::ViewportChange;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Applied {
    mode: SkyMode,
    muted: bool,
    unlocked: bool,
}

/// Reruns the factory and soundscape only when `(mode, muted, unlocked)` changes.
pub struct Overlay<S, T: AudioTrack> {
    condition: String,
    engine: EffectsEngine<S>,
    soundscape: Soundscape<T>,
    applied: Option<Applied>,
    parked: Option<S>,
}

impl<S: DrawSurface, T: AudioTrack> Overlay<S, T> {
    pub fn new(
        condition: &str,
        viewport: ViewportChange,
        deck: Deck<T>,
        muted: bool,
        rng: StdRng,
    ) -> Self {
        let mode = classify(Some(condition));
        Self {
            condition: condition.trim().to_string(),
            engine: EffectsEngine::new(mode, viewport, rng),
            soundscape: Soundscape::new(deck, muted),
            applied: None,
            parked: None,
        }
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn mode(&self) -> SkyMode {
        self.engine.mode()
    }

    pub fn sound_state(&self) -> SoundState {
        self.soundscape.state()
    }

    pub fn engine(&self) -> &EffectsEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EffectsEngine<S> {
        &mut self.engine
    }

    #[cfg(test)]
    pub fn soundscape(&self) -> &Soundscape<T> {
        &self.soundscape
    }

    pub fn soundscape_mut(&mut self) -> &mut Soundscape<T> {
        &mut self.soundscape
    }

    pub fn is_paused(&self) -> bool {
        self.parked.is_some()
    }

    pub fn start<H>(&mut self, surface: S, now: Duration, host: &mut H) -> bool
    where
        H: FrameHost + TimerHost + ?Sized,
    {
        let started = self.engine.start(Some(surface), now, host);
        self.reconcile(host);
        started
    }

    pub fn set_condition<H: TimerHost + ?Sized>(&mut self, condition: &str, host: &mut H) -> SkyMode {
        let mode = classify(Some(condition));
        self.condition = condition.trim().to_string();
        self.engine.set_mode(mode);
        self.reconcile(host);
        mode
    }

    pub fn toggle_mute<H: TimerHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let muted = self.soundscape.toggle_mute();
        self.reconcile(host);
        muted
    }

    pub fn unlock<H: TimerHost + ?Sized>(&mut self, host: &mut H) {
        if self.soundscape.unlock() {
            self.reconcile(host);
        }
    }

    pub fn on_timer(&mut self, token: TaskToken) -> bool {
        self.soundscape.on_timer(token)
    }

    pub fn pause<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.parked.is_none() {
            self.parked = self.engine.stop(host);
        }
    }

    pub fn resume<H: FrameHost + ?Sized>(&mut self, now: Duration, host: &mut H) -> bool {
        match self.parked.take() {
            Some(s) => self.engine.start(Some(s), now, host),
            None => self.engine.is_running(),
        }
    }

    pub fn shutdown<H>(&mut self, host: &mut H) -> Option<S>
    where
        H: FrameHost + TimerHost + ?Sized,
    {
        self.soundscape.shutdown(host);
        self.applied = None;
        let surface = self.engine.stop(host);
        surface.or_else(|| self.parked.take())
    }

    fn reconcile<H: TimerHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let next = Applied {
            mode: self.engine.mode(),
            muted: self.soundscape.muted(),
            unlocked: self.soundscape.unlocked(),
        };
        if self.applied == Some(next) {
            return false;
        }
        debug!(
            mode = next.mode.label(),
            muted = next.muted,
            unlocked = next.unlocked,
            "soundscape inputs changed"
        );
        self.soundscape.sync(next.mode, host);
        self.applied = Some(next);
        true
    }
}
