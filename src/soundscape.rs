// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use tracing::{debug, info};

use crate::audio::{AudioTrack, Deck, Track};
use crate::scheduler::{TaskToken, TimerHost};
use crate::sky::SkyMode;

pub const LOOP_VOLUME: f32 = 0.25;
pub const WIND_VOLUME: f32 = 0.15;
pub const BIRDS_VOLUME: f32 = 0.18;
pub const BIRDS_PERIOD: Duration = Duration::from_millis(12_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundState {
    Locked,
    Muted,
    Silent,
    Loop(Track),
    Birds,
}

impl SoundState {
    pub fn label(self) -> &'static str {
        match self {
            SoundState::Locked => "press any key for sound",
            SoundState::Muted => "muted",
            SoundState::Silent => "silent",
            SoundState::Loop(t) => t.label(),
            SoundState::Birds => "birds",
        }
    }
}

pub struct Soundscape<T: AudioTrack> {
    deck: Deck<T>,
    mode: SkyMode,
    muted: bool,
    unlocked: bool,
    current_loop: Option<Track>,
    birds_timer: Option<TaskToken>,
}

impl<T: AudioTrack> Soundscape<T> {
    pub fn new(mut deck: Deck<T>, muted: bool) -> Self {
        for t in [Track::Rain, Track::Snow, Track::Wind] {
            let track = deck.get_mut(t);
            track.set_looping(true);
            track.set_volume(LOOP_VOLUME);
        }
        deck.birds.set_looping(false);
        deck.birds.set_volume(BIRDS_VOLUME);

        Self {
            deck,
            mode: SkyMode::Clear,
            muted,
            unlocked: false,
            current_loop: None,
            birds_timer: None,
        }
    }

    #[cfg(test)]
    pub fn deck(&self) -> &Deck<T> {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck<T> {
        &mut self.deck
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn unlocked(&self) -> bool {
        self.unlocked
    }

    #[cfg(test)]
    pub fn current_loop(&self) -> Option<Track> {
        self.current_loop
    }

    #[cfg(test)]
    pub fn birds_timer(&self) -> Option<TaskToken> {
        self.birds_timer
    }

    pub fn state(&self) -> SoundState {
        if !self.unlocked {
            SoundState::Locked
        } else if self.muted {
            SoundState::Muted
        } else if let Some(t) = self.current_loop {
            SoundState::Loop(t)
        } else if self.birds_timer.is_some() {
            SoundState::Birds
        } else {
            SoundState::Silent
        }
    }

    pub fn unlock(&mut self) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        for t in Track::ALL {
            self.deck.get_mut(t).unlock();
        }
        info!("audio unlocked");
        true
    }

    /// Flip mute. Toggling is a user gesture, so it also unlocks.
    pub fn toggle_mute(&mut self) -> bool {
        self.unlock();
        self.muted = !self.muted;
        info!(muted = self.muted, "mute toggled");
        self.muted
    }

    pub fn sync<H: TimerHost + ?Sized>(&mut self, mode: SkyMode, host: &mut H) {
        self.mode = mode;
        self.stop_all(host);

        if self.muted || !self.unlocked {
            return;
        }

        match mode {
            SkyMode::Rain => self.start_loop(Track::Rain, LOOP_VOLUME),
            SkyMode::Snow => self.start_loop(Track::Snow, LOOP_VOLUME),
            SkyMode::Cloudy | SkyMode::Partly => self.start_loop(Track::Wind, WIND_VOLUME),
            SkyMode::Clear => {
                self.birds_timer = Some(host.set_interval(BIRDS_PERIOD));
                debug!(period_ms = BIRDS_PERIOD.as_millis() as u64, "birds timer armed");
            }
        }
    }

    pub fn on_timer(&mut self, token: TaskToken) -> bool {
        if self.birds_timer != Some(token) {
            return false;
        }
        if !self.muted && self.mode == SkyMode::Clear {
            let birds = &mut self.deck.birds;
            birds.seek_start();
            best_effort(birds);
        }
        true
    }

    pub fn shutdown<H: TimerHost + ?Sized>(&mut self, host: &mut H) {
        self.stop_all(host);
    }

    fn stop_all<H: TimerHost + ?Sized>(&mut self, host: &mut H) {
        for t in Track::ALL {
            let track = self.deck.get_mut(t);
            track.pause();
            track.seek_start();
        }
        if let Some(token) = self.birds_timer.take() {
            host.clear_interval(token);
        }
        self.current_loop = None;
    }

    fn start_loop(&mut self, t: Track, volume: f32) {
        let track = self.deck.get_mut(t);
        track.set_volume(volume);
        best_effort(track);
        self.current_loop = Some(t);
        info!(track = t.label(), "ambient loop started");
    }
}

fn best_effort<T: AudioTrack + ?Sized>(track: &mut T) {
    if let Err(e) = track.play() {
        debug!(track = track.name(), error = %e, "playback start ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::VirtualTrack;
    use crate::scheduler::{Scheduler, TaskKind};

    fn setup(muted: bool) -> (Soundscape<VirtualTrack>, Scheduler) {
        let sc = Soundscape::new(Deck::virtual_deck(), muted);
        (sc, Scheduler::new(Duration::from_millis(16)))
    }

    #[test]
    fn clear_unmuted_unlocked_arms_birds_timer_without_loops() {
        let (mut sc, mut host) = setup(false);
        sc.unlock();
        sc.sync(SkyMode::Clear, &mut host);

        assert_eq!(sc.deck().loops_playing(), 0);
        assert_eq!(host.pending(TaskKind::Timer), 1);
        assert_eq!(host.next_due(), Some(BIRDS_PERIOD));
        assert_eq!(sc.state(), SoundState::Birds);

        host.advance_to(BIRDS_PERIOD);
        let fired = host.pop_due().unwrap();
        assert!(sc.on_timer(fired.token));
        assert!(sc.deck().birds.is_playing());
        assert_eq!(sc.deck().loops_playing(), 0);
    }

    #[test]
    fn nothing_plays_while_locked_or_muted() {
        let (mut sc, mut host) = setup(false);
        sc.sync(SkyMode::Rain, &mut host);
        assert_eq!(sc.deck().playing().count(), 0);
        assert_eq!(sc.state(), SoundState::Locked);

        let (mut sc, mut host) = setup(true);
        sc.unlock();
        sc.sync(SkyMode::Clear, &mut host);
        assert_eq!(sc.deck().playing().count(), 0);
        assert_eq!(host.pending(TaskKind::Timer), 0);
        assert_eq!(sc.state(), SoundState::Muted);
    }

    #[test]
    fn toggling_mute_latches_unlock() {
        let (mut sc, _) = setup(true);
        assert!(!sc.unlocked());
        assert!(!sc.toggle_mute());
        assert!(sc.unlocked());
        assert!(sc.toggle_mute());
        assert!(sc.unlocked());
    }

    #[test]
    fn at_most_one_loop_for_any_sequence_of_changes() {
        let (mut sc, mut host) = setup(false);
        sc.unlock();
        let modes = [
            SkyMode::Rain,
            SkyMode::Snow,
            SkyMode::Cloudy,
            SkyMode::Clear,
            SkyMode::Partly,
            SkyMode::Rain,
            SkyMode::Rain,
            SkyMode::Clear,
            SkyMode::Snow,
        ];
        for (i, mode) in modes.into_iter().enumerate() {
            if i % 3 == 2 {
                sc.toggle_mute();
            }
            sc.sync(mode, &mut host);
            assert!(sc.deck().loops_playing() <= 1, "step {}", i);
            assert!(host.pending(TaskKind::Timer) <= 1, "step {}", i);
            if sc.deck().loops_playing() == 1 {
                assert_eq!(host.pending(TaskKind::Timer), 0);
            }
        }
    }

    #[test]
    fn clouds_play_wind_at_reduced_volume() {
        let (mut sc, mut host) = setup(false);
        sc.unlock();
        sc.sync(SkyMode::Partly, &mut host);
        assert_eq!(sc.current_loop(), Some(Track::Wind));
        assert!(sc.deck().wind.is_playing());
        assert_eq!(sc.deck().wind.volume(), WIND_VOLUME);
        assert_eq!(sc.deck().rain.volume(), LOOP_VOLUME);
    }

    #[test]
    fn leaving_clear_cancels_birds() {
        let (mut sc, mut host) = setup(false);
        sc.unlock();
        sc.sync(SkyMode::Clear, &mut host);
        let token = sc.birds_timer().unwrap();
        sc.sync(SkyMode::Snow, &mut host);
        assert!(!host.is_pending(token));
        assert!(!sc.on_timer(token));
        assert_eq!(sc.current_loop(), Some(Track::Snow));
    }

    #[test]
    fn failed_starts_are_swallowed() {
        let deck = Deck {
            rain: VirtualTrack::new("rain", Duration::ZERO),
            snow: VirtualTrack::new("snow", Duration::ZERO),
            wind: VirtualTrack::new("wind", Duration::ZERO),
            birds: VirtualTrack::new("birds", Duration::ZERO),
        };
        let mut sc = Soundscape::new(deck, false);
        let mut host = Scheduler::new(Duration::from_millis(16));
        sc.unlock();
        sc.sync(SkyMode::Rain, &mut host);
        assert_eq!(sc.deck().playing().count(), 0);
        assert_eq!(sc.current_loop(), Some(Track::Rain));
    }

    #[test]
    fn shutdown_rewinds_everything() {
        let (mut sc, mut host) = setup(false);
        sc.unlock();
        sc.sync(SkyMode::Rain, &mut host);
        sc.deck_mut().advance(Duration::from_secs(3));
        assert_eq!(sc.deck().rain.position(), Duration::from_secs(3));

        sc.shutdown(&mut host);
        assert_eq!(sc.deck().playing().count(), 0);
        assert_eq!(sc.deck().rain.position(), Duration::ZERO);
        assert_eq!(sc.current_loop(), None);
    }
}
