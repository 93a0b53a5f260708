// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("playback of {0} is blocked until user interaction")]
    Blocked(&'static str),
    #[error("{0} has no playable media")]
    Unavailable(&'static str),
}

pub trait AudioTrack {
    fn name(&self) -> &'static str;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn seek_start(&mut self);
    fn set_volume(&mut self, volume: f32);
    #[allow(dead_code)]
    fn volume(&self) -> f32;
    fn set_looping(&mut self, looping: bool);
    #[allow(dead_code)]
    fn is_looping(&self) -> bool;
    #[allow(dead_code)]
    fn is_playing(&self) -> bool;

    // Backends without an autoplay policy ignore the gesture.
    fn unlock(&mut self) {}

    // Clock-driven backends move their playhead here; real devices keep time.
    fn advance(&mut self, _dt: Duration) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Track {
    Rain,
    Snow,
    Wind,
    Birds,
}

impl Track {
    pub const ALL: [Track; 4] = [Track::Rain, Track::Snow, Track::Wind, Track::Birds];

    pub fn label(self) -> &'static str {
        match self {
            Track::Rain => "rain",
            Track::Snow => "snow",
            Track::Wind => "wind",
            Track::Birds => "birds",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Deck<T> {
    pub rain: T,
    pub snow: T,
    pub wind: T,
    pub birds: T,
}

impl<T: AudioTrack> Deck<T> {
    #[cfg(test)]
    pub fn get(&self, track: Track) -> &T {
        match track {
            Track::Rain => &self.rain,
            Track::Snow => &self.snow,
            Track::Wind => &self.wind,
            Track::Birds => &self.birds,
        }
    }

    pub fn get_mut(&mut self, track: Track) -> &mut T {
        match track {
            Track::Rain => &mut self.rain,
            Track::Snow => &mut self.snow,
            Track::Wind => &mut self.wind,
            Track::Birds => &mut self.birds,
        }
    }

    #[cfg(test)]
    pub fn playing(&self) -> impl Iterator<Item = Track> + '_ {
        Track::ALL
            .into_iter()
            .filter(move |t| self.get(*t).is_playing())
    }

    #[cfg(test)]
    pub fn loops_playing(&self) -> usize {
        self.playing().filter(|t| self.get(*t).is_looping()).count()
    }

    pub fn advance(&mut self, dt: Duration) {
        for t in Track::ALL {
            self.get_mut(t).advance(dt);
        }
    }
}

#[cfg_attr(feature = "sound", allow(dead_code))]
impl Deck<VirtualTrack> {
    pub fn virtual_deck() -> Self {
        Self {
            rain: VirtualTrack::new("rain", Duration::from_secs(60)).gesture_gated(),
            snow: VirtualTrack::new("snow", Duration::from_secs(60)).gesture_gated(),
            wind: VirtualTrack::new("wind", Duration::from_secs(45)).gesture_gated(),
            birds: VirtualTrack::new("birds", Duration::from_secs(4)).gesture_gated(),
        }
    }
}

/// Silent stand-in for an audio device: keeps position, looping and volume
/// on a clock. Zero length means no media; gated tracks refuse until unlocked.
#[cfg_attr(feature = "sound", allow(dead_code))]
#[derive(Clone, Debug)]
pub struct VirtualTrack {
    name: &'static str,
    length: Duration,
    position: Duration,
    volume: f32,
    looping: bool,
    playing: bool,
    blocked: bool,
    plays: u32,
}

#[cfg_attr(feature = "sound", allow(dead_code))]
impl VirtualTrack {
    pub fn new(name: &'static str, length: Duration) -> Self {
        Self {
            name,
            length,
            position: Duration::ZERO,
            volume: 1.0,
            looping: false,
            playing: false,
            blocked: false,
            plays: 0,
        }
    }

    pub fn gesture_gated(mut self) -> Self {
        self.blocked = true;
        self
    }

    #[cfg(test)]
    pub fn position(&self) -> Duration {
        self.position
    }

    #[cfg(test)]
    pub fn plays(&self) -> u32 {
        self.plays
    }
}

impl AudioTrack for VirtualTrack {
    fn name(&self) -> &'static str {
        self.name
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.length.is_zero() {
            return Err(AudioError::Unavailable(self.name));
        }
        if self.blocked {
            return Err(AudioError::Blocked(self.name));
        }
        if self.position >= self.length {
            self.position = Duration::ZERO;
        }
        self.playing = true;
        self.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek_start(&mut self) {
        self.position = Duration::ZERO;
    }

    fn set_volume(&mut self, volume: f32) {
        if volume.is_finite() {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn unlock(&mut self) {
        self.blocked = false;
    }

    fn advance(&mut self, dt: Duration) {
        if !self.playing || self.length.is_zero() {
            return;
        }
        self.position += dt;
        if self.position >= self.length {
            if self.looping {
                let len = self.length.as_nanos();
                let wrapped = self.position.as_nanos() % len;
                self.position = Duration::from_nanos(wrapped as u64);
            } else {
                self.position = self.length;
                self.playing = false;
                trace!(track = self.name, "one-shot ended");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_track_wraps_around() {
        let mut t = VirtualTrack::new("rain", Duration::from_secs(10));
        t.set_looping(true);
        t.play().unwrap();
        t.advance(Duration::from_secs(23));
        assert!(t.is_playing());
        assert_eq!(t.position(), Duration::from_secs(3));
    }

    #[test]
    fn one_shot_stops_at_the_end_and_replays_from_start() {
        let mut t = VirtualTrack::new("birds", Duration::from_secs(4));
        t.play().unwrap();
        t.advance(Duration::from_secs(5));
        assert!(!t.is_playing());
        assert_eq!(t.position(), Duration::from_secs(4));

        t.play().unwrap();
        assert_eq!(t.position(), Duration::ZERO);
        assert_eq!(t.plays(), 2);
    }

    #[test]
    fn track_without_media_refuses_to_play() {
        let mut t = VirtualTrack::new("wind", Duration::ZERO);
        assert_eq!(t.play(), Err(AudioError::Unavailable("wind")));
        assert!(!t.is_playing());
    }

    #[test]
    fn gated_track_plays_only_after_unlock() {
        let mut t = VirtualTrack::new("rain", Duration::from_secs(10)).gesture_gated();
        assert_eq!(t.play(), Err(AudioError::Blocked("rain")));
        t.unlock();
        assert_eq!(t.play(), Ok(()));
    }

    #[test]
    fn paused_track_keeps_position_until_rewound() {
        let mut t = VirtualTrack::new("snow", Duration::from_secs(30));
        t.play().unwrap();
        t.advance(Duration::from_secs(2));
        t.pause();
        t.advance(Duration::from_secs(2));
        assert_eq!(t.position(), Duration::from_secs(2));
        t.seek_start();
        assert_eq!(t.position(), Duration::ZERO);
    }

    #[test]
    fn deck_counts_playing_loops() {
        let mut d = Deck::virtual_deck();
        for t in Track::ALL {
            d.get_mut(t).unlock();
        }
        d.rain.set_looping(true);
        d.rain.play().unwrap();
        d.birds.play().unwrap();
        assert_eq!(d.playing().collect::<Vec<_>>(), vec![Track::Rain, Track::Birds]);
        assert_eq!(d.loops_playing(), 1);
    }
}
