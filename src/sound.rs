// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use crate::audio::{AudioError, AudioTrack, Deck, Track};
use crate::synth::{Texture, SAMPLE_RATE};

impl Source for Texture {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        self.len_samples()
            .map(|n| Duration::from_secs_f64(n as f64 / SAMPLE_RATE as f64))
    }
}

type OpenSink = Box<dyn Fn() -> Option<Sink>>;

/// Rodio-backed track. Each start from the top gets a fresh sink; without an
/// output device `play` fails with `Unavailable`.
pub struct SinkTrack {
    track: Track,
    open: OpenSink,
    sink: Option<Sink>,
    volume: f32,
    looping: bool,
    seed: u64,
}

impl SinkTrack {
    fn new(track: Track, open: OpenSink) -> Self {
        Self {
            track,
            open,
            sink: None,
            volume: 1.0,
            looping: false,
            seed: track as u64,
        }
    }

    fn on_device(track: Track, handle: Option<OutputStreamHandle>) -> Self {
        let open: OpenSink = Box::new(move || {
            let h = handle.as_ref()?;
            match Sink::try_new(h) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(track = track.label(), error = %e, "cannot create audio sink");
                    None
                }
            }
        });
        Self::new(track, open)
    }
}

impl AudioTrack for SinkTrack {
    fn name(&self) -> &'static str {
        self.track.label()
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.sink.is_none() {
            self.sink = (self.open)();
        }
        let Some(sink) = self.sink.as_ref() else {
            return Err(AudioError::Unavailable(self.track.label()));
        };
        if sink.empty() {
            self.seed = self.seed.wrapping_add(0x9e37_79b9);
            let tex = Texture::new(self.track, self.seed);
            if self.looping && tex.len_samples().is_some() {
                sink.append(tex.repeat_infinite());
            } else {
                sink.append(tex);
            }
        }
        sink.set_volume(self.volume);
        sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(s) = &self.sink {
            s.pause();
        }
    }

    fn seek_start(&mut self) {
        // Dropping the sink stops it; the next play starts a new texture.
        self.sink = None;
    }

    fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(s) = &self.sink {
            s.set_volume(self.volume);
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
        self.sink
            .as_ref()
            .is_some_and(|s| !s.is_paused() && !s.empty())
    }
}

// The returned stream must outlive the deck.
pub fn open_deck() -> (Deck<SinkTrack>, Option<OutputStream>) {
    let (stream, handle) = match OutputStream::try_default() {
        Ok((stream, handle)) => (Some(stream), Some(handle)),
        Err(e) => {
            warn!(error = %e, "no audio output device; soundscape stays silent");
            (None, None)
        }
    };
    let deck = Deck {
        rain: SinkTrack::on_device(Track::Rain, handle.clone()),
        snow: SinkTrack::on_device(Track::Snow, handle.clone()),
        wind: SinkTrack::on_device(Track::Wind, handle.clone()),
        birds: SinkTrack::on_device(Track::Birds, handle),
    };
    debug!(device = stream.is_some(), "audio deck ready");
    (deck, stream)
}
