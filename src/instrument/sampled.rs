// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Instruments built from recorded tracks.

use std::rc::Rc;

use snafu::Snafu;

use super::{Instrument, Waveform};

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum SampledError {
    #[snafu(display("instrument '{}' has no tracks", name))]
    NoTracks { name: String },
}

/// How a sampled instrument plays frequencies it has no track for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interpolation {
    /// Play the track whose frequency is closest on a logarithmic scale.
    Nearest,
    /// Blend the closest tracks below and above the frequency.
    Lerp,
}

impl Interpolation {
    pub fn parse(mode: &str) -> Option<Interpolation> {
        match mode {
            "none" => Some(Interpolation::Nearest),
            "lerp" => Some(Interpolation::Lerp),
            _ => None,
        }
    }
}

/// A recording of an instrument at one frequency.
#[derive(Debug, Clone)]
pub struct Track {
    samples: Rc<[f64]>,
    samplerate: u32,
    frequency: f64,
}

impl Track {
    pub fn new(samples: Vec<f64>, samplerate: u32, frequency: f64) -> Self {
        Self {
            samples: samples.into(),
            samplerate,
            frequency,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the recording in cycles of its own frequency.
    pub fn period(&self) -> f64 {
        self.frequency * self.samples.len() as f64 / f64::from(self.samplerate)
    }

    /// The recording as a waveform: silent outside of the recorded range.
    pub fn as_waveform(&self) -> Waveform {
        let samples = Rc::clone(&self.samples);
        let samples_per_cycle = f64::from(self.samplerate) / self.frequency;
        Rc::new(move |cycles| {
            let index = (cycles * samples_per_cycle).floor();
            if index >= 0.0 && index < samples.len() as f64 {
                samples[index as usize]
            } else {
                0.0
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct SampledInstrument {
    name: String,
    tracks: Vec<Track>,
    interpolation: Interpolation,
    continuous: bool,
    pitchless: bool,
}

impl SampledInstrument {
    pub fn new(
        name: String,
        tracks: Vec<Track>,
        interpolation: Interpolation,
        continuous: bool,
        pitchless: bool,
    ) -> Result<Self, SampledError> {
        if tracks.is_empty() {
            return Err(SampledError::NoTracks { name });
        }
        Ok(Self {
            name,
            tracks,
            interpolation,
            continuous,
            pitchless,
        })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn nearest(&self, frequency: f64) -> Waveform {
        let target = semitones(frequency);
        let best = self.tracks.iter().min_by(|a, b| {
            let da = (target - semitones(a.frequency)).abs();
            let db = (target - semitones(b.frequency)).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        // `new` guarantees at least one track
        match best {
            Some(track) => track.as_waveform(),
            None => silence(),
        }
    }

    fn lerp(&self, frequency: f64) -> Waveform {
        let mut lower: Option<&Track> = None;
        let mut upper: Option<&Track> = None;
        for track in &self.tracks {
            if track.frequency > frequency {
                if upper.map_or(true, |u| track.frequency < u.frequency) {
                    upper = Some(track);
                }
            } else if lower.map_or(true, |l| track.frequency > l.frequency) {
                lower = Some(track);
            }
        }
        let (lower, upper) = match (lower, upper) {
            (Some(lower), Some(upper)) => (lower, upper),
            (Some(only), None) | (None, Some(only)) => (only, only),
            (None, None) => return silence(),
        };

        let span = semitones(upper.frequency) - semitones(lower.frequency);
        let ratio = if span == 0.0 {
            0.0
        } else {
            (semitones(frequency) - semitones(lower.frequency)) / span
        };
        let below = lower.as_waveform();
        let above = upper.as_waveform();
        Rc::new(move |cycles| (1.0 - ratio) * below(cycles) + ratio * above(cycles))
    }
}

impl Instrument for SampledInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn waveform(&self, frequency: f64) -> Waveform {
        let waveform = if self.pitchless {
            self.tracks[0].as_waveform()
        } else {
            match self.interpolation {
                Interpolation::Nearest => self.nearest(frequency),
                Interpolation::Lerp => self.lerp(frequency),
            }
        };
        if !self.continuous {
            return waveform;
        }
        let period = self.tracks[0].period();
        if period <= 0.0 {
            return waveform;
        }
        Rc::new(move |cycles| waveform(cycles.rem_euclid(period)))
    }

    fn natural_frequency(&self) -> Option<f64> {
        if self.pitchless {
            Some(self.tracks[0].frequency)
        } else {
            None
        }
    }
}

fn semitones(frequency: f64) -> f64 {
    12.0 * frequency.log2()
}

fn silence() -> Waveform {
    Rc::new(|_| 0.0)
}
