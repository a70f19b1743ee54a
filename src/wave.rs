// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! This is the namespace for all parts dealing with data in sampled waves.

use snafu::Snafu;

/// Sample rate used for everything the language synthesizes.
pub const DEFAULT_SAMPLERATE: u32 = 44100;

/// Largest magnitude of a signed 16-bit PCM sample.
pub const PCM_FULL_SCALE: f64 = 32767.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
pub enum WaveError {
    #[snafu(display(
        "cannot combine waves sampled at {} Hz and {} Hz",
        left,
        right
    ))]
    SamplerateMismatch { left: u32, right: u32 },
}

/// A synthesis parameter that is either fixed or depends on the time (in seconds)
/// since the start of the wave.
#[derive(Clone, Copy)]
pub enum Param<'a> {
    Const(f64),
    Varying(&'a dyn Fn(f64) -> f64),
}

impl<'a> Param<'a> {
    pub fn at(&self, seconds: f64) -> f64 {
        match self {
            Param::Const(value) => *value,
            Param::Varying(f) => f(seconds),
        }
    }
}

/// A mono buffer of samples together with the number of voices that were summed into it.
///
/// The voice count is the normalisation denominator applied on export: adding two waves
/// sums their samples and their voice counts, so the mix stays within range without
/// having to rescale anything until the very end.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioWave {
    samples: Vec<f64>,
    samplerate: u32,
    voices: u32,
}

impl Default for AudioWave {
    fn default() -> Self {
        Self::empty()
    }
}

impl AudioWave {
    /// The identity of both `add` and `append`: no samples and no voices.
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
            samplerate: DEFAULT_SAMPLERATE,
            voices: 0,
        }
    }

    /// A single voice made of the given samples.
    pub fn from_samples(samples: Vec<f64>, samplerate: u32) -> Self {
        Self {
            samples,
            samplerate,
            voices: 1,
        }
    }

    /// Synthesize a single voice.
    ///
    /// `waveform` maps the phase, measured in cycles, to a sample. With a constant
    /// frequency the phase is computed in closed form and the wave has exactly
    /// `round(duration * samplerate)` samples. A varying frequency is integrated
    /// sample by sample instead, which keeps the pitch sweep free of jumps.
    pub fn new(
        duration: f64,
        frequency: Param,
        amplitude: Param,
        waveform: &dyn Fn(f64) -> f64,
        samplerate: u32,
    ) -> Self {
        let rate = f64::from(samplerate);
        let samples = match frequency {
            Param::Const(frequency) => {
                let count = (duration * rate).round().max(0.0) as usize;
                (0..count)
                    .map(|i| {
                        let t = i as f64 / rate;
                        amplitude.at(t) * waveform(frequency * t)
                    })
                    .collect()
            }
            Param::Varying(frequency) => {
                let mut samples = Vec::new();
                let mut t = 0.0;
                let mut phase = 0.0;
                while t < duration {
                    samples.push(amplitude.at(t) * waveform(phase));
                    phase += frequency(t) / rate;
                    t += 1.0 / rate;
                }
                samples
            }
        };
        Self::from_samples(samples, samplerate)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn samplerate(&self) -> u32 {
        self.samplerate
    }

    pub fn voices(&self) -> u32 {
        self.voices
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the wave in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.samplerate)
    }

    /// Samplerate of a combination of `self` and `other`.
    ///
    /// A wave without voices adopts the samplerate of its partner.
    fn combined_samplerate(&self, other: &AudioWave) -> Result<u32, WaveError> {
        if other.voices == 0 {
            Ok(self.samplerate)
        } else if self.voices == 0 {
            Ok(other.samplerate)
        } else if self.samplerate != other.samplerate {
            Err(WaveError::SamplerateMismatch {
                left: self.samplerate,
                right: other.samplerate,
            })
        } else {
            Ok(self.samplerate)
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for sample in self.samples.iter_mut() {
            *sample *= factor;
        }
    }

    /// Play both waves at the same time.
    ///
    /// The shorter one is padded with silence and the voice counts are summed.
    pub fn add(&self, other: &AudioWave) -> Result<AudioWave, WaveError> {
        let samplerate = self.combined_samplerate(other)?;
        let (long, short) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut samples = long.samples.clone();
        for (sum, sample) in samples.iter_mut().zip(short.samples.iter()) {
            *sum += sample;
        }
        Ok(AudioWave {
            samples,
            samplerate,
            voices: self.voices + other.voices,
        })
    }

    /// Play `other` after `self`.
    ///
    /// Both sides are normalised by their own voice count first, so the result counts as
    /// a single voice.
    pub fn append(&self, other: &AudioWave) -> Result<AudioWave, WaveError> {
        self.append_with(other, |_, _| 1)
    }

    /// Like `append`, but the voice count of the result is computed from the voice
    /// counts of both sides.
    pub fn append_with<F>(&self, other: &AudioWave, voices: F) -> Result<AudioWave, WaveError>
    where
        F: FnOnce(u32, u32) -> u32,
    {
        let samplerate = self.combined_samplerate(other)?;
        let mut samples = Vec::with_capacity(self.len() + other.len());
        samples.extend(self.normalized());
        samples.extend(other.normalized());
        Ok(AudioWave {
            samples,
            samplerate,
            voices: voices(self.voices, other.voices),
        })
    }

    /// Multiply every sample by an envelope evaluated at the sample's time in seconds.
    pub fn amplitude_effect<F: Fn(f64) -> f64>(&self, envelope: F) -> AudioWave {
        let rate = f64::from(self.samplerate);
        let samples = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, sample)| sample * envelope(i as f64 / rate))
            .collect();
        AudioWave {
            samples,
            samplerate: self.samplerate,
            voices: self.voices,
        }
    }

    /// The samples divided by the voice count.
    pub fn normalized(&self) -> impl Iterator<Item = f64> + '_ {
        let factor = if self.voices == 0 {
            1.0
        } else {
            1.0 / f64::from(self.voices)
        };
        self.samples.iter().map(move |sample| sample * factor)
    }

    /// Export form of the wave: normalised, clamped to the unit range and truncated to
    /// signed 16-bit integers.
    pub fn to_pcm(&self) -> Vec<i16> {
        self.normalized()
            .map(|sample| (sample.max(-1.0).min(1.0) * PCM_FULL_SCALE) as i16)
            .collect()
    }
}
