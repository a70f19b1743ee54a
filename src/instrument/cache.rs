// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Memoization of synthesized notes, since songs tend to repeat themselves.

use std::collections::hash_map::{Entry, HashMap};
use std::rc::Rc;

use log::trace;

use super::Instrument;
use crate::wave::{AudioWave, Param, DEFAULT_SAMPLERATE};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NoteKey {
    duration: u64,
    frequency: u64,
    amplitude: u64,
    instrument: String,
}

/// Constant-frequency notes synthesized during a run, keyed by their exact parameters.
#[derive(Debug, Default)]
pub struct NoteCache {
    notes: HashMap<NoteKey, Rc<AudioWave>>,
    hits: usize,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize a note, or return the identical note synthesized earlier.
    pub fn note(
        &mut self,
        duration: f64,
        frequency: f64,
        amplitude: f64,
        instrument: &dyn Instrument,
    ) -> Rc<AudioWave> {
        let key = NoteKey {
            duration: duration.to_bits(),
            frequency: frequency.to_bits(),
            amplitude: amplitude.to_bits(),
            instrument: instrument.name().to_string(),
        };
        match self.notes.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                trace!(
                    "reusing {}s at {} Hz on {}",
                    duration,
                    frequency,
                    instrument.name()
                );
                Rc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                trace!(
                    "synthesizing {}s at {} Hz on {}",
                    duration,
                    frequency,
                    instrument.name()
                );
                let waveform = instrument.waveform(frequency);
                let wave = AudioWave::new(
                    duration,
                    Param::Const(frequency),
                    Param::Const(amplitude),
                    &*waveform,
                    DEFAULT_SAMPLERATE,
                );
                Rc::clone(entry.insert(Rc::new(wave)))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// How often a note was served from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instrument::{OscillatorInstrument, WaveShape};

    #[test]
    fn test_reuses_notes() {
        let sine = OscillatorInstrument::new("sin", WaveShape::Sine);
        let square = OscillatorInstrument::new("square", WaveShape::Square);
        let mut cache = NoteCache::new();
        assert!(cache.is_empty());
        let first = cache.note(0.5, 440.0, 1.0, &sine);
        let second = cache.note(0.5, 440.0, 1.0, &sine);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);

        let other = cache.note(0.5, 440.0, 1.0, &square);
        assert!(!Rc::ptr_eq(&first, &other));
        cache.note(0.5, 440.0, 0.5, &sine);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.hits(), 1);
        assert_eq!(first.len(), 22050);

        // a hit hands out the very same wave again
        let third = cache.note(0.5, 440.0, 1.0, &sine);
        assert!(Rc::ptr_eq(&first, &third));
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.len(), 3);
    }
}
