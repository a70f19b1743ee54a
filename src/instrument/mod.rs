// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Instruments turn a frequency into a waveform the synthesizer can sample.

pub mod cache;
pub mod oscillator;
pub mod sampled;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub use self::oscillator::{OscillatorInstrument, WaveShape};
pub use self::sampled::{Interpolation, SampledInstrument, Track};

/// A function from phase (in cycles) to sample value.
pub type Waveform = Rc<dyn Fn(f64) -> f64>;

pub trait Instrument: fmt::Debug {
    fn name(&self) -> &str;

    /// The waveform used for playing the given frequency.
    fn waveform(&self, frequency: f64) -> Waveform;

    /// The frequency a pitchless instrument sounds at, `None` for pitched instruments.
    fn natural_frequency(&self) -> Option<f64> {
        None
    }
}

/// All instruments known to a run, by name.
#[derive(Debug, Default, Clone)]
pub struct InstrumentTable {
    instruments: HashMap<String, Rc<dyn Instrument>>,
}

impl InstrumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the oscillators that are always available.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for instrument in oscillator::builtins() {
            table.register(Rc::new(instrument));
        }
        table
    }

    /// Add an instrument, returning the one it replaced.
    pub fn register(&mut self, instrument: Rc<dyn Instrument>) -> Option<Rc<dyn Instrument>> {
        self.instruments
            .insert(instrument.name().to_string(), instrument)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<dyn Instrument>> {
        self.instruments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instruments.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(|name| name.as_str())
    }
}
