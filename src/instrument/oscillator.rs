// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Periodic waveforms computed from the phase alone.

use std::rc::Rc;

use super::{Instrument, Waveform};

/// Position within one period of a wave, always in `[0, 1)`.
#[derive(Debug, Copy, Clone)]
pub struct Phase(f64);

impl Phase {
    pub fn new(cycles: f64) -> Phase {
        let offset = cycles.rem_euclid(1.0);
        // rem_euclid may round up to exactly 1 for tiny negative inputs
        Phase(if offset >= 1.0 { 0.0 } else { offset })
    }

    pub fn offset(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl WaveShape {
    pub fn eval(self, phase: Phase) -> f64 {
        let offset = phase.offset();
        use std::f64::consts::PI;
        match self {
            WaveShape::Sine => (offset * 2.0 * PI).sin(),
            // the sign of a sine, which is zero where the sine crosses zero
            WaveShape::Square => {
                if offset == 0.0 || offset == 0.5 {
                    0.0
                } else if offset < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Saw => {
                if offset < 0.5 {
                    2.0 * offset
                } else {
                    2.0 * offset - 2.0
                }
            }
            WaveShape::Triangle => {
                if offset < 0.25 {
                    4.0 * offset
                } else if offset < 0.75 {
                    2.0 - 4.0 * offset
                } else {
                    4.0 * offset - 4.0
                }
            }
        }
    }
}

/// A pitched instrument playing a plain oscillator.
#[derive(Debug, Clone)]
pub struct OscillatorInstrument {
    name: String,
    shape: WaveShape,
}

impl OscillatorInstrument {
    pub fn new(name: &str, shape: WaveShape) -> Self {
        Self {
            name: name.to_string(),
            shape,
        }
    }
}

impl Instrument for OscillatorInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn waveform(&self, _frequency: f64) -> Waveform {
        let shape = self.shape;
        Rc::new(move |cycles| shape.eval(Phase::new(cycles)))
    }
}

/// The oscillators every run starts with.
pub fn builtins() -> Vec<OscillatorInstrument> {
    vec![
        OscillatorInstrument::new("sin", WaveShape::Sine),
        OscillatorInstrument::new("square", WaveShape::Square),
        OscillatorInstrument::new("saw", WaveShape::Saw),
        OscillatorInstrument::new("triangle", WaveShape::Triangle),
    ]
}
