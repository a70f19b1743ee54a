// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of what a note name is.
//!
//! A note name is a letter, any number of accidentals (`#` raises, `b` lowers by a
//! semitone), an optional signed cents offset in parentheses, and either relative
//! octave shifts (`+`/`-`) or an absolute octave (digits, optionally marked with `~`):
//!
//! ```
//! use lireta::note::{Octave, Pitch};
//!
//! let pitch = Pitch::parse("C#(+50c)+").unwrap();
//! assert_eq!(pitch.semitones, -7.5);
//! assert_eq!(pitch.octave, Octave::Relative(1));
//! assert_eq!(Pitch::parse("A~3").unwrap().octave, Octave::Absolute(3));
//! assert!(Pitch::parse("H").is_none());
//! ```

use std::iter::Peekable;
use std::str::Chars;

/// Which octave a note is played in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Octave {
    /// Shifted by this many octaves from the current default octave.
    Relative(i32),
    /// A fixed octave, independent of the default.
    Absolute(i32),
}

/// A parsed note name.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pitch {
    /// Distance from A in the same octave, including accidentals and cents.
    pub semitones: f64,
    pub octave: Octave,
}

impl Pitch {
    /// Parse a note name, returning `None` if the word is not one.
    pub fn parse(name: &str) -> Option<Pitch> {
        let mut chars = name.chars().peekable();
        let mut semitones = match chars.next()? {
            'A' => 0.0,
            'B' => 2.0,
            'C' => -9.0,
            'D' => -7.0,
            'E' => -5.0,
            'F' => -4.0,
            'G' => -2.0,
            _ => return None,
        };

        while let Some(&ch) = chars.peek() {
            match ch {
                '#' => semitones += 1.0,
                'b' => semitones -= 1.0,
                _ => break,
            }
            chars.next();
        }

        if chars.peek() == Some(&'(') {
            chars.next();
            semitones += parse_cents(&mut chars)? / 100.0;
        }

        let mut shift = 0;
        let mut shifted = false;
        while let Some(&ch) = chars.peek() {
            match ch {
                '+' => shift += 1,
                '-' => shift -= 1,
                _ => break,
            }
            shifted = true;
            chars.next();
        }

        let octave = match chars.peek() {
            None => Octave::Relative(shift),
            Some(_) if shifted => return None,
            Some('~') => {
                chars.next();
                Octave::Absolute(take_digits(&mut chars).parse().ok()?)
            }
            Some(_) => Octave::Absolute(take_digits(&mut chars).parse().ok()?),
        };

        if chars.next().is_some() {
            return None;
        }
        Some(Pitch { semitones, octave })
    }

    /// Frequency of the note for the given tuning of A4 and default octave.
    pub fn frequency(&self, tuning: f64, default_octave: f64) -> f64 {
        let octave_offset = match self.octave {
            Octave::Relative(shift) => (default_octave - 4.0 + f64::from(shift)) * 12.0,
            Octave::Absolute(octave) => f64::from(octave - 4) * 12.0,
        };
        tuning * 2f64.powf((self.semitones + octave_offset) / 12.0)
    }
}

/// The part of `(+12.5c)` after the opening parenthesis.
fn parse_cents(chars: &mut Peekable<Chars>) -> Option<f64> {
    let sign = match chars.next()? {
        '+' => 1.0,
        '-' => -1.0,
        _ => return None,
    };
    let mut number = take_digits(chars);
    if number.is_empty() {
        return None;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        let fraction = take_digits(chars);
        if fraction.is_empty() {
            return None;
        }
        number.push('.');
        number.push_str(&fraction);
    }
    if chars.next()? != 'c' || chars.next()? != ')' {
        return None;
    }
    Some(sign * number.parse::<f64>().ok()?)
}

fn take_digits(chars: &mut Peekable<Chars>) -> String {
    let mut digits = String::new();
    while let Some(&ch) = chars.peek() {
        if !ch.is_ascii_digit() {
            break;
        }
        digits.push(ch);
        chars.next();
    }
    digits
}
