// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

use std::fmt;
use std::rc::Rc;

use super::ast::Block;
use super::interpreter::{IntpErr, IntpErrInfo, InterpreterResult};
use crate::wave::AudioWave;

/// Tokens of a program and the results of evaluating them.
///
/// The absence of a result is represented by `Option::None` wherever a result may be
/// missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A bare word, e.g. a keyword, a note name or a number.
    Word(String),
    /// A quoted string literal.
    Str(String),
    Wave(Rc<AudioWave>),
    /// A block that is still to be evaluated.
    Block(Rc<Block>),
}

/// The shapes a value can have, used for describing which operands a keyword accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// No value at all.
    Nothing,
    Word,
    Str,
    Wave,
    Block,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Nothing => "nothing",
            Kind::Word => "word",
            Kind::Str => "string",
            Kind::Wave => "audio",
            Kind::Block => "block",
        };
        write!(f, "{}", name)
    }
}

impl Kind {
    /// Everything a block can evaluate to.
    pub const ANY: &'static [Kind] = &[Kind::Nothing, Kind::Word, Kind::Str, Kind::Wave];
    /// Values that can be bound to a variable.
    pub const BINDABLE: &'static [Kind] = &[Kind::Word, Kind::Str, Kind::Wave];
    pub const TEXT: &'static [Kind] = &[Kind::Word, Kind::Str];
    pub const OPTIONAL_TEXT: &'static [Kind] = &[Kind::Nothing, Kind::Word, Kind::Str];
    pub const WAVE: &'static [Kind] = &[Kind::Nothing, Kind::Wave];

    pub fn of(value: Option<&Value>) -> Kind {
        match value {
            None => Kind::Nothing,
            Some(Value::Word(_)) => Kind::Word,
            Some(Value::Str(_)) => Kind::Str,
            Some(Value::Wave(_)) => Kind::Wave,
            Some(Value::Block(_)) => Kind::Block,
        }
    }
}

impl Value {
    pub fn word<S: Into<String>>(text: S) -> Self {
        Value::Word(text.into())
    }

    pub fn kind(&self) -> Kind {
        Kind::of(Some(self))
    }

    /// The text of a word or string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Word(text) | Value::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this is the bare word `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Value::Word(w) if w == word)
    }
}

/// Truthiness in the language: anything that is a value at all.
pub fn truth(condition: bool) -> Option<Value> {
    if condition {
        Some(Value::word("true"))
    } else {
        None
    }
}

/// Parse a decimal number, also accepting fractions such as `3/4`.
pub fn parse_number(text: &str) -> InterpreterResult<f64> {
    let invalid = || IntpErr::new(IntpErrInfo::InvalidNumber(text.to_string()));
    let parse = |part: &str| part.trim().parse::<f64>().map_err(|_| invalid());
    match text.split_once('/') {
        Some((numerator, denominator)) => {
            let denominator = parse(denominator)?;
            if denominator == 0.0 {
                return Err(IntpErr::new(IntpErrInfo::DivisionByZero));
            }
            Ok(parse(numerator)? / denominator)
        }
        None => parse(text),
    }
}

/// Render a number the way the language spells numbers: integral values drop the
/// fractional part so that they can be used as counts and indices again.
pub fn format_number(number: f64) -> String {
    format!("{}", number)
}
