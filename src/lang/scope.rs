// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Lexically nested variable bindings.
//!
//! Scopes live in an arena and refer to their parent by index. Functions capture the
//! index of the scope they were declared in, so a scope stays alive as long as the run
//! does, even after evaluation left it.

use std::collections::HashMap;
use std::rc::Rc;

use super::interpreter::{IntpErr, IntpErrInfo, InterpreterResult};
use super::value::{parse_number, Value};
use crate::note::Pitch;
use crate::wave::AudioWave;

/// Settings every program starts with, stored as text like any other variable.
pub const DEFAULTS: &[(&str, &str)] = &[
    ("octave", "4"),
    ("duration", "1"),
    ("bpm", "120"),
    ("tuning", "440"),
    ("instrument", "sin"),
    ("intensity", "1"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// A user defined function.
#[derive(Debug, PartialEq)]
pub struct Function {
    pub params: Vec<String>,
    /// Either a block whose lines run in the call's scope, or a single token.
    pub body: Value,
    /// The scope calls are nested in; `None` for unclean functions, which are nested in
    /// the caller's scope instead.
    pub captured: Option<ScopeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Text(String),
    Wave(Rc<AudioWave>),
    Func(Rc<Function>),
}

impl Binding {
    /// Bind the result of an evaluation.
    pub fn from_value(value: Value) -> InterpreterResult<Binding> {
        match value {
            Value::Word(text) | Value::Str(text) => Ok(Binding::Text(text)),
            Value::Wave(wave) => Ok(Binding::Wave(wave)),
            Value::Block(_) => Err(IntpErr::new(IntpErrInfo::TypeMismatch(
                "blocks cannot be bound to variables".to_string(),
            ))),
        }
    }
}

#[derive(Debug)]
struct Frame {
    bindings: HashMap<String, Binding>,
    parent: Option<ScopeId>,
}

#[derive(Debug)]
pub struct ScopeTree {
    frames: Vec<Frame>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree consisting of the root scope with the default settings.
    pub fn new() -> Self {
        let bindings = DEFAULTS
            .iter()
            .map(|(key, value)| (key.to_string(), Binding::Text(value.to_string())))
            .collect();
        Self {
            frames: vec![Frame {
                bindings,
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a new scope nested in `parent`.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.frames.len());
        self.frames.push(Frame {
            bindings: HashMap::new(),
            parent: Some(parent),
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.frames[scope.0].parent
    }

    /// Look up `key` in `scope` and its ancestors.
    pub fn read(&self, scope: ScopeId, key: &str) -> Option<&Binding> {
        self.defining_scope(scope, key)
            .and_then(|id| self.frames[id.0].bindings.get(key))
    }

    /// Bind `key` in `scope` itself, shadowing any outer binding.
    pub fn declare(&mut self, scope: ScopeId, key: String, value: Binding) {
        self.frames[scope.0].bindings.insert(key, value);
    }

    /// Overwrite the innermost existing binding of `key`.
    ///
    /// Hands the value back if no scope on the chain binds `key`.
    pub fn assign(&mut self, scope: ScopeId, key: &str, value: Binding) -> Result<(), Binding> {
        match self.defining_scope(scope, key) {
            Some(id) => {
                self.frames[id.0].bindings.insert(key.to_string(), value);
                Ok(())
            }
            None => Err(value),
        }
    }

    /// Read a variable holding text, e.g. one of the settings.
    pub fn read_text(&self, scope: ScopeId, key: &str) -> InterpreterResult<&str> {
        match self.read(scope, key) {
            Some(Binding::Text(text)) => Ok(text),
            Some(_) => Err(IntpErr::new(IntpErrInfo::TypeMismatch(format!(
                "variable '{}' does not hold text",
                key
            )))),
            None => Err(IntpErr::new(IntpErrInfo::UndeclaredName(key.to_string()))),
        }
    }

    pub fn read_number(&self, scope: ScopeId, key: &str) -> InterpreterResult<f64> {
        parse_number(self.read_text(scope, key)?)
    }

    /// Resolve a word to the frequency it denotes in `scope`, if it is a note at all.
    ///
    /// Besides note names this accepts `_` (a rest, at 0 Hz) and explicit frequencies
    /// such as `440Hz`. Relative octaves and the pitch of A4 come from the `octave` and
    /// `tuning` settings.
    pub fn note_to_freq(&self, scope: ScopeId, note: &str) -> InterpreterResult<Option<f64>> {
        if note == "_" {
            return Ok(Some(0.0));
        }
        if note.ends_with("Hz") {
            let number = note.trim_end_matches(|ch| ch == 'H' || ch == 'z');
            return match number.trim().parse::<f64>() {
                Ok(frequency) => Ok(Some(frequency)),
                Err(_) => Err(IntpErr::new(IntpErrInfo::InvalidNumber(note.to_string()))),
            };
        }
        match Pitch::parse(note) {
            Some(pitch) => {
                let tuning = self.read_number(scope, "tuning")?;
                let octave = self.read_number(scope, "octave")?;
                Ok(Some(pitch.frequency(tuning, octave)))
            }
            None => Ok(None),
        }
    }

    fn defining_scope(&self, scope: ScopeId, key: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if frame.bindings.contains_key(key) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }
}
