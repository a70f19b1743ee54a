// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The tree the lexer produces: blocks of lines of tokens.

use super::value::Value;

/// A sequence of lines evaluated one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    lines: Vec<Line>,
    /// Opaque blocks are evaluated in the scope of whoever evaluates them instead of
    /// opening a child scope. Only the root block and blocks synthesized by control
    /// flow keywords are opaque.
    opaque: bool,
}

impl Block {
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines,
            opaque: false,
        }
    }

    pub fn opaque(lines: Vec<Line>) -> Self {
        Self {
            lines,
            opaque: true,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A single statement: a non-empty sequence of tokens terminated by `;`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    tokens: Vec<Value>,
}

impl Line {
    pub fn new(tokens: Vec<Value>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Value] {
        &self.tokens
    }
}
