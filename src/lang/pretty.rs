// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

use super::ast::{Block, Line};
use super::value::Value;
use std::fmt::Write;

struct PrettyPrinter {
    output: String,
    indent: usize,
}

impl PrettyPrinter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn print(&mut self, value: &Value) {
        match value {
            Value::Word(x) => self.output.push_str(x),
            Value::Str(x) => {
                self.output.push('"');
                self.output.push_str(&x.replace('"', "\\\""));
                self.output.push('"');
            }
            Value::Wave(wave) => {
                // writing into a String cannot fail
                let _ = write!(
                    &mut self.output,
                    "<<<audio: {} samples>>>",
                    wave.len()
                );
            }
            Value::Block(block) => {
                self.output.push_str("{\n");
                self.indent += 4;
                self.print_lines(block.lines());
                self.indent -= 4;
                self.print_indent();
                self.output.push('}');
            }
        }
    }

    fn print_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push(' ');
        }
    }

    fn print_lines(&mut self, lines: &[Line]) {
        for line in lines {
            self.print_indent();
            for (index, token) in line.tokens().iter().enumerate() {
                if index > 0 {
                    self.output.push(' ');
                }
                self.print(token);
            }
            self.output.push_str(";\n");
        }
    }
}

/// Render a block in source syntax, one line per line and nested blocks indented.
pub fn print_block(block: &Block) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_lines(block.lines());
    printer.output
}

/// Render a single value, e.g. the result of evaluating a program.
pub fn print_value(value: &Value) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print(value);
    printer.output
}
