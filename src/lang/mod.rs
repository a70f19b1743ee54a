// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

pub mod ast;
pub mod lexer;
pub mod span;

pub mod interpreter;
pub mod pretty;
pub mod primops;
pub mod scope;
pub mod value;

pub use interpreter::*;
pub use scope::*;
pub use value::*;
