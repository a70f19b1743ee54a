// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The keywords of the language.

mod arithmetic;
mod audio;
mod relational;
mod syntax;
mod text;
mod util;

pub use arithmetic::*;
pub use audio::*;
pub use relational::*;
pub use syntax::*;
pub use text::*;
pub use util::*;

use super::interpreter::PrimFn;

/// Every keyword an interpreter starts out with.
pub const BUILTINS: &[(&str, PrimFn)] = &[
    // audio
    ("seq", seq),
    ("simult", simult),
    ("note", note),
    ("sfx", sfx),
    ("gliss", gliss),
    ("ampfx", ampfx),
    // syntax
    ("var", var),
    ("func", func),
    ("loop", loop_),
    ("while", while_),
    ("if", if_),
    ("switch", switch),
    // operators
    ("op", op),
    ("cmp", cmp),
    // text
    ("string", string),
    ("strop", strop),
    // util
    ("print", print),
    (".", discard),
];
