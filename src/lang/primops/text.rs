// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Keywords operating on text.

use crate::lang::interpreter::*;
use crate::lang::value::{parse_number, truth, Value};

/// `string a b ...`: concatenate the operands into a string literal, skipping operands
/// that evaluate to nothing.
pub fn string(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    let mut result = String::new();
    while !args.is_empty() {
        if let Some(text) = args.optional_text(intp)? {
            result.push_str(&text);
        }
    }
    Ok(Some(Value::Str(result)))
}

/// `strop <mode> <text> ...`
///
/// - `contains <text> <sub>`: `true` if `sub` occurs in `text`
/// - `slice <text> <from> <to>`: the characters in `from..to`, where negative indices
///   count from the end and out of range indices are clamped
/// - `find <text> <sub>`: character index of the first occurrence of `sub`, or `-1`
/// - `replace <text> <from> <to>`: replace all occurrences of `from`
/// - `strip <text>`: remove leading and trailing whitespace
pub fn strop(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    let mode = args.text(intp)?;
    let expected = match mode.as_str() {
        "strip" => 1,
        "contains" | "find" => 2,
        "slice" | "replace" => 3,
        _ => {
            return Err(IntpErr::new(IntpErrInfo::UnknownOperator {
                keyword: "strop".to_string(),
                operator: mode,
            }))
        }
    };
    args.expect_count(&[expected])?;

    let text = args.text(intp)?;
    let result = match mode.as_str() {
        "contains" => {
            let sub = args.text(intp)?;
            return Ok(truth(text.contains(&sub)));
        }
        "slice" => {
            let from = index(&args.text(intp)?)?;
            let to = index(&args.text(intp)?)?;
            slice(&text, from, to)
        }
        "find" => {
            let sub = args.text(intp)?;
            match text.find(&sub) {
                Some(offset) => text[..offset].chars().count().to_string(),
                None => "-1".to_string(),
            }
        }
        "replace" => {
            let from = args.text(intp)?;
            let to = args.text(intp)?;
            text.replace(&from, &to)
        }
        _ => text.trim().to_string(),
    };
    Ok(Some(Value::Word(result)))
}

fn index(text: &str) -> InterpreterResult<i64> {
    let number = parse_number(text)?;
    if !number.is_finite() {
        return Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
            "'{}' is not an index",
            text
        ))));
    }
    Ok(number.trunc() as i64)
}

/// Characters `from..to`, with indices interpreted relative to the end when negative.
fn slice(text: &str, from: i64, to: i64) -> String {
    let len = text.chars().count() as i64;
    let clamp = |index: i64| {
        let index = if index < 0 { index + len } else { index };
        index.max(0).min(len) as usize
    };
    let (from, to) = (clamp(from), clamp(to));
    if from >= to {
        return String::new();
    }
    text.chars().skip(from).take(to - from).collect()
}

#[cfg(test)]
mod test {
    use super::slice;
    use crate::lang::interpreter::test::{eval, eval_err};
    use crate::lang::interpreter::{ErrorCategory, IntpErrInfo};
    use crate::lang::value::Value;

    fn word(text: &str) -> Option<Value> {
        Some(Value::word(text))
    }

    #[test]
    fn test_string() {
        assert_eq!(eval("string a b c;"), Some(Value::Str("abc".to_string())));
        assert_eq!(eval("string;"), Some(Value::Str(String::new())));
        assert_eq!(
            eval("string \"with space \" {var bpm;} {.;};"),
            Some(Value::Str("with space 120".to_string()))
        );
        assert_eq!(eval_err("string A {A;};").category(), ErrorCategory::Type);
    }

    #[test]
    fn test_contains() {
        assert_eq!(eval("strop contains melody lod;"), word("true"));
        assert_eq!(eval("strop contains melody xyz;"), None);
    }

    #[test]
    fn test_slice() {
        assert_eq!(slice("melody", 1, 3), "el");
        assert_eq!(slice("melody", -3, 6), "ody");
        assert_eq!(slice("melody", 0, -1), "melod");
        assert_eq!(slice("melody", 4, 100), "dy");
        assert_eq!(slice("melody", 4, 2), "");
        assert_eq!(slice("äöü", 1, 2), "ö");
        assert_eq!(eval("strop slice melody 0 3;"), word("mel"));
        assert_eq!(eval("strop slice melody -2 {op 3 * 2;};"), word("dy"));
    }

    #[test]
    fn test_find_replace_strip() {
        assert_eq!(eval("strop find melody o;"), word("3"));
        assert_eq!(eval("strop find \"äöü\" ü;"), word("2"));
        assert_eq!(eval("strop find melody x;"), word("-1"));
        assert_eq!(eval("strop replace banana a o;"), word("bonono"));
        assert_eq!(eval("strop strip \"  padded \";"), word("padded"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            eval_err("strop upper x;").info(),
            IntpErrInfo::UnknownOperator { .. }
        ));
        assert!(matches!(
            eval_err("strop slice x 1;").info(),
            IntpErrInfo::OperandCount { .. }
        ));
        assert_eq!(eval_err("strop slice abc a 1;").category(), ErrorCategory::Value);
    }
}
