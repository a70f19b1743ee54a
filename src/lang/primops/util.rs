//! Useful functions that don't have any other place to be.

use crate::lang::interpreter::*;
use crate::lang::value::{Kind, Value};

/// Replace the escape sequences `print` understands by the characters they denote.
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\b", "\u{8}")
        .replace("\\r", "\r")
}

/// Print all arguments without separators.
pub fn print(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    while !args.is_empty() {
        let text = args.text(intp)?;
        intp.write_output(&unescape(&text))?;
    }
    Ok(None)
}

/// Evaluate all arguments for their side effects and forget the results.
pub fn discard(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    while !args.is_empty() {
        args.value(intp, Kind::ANY)?;
    }
    Ok(None)
}
