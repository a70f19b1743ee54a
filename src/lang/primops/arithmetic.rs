//! Arithmetic, bitwise and logical operators.

use crate::lang::interpreter::*;
use crate::lang::scope::ScopeId;
use crate::lang::value::{format_number, parse_number, truth, Kind, Value};

fn number(intp: &mut Interpreter, scope: ScopeId, operand: &Value) -> InterpreterResult<f64> {
    match intp.expect(scope, operand, Kind::TEXT)? {
        Some(value) => parse_number(value.as_text().unwrap_or_default()),
        None => Err(IntpErr::new(IntpErrInfo::InvalidNumber(String::new()))),
    }
}

/// Numbers take part in bitwise operations with their fractional part cut off.
fn integer(intp: &mut Interpreter, scope: ScopeId, operand: &Value) -> InterpreterResult<i64> {
    let number = number(intp, scope, operand)?;
    if !number.is_finite() {
        return Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
            "{} has no integer part",
            number
        ))));
    }
    Ok(number.trunc() as i64)
}

fn is_set(intp: &mut Interpreter, scope: ScopeId, operand: &Value) -> InterpreterResult<bool> {
    Ok(intp.expect(scope, operand, Kind::OPTIONAL_TEXT)?.is_some())
}

fn shift_amount(amount: i64) -> InterpreterResult<u32> {
    if (0..64).contains(&amount) {
        Ok(amount as u32)
    } else {
        Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
            "cannot shift by {} bits",
            amount
        ))))
    }
}

fn number_result(number: f64) -> InterpreterResult<Option<Value>> {
    Ok(Some(Value::Word(format_number(number))))
}

fn integer_result(number: i64) -> InterpreterResult<Option<Value>> {
    Ok(Some(Value::Word(number.to_string())))
}

/// `op <a> <operator> <b>` or `op <operator> <a>`.
///
/// Numeric results come back as words. Logical operators treat anything but the
/// absence of a value as true and return `true` or nothing.
pub fn op(intp: &mut Interpreter, args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[2, 3])?;
    let scope = args.scope();
    let operands = args.rest();
    if operands.len() == 2 {
        return unary(intp, scope, &operands[0], &operands[1]);
    }

    let (a, b) = (&operands[0], &operands[2]);
    let operator = match intp.expect(scope, &operands[1], Kind::TEXT)? {
        Some(value) => value.as_text().unwrap_or_default().to_string(),
        None => String::new(),
    };
    match operator.as_str() {
        "+" | "-" | "*" | "/" | "//" | "%" | "mod" | "**" => {
            let a = number(intp, scope, a)?;
            let b = number(intp, scope, b)?;
            if b == 0.0 && matches!(operator.as_str(), "/" | "//" | "%" | "mod") {
                return Err(IntpErr::new(IntpErrInfo::DivisionByZero));
            }
            number_result(match operator.as_str() {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                "/" => a / b,
                "//" => (a / b).floor(),
                "%" => a % b,
                "mod" => a - b * (a / b).floor(),
                _ => a.powf(b),
            })
        }
        "&" | "|" | "^" | "<<" | ">>" => {
            let a = integer(intp, scope, a)?;
            let b = integer(intp, scope, b)?;
            integer_result(match operator.as_str() {
                "&" => a & b,
                "|" => a | b,
                "^" => a ^ b,
                "<<" => a.wrapping_shl(shift_amount(b)?),
                _ => a >> shift_amount(b)?,
            })
        }
        "and" | "or" | "xor" | "nand" | "nor" | "xnor" => {
            let a = is_set(intp, scope, a)?;
            let b = is_set(intp, scope, b)?;
            Ok(truth(match operator.as_str() {
                "and" => a && b,
                "or" => a || b,
                "xor" => a != b,
                "nand" => !(a && b),
                "nor" => !(a || b),
                _ => a == b,
            }))
        }
        _ => Err(IntpErr::new(IntpErrInfo::UnknownOperator {
            keyword: "op".to_string(),
            operator,
        })),
    }
}

fn unary(intp: &mut Interpreter, scope: ScopeId, operator: &Value, operand: &Value) -> InterpreterResult<Option<Value>> {
    let operator = match intp.expect(scope, operator, Kind::TEXT)? {
        Some(value) => value.as_text().unwrap_or_default().to_string(),
        None => String::new(),
    };
    match operator.as_str() {
        "not" => Ok(truth(!is_set(intp, scope, operand)?)),
        "abs" => number_result(number(intp, scope, operand)?.abs()),
        "log" => {
            let x = number(intp, scope, operand)?;
            if x <= 0.0 {
                return Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
                    "logarithm of {} is undefined",
                    format_number(x)
                ))));
            }
            number_result(x.ln())
        }
        "~" => integer_result(!integer(intp, scope, operand)?),
        _ => Err(IntpErr::new(IntpErrInfo::UnknownOperator {
            keyword: "op".to_string(),
            operator,
        })),
    }
}
