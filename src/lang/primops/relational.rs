//! Comparisons.

use crate::lang::interpreter::*;
use crate::lang::scope::ScopeId;
use crate::lang::value::{parse_number, truth, Kind, Value};

fn number(intp: &mut Interpreter, scope: ScopeId, operand: &Value) -> InterpreterResult<f64> {
    let text = match intp.expect(scope, operand, Kind::TEXT)? {
        Some(Value::Word(text)) | Some(Value::Str(text)) => text,
        _ => String::new(),
    };
    parse_number(&text)
}

/// `cmp <a> <operator> <b>`: numeric ordering with `> >= < <=`, textual equality with
/// `== !=`. Results are `true` or nothing.
///
/// Equality also accepts operands evaluating to nothing, which are only equal to each
/// other.
pub fn cmp(intp: &mut Interpreter, args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[3])?;
    let scope = args.scope();
    let operands = args.rest();
    let operator = match intp.expect(scope, &operands[1], Kind::TEXT)? {
        Some(value) => value.as_text().unwrap_or_default().to_string(),
        None => String::new(),
    };

    match operator.as_str() {
        "==" | "!=" => {
            let a = intp.expect(scope, &operands[0], Kind::OPTIONAL_TEXT)?;
            let b = intp.expect(scope, &operands[2], Kind::OPTIONAL_TEXT)?;
            let equal = a.as_ref().and_then(Value::as_text) == b.as_ref().and_then(Value::as_text);
            Ok(truth(equal == (operator == "==")))
        }
        ">" | ">=" | "<" | "<=" => {
            let a = number(intp, args.scope(), &operands[0])?;
            let b = number(intp, args.scope(), &operands[2])?;
            Ok(truth(match operator.as_str() {
                ">" => a > b,
                ">=" => a >= b,
                "<" => a < b,
                _ => a <= b,
            }))
        }
        _ => Err(IntpErr::new(IntpErrInfo::UnknownOperator {
            keyword: "cmp".to_string(),
            operator,
        })),
    }
}

#[cfg(test)]
mod test {
    use crate::lang::interpreter::test::{eval, eval_err};
    use crate::lang::interpreter::{ErrorCategory, IntpErrInfo};
    use crate::lang::value::Value;

    fn holds(program: &str) -> bool {
        match eval(program) {
            Some(Value::Word(word)) if word == "true" => true,
            None => false,
            other => panic!("expected a truth value, got {:?}", other),
        }
    }

    #[test]
    fn test_ordering() {
        assert!(holds("cmp 2 > 1;"));
        assert!(!holds("cmp 1 > 1;"));
        assert!(holds("cmp 1 >= 1;"));
        assert!(holds("cmp -3 < 1/2;"));
        assert!(!holds("cmp 3 <= 2.5;"));
        // numbers, not text
        assert!(holds("cmp 10 > 9;"));
    }

    #[test]
    fn test_equality() {
        assert!(holds("cmp abc == abc;"));
        assert!(holds("cmp abc == \"abc\";"));
        assert!(!holds("cmp abc == abd;"));
        assert!(holds("cmp abc != abd;"));
        // textual, so differently spelled numbers differ
        assert!(!holds("cmp 1 == 1.0;"));
        assert!(holds("cmp {.;} == {.;};"));
        assert!(holds("cmp {.;} != x;"));
        assert!(holds("var x := 3; cmp {var x;} == 3;"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            eval_err("cmp 1 <> 2;").info(),
            IntpErrInfo::UnknownOperator { .. }
        ));
        assert_eq!(eval_err("cmp x < 2;").category(), ErrorCategory::Value);
        assert_eq!(eval_err("cmp 1 <;").category(), ErrorCategory::Runtime);
    }
}
