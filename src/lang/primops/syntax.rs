// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Keywords that define special syntax with deep integration in how evaluation is handled.
//!
//! Control flow does not evaluate the chosen branch itself. It hands back an opaque
//! block holding the branch's lines, which the evaluator then runs in the caller's
//! scope, so declarations made by a branch outlive it.

use std::rc::Rc;

use crate::lang::ast::{Block, Line};
use crate::lang::interpreter::*;
use crate::lang::scope::{Binding, Function, ScopeId};
use crate::lang::value::{Kind, Value};

/// A pending block that evaluates `branch` in the scope of the keyword's caller.
fn pending(branch: &Value) -> Option<Value> {
    let lines = match branch {
        Value::Block(block) => block.lines().to_vec(),
        other => vec![Line::new(vec![other.clone()])],
    };
    Some(Value::Block(Rc::new(Block::opaque(lines))))
}

fn syntax_error(keyword: &str, message: &str) -> IntpErr {
    IntpErr::new(IntpErrInfo::Syntax {
        keyword: keyword.to_string(),
        message: message.to_string(),
    })
}

/// `var <name>` reads a variable, `var <name> := <value>` declares it in the current
/// scope and `var <name> = <value>` assigns the innermost existing declaration.
pub fn var(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[1, 3])?;
    let scope = args.scope();
    let name = args.text(intp)?;
    if args.is_empty() {
        return intp.read_var(scope, &name).map(Some);
    }

    let operator = args.text(intp)?;
    let binding = match args.value(intp, Kind::BINDABLE)? {
        Some(value) => Binding::from_value(value)?,
        None => return Err(syntax_error("var", "missing value")),
    };
    match operator.as_str() {
        ":=" => intp.scopes_mut().declare(scope, name, binding),
        "=" => {
            if intp.scopes_mut().assign(scope, &name, binding).is_err() {
                return Err(IntpErr::new(IntpErrInfo::UndeclaredName(name)));
            }
        }
        _ => {
            return Err(IntpErr::new(IntpErrInfo::UnknownOperator {
                keyword: "var".to_string(),
                operator,
            }))
        }
    }
    Ok(None)
}

/// Declaring: `func [!] <name> [: <params>...] (:= | =) <body>`.
/// Calling: `func <name> [: <args>...]`.
///
/// A function declared with `!` is unclean: calls are nested in the caller's scope
/// instead of the scope the function was declared in, so the body sees the caller's
/// variables. Arguments are evaluated at the call site before the call.
pub fn func(intp: &mut Interpreter, args: Args) -> InterpreterResult<Option<Value>> {
    let operands = args.rest();
    let assignment = operands
        .iter()
        .position(|operand| operand.is_word(":=") || operand.is_word("="));
    match assignment {
        Some(position) => declare_function(intp, args.scope(), operands, position),
        None => call_function(intp, args.scope(), operands),
    }
}

fn declare_function(
    intp: &mut Interpreter,
    scope: ScopeId,
    operands: &[Value],
    position: usize,
) -> InterpreterResult<Option<Value>> {
    let (unclean, head) = match operands.first() {
        Some(first) if first.is_word("!") => (true, &operands[1..position]),
        _ => (false, &operands[..position]),
    };
    let name = match head.first().and_then(Value::as_text) {
        Some(name) => name.to_string(),
        None => return Err(syntax_error("func", "expected a function name")),
    };

    let mut params: Vec<String> = Vec::new();
    match head.get(1) {
        None => {}
        Some(colon) if colon.is_word(":") => {
            for param in &head[2..] {
                let param = match param {
                    Value::Word(param) => param,
                    _ => return Err(syntax_error("func", "parameters must be plain words")),
                };
                if params.contains(param) {
                    return Err(syntax_error(
                        "func",
                        &format!("duplicate parameter '{}'", param),
                    ));
                }
                params.push(param.clone());
            }
        }
        Some(_) => return Err(syntax_error("func", "expected ':' before the parameters")),
    }

    let body = match &operands[position + 1..] {
        [body] => body.clone(),
        [] => return Err(syntax_error("func", "missing function body")),
        _ => return Err(syntax_error("func", "expected a single body after the assignment")),
    };
    let function = Rc::new(Function {
        params,
        body,
        captured: if unclean { None } else { Some(scope) },
    });

    if operands[position].is_word(":=") {
        intp.scopes_mut().declare(scope, name, Binding::Func(function));
    } else if intp
        .scopes_mut()
        .assign(scope, &name, Binding::Func(function))
        .is_err()
    {
        return Err(IntpErr::new(IntpErrInfo::UndeclaredName(name)));
    }
    Ok(None)
}

fn call_function(intp: &mut Interpreter, scope: ScopeId, operands: &[Value]) -> InterpreterResult<Option<Value>> {
    let name = match operands.first().and_then(Value::as_text) {
        Some(name) => name,
        None => return Err(syntax_error("func", "expected a function name")),
    };
    let function = match intp.scopes().read(scope, name) {
        Some(Binding::Func(function)) => Rc::clone(function),
        Some(_) => {
            return Err(IntpErr::new(IntpErrInfo::TypeMismatch(format!(
                "'{}' is not a function",
                name
            ))))
        }
        None => return Err(IntpErr::new(IntpErrInfo::UndeclaredName(name.to_string()))),
    };

    let arguments = match operands.get(1) {
        None => &[][..],
        Some(colon) if colon.is_word(":") => &operands[2..],
        Some(_) => return Err(syntax_error("func", "expected ':' before the arguments")),
    };
    if arguments.len() != function.params.len() {
        return Err(IntpErr::new(IntpErrInfo::Arity {
            function: name.to_string(),
            expected: function.params.len(),
            found: arguments.len(),
        }));
    }

    let mut values = Vec::with_capacity(arguments.len());
    for argument in arguments {
        match intp.expect(scope, argument, Kind::BINDABLE)? {
            Some(value) => values.push(Binding::from_value(value)?),
            None => return Err(syntax_error("func", "argument evaluated to nothing")),
        }
    }

    let frame = intp.scopes_mut().child(function.captured.unwrap_or(scope));
    for (param, value) in function.params.iter().zip(values) {
        intp.scopes_mut().declare(frame, param.clone(), value);
    }
    match &function.body {
        Value::Block(body) => intp.process(body, frame),
        other => intp.eval_line(vec![other.clone()], frame),
    }
}

/// `loop <count> [<variable>] <block>`: repeat the block, optionally declaring the
/// iteration index in each repetition's scope.
pub fn loop_(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[2, 3])?;
    let count = args.number(intp)?;
    if count < 0.0 || count.fract() != 0.0 || !count.is_finite() {
        return Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
            "cannot loop {} times",
            count
        ))));
    }
    let variable = if args.remaining() == 2 {
        Some(args.text(intp)?)
    } else {
        None
    };
    let body = match args.raw()? {
        Value::Block(body) => Rc::clone(body),
        other => {
            return Err(IntpErr::new(IntpErrInfo::UnexpectedKind {
                expected: vec![Kind::Block],
                found: other.kind(),
            }))
        }
    };

    let lines = (0..count as u64)
        .map(|index| {
            let iteration = match &variable {
                None => Rc::clone(&body),
                Some(variable) => {
                    let mut lines = vec![Line::new(vec![
                        Value::word("var"),
                        Value::Word(variable.clone()),
                        Value::word(":="),
                        Value::Word(index.to_string()),
                    ])];
                    lines.extend(body.lines().iter().cloned());
                    Rc::new(Block::new(lines))
                }
            };
            Line::new(vec![Value::Block(iteration)])
        })
        .collect();
    Ok(Some(Value::Block(Rc::new(Block::opaque(lines)))))
}

/// `while <condition> <block>`: run the block in the current scope as long as the
/// condition evaluates to anything.
pub fn while_(intp: &mut Interpreter, args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[2])?;
    let scope = args.scope();
    let operands = args.rest();
    let body = match &operands[1] {
        Value::Block(body) => Rc::clone(body),
        other => {
            return Err(IntpErr::new(IntpErrInfo::UnexpectedKind {
                expected: vec![Kind::Block],
                found: other.kind(),
            }))
        }
    };
    while intp.expect(scope, &operands[0], Kind::ANY)?.is_some() {
        intp.process(&body, scope)?;
    }
    Ok(None)
}

/// `if <cond> <branch> [elif <cond> <branch>]... [else <branch>]`
pub fn if_(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    loop {
        let condition = args.truthy(intp)?;
        let branch = args.raw()?;
        if condition {
            return Ok(pending(branch));
        }
        if args.is_empty() {
            return Ok(None);
        }
        let keyword = args.text(intp)?;
        match keyword.as_str() {
            "elif" => continue,
            "else" => {
                let branch = args.raw()?;
                args.done()?;
                return Ok(pending(branch));
            }
            _ => {
                return Err(IntpErr::new(IntpErrInfo::UnknownOperator {
                    keyword: "if".to_string(),
                    operator: keyword,
                }))
            }
        }
    }
}

/// `switch <value> [case <key> <branch>]... [default <branch>]`: run the branch of the
/// first case whose key equals the value.
pub fn switch(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    let value = args.optional_text(intp)?;
    while !args.is_empty() {
        let label = args.text(intp)?;
        match label.as_str() {
            "case" => {
                let key = args.optional_text(intp)?;
                let branch = args.raw()?;
                if key == value {
                    return Ok(pending(branch));
                }
            }
            "default" => {
                let branch = args.raw()?;
                if !args.is_empty() {
                    return Err(syntax_error("switch", "'default' must be the last case"));
                }
                return Ok(pending(branch));
            }
            _ => {
                return Err(IntpErr::new(IntpErrInfo::UnknownOperator {
                    keyword: "switch".to_string(),
                    operator: label,
                }))
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use crate::lang::interpreter::test::{eval, eval_err, printed};
    use crate::lang::interpreter::{ErrorCategory, IntpErrInfo};
    use crate::lang::value::{Kind, Value};

    fn word(text: &str) -> Option<Value> {
        Some(Value::word(text))
    }

    #[test]
    fn test_var() {
        assert_eq!(eval("var x := 5; var x;"), word("5"));
        assert_eq!(eval("var x := \"quoted\"; var x;"), word("quoted"));
        assert_eq!(eval("var x := {op 2 * 3;}; var x;"), word("6"));
        assert_eq!(eval("var bpm;"), word("120"));
        assert_eq!(
            eval_err("var y;").info(),
            &IntpErrInfo::UndeclaredName("y".to_string())
        );
        assert_eq!(eval_err("var y = 1;").category(), ErrorCategory::Name);
        assert_eq!(eval_err("var y += 1;").category(), ErrorCategory::Value);
        assert_eq!(eval_err("var y :=;").category(), ErrorCategory::Runtime);
    }

    #[test]
    fn test_scoping() {
        // declarations stay inside their block, assignments reach the declaring scope
        assert_eq!(
            printed("var x := outer; { var x := inner; print {var x;}; }; print {var x;};"),
            "innerouter"
        );
        assert_eq!(
            printed("var x := 1; { var x = 2; }; print {var x;};"),
            "2"
        );
        assert_eq!(eval_err("{ var y := 1; }; var y;").category(), ErrorCategory::Name);
    }

    #[test]
    fn test_var_holding_audio() {
        match eval("var riff := {A; B;}; seq {var riff;} {var riff;};") {
            Some(Value::Wave(wave)) => assert_eq!(wave.len(), 4 * 22050),
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_func() {
        assert_eq!(
            eval("func double : x := { op {var x;} * 2; }; func double : 21;"),
            word("42")
        );
        assert_eq!(
            eval("func answer := 42Hz; func answer;").map(|v| v.kind()),
            Some(Kind::Wave)
        );
        assert_eq!(
            eval("func greet : who := { string hello {var who;}; }; func greet : {string world;};"),
            Some(Value::Str("helloworld".to_string()))
        );
        assert!(matches!(
            eval_err("func f : x := {var x;}; func f;").info(),
            IntpErrInfo::Arity { expected: 1, found: 0, .. }
        ));
        assert_eq!(eval_err("func nope;").category(), ErrorCategory::Name);
        assert_eq!(eval_err("var f := 1; func f;").category(), ErrorCategory::Type);
        assert_eq!(eval_err("func f := {A;}; var f;").category(), ErrorCategory::Type);
        assert_eq!(eval_err("func f : x x := {A;};").category(), ErrorCategory::Runtime);
    }

    #[test]
    fn test_parameters_are_local() {
        assert_eq!(
            eval_err("func f : x := {var x;}; func f : 1; var x;").category(),
            ErrorCategory::Name
        );
    }

    #[test]
    fn test_clean_and_unclean_functions() {
        let program = "var x := outer; \
                       func clean := { print {var x;}; }; \
                       func ! unclean := { print {var x;}; }; \
                       { var x := inner; func clean; func unclean; };";
        assert_eq!(printed(program), "outerinner");
    }

    #[test]
    fn test_recursive_function() {
        let program = "func count : n := { \
                           if {cmp {var n;} > 0;} { \
                               string {var n;} {func count : {op {var n;} - 1;};}; \
                           }; \
                       }; \
                       func count : 3;";
        assert_eq!(eval(program), Some(Value::Str("321".to_string())));
    }

    #[test]
    fn test_loop() {
        assert_eq!(eval("loop 3 { string ab; };"), Some(Value::Str("ababab".to_string())));
        assert_eq!(eval("loop 3 i { string {var i;}; };"), Some(Value::Str("012".to_string())));
        assert_eq!(eval("loop 0 { A; };"), None);
        // the index is not visible after the loop
        assert_eq!(eval_err("loop 2 i { .; }; var i;").category(), ErrorCategory::Name);
        assert_eq!(eval_err("loop 1.5 { A; };").category(), ErrorCategory::Value);
        assert_eq!(eval_err("loop 2 A;").category(), ErrorCategory::Type);
    }

    #[test]
    fn test_loop_of_notes() {
        match eval("var duration = 1/2; loop 4 { A; };") {
            Some(Value::Wave(wave)) => assert_eq!(wave.len(), 4 * 11025),
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_while() {
        let program = "var n := 3; var out := \"\"; \
                       while {cmp {var n;} > 0;} { \
                           var out = {string {var out;} {var n;};}; \
                           var n = {op {var n;} - 1;}; \
                       }; \
                       var out;";
        assert_eq!(eval(program), word("321"));
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("if true {string yes;};"), Some(Value::Str("yes".to_string())));
        assert_eq!(eval("if {.;} {string yes;};"), None);
        assert_eq!(
            eval("if {.;} {string a;} elif x {string b;} else {string c;};"),
            Some(Value::Str("b".to_string()))
        );
        assert_eq!(
            eval("if {.;} {string a;} elif {.;} {string b;} else {string c;};"),
            Some(Value::Str("c".to_string()))
        );
        // branches run in the caller's scope
        assert_eq!(printed("if true {var z := 1;}; print {var z;};"), "1");
        assert_eq!(eval_err("if {.;} a otherwise b;").category(), ErrorCategory::Value);
    }

    #[test]
    fn test_switch() {
        let program = |value: &str| {
            format!(
                "switch {} case 1 {{string one;}} case 2 {{string two;}} default {{string many;}};",
                value
            )
        };
        assert_eq!(eval(&program("2")), Some(Value::Str("two".to_string())));
        assert_eq!(eval(&program("7")), Some(Value::Str("many".to_string())));
        assert_eq!(eval("switch 3 case 1 {string one;};"), None);
        assert_eq!(
            eval("switch {.;} case 1 {string one;} case {.;} {string none;};"),
            Some(Value::Str("none".to_string()))
        );
        assert_eq!(eval_err("switch 1 default {.;} case 1 {.;};").category(), ErrorCategory::Runtime);
        assert_eq!(eval_err("switch 1 cases 1 {.;};").category(), ErrorCategory::Value);
    }
}
