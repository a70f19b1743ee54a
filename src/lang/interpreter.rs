// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Evaluation of blocks, lines and the operands of keywords.

use std::collections::HashMap;
use std::io::{self, Write};
use std::{fmt, rc::Rc};

use log::trace;

use super::ast::{Block, Line};
use super::pretty;
use super::primops;
use super::scope::{Binding, ScopeId, ScopeTree};
use super::value::{parse_number, Kind, Value};
use crate::instrument::cache::NoteCache;
use crate::instrument::InstrumentTable;
use crate::wave::{AudioWave, WaveError};

pub type InterpreterResult<T> = Result<T, IntpErr>;

/// Nesting depth of block evaluations after which a program is considered runaway.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Stack left over at which a nested evaluation continues on a freshly allocated segment.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct IntpErr {
    /// The source form of the innermost line that failed.
    line: Option<String>,
    info: IntpErrInfo,
}

impl IntpErr {
    pub fn new(info: IntpErrInfo) -> Self {
        Self { line: None, info }
    }

    /// The line in which the error occurred, if known.
    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub fn info(&self) -> &IntpErrInfo {
        &self.info
    }

    pub fn category(&self) -> ErrorCategory {
        self.info.category()
    }

    fn in_line(mut self, line: &[Value]) -> Self {
        if self.line.is_none() {
            let mut printed = pretty::print_block(&Block::new(vec![Line::new(line.to_vec())]));
            printed.truncate(printed.trim_end().len());
            self.line = Some(printed);
        }
        self
    }
}

impl fmt::Display for IntpErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category(), self.info)?;
        if let Some(line) = &self.line {
            write!(f, "\n    in `{}`", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for IntpErr {}

impl From<IntpErrInfo> for IntpErr {
    fn from(info: IntpErrInfo) -> Self {
        IntpErr::new(info)
    }
}

impl From<WaveError> for IntpErr {
    fn from(err: WaveError) -> Self {
        IntpErr::new(IntpErrInfo::Wave(err))
    }
}

/// The broad classes of evaluation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// An undeclared variable was read or assigned.
    Name,
    /// An operand or result had a kind that is not accepted there.
    Type,
    /// An operand had the right kind but an unusable value.
    Value,
    /// Everything else that makes a program fail while running.
    Runtime,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Name => "name error",
            ErrorCategory::Type => "type error",
            ErrorCategory::Value => "value error",
            ErrorCategory::Runtime => "runtime error",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntpErrInfo {
    /// Variable or function was not declared in any enclosing scope.
    UndeclaredName(String),
    /// An operand evaluated to something the keyword does not accept.
    UnexpectedKind { expected: Vec<Kind>, found: Kind },
    /// The lines of a block produced results that cannot be merged.
    IncompatibleResults { first: Kind, other: Kind },
    TypeMismatch(String),
    /// The head of a line is neither a note nor a keyword.
    Uncallable(String),
    InvalidNumber(String),
    InvalidNote(String),
    /// Keyword was given an operator or mode it does not understand.
    UnknownOperator { keyword: String, operator: String },
    UnknownInstrument(String),
    InvalidValue(String),
    DivisionByZero,
    /// A keyword was called with an unsupported number of operands.
    OperandCount {
        keyword: String,
        expected: String,
        found: usize,
    },
    /// A function was called with the wrong number of arguments.
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
    Syntax { keyword: String, message: String },
    RecursionLimit(usize),
    Wave(WaveError),
    Output(String),
}

impl IntpErrInfo {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IntpErrInfo::UndeclaredName(_) => ErrorCategory::Name,
            IntpErrInfo::UnexpectedKind { .. }
            | IntpErrInfo::IncompatibleResults { .. }
            | IntpErrInfo::TypeMismatch(_) => ErrorCategory::Type,
            IntpErrInfo::Uncallable(_)
            | IntpErrInfo::InvalidNumber(_)
            | IntpErrInfo::InvalidNote(_)
            | IntpErrInfo::UnknownOperator { .. }
            | IntpErrInfo::UnknownInstrument(_)
            | IntpErrInfo::InvalidValue(_)
            | IntpErrInfo::DivisionByZero => ErrorCategory::Value,
            IntpErrInfo::OperandCount { .. }
            | IntpErrInfo::Arity { .. }
            | IntpErrInfo::Syntax { .. }
            | IntpErrInfo::RecursionLimit(_)
            | IntpErrInfo::Wave(_)
            | IntpErrInfo::Output(_) => ErrorCategory::Runtime,
        }
    }
}

impl fmt::Display for IntpErrInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntpErrInfo::UndeclaredName(name) => write!(f, "'{}' is not declared", name),
            IntpErrInfo::UnexpectedKind { expected, found } => {
                write!(f, "expected ")?;
                for (index, kind) in expected.iter().enumerate() {
                    if index > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{}", kind)?;
                }
                write!(f, ", found {}", found)
            }
            IntpErrInfo::IncompatibleResults { first, other } => {
                write!(f, "cannot merge a {} result with a {} result", first, other)
            }
            IntpErrInfo::TypeMismatch(msg) => write!(f, "{}", msg),
            IntpErrInfo::Uncallable(word) => {
                write!(f, "'{}' is neither a note name nor a keyword", word)
            }
            IntpErrInfo::InvalidNumber(text) => write!(f, "'{}' is not a number", text),
            IntpErrInfo::InvalidNote(text) => write!(f, "'{}' is not a note", text),
            IntpErrInfo::UnknownOperator { keyword, operator } => {
                write!(f, "'{}' does not understand '{}'", keyword, operator)
            }
            IntpErrInfo::UnknownInstrument(name) => write!(f, "unknown instrument '{}'", name),
            IntpErrInfo::InvalidValue(msg) => write!(f, "{}", msg),
            IntpErrInfo::DivisionByZero => write!(f, "division by zero"),
            IntpErrInfo::OperandCount {
                keyword,
                expected,
                found,
            } => write!(
                f,
                "'{}' expects {} operands, but got {}",
                keyword, expected, found
            ),
            IntpErrInfo::Arity {
                function,
                expected,
                found,
            } => write!(
                f,
                "function '{}' takes {} arguments, but got {}",
                function, expected, found
            ),
            IntpErrInfo::Syntax { keyword, message } => write!(f, "{}: {}", keyword, message),
            IntpErrInfo::RecursionLimit(depth) => {
                write!(f, "maximum nesting depth of {} exceeded", depth)
            }
            IntpErrInfo::Wave(err) => write!(f, "{}", err),
            IntpErrInfo::Output(msg) => write!(f, "could not print: {}", msg),
        }
    }
}

/// Signature of the built-in keywords.
///
/// Keywords receive their operands unevaluated and decide themselves when and how
/// often to evaluate them.
pub type PrimFn = for<'a> fn(&mut Interpreter, Args<'a>) -> InterpreterResult<Option<Value>>;

/// A keyword exposed to the interpreted language.
#[derive(Clone)]
pub enum PrimOp {
    Native(PrimFn),
    Ext(Rc<dyn Fn(&mut Interpreter, Args) -> InterpreterResult<Option<Value>>>),
}

impl PrimOp {
    fn call(&self, intp: &mut Interpreter, args: Args) -> InterpreterResult<Option<Value>> {
        match self {
            PrimOp::Native(op) => op(intp, args),
            PrimOp::Ext(op) => op(intp, args),
        }
    }
}

impl fmt::Debug for PrimOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimOp::Native(op) => write!(f, "PrimOp({:p})", *op as *const ()),
            PrimOp::Ext(op) => write!(f, "ExtClosure({:p})", Rc::as_ptr(op) as *const ()),
        }
    }
}

pub struct Interpreter {
    primops: HashMap<String, PrimOp>,
    instruments: InstrumentTable,
    notes: NoteCache,
    scopes: ScopeTree,
    /// Where `print` writes to.
    output: Box<dyn Write>,
    depth: usize,
    max_depth: usize,
}

impl Interpreter {
    /// An interpreter knowing all built-in keywords and the given instruments.
    pub fn new(instruments: InstrumentTable) -> Self {
        let mut intp = Self {
            primops: HashMap::new(),
            instruments,
            notes: NoteCache::new(),
            scopes: ScopeTree::new(),
            output: Box::new(io::stdout()),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        for (name, op) in primops::BUILTINS {
            intp.register_primop(name, *op);
        }
        intp
    }

    pub fn register_primop(&mut self, name: &str, op: PrimFn) {
        self.primops.insert(name.to_string(), PrimOp::Native(op));
    }

    pub fn register_primop_ext<F>(&mut self, name: &str, op: F)
    where
        F: Fn(&mut Interpreter, Args) -> InterpreterResult<Option<Value>> + 'static,
    {
        self.primops.insert(name.to_string(), PrimOp::Ext(Rc::new(op)));
    }

    pub fn has_primop(&self, name: &str) -> bool {
        self.primops.contains_key(name)
    }

    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeTree {
        &mut self.scopes
    }

    pub fn instruments(&self) -> &InstrumentTable {
        &self.instruments
    }

    pub fn note_cache(&self) -> &NoteCache {
        &self.notes
    }

    /// Evaluate a whole program in the root scope.
    pub fn run(&mut self, program: &Block) -> InterpreterResult<Option<Value>> {
        let root = self.scopes.root();
        self.eval_block(program, root)
    }

    /// Evaluate a block, opening a child scope unless the block is opaque.
    pub fn eval_block(&mut self, block: &Block, scope: ScopeId) -> InterpreterResult<Option<Value>> {
        let scope = if block.is_opaque() {
            scope
        } else {
            self.scopes.child(scope)
        };
        self.process(block, scope)
    }

    /// Evaluate the lines of a block directly in `scope` and merge their results.
    ///
    /// Nesting is bounded by the maximum depth only. The stack grows on demand, so the
    /// bound holds on threads with small stacks as well.
    pub fn process(&mut self, block: &Block, scope: ScopeId) -> InterpreterResult<Option<Value>> {
        if self.depth >= self.max_depth {
            return Err(IntpErr::new(IntpErrInfo::RecursionLimit(self.max_depth)));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.process_lines(block, scope)
        });
        self.depth -= 1;
        result
    }

    fn process_lines(&mut self, block: &Block, scope: ScopeId) -> InterpreterResult<Option<Value>> {
        let mut results = Vec::new();
        for line in block.lines() {
            let result = self
                .eval_line(line.tokens().to_vec(), scope)
                .map_err(|err| err.in_line(line.tokens()))?;
            if let Some(value) = result {
                results.push(value);
            }
        }
        merge(results)
    }

    /// Evaluate one line, resolving any block the line's keyword returned.
    pub fn eval_line(&mut self, mut tokens: Vec<Value>, scope: ScopeId) -> InterpreterResult<Option<Value>> {
        if tokens.is_empty() {
            return Ok(None);
        }
        if tokens.len() == 1 && matches!(tokens[0], Value::Str(_) | Value::Wave(_)) {
            return Ok(tokens.pop());
        }

        if let Value::Block(head) = &tokens[0] {
            let head = Rc::clone(head);
            match self.eval_block(&head, scope)? {
                Some(value) => tokens[0] = value,
                None => {
                    tokens.remove(0);
                    return self.eval_line(tokens, scope);
                }
            }
        }

        let result = match &tokens[0] {
            Value::Wave(_) => {
                tokens.insert(0, Value::word("seq"));
                return self.eval_line(tokens, scope);
            }
            Value::Str(_) => {
                tokens.insert(0, Value::word("string"));
                return self.eval_line(tokens, scope);
            }
            Value::Word(word) => {
                if let Some(frequency) = self.scopes.note_to_freq(scope, word)? {
                    let mut rewritten = vec![Value::word("note"), Value::Word(format!("{}Hz", frequency))];
                    rewritten.extend(tokens.drain(1..));
                    return self.eval_line(rewritten, scope);
                }
                self.call_primop(word, scope, &tokens[1..])?
            }
            Value::Block(_) => {
                return Err(IntpErr::new(IntpErrInfo::TypeMismatch(
                    "a block cannot be called".to_string(),
                )))
            }
        };
        self.resolve_pending(result, scope)
    }

    /// Keywords may hand back a block to be evaluated in the caller's place, which is how
    /// control flow runs the chosen branch in the right scope.
    fn resolve_pending(&mut self, mut result: Option<Value>, scope: ScopeId) -> InterpreterResult<Option<Value>> {
        while let Some(Value::Block(block)) = result {
            result = self.eval_block(&block, scope)?;
        }
        Ok(result)
    }

    fn call_primop(&mut self, name: &str, scope: ScopeId, operands: &[Value]) -> InterpreterResult<Option<Value>> {
        let op = match self.primops.get(name) {
            Some(op) => op.clone(),
            None => return Err(IntpErr::new(IntpErrInfo::Uncallable(name.to_string()))),
        };
        trace!("{} with {} operands", name, operands.len());
        op.call(self, Args::new(name, scope, operands))
    }

    /// Evaluate an operand until it has one of the accepted kinds.
    ///
    /// Blocks are evaluated (in a child scope unless opaque) until they are no longer
    /// blocks. A word is accepted as-is when words are acceptable, otherwise it is
    /// evaluated once as a single-token line, so `tempo` can stand for a variable or a
    /// keyword call while `A` stays a word where text is wanted.
    pub fn expect(&mut self, scope: ScopeId, operand: &Value, kinds: &[Kind]) -> InterpreterResult<Option<Value>> {
        let mut current = match operand {
            Value::Block(block) => self.eval_block(block, scope)?,
            Value::Word(_) if !kinds.contains(&Kind::Word) => self.eval_line(vec![operand.clone()], scope)?,
            other => Some(other.clone()),
        };
        // the result of a block never is a block, but a keyword result may hold one
        while let Some(Value::Block(block)) = current {
            current = self.eval_block(&block, scope)?;
        }
        let found = Kind::of(current.as_ref());
        if kinds.contains(&found) {
            Ok(current)
        } else {
            Err(IntpErr::new(IntpErrInfo::UnexpectedKind {
                expected: kinds.to_vec(),
                found,
            }))
        }
    }

    /// Synthesize a constant-frequency note on a named instrument, reusing identical
    /// notes from earlier in the run.
    pub fn synthesize_note(
        &mut self,
        duration: f64,
        frequency: f64,
        amplitude: f64,
        instrument: &str,
    ) -> InterpreterResult<Rc<AudioWave>> {
        let instrument = match self.instruments.get(instrument) {
            Some(instrument) => Rc::clone(instrument),
            None => {
                return Err(IntpErr::new(IntpErrInfo::UnknownInstrument(
                    instrument.to_string(),
                )))
            }
        };
        Ok(self.notes.note(duration, frequency, amplitude, &*instrument))
    }

    /// Write text produced by the program, e.g. through `print`.
    pub fn write_output(&mut self, text: &str) -> InterpreterResult<()> {
        write!(self.output, "{}", text)
            .and_then(|()| self.output.flush())
            .map_err(|err| IntpErr::new(IntpErrInfo::Output(err.to_string())))
    }

    /// Read a variable as a value of the language.
    pub fn read_var(&self, scope: ScopeId, name: &str) -> InterpreterResult<Value> {
        match self.scopes.read(scope, name) {
            Some(Binding::Text(text)) => Ok(Value::Word(text.clone())),
            Some(Binding::Wave(wave)) => Ok(Value::Wave(Rc::clone(wave))),
            Some(Binding::Func(_)) => Err(IntpErr::new(IntpErrInfo::TypeMismatch(format!(
                "'{}' is a function, use 'func {}' to call it",
                name, name
            )))),
            None => Err(IntpErr::new(IntpErrInfo::UndeclaredName(name.to_string()))),
        }
    }
}

/// Merge the results of the lines of a block.
///
/// Text concatenates and audio plays in sequence; a single text result is passed
/// through unchanged.
fn merge(results: Vec<Value>) -> InterpreterResult<Option<Value>> {
    let mut results = results.into_iter();
    let first = match results.next() {
        None => return Ok(None),
        Some(first) => first,
    };
    match first {
        Value::Word(_) | Value::Str(_) => {
            let mut quoted = matches!(first, Value::Str(_));
            let mut text = match first {
                Value::Word(text) | Value::Str(text) => text,
                _ => String::new(),
            };
            for value in results {
                match value {
                    Value::Word(more) => {
                        quoted = false;
                        text.push_str(&more);
                    }
                    Value::Str(more) => text.push_str(&more),
                    other => {
                        return Err(IntpErr::new(IntpErrInfo::IncompatibleResults {
                            first: Kind::Word,
                            other: other.kind(),
                        }))
                    }
                }
            }
            Ok(Some(if quoted {
                Value::Str(text)
            } else {
                Value::Word(text)
            }))
        }
        Value::Wave(first) => {
            let mut wave = AudioWave::empty().append(&first)?;
            for value in results {
                match value {
                    Value::Wave(more) => wave = wave.append(&more)?,
                    other => {
                        return Err(IntpErr::new(IntpErrInfo::IncompatibleResults {
                            first: Kind::Wave,
                            other: other.kind(),
                        }))
                    }
                }
            }
            Ok(Some(Value::Wave(Rc::new(wave))))
        }
        Value::Block(_) => Err(IntpErr::new(IntpErrInfo::TypeMismatch(
            "a block cannot be the result of a line".to_string(),
        ))),
    }
}

/// Helper for parsing the operands of a keyword.
pub struct Args<'a> {
    keyword: &'a str,
    scope: ScopeId,
    args: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(keyword: &'a str, scope: ScopeId, args: &'a [Value]) -> Self {
        Self {
            keyword,
            scope,
            args,
        }
    }

    /// The name the keyword was called by.
    pub fn keyword(&self) -> &'a str {
        self.keyword
    }

    /// The scope of the line that called the keyword.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Return the number of unparsed operands
    pub fn remaining(&self) -> usize {
        self.args.len()
    }

    /// Returns if there are no more operands.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// All unparsed operands, unevaluated.
    pub fn rest(&self) -> &'a [Value] {
        self.args
    }

    /// Fail unless the number of unparsed operands is one of `counts`.
    pub fn expect_count(&self, counts: &[usize]) -> InterpreterResult<()> {
        if counts.contains(&self.args.len()) {
            return Ok(());
        }
        let expected = counts
            .iter()
            .map(|count| count.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        Err(IntpErr::new(IntpErrInfo::OperandCount {
            keyword: self.keyword.to_string(),
            expected,
            found: self.args.len(),
        }))
    }

    /// Return the current operand without evaluating it.
    pub fn raw(&mut self) -> InterpreterResult<&'a Value> {
        if let Some(arg) = self.args.first() {
            self.args = &self.args[1..];
            Ok(arg)
        } else {
            Err(IntpErr::new(IntpErrInfo::OperandCount {
                keyword: self.keyword.to_string(),
                expected: "more".to_string(),
                found: 0,
            }))
        }
    }

    /// Evaluate the current operand to one of the given kinds.
    pub fn value(&mut self, intp: &mut Interpreter, kinds: &[Kind]) -> InterpreterResult<Option<Value>> {
        let arg = self.raw()?;
        intp.expect(self.scope, arg, kinds)
    }

    /// The current operand as text.
    pub fn text(&mut self, intp: &mut Interpreter) -> InterpreterResult<String> {
        match self.value(intp, Kind::TEXT)? {
            Some(Value::Word(text)) | Some(Value::Str(text)) => Ok(text),
            _ => Ok(String::new()),
        }
    }

    /// The current operand as text, `None` if it evaluated to nothing.
    pub fn optional_text(&mut self, intp: &mut Interpreter) -> InterpreterResult<Option<String>> {
        match self.value(intp, Kind::OPTIONAL_TEXT)? {
            Some(Value::Word(text)) | Some(Value::Str(text)) => Ok(Some(text)),
            _ => Ok(None),
        }
    }

    pub fn number(&mut self, intp: &mut Interpreter) -> InterpreterResult<f64> {
        let text = self.text(intp)?;
        parse_number(&text)
    }

    /// The current operand as audio, `None` if it evaluated to nothing.
    pub fn wave(&mut self, intp: &mut Interpreter) -> InterpreterResult<Option<Rc<AudioWave>>> {
        match self.value(intp, Kind::WAVE)? {
            Some(Value::Wave(wave)) => Ok(Some(wave)),
            _ => Ok(None),
        }
    }

    /// Whether the current operand evaluates to anything at all.
    pub fn truthy(&mut self, intp: &mut Interpreter) -> InterpreterResult<bool> {
        Ok(self.value(intp, Kind::ANY)?.is_some())
    }

    /// The current operand must be the bare word `word`.
    pub fn token(&mut self, word: &str) -> InterpreterResult<()> {
        let arg = self.raw()?;
        if arg.is_word(word) {
            Ok(())
        } else {
            Err(IntpErr::new(IntpErrInfo::Syntax {
                keyword: self.keyword.to_string(),
                message: format!("expected '{}'", word),
            }))
        }
    }

    /// End the operand parsing process. There must not be any more operands remaining.
    pub fn done(&self) -> InterpreterResult<()> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(IntpErr::new(IntpErrInfo::Syntax {
                keyword: self.keyword.to_string(),
                message: format!("{} unexpected trailing operands", self.args.len()),
            }))
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::lang::lexer::lex;
    use std::cell::RefCell;

    /// Collects everything the program prints.
    #[derive(Clone, Default)]
    pub struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    pub fn run(source: &str) -> (InterpreterResult<Option<Value>>, String) {
        let (program, _) = lex(source).unwrap();
        let mut intp = Interpreter::new(InstrumentTable::with_builtins());
        let captured = Captured::default();
        intp.set_output(Box::new(captured.clone()));
        let result = intp.run(&program);
        (result, captured.text())
    }

    pub fn eval(source: &str) -> Option<Value> {
        let (result, _) = run(source);
        result.unwrap()
    }

    pub fn eval_err(source: &str) -> IntpErr {
        let (result, _) = run(source);
        result.unwrap_err()
    }

    pub fn printed(source: &str) -> String {
        let (result, output) = run(source);
        result.unwrap();
        output
    }

    fn wave(value: Option<Value>) -> Rc<AudioWave> {
        match value {
            Some(Value::Wave(wave)) => wave,
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(eval(""), None);
        assert_eq!(eval("var x := 1;"), None);
    }

    #[test]
    fn test_single_note() {
        let note = wave(eval("note A 1;"));
        assert_eq!(note.len(), 22050);
        let half = wave(eval("note A 1/2;"));
        assert_eq!(half.len(), 11025);
        // duration is measured in beats
        let slow = wave(eval("var bpm = 60; note A 1;"));
        assert_eq!(slow.len(), 44100);
    }

    #[test]
    fn test_note_words_play_notes() {
        let bare = wave(eval("A;"));
        let explicit = wave(eval("note A;"));
        assert_eq!(bare.to_pcm(), explicit.to_pcm());
        let sample = bare.samples()[10];
        let expected = (2.0 * std::f64::consts::PI * 440.0 * 10.0 / 44100.0).sin();
        assert!((sample - expected).abs() < 1e-9);
    }

    #[test]
    fn test_block_results_merge() {
        let melody = wave(eval("var duration = 1/2; A; B; C;"));
        assert_eq!(melody.len(), 3 * 11025);
        assert_eq!(eval("op 1 + 1; string x;"), Some(Value::word("2x")));
        assert_eq!(eval("string a; \"b\";"), Some(Value::Str("ab".to_string())));
        assert_eq!(
            eval_err("A; string x;").info(),
            &IntpErrInfo::IncompatibleResults {
                first: Kind::Wave,
                other: Kind::Str
            }
        );
        assert_eq!(eval_err("string x; A;").category(), ErrorCategory::Type);
    }

    #[test]
    fn test_literal_lines() {
        assert_eq!(eval("\"hello\";"), Some(Value::Str("hello".to_string())));
        assert_eq!(eval("\"a\" \"b\";"), Some(Value::Str("ab".to_string())));
    }

    #[test]
    fn test_head_block_substitution() {
        assert_eq!(eval("{var k := op; var k;} 2 * 3;"), Some(Value::word("6")));
        // a head block evaluating to text is passed to `string`
        assert_eq!(eval("{string a;} b;"), Some(Value::Str("ab".to_string())));
        // a head block without result drops out of the line
        assert_eq!(eval("{var x := 1;} op 2 + 3;"), Some(Value::word("5")));
    }

    #[test]
    fn test_uncallable() {
        let err = eval_err("florp;");
        assert_eq!(err.info(), &IntpErrInfo::Uncallable("florp".to_string()));
        assert_eq!(err.category(), ErrorCategory::Value);
        assert_eq!(err.line(), Some("florp;"));
        assert_eq!(
            err.to_string(),
            "value error: 'florp' is neither a note name nor a keyword\n    in `florp;`"
        );
    }

    #[test]
    fn test_unknown_instrument() {
        let err = eval_err("var instrument = piano.c; A;");
        assert_eq!(err.info(), &IntpErrInfo::UnknownInstrument("piano.c".to_string()));
    }

    #[test]
    fn test_recursion_limit() {
        let (program, _) = lex("func f := { func f; }; func f;").unwrap();
        let mut intp = Interpreter::new(InstrumentTable::with_builtins());
        intp.set_max_depth(32);
        let err = intp.run(&program).unwrap_err();
        assert_eq!(err.info(), &IntpErrInfo::RecursionLimit(32));
        assert_eq!(err.category(), ErrorCategory::Runtime);
    }

    #[test]
    fn test_default_recursion_limit_on_small_stack() {
        let source = "func f : n := { if {cmp {var n;} > -1;} { func f : {op {var n;} + 1;}; }; }; \
                      func f : 0;";
        let message = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || eval_err(source).to_string())
            .unwrap()
            .join()
            .unwrap();
        assert!(
            message.starts_with(&format!(
                "runtime error: maximum nesting depth of {} exceeded",
                DEFAULT_MAX_DEPTH
            )),
            "{}",
            message
        );
    }

    #[test]
    fn test_ext_primop() {
        let (program, _) = lex("twice A;").unwrap();
        let mut intp = Interpreter::new(InstrumentTable::with_builtins());
        intp.register_primop_ext("twice", |intp, mut args| {
            let note = args.raw()?.clone();
            let line = vec![Value::word("seq"), note.clone(), note];
            intp.eval_line(line, args.scope())
        });
        assert!(intp.has_primop("twice"));
        let result = intp.run(&program).unwrap();
        assert_eq!(wave(result).len(), 2 * 22050);
    }

    #[test]
    fn test_note_cache_is_shared() {
        let (program, _) = lex("A; A; A; B;").unwrap();
        let mut intp = Interpreter::new(InstrumentTable::with_builtins());
        intp.run(&program).unwrap();
        assert_eq!(intp.note_cache().len(), 2);
        assert_eq!(intp.note_cache().hits(), 2);
    }
}
