// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Running a program from source to its result: lexing, loading the configuration it
//! names, evaluating and delivering the result.

pub mod output;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::info;
use snafu::{ResultExt, Snafu};

use crate::config::{self, ConfigError};
use crate::instrument::InstrumentTable;
use crate::lang::ast::Block;
use crate::lang::lexer::{self, LexerError};
use crate::lang::pretty;
use crate::lang::span::{LineMap, Pos};
use crate::lang::{IntpErr, Interpreter, Value};
use crate::output::wav::WavError;
use crate::wave::AudioWave;

pub use self::output::deliver;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("could not read {}: {}", path.display(), source))]
    ReadSource { path: PathBuf, source: io::Error },
    #[snafu(display("syntax error at {}: {}", pos, source))]
    Lex { pos: Pos, source: LexerError },
    #[snafu(display("{}", source))]
    Config { source: ConfigError },
    #[snafu(display("{}", source))]
    Eval { source: IntpErr },
    #[snafu(display("could not export audio: {}", source))]
    Export { source: WavError },
    #[snafu(display("could not play audio: {}", source))]
    Play { source: io::Error },
}

/// What a program evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Audio(Rc<AudioWave>),
    Text(String),
    Nothing,
}

/// A lexed program together with an interpreter that knows the instruments it asked
/// for.
pub struct Prepared {
    pub interpreter: Interpreter,
    pub program: Block,
}

/// Lex `source` and load the configuration it names, relative to `base_dir`.
pub fn prepare(source: &str, base_dir: &Path) -> Result<Prepared, Error> {
    let (program, config_path) = lex(source)?;
    let mut instruments = InstrumentTable::with_builtins();
    if let Some(config_path) = config_path {
        config::load_instruments(&base_dir.join(config_path), &mut instruments)
            .context(Config)?;
    }
    Ok(Prepared {
        interpreter: Interpreter::new(instruments),
        program,
    })
}

/// Evaluate a prepared program.
pub fn run(prepared: &mut Prepared) -> Result<Outcome, Error> {
    let result = prepared
        .interpreter
        .run(&prepared.program)
        .context(Eval)?;
    info!(
        "evaluation done, {} distinct notes synthesized",
        prepared.interpreter.note_cache().len()
    );
    Ok(match result {
        Some(Value::Wave(wave)) => Outcome::Audio(wave),
        Some(Value::Word(text)) | Some(Value::Str(text)) => Outcome::Text(text),
        Some(Value::Block(_)) | None => Outcome::Nothing,
    })
}

/// Evaluate program text. Configuration paths are resolved against `base_dir`.
pub fn evaluate(source: &str, base_dir: &Path) -> Result<Outcome, Error> {
    let mut prepared = prepare(source, base_dir)?;
    run(&mut prepared)
}

/// Evaluate the program stored in a file.
pub fn evaluate_file(path: &Path) -> Result<Outcome, Error> {
    let source = fs::read_to_string(path).context(ReadSource { path })?;
    info!("evaluating {}", path.display());
    evaluate(&source, &base_dir(path))
}

/// The tree the lexer produces for a file, in source form.
pub fn dump_tree(path: &Path) -> Result<String, Error> {
    let source = fs::read_to_string(path).context(ReadSource { path })?;
    let (program, _) = lex(&source)?;
    Ok(pretty::print_block(&program))
}

fn lex(source: &str) -> Result<(Block, Option<String>), Error> {
    lexer::lex(source).map_err(|err| Error::Lex {
        pos: LineMap::new(source).offset_to_pos(err.location().begin),
        source: err,
    })
}

fn base_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_outcomes() {
        let here = Path::new(".");
        assert_eq!(evaluate("", here).unwrap(), Outcome::Nothing);
        assert_eq!(
            evaluate("string a b;", here).unwrap(),
            Outcome::Text("ab".to_string())
        );
        match evaluate("A; B;", here).unwrap() {
            Outcome::Audio(wave) => assert_eq!(wave.len(), 2 * 22050),
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_lex_errors_have_positions() {
        let err = evaluate("A;\n  seq {B;", Path::new(".")).unwrap_err();
        match &err {
            Error::Lex { pos, .. } => assert_eq!(pos.line, 2),
            other => panic!("expected a lexer error, got {:?}", other),
        }
        assert!(err.to_string().starts_with("syntax error at 2:"));
    }

    #[test]
    fn test_eval_errors() {
        let err = evaluate("var x;", Path::new(".")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "name error: 'x' is not declared\n    in `var x;`"
        );
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = evaluate("config \"nowhere.json\"; A;", dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tune.lireta");
        fs::write(&path, "# a tune\nvar duration := 1/2;\nA; C;\n").unwrap();
        match evaluate_file(&path).unwrap() {
            Outcome::Audio(wave) => assert_eq!(wave.len(), 2 * 11025),
            other => panic!("expected audio, got {:?}", other),
        }
        assert_eq!(
            dump_tree(&path).unwrap(),
            "var duration := 1/2;\nA;\nC;\n"
        );
        assert!(matches!(
            evaluate_file(&dir.path().join("missing.lireta")),
            Err(Error::ReadSource { .. })
        ));
    }
}
