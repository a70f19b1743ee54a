// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Keywords producing and combining audio.

use std::rc::Rc;

use crate::lang::interpreter::*;
use crate::lang::scope::ScopeId;
use crate::lang::value::{Kind, Value};
use crate::wave::{AudioWave, Param, DEFAULT_SAMPLERATE};

fn wave_result(wave: AudioWave) -> InterpreterResult<Option<Value>> {
    Ok(Some(Value::Wave(Rc::new(wave))))
}

/// Length of `beats` in seconds at the current tempo.
fn beats_to_seconds(intp: &Interpreter, scope: ScopeId, beats: f64) -> InterpreterResult<f64> {
    let bpm = intp.scopes().read_number(scope, "bpm")?;
    if bpm == 0.0 {
        return Err(IntpErr::new(IntpErrInfo::DivisionByZero));
    }
    if !bpm.is_finite() || bpm < 0.0 {
        return Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
            "bpm must be a positive number, got {}",
            bpm
        ))));
    }
    let seconds = beats * 60.0 / bpm;
    if !seconds.is_finite() {
        return Err(IntpErr::new(IntpErrInfo::InvalidValue(format!(
            "{} beats is not a valid length",
            beats
        ))));
    }
    Ok(seconds)
}

/// Duration operand in beats, falling back to the `duration` setting.
fn duration_operand(intp: &mut Interpreter, args: &mut Args) -> InterpreterResult<f64> {
    if args.is_empty() {
        intp.scopes().read_number(args.scope(), "duration")
    } else {
        args.number(intp)
    }
}

fn frequency_operand(intp: &mut Interpreter, args: &mut Args) -> InterpreterResult<f64> {
    let name = args.text(intp)?;
    match intp.scopes().note_to_freq(args.scope(), &name)? {
        Some(frequency) => Ok(frequency),
        None => Err(IntpErr::new(IntpErrInfo::InvalidNote(name))),
    }
}

/// `seq a b ...`: play the operands one after another. Operands without audio are skipped.
pub fn seq(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    let mut result: Option<AudioWave> = None;
    while !args.is_empty() {
        if let Some(wave) = args.wave(intp)? {
            let so_far = result.take().unwrap_or_default();
            result = Some(so_far.append(&wave)?);
        }
    }
    match result {
        Some(wave) => wave_result(wave),
        None => Ok(None),
    }
}

/// `simult a b ...`: play the operands at the same time.
pub fn simult(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    let mut result: Option<AudioWave> = None;
    while !args.is_empty() {
        if let Some(wave) = args.wave(intp)? {
            let so_far = result.take().unwrap_or_default();
            result = Some(so_far.add(&wave)?);
        }
    }
    match result {
        Some(wave) => wave_result(wave),
        None => Ok(None),
    }
}

/// `note <name> [beats]`: a note on the current instrument.
pub fn note(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[1, 2])?;
    let scope = args.scope();
    let frequency = frequency_operand(intp, &mut args)?;
    let beats = duration_operand(intp, &mut args)?;
    let seconds = beats_to_seconds(intp, scope, beats)?;
    let amplitude = intp.scopes().read_number(scope, "intensity")?;
    let instrument = intp.scopes().read_text(scope, "instrument")?.to_string();
    let wave = intp.synthesize_note(seconds, frequency, amplitude, &instrument)?;
    Ok(Some(Value::Wave(wave)))
}

/// `sfx <instrument> [beats]`: a pitchless instrument at its recorded frequency.
pub fn sfx(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[1, 2])?;
    let scope = args.scope();
    let name = args.text(intp)?;
    let beats = duration_operand(intp, &mut args)?;
    let seconds = beats_to_seconds(intp, scope, beats)?;
    let frequency = match intp.instruments().get(&name) {
        Some(instrument) => instrument.natural_frequency().ok_or_else(|| {
            IntpErr::new(IntpErrInfo::InvalidValue(format!(
                "instrument '{}' is not pitchless",
                name
            )))
        })?,
        None => return Err(IntpErr::new(IntpErrInfo::UnknownInstrument(name))),
    };
    let amplitude = intp.scopes().read_number(scope, "intensity")?;
    let wave = intp.synthesize_note(seconds, frequency, amplitude, &name)?;
    Ok(Some(Value::Wave(wave)))
}

/// `gliss <from> <to> [beats]`: slide linearly from one frequency to another.
pub fn gliss(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[2, 3])?;
    let scope = args.scope();
    let from = frequency_operand(intp, &mut args)?;
    let to = frequency_operand(intp, &mut args)?;
    let beats = duration_operand(intp, &mut args)?;
    let seconds = beats_to_seconds(intp, scope, beats)?;
    let amplitude = intp.scopes().read_number(scope, "intensity")?;

    let name = intp.scopes().read_text(scope, "instrument")?.to_string();
    let waveform = match intp.instruments().get(&name) {
        Some(instrument) => instrument.waveform((from + to) / 2.0),
        None => return Err(IntpErr::new(IntpErrInfo::UnknownInstrument(name))),
    };
    let frequency = |t: f64| from + (to - from) * t / seconds;
    wave_result(AudioWave::new(
        seconds,
        Param::Varying(&frequency),
        Param::Const(amplitude),
        &*waveform,
        DEFAULT_SAMPLERATE,
    ))
}

/// `ampfx <start> : <from> -> <end> : <to> | <audio>`: scale the amplitude by an envelope
/// that moves linearly from `from` to `to` between the two points in time (in beats),
/// holding its value before and after.
pub fn ampfx(intp: &mut Interpreter, mut args: Args) -> InterpreterResult<Option<Value>> {
    args.expect_count(&[9])?;
    let scope = args.scope();
    let start = args.number(intp)?;
    args.token(":")?;
    let from = args.number(intp)?;
    args.token("->")?;
    let end = args.number(intp)?;
    args.token(":")?;
    let to = args.number(intp)?;
    args.token("|")?;
    let wave = match args.value(intp, &[Kind::Wave])? {
        Some(Value::Wave(wave)) => wave,
        other => {
            return Err(IntpErr::new(IntpErrInfo::UnexpectedKind {
                expected: vec![Kind::Wave],
                found: Kind::of(other.as_ref()),
            }))
        }
    };

    let start = beats_to_seconds(intp, scope, start)?;
    let end = beats_to_seconds(intp, scope, end)?;
    if end < start {
        return Err(IntpErr::new(IntpErrInfo::InvalidValue(
            "ampfx must end after it starts".to_string(),
        )));
    }
    let envelope = |t: f64| {
        if t <= start {
            from
        } else if t >= end {
            to
        } else {
            from + (to - from) * (t - start) / (end - start)
        }
    };
    wave_result(wave.amplitude_effect(envelope))
}

#[cfg(test)]
mod test {
    use crate::lang::interpreter::test::{eval, eval_err};
    use crate::lang::interpreter::{ErrorCategory, IntpErrInfo};
    use crate::lang::value::Value;
    use crate::wave::AudioWave;
    use assert_approx_eq::assert_approx_eq;
    use std::rc::Rc;

    fn wave(source: &str) -> Rc<AudioWave> {
        match eval(source) {
            Some(Value::Wave(wave)) => wave,
            other => panic!("expected audio, got {:?}", other),
        }
    }

    #[test]
    fn test_seq() {
        let melody = wave("seq {note A 1;} {note B 1/2;};");
        assert_eq!(melody.len(), 22050 + 11025);
        assert_eq!(melody.voices(), 1);
        // operands evaluating to nothing are skipped
        assert_eq!(wave("seq A {var x := 1;} B;").len(), 2 * 22050);
        assert_eq!(eval("seq;"), None);
        assert_eq!(eval("seq {var x := 1;};"), None);
        assert_eq!(eval_err("seq \"text\";").category(), ErrorCategory::Type);
    }

    #[test]
    fn test_simult() {
        let chord = wave("simult {note A 1/2;} C E;");
        assert_eq!(chord.len(), 22050);
        assert_eq!(chord.voices(), 3);
        let a = wave("note A 1/2;");
        let c = wave("note C;");
        let e = wave("note E;");
        let expected = a.samples()[100] + c.samples()[100] + e.samples()[100];
        assert_approx_eq!(chord.samples()[100], expected);
        assert_approx_eq!(chord.samples()[15000], c.samples()[15000] + e.samples()[15000]);
    }

    #[test]
    fn test_note_settings() {
        let quiet = wave("var intensity = 1/2; note A;");
        let loud = wave("note A;");
        assert_approx_eq!(quiet.samples()[123], loud.samples()[123] / 2.0);

        let square = wave("var instrument = square; note A 1/4;");
        assert!(square.samples()[1..50].iter().all(|s| *s == 1.0));

        let rest = wave("note _;");
        assert!(rest.samples().iter().all(|s| *s == 0.0));

        assert_eq!(wave("var duration = 3; A;").len(), 3 * 22050);
        assert_eq!(
            eval_err("note X;").info(),
            &IntpErrInfo::InvalidNote("X".to_string())
        );
        assert_eq!(eval_err("note;").category(), ErrorCategory::Runtime);
    }

    #[test]
    fn test_sfx_requires_pitchless_instrument() {
        assert_eq!(
            eval_err("sfx drums.kick;").info(),
            &IntpErrInfo::UnknownInstrument("drums.kick".to_string())
        );
        assert_eq!(eval_err("sfx sin;").category(), ErrorCategory::Value);
    }

    #[test]
    fn test_gliss() {
        let slide = wave("gliss A A+ 1;");
        assert_eq!(slide.len(), 22050);
        // the first cycle runs at about 440 Hz, so the sine peaks after a quarter period
        let quarter = (44100.0 / 440.0 / 4.0) as usize;
        assert!(slide.samples()[quarter] > 0.99);
        let steady = wave("gliss A A 1/2;");
        let note = wave("note A 1/2;");
        for (a, b) in steady.samples().iter().zip(note.samples()).take(1000) {
            assert_approx_eq!(a, b, 1e-6);
        }
    }

    #[test]
    fn test_ampfx() {
        let faded = wave("ampfx 0 : 1 -> 1 : 0 | {var instrument := square; note A 2;};");
        let square = wave("var instrument = square; note A 2;");
        assert_eq!(faded.len(), square.len());
        // halfway through the fade, which lasts one beat of half a second
        assert_approx_eq!(faded.samples()[11025], square.samples()[11025] * 0.5);
        // held after the end
        assert_eq!(faded.samples()[30001], 0.0);

        let err = eval_err("ampfx 0 : 1 => 1 : 0 | A;");
        assert!(matches!(err.info(), IntpErrInfo::Syntax { .. }));
        assert_eq!(eval_err("ampfx 0 : 1 -> 1 : 0 |;").category(), ErrorCategory::Runtime);
        assert_eq!(eval_err("ampfx 1 : 1 -> 0 : 0 | A;").category(), ErrorCategory::Value);
        assert_eq!(eval_err("ampfx 0 : 1 -> 1 : 0 | {var x := 1;};").category(), ErrorCategory::Type);
    }

    #[test]
    fn test_tempo_must_be_positive() {
        for source in &[
            "var bpm = 0; A;",
            "var bpm = 0; note A 1;",
            "var bpm = 0; sfx drums.kick;",
            "var bpm = 0; gliss A B;",
        ] {
            assert_eq!(eval_err(source).info(), &IntpErrInfo::DivisionByZero, "{}", source);
        }
        assert_eq!(eval_err("var bpm = -60; note A 1;").category(), ErrorCategory::Value);
        assert_eq!(eval_err("var bpm = 120; note A inf;").category(), ErrorCategory::Value);
    }
}
