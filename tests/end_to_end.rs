// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use assert_approx_eq::assert_approx_eq;

use lireta::driver::{self, Outcome};
use lireta::output::wav;
use lireta::wave::{AudioWave, PCM_FULL_SCALE};

fn audio(outcome: Outcome) -> Rc<AudioWave> {
    match outcome {
        Outcome::Audio(wave) => wave,
        other => panic!("expected audio, got {:?}", other),
    }
}

fn evaluate(source: &str) -> Result<Outcome, driver::Error> {
    driver::evaluate(source, Path::new("."))
}

#[test]
fn single_note_with_defaults() {
    let wave = audio(evaluate("note A 1;").unwrap());
    // one beat at 120 bpm
    assert_eq!(wave.len(), 22050);
    assert!(wave.samples().iter().all(|s| s.abs() <= 1.0));
    let expected = (2.0 * std::f64::consts::PI * 440.0 * 10.0 / 44100.0).sin();
    assert_approx_eq!(wave.samples()[10], expected);
}

#[test]
fn demo_program() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/arpeggio.lireta");
    let wave = audio(driver::evaluate_file(&path).unwrap());
    // eight half beats per arpeggio and a final half beat chord at 140 bpm
    assert_eq!(wave.len(), 17 * 9450);
    assert_eq!(wave.voices(), 1);
    assert_eq!(*wave.samples().last().unwrap(), 0.0);
}

#[test]
fn export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chord.wav");
    let outcome = evaluate("var duration = 1/4; simult C E G; A;").unwrap();
    driver::deliver(&outcome, Some(&path), false).unwrap();

    let wave = audio(outcome);
    let (samples, samplerate) = wav::read_wav(&path).unwrap();
    assert_eq!(samplerate, wave.samplerate());
    assert_eq!(samples.len(), wave.len());
    let voices = f64::from(wave.voices());
    for (read, rendered) in samples.iter().zip(wave.samples()) {
        assert!((read - rendered / voices).abs() <= 1.0 / PCM_FULL_SCALE);
    }
}

#[test]
fn sampled_instruments_from_config() {
    let dir = tempfile::tempdir().unwrap();
    // one cycle of a ramp recorded at 80 Hz
    let ramp = (0..100).map(|i| f64::from(i) / 100.0).collect();
    wav::export_wav(&AudioWave::from_samples(ramp, 8000), &dir.path().join("ramp.wav")).unwrap();
    fs::write(
        dir.path().join("organ.json"),
        r#"{
            "instruments": {
                "pipe": { "tracks": { "ramp.wav": 80 }, "continuous": true },
                "clap": { "tracks": { "ramp.wav": 80 }, "pitchless": true }
            }
        }"#,
    )
    .unwrap();

    let source = "config \"organ.json\";\nvar instrument = organ.pipe;\nnote A 1;\nsfx organ.clap 1;\n";
    let wave = audio(driver::evaluate(source, dir.path()).unwrap());
    assert_eq!(wave.len(), 2 * 22050);

    // the continuous pipe keeps looping its single cycle at 440 Hz
    let cycles: f64 = 440.0 * 20000.0 / 44100.0;
    let expected = (cycles.fract() * 100.0).floor() / 100.0;
    assert_approx_eq!(wave.samples()[20000], expected, 1e-3);

    // the clap plays its recording once, at the speed it was recorded
    assert_approx_eq!(wave.samples()[22050 + 450], 0.81, 1e-3);
    assert!(wave.samples()[22050 + 600..].iter().all(|s| *s == 0.0));

    let err = driver::evaluate("config \"organ.json\";\nsfx organ.pipe;\n", dir.path()).unwrap_err();
    assert!(err.to_string().starts_with("value error"));
}

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn printing_programs() {
    let source = r#"
        loop 3 i { print {var i;} "\t"; };
        print "\n";
        string done;
    "#;
    let mut prepared = driver::prepare(source, Path::new(".")).unwrap();
    let captured = Captured::default();
    prepared.interpreter.set_output(Box::new(captured.clone()));
    let outcome = driver::run(&mut prepared).unwrap();
    assert_eq!(outcome, Outcome::Text("done".to_string()));
    assert_eq!(&*captured.0.borrow(), b"0\t1\t2\t\n");
}

#[test]
fn scoping_rules() {
    let functions = "var x := outer; \
                     func clean := {var x;}; \
                     func ! unclean := {var x;}; \
                     { var x := inner; string {func clean;} - {func unclean;}; };";
    assert_eq!(
        evaluate(functions).unwrap(),
        Outcome::Text("outer-inner".to_string())
    );

    let err = evaluate("loop 3 { var x := \"1\"; }; var x;").unwrap_err();
    assert!(err.to_string().starts_with("name error"));
}

#[test]
fn mixed_results_are_rejected() {
    let err = evaluate("string a; A;").unwrap_err();
    assert!(err.to_string().starts_with("type error"));
    assert_eq!(evaluate("var x := 1; .;").unwrap(), Outcome::Nothing);
}
