// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Handing the result of a program to the user.

use std::path::Path;

use log::info;
use snafu::ResultExt;

use super::{Error, Export, Outcome, Play};
use crate::output::{sox, wav};

/// Export audio to `outfile` and/or play it. Audio is played when no file is given.
/// Text results are printed to stdout.
pub fn deliver(outcome: &Outcome, outfile: Option<&Path>, play: bool) -> Result<(), Error> {
    match outcome {
        Outcome::Audio(wave) => {
            info!(
                "rendered {:.2} seconds of audio ({} voices)",
                wave.duration(),
                wave.voices()
            );
            if let Some(path) = outfile {
                info!("exporting to {}", path.display());
                wav::export_wav(wave, path).context(Export)?;
            }
            if play || outfile.is_none() {
                info!("playing");
                sox::play(wave).context(Play)?;
            }
        }
        Outcome::Text(text) => println!("{}", text),
        Outcome::Nothing => info!("the program produced no result"),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wave::AudioWave;
    use std::rc::Rc;

    #[test]
    fn test_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let wave = AudioWave::from_samples(vec![0.25; 441], 44100);
        deliver(&Outcome::Audio(Rc::new(wave)), Some(&path), false).unwrap();
        let (samples, samplerate) = wav::read_wav(&path).unwrap();
        assert_eq!(samples.len(), 441);
        assert_eq!(samplerate, 44100);
    }

    #[test]
    fn test_nothing_to_deliver() {
        deliver(&Outcome::Nothing, None, true).unwrap();
    }
}
