// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Reading and writing 16-bit PCM WAV files.

use std::path::{Path, PathBuf};

use log::debug;
use snafu::{ResultExt, Snafu};

use crate::wave::{AudioWave, PCM_FULL_SCALE};

#[derive(Debug, Snafu)]
pub enum WavError {
    #[snafu(display("could not open {}: {}", path.display(), source))]
    OpenWav { path: PathBuf, source: hound::Error },
    #[snafu(display(
        "{} must contain 16-bit integer samples, found {} bits",
        path.display(),
        bits
    ))]
    UnsupportedFormat { path: PathBuf, bits: u16 },
    #[snafu(display("could not decode {}: {}", path.display(), source))]
    DecodeWav { path: PathBuf, source: hound::Error },
    #[snafu(display("could not write {}: {}", path.display(), source))]
    WriteWav { path: PathBuf, source: hound::Error },
}

/// Load a WAV file as mono samples in `[-1, 1]` together with its sample rate.
///
/// Multi-channel files are mixed down by averaging the channels of each frame.
pub fn read_wav(path: &Path) -> Result<(Vec<f64>, u32), WavError> {
    let mut reader = hound::WavReader::open(path).context(OpenWav { path })?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(WavError::UnsupportedFormat {
            path: path.to_path_buf(),
            bits: spec.bits_per_sample,
        });
    }

    let raw = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .context(DecodeWav { path })?;

    let channels = usize::from(spec.channels.max(1));
    let samples = raw
        .chunks(channels)
        .map(|frame| {
            let sum: f64 = frame.iter().map(|s| f64::from(*s)).sum();
            sum / frame.len() as f64 / PCM_FULL_SCALE
        })
        .collect::<Vec<_>>();
    debug!(
        "loaded {} frames at {} Hz from {}",
        samples.len(),
        spec.sample_rate,
        path.display()
    );
    Ok((samples, spec.sample_rate))
}

/// Write the export form of the wave as a mono 16-bit WAV file.
pub fn export_wav(wave: &AudioWave, path: &Path) -> Result<(), WavError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: wave.samplerate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).context(WriteWav { path })?;
    for sample in wave.to_pcm() {
        writer.write_sample(sample).context(WriteWav { path })?;
    }
    writer.finalize().context(WriteWav { path })?;
    debug!("wrote {} samples to {}", wave.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wave::DEFAULT_SAMPLERATE;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.wav");
        let original: Vec<f64> = (0..1000).map(|i| ((i as f64) / 50.0).sin() * 0.8).collect();
        let wave = AudioWave::from_samples(original.clone(), DEFAULT_SAMPLERATE);
        export_wav(&wave, &path).unwrap();

        let (samples, samplerate) = read_wav(&path).unwrap();
        assert_eq!(samplerate, DEFAULT_SAMPLERATE);
        assert_eq!(samples.len(), original.len());
        for (read, written) in samples.iter().zip(original.iter()) {
            assert!((read - written).abs() <= 1.0 / PCM_FULL_SCALE);
        }
    }

    #[test]
    fn test_stereo_is_mixed_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for sample in &[32767i16, 0, -32767, -32767] {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, samplerate) = read_wav(&path).unwrap();
        assert_eq!(samplerate, 8000);
        assert_eq!(samples, vec![0.5, -1.0]);
    }

    #[test]
    fn test_rejects_float_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        match read_wav(&path) {
            Err(WavError::UnsupportedFormat { bits, .. }) => assert_eq!(bits, 32),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_wav(Path::new("/nonexistent/track.wav")),
            Err(WavError::OpenWav { .. })
        ));
    }
}
