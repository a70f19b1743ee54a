// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Loading instruments from JSON configuration files.
//!
//! A configuration file looks like this:
//!
//! ```json
//! {
//!     "preloads": ["../common/drums.json"],
//!     "instruments": {
//!         "soft": {
//!             "tracks": { "soft-a3.wav": 220, "soft-a4.wav": 440 },
//!             "interpolation": "lerp",
//!             "continuous": false,
//!             "pitchless": false
//!         }
//!     }
//! }
//! ```
//!
//! Instruments are named after the file they are defined in, so the instrument above
//! is available as `piano.soft` when the file is called `piano.json`. Relative paths
//! are resolved against the directory of the file mentioning them.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

use crate::instrument::sampled::SampledError;
use crate::instrument::{Instrument, InstrumentTable, Interpolation, SampledInstrument, Track};
use crate::output::wav::{self, WavError};

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("could not read configuration {}: {}", path.display(), source))]
    ReadConfig { path: PathBuf, source: io::Error },
    #[snafu(display("could not parse configuration {}: {}", path.display(), source))]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("circular preloading of {}", path.display()))]
    CircularPreload { path: PathBuf },
    #[snafu(display(
        "instrument '{}' already exists, rename the configuration file to change its namespace",
        name
    ))]
    DuplicateInstrument { name: String },
    #[snafu(display("instrument '{}' has unknown interpolation mode '{}'", name, mode))]
    InvalidInterpolation { name: String, mode: String },
    #[snafu(display("could not load a track of instrument '{}': {}", name, source))]
    LoadTrack { name: String, source: WavError },
    #[snafu(display("{}", source))]
    BuildInstrument { source: SampledError },
}

/// The contents of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Configuration files loaded before this one.
    pub preloads: Vec<String>,
    /// Native extension modules. These cannot be loaded and are skipped.
    pub scripts: Vec<String>,
    pub instruments: BTreeMap<String, InstrumentSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentSpec {
    /// Paths of WAV recordings and the frequency they were recorded at, in order.
    #[serde(deserialize_with = "ordered_tracks")]
    pub tracks: Vec<(String, f64)>,
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub pitchless: bool,
}

fn default_interpolation() -> String {
    "none".to_string()
}

/// Keep the tracks in file order, since pitchless instruments play their first track.
fn ordered_tracks<'de, D>(deserializer: D) -> Result<Vec<(String, f64)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TracksVisitor;

    impl<'de> Visitor<'de> for TracksVisitor {
        type Value = Vec<(String, f64)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a map from track paths to frequencies")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut tracks = Vec::new();
            while let Some(entry) = map.next_entry::<String, f64>()? {
                tracks.push(entry);
            }
            Ok(tracks)
        }
    }

    deserializer.deserialize_map(TracksVisitor)
}

/// Load the instruments of a configuration file and everything it preloads into
/// `table`.
pub fn load_instruments(path: &Path, table: &mut InstrumentTable) -> Result<(), ConfigError> {
    let mut loader = Loader {
        table,
        loading: Vec::new(),
        loaded: HashSet::new(),
    };
    loader.load(path)
}

struct Loader<'t> {
    table: &'t mut InstrumentTable,
    /// Files whose preloads are currently being processed.
    loading: Vec<PathBuf>,
    loaded: HashSet<PathBuf>,
}

impl<'t> Loader<'t> {
    fn load(&mut self, path: &Path) -> Result<(), ConfigError> {
        let path = fs::canonicalize(path).context(ReadConfig { path })?;
        if self.loading.contains(&path) {
            return Err(ConfigError::CircularPreload { path });
        }
        if self.loaded.contains(&path) {
            debug!("{} was already loaded", path.display());
            return Ok(());
        }

        debug!("loading configuration {}", path.display());
        let text = fs::read_to_string(&path).context(ReadConfig { path: &path })?;
        let config: ConfigFile =
            serde_json::from_str(&text).context(ParseConfig { path: &path })?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        self.loading.push(path.clone());
        for preload in &config.preloads {
            self.load(&dir.join(preload))?;
        }
        self.loading.pop();

        for script in &config.scripts {
            warn!(
                "{}: skipping script {}, extension scripts are not supported",
                path.display(),
                script
            );
        }

        let namespace = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        for (local, spec) in config.instruments {
            let name = format!("{}.{}", namespace, local);
            if self.table.contains(&name) {
                return Err(ConfigError::DuplicateInstrument { name });
            }
            let instrument = build_instrument(name, spec, &dir)?;
            debug!(
                "registered instrument {} with {} tracks",
                instrument.name(),
                instrument.tracks().len()
            );
            self.table.register(Rc::new(instrument));
        }

        self.loaded.insert(path);
        Ok(())
    }
}

fn build_instrument(name: String, spec: InstrumentSpec, dir: &Path) -> Result<SampledInstrument, ConfigError> {
    let interpolation = match Interpolation::parse(&spec.interpolation) {
        Some(interpolation) => interpolation,
        None => {
            return Err(ConfigError::InvalidInterpolation {
                name,
                mode: spec.interpolation,
            })
        }
    };
    let mut tracks = Vec::with_capacity(spec.tracks.len());
    for (file, frequency) in &spec.tracks {
        let (samples, samplerate) = wav::read_wav(&dir.join(file)).context(LoadTrack { name: &name })?;
        tracks.push(Track::new(samples, samplerate, *frequency));
    }
    SampledInstrument::new(name, tracks, interpolation, spec.continuous, spec.pitchless)
        .context(BuildInstrument)
}
