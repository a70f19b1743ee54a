//! Easy interface for getting sound to play using a sox subprocess.
use std::io::{self, Write};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::wave::AudioWave;

/// The `play` binary of sox, overridable at build time for nix builds.
fn play_binary() -> &'static str {
    option_env!("NIX_SOX_PLAY_BIN").unwrap_or("play")
}

/// Play the wave through the default audio device and wait until it finished.
pub fn play(wave: &AudioWave) -> io::Result<()> {
    debug!(
        "playing {} samples at {} Hz",
        wave.len(),
        wave.samplerate()
    );
    let mut player = Command::new(play_binary())
        .arg("--no-show-progress")
        .arg("--channels")
        .arg("1")
        .arg("--rate")
        .arg(format!("{}", wave.samplerate()))
        .arg("--type")
        .arg("s16")
        .arg("--endian")
        .arg("little")
        .arg("/dev/stdin")
        .stdin(Stdio::piped())
        .spawn()?;

    let result = match player.stdin.take() {
        Some(mut audio_stream) => audio_stream.write_all(&super::pcm_bytes(wave)),
        None => Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "sox player has no input stream",
        )),
    };

    let status = player.wait()?;
    if !status.success() {
        warn!("sox exited with {}", status);
    }
    result
}
