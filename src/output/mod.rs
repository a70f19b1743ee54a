//! Getting rendered audio out of the program, either into a file or to the speakers.

pub mod sox;
pub mod wav;

use crate::wave::AudioWave;

/// Serialize the export form of the wave as little endian signed 16-bit samples.
pub fn pcm_bytes(wave: &AudioWave) -> Vec<u8> {
    let pcm = wave.to_pcm();
    let mut bytes = Vec::with_capacity(pcm.len() * 2);
    for sample in pcm {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
