use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MashupError, Result};

/// Native sub-units per beat used by music-track markers.
pub const NATIVE_UNITS_PER_BEAT: f64 = 48.0;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Recovers the tempo of an asset from its second marker (the first one is
/// implicitly `0`, so the second spans exactly one beat in native units).
///
/// The caller is responsible for checking that the marker exists. Markers
/// that are not positive, or that give a tempo outside `1..=u32::MAX`, are
/// rejected rather than clamped.
pub fn derive_bpm(second_marker: f64) -> Result<u32> {
    if !second_marker.is_finite() || second_marker <= 0.0 {
        return Err(MashupError::invalid(format!(
            "second marker must be a positive number, got {second_marker}"
        )));
    }

    let ms_per_beat = second_marker / NATIVE_UNITS_PER_BEAT;
    let bpm = (((MS_PER_MINUTE / ms_per_beat) * 100.0).round() / 100.0).floor();
    if !(1.0..=f64::from(u32::MAX)).contains(&bpm) {
        return Err(MashupError::invalid(format!(
            "second marker {second_marker} gives an unusable tempo of {bpm} BPM"
        )));
    }
    Ok(bpm as u32)
}

/// Evenly spaced beat timestamps covering a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatSequence {
    /// Beat timestamps in milliseconds, starting at `0`.
    pub beats: Vec<i64>,
    pub total_beats: usize,
    /// Time actually covered by the emitted beats. Never exceeds the
    /// requested song length.
    pub song_duration: i64,
}

impl BeatSequence {
    /// Beats converted to the native marker encoding of a music track.
    pub fn native_markers(&self) -> Vec<i64> {
        self.beats
            .iter()
            .map(|beat| beat * NATIVE_UNITS_PER_BEAT as i64)
            .collect()
    }
}

/// Generates beats every `round(60000 / bpm)` ms from `0` up to and
/// including `song_length_ms`.
pub fn generate_beats(bpm: f64, song_length_ms: f64) -> Result<BeatSequence> {
    if bpm.is_nan() || bpm <= 0.0 {
        return Err(MashupError::invalid(format!(
            "BPM must be greater than 0, got {bpm}"
        )));
    }
    if song_length_ms.is_nan() || song_length_ms <= 0.0 {
        return Err(MashupError::invalid(format!(
            "song length must be greater than 0, got {song_length_ms}"
        )));
    }

    let ms_per_beat = (MS_PER_MINUTE / bpm).round() as i64;
    if ms_per_beat == 0 {
        return Err(MashupError::invalid(format!(
            "BPM {bpm} is too fast to produce distinct beats"
        )));
    }

    let mut beats = Vec::new();
    let mut index: i64 = 0;
    while ((index * ms_per_beat) as f64) <= song_length_ms {
        beats.push(index * ms_per_beat);
        index += 1;
    }

    let total_beats = beats.len();
    Ok(BeatSequence {
        beats,
        total_beats,
        song_duration: ms_per_beat * (total_beats as i64 - 1),
    })
}

/// How closely a block's tempo matches the project tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempoMatch {
    Exact,
    /// One BPM above or below.
    Near,
    Mismatch,
}

impl TempoMatch {
    pub fn classify(block_bpm: u32, project_bpm: u32) -> Self {
        match block_bpm.abs_diff(project_bpm) {
            0 => Self::Exact,
            1 => Self::Near,
            _ => Self::Mismatch,
        }
    }
}

impl fmt::Display for TempoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Exact => "exact",
            Self::Near => "near",
            Self::Mismatch => "mismatch",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_bpm_from_second_marker() {
        assert_eq!(derive_bpm(23_040.0).unwrap(), 125);
        assert_eq!(derive_bpm(24_000.0).unwrap(), 120);
        // 60000 / (23_500 / 48) = 122.55...
        assert_eq!(derive_bpm(23_500.0).unwrap(), 122);
    }

    #[test]
    fn derive_bpm_rejects_unusable_markers() {
        for marker in [0.0, -23_040.0, f64::NAN, f64::INFINITY, 1e-12, 3_000_000.0] {
            let err = derive_bpm(marker).unwrap_err();
            assert!(matches!(err, MashupError::InvalidArgument(_)), "{marker}");
        }
    }

    #[test]
    fn generates_beats_up_to_song_length() {
        let sequence = generate_beats(120.0, 5000.0).unwrap();
        assert_eq!(
            sequence.beats,
            vec![0, 500, 1000, 1500, 2000, 2500, 3000, 3500, 4000, 4500, 5000]
        );
        assert_eq!(sequence.total_beats, 11);
        assert_eq!(sequence.song_duration, 5000);
    }

    #[test]
    fn duration_covers_only_emitted_beats() {
        // 60000 / 125 = 480 ms per beat.
        let sequence = generate_beats(125.0, 1000.0).unwrap();
        assert_eq!(sequence.beats, vec![0, 480, 960]);
        assert_eq!(sequence.song_duration, 960);
    }

    #[test]
    fn rejects_non_positive_arguments() {
        for (bpm, length) in [(0.0, 5000.0), (-10.0, 5000.0), (120.0, 0.0), (120.0, -1.0)] {
            let err = generate_beats(bpm, length).unwrap_err();
            assert!(matches!(err, MashupError::InvalidArgument(_)));
        }
    }

    #[test]
    fn native_markers_scale_by_48() {
        let sequence = generate_beats(125.0, 1000.0).unwrap();
        assert_eq!(sequence.native_markers(), vec![0, 23_040, 46_080]);
    }

    #[test]
    fn classifies_tempo_distance() {
        assert_eq!(TempoMatch::classify(125, 125), TempoMatch::Exact);
        assert_eq!(TempoMatch::classify(124, 125), TempoMatch::Near);
        assert_eq!(TempoMatch::classify(126, 125), TempoMatch::Near);
        assert_eq!(TempoMatch::classify(128, 125), TempoMatch::Mismatch);
    }
}
