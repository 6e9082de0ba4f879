use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    assets::Block,
    grid::{MappingMode, TimeMapper, TimeSpan},
    tempo::{self, BeatSequence},
    uaf::Tape,
    MashupError, Result,
};

/// Tempo and beat markers shared by every block of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBeatContext {
    pub map_name: String,
    pub bpm: u32,
    /// Beat timestamps in milliseconds. Empty until an audio track has been
    /// attached.
    pub beats: Vec<i64>,
}

impl ProjectBeatContext {
    pub fn new(map_name: impl Into<String>, bpm: u32) -> Result<Self> {
        let map_name = map_name.into();
        if map_name.trim().is_empty() {
            return Err(MashupError::invalid("map name must not be empty"));
        }
        if bpm == 0 {
            return Err(MashupError::invalid("BPM must be greater than 0"));
        }

        Ok(Self {
            map_name,
            bpm,
            beats: Vec::new(),
        })
    }

    /// Regenerates the beat markers for an audio track of the given length.
    pub fn attach_audio(&mut self, song_length_ms: f64) -> Result<BeatSequence> {
        let sequence = tempo::generate_beats(f64::from(self.bpm), song_length_ms)?;
        tracing::debug!(
            bpm = self.bpm,
            song_length_ms,
            beats = sequence.total_beats,
            "generated project beats"
        );
        self.beats = sequence.beats.clone();
        Ok(sequence)
    }

    pub fn has_beats(&self) -> bool {
        !self.beats.is_empty()
    }

    /// Fails unless beat markers have been generated.
    pub fn require_beats(&self) -> Result<()> {
        if self.has_beats() {
            Ok(())
        } else {
            Err(MashupError::invalid(
                "project has no beat markers; attach an audio track first",
            ))
        }
    }

    /// Mapper over the project grid, in the mode used by the export path.
    pub fn mapper(&self) -> Result<TimeMapper> {
        self.require_beats()?;
        let markers: Vec<f64> = self.beats.iter().map(|&beat| beat as f64).collect();
        Ok(TimeMapper::from_markers(&markers, MappingMode::Absolute))
    }
}

/// A block dropped on the project timeline.
#[derive(Debug, Clone, Copy)]
pub struct BlockPlacement<'a> {
    pub block: &'a Block,
    /// Start on the project timeline, in milliseconds.
    pub start_ms: f64,
    /// End on the project timeline, in milliseconds.
    pub end_ms: f64,
}

impl<'a> BlockPlacement<'a> {
    pub fn new(block: &'a Block, start_ms: f64, end_ms: f64) -> Self {
        Self {
            block,
            start_ms,
            end_ms,
        }
    }

    /// Grid span of the placement. The end time is mapped as an absolute
    /// time, so `duration` holds the end index rather than a length.
    pub fn grid_span(&self, mapper: &TimeMapper) -> TimeSpan {
        mapper.map_span(self.start_ms, self.end_ms)
    }
}

/// One random identifier per distinct source map name.
#[derive(Debug, Default)]
pub struct MapGuids {
    guids: HashMap<String, Uuid>,
}

impl MapGuids {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, map_name: &str) -> Uuid {
        *self
            .guids
            .entry(map_name.to_string())
            .or_insert_with(Uuid::new_v4)
    }

    pub fn len(&self) -> usize {
        self.guids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guids.is_empty()
    }
}

/// Merges the dance tapes of `placements` into one project tape.
///
/// Placements are processed in the order given. Each clip keeps its offset
/// inside its block; only the block anchor moves to the grid index of the
/// placement start.
pub fn assemble(placements: &[BlockPlacement<'_>], context: &ProjectBeatContext) -> Result<Tape> {
    let mapper = context.mapper()?;
    let mut tape = Tape::new(context.map_name.clone());
    let mut guids = MapGuids::new();

    for placement in placements {
        let block = placement.block;
        let guid = guids.get_or_create(block.source_map_name());
        let span = placement.grid_span(&mapper);

        tracing::debug!(
            block = %block.name,
            source_map = block.source_map_name(),
            %guid,
            start_ms = placement.start_ms,
            start = span.start,
            end = span.duration,
            "placing block"
        );

        tape.clips.extend(
            block
                .dance_tape
                .clips
                .iter()
                .map(|clip| clip.shifted(span.start)),
        );
    }

    tracing::info!(
        map = tape.map_name(),
        placements = placements.len(),
        clips = tape.clips.len(),
        "assembled dance tape"
    );
    Ok(tape)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::{json, Value};

    use super::*;
    use crate::{
        codec,
        uaf::{Clip, ClipBody, MusicTrack},
    };

    fn block(name: &str, source_map: &str, starts: &[i64]) -> Block {
        let mut dance_tape = Tape::new(source_map);
        dance_tape.clips = starts
            .iter()
            .map(|&start| {
                let mut body = ClipBody::new("GoldEffectClip", start);
                body.duration = Some(24);
                Clip::from(body)
            })
            .collect();

        Block {
            name: name.to_string(),
            bpm: 120,
            video_path: PathBuf::from(format!("{name}.webm")),
            music_track: MusicTrack::default(),
            dance_tape,
        }
    }

    fn context() -> ProjectBeatContext {
        let mut context = ProjectBeatContext::new("MyMashup", 120).unwrap();
        context.attach_audio(10_000.0).unwrap();
        context
    }

    #[test]
    fn rejects_invalid_context() {
        assert!(ProjectBeatContext::new("", 120).is_err());
        assert!(ProjectBeatContext::new("Map", 0).is_err());
    }

    #[test]
    fn attach_audio_generates_beats() {
        let context = context();
        assert_eq!(context.beats.len(), 21);
        assert_eq!(context.beats[1], 500);
    }

    #[test]
    fn assembling_requires_beats() {
        let context = ProjectBeatContext::new("MyMashup", 120).unwrap();
        let err = assemble(&[], &context).unwrap_err();
        assert!(matches!(err, MashupError::InvalidArgument(_)));
    }

    #[test]
    fn concatenates_shifted_clips_in_placement_order() {
        let first = block("Verse", "SongA", &[0, 24, 48]);
        let second = block("Chorus", "SongB", &[12, 36]);
        let placements = [
            BlockPlacement::new(&second, 1000.0, 2000.0),
            BlockPlacement::new(&first, 0.0, 1000.0),
        ];

        let tape = assemble(&placements, &context()).unwrap();
        assert_eq!(tape.map_name(), "MyMashup");
        assert_eq!(tape.clips.len(), 5);

        // 1000 ms is two beats at 120 BPM, i.e. grid index 48.
        let starts: Vec<i64> = tape.clips.iter().map(Clip::start_time).collect();
        assert_eq!(starts, vec![60, 84, 0, 24, 48]);
        assert!(tape.clips.iter().all(|clip| clip.duration() == Some(24)));
    }

    #[test]
    fn sparse_clips_gain_nothing_but_a_new_start() {
        let source = json!({
            "__class": "PictogramClip",
            "StartTime": 6,
            "PictoPath": "p.png",
            "MontagePath": null,
            "Color": "0xFFFFFFFF"
        });
        let tape_bytes = serde_json::to_vec(&json!({
            "__class": "Tape",
            "Clips": [source.clone()],
            "MapName": "SongA"
        }))
        .unwrap();

        let mut verse = block("Verse", "SongA", &[]);
        verse.dance_tape = codec::decode_tape(&tape_bytes).unwrap();
        let placements = [BlockPlacement::new(&verse, 1000.0, 2000.0)];
        let tape = assemble(&placements, &context()).unwrap();

        let written: Value = serde_json::from_slice(&codec::encode(&tape).unwrap()).unwrap();
        let mut expected = source;
        expected["StartTime"] = json!(54);
        assert_eq!(written["Clips"], json!([expected]));
    }

    #[test]
    fn placement_span_uses_absolute_end() {
        let verse = block("Verse", "SongA", &[]);
        let mapper = context().mapper().unwrap();
        let span = BlockPlacement::new(&verse, 500.0, 1500.0).grid_span(&mapper);
        assert_eq!(span, TimeSpan { start: 24, duration: 72 });
    }

    #[test]
    fn guids_are_memoized_per_map() {
        let mut guids = MapGuids::new();
        let a = guids.get_or_create("SongA");
        assert_eq!(guids.get_or_create("SongA"), a);
        assert_ne!(guids.get_or_create("SongB"), a);
        assert_eq!(guids.len(), 2);
    }
}
