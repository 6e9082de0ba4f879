use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Map;

use crate::{
    codec::{self, UafAsset},
    config::ExportConfig,
    tempo::NATIVE_UNITS_PER_BEAT,
    timeline::{self, BlockPlacement, MapGuids, ProjectBeatContext},
    uaf::{
        ActorTemplate, BlockDescriptor, BlockFlow, BlockFlowTemplate, BlockReplacements,
        MusicTrack, MusicTrackComponent, MusicTrackData, MusicTrackStructure, Tape,
        BLOCK_DESCRIPTOR_CLASS, BLOCK_FLOW_TEMPLATE_CLASS, BLOCK_REPLACEMENTS_CLASS,
        MUSIC_TRACK_COMPONENT_CLASS, MUSIC_TRACK_DATA_CLASS, MUSIC_TRACK_STRUCTURE_CLASS,
    },
    Result,
};

/// Output file names for a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub dance_tape: String,
    pub music_track: String,
    pub main_sequence: String,
    pub block_flow: String,
}

impl OutputNames {
    pub fn for_map(map_name: &str) -> Self {
        Self {
            dance_tape: format!("{map_name}_tml_dance.dtape.ckd"),
            music_track: format!("{map_name}_musictrack.tpl.ckd"),
            main_sequence: format!("{map_name}_mainsequence.tape.ckd"),
            block_flow: format!("{map_name}_blockflow.tpl.ckd"),
        }
    }
}

/// Music track describing the project audio, with one marker per project
/// beat.
pub fn music_track(context: &ProjectBeatContext, settings: &ExportConfig) -> Result<MusicTrack> {
    context.require_beats()?;

    let lower = context.map_name.to_lowercase();
    let markers = context
        .beats
        .iter()
        .map(|beat| beat * NATIVE_UNITS_PER_BEAT as i64)
        .collect();

    let structure = MusicTrackStructure {
        class: MUSIC_TRACK_STRUCTURE_CLASS.to_string(),
        markers,
        sections: Vec::new(),
        start_beat: 0,
        end_beat: 0,
        video_start_time: 0.0,
        preview_entry: 0.0,
        preview_loop_start: settings.preview_loop_start,
        preview_loop_end: settings.preview_loop_end,
        volume: settings.volume,
        extra: Map::new(),
    };

    let component = MusicTrackComponent {
        class: MUSIC_TRACK_COMPONENT_CLASS.to_string(),
        track_data: MusicTrackData {
            class: MUSIC_TRACK_DATA_CLASS.to_string(),
            structure,
            path: format!("world/maps/{lower}/audio/{lower}.wav"),
            url: format!("jmcs://jd-contents/{lower}/{lower}.ogg"),
            extra: Map::new(),
        },
        extra: Map::new(),
    };

    Ok(ActorTemplate::with_components(vec![component]))
}

/// Main sequence tape for the map. It starts without clips.
pub fn main_sequence(context: &ProjectBeatContext) -> Tape {
    Tape::new(context.map_name.clone())
}

/// Block flow listing every placement as a base block without
/// alternatives. Only the first placement is an entry point.
pub fn block_flow(
    placements: &[BlockPlacement<'_>],
    context: &ProjectBeatContext,
) -> Result<BlockFlow> {
    let mapper = context.mapper()?;
    let mut guids = MapGuids::new();

    let descriptors = placements
        .iter()
        .enumerate()
        .map(|(index, placement)| {
            let song_name = placement.block.source_map_name().to_string();
            let span = placement.grid_span(&mapper);
            let base_block = BlockDescriptor {
                class: BLOCK_DESCRIPTOR_CLASS.to_string(),
                guid: guids.get_or_create(&song_name).to_string(),
                song_name,
                first_beat: span.start,
                last_beat: span.duration,
                song_switch: 0,
                video_coach_offset: [0.0, 0.0],
                video_coach_scale: 1.0,
                dance_step_name: placement.block.name.clone(),
                playing_speed: 1.0,
                is_entry_point: i64::from(index == 0),
                is_empty_block: 0,
                is_no_score_block: 0,
                force_display_last_pictos: 0,
                extra: Map::new(),
            };

            BlockReplacements {
                class: BLOCK_REPLACEMENTS_CLASS.to_string(),
                base_block,
                alternative_blocks: Vec::new(),
                extra: Map::new(),
            }
        })
        .collect();

    Ok(ActorTemplate::with_components(vec![BlockFlowTemplate {
        class: BLOCK_FLOW_TEMPLATE_CLASS.to_string(),
        is_mash_up: 1,
        is_party_master: 0,
        block_descriptor_vector: descriptors,
        extra: Map::new(),
    }]))
}

/// Every file generated for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub map_name: String,
    pub dance_tape: Tape,
    pub music_track: MusicTrack,
    pub main_sequence: Tape,
    pub block_flow: Option<BlockFlow>,
}

/// Builds and writes export bundles.
#[derive(Debug, Default)]
pub struct Exporter {
    settings: ExportConfig,
}

impl Exporter {
    pub fn new(settings: ExportConfig) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportConfig {
        &self.settings
    }

    pub fn build(
        &self,
        placements: &[BlockPlacement<'_>],
        context: &ProjectBeatContext,
    ) -> Result<ExportBundle> {
        let block_flow = if self.settings.write_block_flow {
            Some(block_flow(placements, context)?)
        } else {
            None
        };

        Ok(ExportBundle {
            map_name: context.map_name.clone(),
            dance_tape: timeline::assemble(placements, context)?,
            music_track: music_track(context, &self.settings)?,
            main_sequence: main_sequence(context),
            block_flow,
        })
    }

    /// Writes `bundle` into `out_dir`, creating it when needed, and returns
    /// the written paths.
    pub fn write(&self, bundle: &ExportBundle, out_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)?;
        let names = OutputNames::for_map(&bundle.map_name);

        let mut written = vec![
            write_asset(out_dir, &names.dance_tape, &bundle.dance_tape)?,
            write_asset(out_dir, &names.music_track, &bundle.music_track)?,
            write_asset(out_dir, &names.main_sequence, &bundle.main_sequence)?,
        ];
        if let Some(block_flow) = &bundle.block_flow {
            written.push(write_asset(out_dir, &names.block_flow, block_flow)?);
        }

        tracing::info!(out_dir = %out_dir.display(), files = written.len(), "export written");
        Ok(written)
    }
}

fn write_asset<T: UafAsset>(out_dir: &Path, name: &str, asset: &T) -> Result<PathBuf> {
    let path = out_dir.join(name);
    fs::write(&path, codec::encode(asset)?)?;
    tracing::debug!(path = %path.display(), kind = T::KIND, "wrote asset");
    Ok(path)
}
