use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    codec::{self, UafAsset},
    tempo::{self, TempoMatch},
    uaf::{MusicTrack, Tape},
    MashupError, Result,
};

/// Files that make up one block folder, relative to the folder itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFiles {
    pub music_track: PathBuf,
    pub video: PathBuf,
    pub dance_tape: PathBuf,
}

impl BlockFiles {
    pub fn for_block(dir: &Path, name: &str) -> Self {
        Self {
            music_track: dir.join("audio").join(format!("{name}_musictrack.tpl.ckd")),
            video: dir.join("videoscoach").join(format!("{name}.webm")),
            dance_tape: dir
                .join("timeline")
                .join(format!("{name}_tml_dance.dtape.ckd")),
        }
    }
}

/// A decoded, ready-to-place choreography block.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub bpm: u32,
    pub video_path: PathBuf,
    pub music_track: MusicTrack,
    pub dance_tape: Tape,
}

impl Block {
    /// Map name the block's choreography was authored for.
    pub fn source_map_name(&self) -> &str {
        self.dance_tape.map_name()
    }
}

/// Loads the block stored in `dir`, named after the folder.
///
/// All three files must be present and both JSON assets must decode;
/// otherwise the whole block is rejected.
pub fn load_block(dir: &Path) -> Result<Block> {
    let name = dir
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| MashupError::msg(format!("`{}` is not a block folder", dir.display())))?
        .to_string();
    let files = BlockFiles::for_block(dir, &name);

    if !files.video.is_file() {
        return Err(MashupError::msg(format!(
            "block `{name}` has no coach video at `{}`",
            files.video.display()
        )));
    }

    let music_track = codec::decode_music_track(&fs::read(&files.music_track)?)?;
    let dance_tape = codec::decode_tape(&fs::read(&files.dance_tape)?)?;
    let second_marker = music_track
        .markers()
        .get(1)
        .copied()
        .ok_or_else(|| MashupError::malformed(MusicTrack::KIND, "fewer than two structure markers"))?;
    let bpm = tempo::derive_bpm(second_marker as f64)
        .map_err(|err| MashupError::malformed(MusicTrack::KIND, err.to_string()))?;

    tracing::debug!(block = %name, bpm, clips = dance_tape.clips.len(), "loaded block");

    Ok(Block {
        name,
        bpm,
        video_path: files.video,
        music_track,
        dance_tape,
    })
}

/// Summary line used when listing blocks.
#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub name: String,
    pub bpm: u32,
    pub tempo: TempoMatch,
}

/// Registry of every block that loaded successfully, keyed by name.
#[derive(Debug, Default)]
pub struct BlockLibrary {
    blocks: BTreeMap<String, Block>,
}

impl BlockLibrary {
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
        }
    }

    /// Loads every immediate subdirectory of `root` as a block.
    ///
    /// A block that fails to load is skipped and does not affect the others.
    /// Only failing to list `root` itself is an error.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut library = Self::new();
        let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            match load_block(&dir) {
                Ok(block) => library.register(block),
                Err(err) => {
                    tracing::warn!(folder = %dir.display(), error = %err, "skipping block");
                }
            }
        }

        tracing::info!(root = %root.display(), blocks = library.len(), "block library loaded");
        Ok(library)
    }

    pub fn register(&mut self, block: Block) {
        self.blocks.insert(block.name.clone(), block);
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Blocks whose name contains `query` (case-insensitive) or whose BPM,
    /// written in decimal, contains it.
    pub fn search(&self, query: &str) -> Vec<&Block> {
        let query = query.to_lowercase();
        self.blocks
            .values()
            .filter(|block| {
                block.name.to_lowercase().contains(&query)
                    || block.bpm.to_string().contains(&query)
            })
            .collect()
    }

    /// Summaries of `blocks` with their tempo match against `project_bpm`.
    pub fn summarize<'a>(
        blocks: impl IntoIterator<Item = &'a Block>,
        project_bpm: u32,
    ) -> Vec<BlockSummary> {
        blocks
            .into_iter()
            .map(|block| BlockSummary {
                name: block.name.clone(),
                bpm: block.bpm,
                tempo: TempoMatch::classify(block.bpm, project_bpm),
            })
            .collect()
    }
}
