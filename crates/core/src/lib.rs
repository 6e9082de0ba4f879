//! Core library for Mashup Studio.
//!
//! Blocks of pre-recorded choreography are placed on a millisecond timeline
//! and exported as UAF game assets. The engine counts time on a discrete,
//! non-uniform beat grid, so every placement is snapped onto a grid built
//! from the project's beat markers before the blocks' clips are merged into
//! one dance tape.

pub mod assets;
pub mod codec;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod tempo;
pub mod timeline;
pub mod uaf;

pub use assets::{load_block, Block, BlockLibrary, BlockSummary};
pub use codec::{decode, decode_music_track, decode_tape, encode, UafAsset};
pub use config::{AppConfig, ExportConfig, PlacementEntry, ProjectDefaults, ProjectFile};
pub use error::{MashupError, Result};
pub use export::{ExportBundle, Exporter, OutputNames};
pub use grid::{BeatGrid, MappingMode, TimeMapper, TimeSpan};
pub use tempo::{derive_bpm, generate_beats, BeatSequence, TempoMatch};
pub use timeline::{assemble, BlockPlacement, ProjectBeatContext};
pub use uaf::{BlockFlow, Clip, ClipBody, MusicTrack, Tape};
