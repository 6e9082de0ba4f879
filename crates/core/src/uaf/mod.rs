//! Typed views over the UAF JSON containers.
//!
//! Every object in these files carries a `__class` discriminant that is kept
//! verbatim. Members that are not modelled here are collected into an
//! `extra` map and written back untouched.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Name of the discriminant member carried by every UAF object.
pub const CLASS_KEY: &str = "__class";

pub const ACTOR_TEMPLATE_CLASS: &str = "Actor_Template";
pub const TAPE_CLASS: &str = "Tape";
pub const MOTION_CLIP_CLASS: &str = "MotionClip";
pub const PICTOGRAM_CLIP_CLASS: &str = "PictogramClip";
pub const TAPE_REFERENCE_CLIP_CLASS: &str = "TapeReferenceClip";
pub const MUSIC_TRACK_COMPONENT_CLASS: &str = "MusicTrackComponent_Template";
pub const MUSIC_TRACK_DATA_CLASS: &str = "MusicTrackData";
pub const MUSIC_TRACK_STRUCTURE_CLASS: &str = "MusicTrackStructure";
pub const MUSIC_SECTION_CLASS: &str = "MusicSection";
pub const BLOCK_FLOW_TEMPLATE_CLASS: &str = "JD_BlockFlowTemplate";
pub const BLOCK_REPLACEMENTS_CLASS: &str = "JD_BlockReplacements";
pub const BLOCK_DESCRIPTOR_CLASS: &str = "JD_BlockDescriptor";

/// Ordered collection of choreography clips for one map.
///
/// Only the clips and the map name are read by the assembler. Clock, bar
/// count and the other tape members stay in `extra`, so a tape read from
/// disk is written back with exactly the members it had.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tape {
    #[serde(rename = "__class", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_name: Option<String>,
}

impl Tape {
    /// Empty tape with the engine defaults used for generated files.
    pub fn new(map_name: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("TapeClock".to_string(), json!(0));
        extra.insert("TapeBarCount".to_string(), json!(1));
        extra.insert("FreeResourcesAfterPlay".to_string(), json!(0));

        Self {
            class: Some(TAPE_CLASS.to_string()),
            clips: Vec::new(),
            extra,
            map_name: Some(map_name.into()),
        }
    }

    /// `MapName`, or an empty string when the tape has none.
    pub fn map_name(&self) -> &str {
        self.map_name.as_deref().unwrap_or_default()
    }
}

/// One clip of a [`Tape`], keyed by its `__class`.
///
/// Every variant carries the same [`ClipBody`]: the class selects the
/// variant, and the class-specific payload (classifier and pictogram paths,
/// colours, platform scoring data) is passed through as-is. Classes other
/// than the three known ones are kept as [`Clip::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clip {
    Motion(ClipBody),
    Pictogram(ClipBody),
    TapeReference(ClipBody),
    Other(ClipBody),
}

impl Clip {
    pub fn body(&self) -> &ClipBody {
        match self {
            Self::Motion(body)
            | Self::Pictogram(body)
            | Self::TapeReference(body)
            | Self::Other(body) => body,
        }
    }

    fn body_mut(&mut self) -> &mut ClipBody {
        match self {
            Self::Motion(body)
            | Self::Pictogram(body)
            | Self::TapeReference(body)
            | Self::Other(body) => body,
        }
    }

    pub fn class(&self) -> &str {
        &self.body().class
    }

    pub fn start_time(&self) -> i64 {
        self.body().start_time
    }

    pub fn duration(&self) -> Option<i64> {
        self.body().duration
    }

    /// Class-specific member, e.g. `PictoPath` or `ClassifierPath`.
    pub fn payload(&self, key: &str) -> Option<&Value> {
        self.body().extra.get(key)
    }

    /// Copy of the clip with its start moved by `offset` grid units. All
    /// other members are left untouched.
    pub fn shifted(&self, offset: i64) -> Self {
        let mut clip = self.clone();
        clip.body_mut().start_time += offset;
        clip
    }
}

impl From<ClipBody> for Clip {
    fn from(body: ClipBody) -> Self {
        match body.class.as_str() {
            MOTION_CLIP_CLASS => Self::Motion(body),
            PICTOGRAM_CLIP_CLASS => Self::Pictogram(body),
            TAPE_REFERENCE_CLIP_CLASS => Self::TapeReference(body),
            _ => Self::Other(body),
        }
    }
}

impl Serialize for Clip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Clip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.get(CLASS_KEY).is_some_and(Value::is_string) {
            return Err(D::Error::custom("clip is missing its `__class` member"));
        }
        serde_json::from_value::<ClipBody>(value)
            .map(Self::from)
            .map_err(D::Error::custom)
    }
}

/// Members shared by every clip class. `StartTime` is required since the
/// assembler moves it; the other common members are written back only when
/// the source had them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClipBody {
    #[serde(rename = "__class")]
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<i64>,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClipBody {
    pub fn new(class: impl Into<String>, start_time: i64) -> Self {
        Self {
            class: class.into(),
            start_time,
            ..Self::default()
        }
    }
}

/// Generic actor template wrapping a list of components.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorTemplate<C> {
    #[serde(rename = "__class")]
    pub class: String,
    #[serde(rename = "WIP")]
    pub wip: i64,
    #[serde(rename = "LOWUPDATE")]
    pub low_update: i64,
    #[serde(rename = "UPDATE_LAYER")]
    pub update_layer: i64,
    #[serde(rename = "PROCEDURAL")]
    pub procedural: i64,
    #[serde(rename = "STARTPAUSED")]
    pub start_paused: i64,
    #[serde(rename = "FORCEISENVIRONMENT")]
    pub force_is_environment: i64,
    #[serde(rename = "COMPONENTS")]
    pub components: Vec<C>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<C> ActorTemplate<C> {
    pub fn with_components(components: Vec<C>) -> Self {
        Self {
            class: ACTOR_TEMPLATE_CLASS.to_string(),
            wip: 0,
            low_update: 0,
            update_layer: 0,
            procedural: 0,
            start_paused: 0,
            force_is_environment: 0,
            components,
            extra: Map::new(),
        }
    }
}

pub type MusicTrack = ActorTemplate<MusicTrackComponent>;
pub type BlockFlow = ActorTemplate<BlockFlowTemplate>;

impl MusicTrack {
    /// Structure of the first component, where markers live.
    pub fn structure(&self) -> Option<&MusicTrackStructure> {
        self.components
            .first()
            .map(|component| &component.track_data.structure)
    }

    pub fn markers(&self) -> &[i64] {
        self.structure()
            .map(|structure| structure.markers.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MusicTrackComponent {
    #[serde(rename = "__class")]
    pub class: String,
    pub track_data: MusicTrackData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicTrackData {
    #[serde(rename = "__class")]
    pub class: String,
    pub structure: MusicTrackStructure,
    pub path: String,
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MusicTrackStructure {
    #[serde(rename = "__class")]
    pub class: String,
    /// Beat positions in native units: milliseconds times 48.
    pub markers: Vec<i64>,
    pub sections: Vec<MusicSection>,
    pub start_beat: i64,
    pub end_beat: i64,
    pub video_start_time: f64,
    pub preview_entry: f64,
    pub preview_loop_start: f64,
    pub preview_loop_end: f64,
    pub volume: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MusicSection {
    #[serde(rename = "__class")]
    pub class: String,
    pub marker: i64,
    pub section_type: i64,
    pub comment: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BlockFlowTemplate {
    #[serde(rename = "__class")]
    pub class: String,
    pub is_mash_up: i64,
    pub is_party_master: i64,
    pub block_descriptor_vector: Vec<BlockReplacements>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BlockReplacements {
    #[serde(rename = "__class")]
    pub class: String,
    pub base_block: BlockDescriptor,
    pub alternative_blocks: Vec<BlockDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockDescriptor {
    #[serde(rename = "__class")]
    pub class: String,
    pub song_name: String,
    /// Spelled this way in the engine's format.
    #[serde(rename = "frstBeat")]
    pub first_beat: i64,
    pub last_beat: i64,
    pub song_switch: i64,
    pub video_coach_offset: [f64; 2],
    pub video_coach_scale: f64,
    pub dance_step_name: String,
    pub playing_speed: f64,
    pub is_entry_point: i64,
    pub is_empty_block: i64,
    pub is_no_score_block: i64,
    pub guid: String,
    pub force_display_last_pictos: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
