//! Reading and writing of UAF JSON containers.
//!
//! Files produced by extraction tools are often padded with trailing null
//! bytes, which are removed before the payload is parsed. Nothing is padded
//! on write.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    uaf::{BlockFlow, MusicTrack, Tape},
    MashupError, Result,
};

/// A container type the codec knows how to check and decode.
pub trait UafAsset: Serialize + DeserializeOwned {
    /// Human readable kind used in error messages.
    const KIND: &'static str;

    /// Structural checks performed on the raw JSON before typed decoding.
    fn validate(value: &Value) -> Result<()>;
}

impl UafAsset for MusicTrack {
    const KIND: &'static str = "music track";

    /// Requires `COMPONENTS[0].trackData.structure.markers[1]`, the marker
    /// tempo is derived from, to be a non-zero number.
    fn validate(value: &Value) -> Result<()> {
        let markers = value
            .get("COMPONENTS")
            .and_then(|components| components.get(0))
            .and_then(|component| component.get("trackData"))
            .and_then(|track_data| track_data.get("structure"))
            .and_then(|structure| structure.get("markers"))
            .ok_or_else(|| MashupError::malformed(Self::KIND, "missing structure markers"))?;

        match markers.get(1).map(Value::as_f64) {
            Some(Some(marker)) if marker != 0.0 => Ok(()),
            Some(Some(_)) => Err(MashupError::malformed(Self::KIND, "second marker is zero")),
            Some(None) => Err(MashupError::malformed(
                Self::KIND,
                "second marker is not a number",
            )),
            None => Err(MashupError::malformed(
                Self::KIND,
                "fewer than two structure markers",
            )),
        }
    }
}

impl UafAsset for Tape {
    const KIND: &'static str = "tape";

    fn validate(value: &Value) -> Result<()> {
        if value.is_null() {
            return Err(MashupError::malformed(Self::KIND, "document is null"));
        }
        Ok(())
    }
}

impl UafAsset for BlockFlow {
    const KIND: &'static str = "block flow";

    fn validate(value: &Value) -> Result<()> {
        if value.is_null() {
            return Err(MashupError::malformed(Self::KIND, "document is null"));
        }
        Ok(())
    }
}

/// Returns `bytes` without its trailing run of zero bytes.
pub fn strip_null_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&byte| byte != 0)
        .map_or(0, |index| index + 1);
    &bytes[..end]
}

/// Decodes raw file contents into JSON after stripping null padding.
pub fn decode_value(kind: &'static str, bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(strip_null_padding(bytes))
        .map_err(|err| MashupError::malformed(kind, format!("invalid UTF-8: {err}")))?;
    serde_json::from_str(text)
        .map_err(|err| MashupError::malformed(kind, format!("invalid JSON: {err}")))
}

/// Decodes and validates a container of type `T`.
///
/// Every failure is reported as [`MashupError::MalformedAsset`].
pub fn decode<T: UafAsset>(bytes: &[u8]) -> Result<T> {
    let value = decode_value(T::KIND, bytes)?;
    T::validate(&value)?;
    serde_json::from_value(value)
        .map_err(|err| MashupError::malformed(T::KIND, format!("unexpected shape: {err}")))
}

pub fn decode_music_track(bytes: &[u8]) -> Result<MusicTrack> {
    decode(bytes)
}

pub fn decode_tape(bytes: &[u8]) -> Result<Tape> {
    decode(bytes)
}

/// Encodes a container as compact JSON.
pub fn encode<T: UafAsset>(asset: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(asset)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::uaf::{Clip, ClipBody, PICTOGRAM_CLIP_CLASS};

    fn music_track_json(markers: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "__class": "Actor_Template",
            "WIP": 0, "LOWUPDATE": 0, "UPDATE_LAYER": 0, "PROCEDURAL": 0,
            "STARTPAUSED": 0, "FORCEISENVIRONMENT": 0,
            "COMPONENTS": [{
                "__class": "MusicTrackComponent_Template",
                "trackData": {
                    "__class": "MusicTrackData",
                    "structure": {
                        "__class": "MusicTrackStructure",
                        "markers": markers,
                        "sections": [],
                        "startBeat": -4,
                        "endBeat": 300,
                        "videoStartTime": 0,
                        "previewEntry": 84,
                        "previewLoopStart": 84,
                        "previewLoopEnd": 200,
                        "volume": 0,
                        "fadeInDuration": 0
                    },
                    "path": "world/maps/block/audio/block.wav",
                    "url": "jmcs://jd-contents/block/block.ogg"
                }
            }]
        }))
        .unwrap()
    }

    fn sample_tape() -> Tape {
        let mut tape = Tape::new("Block");
        let mut body = ClipBody::new(PICTOGRAM_CLIP_CLASS, 24);
        body.id = Some(7);
        body.track_id = Some(1);
        body.is_active = Some(1);
        body.duration = Some(48);
        body.extra.insert(
            "PictoPath".to_string(),
            json!("world/maps/block/timeline/pictos/a.png"),
        );
        tape.clips.push(Clip::from(body));
        tape
    }

    #[test]
    fn strips_only_trailing_nulls() {
        assert_eq!(strip_null_padding(b"{}\0\0\0"), b"{}");
        assert_eq!(strip_null_padding(b"\0{}"), b"\0{}");
        assert_eq!(strip_null_padding(b"\0\0"), b"");
        assert_eq!(strip_null_padding(b""), b"");
    }

    #[test]
    fn padding_does_not_change_the_result() {
        let bytes = music_track_json(json!([0, 23040, 46080]));
        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0, 0, 0]);

        let plain = decode_music_track(&bytes).unwrap();
        let cleaned = decode_music_track(&padded).unwrap();
        assert_eq!(plain, cleaned);
        assert_eq!(cleaned.markers()[1], 23_040);
    }

    #[test]
    fn music_track_requires_second_marker() {
        for markers in [json!([]), json!([0]), json!([0, null])] {
            let err = decode_music_track(&music_track_json(markers)).unwrap_err();
            assert!(matches!(err, MashupError::MalformedAsset { .. }));
        }

        let err = decode_music_track(br#"{"COMPONENTS": []}"#).unwrap_err();
        assert!(format!("{err}").contains("music track"));
    }

    #[test]
    fn music_track_rejects_zero_or_non_numeric_second_marker() {
        for markers in [json!([0, 0]), json!([0, 0.0]), json!([0, "23040"]), json!([0, false])] {
            let err = decode_music_track(&music_track_json(markers)).unwrap_err();
            assert!(matches!(err, MashupError::MalformedAsset { .. }));
        }

        let err = decode_music_track(&music_track_json(json!([0, 0]))).unwrap_err();
        assert!(format!("{err}").contains("second marker is zero"));
    }

    #[test]
    fn rejects_non_json_and_null() {
        assert!(matches!(
            decode_tape(b"not json\0").unwrap_err(),
            MashupError::MalformedAsset { .. }
        ));
        assert!(matches!(
            decode_tape(b"null\0\0").unwrap_err(),
            MashupError::MalformedAsset { .. }
        ));
        assert!(matches!(
            decode_tape(&[0xff, 0xfe, b'{', b'}']).unwrap_err(),
            MashupError::MalformedAsset { .. }
        ));
    }

    #[test]
    fn tape_round_trips() {
        let tape = sample_tape();
        let bytes = encode(&tape).unwrap();
        assert_eq!(decode_tape(&bytes).unwrap(), tape);
        assert!(!bytes.ends_with(&[0]));
    }

    #[test]
    fn encoding_keeps_source_key_order() {
        let source = br#"{"__class":"Tape","Clips":[{"__class":"MotionClip","StartTime":0,"Zeta":1,"Alpha":2}],"TapeClock":0,"MapName":"B"}"#;
        let tape = decode_tape(source).unwrap();
        assert_eq!(encode(&tape).unwrap(), source.to_vec());
    }

    #[test]
    fn music_track_round_trips_with_unknown_members() {
        let track = decode_music_track(&music_track_json(json!([0, 23040]))).unwrap();
        let structure = track.structure().unwrap();
        assert_eq!(structure.extra["fadeInDuration"], json!(0));

        let bytes = encode(&track).unwrap();
        assert_eq!(decode_music_track(&bytes).unwrap(), track);

        let reencoded: Value = serde_json::from_slice(&bytes).unwrap();
        let original: Value = serde_json::from_slice(&music_track_json(json!([0, 23040]))).unwrap();
        assert_eq!(
            reencoded["COMPONENTS"][0]["trackData"]["structure"]["markers"],
            original["COMPONENTS"][0]["trackData"]["structure"]["markers"]
        );
        assert_eq!(reencoded["__class"], json!("Actor_Template"));
    }
}
