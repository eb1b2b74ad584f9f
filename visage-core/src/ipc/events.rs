//! Render commands and playback status events.
//!
//! ## Channels
//!
//! | Type | Producer |
//! |------|----------|
//! | `RenderCommand` | every `RenderSurface` call, mirrored by recording / JSON surfaces |
//! | `PlaybackStatusEvent` | `Animator::subscribe_status()` broadcast |

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Render commands
// ---------------------------------------------------------------------------

/// One call on the render surface, as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum RenderCommand {
    SetViseme { id: String },
    SetEmotion { id: String },
    ClearEmotion,
    SetEyesClosed { closed: bool },
    AppendTranscript { text: String },
    ClearTranscript,
    SetPoweringOn { on: bool },
}

impl RenderCommand {
    /// Which visual channel the command writes to.
    pub fn channel(&self) -> RenderChannel {
        match self {
            Self::SetViseme { .. } => RenderChannel::Mouth,
            Self::SetEmotion { .. } | Self::ClearEmotion => RenderChannel::Emotion,
            Self::SetEyesClosed { .. } => RenderChannel::Eyes,
            Self::AppendTranscript { .. } | Self::ClearTranscript => RenderChannel::Transcript,
            Self::SetPoweringOn { .. } => RenderChannel::Power,
        }
    }

    /// Serialize as a single JSON line (newline-terminated) into `out`.
    pub fn write_json_line<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// Independent last-write-wins channels of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderChannel {
    Mouth,
    Emotion,
    Eyes,
    Transcript,
    Power,
}

// ---------------------------------------------------------------------------
// Playback status events
// ---------------------------------------------------------------------------

/// Emitted whenever the playback controller changes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatusEvent {
    pub status: PlaybackStatus,
    /// Utterance the transition belongs to.
    pub utterance: u64,
    /// Optional human-readable detail (e.g. "interrupted").
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing is being spoken.
    Idle,
    /// An utterance owns the mouth / emotion / transcript channels.
    Speaking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_command_serializes_with_cmd_tag() {
        let json = serde_json::to_value(RenderCommand::SetViseme { id: "th".into() })
            .expect("serialize viseme command");
        assert_eq!(json["cmd"], "setViseme");
        assert_eq!(json["id"], "th");

        let json = serde_json::to_value(RenderCommand::ClearEmotion).expect("serialize clear");
        assert_eq!(json, serde_json::json!({ "cmd": "clearEmotion" }));

        let json = serde_json::to_value(RenderCommand::SetEyesClosed { closed: true })
            .expect("serialize eyes command");
        assert_eq!(json["cmd"], "setEyesClosed");
        assert_eq!(json["closed"], true);
    }

    #[test]
    fn render_command_parses_from_wire() {
        let cmd: RenderCommand =
            serde_json::from_str(r#"{"cmd":"appendTranscript","text":"h"}"#).expect("parse");
        assert_eq!(cmd, RenderCommand::AppendTranscript { text: "h".into() });
        assert!(serde_json::from_str::<RenderCommand>(r#"{"cmd":"SetViseme","id":"a"}"#).is_err());
    }

    #[test]
    fn json_line_is_newline_terminated() {
        let mut out = Vec::new();
        RenderCommand::SetEmotion { id: "😊".into() }
            .write_json_line(&mut out)
            .expect("write line");
        let line = String::from_utf8(out).expect("utf8");
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains("\"setEmotion\""));
    }

    #[test]
    fn channels_are_orthogonal() {
        assert_eq!(
            RenderCommand::SetViseme { id: "a".into() }.channel(),
            RenderChannel::Mouth
        );
        assert_eq!(
            RenderCommand::SetEyesClosed { closed: false }.channel(),
            RenderChannel::Eyes
        );
        assert_eq!(RenderCommand::ClearTranscript.channel(), RenderChannel::Transcript);
    }

    #[test]
    fn status_event_serializes_with_lowercase_status() {
        let event = PlaybackStatusEvent {
            status: PlaybackStatus::Speaking,
            utterance: 4,
            detail: None,
        };
        let json = serde_json::to_value(&event).expect("serialize status event");
        assert_eq!(json["status"], "speaking");
        assert_eq!(json["utterance"], 4);
        assert!(json["detail"].is_null());
    }
}
