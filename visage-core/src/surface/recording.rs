//! `RecordingSurface`: keeps every render command with its time offset.
//!
//! Used by tests and by embedders that want to replay or inspect a
//! performance. Offsets come from the tokio clock, so they follow virtual time
//! under `#[tokio::test(start_paused = true)]`.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::RenderSurface;
use crate::ipc::events::{RenderChannel, RenderCommand};

/// A command together with when it arrived, relative to surface creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub at: Duration,
    pub command: RenderCommand,
}

pub struct RecordingSurface {
    origin: Instant,
    log: Mutex<Vec<RecordedCommand>>,
}

impl RecordingSurface {
    /// Must be called inside a tokio runtime (the clock is tokio's).
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            log: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, command: RenderCommand) {
        let at = self.origin.elapsed();
        self.log.lock().push(RecordedCommand { at, command });
    }

    /// Snapshot of everything recorded so far, with offsets.
    pub fn recorded(&self) -> Vec<RecordedCommand> {
        self.log.lock().clone()
    }

    /// Snapshot of the commands only.
    pub fn commands(&self) -> Vec<RenderCommand> {
        self.log.lock().iter().map(|r| r.command.clone()).collect()
    }

    /// Commands on a single channel, in order.
    pub fn channel(&self, channel: RenderChannel) -> Vec<RenderCommand> {
        self.log
            .lock()
            .iter()
            .filter(|r| r.command.channel() == channel)
            .map(|r| r.command.clone())
            .collect()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<RecordedCommand> {
        std::mem::take(&mut *self.log.lock())
    }

    /// Transcript as a viewer would currently see it.
    pub fn visible_transcript(&self) -> String {
        let mut text = String::new();
        for record in self.log.lock().iter() {
            match &record.command {
                RenderCommand::AppendTranscript { text: t } => text.push_str(t),
                RenderCommand::ClearTranscript => text.clear(),
                _ => {}
            }
        }
        text
    }

    /// Last emotion shown, `None` if cleared or never set.
    pub fn visible_emotion(&self) -> Option<String> {
        let mut emotion = None;
        for record in self.log.lock().iter() {
            match &record.command {
                RenderCommand::SetEmotion { id } => emotion = Some(id.clone()),
                RenderCommand::ClearEmotion => emotion = None,
                _ => {}
            }
        }
        emotion
    }

    /// Last viseme shown.
    pub fn visible_viseme(&self) -> Option<String> {
        self.log.lock().iter().rev().find_map(|r| match &r.command {
            RenderCommand::SetViseme { id } => Some(id.clone()),
            _ => None,
        })
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for RecordingSurface {
    fn set_viseme(&self, id: &str) {
        self.push(RenderCommand::SetViseme { id: id.to_string() });
    }

    fn set_emotion(&self, id: &str) {
        self.push(RenderCommand::SetEmotion { id: id.to_string() });
    }

    fn clear_emotion(&self) {
        self.push(RenderCommand::ClearEmotion);
    }

    fn set_eyes_closed(&self, closed: bool) {
        self.push(RenderCommand::SetEyesClosed { closed });
    }

    fn append_transcript(&self, text: &str) {
        self.push(RenderCommand::AppendTranscript {
            text: text.to_string(),
        });
    }

    fn clear_transcript(&self) {
        self.push(RenderCommand::ClearTranscript);
    }

    fn set_powering_on(&self, on: bool) {
        self.push(RenderCommand::SetPoweringOn { on });
    }
}
