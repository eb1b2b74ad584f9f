//! Render surface abstraction.
//!
//! The `RenderSurface` trait decouples the engine from any presentation layer
//! (terminal, webview, game engine sprite, test recorder).
//!
//! Methods take `&self`: the playback loop and the blink loop call into the
//! same surface from different tasks, and the channels they touch (mouth /
//! emotion / transcript vs. eyes) are independent. Implementations keep their
//! own interior mutability per channel.
//!
//! Calls are infallible from the engine's point of view. A surface that can
//! no longer render (closed pipe, dropped socket) must panic rather than drop
//! commands. A panic inside a surface call ends the utterance task and
//! resurfaces from `UtteranceHandle::wait`.

pub mod recording;

pub use recording::{RecordedCommand, RecordingSurface};

use std::sync::Arc;

use crate::ipc::events::RenderCommand;

/// Contract for render backends.
///
/// The engine calls these methods while holding its playback (or blink)
/// state lock, which is not re-entrant. An implementation must not call back
/// into the `Animator` (`status`, `transcript`, `speak`, `stop_blinking`,
/// `is_blinking`, ...) from inside a method; doing so deadlocks. Hand the work to
/// another task instead.
pub trait RenderSurface: Send + Sync + 'static {
    /// Show mouth shape `id`.
    fn set_viseme(&self, id: &str);

    /// Show emotion icon `id`.
    fn set_emotion(&self, id: &str);

    /// Remove the emotion icon.
    fn clear_emotion(&self);

    /// Toggle the blink visual.
    fn set_eyes_closed(&self, closed: bool);

    /// Reveal `text` at the end of the transcript.
    fn append_transcript(&self, text: &str);

    /// Reset the transcript to empty.
    fn clear_transcript(&self);

    /// Start-up ("power on") visual. Optional.
    fn set_powering_on(&self, _on: bool) {}
}

/// Thread-safe reference-counted handle to any `RenderSurface` implementor.
#[derive(Clone)]
pub struct SurfaceHandle(pub Arc<dyn RenderSurface>);

impl SurfaceHandle {
    /// Wrap any `RenderSurface` in a `SurfaceHandle`.
    pub fn new<S: RenderSurface>(surface: S) -> Self {
        Self(Arc::new(surface))
    }

    /// Share an already reference-counted surface (keeps the caller's `Arc`).
    pub fn from_arc<S: RenderSurface>(surface: Arc<S>) -> Self {
        Self(surface)
    }

    /// Dispatch a command value onto the surface.
    pub fn apply(&self, command: &RenderCommand) {
        let surface = &self.0;
        match command {
            RenderCommand::SetViseme { id } => surface.set_viseme(id),
            RenderCommand::SetEmotion { id } => surface.set_emotion(id),
            RenderCommand::ClearEmotion => surface.clear_emotion(),
            RenderCommand::SetEyesClosed { closed } => surface.set_eyes_closed(*closed),
            RenderCommand::AppendTranscript { text } => surface.append_transcript(text),
            RenderCommand::ClearTranscript => surface.clear_transcript(),
            RenderCommand::SetPoweringOn { on } => surface.set_powering_on(*on),
        }
    }
}

impl std::ops::Deref for SurfaceHandle {
    type Target = dyn RenderSurface;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle").finish_non_exhaustive()
    }
}
