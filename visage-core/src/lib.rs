//! # visage-core
//!
//! Speech animation engine: turns text into timed mouth-shape (viseme),
//! emotion and transcript commands, with an independent blink loop.
//!
//! ## Architecture
//!
//! ```text
//! text → Tokenizer (classify units, word positions, hold timing)
//!            │
//!            ▼
//!      Vec<Token> → Animator::speak → utterance task ─┐
//!                                                      ├─► RenderSurface
//!      Animator::start_blinking → blink task ──────────┘
//! ```
//!
//! The engine never draws anything itself; it only calls the `RenderSurface`
//! trait supplied by the host.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod engine;
pub mod error;
pub mod ipc;
pub mod surface;
pub mod text;

// Convenience re-exports for downstream crates
pub use engine::{
    Animator, AnimatorConfig, BlinkConfig, BlinkScheduler, DiagnosticsSnapshot, UtteranceHandle,
    UtteranceOutcome, UtteranceReport,
};
pub use error::VisageError;
pub use ipc::events::{PlaybackStatus, PlaybackStatusEvent, RenderChannel, RenderCommand};
pub use surface::{RecordingSurface, RenderSurface, SurfaceHandle};
pub use text::catalog::VisemeCatalog;
pub use text::tokenizer::{tokenize, Token, Tokenizer};
pub use text::{UnitKind, WordPosition};
