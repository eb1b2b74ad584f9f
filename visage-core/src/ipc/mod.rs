//! Wire types for whatever presentation layer consumes the engine.
//!
//! All types derive `serde::Serialize` + `serde::Deserialize` so hosts can
//! forward them verbatim (JSON lines, websocket frames, webview events).

pub mod events;
