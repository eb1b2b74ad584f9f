//! `JsonLinesSurface`: every render command becomes one JSON line.
//!
//! A front end (browser page, game engine, another process) reads the lines
//! and draws the face. Once the output is gone nothing can be rendered, so a
//! failed write panics. The utterance task carries the panic to
//! `UtteranceHandle::wait`, and calls made directly from `main` abort the host.

use std::io::{self, Write};

use parking_lot::Mutex;
use visage_core::{RenderCommand, RenderSurface};

pub struct JsonLinesSurface<W: Write + Send + 'static> {
    out: Mutex<W>,
}

impl JsonLinesSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> JsonLinesSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, command: RenderCommand) {
        let mut out = self.out.lock();
        let written = command
            .write_json_line(&mut *out)
            .and_then(|()| out.flush().map_err(Into::into));
        if let Err(e) = written {
            panic!("render output failed: {e}");
        }
    }
}

impl<W: Write + Send + 'static> RenderSurface for JsonLinesSurface<W> {
    fn set_viseme(&self, id: &str) {
        self.emit(RenderCommand::SetViseme { id: id.to_string() });
    }

    fn set_emotion(&self, id: &str) {
        self.emit(RenderCommand::SetEmotion { id: id.to_string() });
    }

    fn clear_emotion(&self) {
        self.emit(RenderCommand::ClearEmotion);
    }

    fn set_eyes_closed(&self, closed: bool) {
        self.emit(RenderCommand::SetEyesClosed { closed });
    }

    fn append_transcript(&self, text: &str) {
        self.emit(RenderCommand::AppendTranscript {
            text: text.to_string(),
        });
    }

    fn clear_transcript(&self) {
        self.emit(RenderCommand::ClearTranscript);
    }

    fn set_powering_on(&self, on: bool) {
        self.emit(RenderCommand::SetPoweringOn { on });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_command() {
        let surface = JsonLinesSurface::new(Vec::new());
        surface.set_powering_on(true);
        surface.append_transcript("h");
        surface.set_viseme("h");
        surface.clear_emotion();

        let out = String::from_utf8(surface.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], r#"{"cmd":"setPoweringOn","on":true}"#);
        assert_eq!(lines[3], r#"{"cmd":"clearEmotion"}"#);

        let parsed: RenderCommand = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(parsed, RenderCommand::SetViseme { id: "h".into() });
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    #[should_panic(expected = "render output failed")]
    fn write_failure_panics() {
        let surface = JsonLinesSurface::new(Closed);
        surface.set_viseme("a");
    }

    #[tokio::test]
    async fn write_failure_surfaces_through_utterance() {
        use visage_core::{Animator, AnimatorConfig, SurfaceHandle};

        let animator = Animator::new(
            AnimatorConfig::default(),
            SurfaceHandle::new(JsonLinesSurface::new(Closed)),
        )
        .unwrap();
        let handle = animator.speak("hi");

        let outcome = tokio::spawn(handle.wait()).await;
        let panic = outcome.unwrap_err().into_panic();
        let message = panic
            .downcast_ref::<String>()
            .map(String::as_str)
            .unwrap_or_default();
        assert!(message.contains("render output failed"), "got {message:?}");
    }
}
