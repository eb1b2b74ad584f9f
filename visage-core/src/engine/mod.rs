//! `Animator`: top-level speech animation controller.
//!
//! ## Lifecycle
//!
//! ```text
//! Animator::new()
//!     └─► power_on()            → powering-on visual, then blink loop started
//!         └─► speak(text)       → Idle → Speaking, utterance task spawned
//!             ├─► speak(other)  → interrupt-stop, settle, Speaking (new utterance)
//!             └─► stop()        → Idle, settle future returned
//! ```
//!
//! ## Tasks
//!
//! Two independent tokio tasks share the render surface and nothing else:
//! the utterance task (one per `speak`, at most one advancing at a time) and
//! the blink loop. Emotion expiry timers are short-lived tasks owned by the
//! playback session.

pub mod blink;
pub mod playback;

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    error::{Result, VisageError},
    ipc::events::{PlaybackStatus, PlaybackStatusEvent},
    surface::SurfaceHandle,
    text::{
        catalog::{VisemeCatalog, DEFAULT_NEUTRAL_VISEME},
        timing::EMOJI_PAUSE_MS,
        tokenizer::{total_hold_ms, Token, Tokenizer},
    },
};

pub use blink::BlinkScheduler;
pub use playback::{
    AnimatorDiagnostics, DiagnosticsSnapshot, UtteranceHandle, UtteranceOutcome, UtteranceReport,
};

/// Broadcast channel capacity for status events.
const BROADCAST_CAP: usize = 256;

/// Blink loop tuning.
#[derive(Debug, Clone)]
pub struct BlinkConfig {
    /// Pause between blink decisions (ms, half-open). Default: 800..2000.
    pub interval_ms: Range<u64>,
    /// How long the eyes stay closed (ms, half-open). Default: 150..350.
    pub closed_ms: Range<u64>,
    /// Chance of blinking at each decision. Default: 0.3.
    pub probability: f64,
    /// Fixed RNG seed for a reproducible schedule. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            interval_ms: 800..2000,
            closed_ms: 150..350,
            probability: 0.3,
            seed: None,
        }
    }
}

impl BlinkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms.is_empty() {
            return Err(VisageError::InvalidConfig(format!(
                "blink interval range {:?} is empty",
                self.interval_ms
            )));
        }
        if self.closed_ms.is_empty() {
            return Err(VisageError::InvalidConfig(format!(
                "blink closed range {:?} is empty",
                self.closed_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(VisageError::InvalidConfig(format!(
                "blink probability {} outside [0, 1]",
                self.probability
            )));
        }
        Ok(())
    }
}

/// Configuration for `Animator`.
#[derive(Debug, Clone)]
pub struct AnimatorConfig {
    /// Resting mouth shape. Default: `"ee"`.
    pub neutral_viseme: String,
    /// Drawable viseme ids. `None` uses letters + digraphs + neutral.
    pub visemes: Option<Vec<String>>,
    /// Hold for emoji / symbol tokens. Default: 250 ms.
    pub emoji_pause_ms: u64,
    /// How long an emotion stays up without being replaced. Default: 2 s.
    pub emotion_duration: Duration,
    /// Grace period after a stop / interrupt. Default: 200 ms.
    pub settle_delay: Duration,
    /// Length of the power-on visual. Default: 1.5 s.
    pub startup_duration: Duration,
    pub blink: BlinkConfig,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            neutral_viseme: DEFAULT_NEUTRAL_VISEME.into(),
            visemes: None,
            emoji_pause_ms: EMOJI_PAUSE_MS,
            emotion_duration: Duration::from_millis(2_000),
            settle_delay: Duration::from_millis(200),
            startup_duration: Duration::from_millis(1_500),
            blink: BlinkConfig::default(),
        }
    }
}

impl AnimatorConfig {
    /// Check every field; also builds the catalog to make sure it is coherent.
    pub fn validate(&self) -> Result<()> {
        self.blink.validate()?;
        self.catalog()?;
        Ok(())
    }

    /// Viseme catalog described by this config.
    pub fn catalog(&self) -> Result<VisemeCatalog> {
        match &self.visemes {
            Some(ids) => VisemeCatalog::new(self.neutral_viseme.clone(), ids.iter().cloned()),
            None => VisemeCatalog::with_neutral(self.neutral_viseme.clone()),
        }
    }
}

/// The top-level animation handle.
///
/// `Animator` is `Send + Sync`; wrap it in `Arc` to share it between the task
/// that feeds it text and anything observing it.
pub struct Animator {
    config: AnimatorConfig,
    tokenizer: Tokenizer,
    playback: playback::Playback,
    blink: BlinkScheduler,
    status_tx: broadcast::Sender<PlaybackStatusEvent>,
    diagnostics: Arc<AnimatorDiagnostics>,
}

impl Animator {
    /// Create an animator drawing on `surface`.
    ///
    /// # Errors
    /// `VisageError::InvalidConfig` / `MissingNeutralViseme` if `config` does
    /// not validate.
    pub fn new(config: AnimatorConfig, surface: SurfaceHandle) -> Result<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        let tokenizer = Tokenizer::new(catalog, config.emoji_pause_ms);

        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);
        let diagnostics = Arc::new(AnimatorDiagnostics::default());

        let playback = playback::Playback::new(playback::PlaybackContext {
            surface: surface.clone(),
            session: Arc::new(Mutex::new(playback::Session::default())),
            status_tx: status_tx.clone(),
            diagnostics: Arc::clone(&diagnostics),
            neutral_viseme: tokenizer.catalog().neutral().to_string(),
            emotion_duration: config.emotion_duration,
            settle_delay: config.settle_delay,
        });
        let blink = BlinkScheduler::new(surface, config.blink.clone(), Arc::clone(&diagnostics));

        info!(
            neutral = tokenizer.catalog().neutral(),
            visemes = tokenizer.catalog().len(),
            "animator created"
        );

        Ok(Self {
            config,
            tokenizer,
            playback,
            blink,
            status_tx,
            diagnostics,
        })
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Tokenize with this animator's catalog and emoji pause. Side-effect free.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        self.tokenizer.tokenize(text)
    }

    /// Start speaking `text`, interrupting whatever is being spoken.
    ///
    /// Ownership of the mouth is claimed synchronously, so two back-to-back
    /// calls always leave the second one in charge. Must be called from
    /// inside a tokio runtime.
    pub fn speak(&self, text: impl Into<String>) -> UtteranceHandle {
        let text = text.into();
        let tokens = self.tokenizer.tokenize(&text);
        let claim = self.playback.begin();

        info!(
            utterance = claim.id,
            chars = text.chars().count(),
            tokens = tokens.len(),
            hold_ms = total_hold_ms(&tokens),
            interrupted_previous = claim.interrupted,
            "utterance queued"
        );

        self.playback.spawn(claim, tokens)
    }

    /// Stop speaking and reset the mouth, emotion and transcript.
    ///
    /// The reset happens before this returns; the returned future resolves
    /// once the settle delay has passed, counted from this call rather than
    /// from the first poll. Calling it while idle is a no-op (apart from
    /// clearing an emotion that outlived its utterance) and still resolves.
    /// Must be called inside a tokio runtime.
    pub fn stop(&self) -> impl Future<Output = ()> + Send + 'static {
        self.playback.halt("stopped");
        tokio::time::sleep(self.config.settle_delay)
    }

    /// Start the blink loop.
    ///
    /// # Errors
    /// `VisageError::AlreadyBlinking` if it is already running.
    pub fn start_blinking(&self) -> Result<()> {
        self.blink.start()
    }

    /// Stop the blink loop and open the eyes. No-op if not running.
    pub fn stop_blinking(&self) {
        self.blink.stop();
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_running()
    }

    /// Power-on visual for `startup_duration`, then start blinking.
    pub async fn power_on(&self) -> Result<()> {
        debug!(duration_ms = self.config.startup_duration.as_millis() as u64, "powering on");
        self.playback.surface().set_powering_on(true);
        tokio::time::sleep(self.config.startup_duration).await;
        self.playback.surface().set_powering_on(false);
        self.start_blinking()?;
        info!("animator powered on");
        Ok(())
    }

    /// Current playback status (snapshot).
    pub fn status(&self) -> PlaybackStatus {
        self.playback.status()
    }

    /// Text revealed so far by the current utterance.
    pub fn transcript(&self) -> String {
        self.playback.transcript()
    }

    /// Emotion currently shown, if its timer has not fired yet.
    pub fn current_emotion(&self) -> Option<String> {
        self.playback.current_emotion()
    }

    /// Subscribe to playback status transitions.
    pub fn subscribe_status(&self) -> broadcast::Receiver<PlaybackStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of counters for observability.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        AnimatorConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_blink_range_is_rejected() {
        let mut config = AnimatorConfig::default();
        config.blink.closed_ms = 300..300;
        assert!(matches!(
            config.validate(),
            Err(VisageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn probability_must_be_a_fraction() {
        let mut config = AnimatorConfig::default();
        config.blink.probability = 1.5;
        assert!(config.validate().is_err());
        config.blink.probability = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_catalog_needs_neutral() {
        let config = AnimatorConfig {
            visemes: Some(vec!["a".into(), "o".into()]),
            ..AnimatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(VisageError::MissingNeutralViseme(_))
        ));
    }
}
