//! Utterance playback loop.
//!
//! ## Per token
//!
//! ```text
//! 1. Lock session; bail out if this utterance is no longer current
//! 2. Append text to transcript, set viseme, maybe swap emotion (+ expiry timer)
//! 3. Unlock, wait `hold_ms` (a zero hold still yields once)
//! ```
//!
//! Every command the loop emits is issued while holding the session lock,
//! right after the "still current" check. `begin()` and `halt()` flip that
//! state under the same lock, so once they return the superseded loop cannot
//! emit anything else. Cancellation is cooperative: a running hold is never
//! cut short, the check simply happens when it ends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    ipc::events::{PlaybackStatus, PlaybackStatusEvent},
    surface::SurfaceHandle,
    text::tokenizer::Token,
};

#[derive(Default)]
pub struct AnimatorDiagnostics {
    pub utterances_started: AtomicUsize,
    pub utterances_completed: AtomicUsize,
    pub utterances_interrupted: AtomicUsize,
    pub tokens_rendered: AtomicUsize,
    pub emotions_shown: AtomicUsize,
    pub emotions_expired: AtomicUsize,
    pub blinks: AtomicUsize,
}

impl AnimatorDiagnostics {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            utterances_started: self.utterances_started.load(Ordering::Relaxed),
            utterances_completed: self.utterances_completed.load(Ordering::Relaxed),
            utterances_interrupted: self.utterances_interrupted.load(Ordering::Relaxed),
            tokens_rendered: self.tokens_rendered.load(Ordering::Relaxed),
            emotions_shown: self.emotions_shown.load(Ordering::Relaxed),
            emotions_expired: self.emotions_expired.load(Ordering::Relaxed),
            blinks: self.blinks.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub utterances_started: usize,
    pub utterances_completed: usize,
    pub utterances_interrupted: usize,
    pub tokens_rendered: usize,
    pub emotions_shown: usize,
    pub emotions_expired: usize,
    pub blinks: usize,
}

/// How an utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Every token was rendered and the mouth returned to neutral.
    Completed,
    /// A `stop()` or a newer `speak()` took over first.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtteranceReport {
    pub id: u64,
    pub outcome: UtteranceOutcome,
    pub tokens_rendered: usize,
    /// Text revealed by this utterance before it ended.
    pub transcript: String,
}

/// Completion handle returned by `Animator::speak`.
pub struct UtteranceHandle {
    id: u64,
    task: JoinHandle<UtteranceReport>,
}

impl UtteranceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the utterance to complete or be interrupted.
    ///
    /// A panic inside the render surface is re-raised here.
    pub async fn wait(self) -> UtteranceReport {
        match self.task.await {
            Ok(report) => report,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => UtteranceReport {
                id: self.id,
                outcome: UtteranceOutcome::Interrupted,
                tokens_rendered: 0,
                transcript: String::new(),
            },
        }
    }
}

impl std::fmt::Debug for UtteranceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtteranceHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

struct ActiveEmotion {
    id: String,
    seq: u64,
    timer: JoinHandle<()>,
}

/// Mutable playback state, owned by the controller.
#[derive(Default)]
pub(crate) struct Session {
    /// Id of the newest utterance; only it may render.
    utterance: u64,
    active: bool,
    transcript: String,
    emotion: Option<ActiveEmotion>,
    emotion_seq: u64,
}

impl Session {
    fn is_current(&self, id: u64) -> bool {
        self.active && self.utterance == id
    }
}

/// Result of claiming the controller for a new utterance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Claim {
    pub id: u64,
    /// A previous utterance was cut off; the new one waits the settle delay.
    pub interrupted: bool,
}

/// All context the playback loop needs, passed as one struct so spawns stay tidy.
pub(crate) struct PlaybackContext {
    pub surface: SurfaceHandle,
    pub session: Arc<Mutex<Session>>,
    pub status_tx: broadcast::Sender<PlaybackStatusEvent>,
    pub diagnostics: Arc<AnimatorDiagnostics>,
    pub neutral_viseme: String,
    pub emotion_duration: Duration,
    pub settle_delay: Duration,
}

#[derive(Clone)]
pub(crate) struct Playback {
    ctx: Arc<PlaybackContext>,
}

impl Playback {
    pub fn new(ctx: PlaybackContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.ctx.surface
    }

    pub fn status(&self) -> PlaybackStatus {
        if self.ctx.session.lock().active {
            PlaybackStatus::Speaking
        } else {
            PlaybackStatus::Idle
        }
    }

    pub fn transcript(&self) -> String {
        self.ctx.session.lock().transcript.clone()
    }

    pub fn current_emotion(&self) -> Option<String> {
        self.ctx.session.lock().emotion.as_ref().map(|e| e.id.clone())
    }

    /// Claim the controller, interrupt-stopping any active utterance.
    pub fn begin(&self) -> Claim {
        let mut session = self.ctx.session.lock();
        let interrupted = session.active;
        if interrupted {
            self.halt_locked(&mut session, "interrupted");
        }

        session.utterance += 1;
        session.active = true;
        let id = session.utterance;
        self.ctx
            .diagnostics
            .utterances_started
            .fetch_add(1, Ordering::Relaxed);
        self.send_status(PlaybackStatus::Speaking, id, None);

        Claim { id, interrupted }
    }

    /// Spawn the utterance task for a claim obtained from `begin()`.
    pub fn spawn(&self, claim: Claim, tokens: Vec<Token>) -> UtteranceHandle {
        let playback = self.clone();
        let task = tokio::spawn(async move { playback.run(claim, tokens).await });
        UtteranceHandle { id: claim.id, task }
    }

    /// Stop whatever is active. Idle: only a lingering emotion is cleared.
    pub fn halt(&self, reason: &str) {
        let mut session = self.ctx.session.lock();
        if session.active {
            self.halt_locked(&mut session, reason);
        } else if let Some(emotion) = session.emotion.take() {
            emotion.timer.abort();
            self.ctx.surface.clear_emotion();
            debug!(emotion = %emotion.id, "cleared lingering emotion while idle");
        }
    }

    fn halt_locked(&self, session: &mut Session, reason: &str) {
        session.active = false;
        session.transcript.clear();
        if let Some(emotion) = session.emotion.take() {
            emotion.timer.abort();
        }

        let surface = &self.ctx.surface;
        surface.set_viseme(&self.ctx.neutral_viseme);
        surface.clear_emotion();
        surface.clear_transcript();

        self.ctx
            .diagnostics
            .utterances_interrupted
            .fetch_add(1, Ordering::Relaxed);
        info!(utterance = session.utterance, reason, "utterance halted");
        self.send_status(PlaybackStatus::Idle, session.utterance, Some(reason.to_string()));
    }

    async fn run(self, claim: Claim, tokens: Vec<Token>) -> UtteranceReport {
        let mut report = UtteranceReport {
            id: claim.id,
            outcome: UtteranceOutcome::Interrupted,
            tokens_rendered: 0,
            transcript: String::new(),
        };

        if claim.interrupted {
            tokio::time::sleep(self.ctx.settle_delay).await;
        }

        {
            let mut session = self.ctx.session.lock();
            if !session.is_current(claim.id) {
                debug!(utterance = claim.id, "superseded before first token");
                return report;
            }
            session.transcript.clear();
            self.ctx.surface.clear_transcript();
        }

        for token in &tokens {
            {
                let mut session = self.ctx.session.lock();
                if !session.is_current(claim.id) {
                    debug!(
                        utterance = claim.id,
                        rendered = report.tokens_rendered,
                        "superseded mid-utterance"
                    );
                    return report;
                }
                self.render_locked(&mut session, token);
            }
            report.tokens_rendered += 1;
            report.transcript.push_str(&token.text);

            hold(token.hold_ms).await;
        }

        let mut session = self.ctx.session.lock();
        if !session.is_current(claim.id) {
            return report;
        }
        self.ctx.surface.set_viseme(&self.ctx.neutral_viseme);
        session.active = false;
        self.ctx
            .diagnostics
            .utterances_completed
            .fetch_add(1, Ordering::Relaxed);
        self.send_status(PlaybackStatus::Idle, claim.id, None);
        debug!(utterance = claim.id, tokens = report.tokens_rendered, "utterance completed");

        report.outcome = UtteranceOutcome::Completed;
        report
    }

    fn render_locked(&self, session: &mut Session, token: &Token) {
        let surface = &self.ctx.surface;

        session.transcript.push_str(&token.text);
        surface.append_transcript(&token.text);
        surface.set_viseme(&token.viseme);

        if let Some(emotion) = &token.emotion {
            self.show_emotion_locked(session, emotion);
        }

        self.ctx
            .diagnostics
            .tokens_rendered
            .fetch_add(1, Ordering::Relaxed);
    }

    fn show_emotion_locked(&self, session: &mut Session, id: &str) {
        if let Some(previous) = session.emotion.take() {
            previous.timer.abort();
            self.ctx.surface.clear_emotion();
        }

        session.emotion_seq += 1;
        let seq = session.emotion_seq;
        self.ctx.surface.set_emotion(id);
        self.ctx
            .diagnostics
            .emotions_shown
            .fetch_add(1, Ordering::Relaxed);

        let playback = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(playback.ctx.emotion_duration).await;
            playback.expire_emotion(seq);
        });

        session.emotion = Some(ActiveEmotion {
            id: id.to_string(),
            seq,
            timer,
        });
    }

    /// Clear the emotion only if it is still the one timer `seq` was armed for.
    fn expire_emotion(&self, seq: u64) {
        let mut session = self.ctx.session.lock();
        if session.emotion.as_ref().map(|e| e.seq) != Some(seq) {
            return;
        }
        if let Some(emotion) = session.emotion.take() {
            self.ctx.surface.clear_emotion();
            self.ctx
                .diagnostics
                .emotions_expired
                .fetch_add(1, Ordering::Relaxed);
            debug!(emotion = %emotion.id, "emotion expired");
        }
    }

    fn send_status(&self, status: PlaybackStatus, utterance: u64, detail: Option<String>) {
        let _ = self.ctx.status_tx.send(PlaybackStatusEvent {
            status,
            utterance,
            detail,
        });
    }
}

/// Wait out one token. Zero still yields so no token is skipped unseen.
async fn hold(ms: u64) {
    if ms == 0 {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
