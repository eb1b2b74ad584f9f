//! Visage terminal host.
//!
//! Reads text from stdin, one utterance per line, and streams the resulting
//! render commands to stdout as JSON lines. Logs go to stderr so stdout stays
//! machine-readable.
//!
//! ## Input
//!
//! | Line | Effect |
//! |------|--------|
//! | `/stop` | stop the current utterance |
//! | `/quit` | stop and exit |
//! | anything else | speak it, interrupting the current utterance |
//!
//! At end of input the host lets the last utterance finish before exiting.

mod settings;
mod surface;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use visage_core::{Animator, PlaybackStatus, SurfaceHandle, UtteranceHandle};

use settings::{default_settings_path, load_settings, save_settings};
use surface::JsonLinesSurface;

const USAGE: &str =
    "Usage: visage [--settings <file.json>] [--seed <n>] [--no-blink] [--init-settings]";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    settings_path: Option<PathBuf>,
    seed: Option<u64>,
    no_blink: bool,
    init_settings: bool,
    help: bool,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--settings" => {
                let Some(v) = it.next() else {
                    return Err("missing value for --settings".into());
                };
                args.settings_path = Some(PathBuf::from(v));
            }
            "--seed" => {
                let Some(v) = it.next() else {
                    return Err("missing value for --seed".into());
                };
                args.seed = Some(
                    v.parse::<u64>()
                        .map_err(|_| format!("invalid value for --seed: {v}"))?,
                );
            }
            "--no-blink" => args.no_blink = true,
            "--init-settings" => args.init_settings = true,
            "--help" | "-h" => args.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Stop,
    Quit,
    Speak(&'a str),
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.trim() {
        "" => Input::Blank,
        "/stop" => Input::Stop,
        "/quit" => Input::Quit,
        _ => Input::Speak(line),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("visage=info")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1)).map_err(|e| anyhow::anyhow!("{e}\n{USAGE}"))?;
    if args.help {
        eprintln!("{USAGE}");
        return Ok(());
    }

    // ── Settings ──────────────────────────────────────────────────────────
    let settings_path = args
        .settings_path
        .clone()
        .unwrap_or_else(default_settings_path);
    let mut app_settings = load_settings(&settings_path);
    if args.init_settings {
        save_settings(&settings_path, &app_settings)
            .with_context(|| format!("writing {}", settings_path.display()))?;
        info!(settings_path = ?settings_path, "settings written");
        return Ok(());
    }
    if args.seed.is_some() {
        app_settings.blink_seed = args.seed;
    }
    if args.no_blink {
        app_settings.blink_enabled = false;
    }
    info!(
        settings_path = ?settings_path,
        pace_profile = %app_settings.pace_profile,
        neutral_viseme = %app_settings.neutral_viseme,
        blink_enabled = app_settings.blink_enabled,
        blink_seed = ?app_settings.blink_seed,
        "settings loaded"
    );

    // ── Animator ──────────────────────────────────────────────────────────
    let config = app_settings.to_animator_config();
    let animator = Arc::new(
        Animator::new(config, SurfaceHandle::new(JsonLinesSurface::stdout()))
            .context("settings do not form a valid animator config")?,
    );

    let mut status_rx = animator.subscribe_status();
    let status_task = tokio::spawn(async move {
        loop {
            match status_rx.recv().await {
                Ok(event) => match event.status {
                    PlaybackStatus::Speaking => info!(utterance = event.utterance, "speaking"),
                    PlaybackStatus::Idle => info!(
                        utterance = event.utterance,
                        detail = event.detail.as_deref().unwrap_or("completed"),
                        "idle"
                    ),
                },
                Err(RecvError::Lagged(n)) => {
                    warn!("status receiver lagged by {n} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    animator.power_on().await?;
    if !app_settings.blink_enabled {
        animator.stop_blinking();
        debug!("blinking disabled by settings");
    }

    // ── Input loop ────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current: Option<UtteranceHandle> = None;
    let mut quit = false;

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match parse_input(&line) {
            Input::Blank => {}
            Input::Stop => {
                animator.stop().await;
                current = None;
            }
            Input::Quit => {
                quit = true;
                break;
            }
            Input::Speak(text) => {
                current = Some(animator.speak(text));
            }
        }
    }

    if quit {
        animator.stop().await;
    } else if let Some(handle) = current.take() {
        let report = handle.wait().await;
        info!(
            utterance = report.id,
            outcome = ?report.outcome,
            tokens = report.tokens_rendered,
            "last utterance finished"
        );
    }

    animator.stop_blinking();
    let diag = animator.diagnostics_snapshot();
    info!(
        utterances_started = diag.utterances_started,
        utterances_completed = diag.utterances_completed,
        utterances_interrupted = diag.utterances_interrupted,
        tokens_rendered = diag.tokens_rendered,
        emotions_shown = diag.emotions_shown,
        blinks = diag.blinks,
        "visage exiting"
    );

    drop(animator);
    status_task.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args, String> {
        parse_args(raw.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_use_defaults() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn all_flags_parse() {
        let parsed = args(&[
            "--settings",
            "/tmp/v.json",
            "--seed",
            "9",
            "--no-blink",
            "--init-settings",
        ])
        .unwrap();
        assert_eq!(parsed.settings_path, Some(PathBuf::from("/tmp/v.json")));
        assert_eq!(parsed.seed, Some(9));
        assert!(parsed.no_blink);
        assert!(parsed.init_settings);
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(args(&["--seed"]).unwrap_err().contains("missing value"));
        assert!(args(&["--seed", "x"]).unwrap_err().contains("invalid value"));
        assert!(args(&["--loud"]).unwrap_err().contains("unknown argument"));
    }

    #[test]
    fn input_lines() {
        assert_eq!(parse_input("/stop"), Input::Stop);
        assert_eq!(parse_input(" /quit \r"), Input::Quit);
        assert_eq!(parse_input("   "), Input::Blank);
        assert_eq!(parse_input("hello there\r"), Input::Speak("hello there"));
        assert_eq!(parse_input("/stopped"), Input::Speak("/stopped"));
    }
}
