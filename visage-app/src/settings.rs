//! Persistent host settings (JSON file in the user data directory).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use visage_core::{AnimatorConfig, BlinkConfig};

const MAX_VISEMES: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    pub pace_profile: String,
    pub neutral_viseme: String,
    /// Drawable viseme ids; empty means letters + digraphs.
    pub visemes: Vec<String>,
    pub emoji_pause_ms: u64,
    pub emotion_duration_ms: u64,
    pub settle_delay_ms: u64,
    pub startup_duration_ms: u64,
    pub blink_enabled: bool,
    pub blink_probability: f64,
    pub blink_interval_min_ms: u64,
    pub blink_interval_max_ms: u64,
    pub blink_closed_min_ms: u64,
    pub blink_closed_max_ms: u64,
    pub blink_seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            pace_profile: "natural".into(),
            neutral_viseme: "ee".into(),
            visemes: Vec::new(),
            emoji_pause_ms: 250,
            emotion_duration_ms: 2_000,
            settle_delay_ms: 200,
            startup_duration_ms: 1_500,
            blink_enabled: true,
            blink_probability: 0.3,
            blink_interval_min_ms: 800,
            blink_interval_max_ms: 2_000,
            blink_closed_min_ms: 150,
            blink_closed_max_ms: 350,
            blink_seed: None,
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        let defaults = Self::default();

        self.pace_profile = normalize_pace_profile(&self.pace_profile);
        self.neutral_viseme = self.neutral_viseme.trim().to_string();
        if self.neutral_viseme.is_empty() {
            self.neutral_viseme = defaults.neutral_viseme;
        }
        self.visemes = normalize_visemes(&self.visemes, &self.neutral_viseme);

        self.emoji_pause_ms = self.emoji_pause_ms.clamp(0, 5_000);
        self.emotion_duration_ms = self.emotion_duration_ms.clamp(100, 60_000);
        self.settle_delay_ms = self.settle_delay_ms.clamp(0, 5_000);
        self.startup_duration_ms = self.startup_duration_ms.clamp(0, 10_000);

        self.blink_probability = if self.blink_probability.is_nan() {
            defaults.blink_probability
        } else {
            self.blink_probability.clamp(0.0, 1.0)
        };
        (self.blink_interval_min_ms, self.blink_interval_max_ms) =
            normalize_range(self.blink_interval_min_ms, self.blink_interval_max_ms, 50, 60_000);
        (self.blink_closed_min_ms, self.blink_closed_max_ms) =
            normalize_range(self.blink_closed_min_ms, self.blink_closed_max_ms, 20, 5_000);
    }

    /// Core config for these settings, with the pace profile applied.
    pub fn to_animator_config(&self) -> AnimatorConfig {
        let mut config = AnimatorConfig {
            neutral_viseme: self.neutral_viseme.clone(),
            visemes: (!self.visemes.is_empty()).then(|| self.visemes.clone()),
            emoji_pause_ms: self.emoji_pause_ms,
            emotion_duration: Duration::from_millis(self.emotion_duration_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            startup_duration: Duration::from_millis(self.startup_duration_ms),
            blink: BlinkConfig {
                interval_ms: self.blink_interval_min_ms..self.blink_interval_max_ms,
                closed_ms: self.blink_closed_min_ms..self.blink_closed_max_ms,
                probability: self.blink_probability,
                seed: self.blink_seed,
            },
        };
        apply_pace_profile(&mut config, &self.pace_profile);
        config
    }
}

pub fn normalize_pace_profile(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "brisk" | "fast" | "snappy" => "brisk".into(),
        "dramatic" | "slow" | "theatrical" => "dramatic".into(),
        _ => "natural".into(),
    }
}

pub fn apply_pace_profile(config: &mut AnimatorConfig, profile: &str) {
    match profile {
        "brisk" => {
            config.emotion_duration = scale(config.emotion_duration, 3, 5);
            config.settle_delay = scale(config.settle_delay, 1, 2);
        }
        "dramatic" => {
            config.emotion_duration = scale(config.emotion_duration, 3, 2);
            config.settle_delay = scale(config.settle_delay, 2, 1);
        }
        // natural
        _ => {}
    }
}

fn scale(d: Duration, num: u64, den: u64) -> Duration {
    Duration::from_millis(d.as_millis() as u64 * num / den)
}

fn normalize_visemes(raw: &[String], neutral: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in raw {
        let id = id.trim();
        if id.is_empty() || out.iter().any(|v| v == id) {
            continue;
        }
        out.push(id.to_string());
        if out.len() >= MAX_VISEMES {
            break;
        }
    }
    if !out.is_empty() && !out.iter().any(|v| v == neutral) {
        out.push(neutral.to_string());
    }
    out
}

/// Clamp both ends into `[floor, ceil]` and keep the range non-empty.
fn normalize_range(min: u64, max: u64, floor: u64, ceil: u64) -> (u64, u64) {
    let min = min.clamp(floor, ceil - 1);
    let max = max.clamp(min + 1, ceil);
    (min, max)
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Lattice Labs")
            .join("Visage")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("visage")
            .join("settings.json")
    }
}

pub fn load_settings(path: &Path) -> AppSettings {
    let mut settings = fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<AppSettings>(&raw).ok())
        .unwrap_or_default();
    settings.normalize();
    settings
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
