use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{
    parse_service_url,
    session::{DEFAULT_QUEUE_CAPACITY, DEFAULT_TYPING_DELAY},
    OverlapPolicy, SessionOptions, DEFAULT_REQUEST_TIMEOUT,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "complaint_bot.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: String,
    pub typing_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub queue_capacity: usize,
    pub overlap_policy: OverlapPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5000".into(),
            typing_delay_ms: u64::try_from(DEFAULT_TYPING_DELAY.as_millis())
                .unwrap_or(u64::MAX),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overlap_policy: OverlapPolicy::Queue,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    service_url: Option<String>,
    typing_delay_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    queue_capacity: Option<usize>,
    overlap_policy: Option<String>,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            typing_delay: Duration::from_millis(self.typing_delay_ms),
            queue_capacity: self.queue_capacity,
            overlap: self.overlap_policy,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        parse_service_url(&self.service_url)?;
        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
///
/// A missing file is only an error when `config_path` was given explicitly.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// [`load_settings`] with the environment supplied by `lookup`.
pub fn load_settings_with(
    config_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(error) if error.kind() == io::ErrorKind::NotFound && config_path.is_none() => {}
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, lookup)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.service_url {
        settings.service_url = v;
    }
    if let Some(v) = file_cfg.typing_delay_ms {
        settings.typing_delay_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.queue_capacity {
        settings.queue_capacity = v;
    }
    if let Some(v) = file_cfg.overlap_policy {
        settings.overlap_policy = v.parse::<OverlapPolicy>().map_err(anyhow::Error::msg)?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("APP__SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = lookup("APP__TYPING_DELAY_MS") {
        settings.typing_delay_ms = parse_env("APP__TYPING_DELAY_MS", &v)?;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_env("APP__REQUEST_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = lookup("APP__QUEUE_CAPACITY") {
        settings.queue_capacity = parse_env("APP__QUEUE_CAPACITY", &v)?;
    }
    if let Some(v) = lookup("APP__OVERLAP_POLICY") {
        settings.overlap_policy = v
            .parse::<OverlapPolicy>()
            .map_err(anyhow::Error::msg)
            .context("invalid APP__OVERLAP_POLICY")?;
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {key} value '{value}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
