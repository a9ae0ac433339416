use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub debounce_ms: u64,
    pub banner_ttl_ms: u64,
    pub llm_provider: String,
    pub download_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            debounce_ms: 400,
            banner_ttl_ms: 3000,
            llm_provider: "openai".into(),
            download_dir: PathBuf::from("."),
        }
    }
}

/// Keys accepted in `console.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    debounce_ms: Option<u64>,
    banner_ttl_ms: Option<u64>,
    llm_provider: Option<String>,
    download_dir: Option<PathBuf>,
}

impl Settings {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn banner_ttl(&self) -> Duration {
        Duration::from_millis(self.banner_ttl_ms)
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file.server_url {
            self.server_url = v;
        }
        if let Some(v) = file.debounce_ms {
            self.debounce_ms = v;
        }
        if let Some(v) = file.banner_ttl_ms {
            self.banner_ttl_ms = v;
        }
        if let Some(v) = file.llm_provider {
            self.llm_provider = v;
        }
        if let Some(v) = file.download_dir {
            self.download_dir = v;
        }
        Ok(())
    }

    /// `APP__*` names win over the bare ones.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__DEBOUNCE_MS") {
            match v.parse() {
                Ok(parsed) => self.debounce_ms = parsed,
                Err(_) => warn!(value = %v, "ignoring non-numeric APP__DEBOUNCE_MS"),
            }
        }
        if let Some(v) = lookup("APP__BANNER_TTL_MS") {
            match v.parse() {
                Ok(parsed) => self.banner_ttl_ms = parsed,
                Err(_) => warn!(value = %v, "ignoring non-numeric APP__BANNER_TTL_MS"),
            }
        }
        if let Some(v) = lookup("APP__LLM_PROVIDER") {
            self.llm_provider = v;
        }
        if let Some(v) = lookup("APP__DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(v);
        }
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Defaults, then the config file if it exists, then the environment.
pub fn load_settings_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    settings.apply_env(lookup);
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
