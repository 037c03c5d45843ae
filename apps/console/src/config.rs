use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::protocol::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CONFIG_PATH: &str = "docdesk.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub access_token: Option<String>,
    pub page_size: u32,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    access_token: Option<String>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.server_url {
            self.server_url = v;
        }
        if let Some(v) = file.access_token {
            self.access_token = Some(v);
        }
        if let Some(v) = file.page_size {
            self.page_size = v.max(1);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(v.max(1));
        }
    }

    /// Environment overrides; unparsable numbers are ignored.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DOCDESK_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("DOCDESK_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(v) = lookup("DOCDESK_PAGE_SIZE") {
            if let Ok(parsed) = v.parse::<u32>() {
                self.page_size = parsed.max(1);
            }
        }
        if let Some(v) = lookup("DOCDESK_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout = Duration::from_secs(parsed.max(1));
            }
        }
    }
}

/// Defaults, then the TOML file, then `DOCDESK_*` environment variables.
///
/// A missing file is only an error when its path was given explicitly.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file);
        }
        Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}
