//! Client configuration.
//!
//! Sources, highest priority first: command-line flags (and their `ORCA_*`
//! env fallbacks, resolved by clap), the TOML file, built-in defaults.
//!
//! ```toml
//! server_url = "https://orca.example.com"
//! session_ready_timeout_secs = 180   # 0 waits forever
//! request_timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use orca_client::ClientConfig;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub session_ready_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub server_url: Option<Url>,
    pub session_ready_timeout_secs: Option<u64>,
}

/// Read the config file. A missing file is only an error when the path was
/// given explicitly.
pub fn load_file(path: &Path, explicit: bool) -> anyhow::Result<FileConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn resolve(file: FileConfig, overrides: Overrides) -> anyhow::Result<ClientConfig> {
    let defaults = ClientConfig::default();

    let server_url = match (overrides.server_url, file.server_url) {
        (Some(url), _) => url,
        (None, Some(raw)) => {
            Url::parse(&raw).with_context(|| format!("invalid server_url {raw:?}"))?
        }
        (None, None) => defaults.server_url,
    };

    let session_ready_timeout = match overrides
        .session_ready_timeout_secs
        .or(file.session_ready_timeout_secs)
    {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => defaults.session_ready_timeout,
    };

    let request_timeout = file
        .request_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(defaults.request_timeout);

    Ok(ClientConfig {
        server_url,
        session_ready_timeout,
        request_timeout,
    })
}
