use std::path::PathBuf;

use orbitguard_api_client::{DEFAULT_SERVER_URL, HttpTransportConfig};

pub const ENV_SERVER_URL: &str = "ORBITGUARD_SERVER_URL";
pub const ENV_SERVER_URL_LEGACY: &str = "ORBITGUARD_BASE_URL";
pub const ENV_SESSION_PATH: &str = "ORBITGUARD_SESSION_PATH";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "ORBITGUARD_REQUEST_TIMEOUT_MS";
pub const SERVER_URL_SOURCE_FLAG: &str = "flag";
pub const SERVER_URL_SOURCE_DEFAULT: &str = "default_local";
pub const SESSION_FILE_NAME: &str = "session.v1.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("server url must not be empty")]
    EmptyServerUrl,
    #[error("server url must use http:// or https:// and include a host")]
    InvalidServerUrl,
    #[error("invalid ORBITGUARD_REQUEST_TIMEOUT_MS: {0}")]
    InvalidRequestTimeout(String),
}

/// Values supplied on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub session_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub server_url_source: String,
    pub session_path: PathBuf,
    pub request_timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, env_non_empty)
    }

    pub fn resolve(
        overrides: ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (server_url, server_url_source) = if let Some(flag) = overrides.server_url {
            (
                normalize_server_url(&flag)?,
                SERVER_URL_SOURCE_FLAG.to_string(),
            )
        } else if let Some(value) = lookup(ENV_SERVER_URL) {
            (normalize_server_url(&value)?, ENV_SERVER_URL.to_string())
        } else if let Some(value) = lookup(ENV_SERVER_URL_LEGACY) {
            (
                normalize_server_url(&value)?,
                ENV_SERVER_URL_LEGACY.to_string(),
            )
        } else {
            (
                normalize_server_url(DEFAULT_SERVER_URL)?,
                SERVER_URL_SOURCE_DEFAULT.to_string(),
            )
        };

        let session_path = overrides
            .session_path
            .or_else(|| lookup(ENV_SESSION_PATH).map(PathBuf::from))
            .unwrap_or_else(default_session_path);

        let request_timeout_ms = lookup(ENV_REQUEST_TIMEOUT_MS)
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|error| ConfigError::InvalidRequestTimeout(error.to_string()))
            })
            .transpose()?;

        Ok(Self {
            server_url,
            server_url_source,
            session_path,
            request_timeout_ms,
        })
    }

    #[must_use]
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            base_url: self.server_url.clone(),
            timeout_ms: self.request_timeout_ms,
        }
    }
}

pub fn normalize_server_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyServerUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidServerUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidServerUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidServerUrl);
    }
    Ok(trimmed.to_string())
}

#[must_use]
pub fn default_session_path() -> PathBuf {
    if let Some(mut data_dir) = dirs::data_local_dir() {
        data_dir.push("orbitguard");
        data_dir.push(SESSION_FILE_NAME);
        return data_dir;
    }

    if let Some(mut home_dir) = dirs::home_dir() {
        home_dir.push(".orbitguard");
        home_dir.push(SESSION_FILE_NAME);
        return home_dir;
    }

    PathBuf::from(SESSION_FILE_NAME)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local_server() {
        let config = ClientConfig::resolve(ConfigOverrides::default(), lookup_from(&[]))
            .expect("default config");
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.server_url_source, SERVER_URL_SOURCE_DEFAULT);
        assert_eq!(config.request_timeout_ms, None);
        assert!(config.session_path.ends_with(SESSION_FILE_NAME));
    }

    #[test]
    fn flag_beats_primary_env_which_beats_legacy() {
        let lookup = lookup_from(&[
            (ENV_SERVER_URL, "https://primary.orbit.test/"),
            (ENV_SERVER_URL_LEGACY, "https://legacy.orbit.test"),
        ]);
        let from_env =
            ClientConfig::resolve(ConfigOverrides::default(), &lookup).expect("env config");
        assert_eq!(from_env.server_url, "https://primary.orbit.test");
        assert_eq!(from_env.server_url_source, ENV_SERVER_URL);

        let flagged = ClientConfig::resolve(
            ConfigOverrides {
                server_url: Some("http://10.0.0.5:8080".to_string()),
                session_path: Some(PathBuf::from("/tmp/og.json")),
            },
            &lookup,
        )
        .expect("flag config");
        assert_eq!(flagged.server_url, "http://10.0.0.5:8080");
        assert_eq!(flagged.server_url_source, SERVER_URL_SOURCE_FLAG);
        assert_eq!(flagged.session_path, PathBuf::from("/tmp/og.json"));

        let legacy = ClientConfig::resolve(
            ConfigOverrides::default(),
            lookup_from(&[(ENV_SERVER_URL_LEGACY, "https://legacy.orbit.test/")]),
        )
        .expect("legacy config");
        assert_eq!(legacy.server_url_source, ENV_SERVER_URL_LEGACY);
    }

    #[test]
    fn server_url_requires_scheme_and_host() {
        assert_eq!(
            normalize_server_url("localhost:8080"),
            Err(ConfigError::InvalidServerUrl)
        );
        assert_eq!(
            normalize_server_url("http:///list"),
            Err(ConfigError::InvalidServerUrl)
        );
        assert_eq!(normalize_server_url("  "), Err(ConfigError::EmptyServerUrl));
    }

    #[test]
    fn timeout_must_be_numeric() {
        let error = ClientConfig::resolve(
            ConfigOverrides::default(),
            lookup_from(&[(ENV_REQUEST_TIMEOUT_MS, "soon")]),
        )
        .expect_err("invalid timeout");
        assert!(matches!(error, ConfigError::InvalidRequestTimeout(_)));

        let config = ClientConfig::resolve(
            ConfigOverrides::default(),
            lookup_from(&[(ENV_REQUEST_TIMEOUT_MS, "5000")]),
        )
        .expect("timeout config");
        assert_eq!(config.transport_config().timeout_ms, Some(5_000));
    }
}
