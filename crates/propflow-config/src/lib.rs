//! Configuration for Propflow clients.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `propflow_core::GatewayConfig`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use propflow_core::{GatewayConfig, TlsMode};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults applied where a profile is silent.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named back-office profiles (e.g. staging vs. production).
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named back-office profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://backoffice.example.com").
    pub base_url: String,

    /// Bearer token (plaintext -- prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "propflow", "propflow").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("propflow");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("PROPFLOW_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Look up a profile, honoring `default_profile` when `name` is `None`.
pub fn select_profile<'a>(
    config: &'a Config,
    name: Option<&str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let name = match name {
        Some(n) => n,
        None => config.default_profile.as_deref().unwrap_or("default"),
    };
    config
        .profiles
        .get_key_value(name)
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned()))
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the bearer token from the credential chain:
/// profile env var, then system keyring, then plaintext config.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.token_env
        && let Ok(val) = std::env::var(env_name)
    {
        return Ok(SecretString::from(val));
    }

    if let Ok(entry) = keyring::Entry::new("propflow", &format!("{profile_name}/token"))
        && let Ok(secret) = entry.get_password()
    {
        return Ok(SecretString::from(secret));
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store the bearer token in the system keyring for a profile.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new("propflow", &format!("{profile_name}/token"))
        .and_then(|entry| entry.set_password(token))
        .map_err(|e| ConfigError::Validation {
            field: "token".into(),
            reason: format!("keyring rejected the token: {e}"),
        })
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `GatewayConfig` from a profile plus global defaults.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    let base_url: url::Url = profile
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", profile.base_url),
        })?;

    let token = resolve_token(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(GatewayConfig {
        base_url,
        token,
        tls,
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn config_from(toml_str: &str) -> Config {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml_str))
            .extract()
            .unwrap()
    }

    #[test]
    fn parses_profiles_with_defaults() {
        let config = config_from(
            r#"
            default_profile = "staging"

            [defaults]
            timeout = 15

            [profiles.staging]
            base_url = "https://staging.example.com"
            token = "abc123"

            [profiles.production]
            base_url = "https://backoffice.example.com"
            token_env = "PROPFLOW_PROD_TOKEN"
            timeout = 60
            "#,
        );

        assert_eq!(config.default_profile.as_deref(), Some("staging"));
        assert_eq!(config.defaults.timeout, 15);
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles["production"].timeout, Some(60));
    }

    #[test]
    fn select_profile_honors_default_and_rejects_unknown() {
        let config = config_from(
            r#"
            default_profile = "staging"
            [profiles.staging]
            base_url = "https://staging.example.com"
            "#,
        );

        let (name, _) = select_profile(&config, None).unwrap();
        assert_eq!(name, "staging");
        assert!(matches!(
            select_profile(&config, Some("nope")),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn plaintext_token_is_the_last_resort() {
        let profile = Profile {
            base_url: "https://backoffice.example.com".into(),
            token: Some("plain-token".into()),
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        };
        let token = resolve_token(&profile, "it-test-no-keyring").unwrap();
        assert_eq!(token.expose_secret(), "plain-token");
    }

    #[test]
    fn env_token_wins_over_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PROPFLOW_TEST_TOKEN_PRIORITY", "from-env");
            let profile = Profile {
                base_url: "https://backoffice.example.com".into(),
                token: Some("plain-token".into()),
                token_env: Some("PROPFLOW_TEST_TOKEN_PRIORITY".into()),
                ca_cert: None,
                insecure: None,
                timeout: None,
            };
            let token = resolve_token(&profile, "it-test-env").expect("token resolves");
            assert_eq!(token.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn profile_translates_to_gateway_config() {
        let profile = Profile {
            base_url: "https://backoffice.example.com".into(),
            token: Some("abc".into()),
            token_env: None,
            ca_cert: None,
            insecure: Some(true),
            timeout: Some(5),
        };
        let cfg =
            profile_to_gateway_config(&profile, "it-test-translate", &Defaults::default()).unwrap();
        assert_eq!(cfg.base_url.as_str(), "https://backoffice.example.com/");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert!(matches!(cfg.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn invalid_base_url_is_a_validation_error() {
        let profile = Profile {
            base_url: "not a url".into(),
            token: Some("abc".into()),
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        };
        assert!(matches!(
            profile_to_gateway_config(&profile, "p", &Defaults::default()),
            Err(ConfigError::Validation { .. })
        ));
    }
}
