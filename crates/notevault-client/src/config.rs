//! Environment configuration for the NoteVault client.
//!
//! Every setting has a default except the backend URL and anon key, which
//! `validate()` requires.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NOTEVAULT_URL` | (required) |
//! | `NOTEVAULT_ANON_KEY` | (required) |
//! | `NOTEVAULT_ACCESS_TOKEN` | none |
//! | `NOTEVAULT_PAGE_SIZE` | `6` |
//! | `NOTEVAULT_TIMEOUT_SECS` | `30` |
//! | `NOTEVAULT_PDF_BUCKET` | `pdfs` |
//! | `NOTEVAULT_CONTRIBUTION_BUCKET` | `notes-bucket` |

use std::env;
use std::time::Duration;

use thiserror::Error;

use notevault_core::defaults::{CONTRIBUTION_BUCKET, HTTP_TIMEOUT_SECS, PAGE_SIZE, PDF_BUCKET};
use notevault_store::{BackendEndpoint, ClientConfig};

pub const ENV_URL: &str = "NOTEVAULT_URL";
pub const ENV_ANON_KEY: &str = "NOTEVAULT_ANON_KEY";
pub const ENV_ACCESS_TOKEN: &str = "NOTEVAULT_ACCESS_TOKEN";
pub const ENV_PAGE_SIZE: &str = "NOTEVAULT_PAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "NOTEVAULT_TIMEOUT_SECS";
pub const ENV_PDF_BUCKET: &str = "NOTEVAULT_PDF_BUCKET";
pub const ENV_CONTRIBUTION_BUCKET: &str = "NOTEVAULT_CONTRIBUTION_BUCKET";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Client settings for one backend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub pdf_bucket: String,
    pub contribution_bucket: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            page_size: PAGE_SIZE,
            timeout_secs: HTTP_TIMEOUT_SECS,
            pdf_bucket: PDF_BUCKET.to_string(),
            contribution_bucket: CONTRIBUTION_BUCKET.to_string(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> ConfigResult<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

impl VaultConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            url: get(ENV_URL).unwrap_or_default(),
            anon_key: get(ENV_ANON_KEY).unwrap_or_default(),
            access_token: get(ENV_ACCESS_TOKEN),
            page_size: parse_number(ENV_PAGE_SIZE, get(ENV_PAGE_SIZE), defaults.page_size)?,
            timeout_secs: parse_number(
                ENV_TIMEOUT_SECS,
                get(ENV_TIMEOUT_SECS),
                defaults.timeout_secs,
            )?,
            pdf_bucket: get(ENV_PDF_BUCKET).unwrap_or(defaults.pdf_bucket),
            contribution_bucket: get(ENV_CONTRIBUTION_BUCKET)
                .unwrap_or(defaults.contribution_bucket),
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.url.is_empty() {
            return Err(ConfigError::Missing(ENV_URL));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{} must start with http:// or https://, got: {}",
                ENV_URL, self.url
            )));
        }
        if self.anon_key.is_empty() {
            return Err(ConfigError::Missing(ENV_ANON_KEY));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Validation(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> BackendEndpoint {
        let endpoint = BackendEndpoint::new(&self.url, &self.anon_key);
        match &self.access_token {
            Some(token) => endpoint.with_access_token(token),
            None => endpoint,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new().timeout(Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = VaultConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.page_size, 6);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.pdf_bucket, "pdfs");
        assert_eq!(config.contribution_bucket, "notes-bucket");
        assert!(config.access_token.is_none());
        assert!(matches!(config.validate(), Err(ConfigError::Missing(ENV_URL))));
    }

    #[test]
    fn test_full_environment() {
        let config = VaultConfig::from_lookup(lookup(&[
            (ENV_URL, "https://proj.example.co"),
            (ENV_ANON_KEY, "anon"),
            (ENV_ACCESS_TOKEN, "jwt"),
            (ENV_PAGE_SIZE, "12"),
            (ENV_TIMEOUT_SECS, " 5 "),
            (ENV_PDF_BUCKET, "papers"),
        ]))
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.pdf_bucket, "papers");
        assert_eq!(config.endpoint().access_token.as_deref(), Some("jwt"));
        assert_eq!(config.client_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = VaultConfig::from_lookup(lookup(&[(ENV_PAGE_SIZE, "six")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: ENV_PAGE_SIZE, .. }
        ));
    }

    #[test]
    fn test_validate_rejects_zero_page_size_and_missing_key() {
        let mut config = VaultConfig {
            url: "https://proj.example.co".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing(ENV_ANON_KEY))));

        config.anon_key = "anon".to_string();
        config.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = VaultConfig {
            url: "proj.example.co".to_string(),
            anon_key: "anon".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
