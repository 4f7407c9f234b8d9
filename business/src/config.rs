use std::any::Any;

use origin_states::{State, state_assign_impl};
use serde::Deserialize;
use thiserror::Error;

use crate::pagination::DEFAULT_PAGE_SIZE;

const ENV_PREFIX: &str = "ORIGIN_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read ORIGIN_* environment: {0}")]
    Env(#[from] serde_env::Error),

    #[error("ORIGIN_PAGE_SIZE must be at least 1")]
    ZeroPageSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConfig {
    /// First path segment of the dashboard, e.g. `origin` in `/origin/assets/..`.
    pub base_url: String,
    pub page_size: usize,
}

// Raw `ORIGIN_*` variables, prefix stripped.
#[derive(Debug, Deserialize)]
struct RawConfig {
    base_url: Option<String>,
    page_size: Option<usize>,
}

impl BusinessConfig {
    pub fn new(base_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            base_url: base_url.into(),
            page_size,
        }
    }

    /// Read `ORIGIN_BASE_URL` and `ORIGIN_PAGE_SIZE`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let scoped: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(ENV_PREFIX)
                    .map(|stripped| (stripped.to_owned(), value.as_ref().to_owned()))
            })
            .collect();

        let raw: RawConfig = serde_env::from_iter(scoped)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = match raw.base_url {
            Some(url) => url.trim_matches('/').to_owned(),
            None => defaults.base_url,
        };

        let page_size = match raw.page_size {
            Some(0) => return Err(ConfigError::ZeroPageSize),
            Some(size) => size,
            None => defaults.page_size,
        };

        log::debug!("Config: base_url={base_url}, page_size={page_size}");
        Ok(Self {
            base_url,
            page_size,
        })
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            base_url: "origin".to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl State for BusinessConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_variables() {
        let config = BusinessConfig::from_vars(Vec::<(String, String)>::new())
            .expect("empty environment should use defaults");

        assert_eq!(config, BusinessConfig::default(), "no variables yields the defaults");
        assert_eq!(config.page_size, 25, "default page size");
    }

    #[test]
    fn reads_prefixed_variables_only() {
        let config = BusinessConfig::from_vars(vec![
            ("ORIGIN_BASE_URL", "/ewf/"),
            ("ORIGIN_PAGE_SIZE", "10"),
            ("PAGE_SIZE", "99"),
        ])
        .expect("config should build");

        assert_eq!(config.base_url, "ewf", "base url from ORIGIN_BASE_URL");
        assert_eq!(config.page_size, 10, "page size from ORIGIN_PAGE_SIZE");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let result = BusinessConfig::from_vars(vec![("ORIGIN_PAGE_SIZE", "0")]);

        assert!(matches!(result, Err(ConfigError::ZeroPageSize)), "zero page size is rejected");
    }

    #[test]
    fn malformed_page_size_is_an_env_error() {
        let result = BusinessConfig::from_vars(vec![("ORIGIN_PAGE_SIZE", "many")]);

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Env(_)), "unparsable page size is an env error");
    }
}
