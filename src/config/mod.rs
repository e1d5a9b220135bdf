use crate::error::{InterceptError, Result};
use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};

/// Keys consulted, in order, when resolving the [`Environment`].
pub const ENVIRONMENT_KEYS: [&str; 2] = ["APP_ENV", "ENVIRONMENT"];

/// Disclosure policy for fallback error messages.
///
/// Only [`Environment::Production`] counts as a release environment; every
/// other environment may surface diagnostic detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    #[strum(to_string = "development", serialize = "dev")]
    Development,
    #[strum(to_string = "testing", serialize = "test")]
    Testing,
    #[strum(to_string = "production", serialize = "prod", serialize = "release")]
    Production,
}

impl Environment {
    pub fn is_release(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Parse an environment name, reporting unknown names as configuration errors.
    pub fn parse(value: &str) -> Result<Self> {
        Environment::from_str(value.trim()).map_err(|_| InterceptError::UnknownEnvironment {
            value: value.to_string(),
        })
    }
}

/// Configuration service
///
/// A read-mostly key/value store seeded from the process environment at
/// startup. The interceptor never consults it directly; callers resolve an
/// [`Environment`] once and hand it to the builder.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Resolve the disclosure policy from `APP_ENV` (or `ENVIRONMENT`).
    ///
    /// Falls back to [`Environment::Development`] when neither key is set.
    pub fn environment(&self) -> Result<Environment> {
        match ENVIRONMENT_KEYS.iter().find_map(|key| self.get(key)) {
            Some(value) => Environment::parse(&value),
            None => Ok(Environment::default()),
        }
    }
}
