//! Runtime settings: built-in defaults, then `.env`, then `ADMIN_`-prefixed environment variables.

use axum_extra::extract::cookie::Key;
use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

pub const ENV_PREFIX: &str = "ADMIN_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub database_url: String,
    /// Seeds the session cookie key. Empty means a random key per process.
    pub secret_key: String,
    pub bind_addr: String,
    pub log_level: String,
    /// Module paths to scan, e.g. `ADMIN_DISCOVERY_ROOTS=[app::models,app::billing]`.
    pub discovery_roots: Vec<String>,
    pub page_size: u32,
    pub insecure_cookie: bool,
    pub max_body_bytes: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            database_url: "sqlite://autoadmin.db".into(),
            secret_key: String::new(),
            bind_addr: "127.0.0.1:8000".into(),
            log_level: "info".into(),
            discovery_roots: Vec::new(),
            page_size: crate::service::DEFAULT_LIMIT,
            insecure_cookie: false,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl AdminConfig {
    /// Load `.env` if present, then layer the environment over the defaults.
    pub fn load() -> Result<Self, figment::Error> {
        dotenvy::dotenv().ok();
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AdminConfig::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Private-cookie key derived from `secret_key`.
    pub fn cookie_key(&self) -> Key {
        if self.secret_key.is_empty() {
            tracing::warn!("ADMIN_SECRET_KEY is empty; sessions will not survive a restart");
            return Key::generate();
        }
        Key::from(Sha512::digest(self.secret_key.as_bytes()).as_slice())
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn environment_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("ADMIN_BIND_ADDR", "0.0.0.0:9000");
            jail.set_env("ADMIN_PAGE_SIZE", "25");
            jail.set_env("ADMIN_DISCOVERY_ROOTS", "[app::models,app::billing]");
            let cfg: AdminConfig = AdminConfig::figment().extract()?;
            assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
            assert_eq!(cfg.page_size, 25);
            assert_eq!(cfg.discovery_roots, vec!["app::models", "app::billing"]);
            assert_eq!(cfg.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn same_secret_gives_same_key() {
        let cfg = AdminConfig {
            secret_key: "short".into(),
            ..AdminConfig::default()
        };
        assert_eq!(cfg.cookie_key().master(), cfg.cookie_key().master());
    }
}
