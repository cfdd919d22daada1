use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

use crate::crypto::key::{SealKey, KEY_ENV_VAR};

/// Default token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The imported sealing key.
    pub seal_key: Arc<SealKey>,
    /// Shared secret an upstream issuer presents in `x-issuer-key`.
    pub issuer_api_key: Arc<Zeroizing<String>>,
    /// Lifetime of issued tokens in seconds.
    pub token_ttl_secs: i64,
    /// The socket address to listen on.
    pub bind_addr: SocketAddr,
    /// The browser origin allowed by CORS.
    pub frontend_url: String,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Creates a new `Config` from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seal_key = SealKey::from_lookup(KEY_ENV_VAR, &lookup).with_context(|| {
            format!("{} must be set (generate with: sealed-session --generate-key)", KEY_ENV_VAR)
        })?;

        let issuer_api_key = lookup("ISSUER_API_KEY")
            .map(Zeroizing::new)
            .filter(|k| !k.is_empty())
            .context("ISSUER_API_KEY must be set")?;

        let token_ttl_secs: i64 = lookup("TOKEN_TTL_SECS")
            .unwrap_or_else(|| DEFAULT_TOKEN_TTL_SECS.to_string())
            .parse()
            .context("Invalid TOKEN_TTL_SECS")?;

        if token_ttl_secs <= 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be positive");
        }

        let bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3001".to_string())
            .parse()
            .context("Invalid BIND_ADDR")?;

        Ok(Self {
            seal_key: Arc::new(seal_key),
            issuer_api_key: Arc::new(issuer_api_key),
            token_ttl_secs,
            bind_addr,
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            secure_cookies: lookup("APP_ENV")
                .unwrap_or_else(|| "development".to_string()) == "production",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const KEY_B64: &str = "AAECAwQFBgcICQoLDA0ODw==";

    #[test]
    fn defaults_apply() {
        let env = vars(&[(KEY_ENV_VAR, KEY_B64), ("ISSUER_API_KEY", "issuer")]);
        let config = Config::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.seal_key.bits(), 128);
        assert_eq!(config.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert!(!config.secure_cookies);
    }

    #[test]
    fn missing_key_aborts() {
        let env = vars(&[("ISSUER_API_KEY", "issuer")]);
        let err = Config::from_lookup(|k| env.get(k).cloned()).err().unwrap();
        assert!(format!("{:#}", err).contains(KEY_ENV_VAR));
    }

    #[test]
    fn missing_issuer_key_aborts() {
        let env = vars(&[(KEY_ENV_VAR, KEY_B64)]);
        assert!(Config::from_lookup(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn ttl_must_be_positive() {
        let env = vars(&[
            (KEY_ENV_VAR, KEY_B64),
            ("ISSUER_API_KEY", "issuer"),
            ("TOKEN_TTL_SECS", "0"),
        ]);
        assert!(Config::from_lookup(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn production_enables_secure_cookies() {
        let env = vars(&[
            (KEY_ENV_VAR, KEY_B64),
            ("ISSUER_API_KEY", "issuer"),
            ("APP_ENV", "production"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ]);
        let config = Config::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert!(config.secure_cookies);
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
