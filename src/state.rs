use crate::config::Config;
use crate::crypto::seal::PayloadSealer;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Seals and opens session tokens with the configured key.
    pub sealer: PayloadSealer,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    pub fn new(config: &Config) -> Self {
        let sealer = PayloadSealer::new(config.seal_key.clone());
        tracing::info!("✅ Payload sealer initialized (AES-{}-GCM)", config.seal_key.bits());

        AppState {
            config: config.clone(),
            sealer,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use zeroize::Zeroizing;

    use super::*;
    use crate::crypto::key::SealKey;

    pub const ISSUER_KEY: &str = "test-issuer-key";

    /// State over a fixed AES-256 key, one-hour TTL.
    pub fn state() -> AppState {
        let config = Config {
            seal_key: Arc::new(SealKey::from_bytes(&[0x5A; 32]).unwrap()),
            issuer_api_key: Arc::new(Zeroizing::new(ISSUER_KEY.to_string())),
            token_ttl_secs: 3600,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            frontend_url: "http://localhost:3000".to_string(),
            secure_cookies: false,
        };
        AppState::new(&config)
    }
}
