use crate::auth::TokenService;
use crate::config::AuthConfig;
use crate::core::store::SocialStore;

/// Everything a request needs: the store, the token service and the
/// configured token lifetime. Built once and only read afterwards.
pub struct AppState {
    store: Box<dyn SocialStore>,
    tokens: TokenService,
    token_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(store: impl SocialStore + 'static, config: &AuthConfig) -> Self {
        Self {
            store: Box::new(store),
            tokens: TokenService::new(config),
            token_ttl: config.token_ttl(),
        }
    }

    pub fn store(&self) -> &dyn SocialStore {
        self.store.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        self.token_ttl
    }
}
