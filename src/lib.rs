pub mod auth;
pub mod config;
pub mod core;
pub mod guard;
pub mod handlers;
pub mod likes;
pub mod logging;
pub mod models;
pub mod posts;
pub mod state;
pub mod users;

#[cfg(not(target_arch = "wasm32"))]
pub mod server;

// === Component entrypoint ===
#[cfg(target_arch = "wasm32")]
mod component {
    use spin_sdk::http::{IntoResponse, Request};
    use spin_sdk::http_component;

    use crate::config::AuthConfig;
    use crate::core::sqlite_store::SqliteStore;
    use crate::state::AppState;

    #[http_component]
    fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
        crate::logging::init_logging();

        let config = AuthConfig::from_env()?;
        let store = SqliteStore::open()?;
        let state = AppState::new(store, &config);

        Ok(crate::handlers::route(&req, &state))
    }
}
