#[cfg(not(target_arch = "wasm32"))]
mod native {
    extern crate social;

    use social::config::{bind_addr, AuthConfig};
    use social::core::memory_store::MemoryStore;
    use social::state::AppState;

    pub async fn run() -> std::io::Result<()> {
        let _ = dotenvy::dotenv();
        social::logging::init_logging();

        let config = match AuthConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Configuration error: {}", e);
                std::process::exit(1);
            }
        };
        tracing::info!(?config, "configuration loaded");

        let state = AppState::new(MemoryStore::new(), &config);
        social::server::run(state, &bind_addr()).await
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    native::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
