mod config;
mod errors;
mod models;
mod routes;
mod state;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,aas_service=debug,axum=info"))
        .expect("failed to init EnvFilter");
    fmt().with_env_filter(env_filter).init();

    let config = Config::from_env();
    let addr = config.addr;
    let default_map = config.default_map.clone();
    let state = Arc::new(AppState::new(config));

    if let Some(path) = default_map {
        match aas_core::loader::load_from_path(&path, None) {
            Ok(world) => match aas_core::router::RoutingTables::build(&world) {
                Ok(tables) => {
                    info!(path = %path.display(), areas = world.area_settings.len(), "loaded default map");
                    state
                        .map
                        .store(Arc::new(Some(crate::state::LoadedMap { path, world, tables })));
                }
                Err(e) => error!(error = %e, "failed to build routing tables for default map"),
            },
            Err(e) => error!(path = %path.display(), error = %e, "failed to load default map"),
        }
    }

    let app = routes::build_router(Arc::clone(&state));

    info!(%addr, version = env!("CARGO_PKG_VERSION"), "starting aas-service");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!(error = %e, "server error");
    }
}
