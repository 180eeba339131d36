use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    /// Map loaded at startup if set; otherwise the service starts empty
    /// and waits for a `POST /maps/load`.
    pub default_map: Option<PathBuf>,
    pub max_clients: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("AAS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("AAS_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080);
        let addr: SocketAddr = format!("{host}:{port}").parse().expect("invalid host/port");
        let default_map = env::var("AAS_MAP").ok().map(PathBuf::from);
        let max_clients = env::var("AAS_MAX_CLIENTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128);
        Self { addr, default_map, max_clients }
    }
}
