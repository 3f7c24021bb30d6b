use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Config {
    /// Reads `MURMUR_*` variables. `PORT` is honoured when `MURMUR_PORT` is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("MURMUR_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env::var("MURMUR_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "3000".into());
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid port '{}'", port))?;
        let db_path = env::var("MURMUR_DB_PATH")
            .unwrap_or_else(|_| "murmur.db".into())
            .into();

        Ok(Self { host, port, db_path })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
