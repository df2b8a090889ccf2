use std::{env::var, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use stock::{AddPolicy, REFRESH_INTERVAL};

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub storage_path: String,
    pub refresh_interval: Duration,
    pub add_policy: AddPolicy,
}

impl Config {
    /// Quote provider settings are read separately by `QuoteClient::from_env`.
    pub fn from_env() -> Result<Self> {
        let listen_addr = var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("invalid LISTEN_ADDR")?;

        let refresh_interval = match var("REFRESH_INTERVAL_MS") {
            Ok(ms) => Duration::from_millis(ms.parse::<u64>().context("invalid REFRESH_INTERVAL_MS")?),
            Err(_) => REFRESH_INTERVAL,
        };

        let add_policy = match var("WATCHLIST_ADD_POLICY") {
            Ok(policy) => policy.parse::<AddPolicy>().map_err(anyhow::Error::msg)?,
            Err(_) => AddPolicy::default(),
        };

        Ok(Self {
            listen_addr,
            storage_path: var("STORAGE_PATH").unwrap_or_else(|_| "./data/storage.json".to_string()),
            refresh_interval,
            add_policy,
        })
    }
}
