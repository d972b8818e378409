//! Online/offline detection.
//!
//! The orchestrator asks a `ConnectivityGate` once per refresh to choose
//! between the network path and the cache path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Timeout for the reachability probe.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 3;

#[async_trait]
pub trait ConnectivityGate: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Connectivity decided by the caller, e.g. from an `--offline` flag.
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityGate for StaticConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Reports online when a HEAD request to `url` gets any HTTP response.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityGate for HttpProbe {
    async fn is_online(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "Connectivity probe answered");
                true
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Connectivity probe failed, treating as offline");
                false
            }
        }
    }
}
