//! Shared `reqwest::Client` per base URL.
//!
//! Every agent of a crew usually talks to the same endpoint, so they should share one
//! connection pool rather than re-doing DNS and TLS per call. This is the crate's only global.
//!
//! Per-call deadlines are not set here. The agent bounds each call with
//! `CompletionOptions::timeout`, and the client only carries connect and keepalive settings.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

static HTTP_CLIENT_POOL: Lazy<Mutex<HashMap<String, reqwest::Client>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Get or create the shared HTTP client for `base_url`.
pub fn get_http_client(base_url: &str) -> reqwest::Client {
    // A poisoned lock only means another thread panicked mid-insert; the map is still usable.
    let mut pool = HTTP_CLIENT_POOL
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(client) = pool.get(base_url) {
        return client.clone();
    }

    let client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|e| {
            log::warn!(
                "agentcrew::http_pool: falling back to default client for {}: {}",
                base_url,
                e
            );
            reqwest::Client::new()
        });

    pool.insert(base_url.to_string(), client.clone());
    client
}
