use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

static CLIENT: OnceCell<(Duration, Client)> = OnceCell::new();

/// Client with the given request timeout. The first one built is shared;
/// a caller asking for a different timeout gets a client of its own.
pub fn http_client(timeout: Duration) -> Result<Client> {
    shared_or_built(&CLIENT, timeout).map(|(client, _)| client)
}

fn shared_or_built(
    cell: &OnceCell<(Duration, Client)>,
    timeout: Duration,
) -> Result<(Client, bool)> {
    let (shared_timeout, shared) =
        cell.get_or_try_init(|| build(timeout).map(|c| (timeout, c)))?;
    if *shared_timeout == timeout {
        return Ok((shared.clone(), true));
    }
    debug!(
        shared_secs = shared_timeout.as_secs(),
        wanted_secs = timeout.as_secs(),
        "timeout differs from shared http client, building another"
    );
    Ok((build(timeout)?, false))
}

fn build(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build http client")
}
