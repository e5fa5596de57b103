use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{env_secs, env_u64};
use crate::http_client::http_client;

const STATUS_OK: u16 = 200;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Counted retries after the first attempt. 429 waits are never counted.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub rate_limit_delay: Duration,
    pub politeness_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay: Duration::from_secs(1),
            rate_limit_delay: Duration::from_secs(5),
            politeness_delay: Duration::from_secs(3),
        }
    }
}

impl FetchPolicy {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_retries: env_u64("FETCH_MAX_RETRIES")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(d.max_retries)
                .min(20),
            retry_delay: env_secs("FETCH_RETRY_DELAY_SECS").unwrap_or(d.retry_delay),
            rate_limit_delay: env_secs("FETCH_RATE_LIMIT_SECS").unwrap_or(d.rate_limit_delay),
            politeness_delay: env_secs("FETCH_POLITENESS_SECS").unwrap_or(d.politeness_delay),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("failed reading body: {0}")]
    Body(String),
    #[error("request failed: {0}")]
    Other(String),
}

/// One HTTP GET. Implementations return the whole body or an error, never a partial read.
pub trait Transport {
    fn get(&mut self, url: &str) -> Result<RawResponse, TransportError>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&mut self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&mut self, delay: Duration) {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn shared(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self::new(http_client(timeout)?))
    }
}

impl Transport for HttpTransport {
    fn get(&mut self, url: &str) -> Result<RawResponse, TransportError> {
        let resp = self.client.get(url).send().map_err(request_error)?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = resp.text().map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(err.to_string())
            }
        })?;
        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("http status {0}")]
    Http(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Success(String),
    RateLimited { retry_after: Option<String> },
    Failed(AttemptError),
}

pub fn classify(result: Result<RawResponse, TransportError>) -> Attempt {
    match result {
        Ok(resp) if resp.status == STATUS_OK => Attempt::Success(resp.body),
        Ok(resp) if resp.status == STATUS_TOO_MANY_REQUESTS => Attempt::RateLimited {
            retry_after: resp.retry_after,
        },
        Ok(resp) => Attempt::Failed(AttemptError::Http(resp.status)),
        Err(err) => Attempt::Failed(AttemptError::Transport(err)),
    }
}

/// Accepts delta-seconds or an HTTP-date. Dates in the past wait zero.
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = DateTime::parse_from_rfc2822(raw).ok()?;
    let wait = when.with_timezone(&Utc) - now;
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: String,
    pub retries: u32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("giving up on {url} after {attempts} attempts: {last}")]
pub struct FetchFailure {
    pub url: String,
    pub attempts: u32,
    pub last: AttemptError,
}

pub struct Fetcher<T, C = SystemClock> {
    transport: T,
    clock: C,
    policy: FetchPolicy,
}

impl<T: Transport, C: Clock> Fetcher<T, C> {
    pub fn new(transport: T, clock: C, policy: FetchPolicy) -> Self {
        Self {
            transport,
            clock,
            policy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn fetch(&mut self, url: &str) -> Result<Page, FetchFailure> {
        let mut retries = 0u32;
        loop {
            let err = match classify(self.transport.get(url)) {
                Attempt::Success(body) => {
                    if retries > 0 {
                        info!(url, retries, "fetch recovered");
                    }
                    self.clock.sleep(self.policy.politeness_delay);
                    return Ok(Page {
                        body,
                        retries,
                    });
                }
                Attempt::RateLimited { retry_after } => {
                    let delay = retry_after
                        .as_deref()
                        .and_then(|raw| parse_retry_after(raw, self.clock.now()))
                        .unwrap_or(self.policy.rate_limit_delay);
                    warn!(url, delay_secs = delay.as_secs(), "rate limited (429), waiting");
                    self.clock.sleep(delay);
                    continue;
                }
                Attempt::Failed(err) => err,
            };

            if retries >= self.policy.max_retries {
                warn!(url, attempts = retries + 1, error = %err, "fetch failed");
                return Err(FetchFailure {
                    url: url.to_string(),
                    attempts: retries + 1,
                    last: err,
                });
            }
            retries += 1;
            warn!(url, attempt = retries, error = %err, "fetch error, trying again");
            self.clock.sleep(self.policy.retry_delay);
        }
    }
}
