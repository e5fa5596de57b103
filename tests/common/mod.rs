#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use fbref_possession::fetch::{Clock, FetchPolicy, Fetcher, RawResponse, Transport, TransportError};

pub type Reply = Result<RawResponse, TransportError>;

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub fn ok(body: impl Into<String>) -> Reply {
    Ok(RawResponse {
        status: 200,
        retry_after: None,
        body: body.into(),
    })
}

pub fn status(code: u16) -> Reply {
    Ok(RawResponse {
        status: code,
        retry_after: None,
        body: String::new(),
    })
}

pub fn rate_limited(retry_after: Option<&str>) -> Reply {
    Ok(RawResponse {
        status: 429,
        retry_after: retry_after.map(|v| v.to_string()),
        body: String::new(),
    })
}

/// Serves a script per url; the last reply repeats once the script runs out.
/// Unknown urls get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, Vec<Reply>>,
    served: HashMap<String, usize>,
    pub calls: Vec<String>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, script: Vec<Reply>) -> Self {
        self.routes.insert(url.to_string(), script);
        self
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == url).count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&mut self, url: &str) -> Result<RawResponse, TransportError> {
        self.calls.push(url.to_string());
        let Some(script) = self.routes.get(url).filter(|s| !s.is_empty()) else {
            return status(404);
        };
        let n = self.served.entry(url.to_string()).or_insert(0);
        let reply = script[(*n).min(script.len() - 1)].clone();
        *n += 1;
        reply
    }
}

pub struct RecordingClock {
    pub now: DateTime<Utc>,
    pub sleeps: Vec<Duration>,
}

impl Default for RecordingClock {
    fn default() -> Self {
        Self {
            now: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            sleeps: Vec::new(),
        }
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn sleep(&mut self, delay: Duration) {
        self.sleeps.push(delay);
    }
}

pub fn fetcher(transport: ScriptedTransport) -> Fetcher<ScriptedTransport, RecordingClock> {
    Fetcher::new(transport, RecordingClock::default(), FetchPolicy::default())
}

pub fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}
