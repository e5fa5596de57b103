use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::FetchPolicy;
use crate::http_client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::league::{League, SeasonRequest};

const DEFAULT_LEDGER: &str = "soccer_train.csv";
const DEFAULT_LEAGUE: &str = "Premier League";

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub ledger_path: PathBuf,
    pub leagues: Vec<String>,
    pub seasons: Vec<i32>,
    pub reset: bool,
    pub json: bool,
    pub request_timeout: Duration,
    pub policy: FetchPolicy,
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        let ledger_path = env::var("FBREF_LEDGER")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LEDGER.to_string());
        let leagues = env::var("FBREF_LEAGUES")
            .ok()
            .map(|raw| parse_names(&raw))
            .filter(|names| !names.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_LEAGUE.to_string()]);
        let seasons = env::var("FBREF_SEASONS")
            .map(|raw| parse_years(&raw))
            .unwrap_or_default();

        Self {
            ledger_path: PathBuf::from(ledger_path),
            leagues,
            seasons,
            reset: env_bool("FBREF_RESET", false),
            json: false,
            request_timeout: env_secs("HTTP_TIMEOUT_SECS")
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            policy: FetchPolicy::from_env(),
        }
    }

    /// Command-line values override the environment. Returns the arguments
    /// that were not understood; none of them are applied.
    pub fn apply_args(&mut self, args: &[String]) -> Vec<String> {
        let mut leagues = Vec::new();
        let mut seasons = Vec::new();
        let mut rejected = Vec::new();
        let mut idx = 0;
        while idx < args.len() {
            let arg = args[idx].as_str();
            let (key, inline) = match arg.split_once('=') {
                Some((k, v)) if k.starts_with("--") => (k, Some(v.to_string())),
                _ => (arg, None),
            };
            let mut value = || {
                inline.clone().or_else(|| {
                    idx += 1;
                    args.get(idx).cloned()
                })
            };
            match key {
                "--reset" | "--json" => {
                    // Bare flag means on.
                    match inline.as_deref().map_or(Some(true), parse_bool) {
                        Some(on) if key == "--reset" => self.reset = on,
                        Some(on) => self.json = on,
                        None => rejected.push(arg.to_string()),
                    }
                }
                "--ledger" => match value().filter(|p| !p.trim().is_empty()) {
                    Some(path) => self.ledger_path = PathBuf::from(path.trim()),
                    None => rejected.push(arg.to_string()),
                },
                "--league" | "--leagues" => match value() {
                    Some(raw) => leagues.extend(parse_names(&raw)),
                    None => rejected.push(arg.to_string()),
                },
                "--seasons" => match value().map(|raw| parse_years(&raw)) {
                    Some(years) if !years.is_empty() => seasons.extend(years),
                    _ => rejected.push(arg.to_string()),
                },
                flag if flag.starts_with('-') => rejected.push(arg.to_string()),
                other => {
                    let years = parse_years(other);
                    if years.is_empty() {
                        rejected.push(arg.to_string());
                    }
                    seasons.extend(years);
                }
            }
            idx += 1;
        }
        if !leagues.is_empty() {
            self.leagues = leagues;
        }
        if !seasons.is_empty() {
            self.seasons = dedup(seasons);
        }
        rejected
    }

    /// League-major request list plus the names that matched no league.
    pub fn requests(&self) -> (Vec<SeasonRequest>, Vec<String>) {
        let mut requests = Vec::new();
        let mut unknown = Vec::new();
        for name in &self.leagues {
            match name.parse::<League>() {
                Ok(league) => requests.extend(
                    self.seasons
                        .iter()
                        .map(|year| SeasonRequest::new(league, *year)),
                ),
                Err(_) => unknown.push(name.clone()),
            }
        }
        (requests, unknown)
    }
}

fn parse_names(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_years(raw: &str) -> Vec<i32> {
    let years = raw
        .split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<i32>().ok())
        .filter(|year| (1871..=2200).contains(year))
        .collect::<Vec<_>>();
    dedup(years)
}

fn dedup<T: Copy + Eq + std::hash::Hash>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

pub(crate) fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

pub(crate) fn env_secs(key: &str) -> Option<Duration> {
    env_u64(key).map(Duration::from_secs)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| parse_bool(&v).unwrap_or(true))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
