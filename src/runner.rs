use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::fetch::{Clock, Fetcher, Transport};
use crate::league::SeasonRequest;
use crate::ledger::Ledger;
use crate::listing::fetch_season_links;
use crate::match_page::{MatchOutcome, match_id_from_url, scrape_match};

#[derive(Debug, Clone, Serialize)]
pub struct SeasonSummary {
    pub league: String,
    pub season: String,
    pub url: String,
    pub links_found: usize,
    pub recorded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ledger_path: PathBuf,
    pub started_at: String,
    pub finished_at: String,
    pub recorded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub seasons: Vec<SeasonSummary>,
}

/// Drives listing -> match -> ledger for a list of seasons, one request at a time.
pub struct SeasonRunner<T, C> {
    fetcher: Fetcher<T, C>,
    ledger: Ledger,
    completed: HashSet<String>,
}

impl<T: Transport, C: Clock> SeasonRunner<T, C> {
    pub fn new(fetcher: Fetcher<T, C>, ledger: Ledger) -> Self {
        Self {
            fetcher,
            ledger,
            completed: HashSet::new(),
        }
    }

    pub fn fetcher(&self) -> &Fetcher<T, C> {
        &self.fetcher
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Match ids attempted so far, recorded or not.
    pub fn completed(&self) -> &HashSet<String> {
        &self.completed
    }

    pub fn run(&mut self, requests: &[SeasonRequest], reset_first: bool) -> Result<RunSummary> {
        let started_at = Utc::now().to_rfc3339();
        if reset_first {
            self.ledger.reset()?;
        }
        // Always re-read from disk so manual edits and crashed runs are honoured.
        self.completed = self.ledger.load_completed()?;
        info!(
            path = %self.ledger.path().display(),
            completed = self.completed.len(),
            "ledger loaded"
        );

        let mut seasons = Vec::with_capacity(requests.len());
        for request in requests {
            seasons.push(self.run_season(request)?);
        }

        Ok(RunSummary {
            ledger_path: self.ledger.path().to_path_buf(),
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            recorded: seasons.iter().map(|s| s.recorded).sum(),
            failed: seasons.iter().map(|s| s.failed).sum(),
            skipped: seasons.iter().map(|s| s.skipped).sum(),
            seasons,
        })
    }

    fn run_season(&mut self, request: &SeasonRequest) -> Result<SeasonSummary> {
        let mut summary = SeasonSummary {
            league: request.league.to_string(),
            season: request.season_label(),
            url: request.listing_url(),
            links_found: 0,
            recorded: 0,
            failed: 0,
            skipped: 0,
            error: None,
        };

        let links = match fetch_season_links(&mut self.fetcher, request) {
            Ok(links) => links,
            Err(err) => {
                warn!(league = %request.league, season = %summary.season, error = %err, "links not found");
                summary.error = Some(err.to_string());
                return Ok(summary);
            }
        };
        summary.links_found = links.len();

        for link in &links {
            let match_id = match_id_from_url(link);
            if self.completed.contains(&match_id) {
                debug!(match_id = %match_id, "already attempted, skipping");
                summary.skipped += 1;
                continue;
            }

            match scrape_match(&mut self.fetcher, link) {
                MatchOutcome::Recorded(record) => {
                    self.ledger.append(&record)?;
                    info!(
                        match_id = %match_id,
                        tie = record.is_tie,
                        w_poss = record.winner_possession_pct,
                        l_poss = record.loser_possession_pct,
                        "match recorded"
                    );
                    summary.recorded += 1;
                }
                MatchOutcome::FetchFailed(err) => {
                    warn!(match_id = %match_id, error = %err, "match page unavailable");
                    self.ledger.mark_failed(&match_id, "fetch")?;
                    summary.failed += 1;
                }
                MatchOutcome::Unextractable(err) => {
                    warn!(match_id = %match_id, url = %link, reason = err.reason(), "{err}");
                    self.ledger.mark_failed(&match_id, err.reason())?;
                    summary.failed += 1;
                }
            }
            self.completed.insert(match_id);
        }

        info!(
            league = %request.league,
            season = %summary.season,
            recorded = summary.recorded,
            failed = summary.failed,
            skipped = summary.skipped,
            "season scraped"
        );
        Ok(summary)
    }
}
