use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::fetch::{Clock, FetchFailure, Fetcher, Transport};

static SCORE: Lazy<Selector> = Lazy::new(|| Selector::parse(".score").expect("static selector"));
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)%").expect("static regex"));

const POSSESSION_LABEL: &str = "Possession";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub match_id: String,
    pub is_tie: bool,
    pub winner_possession_pct: u8,
    pub loser_possession_pct: u8,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("score not found")]
    Score,
    #[error("possession not found")]
    Possession,
    #[error("score and possession sides do not line up")]
    KeyMismatch,
}

impl ExtractionFailure {
    pub fn reason(self) -> &'static str {
        match self {
            ExtractionFailure::Score => "score",
            ExtractionFailure::Possession => "possession",
            ExtractionFailure::KeyMismatch => "key_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Recorded(MatchRecord),
    FetchFailed(FetchFailure),
    Unextractable(ExtractionFailure),
}

/// Last non-empty path segment, ignoring query and fragment.
pub fn match_id_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|seg| !seg.is_empty())
        .unwrap_or(path)
        .to_string()
}

pub fn extract_record(html: &str, source_url: &str) -> Result<MatchRecord, ExtractionFailure> {
    let document = Html::parse_document(html);
    // Both passes always run so a page can be diagnosed in one go.
    let scores = extract_scores(&document);
    let possession = extract_possession(&document);
    match (scores, possession) {
        (Ok(scores), Ok(possession)) => {
            assemble_record(match_id_from_url(source_url), &scores, &possession)
        }
        (Err(err), _) | (_, Err(err)) => Err(err),
    }
}

pub fn scrape_match<T: Transport, C: Clock>(
    fetcher: &mut Fetcher<T, C>,
    url: &str,
) -> MatchOutcome {
    let page = match fetcher.fetch(url) {
        Ok(page) => page,
        Err(err) => return MatchOutcome::FetchFailed(err),
    };
    match extract_record(&page.body, url) {
        Ok(record) => MatchOutcome::Recorded(record),
        Err(err) => MatchOutcome::Unextractable(err),
    }
}

fn extract_scores(document: &Html) -> Result<Vec<u32>, ExtractionFailure> {
    let scores = document
        .select(&SCORE)
        .map(|el| el.text().collect::<String>().trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ExtractionFailure::Score)?;
    if scores.len() < 2 {
        return Err(ExtractionFailure::Score);
    }
    Ok(scores)
}

// The label sits in a header cell; the percentages live in the next row.
fn extract_possession(document: &Html) -> Result<Vec<u8>, ExtractionFailure> {
    let label = document
        .root_element()
        .descendants()
        .find(|node| {
            node.value()
                .as_text()
                .is_some_and(|text| text.trim() == POSSESSION_LABEL)
        })
        .ok_or(ExtractionFailure::Possession)?;
    let row = label
        .parent()
        .and_then(|cell| cell.parent())
        .ok_or(ExtractionFailure::Possession)?;
    let block = row
        .next_siblings()
        .find_map(ElementRef::wrap)
        .ok_or(ExtractionFailure::Possession)?;

    let mut out = Vec::new();
    for caps in block.text().flat_map(|fragment| PERCENT.captures_iter(fragment)) {
        let pct = caps[1]
            .parse::<u8>()
            .ok()
            .filter(|pct| *pct <= 100)
            .ok_or(ExtractionFailure::Possession)?;
        out.push(pct);
    }
    if out.is_empty() {
        return Err(ExtractionFailure::Possession);
    }
    Ok(out)
}

/// Pairs possession with score by side index. A tie keeps side 0 as "winner".
pub fn assemble_record(
    match_id: String,
    scores: &[u32],
    possession: &[u8],
) -> Result<MatchRecord, ExtractionFailure> {
    let (Some(first), Some(second)) = (scores.first(), scores.get(1)) else {
        return Err(ExtractionFailure::Score);
    };
    let is_tie = first == second;
    let winner = if is_tie { 0 } else { winner_index(scores) };
    let loser = 1usize
        .checked_sub(winner)
        .ok_or(ExtractionFailure::KeyMismatch)?;

    let (Some(w), Some(l)) = (possession.get(winner), possession.get(loser)) else {
        return Err(ExtractionFailure::KeyMismatch);
    };
    Ok(MatchRecord {
        match_id,
        is_tie,
        winner_possession_pct: *w,
        loser_possession_pct: *l,
    })
}

// First index holding the greatest score.
fn winner_index(scores: &[u32]) -> usize {
    let mut best = 0;
    for (idx, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = idx;
        }
    }
    best
}
