use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::csv::{parse_rows, write_row};
use crate::match_page::MatchRecord;

pub const HEADER: [&str; 4] = ["mid", "tie", "w_poss", "l_poss"];
pub const FAILED_HEADER: [&str; 2] = ["mid", "reason"];

/// Append-only table of recorded matches. Single writer.
///
/// Matches that were attempted but produced no record go to a sidecar table
/// (`<path>.failed`) so later runs skip them too.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    failed_path: PathBuf,
}

impl Ledger {
    /// Opens the ledger, writing the header if the file is missing or empty.
    ///
    /// A final row without its newline was cut off mid-append and is dropped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut failed_path = path.as_os_str().to_owned();
        failed_path.push(".failed");
        let ledger = Self {
            path,
            failed_path: PathBuf::from(failed_path),
        };
        if let Some(parent) = ledger.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create ledger dir {}", parent.display()))?;
        }

        prepare_table(&ledger.path, &HEADER)?;
        prepare_table(&ledger.failed_path, &FAILED_HEADER)?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn failed_path(&self) -> &Path {
        &self.failed_path
    }

    /// Truncates both tables down to their header rows.
    pub fn reset(&self) -> Result<()> {
        write_header(&self.path, &HEADER)?;
        write_header(&self.failed_path, &FAILED_HEADER)?;
        info!(path = %self.path.display(), "ledger header written");
        Ok(())
    }

    /// Match ids already attempted: every recorded row plus every failed attempt.
    pub fn load_completed(&self) -> Result<HashSet<String>> {
        let mut out = read_mid_column(&self.path)?;
        out.extend(self.load_failed()?);
        Ok(out)
    }

    pub fn load_failed(&self) -> Result<HashSet<String>> {
        if !self.failed_path.exists() {
            return Ok(HashSet::new());
        }
        read_mid_column(&self.failed_path)
    }

    pub fn load_records(&self) -> Result<Vec<MatchRecord>> {
        let mut out = Vec::new();
        for (line, row) in read_rows(&self.path)?.into_iter().enumerate().skip(1) {
            match parse_record(&row) {
                Some(record) => out.push(record),
                None => warn!(line = line + 1, ?row, "skipping unreadable ledger row"),
            }
        }
        Ok(out)
    }

    pub fn append(&self, record: &MatchRecord) -> Result<()> {
        append_row(&self.path, &record_row(record))
    }

    pub fn mark_failed(&self, match_id: &str, reason: &str) -> Result<()> {
        append_row(&self.failed_path, &[match_id, reason])
    }
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn write_header(path: &Path, header: &[&str]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("create ledger {}", path.display()))?;
    write_row(&mut file, header).context("write ledger header")?;
    file.sync_data().context("sync ledger header")?;
    Ok(())
}

fn append_row<S: AsRef<str>>(path: &Path, row: &[S]) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("open ledger {}", path.display()))?;
    write_row(&mut file, row).context("append ledger row")?;
    file.sync_data().context("sync ledger row")?;
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read ledger {}", path.display()))?;
    Ok(parse_rows(&raw))
}

fn read_mid_column(path: &Path) -> Result<HashSet<String>> {
    let mut rows = read_rows(path)?.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| anyhow!("{} has no header row", path.display()))?;
    let mid_col = header
        .iter()
        .position(|h| h.trim() == HEADER[0])
        .ok_or_else(|| anyhow!("{} header has no {:?} column", path.display(), HEADER[0]))?;

    // Short rows can only come from hand edits; they name no usable record.
    Ok(rows
        .filter(|row| row.len() >= header.len())
        .filter_map(|row| row.get(mid_col).map(|mid| mid.trim().to_string()))
        .filter(|mid| !mid.is_empty())
        .collect())
}

fn prepare_table(path: &Path, header: &[&str]) -> Result<()> {
    if file_len(path) > 0 {
        drop_torn_row(path)?;
    }
    if file_len(path) == 0 {
        write_header(path, header)?;
    }
    Ok(())
}

// Every complete row ends in '\n'; anything after the last one is a partial append.
fn drop_torn_row(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("read ledger {}", path.display()))?;
    if bytes.last().is_none_or(|b| *b == b'\n') {
        return Ok(());
    }
    let keep = bytes
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |idx| idx + 1);
    warn!(
        path = %path.display(),
        dropped_bytes = bytes.len() - keep,
        "ledger ended mid-row, dropping the partial row"
    );
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .with_context(|| format!("open ledger {}", path.display()))?;
    file.set_len(keep as u64).context("truncate partial ledger row")?;
    file.sync_data().context("sync ledger")?;
    Ok(())
}

fn record_row(record: &MatchRecord) -> [String; 4] {
    [
        record.match_id.clone(),
        record.is_tie.to_string(),
        record.winner_possession_pct.to_string(),
        record.loser_possession_pct.to_string(),
    ]
}

fn parse_record(row: &[String]) -> Option<MatchRecord> {
    let [mid, tie, w, l] = row else {
        return None;
    };
    let match_id = mid.trim().to_string();
    if match_id.is_empty() {
        return None;
    }
    let is_tie = match tie.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => return None,
    };
    Some(MatchRecord {
        match_id,
        is_tie,
        winner_possession_pct: w.trim().parse().ok().filter(|p| *p <= 100)?,
        loser_possession_pct: l.trim().parse().ok().filter(|p| *p <= 100)?,
    })
}
