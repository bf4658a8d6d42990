//! Interactive session: one render request per input line.
//!
//! ```text
//! # date       hour lead parameter
//! 2024-01-15   00   6    Suhu Permukaan (tmp2m)
//! 20240115     12   24   wind
//! quit
//! ```
//!
//! A failed request is reported and the session moves on; the dataset cache
//! lives for the whole session.

use std::io::Write;
use std::path::Path;

use forecast_pipeline::{DatasetOpener, ForecastViewer, RenderRequest};
use gfs_common::time::TimeParseError;
use gfs_common::{RunHour, RunId};
use renderer::MapRenderer;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::commands::{render_one, report_failure};

#[derive(Debug, Error)]
pub enum LineError {
    #[error("expected `DATE HOUR LEAD PARAMETER`, got {0:?}")]
    MissingFields(String),

    #[error("invalid run date: {0}")]
    Date(TimeParseError),

    #[error("invalid run hour: {0}")]
    Hour(TimeParseError),

    #[error("invalid lead {0:?}: expected a whole number of hours")]
    Lead(String),
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLine {
    Skip,
    Quit,
    Request(RenderRequest),
}

pub fn parse_line(line: &str) -> Result<SessionLine, LineError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(SessionLine::Skip);
    }
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        return Ok(SessionLine::Quit);
    }

    let missing = || LineError::MissingFields(line.to_string());
    let (date, rest) = next_token(line).ok_or_else(missing)?;
    let (hour, rest) = next_token(rest).ok_or_else(missing)?;
    let (lead, label) = next_token(rest).ok_or_else(missing)?;
    if label.is_empty() {
        return Err(missing());
    }

    let date = RunId::parse_date(date).map_err(LineError::Date)?;
    let hour: RunHour = hour.parse().map_err(LineError::Hour)?;
    let lead: usize = lead.parse().map_err(|_| LineError::Lead(lead.to_string()))?;

    Ok(SessionLine::Request(RenderRequest::new(RunId::new(date, hour), lead, label)))
}

/// First whitespace-separated token and the trimmed remainder.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], s[end..].trim()))
}

/// Tally of one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub rendered: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// Read requests from `input` until EOF or `quit`, writing one result per
/// request to `out`.
pub async fn run_session<O, R, W>(
    viewer: &ForecastViewer<O>,
    renderer: &MapRenderer,
    output_dir: &Path,
    input: R,
    out: &mut W,
) -> std::io::Result<SessionSummary>
where
    O: DatasetOpener,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary = SessionSummary::default();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let request = match parse_line(&line) {
            Ok(SessionLine::Skip) => continue,
            Ok(SessionLine::Quit) => break,
            Ok(SessionLine::Request(request)) => request,
            Err(e) => {
                summary.rejected += 1;
                writeln!(out, "error: {}", e)?;
                continue;
            }
        };

        match render_one(viewer, renderer, output_dir, &request).await {
            Ok(rendered) => {
                summary.rendered += 1;
                writeln!(out, "{}", rendered.output.display())?;
            }
            Err(e) => {
                summary.failed += 1;
                warn!(kind = e.kind(), run = %request.run, lead = request.lead, "Request failed");
                report_failure(out, &e)?;
            }
        }
        out.flush()?;
    }

    let stats = viewer.cache_stats().await;
    info!(
        rendered = summary.rendered,
        failed = summary.failed,
        rejected = summary.rejected,
        cache_hits = stats.hits,
        cache_misses = stats.misses,
        cache_evictions = stats.evictions,
        cached_runs = stats.entries,
        "Session finished"
    );
    Ok(summary)
}
