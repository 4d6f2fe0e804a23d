use crate::extract::chain::ChainWriter;
use crate::time::Timestamp;
use anyhow::Context;
use regex::Regex;
use std::io::{BufRead, Write};

/// Substring of the log line printed when a node starts a new round.
pub const RUN_MARKER: &str = "RUN: ";

/// Substring of the log line printed once every node finished the round.
pub const DONE_MARKER: &str = "all nodes are done";

/// What a raw log line means to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    RunStart,
    AllDone,
}

/// Counters for one scanned log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: usize,
    pub starts: usize,
    pub completions: usize,
}

/// Classify a log line; the time token is the first whitespace-delimited token.
///
/// Markers are matched anywhere in the line, so a marker line whose first
/// token is not a time still comes back and fails to parse later.
pub fn classify<'a>(re: &Regex, line: &'a str) -> Option<(Marker, &'a str)> {
    let marker = if line.contains(RUN_MARKER) {
        Marker::RunStart
    } else if line.contains(DONE_MARKER) {
        Marker::AllDone
    } else {
        return None;
    };
    let time = re.captures(line)?.get(1)?.as_str();
    Some((marker, time))
}

pub fn line_regex() -> anyhow::Result<Regex> {
    // time: first token
    Ok(Regex::new(r#"^\s*(\S+)"#)?)
}

/// Scan one raw simulation log and feed its markers to `writer`.
///
/// `origin` only shows up in error messages.
pub fn scan_log<R: BufRead, W: Write>(
    reader: R,
    origin: &str,
    writer: &mut ChainWriter<W>,
) -> anyhow::Result<ScanStats> {
    let re = line_regex()?;
    let mut stats = ScanStats::default();

    for (lineno, line) in reader.lines().enumerate() {
        let lno = lineno + 1;
        let line = line.with_context(|| format!("read {}:{}", origin, lno))?;
        stats.lines += 1;

        let Some((marker, time)) = classify(&re, &line) else {
            continue;
        };
        let ts = Timestamp::parse_raw(time)
            .with_context(|| format!("bad time token at {}:{}: {:?}", origin, lno, line))?;

        let written = match marker {
            Marker::RunStart => {
                stats.starts += 1;
                writer.run_start(ts)
            }
            Marker::AllDone => {
                stats.completions += 1;
                writer.all_done(ts)
            }
        };
        written.with_context(|| format!("write block for {}", origin))?;
    }

    Ok(stats)
}
