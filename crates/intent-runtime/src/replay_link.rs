//! Replays a recorded capture as if it came off the board

use anyhow::{Context, Result};
use intent_core::{IntentError, IntentResult};
use intent_processing::Transport;
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, info};

/// Transport serving one recorded value per read until the capture runs out
///
/// Accepts bare values or stamped lines (`[date time] value`); only the
/// trailing value is replayed since reads are re-stamped on arrival. Written
/// tokens go to the log.
pub struct ReplayLink {
    lines: VecDeque<String>,
    source: String,
}

impl ReplayLink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading capture {}", path.display()))?;
        let link = Self::from_lines(text.lines(), path.display().to_string());
        info!(capture = %link.source, lines = link.remaining(), "capture loaded");
        Ok(link)
    }

    pub fn from_lines<I, S>(lines: I, source: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = lines
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref().trim();
                if line.is_empty() {
                    None
                } else {
                    line.split_whitespace().last().map(str::to_string)
                }
            })
            .collect();

        Self {
            lines,
            source: source.into(),
        }
    }

    /// Lines not yet replayed
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl Transport for ReplayLink {
    fn read_line(&mut self) -> IntentResult<String> {
        self.lines.pop_front().ok_or(IntentError::TransportTimeout {
            collected: 0,
            expected: 1,
        })
    }

    fn write_token(&mut self, token: &str) -> IntentResult<()> {
        debug!(token, remaining = self.lines.len(), "decision for replayed capture");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("replay of {}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_replays_values_in_order() {
        let mut link = ReplayLink::from_lines(
            ["512", "", "[2024-03-14 10:15:30.250000] 498", "  505  "],
            "inline",
        );
        assert_eq!(link.remaining(), 3);
        assert_eq!(link.read_line().unwrap(), "512");
        assert_eq!(link.read_line().unwrap(), "498");
        assert_eq!(link.read_line().unwrap(), "505");
        assert!(matches!(
            link.read_line(),
            Err(IntentError::TransportTimeout { .. })
        ));
    }

    #[test]
    fn test_open_capture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "510\n511\n512").unwrap();

        let mut link = ReplayLink::open(file.path()).unwrap();
        assert_eq!(link.remaining(), 3);
        assert!(link.write_token("1").is_ok());
        assert_eq!(link.read_line().unwrap(), "510");

        assert!(ReplayLink::open("/nonexistent/capture.txt").is_err());
    }
}
