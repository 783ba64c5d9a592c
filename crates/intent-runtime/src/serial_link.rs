//! Serial link to the acquisition board

use anyhow::{Context, Result};
use intent_core::{IntentError, IntentResult};
use intent_processing::Transport;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Port settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port name, e.g. `COM3` or `/dev/ttyUSB0`
    pub port: String,
    pub baud_rate: u32,
    /// Per-read timeout
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "COM3".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
        }
    }
}

/// Line-oriented serial connection
pub struct SerialLink {
    reader: BufReader<Box<dyn serialport::SerialPort>>,
    line: Vec<u8>,
    name: String,
}

impl SerialLink {
    /// Open the configured port
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .with_context(|| format!("opening serial port {}", config.port))?;

        info!(port = %config.port, baud = config.baud_rate, "serial port open");
        Ok(Self {
            reader: BufReader::new(port),
            line: Vec::with_capacity(64),
            name: format!("{} @ {} baud", config.port, config.baud_rate),
        })
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports().context("enumerating serial ports")?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

/// Read one newline-terminated line into `line`
///
/// Bytes received before a timeout stay in `line` and are completed by the
/// next call, so a line split by a timeout is never returned as two values.
fn read_line_from<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> IntentResult<String> {
    match reader.read_until(b'\n', line) {
        Ok(0) if line.is_empty() => Err(IntentError::TransportError {
            reason: "serial port closed".to_string(),
        }),
        Ok(_) => {
            // Undecodable bytes surface later as a malformed row
            let text = String::from_utf8_lossy(line)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            line.clear();
            Ok(text)
        }
        Err(e) if e.kind() == ErrorKind::TimedOut => {
            debug!(pending = line.len(), "read timed out");
            Err(IntentError::TransportTimeout {
                collected: 0,
                expected: 1,
            })
        }
        Err(e) => {
            line.clear();
            Err(IntentError::TransportError {
                reason: e.to_string(),
            })
        }
    }
}

impl Transport for SerialLink {
    fn read_line(&mut self) -> IntentResult<String> {
        read_line_from(&mut self.reader, &mut self.line)
    }

    fn write_token(&mut self, token: &str) -> IntentResult<()> {
        let port = self.reader.get_mut();
        port.write_all(token.as_bytes())
            .and_then(|_| port.flush())
            .map_err(|e| IntentError::TransportError {
                reason: format!("writing '{}': {}", token, e),
            })?;
        debug!(token, "token written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
