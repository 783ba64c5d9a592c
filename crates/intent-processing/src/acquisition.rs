//! Acquisition: reading raw lines off the link into fixed-size batches

use intent_core::timestamp::format_stamp;
use intent_core::{Clock, IntentError, IntentResult, RawSample, SampleBatch};
use tracing::{debug, warn};

/// Line-oriented link to the acquisition board
///
/// `read_line` blocks until a line arrives or the link's read timeout
/// elapses, in which case it returns `IntentError::TransportTimeout`.
pub trait Transport {
    /// Read one line, without its terminator
    fn read_line(&mut self) -> IntentResult<String>;

    /// Send a short token back to the board
    fn write_token(&mut self, token: &str) -> IntentResult<()>;

    /// Human readable name for logs
    fn describe(&self) -> String {
        "transport".to_string()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_line(&mut self) -> IntentResult<String> {
        (**self).read_line()
    }

    fn write_token(&mut self, token: &str) -> IntentResult<()> {
        (**self).write_token(token)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Accumulates stamped samples until a batch is complete
pub struct SampleBuffer {
    batch_size: usize,
    clock: Box<dyn Clock + Send>,
}

impl SampleBuffer {
    /// Create a buffer collecting `batch_size` reads per cycle
    pub fn new(batch_size: usize, clock: Box<dyn Clock + Send>) -> Self {
        Self { batch_size, clock }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Perform exactly `batch_size` reads and return them as a batch
    ///
    /// A timeout on any read discards everything collected so far.
    pub fn fill(&mut self, transport: &mut dyn Transport) -> IntentResult<SampleBatch> {
        let mut samples = Vec::with_capacity(self.batch_size);

        while samples.len() < self.batch_size {
            let line = match transport.read_line() {
                Ok(line) => line,
                Err(IntentError::TransportTimeout { .. }) => {
                    warn!(
                        collected = samples.len(),
                        expected = self.batch_size,
                        "read timed out, discarding partial batch"
                    );
                    return Err(IntentError::TransportTimeout {
                        collected: samples.len(),
                        expected: self.batch_size,
                    });
                }
                Err(e) => return Err(e),
            };

            let stamp = format_stamp(&self.clock.now());
            samples.push(RawSample::new(stamp, line.trim()));
        }

        let batch = SampleBatch::new(samples);
        debug!(cycle = %batch.id, samples = batch.len(), "batch complete");
        Ok(batch)
    }
}
