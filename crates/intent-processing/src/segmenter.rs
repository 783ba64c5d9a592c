//! Sliding-window segmentation of a cleaned signal

use intent_core::{config_error, CleanedSignal, IntentResult, Window};

/// Splits a signal into fixed-size windows advancing by `stride` samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSegmenter {
    window_size: usize,
    stride: usize,
}

impl WindowSegmenter {
    pub fn new(window_size: usize, stride: usize) -> IntentResult<Self> {
        if window_size == 0 {
            return Err(config_error!("window size must be at least one sample"));
        }
        if stride == 0 {
            return Err(config_error!("stride must be at least one sample"));
        }
        Ok(Self { window_size, stride })
    }

    /// Segmenter for a window duration at a sampling rate, with 50% overlap
    pub fn for_duration(duration_secs: f64, sampling_rate: f64) -> IntentResult<Self> {
        let window_size = (duration_secs * sampling_rate) as usize;
        Self::new(window_size, window_size / 2)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of complete windows a signal of `len` samples yields
    pub fn window_count(&self, len: usize) -> usize {
        if len < self.window_size {
            0
        } else {
            (len - self.window_size) / self.stride + 1
        }
    }

    /// Lazily iterate the windows of a signal
    ///
    /// Calling this again restarts from the first window.
    pub fn windows<'a>(&self, signal: &'a CleanedSignal) -> Windows<'a> {
        Windows {
            signal,
            window_size: self.window_size,
            stride: self.stride,
            next_start: 0,
            next_index: 0,
        }
    }
}

/// Iterator over the complete windows of a signal
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    signal: &'a CleanedSignal,
    window_size: usize,
    stride: usize,
    next_start: usize,
    next_index: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.next_start + self.window_size;
        if end > self.signal.len() {
            return None;
        }

        let window = Window::new(
            self.next_index,
            self.next_start,
            &self.signal.samples()[self.next_start..end],
        );
        self.next_start += self.stride;
        self.next_index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_len = self.signal.len().saturating_sub(self.next_start);
        let remaining = if remaining_len < self.window_size {
            0
        } else {
            (remaining_len - self.window_size) / self.stride + 1
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> CleanedSignal {
        let values: Vec<f64> = (0..len).map(|i| i as f64).collect();
        CleanedSignal::from_values(&values, 125.0)
    }

    #[test]
    fn test_window_parameters_from_duration() {
        let segmenter = WindowSegmenter::for_duration(1.0, 125.0).unwrap();
        assert_eq!(segmenter.window_size(), 125);
        assert_eq!(segmenter.stride(), 62);
    }

    #[test]
    fn test_windows_are_full_length_and_evenly_strided() {
        let segmenter = WindowSegmenter::new(125, 62).unwrap();
        let signal = ramp(1000);

        let windows: Vec<_> = segmenter.windows(&signal).collect();
        assert_eq!(windows.len(), 15);
        assert_eq!(segmenter.window_count(1000), 15);

        for window in &windows {
            assert_eq!(window.len(), 125);
        }
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start_index - pair[0].start_index, 62);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }

        let last = windows.last().unwrap();
        assert_eq!(last.start_index, 868);
        assert_eq!(last.values()[0], 868.0);
    }

    #[test]
    fn test_window_timestamps() {
        let segmenter = WindowSegmenter::new(4, 2).unwrap();
        let signal = ramp(8);

        let second = segmenter.windows(&signal).nth(1).unwrap();
        assert_eq!(second.start_timestamp(), 0.016);
        assert_eq!(second.end_timestamp(), 0.04);
    }

    #[test]
    fn test_short_signal_yields_no_windows() {
        let segmenter = WindowSegmenter::new(125, 62).unwrap();
        let signal = ramp(124);

        assert_eq!(segmenter.windows(&signal).count(), 0);
        assert_eq!(segmenter.window_count(124), 0);
        assert_eq!(segmenter.windows(&CleanedSignal::default()).count(), 0);
    }

    #[test]
    fn test_windows_restart() {
        let segmenter = WindowSegmenter::new(10, 5).unwrap();
        let signal = ramp(30);

        let mut iter = segmenter.windows(&signal);
        assert_eq!(iter.len(), 5);
        iter.next();
        let resumed = iter.clone();
        assert_eq!(resumed.count(), 4);
        assert_eq!(segmenter.windows(&signal).count(), 5);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(WindowSegmenter::new(0, 1).is_err());
        assert!(WindowSegmenter::new(10, 0).is_err());
        // A one-sample window has no room for 50% overlap
        assert!(WindowSegmenter::for_duration(0.008, 125.0).is_err());
    }
}
