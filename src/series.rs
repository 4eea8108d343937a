//! Bounded per-series sample buffers for live plotting windows.

use std::collections::VecDeque;

use crate::types::{Series, SeriesSample, TelemetryFrame};

/// Default plotting window: the newest 30 samples per series.
pub const DEFAULT_SERIES_CAPACITY: usize = 30;

/// Fixed-capacity FIFO buffer of [`SeriesSample`]s for one named series.
///
/// `push` is O(1) amortized; once the buffer is full the oldest sample is
/// evicted. Snapshots are owned copies, so no caller can mutate buffer state
/// through one.
#[derive(Debug, Clone)]
pub struct BoundedSeriesBuffer {
    samples: VecDeque<SeriesSample>,
    capacity: usize,
}

impl BoundedSeriesBuffer {
    /// Create a buffer with the given fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a sample, evicting the oldest if the buffer is full.
    /// A zero-capacity buffer keeps nothing.
    pub fn push(&mut self, value: f64, seq: u64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(SeriesSample { value, seq });
    }

    /// Ordered copy of the retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<SeriesSample> {
        self.samples.iter().copied().collect()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<SeriesSample> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// One [`BoundedSeriesBuffer`] per telemetry series, updated in lockstep.
#[derive(Debug, Clone)]
pub struct SeriesSet {
    buffers: [BoundedSeriesBuffer; 8],
}

impl Default for SeriesSet {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAPACITY)
    }
}

impl SeriesSet {
    pub fn new(capacity: usize) -> Self {
        Self { buffers: std::array::from_fn(|_| BoundedSeriesBuffer::new(capacity)) }
    }

    /// Fan one decoded frame out to all eight series under one sequence index.
    pub fn record(&mut self, frame: &TelemetryFrame, seq: u64) {
        for series in Series::ALL {
            self.buffers[series.index()].push(frame.series_value(series), seq);
        }
    }

    pub fn get(&self, series: Series) -> &BoundedSeriesBuffer {
        &self.buffers[series.index()]
    }

    /// Snapshot of one series, oldest first.
    pub fn snapshot(&self, series: Series) -> Vec<SeriesSample> {
        self.get(series).snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_fifo_eviction_at_capacity() {
        let mut buffer = BoundedSeriesBuffer::new(30);
        for i in 0..35u64 {
            buffer.push(i as f64, i);
        }

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 30);
        // Pushes 0..=4 were evicted; the sixth push (index 5) leads.
        assert_eq!(snapshot[0], SeriesSample { value: 5.0, seq: 5 });
        assert_eq!(snapshot[29], SeriesSample { value: 34.0, seq: 34 });
    }

    #[test]
    fn snapshot_is_detached_from_the_buffer() {
        let mut buffer = BoundedSeriesBuffer::new(4);
        buffer.push(1.0, 1);

        let mut snapshot = buffer.snapshot();
        snapshot.clear();

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.latest(), Some(SeriesSample { value: 1.0, seq: 1 }));
    }

    #[test]
    fn series_set_advances_in_lockstep() {
        let mut set = SeriesSet::default();
        let frame = TelemetryFrame::from_fields([10.0, 20.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        set.record(&frame, 1);
        set.record(&frame, 2);

        for series in Series::ALL {
            let snapshot = set.snapshot(series);
            assert_eq!(snapshot.len(), 2, "{} out of lockstep", series.name());
            assert_eq!(snapshot[0].seq, 1);
            assert_eq!(snapshot[1].seq, 2);
            assert_eq!(snapshot[1].value, frame.series_value(series));
        }
    }

    #[test]
    fn zero_capacity_buffer_never_grows() {
        let mut buffer = BoundedSeriesBuffer::new(0);
        for i in 0..10u64 {
            buffer.push(i as f64, i);
        }

        assert!(buffer.is_empty());
        assert_eq!(buffer.latest(), None);
    }

    #[test]
    fn empty_buffer_reports_empty() {
        let buffer = BoundedSeriesBuffer::new(8);
        assert!(buffer.is_empty());
        assert_eq!(buffer.latest(), None);
        assert!(buffer.snapshot().is_empty());
        assert_eq!(buffer.capacity(), 8);
    }
}
