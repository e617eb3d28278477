use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::Sample;

pub const DEFAULT_CAPACITY: usize = 2_000;

/// Fixed-capacity price history for one instrument, kept in timestamp order.
///
/// When full, an append evicts the oldest sample. In-order appends are O(1);
/// a late sample is inserted after every sample with an equal or earlier
/// timestamp, so equal timestamps keep their arrival order.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl TimeSeriesBuffer {
    /// `capacity` is clamped to at least one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, sample: Sample) {
        let in_order = self.samples.back().is_none_or(|last| last.ts <= sample.ts);

        if in_order {
            self.samples.push_back(sample);
        } else {
            let at = self.samples.partition_point(|s| s.ts <= sample.ts);
            self.samples.insert(at, sample);
        }

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Drops the current contents and refills from `samples`, keeping the newest `capacity`.
    pub fn reset_with(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.samples.clear();
        for s in samples {
            self.append(s);
        }
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            samples: self.samples.iter().copied().collect(),
        }
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

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Immutable, point-in-time copy of a buffer. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct BufferSnapshot {
    samples: Arc<[Sample]>,
}

impl BufferSnapshot {
    /// Price of the newest sample with `ts <= target`, scanning from the back.
    ///
    /// Returns `None` for an empty snapshot or when every sample is newer than `target`.
    pub fn as_of(&self, target: DateTime<Utc>) -> Option<f64> {
        self.samples
            .iter()
            .rev()
            .find(|s| s.ts <= target)
            .map(|s| s.price)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.last()
    }
}
