//! Bounded sample windows and the statistics computed over them.

use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// A fixed-capacity FIFO of timing samples.
///
/// Pushing into a full window evicts the oldest sample first.
#[derive(Debug, Clone, Serialize)]
pub struct RollingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when over capacity.
    pub fn push(&mut self, sample: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest sample.
    pub fn first(&self) -> Option<f64> {
        self.samples.front().copied()
    }

    /// Newest sample.
    pub fn last(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Mean of all samples, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        mean(self.samples.iter())
    }

    /// Population standard deviation, `None` when empty.
    pub fn population_std_dev(&self) -> Option<f64> {
        population_std_dev(self.samples.iter())
    }

    /// Mean of the newest `n` samples (or all, when fewer are held).
    pub fn tail_mean(&self, n: usize) -> Option<f64> {
        let skip = self.samples.len().saturating_sub(n);
        mean(self.samples.iter().skip(skip))
    }
}

/// Arithmetic mean, `None` for an empty sequence.
pub fn mean<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let values: Vec<f64> = values.into_iter().copied().collect();
    if values.is_empty() {
        return None;
    }
    Some(values.mean())
}

/// Population (biased, divide-by-n) standard deviation.
pub fn population_std_dev<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let values: Vec<f64> = values.into_iter().copied().collect();
    match values.len() {
        0 => None,
        1 => Some(0.0),
        _ => Some(values.population_std_dev()),
    }
}

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
