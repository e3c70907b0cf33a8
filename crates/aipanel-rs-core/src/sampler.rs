//! Periodic resource samplers feeding fixed-capacity rolling buffers.

use aipanel_rs_protocol::{ResourceKind, ResourceProbe, Sample};
use log::debug;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fixed-capacity FIFO that drops the oldest item when full.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingBuffer<T> {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`, returning the evicted oldest item when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }
}

/// One rolling buffer per tracked resource.
#[derive(Debug, Clone)]
pub struct SampleBuffers {
    cpu: RollingBuffer<Sample>,
    memory: RollingBuffer<Sample>,
    gpu: RollingBuffer<Sample>,
}

impl SampleBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: RollingBuffer::new(capacity),
            memory: RollingBuffer::new(capacity),
            gpu: RollingBuffer::new(capacity),
        }
    }

    /// Route `sample` into the buffer for its kind.
    pub fn record(&mut self, sample: Sample) {
        self.buffer_mut(sample.kind).push(sample);
    }

    pub fn buffer(&self, kind: ResourceKind) -> &RollingBuffer<Sample> {
        match kind {
            ResourceKind::Cpu => &self.cpu,
            ResourceKind::Memory => &self.memory,
            ResourceKind::Gpu => &self.gpu,
        }
    }

    fn buffer_mut(&mut self, kind: ResourceKind) -> &mut RollingBuffer<Sample> {
        match kind {
            ResourceKind::Cpu => &mut self.cpu,
            ResourceKind::Memory => &mut self.memory,
            ResourceKind::Gpu => &mut self.gpu,
        }
    }

    /// Plot points `(index, value)` for `kind`, oldest at index zero.
    pub fn series(&self, kind: ResourceKind) -> Vec<(f64, f64)> {
        self.buffer(kind)
            .iter()
            .enumerate()
            .map(|(index, sample)| (index as f64, sample.value))
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.cpu.capacity()
    }
}

/// Samples CPU and memory from a probe plus a simulated GPU reading.
pub struct Sampler {
    probe: Arc<dyn ResourceProbe>,
    buffers: Arc<Mutex<SampleBuffers>>,
}

impl Sampler {
    pub fn new(probe: Arc<dyn ResourceProbe>, capacity: usize) -> Self {
        Self {
            probe,
            buffers: Arc::new(Mutex::new(SampleBuffers::new(capacity))),
        }
    }

    /// Shared handle to the buffers read by the chart.
    pub fn buffers(&self) -> Arc<Mutex<SampleBuffers>> {
        self.buffers.clone()
    }

    /// Take one reading per resource and record them.
    pub fn sample_once(&self) -> [Sample; 3] {
        let samples = [
            Sample::measured(ResourceKind::Cpu, self.probe.cpu_percent()),
            Sample::measured(ResourceKind::Memory, self.probe.memory_percent()),
            // No portable GPU telemetry; a uniform placeholder flagged as simulated.
            Sample::simulated(ResourceKind::Gpu, f64::from(rand::rng().random_range(0..=100u8))),
        ];
        let mut buffers = self.buffers.lock();
        for sample in samples {
            buffers.record(sample);
        }
        samples
    }

    /// Sample every `interval` until the returned task is aborted.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        debug!("sampler started (interval_ms={})", interval.as_millis());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sample_once();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rolling_buffer_keeps_most_recent_in_order() {
        let mut buffer = RollingBuffer::new(30);
        for value in 0..45 {
            buffer.push(value);
        }
        assert_eq!(buffer.len(), 30);
        let kept: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(kept, (15..45).collect::<Vec<_>>());
    }

    #[test]
    fn push_reports_evictions() {
        let mut buffer = RollingBuffer::new(2);
        assert_eq!(buffer.push('a'), None);
        assert_eq!(buffer.push('b'), None);
        assert_eq!(buffer.push('c'), Some('a'));
        assert_eq!(buffer.latest(), Some(&'c'));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut buffer = RollingBuffer::new(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn series_indexes_from_oldest() {
        let mut buffers = SampleBuffers::new(3);
        for value in [10.0, 20.0, 30.0, 40.0] {
            buffers.record(Sample::measured(ResourceKind::Memory, value));
        }
        assert_eq!(
            buffers.series(ResourceKind::Memory),
            vec![(0.0, 20.0), (1.0, 30.0), (2.0, 40.0)]
        );
        assert!(buffers.series(ResourceKind::Cpu).is_empty());
    }
}
