//! Raw sample hand-off between platform callbacks and the frame pump.
//!
//! Platform/OS callbacks may fire on any thread. They never touch device state; they
//! only push raw samples through a [`SampleSender`]. The owning device drains its
//! [`SampleQueue`] exactly once per tick inside [`Device::poll`](crate::device::Device::poll),
//! which is the only synchronization point between the two sides.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Maximum number of samples buffered per device between two ticks.
/// When full, the oldest sample is dropped.
pub const MAX_QUEUED_SAMPLES: usize = 4096;

/// Receiving side, owned by a device.
#[derive(Debug)]
pub struct SampleQueue<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

/// Producing side, handed to the platform collaborator. Cheap to clone.
#[derive(Debug)]
pub struct SampleSender<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Default for SampleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SampleQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn sender(&self) -> SampleSender<T> {
        SampleSender {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Take every queued sample, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let mut guard = self.inner.lock();
        guard.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<T> Clone for SampleSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SampleSender<T> {
    /// Enqueue one raw sample for the next tick.
    pub fn send(&self, sample: T) {
        let mut guard = self.inner.lock();
        if guard.len() >= MAX_QUEUED_SAMPLES {
            guard.pop_front();
            tracing::trace!("sample queue full, dropped oldest sample");
        }
        guard.push_back(sample);
    }
}
