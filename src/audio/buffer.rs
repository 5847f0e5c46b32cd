use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::AudioConfig;
use crate::error::{Result, VttError};

/// A block of mono samples as delivered by a producer
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub samples: Vec<f32>,
    /// Rate the producer claims the samples were taken at, in Hz
    pub sample_rate: u32,
    /// Whether this block continues directly from the previous one
    pub contiguous: bool,
}

impl SampleBlock {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            contiguous: true,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fixed-capacity ring buffer holding the trailing window of audio
///
/// The physical layout is circular: `write_pos` marks both the slot the next
/// sample lands in and the oldest sample of the logical window.
pub struct AudioRingBuffer {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: u32,
    total_ingested: u64,
}

impl AudioRingBuffer {
    /// Create a buffer of `capacity` silent samples accepting blocks at `sample_rate`
    pub fn new(capacity: usize, sample_rate: u32) -> Result<Self> {
        if capacity == 0 {
            return Err(VttError::Config("ring buffer capacity must be positive".into()));
        }
        if sample_rate == 0 {
            return Err(VttError::Config("sample rate must be positive".into()));
        }

        Ok(Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            sample_rate,
            total_ingested: 0,
        })
    }

    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        Self::new(config.capacity(), config.sample_rate)
    }

    /// Append `samples` as the newest part of the window
    ///
    /// The oldest `samples.len()` samples fall out of the window. A block
    /// longer than the capacity leaves only its last `capacity` samples.
    /// Rejected blocks leave the buffer untouched.
    pub fn ingest(&mut self, samples: &[f32], declared_rate: u32, contiguous: bool) -> Result<()> {
        if declared_rate != self.sample_rate {
            return Err(VttError::UnsupportedRate {
                declared: declared_rate,
                expected: self.sample_rate,
            });
        }
        if !contiguous {
            return Err(VttError::UnsupportedDiscontinuity);
        }

        let capacity = self.buffer.len();
        let tail = &samples[samples.len().saturating_sub(capacity)..];

        let first = tail.len().min(capacity - self.write_pos);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&tail[..first]);
        let rest = tail.len() - first;
        self.buffer[..rest].copy_from_slice(&tail[first..]);

        self.write_pos = (self.write_pos + tail.len()) % capacity;
        self.total_ingested += samples.len() as u64;
        Ok(())
    }

    pub fn ingest_block(&mut self, block: &SampleBlock) -> Result<()> {
        self.ingest(&block.samples, block.sample_rate, block.contiguous)
    }

    /// Copy of the whole window, oldest to newest
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.buffer.len());
        self.snapshot_into(&mut out);
        out
    }

    /// Copy the window into `out`, reusing its allocation
    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend_from_slice(&self.buffer[self.write_pos..]);
        out.extend_from_slice(&self.buffer[..self.write_pos]);
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples accepted since construction, including overwritten ones
    pub fn total_ingested(&self) -> u64 {
        self.total_ingested
    }
}

/// Ring buffer shared between a capture producer and a snapshot consumer
///
/// Clones share the same storage. Every operation holds the lock only for the
/// copy in or out of the ring.
#[derive(Clone)]
pub struct SharedAudioBuffer {
    inner: Arc<Mutex<AudioRingBuffer>>,
    capacity: usize,
    sample_rate: u32,
}

impl SharedAudioBuffer {
    pub fn new(capacity: usize, sample_rate: u32) -> Result<Self> {
        Ok(Self::from_ring(AudioRingBuffer::new(capacity, sample_rate)?))
    }

    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        Self::new(config.capacity(), config.sample_rate)
    }

    pub fn from_ring(ring: AudioRingBuffer) -> Self {
        Self {
            capacity: ring.capacity(),
            sample_rate: ring.sample_rate(),
            inner: Arc::new(Mutex::new(ring)),
        }
    }

    pub fn ingest(&self, samples: &[f32], declared_rate: u32, contiguous: bool) -> Result<()> {
        self.inner.lock().ingest(samples, declared_rate, contiguous)
    }

    pub fn ingest_block(&self, block: &SampleBlock) -> Result<()> {
        self.inner.lock().ingest_block(block)
    }

    /// Copy of the window, oldest to newest
    ///
    /// The output is allocated before the lock is taken, so the critical
    /// section is the copy alone.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.capacity);
        self.snapshot_into(&mut out);
        out
    }

    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        self.inner.lock().snapshot_into(out);
    }

    pub fn total_ingested(&self) -> u64 {
        self.inner.lock().total_ingested()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
