use std::f64::consts::PI;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use hound::WavReader;

use super::{SampleBlock, SharedAudioBuffer};

/// Producer of mono sample blocks other than a live device
pub trait AudioSource: Send {
    /// Next block, or `None` once the source is exhausted
    fn next_block(&mut self) -> anyhow::Result<Option<SampleBlock>>;
    fn sample_rate(&self) -> u32;
}

pub struct WavFileSource {
    samples: Vec<f32>,
    position: usize,
    block_size: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P, block_size: usize) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let spec = reader.spec();

        if spec.channels != 1 {
            anyhow::bail!("Expected mono WAV file, got {} channels", spec.channels);
        }
        if block_size == 0 {
            anyhow::bail!("Block size must be positive");
        }

        let sample_rate = spec.sample_rate;
        let samples = Self::read_samples(reader, &spec)?;
        log::debug!(
            "Loaded {} samples at {} Hz from {}",
            samples.len(),
            sample_rate,
            path.display()
        );

        Ok(Self {
            samples,
            position: 0,
            block_size,
            sample_rate,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> anyhow::Result<Vec<f32>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = 2_i64.pow(spec.bits_per_sample as u32 - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioSource for WavFileSource {
    fn next_block(&mut self) -> anyhow::Result<Option<SampleBlock>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.block_size).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(SampleBlock::new(chunk, self.sample_rate)))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Phase-continuous sine generator
pub struct ToneSource {
    frequency_hz: f64,
    amplitude: f32,
    sample_rate: u32,
    block_size: usize,
    produced: u64,
    limit: Option<u64>,
}

impl ToneSource {
    pub fn new(frequency_hz: f32, amplitude: f32, sample_rate: u32, block_size: usize) -> Self {
        Self {
            frequency_hz: frequency_hz as f64,
            amplitude,
            sample_rate,
            block_size: block_size.max(1),
            produced: 0,
            limit: None,
        }
    }

    /// Stop after `secs` seconds of samples
    pub fn with_duration(mut self, secs: f32) -> Self {
        self.limit = Some((secs as f64 * self.sample_rate as f64).round() as u64);
        self
    }
}

impl AudioSource for ToneSource {
    fn next_block(&mut self) -> anyhow::Result<Option<SampleBlock>> {
        let remaining = match self.limit {
            Some(limit) if self.produced >= limit => return Ok(None),
            Some(limit) => (limit - self.produced).min(self.block_size as u64) as usize,
            None => self.block_size,
        };

        let step = 2.0 * PI * self.frequency_hz / self.sample_rate as f64;
        let start = self.produced;
        let samples = (0..remaining as u64)
            .map(|i| self.amplitude * ((start + i) as f64 * step).sin() as f32)
            .collect();
        self.produced += remaining as u64;

        Ok(Some(SampleBlock::new(samples, self.sample_rate)))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Pump `source` into `buffer` until it is exhausted or `stop` is raised
///
/// With `realtime` set, blocks are released at the source's sample rate the
/// way a capture device would deliver them. Rejected blocks are logged and
/// skipped; the buffer stays usable. Returns the number of samples ingested.
pub fn feed_source(
    mut source: Box<dyn AudioSource>,
    buffer: SharedAudioBuffer,
    realtime: bool,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<u64> {
    let sample_rate = source.sample_rate() as f64;
    let start = Instant::now();
    let mut ingested = 0u64;
    let mut delivered = 0u64;

    while !stop.load(Ordering::Relaxed) {
        let Some(block) = source.next_block()? else {
            break;
        };
        delivered += block.len() as u64;

        match buffer.ingest_block(&block) {
            Ok(()) => ingested += block.len() as u64,
            Err(e) => log::warn!("Dropped block of {} samples: {}", block.len(), e),
        }

        if realtime && sample_rate > 0.0 {
            let due = Duration::from_secs_f64(delivered as f64 / sample_rate);
            let elapsed = start.elapsed();
            if due > elapsed {
                thread::sleep(due - elapsed);
            }
        }
    }

    Ok(ingested)
}

/// Run `feed_source` on its own producer thread
pub fn spawn_feeder(
    source: Box<dyn AudioSource>,
    buffer: SharedAudioBuffer,
    realtime: bool,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<anyhow::Result<u64>> {
    thread::spawn(move || feed_source(source, buffer, realtime, stop))
}
