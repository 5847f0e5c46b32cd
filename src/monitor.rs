//! Fixed-rate consumer of the shared capture window.
//!
//! Each tick snapshots the ring buffer, releases the lock, then runs the STFT
//! over the copy. Frames go out through a single-slot channel: a frame the
//! consumer has not picked up yet is replaced by the newer one, so a slow
//! consumer sees skipped frames instead of a growing queue.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select, tick};
use serde::Serialize;

use crate::audio::SharedAudioBuffer;
use crate::config::VttConfig;
use crate::constants::MIN_RMS_THRESHOLD;
use crate::error::Result;
use crate::signal_processing::{SpectralAnalyzer, SpectralFrame, amplitude_to_db, peak_abs, rms};

/// Snapshot of the window and its spectrum at one tick
#[derive(Debug, Clone)]
pub struct MonitorFrame {
    /// Tick counter, starting at 0; gaps mean frames were replaced
    pub tick: u64,
    /// Raw window, oldest sample first
    pub samples: Vec<f32>,
    pub spectrum: SpectralFrame,
}

impl MonitorFrame {
    /// Index of the newest segment that lies entirely inside the window
    pub fn latest_complete_segment(&self) -> Option<usize> {
        let rate = self.spectrum.sample_rate() as f32;
        let half = self.spectrum.segment_length() as f32 / 2.0;
        let end = self.samples.len() as f32;

        (0..self.spectrum.num_segments())
            .rev()
            .find(|&k| {
                let centre = self.spectrum.times[k] * rate;
                centre - half >= -0.5 && centre + half <= end + 0.5
            })
            .or_else(|| self.spectrum.num_segments().checked_sub(1))
    }

    pub fn summary(&self) -> FrameSummary {
        let segment_length = self.spectrum.segment_length();
        let recent = &self.samples[self.samples.len().saturating_sub(segment_length)..];

        let level = rms(recent);
        let dominant = if level >= MIN_RMS_THRESHOLD {
            self.latest_complete_segment().and_then(|seg| {
                let bin = self.spectrum.peak_bin(seg)?;
                Some((
                    self.spectrum.frequencies[bin],
                    self.spectrum.magnitude_db(seg, bin)?,
                ))
            })
        } else {
            None
        };
        let (dominant_hz, dominant_db) = dominant.unwrap_or((0.0, amplitude_to_db(0.0)));

        FrameSummary {
            tick: self.tick,
            rms: level,
            rms_db: amplitude_to_db(level),
            peak: peak_abs(recent),
            dominant_hz,
            dominant_db,
        }
    }
}

/// Display-oriented reduction of a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSummary {
    pub tick: u64,
    /// RMS of the newest segment's worth of samples
    pub rms: f32,
    pub rms_db: f32,
    pub peak: f32,
    /// Strongest bin of the newest complete segment; 0 Hz for silence
    pub dominant_hz: f32,
    pub dominant_db: f32,
}

pub struct Monitor {
    buffer: SharedAudioBuffer,
    analyzer: SpectralAnalyzer,
    ticks: u64,
}

impl Monitor {
    pub fn new(buffer: SharedAudioBuffer, analyzer: SpectralAnalyzer) -> Self {
        Self {
            buffer,
            analyzer,
            ticks: 0,
        }
    }

    pub fn from_config(buffer: SharedAudioBuffer, config: &VttConfig) -> Self {
        Self::new(buffer, SpectralAnalyzer::from_config(&config.analysis))
    }

    /// Snapshot the buffer and transform the copy
    pub fn tick(&mut self) -> Result<MonitorFrame> {
        let tick = self.ticks;
        self.ticks += 1;

        let samples = self.buffer.snapshot();
        let spectrum = self
            .analyzer
            .transform(&samples, self.buffer.sample_rate())?;

        Ok(MonitorFrame {
            tick,
            samples,
            spectrum,
        })
    }

    /// Run ticks every `interval` on a dedicated thread
    ///
    /// Returns the handle that stops the thread and the receiving end of the
    /// single-slot frame channel.
    pub fn spawn(mut self, interval: Duration) -> (MonitorHandle, Receiver<MonitorFrame>) {
        let (frame_tx, frame_rx) = bounded::<MonitorFrame>(1);
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let evict_rx = frame_rx.clone();

        let handle = thread::spawn(move || {
            let ticker = tick(interval);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        match self.tick() {
                            Ok(frame) => publish(&frame_tx, &evict_rx, frame),
                            Err(e) => log::warn!("Monitor tick failed: {}", e),
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
            log::debug!("Monitor stopped after {} ticks", self.ticks);
        });

        (
            MonitorHandle {
                stop_tx: Some(stop_tx),
                handle: Some(handle),
            },
            frame_rx,
        )
    }
}

/// Put `frame` in the slot, replacing a frame nobody has taken yet
fn publish(tx: &Sender<MonitorFrame>, evict_rx: &Receiver<MonitorFrame>, frame: MonitorFrame) {
    match tx.try_send(frame) {
        Ok(()) => {}
        Err(TrySendError::Full(frame)) => {
            if let Ok(stale) = evict_rx.try_recv() {
                log::trace!("Consumer behind, skipping frame {}", stale.tick);
            }
            if let Err(e) = tx.try_send(frame) {
                log::trace!("Skipping frame {}", e.into_inner().tick);
            }
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}

pub struct MonitorHandle {
    stop_tx: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop the monitor thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender wakes the select with a disconnect
        self.stop_tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("Monitor thread panicked");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
