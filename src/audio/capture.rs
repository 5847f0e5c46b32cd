use std::cell::OnceCell;

use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::SharedAudioBuffer;
use crate::config::AudioConfig;
use crate::error::{Result, VttError};

thread_local! {
    // Held for the lifetime of the callback thread
    static RT_PRIORITY: OnceCell<Option<RtPriorityHandle>> = const { OnceCell::new() };
}

/// Live mono input stream feeding a shared ring buffer
///
/// Each device callback ingests its block straight into the buffer, holding
/// the buffer lock only for the copy. The callback thread is promoted to
/// real-time priority on its first block. The stream is paused on drop.
pub struct AudioCapture {
    stream: cpal::Stream,
}

impl AudioCapture {
    /// Open the named input device (or the default one) and start capturing
    pub fn new(
        config: &AudioConfig,
        buffer: SharedAudioBuffer,
        device_name: Option<&str>,
    ) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => find_input_device(&host, name)?,
            None => host
                .default_input_device()
                .ok_or_else(|| VttError::AudioDevice("No input device found".into()))?,
        };

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.block_size as u32),
        };

        let sample_rate = config.sample_rate;
        let block_size = config.block_size as u32;
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    promote_callback_thread(block_size, sample_rate);
                    if let Err(e) = buffer.ingest(data, sample_rate, true) {
                        log::warn!("Dropped capture block of {} samples: {}", data.len(), e);
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| VttError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| VttError::AudioStream(format!("{}", e)))?;

        Ok(Self { stream })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}

/// Promote the calling thread to real-time priority once
///
/// Returns true when this call made the attempt, false if the thread was
/// already handled.
fn promote_callback_thread(block_size: u32, sample_rate: u32) -> bool {
    RT_PRIORITY.with(|cell| {
        let mut attempted = false;
        cell.get_or_init(|| {
            attempted = true;
            match audio_thread_priority::promote_current_thread_to_real_time(
                block_size,
                sample_rate,
            ) {
                Ok(handle) => {
                    log::debug!("Capture thread promoted to real-time priority");
                    Some(handle)
                }
                Err(e) => {
                    log::warn!("Could not set real-time priority: {}", e);
                    None
                }
            }
        });
        attempted
    })
}

/// Names of all input devices on the default host
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| VttError::AudioDevice(e.to_string()))?;

    Ok(devices
        .filter_map(|device| device.description().ok())
        .map(|desc| desc.name().to_string())
        .collect())
}

fn find_input_device(host: &cpal::Host, name: &str) -> Result<cpal::Device> {
    let mut devices = host
        .input_devices()
        .map_err(|e| VttError::AudioDevice(e.to_string()))?;

    devices
        .find(|device| {
            device
                .description()
                .map(|desc| desc.name() == name)
                .unwrap_or(false)
        })
        .ok_or_else(|| VttError::AudioDevice(format!("Input device not found: {}", name)))
}
