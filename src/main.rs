use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;

use simple_vtt::audio::{
    AudioCapture, AudioSource, SharedAudioBuffer, ToneSource, WavFileSource, list_input_devices,
    spawn_feeder,
};
use simple_vtt::config::{VttConfig, WindowDuration, WindowFunction};
use simple_vtt::monitor::Monitor;
use simple_vtt::output::{OutputFormat, create_formatter};

#[derive(Parser, Debug)]
#[command(name = "simple_vtt")]
#[command(about = "Live audio window with short-time spectral analysis", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input device name (default device if omitted)
    #[arg(long)]
    device: Option<String>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Play a mono WAV file through the window instead of capturing
    #[arg(short = 'i', long, conflicts_with = "tone")]
    input: Option<PathBuf>,

    /// Feed a synthetic sine at this frequency in Hz instead of capturing
    #[arg(long)]
    tone: Option<f32>,

    /// Capture window length (e.g., "3", "3s", "2500ms")
    #[arg(short, long)]
    window: Option<WindowDuration>,

    /// Analysis window function
    #[arg(long, value_enum)]
    window_function: Option<WindowFunction>,

    /// Monitor rate in Hz
    #[arg(long)]
    redraw_hz: Option<f32>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

enum Producer {
    Device(AudioCapture),
    Feeder(thread::JoinHandle<anyhow::Result<u64>>),
}

impl Producer {
    fn is_finished(&self) -> bool {
        match self {
            Producer::Device(_) => false,
            Producer::Feeder(handle) => handle.is_finished(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    if args.list_devices {
        let devices = list_input_devices()?;
        if devices.is_empty() {
            eprintln!("No input devices found.");
        } else {
            for name in &devices {
                println!("{}", name);
            }
        }
        return Ok(());
    }

    let config = build_config(&args)?;

    log::info!(
        "Sample rate: {} Hz, window: {} ({} samples)",
        config.audio.sample_rate,
        config.audio.window,
        config.audio.capacity()
    );
    log::info!(
        "Segment length: {} samples, redraw: {} Hz",
        config.analysis.segment_length(config.audio.sample_rate),
        config.display.redraw_rate_hz
    );

    let buffer = SharedAudioBuffer::from_config(&config.audio)?;
    let stop = Arc::new(AtomicBool::new(false));
    let producer = start_producer(&args, &config, buffer.clone(), Arc::clone(&stop))?;

    let (monitor, frames) =
        Monitor::from_config(buffer, &config).spawn(config.display.redraw_interval());

    let formatter = create_formatter(args.format, args.verbose > 0);
    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    let mut printed = 0u64;
    loop {
        match frames.recv_timeout(Duration::from_secs(1)) {
            Ok(frame) => {
                println!("{}", formatter.format(&frame.summary()));
                printed += 1;
                if args.frames.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => log::warn!("No frames for 1s"),
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if producer.is_finished() {
            log::info!("Input exhausted");
            break;
        }
    }

    stop.store(true, Ordering::Relaxed);
    monitor.stop();

    match producer {
        Producer::Device(capture) => drop(capture),
        Producer::Feeder(handle) => {
            let ingested = handle
                .join()
                .map_err(|_| anyhow::anyhow!("feeder thread panicked"))??;
            log::info!("Ingested {} samples", ingested);
        }
    }

    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<VttConfig> {
    let mut config = match &args.config {
        Some(path) => VttConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => VttConfig::default(),
    };

    if let Some(window) = args.window {
        config.audio.window = window;
    }
    if let Some(function) = args.window_function {
        config.analysis.window_function = function;
    }
    if let Some(rate) = args.redraw_hz {
        config.display.redraw_rate_hz = rate;
    }

    config.validate()?;
    Ok(config)
}

fn start_producer(
    args: &Args,
    config: &VttConfig,
    buffer: SharedAudioBuffer,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<Producer> {
    let block_size = config.audio.block_size;

    let source: Box<dyn AudioSource> = if let Some(path) = &args.input {
        let source = WavFileSource::new(path, block_size)?;
        if source.sample_rate() != config.audio.sample_rate {
            anyhow::bail!(
                "{} is sampled at {} Hz; the window runs at {} Hz",
                path.display(),
                source.sample_rate(),
                config.audio.sample_rate
            );
        }
        Box::new(source)
    } else if let Some(freq) = args.tone {
        Box::new(ToneSource::new(freq, 0.5, config.audio.sample_rate, block_size))
    } else {
        println!("Starting audio capture...");
        let capture = AudioCapture::new(&config.audio, buffer, args.device.as_deref())?;
        return Ok(Producer::Device(capture));
    };

    Ok(Producer::Feeder(spawn_feeder(source, buffer, true, stop)))
}
