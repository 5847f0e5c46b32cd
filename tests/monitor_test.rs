mod test_signals;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use simple_vtt::Monitor;
use simple_vtt::audio::{
    AudioSource, SharedAudioBuffer, ToneSource, WavFileSource, feed_source, spawn_feeder,
};
use simple_vtt::config::VttConfig;

use test_signals::{generate_sine, save_mono_wav};

#[test]
fn test_monitor_sees_fed_tone() {
    let config = VttConfig::default();
    let buffer = SharedAudioBuffer::from_config(&config.audio).unwrap();

    let tone = ToneSource::new(440.0, 0.5, 8000, config.audio.block_size).with_duration(4.0);
    let ingested = feed_source(
        Box::new(tone),
        buffer.clone(),
        false,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(ingested, 32000);

    let mut monitor = Monitor::from_config(buffer, &config);
    let summary = monitor.tick().unwrap().summary();
    assert!((summary.dominant_hz - 440.0).abs() < 1e-3);
    assert!((summary.rms - 0.5 * std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-2);
}

#[test]
fn test_concurrent_producer_and_monitor() {
    let config = VttConfig::default();
    let buffer = SharedAudioBuffer::from_config(&config.audio).unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    // Unpaced producer hammering the buffer while the monitor ticks
    let tone = ToneSource::new(1000.0, 0.5, 8000, 256);
    let feeder = spawn_feeder(Box::new(tone), buffer.clone(), false, Arc::clone(&stop));

    let (handle, frames) = Monitor::from_config(buffer, &config).spawn(Duration::from_millis(10));

    let mut received = 0;
    while received < 5 {
        let frame = frames
            .recv_timeout(Duration::from_secs(5))
            .expect("monitor frame");
        assert_eq!(frame.samples.len(), 24000);
        received += 1;
    }

    stop.store(true, Ordering::Relaxed);
    handle.stop();
    let ingested = feeder.join().unwrap().unwrap();
    assert!(ingested > 0);
}

#[test]
fn test_wav_source_round_trip_through_window() {
    let path = std::env::temp_dir().join(format!("simple_vtt_test_{}.wav", std::process::id()));
    let signal = generate_sine(440.0, 8000, 12000, 0.5);
    save_mono_wav(&path, &signal, 8000).unwrap();

    let source = WavFileSource::new(&path, 3000).unwrap();
    assert_eq!(source.sample_rate(), 8000);
    assert_eq!(source.len(), 12000);

    let buffer = SharedAudioBuffer::new(8000, 8000).unwrap();
    let ingested = feed_source(
        Box::new(source),
        buffer.clone(),
        false,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert_eq!(ingested, 12000);

    // 16-bit quantisation
    let snapshot = buffer.snapshot();
    for (got, want) in snapshot.iter().zip(&signal[4000..]) {
        assert!((got - want).abs() < 1e-3);
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_wav_source_rejects_stereo() {
    let path = std::env::temp_dir().join(format!("simple_vtt_stereo_{}.wav", std::process::id()));
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..16 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    assert!(WavFileSource::new(&path, 256).is_err());
    let _ = std::fs::remove_file(&path);
}
