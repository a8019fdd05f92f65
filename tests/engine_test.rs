//! Integration tests for the cadence engine public API

use cadence_engine::collector::{InputStride, ReplayCollector, StreamFormat};
use cadence_engine::core::spectral::{bin_frequency, sample_interval_secs};
use cadence_engine::{
    Axis, CadenceEngine, CadenceSession, EngineConfig, EngineError, NoEstimateReason,
    RecordOutcome, SampleRecord, SharedCadenceEngine,
};
use std::f64::consts::PI;
use std::thread;

const RATE_HZ: f64 = 32.0;
const BIN_HZ: f32 = 0.03125; // 32 Hz over 1024 samples

fn timestamp(i: usize) -> i64 {
    (i as f64 * 1000.0 / RATE_HZ).round() as i64
}

fn wave(i: usize, freq_hz: f64) -> f32 {
    (2.0 * PI * freq_hz * i as f64 / RATE_HZ).sin() as f32
}

fn engine() -> CadenceEngine {
    CadenceEngine::with_origin(EngineConfig::default(), 0).unwrap()
}

#[test]
fn test_two_hz_on_x_axis() {
    let mut engine = engine();
    let mut last = None;

    for i in 0..1024 {
        let outcome = engine
            .record_sample(SampleRecord::at(wave(i, 2.0), 0.0, 0.0, timestamp(i)))
            .unwrap();
        if let Some(estimate) = outcome.estimate() {
            last = Some(*estimate);
        }
    }

    let estimate = last.unwrap();
    assert_eq!(estimate.axis, Axis::X);
    assert!((estimate.frequency_hz - 2.0).abs() <= BIN_HZ);
    assert!((estimate.bpm() - 120.0).abs() <= BIN_HZ * 60.0);
}

#[test]
fn test_record_returns_some_exactly_every_update() {
    let mut engine = engine();

    for i in 0..2048 {
        let result = engine.record(wave(i, 2.0), 0.0, 0.0, Some(timestamp(i))).unwrap();
        if (i + 1) % 32 == 0 {
            assert!(result.is_some(), "call {} should analyse", i + 1);
        } else {
            assert!(result.is_none(), "call {} should not analyse", i + 1);
        }
    }
}

#[test]
fn test_long_stream_keeps_footprint_and_estimate() {
    let mut engine = engine();
    let storage = engine.store().storage_len();
    let mut compactions = 0;

    for i in 0..40_000 {
        let outcome = engine
            .record_sample(SampleRecord::at(wave(i, 2.0), 0.0, 0.0, timestamp(i)))
            .unwrap();
        assert_eq!(engine.store().storage_len(), storage);

        if outcome.compacted() {
            compactions += 1;
            assert_eq!(engine.store().write_cursor(), 1024);
        }
        // Every window past the first 1024 samples is fully real.
        if i >= 1024 {
            if let Some(estimate) = outcome.estimate() {
                assert!((estimate.frequency_hz - 2.0).abs() <= BIN_HZ);
            }
        }
    }

    assert_eq!(storage, 32 * 1024);
    // One pass through the 31744 free slots.
    assert_eq!(compactions, 1);
}

#[test]
fn test_all_zero_input_is_degenerate() {
    let mut engine = engine();

    for i in 0..31 {
        assert_eq!(engine.record(0.0, 0.0, 0.0, Some(timestamp(i + 1))).unwrap(), None);
    }
    let outcome = engine
        .record_sample(SampleRecord::at(0.0, 0.0, 0.0, timestamp(32)))
        .unwrap();
    assert_eq!(
        outcome,
        RecordOutcome::NoEstimate {
            reason: NoEstimateReason::DegenerateSpectrum,
            compacted: false
        }
    );

    // The engine keeps running afterwards.
    assert_eq!(engine.record(0.0, 0.0, 0.0, Some(timestamp(33))).unwrap(), None);
}

#[test]
fn test_frozen_timestamps_give_no_estimate() {
    let mut engine = engine();
    let mut last = None;

    for i in 0..32 {
        last = Some(
            engine
                .record_sample(SampleRecord::at(wave(i, 2.0), 0.0, 0.0, 0))
                .unwrap(),
        );
    }

    assert_eq!(
        last.unwrap(),
        RecordOutcome::NoEstimate {
            reason: NoEstimateReason::InvalidSampleInterval,
            compacted: false
        }
    );
}

#[test]
fn test_equal_axes_prefer_x() {
    let mut engine = engine();
    let mut last = None;

    for i in 0..1024 {
        let v = wave(i, 2.0);
        let outcome = engine
            .record_sample(SampleRecord::at(v, v, 0.0, timestamp(i)))
            .unwrap();
        if let Some(estimate) = outcome.estimate() {
            last = Some(*estimate);
        }
    }

    assert_eq!(last.unwrap().axis, Axis::X);
}

#[test]
fn test_strongest_axis_wins() {
    let mut engine = engine();
    let mut last = None;

    for i in 0..1024 {
        let outcome = engine
            .record_sample(SampleRecord::at(
                0.2 * wave(i, 1.5),
                0.0,
                wave(i, 2.5),
                timestamp(i),
            ))
            .unwrap();
        if let Some(estimate) = outcome.estimate() {
            last = Some(*estimate);
        }
    }

    let estimate = last.unwrap();
    assert_eq!(estimate.axis, Axis::Z);
    assert!((estimate.frequency_hz - 2.5).abs() <= BIN_HZ);
}

#[test]
fn test_between_bins_is_refined() {
    let mut engine = engine();
    let mut window = Vec::new();
    let mut last = None;

    // Halfway between bins 64 and 65.
    let freq = 64.5 / (1024.0 / RATE_HZ);
    for i in 0..1024 {
        let sample = SampleRecord::at(wave(i, freq), 0.0, 0.0, timestamp(i));
        window.push(sample);
        if let Some(estimate) = engine.record_sample(sample).unwrap().estimate() {
            last = Some(*estimate);
        }
    }

    let estimate = last.unwrap();
    let dt = sample_interval_secs(&window);
    let low = bin_frequency(64, 1024, dt);
    let high = bin_frequency(65, 1024, dt);

    assert!(estimate.refined);
    assert!(estimate.frequency_hz > low && estimate.frequency_hz < high);
}

#[test]
fn test_invalid_config_rejected() {
    let config = EngineConfig {
        update_frequency: 48,
        ..EngineConfig::default()
    };
    assert!(matches!(
        CadenceEngine::new(config),
        Err(EngineError::Configuration(_))
    ));
}

#[test]
fn test_shared_engine_across_threads() {
    let shared = SharedCadenceEngine::from_engine(engine());
    let writer = shared.clone();

    let handle = thread::spawn(move || {
        for i in 0..2048 {
            writer
                .record_sample(SampleRecord::at(0.0, wave(i, 2.0), 0.0, timestamp(i)))
                .unwrap();
        }
    });

    while !handle.is_finished() {
        if let Some(estimate) = shared.latest() {
            assert!(estimate.frequency_hz > 0.0);
        }
        thread::yield_now();
    }
    handle.join().unwrap();

    let latest = shared.latest().unwrap();
    assert_eq!(latest.axis, Axis::Y);
    assert!((latest.frequency_hz - 2.0).abs() <= BIN_HZ);
}

#[test]
fn test_replay_file_through_engine() {
    let dir = std::env::temp_dir().join(format!("cadence-replay-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("walk.csv");

    let mut text = String::from("x,y,z,timestamp\n# 2 Hz on z\n");
    for i in 0..1024 {
        text.push_str(&format!("0,0,{},{}\n", wave(i, 2.0), timestamp(i)));
    }
    std::fs::write(&path, text).unwrap();

    let mut collector =
        ReplayCollector::from_file(&path, StreamFormat::from_path(&path), InputStride::default())
            .unwrap();
    collector.start().unwrap();

    let mut engine = engine();
    let mut last = None;
    for sample in collector.receiver().iter() {
        if let Some(estimate) = engine.record_sample(sample).unwrap().estimate() {
            last = Some(*estimate);
        }
    }

    let estimate = last.unwrap();
    assert_eq!(estimate.axis, Axis::Z);
    assert!((estimate.frequency_hz - 2.0).abs() <= BIN_HZ);
    assert_eq!(collector.skipped_lines(), 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_recorded_session_estimates_every_cycle() {
    let dir = std::env::temp_dir().join(format!("cadence-session-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("walk-2023.csv");

    // 50 Hz capture from November 2023, 2 Hz on x.
    let start: i64 = 1_700_000_000_000;
    let mut text = String::from("x,y,z,timestamp\n");
    for i in 0..2048 {
        let x = (2.0 * PI * 2.0 * i as f64 / 50.0).sin() as f32;
        text.push_str(&format!("{},0,0,{}\n", x, start + i as i64 * 20));
    }
    std::fs::write(&path, text).unwrap();

    let mut collector =
        ReplayCollector::from_file(&path, StreamFormat::Csv, InputStride::default()).unwrap();
    collector.start().unwrap();

    let mut session = CadenceSession::new(EngineConfig::default()).unwrap();
    let mut calls = 0;
    for sample in collector.receiver().iter() {
        let outcome = session.record_sample(sample).unwrap();
        calls += 1;
        if calls % 32 == 0 {
            assert!(
                outcome.estimate().is_some(),
                "cycle at call {} gave {:?}",
                calls,
                outcome
            );
        } else {
            assert!(!outcome.is_cycle());
        }
    }

    assert_eq!(calls, 2048);
    assert_eq!(session.estimates().len(), 64);
    assert_eq!(session.log().stats().no_estimate_cycles, 0);

    let latest = session.latest().unwrap();
    assert_eq!(latest.axis, Axis::X);
    assert!((latest.frequency_hz - 2.0).abs() <= 50.0 / 1024.0);

    let _ = std::fs::remove_dir_all(&dir);
}
