//! Demonstration of the Cadence Engine on a synthetic walk.
//!
//! This example shows how to:
//! 1. Build a recorded stream (here generated in memory)
//! 2. Replay it through a collector with input decimation
//! 3. Feed the samples into a session anchored on the recording's timestamps
//! 4. Report session statistics and summarise the estimates
//!
//! Run with: cargo run --example replay_demo

use std::fmt::Write as _;
use std::io::Cursor;
use std::time::Duration;

use cadence_engine::{
    collector::{InputStride, ReplayCollector, StreamFormat},
    core::CadenceSession,
    EngineConfig,
};

/// Sensor delivery rate before decimation.
const SENSOR_RATE_HZ: f64 = 150.0;
/// Keep every third event, as a wrist-worn host would.
const STRIDE: usize = 3;

fn main() {
    println!("Cadence Engine - Replay Demo");
    println!("============================");
    println!();

    // A brisk walk at 1.8 Hz that speeds up to 2.4 Hz halfway through.
    let seconds = 120.0;
    let count = (SENSOR_RATE_HZ * seconds) as usize;
    let mut stream = String::from("x,y,z,timestamp\n");
    let mut phase = 0.0_f64;
    for i in 0..count {
        let t = i as f64 / SENSOR_RATE_HZ;
        let freq = if t < seconds / 2.0 { 1.8 } else { 2.4 };
        phase += 2.0 * std::f64::consts::PI * freq / SENSOR_RATE_HZ;
        let vertical = 9.81 + 2.0 * phase.sin();
        let sway = 0.3 * (phase / 2.0).sin();
        let ts = (t * 1000.0).round() as i64;
        let _ = writeln!(stream, "{sway:.4},{vertical:.4},0.05,{ts}");
    }

    println!("Generated {count} samples at {SENSOR_RATE_HZ} Hz, keeping every {STRIDE}rd");
    println!();

    // Effective rate after decimation is 50 Hz, the engine's nominal rate.
    let config = EngineConfig {
        window_size: 512,
        update_frequency: 64,
        history_count: 8,
        ..EngineConfig::default()
    };
    let mut session = match CadenceSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error creating session: {e}");
            return;
        }
    };

    let stride = InputStride::new(STRIDE).unwrap_or_default();
    let source = Box::new(Cursor::new(stream));
    let mut collector = ReplayCollector::new(source, StreamFormat::Csv, stride);
    if let Err(e) = collector.start() {
        eprintln!("Error starting collector: {e}");
        return;
    }

    let receiver = collector.receiver().clone();

    loop {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => match session.record_sample(sample) {
                Ok(outcome) => {
                    if let Some(estimate) = outcome.estimate() {
                        println!(
                            "  t={:>6.1}s  {:.3} Hz  {:>5.1} bpm  axis {}",
                            estimate.timestamp as f64 / 1000.0,
                            estimate.frequency_hz,
                            estimate.bpm(),
                            estimate.axis
                        );
                    }
                }
                Err(e) => eprintln!("  engine reset: {e}"),
            },
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    collector.stop();

    println!();
    println!("{}", session.log().summary());
    if let Some(summary) = session.summary() {
        println!();
        println!("{}", summary.summary());
    }
}
