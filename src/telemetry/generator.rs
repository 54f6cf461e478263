//! # Signal Generator
//!
//! Synthesizes one window of AC voltage and current samples per cycle and
//! reduces it to a [`TelemetrySnapshot`].

use std::f64::consts::TAU;

use super::{unix_now, TelemetrySnapshot};
use crate::config::SignalConfig;

/// Decimal places kept for voltage, active power, reactive power and power factor
const POWER_DECIMALS: i32 = 3;

/// Decimal places kept for current
const CURRENT_DECIMALS: i32 = 4;

/// Harmonic order of the distortion added to the voltage
const VOLTAGE_HARMONIC: f64 = 3.0;

/// Instantaneous samples of one generation window
#[derive(Debug, Clone)]
pub struct Waveform {
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
}

/// Synthetic AC signal source
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// Produce the next snapshot
    ///
    /// The voltage phase is taken from the wall clock so consecutive windows
    /// do not start at the same point of the cycle. `previous_frequency` is the
    /// frequency published by the previous cycle and is carried into the new
    /// snapshot unchanged.
    pub fn generate(&self, previous_frequency: f64) -> TelemetrySnapshot {
        let phase = chrono::Utc::now().timestamp_micros() as f64 / 1e6 % TAU;
        self.generate_at(previous_frequency, phase, unix_now())
    }

    /// Deterministic core of [`generate`](Self::generate)
    pub fn generate_at(&self, frequency: f64, phase: f64, timestamp: u64) -> TelemetrySnapshot {
        let waveform = self.synthesize(frequency, phase);

        let vrms = rms(&waveform.voltage);
        let irms = rms(&waveform.current);
        let active_power = mean_product(&waveform.voltage, &waveform.current);
        let apparent_power = vrms * irms;
        let reactive_power = (apparent_power * apparent_power - active_power * active_power)
            .max(0.0)
            .sqrt();

        TelemetrySnapshot {
            voltage: round_to(vrms, POWER_DECIMALS),
            current: round_to(irms, CURRENT_DECIMALS),
            active_power: round_to(active_power, POWER_DECIMALS),
            reactive_power: round_to(reactive_power, POWER_DECIMALS),
            power_factor: round_to(power_factor(active_power, apparent_power), POWER_DECIMALS),
            frequency,
            timestamp,
        }
    }

    /// Build `sample_rate * window_seconds` samples evenly spaced over `[0, window_seconds)`
    ///
    /// ```text
    /// v(t) = Vpk·sin(2πft + φ) + H·sin(2π·3f·t)
    /// i(t) = Ipk·sin(2πft − θ)
    /// ```
    pub fn synthesize(&self, frequency: f64, phase: f64) -> Waveform {
        let cfg = &self.config;
        let samples = cfg.samples_per_window();
        let omega = TAU * frequency;

        let mut voltage = Vec::with_capacity(samples);
        let mut current = Vec::with_capacity(samples);

        for k in 0..samples {
            let t = cfg.window_seconds * k as f64 / samples as f64;
            voltage.push(
                cfg.voltage_amplitude * (omega * t + phase).sin()
                    + cfg.harmonic_amplitude * (VOLTAGE_HARMONIC * omega * t).sin(),
            );
            current.push(cfg.current_amplitude * (omega * t - cfg.current_phase_shift).sin());
        }

        Waveform { voltage, current }
    }
}

/// Root-mean-square of a sample window, 0.0 for an empty window
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Mean of the element-wise product, i.e. average instantaneous power
pub fn mean_product(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>() / n as f64
}

/// Active over apparent power; 0.0 when there is no apparent power
pub fn power_factor(active_power: f64, apparent_power: f64) -> f64 {
    if apparent_power > 0.0 {
        (active_power / apparent_power).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_with(update: impl FnOnce(&mut SignalConfig)) -> SignalGenerator {
        let mut config = SignalConfig::default();
        update(&mut config);
        SignalGenerator::new(config)
    }

    #[test]
    fn test_rms_of_pure_sinusoid() {
        // 0.2 s at 50 Hz = 10 full cycles
        let generator = generator_with(|c| {
            c.window_seconds = 0.2;
            c.harmonic_amplitude = 0.0;
            c.voltage_amplitude = 325.0;
        });
        let waveform = generator.synthesize(50.0, 0.3);

        let expected = 325.0 / 2f64.sqrt();
        let error = (rms(&waveform.voltage) - expected).abs() / expected;
        assert!(error < 0.001, "relative RMS error {} exceeds 0.1%", error);
    }

    #[test]
    fn test_rms_empty_window() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(mean_product(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_sample_count() {
        let generator = generator_with(|c| {
            c.sample_rate = 1000;
            c.window_seconds = 0.5;
        });
        let waveform = generator.synthesize(50.0, 0.0);
        assert_eq!(waveform.voltage.len(), 500);
        assert_eq!(waveform.current.len(), 500);
        // First sample sits at t = 0
        assert_eq!(waveform.current[0], 1.23 * (-0.1f64).sin());
    }

    #[test]
    fn test_default_snapshot_values() {
        let generator = SignalGenerator::new(SignalConfig::default());
        // Zero voltage phase leaves only the current lag between the two waves
        let snapshot = generator.generate_at(50.0, 0.0, 1_700_000_000);

        assert!((snapshot.voltage - 230.0 / 2f64.sqrt()).abs() < 0.05);
        assert!((snapshot.current - 1.23 / 2f64.sqrt()).abs() < 0.001);
        assert!((snapshot.power_factor - 0.1f64.cos()).abs() < 0.002);
        assert!(snapshot.active_power > 0.0);
        assert!(snapshot.reactive_power > 0.0);
        assert_eq!(snapshot.frequency, 50.0);
        assert_eq!(snapshot.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_power_triangle() {
        let generator = SignalGenerator::new(SignalConfig::default());
        let s = generator.generate_at(50.0, 0.0, 0);

        let apparent = s.voltage * s.current;
        let triangle = (s.active_power.powi(2) + s.reactive_power.powi(2)).sqrt();
        assert!((apparent - triangle).abs() / apparent < 0.001);
    }

    #[test]
    fn test_zero_apparent_power_gives_zero_pf() {
        let generator = generator_with(|c| c.current_amplitude = 0.0);
        let snapshot = generator.generate_at(50.0, 0.0, 0);

        assert_eq!(snapshot.current, 0.0);
        assert_eq!(snapshot.active_power, 0.0);
        assert_eq!(snapshot.reactive_power, 0.0);
        assert_eq!(snapshot.power_factor, 0.0);
    }

    #[test]
    fn test_power_factor_bounds() {
        for step in 0..=40 {
            let shift = step as f64 * TAU / 40.0;
            let generator = generator_with(|c| c.current_phase_shift = shift);
            let snapshot = generator.generate_at(50.0, 0.0, 0);

            assert!(
                (-1.0..=1.0).contains(&snapshot.power_factor),
                "pf {} out of range for shift {}",
                snapshot.power_factor,
                shift
            );
            assert!(snapshot.reactive_power >= 0.0);
        }
    }

    #[test]
    fn test_lagging_beyond_quarter_cycle_goes_negative() {
        let generator = generator_with(|c| c.current_phase_shift = 3.0);
        let snapshot = generator.generate_at(50.0, 0.0, 0);
        assert!(snapshot.active_power < 0.0);
        assert!((snapshot.power_factor - 3.0f64.cos()).abs() < 0.002);
    }

    #[test]
    fn test_frequency_is_carried() {
        let generator = SignalGenerator::new(SignalConfig::default());
        assert_eq!(generator.generate(49.87).frequency, 49.87);
        assert_eq!(generator.generate_at(60.0, 0.0, 0).frequency, 60.0);
    }

    #[test]
    fn test_power_factor_helper() {
        assert_eq!(power_factor(10.0, 0.0), 0.0);
        assert_eq!(power_factor(5.0, 10.0), 0.5);
        assert_eq!(power_factor(-5.0, 10.0), -0.5);
        // Rounding noise never escapes the unit interval
        assert_eq!(power_factor(10.0000001, 10.0), 1.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(162.63456, 3), 162.635);
        assert_eq!(round_to(0.86971, 4), 0.8697);
        assert_eq!(round_to(-1.23456, 2), -1.23);
    }
}
