//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnergyNodeError, Result};
use crate::ota::storage::is_plain_name;

/// Environment variable that overrides `ota.key_hex`
pub const OTA_KEY_ENV: &str = "ENERGY_NODE_OTA_KEY";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub registers: RegisterConfig,
    #[serde(default)]
    pub ota: OtaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Synthetic waveform configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SignalConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_window_seconds")]
    pub window_seconds: f64,

    #[serde(default = "default_nominal_frequency")]
    pub nominal_frequency: f64,

    #[serde(default = "default_voltage_amplitude")]
    pub voltage_amplitude: f64,

    #[serde(default = "default_current_amplitude")]
    pub current_amplitude: f64,

    /// Current lag behind voltage, radians
    #[serde(default = "default_current_phase_shift")]
    pub current_phase_shift: f64,

    /// Third-harmonic amplitude added to the voltage
    #[serde(default = "default_harmonic_amplitude")]
    pub harmonic_amplitude: f64,
}

/// Holding-register refresh configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RegisterConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

/// OTA storage and key configuration
#[derive(Deserialize, Clone)]
pub struct OtaConfig {
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,

    #[serde(default = "default_applied_name")]
    pub applied_name: String,

    #[serde(default = "default_key_hex")]
    pub key_hex: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Daily rolling log files are written here when set
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

// Default value functions
fn default_sample_rate() -> u32 { 2000 }
fn default_window_seconds() -> f64 { 1.0 }
fn default_nominal_frequency() -> f64 { 50.0 }
fn default_voltage_amplitude() -> f64 { 230.0 }
fn default_current_amplitude() -> f64 { 1.23 }
fn default_current_phase_shift() -> f64 { 0.1 }
fn default_harmonic_amplitude() -> f64 { 0.01 }

fn default_refresh_interval_ms() -> u64 { 1000 }

fn default_storage_dir() -> PathBuf { PathBuf::from("ota_files") }
fn default_artifact_name() -> String { "firmware.enc".to_string() }
fn default_applied_name() -> String { "firmware_applied.bin".to_string() }
fn default_key_hex() -> String {
    "546869735f69735f615f33325f627974655f6b65795f666f725f4145535f3235".to_string()
}

fn default_log_level() -> String { "info".to_string() }

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            window_seconds: default_window_seconds(),
            nominal_frequency: default_nominal_frequency(),
            voltage_amplitude: default_voltage_amplitude(),
            current_amplitude: default_current_amplitude(),
            current_phase_shift: default_current_phase_shift(),
            harmonic_amplitude: default_harmonic_amplitude(),
        }
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self { refresh_interval_ms: default_refresh_interval_ms() }
    }
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            artifact_name: default_artifact_name(),
            applied_name: default_applied_name(),
            key_hex: default_key_hex(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), log_dir: None }
    }
}

impl std::fmt::Debug for OtaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtaConfig")
            .field("storage_dir", &self.storage_dir)
            .field("artifact_name", &self.artifact_name)
            .field("applied_name", &self.applied_name)
            .field("key_hex", &"<redacted>")
            .finish()
    }
}

impl SignalConfig {
    /// Number of samples in one generation window
    pub fn samples_per_window(&self) -> usize {
        (self.sample_rate as f64 * self.window_seconds).round() as usize
    }
}

impl OtaConfig {
    /// Decode the firmware key, preferring the `ENERGY_NODE_OTA_KEY` environment variable
    ///
    /// Only the encoding is checked here; length is enforced by
    /// [`FirmwareCipher::new`](crate::ota::cipher::FirmwareCipher::new).
    pub fn key_bytes(&self) -> Result<Vec<u8>> {
        self.resolve_key(std::env::var(OTA_KEY_ENV).ok())
    }

    fn resolve_key(&self, override_hex: Option<String>) -> Result<Vec<u8>> {
        let encoded = match override_hex {
            Some(value) if !value.trim().is_empty() => value,
            _ => self.key_hex.clone(),
        };
        Ok(hex::decode(encoded.trim())?)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use energy_node::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let signal = &self.signal;

        if signal.sample_rate == 0 || signal.sample_rate > 1_000_000 {
            return Err(invalid("sample_rate must be between 1 and 1000000"));
        }

        if !(signal.window_seconds > 0.0 && signal.window_seconds <= 60.0) {
            return Err(invalid("window_seconds must be greater than 0 and at most 60"));
        }

        if signal.samples_per_window() == 0 {
            return Err(invalid("sample_rate * window_seconds must yield at least one sample"));
        }

        let nyquist = signal.sample_rate as f64 / 2.0;
        if !(signal.nominal_frequency > 0.0 && signal.nominal_frequency < nyquist) {
            return Err(invalid(format!(
                "nominal_frequency must be between 0 and {} (half the sample rate)",
                nyquist
            )));
        }

        for (name, value) in [
            ("voltage_amplitude", signal.voltage_amplitude),
            ("current_amplitude", signal.current_amplitude),
            ("harmonic_amplitude", signal.harmonic_amplitude),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(format!("{} must be a finite value >= 0", name)));
            }
        }

        if !signal.current_phase_shift.is_finite() {
            return Err(invalid("current_phase_shift must be finite"));
        }

        if self.registers.refresh_interval_ms == 0 || self.registers.refresh_interval_ms > 60000 {
            return Err(invalid("refresh_interval_ms must be between 1 and 60000"));
        }

        if self.ota.storage_dir.as_os_str().is_empty() {
            return Err(invalid("ota storage_dir cannot be empty"));
        }

        if self.ota.artifact_name.is_empty() || self.ota.applied_name.is_empty() {
            return Err(invalid("ota blob names cannot be empty"));
        }

        for name in [&self.ota.artifact_name, &self.ota.applied_name] {
            if !is_plain_name(name) {
                return Err(invalid(format!(
                    "ota blob name {:?} must be a plain file name without path separators or '..'",
                    name
                )));
            }
        }

        if self.ota.artifact_name == self.ota.applied_name {
            return Err(invalid("artifact_name and applied_name must differ"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(message: impl std::fmt::Display) -> EnergyNodeError {
    EnergyNodeError::Config(toml::de::Error::custom(message))
}
