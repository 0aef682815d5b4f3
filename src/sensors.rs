//! Simulated IoT sensor readings and device commands.
//!
//! Readings are uniform random draws, not measurements; there is no device
//! protocol behind [`control_device`].

use std::ops::Range;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Degrees Celsius.
pub const TEMPERATURE_RANGE: Range<f64> = 20.0..50.0;
/// Relative humidity, percent.
pub const HUMIDITY_RANGE: Range<f64> = 30.0..80.0;
/// Hectopascal.
pub const PRESSURE_RANGE: Range<f64> = 900.0..1900.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub taken_at: DateTime<Utc>,
}

/// Draws one reading from the thread-local RNG.
pub fn collect_reading() -> SensorReading {
    collect_reading_with(&mut rand::rng())
}

pub fn collect_reading_with<R: Rng>(rng: &mut R) -> SensorReading {
    let reading = SensorReading {
        temperature: rng.random_range(TEMPERATURE_RANGE),
        humidity: rng.random_range(HUMIDITY_RANGE),
        pressure: rng.random_range(PRESSURE_RANGE),
        taken_at: Utc::now(),
    };
    debug!(?reading, "collected simulated reading");
    reading
}

/// Formats the acknowledgement for `command` sent to `device`.
pub fn control_device(device: &str, command: &str) -> Result<String> {
    if device.trim().is_empty() {
        bail!("device name must not be empty");
    }
    if command.trim().is_empty() {
        bail!("command must not be empty");
    }
    Ok(format!("Sent command '{command}' to device '{device}'."))
}
