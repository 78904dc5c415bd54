use crate::telemetry::Reading;
use rand::Rng;
use std::time::Duration;

pub const PRESENCE_DEVICE_ID: u32 = 1;
pub const RAIN_DEVICE_ID: u32 = 6;

pub const PRESENCE_INTERVAL: Duration = Duration::from_secs(15);

pub const RAINFALL_MIN: f64 = 0.0;
pub const RAINFALL_MAX: f64 = 30.0;

/// A simulated device: how it produces a reading and how long to wait
/// before producing the next one.
pub trait Sensor {
    fn name(&self) -> &'static str;

    fn device_id(&self) -> u32;

    fn sample(&self, rng: &mut impl Rng) -> Reading;

    fn delay_after(&self, reading: &Reading) -> Duration;
}

/// Occupancy sensor reporting a free/occupied flag at a fixed interval.
#[derive(Debug, Clone)]
pub struct PresenceSensor {
    device_id: u32,
    interval: Duration,
}

impl PresenceSensor {
    pub fn new(device_id: u32, interval: Duration) -> Self {
        Self { device_id, interval }
    }
}

impl Default for PresenceSensor {
    fn default() -> Self {
        Self::new(PRESENCE_DEVICE_ID, PRESENCE_INTERVAL)
    }
}

impl Sensor for PresenceSensor {
    fn name(&self) -> &'static str {
        "presence"
    }

    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn sample(&self, rng: &mut impl Rng) -> Reading {
        Reading::Presence(rng.gen_bool(0.5))
    }

    fn delay_after(&self, _reading: &Reading) -> Duration {
        self.interval
    }
}

/// Two-tier sampling policy: light rain is reported slowly, heavy rain
/// quickly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainSchedule {
    /// Intensity (mm/h) at or above which `heavy` applies.
    pub threshold: f64,
    pub calm: Duration,
    pub heavy: Duration,
}

impl RainSchedule {
    pub fn interval_for(&self, intensity: f64) -> Duration {
        if intensity < self.threshold {
            self.calm
        } else {
            self.heavy
        }
    }
}

impl Default for RainSchedule {
    fn default() -> Self {
        Self {
            threshold: 2.5,
            calm: Duration::from_secs(15),
            heavy: Duration::from_secs(5),
        }
    }
}

/// Rain gauge reporting intensity in mm/h.
#[derive(Debug, Clone)]
pub struct RainGauge {
    device_id: u32,
    schedule: RainSchedule,
}

impl RainGauge {
    pub fn new(device_id: u32, schedule: RainSchedule) -> Self {
        Self { device_id, schedule }
    }
}

impl Default for RainGauge {
    fn default() -> Self {
        Self::new(RAIN_DEVICE_ID, RainSchedule::default())
    }
}

impl Sensor for RainGauge {
    fn name(&self) -> &'static str {
        "rain"
    }

    fn device_id(&self) -> u32 {
        self.device_id
    }

    fn sample(&self, rng: &mut impl Rng) -> Reading {
        let intensity = rng.gen_range(RAINFALL_MIN..=RAINFALL_MAX);
        Reading::Rainfall(round_to_hundredths(intensity))
    }

    fn delay_after(&self, reading: &Reading) -> Duration {
        match reading {
            Reading::Rainfall(intensity) => self.schedule.interval_for(*intensity),
            Reading::Presence(_) => self.schedule.calm,
        }
    }
}

/// Rounds half away from zero to two decimal places.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
