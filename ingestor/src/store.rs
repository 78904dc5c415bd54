use crate::errors::{Error, Result};
use crate::model::{TelemetryQuery, TelemetrySlot};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

pub const DEFAULT_HISTORY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub complex_id: u32,
    pub device_id: u32,
}

impl DeviceKey {
    pub fn new(complex_id: u32, device_id: u32) -> Self {
        Self {
            complex_id,
            device_id,
        }
    }
}

/// In-memory telemetry history, bounded per device. Oldest slots are
/// evicted first.
#[derive(Debug)]
pub struct TelemetryStore {
    history: usize,
    devices: Mutex<HashMap<DeviceKey, VecDeque<TelemetrySlot>>>,
}

impl TelemetryStore {
    pub fn new(history: usize) -> Self {
        Self {
            history: history.max(1),
            devices: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, key: DeviceKey, value: f64) -> Result<TelemetrySlot> {
        let slot = TelemetrySlot {
            value,
            created_at: Utc::now(),
        };

        let mut devices = self.devices.lock().map_err(|_| Error::StatePoisoned)?;
        let slots = devices.entry(key).or_default();
        slots.push_back(slot.clone());
        while slots.len() > self.history {
            slots.pop_front();
            debug!(?key, "Evicted oldest telemetry slot");
        }

        Ok(slot)
    }

    /// Matching slots in the requested order, newest first by default.
    /// `last` keeps only the first slot after ordering.
    pub fn query(&self, key: DeviceKey, query: &TelemetryQuery) -> Result<Vec<TelemetrySlot>> {
        let devices = self.devices.lock().map_err(|_| Error::StatePoisoned)?;
        let Some(slots) = devices.get(&key) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<(usize, &TelemetrySlot)> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| query.matches(slot))
            .collect();

        match query.order_params.as_deref() {
            Some(params) if !params.is_empty() => matching.sort_by(|a, b| {
                params
                    .iter()
                    .map(|param| param.compare(*a, *b))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
            _ => matching.reverse(),
        }

        if query.last.unwrap_or(false) {
            matching.truncate(1);
        }

        Ok(matching.into_iter().map(|(_, slot)| slot.clone()).collect())
    }

    pub fn device_count(&self) -> Result<usize> {
        Ok(self.devices.lock().map_err(|_| Error::StatePoisoned)?.len())
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}
