use crate::sensor::Sensor;
use crate::telemetry::TelemetryPayload;
use crate::transmit::{Outcome, Transmitter};
use rand::Rng;
use std::io::Write;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Drives one sensor: sample, send, report, sleep. Runs forever when
/// `limit` is `None`; send failures are reported and never stop the loop.
pub async fn run<S, R, W>(
    sensor: &S,
    transmitter: &Transmitter,
    rng: &mut R,
    out: &mut W,
    limit: Option<u64>,
) -> RunSummary
where
    S: Sensor,
    R: Rng,
    W: Write,
{
    let mut summary = RunSummary::default();

    while limit.map_or(true, |max| summary.iterations < max) {
        let reading = sensor.sample(rng);
        let outcome = transmitter.transmit(TelemetryPayload::new(reading)).await;

        summary.iterations += 1;
        if outcome.is_delivered() {
            summary.delivered += 1;
        } else {
            summary.failed += 1;
        }
        report(out, &outcome);

        if limit.map_or(false, |max| summary.iterations >= max) {
            break;
        }

        let delay = sensor.delay_after(&reading);
        debug!("{} sensor sleeping {:?}", sensor.name(), delay);
        sleep(delay).await;
    }

    summary
}

fn report<W: Write>(out: &mut W, outcome: &Outcome) {
    if let Err(e) = writeln!(out, "{}", outcome).and_then(|_| out.flush()) {
        warn!("Failed to write status line: {}", e);
    }
}
