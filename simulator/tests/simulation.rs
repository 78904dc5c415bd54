use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensor_simulator::runner::{run, RunSummary};
use sensor_simulator::sensor::{PresenceSensor, RainGauge, RainSchedule, Sensor, RAINFALL_MAX};
use sensor_simulator::telemetry::{Reading, TelemetryPayload};
use sensor_simulator::transmit::{Endpoint, Transmitter};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use telemetry_ingestor::model::TelemetryQuery;
use telemetry_ingestor::rest::create_router;
use telemetry_ingestor::store::{DeviceKey, TelemetryStore};
use tokio::net::TcpListener;

const TICK: Duration = Duration::from_millis(1);

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_ingestor() -> (SocketAddr, Arc<TelemetryStore>) {
    let store = Arc::new(TelemetryStore::default());
    let addr = serve(create_router(store.clone())).await;
    (addr, store)
}

fn transmitter(addr: SocketAddr, device_id: u32) -> Transmitter {
    let endpoint = Endpoint::new(&format!("http://{}", addr), 1, device_id).unwrap();
    Transmitter::new(&endpoint, Some(Duration::from_secs(5))).unwrap()
}

fn lines(output: Vec<u8>) -> Vec<String> {
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_presence_readings_delivered() {
    let (addr, store) = spawn_ingestor().await;
    let sensor = PresenceSensor::new(1, TICK);
    let mut rng = StdRng::seed_from_u64(1);
    let mut output = Vec::new();

    let summary = run(&sensor, &transmitter(addr, 1), &mut rng, &mut output, Some(3)).await;

    assert_eq!(
        summary,
        RunSummary {
            iterations: 3,
            delivered: 3,
            failed: 0
        }
    );
    let lines = lines(output);
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert!(
            line == r#"[OK] {"value":true} -> 201"# || line == r#"[OK] {"value":false} -> 201"#,
            "unexpected line {}",
            line
        );
    }

    let slots = store
        .query(DeviceKey::new(1, 1), &TelemetryQuery::default())
        .unwrap();
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|slot| slot.value == 0.0 || slot.value == 1.0));
}

#[tokio::test]
async fn test_rain_readings_delivered() {
    let (addr, store) = spawn_ingestor().await;
    let schedule = RainSchedule {
        threshold: 2.5,
        calm: TICK,
        heavy: TICK,
    };
    let gauge = RainGauge::new(6, schedule);
    let mut rng = StdRng::seed_from_u64(6);
    let mut output = Vec::new();

    let summary = run(&gauge, &transmitter(addr, 6), &mut rng, &mut output, Some(5)).await;

    assert_eq!(summary.delivered, 5);
    let lines = lines(output);
    assert_eq!(lines.len(), 5);
    assert!(lines
        .iter()
        .all(|line| line.starts_with(r#"[OK] {"value":"#) && line.ends_with("} -> 201")));

    let slots = store
        .query(DeviceKey::new(1, 6), &TelemetryQuery::default())
        .unwrap();
    assert_eq!(slots.len(), 5);
    assert!(slots
        .iter()
        .all(|slot| (0.0..=RAINFALL_MAX).contains(&slot.value)));
}

type Arrivals = Arc<Mutex<Vec<(Instant, Reading)>>>;

async fn record_arrival(
    State(arrivals): State<Arrivals>,
    Json(payload): Json<TelemetryPayload>,
) -> StatusCode {
    arrivals.lock().unwrap().push((Instant::now(), payload.value));
    StatusCode::CREATED
}

#[tokio::test]
async fn test_rain_delay_follows_intensity_tier() {
    let arrivals: Arrivals = Arc::default();
    let app = Router::new()
        .route(
            "/complexes/:complex_id/devices/:device_id/telemetry",
            post(record_arrival),
        )
        .with_state(arrivals.clone());
    let addr = serve(app).await;

    let calm = Duration::from_millis(400);
    let heavy = Duration::from_millis(20);
    let gauge = RainGauge::new(
        6,
        RainSchedule {
            threshold: 15.0,
            calm,
            heavy,
        },
    );

    // Replay the seed to know which tiers the run will hit
    let mut replay = StdRng::seed_from_u64(9);
    let expected: Vec<Reading> = (0..4).map(|_| gauge.sample(&mut replay)).collect();
    let delays: Vec<Duration> = expected[..3].iter().map(|r| gauge.delay_after(r)).collect();
    assert!(delays.contains(&calm) && delays.contains(&heavy));

    let mut rng = StdRng::seed_from_u64(9);
    let mut output = Vec::new();
    let summary = run(&gauge, &transmitter(addr, 6), &mut rng, &mut output, Some(4)).await;
    assert_eq!(summary.delivered, 4);

    let arrivals = arrivals.lock().unwrap().clone();
    let readings: Vec<Reading> = arrivals.iter().map(|(_, reading)| *reading).collect();
    assert_eq!(readings, expected);

    for (i, delay) in delays.iter().enumerate() {
        let gap = arrivals[i + 1].0 - arrivals[i].0;
        assert!(
            gap >= *delay && gap < *delay + Duration::from_millis(200),
            "gap {:?} after {:?}, expected about {:?}",
            gap,
            readings[i],
            delay
        );
    }
}

#[tokio::test]
async fn test_connection_refused_keeps_looping() {
    // Grab a free port, then close it so nothing is listening
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let sensor = PresenceSensor::new(1, TICK);
    let mut rng = StdRng::seed_from_u64(2);
    let mut output = Vec::new();

    let summary = run(&sensor, &transmitter(addr, 1), &mut rng, &mut output, Some(3)).await;

    assert_eq!(
        summary,
        RunSummary {
            iterations: 3,
            delivered: 0,
            failed: 3
        }
    );
    let lines = lines(output);
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|line| line.starts_with("[ERROR] ")));
}

#[tokio::test]
async fn test_server_error_still_reported_ok() {
    let app = Router::new().route(
        "/complexes/:complex_id/devices/:device_id/telemetry",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let addr = serve(app).await;
    let sensor = PresenceSensor::new(1, TICK);
    let mut rng = StdRng::seed_from_u64(3);
    let mut output = Vec::new();

    let summary = run(&sensor, &transmitter(addr, 1), &mut rng, &mut output, Some(1)).await;

    assert_eq!(summary.delivered, 1);
    let lines = lines(output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[OK] "));
    assert!(lines[0].ends_with(" -> 500"));
}

#[tokio::test]
async fn test_zero_limit_sends_nothing() {
    let (addr, store) = spawn_ingestor().await;
    let sensor = PresenceSensor::new(1, TICK);
    let mut rng = StdRng::seed_from_u64(4);
    let mut output = Vec::new();

    let summary = run(&sensor, &transmitter(addr, 1), &mut rng, &mut output, Some(0)).await;

    assert_eq!(summary, RunSummary::default());
    assert!(output.is_empty());
    assert_eq!(store.device_count().unwrap(), 0);
}
