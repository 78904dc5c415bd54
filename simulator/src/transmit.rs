use crate::errors::{Error, Result};
use crate::telemetry::TelemetryPayload;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_COMPLEX_ID: u32 = 1;

const USER_AGENT: &str = concat!("sensor-simulator/", env!("CARGO_PKG_VERSION"));

/// Telemetry endpoint of one device inside one complex.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    complex_id: u32,
    device_id: u32,
}

impl Endpoint {
    pub fn new(base_url: &str, complex_id: u32, device_id: u32) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }

        if base.query().is_some() || base.fragment().is_some() {
            return Err(Error::InvalidUrl {
                url: base_url.to_string(),
                reason: "base URL must not carry a query or fragment".to_string(),
            });
        }

        Ok(Self {
            base,
            complex_id,
            device_id,
        })
    }

    pub fn url(&self) -> String {
        let complex_id = self.complex_id.to_string();
        let device_id = self.device_id.to_string();
        let mut url = self.base.clone();
        // http(s) URLs always have a path to extend
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "complexes",
                complex_id.as_str(),
                "devices",
                device_id.as_str(),
                "telemetry",
            ]);
        }
        url.to_string()
    }
}

/// Result of one delivery attempt, rendered as the status line printed
/// for every iteration.
#[derive(Debug)]
pub enum Outcome {
    /// The server answered. Any status counts, including non-2xx.
    Delivered {
        payload: TelemetryPayload,
        status: StatusCode,
    },
    Failed {
        error: Error,
    },
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Delivered { payload, status } => {
                write!(f, "[OK] {} -> {}", payload, status.as_u16())
            }
            Outcome::Failed { error } => write!(f, "[ERROR] {}", error),
        }
    }
}

/// Posts telemetry payloads to a single endpoint. One client is kept for
/// the lifetime of the simulator so connections are reused.
#[derive(Debug, Clone)]
pub struct Transmitter {
    client: Client,
    url: String,
}

impl Transmitter {
    pub fn new(endpoint: &Endpoint, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: endpoint.url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one payload. Only transport failures are errors; the status
    /// code is returned as-is.
    pub async fn send(&self, payload: &TelemetryPayload) -> Result<StatusCode> {
        debug!("POST {} {}", self.url, payload);
        let response = self.client.post(&self.url).json(payload).send().await?;
        Ok(response.status())
    }

    pub async fn transmit(&self, payload: TelemetryPayload) -> Outcome {
        match self.send(&payload).await {
            Ok(status) => Outcome::Delivered { payload, status },
            Err(error) => Outcome::Failed { error },
        }
    }
}
