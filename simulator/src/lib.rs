pub mod errors;
pub mod runner;
pub mod sensor;
pub mod shutdown;
pub mod telemetry;
pub mod transmit;
