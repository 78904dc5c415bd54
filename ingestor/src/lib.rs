pub mod errors;
pub mod metrics;
pub mod model;
pub mod rest;
pub mod shutdown;
pub mod store;
pub mod validate;
