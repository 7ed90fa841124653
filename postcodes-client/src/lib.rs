//! Client for the postcodes.io API.
//!
//! Resolves UK postcodes and coordinates to administrative and geographic
//! metadata, checks postcode syntax locally, and measures great-circle
//! distance between postcodes.
//!
//! The crate is layered:
//! - [`response`]: kind-checked access to decoded JSON payloads
//! - [`pipeline`]: request building, the envelope contract, one request per call
//! - [`client`]: one method per API capability
//! - [`transport`]: the HTTP seam, with a reqwest implementation and a mock

pub mod client;
pub mod config;
pub mod error;
pub mod geo;
pub mod pipeline;
pub mod postcode;
pub mod response;
pub mod transport;

pub use client::{BULK_LIMIT, DEFAULT_AUTOCOMPLETE_LIMIT, PostcodesClient, Record};
pub use config::ClientConfig;
pub use error::PostcodesError;
pub use geo::Coordinate;
pub use pipeline::{Method, Params, RequestPipeline};
pub use postcode::Postcode;
pub use response::{Key, Response, ResponseError};
