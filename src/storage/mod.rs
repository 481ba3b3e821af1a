//! ListSource implementations

#[cfg(feature = "http-client")]
pub mod http;
pub mod in_memory;

#[cfg(feature = "http-client")]
pub use http::{HttpSource, HttpSourceError};
pub use in_memory::InMemorySource;
