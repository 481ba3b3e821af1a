//! Server module for exposing list sources over REST
//!
//! `ServerBuilder` mounts one set of routes per registered resource under
//! `/api/{resource}` plus a `/health` check.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::ResourceState;
