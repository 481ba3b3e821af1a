//! Create-form validation
//!
//! Forms are normalized by [`filters`] and checked by [`validators`] as
//! declared in a [`FormSchema`]. Failing forms never reach a backend.

pub mod extractor;
pub mod filters;
pub mod schema;
pub mod validators;

pub use extractor::Validated;
pub use schema::{FormSchema, Validatable};
