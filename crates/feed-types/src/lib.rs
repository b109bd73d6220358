//! Shared types for the routed price feed.
//!
//! Everything that crosses a crate boundary lives here: pair captions and the
//! identifiers derived from them, raw registry prices, persisted route
//! descriptors and the schema helpers used to validate backend configuration.

pub mod descriptor;
pub mod pair;
pub mod price;
pub mod validation;

pub use descriptor::*;
pub use pair::*;
pub use price::*;
pub use validation::*;
