//! # Abatedouro Core Types
//!
//! The data contract shared by every other crate: what a processing day looks like
//! on the way in, the thresholds it is judged against, the product catalog, and the
//! checks a record must pass before metrics are derived from it.

pub mod catalog;
pub mod enums;
pub mod error;
pub mod limits;
pub mod record;
pub mod validation;

// Re-export the core types to provide a clean public API.
pub use catalog::{PriceChangeKind, ProductDraft, ProductPatch, round_price};
pub use enums::{ProductCategory, classify_product};
pub use error::CoreError;
pub use limits::ProcessingLimits;
pub use record::{FixedExpenses, ProductOutput, SlaughterRecord, WorkSchedule};
pub use validation::MAX_MAGNITUDE;
