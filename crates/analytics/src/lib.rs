//! # Abatedouro Analytics Engine
//!
//! Derives the financial and operational indicators of a processing day: revenue,
//! costs, profit, yield, losses, throughput, a composite score and its band.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of storage, HTTP or configuration
//!   files. It depends only on `core-types`.
//! - **Stateless Calculation:** The `MetricsEngine` takes a `SlaughterRecord` and
//!   returns `DerivedMetrics`. It never fails; degenerate denominators yield zero.
//! - **Explicit Formula Choices:** Conventions that changed over time are captured by
//!   `FormulaVariant`, so older figures can be reproduced.
//!
//! ## Public API
//!
//! - `MetricsEngine`: the calculation itself.
//! - `DerivedMetrics`: the ~50-field output record.
//! - `FormulaVariant`: live-cost, hours and fixed-cost conventions.
//! - `PerformanceClass`: the qualitative band of a score.
//! - `evaluate_limits` / `consistency_warnings`: post-computation checks.

pub mod alerts;
pub mod classification;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod formula;
pub mod report;

pub use alerts::{AlertKind, AlertSeverity, LimitAlert, evaluate_limits};
pub use classification::PerformanceClass;
pub use consistency::{ConsistencyWarning, consistency_warnings};
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use formula::{BaselinePolicy, FixedCostScope, FormulaVariant, HoursBasis, LiveCostBasis};
pub use report::DerivedMetrics;
