//! Inspection decision engine service library.
//!
//! The interesting machinery lives under [`workflows::inspections`]; the rest
//! of the crate is the ambient service shell (configuration, telemetry, and
//! boundary error mapping).

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
