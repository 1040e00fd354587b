//! Workflow engines exposed by the service.

pub mod inspections;
