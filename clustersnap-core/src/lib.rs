//! Core gathering pipeline for clustersnap.
//!
//! This crate collects configuration objects from a Kubernetes-style control
//! plane, masks their sensitive fields, and turns them into named records
//! ready to be written into an archive.
//!
//! # Pipeline
//! - [`Gatherer`] carries the API configuration and the cancellable context
//! - each [`GatherUnit`] fetches one kind through a [`ResourceAccessor`]
//! - absence of an object is not an error; every other failure is reported
//!   per unit and never stops the other units
//! - [`GatherRunner`] runs the units concurrently and produces a
//!   [`GatherReport`], which marshals into an [`ArchiveBundle`]
//!
//! # Security Guarantees
//! - Sensitive fields are masked before a value is wrapped into a record
//! - Credentials embedded in URLs are redacted before they are logged
//! - All API operations are read-only

pub mod accessor;
pub mod anonymize;
pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod gatherers;
pub mod logging;
pub mod models;
pub mod record;
pub mod runner;

// Re-export commonly used types
pub use accessor::{FakeAccessor, GroupVersionResource, KubeAccessor, ResourceAccessor};
pub use archive::write_archive_dir;
pub use config::RunnerConfig;
pub use context::GatherContext;
pub use error::{GatherError, Result};
pub use gatherers::{GatherUnit, Gatherer, default_units};
pub use logging::init_logging;
pub use record::{Archivable, ArchiveEntry, GatherResult, JsonMarshaller, Record};
pub use runner::{
    ArchiveBundle, GatherMetadata, GatherReport, GatherRunner, UnitFailure, UnitReport,
};
