//! Record model and serialization contract.
//!
//! A [`Record`] pairs an archive-relative path with an [`Archivable`] item.
//! Items hold values that are already anonymized; marshalling never masks
//! anything, it only encodes.

use crate::{Result, context::GatherContext, error::GatherError};
use serde::Serialize;

/// Capability every record payload provides.
///
/// `marshal` output must parse in the format named by `extension`.
pub trait Archivable: Send + Sync {
    /// Encodes the payload into its archived byte representation.
    ///
    /// # Errors
    /// Returns a serialization error, or `Cancelled` when `ctx` is cancelled.
    fn marshal(&self, ctx: &GatherContext) -> Result<Vec<u8>>;

    /// File suffix of the encoded payload, without the leading dot.
    fn extension(&self) -> &'static str;
}

/// Encodes any serializable value as indented JSON.
#[derive(Debug, Clone)]
pub struct JsonMarshaller<T> {
    /// Value to encode
    pub object: T,
}

impl<T> JsonMarshaller<T> {
    /// Wraps `object`.
    pub fn new(object: T) -> Self {
        Self { object }
    }
}

impl<T: Serialize + Send + Sync> Archivable for JsonMarshaller<T> {
    fn marshal(&self, ctx: &GatherContext) -> Result<Vec<u8>> {
        ctx.check("marshal")?;
        serde_json::to_vec_pretty(&self.object)
            .map_err(|e| GatherError::serialization_failed("JSON payload", e))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// One unit of gatherer output.
pub struct Record {
    /// Slash-delimited archive path, without extension
    pub name: String,
    /// Already anonymized payload
    pub item: Box<dyn Archivable>,
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("extension", &self.item.extension())
            .finish()
    }
}

impl Record {
    /// Creates a record from any archivable payload.
    pub fn new(name: impl Into<String>, item: impl Archivable + 'static) -> Self {
        Self {
            name: name.into(),
            item: Box::new(item),
        }
    }

    /// Creates a record whose payload is encoded as JSON.
    pub fn json<T>(name: impl Into<String>, object: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::new(name, JsonMarshaller::new(object))
    }

    /// Path of the record inside the archive, extension included.
    pub fn entry_path(&self) -> String {
        format!("{}.{}", self.name, self.item.extension())
    }

    /// Marshals the record into an archive entry.
    ///
    /// # Errors
    /// Propagates the payload's marshal error.
    pub fn to_entry(&self, ctx: &GatherContext) -> Result<ArchiveEntry> {
        Ok(ArchiveEntry {
            path: self.entry_path(),
            bytes: self.item.marshal(ctx)?,
        })
    }
}

/// A marshalled record, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, extension included
    pub path: String,
    /// Marshalled payload
    pub bytes: Vec<u8>,
}

/// Output of one gatherer invocation.
///
/// Records and errors may both be non-empty when a gatherer partially
/// succeeds. An empty result with no errors means there was nothing to
/// collect.
#[derive(Debug, Default)]
pub struct GatherResult {
    /// Records in output order
    pub records: Vec<Record>,
    /// Errors the gatherer hit
    pub errors: Vec<GatherError>,
}

impl GatherResult {
    /// Nothing collected, nothing failed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Successful result carrying `records`.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            errors: Vec::new(),
        }
    }

    /// Failed result carrying a single error and no records.
    pub fn from_error(error: GatherError) -> Self {
        Self {
            records: Vec::new(),
            errors: vec![error],
        }
    }

    /// True when no records were produced and no errors occurred.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.errors.is_empty()
    }

    /// Record names in output order.
    pub fn record_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }
}
