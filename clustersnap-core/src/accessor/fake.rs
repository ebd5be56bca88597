//! In-memory accessor for exercising gatherers without an API server.
//!
//! Objects are stored per (kind, namespace, name) and always come back in
//! sorted order, so list results are deterministic. Failures can be injected
//! per kind or per named object.

use super::{GroupVersionResource, ResourceAccessor};
use crate::{Result, context::GatherContext, error::GatherError};
use async_trait::async_trait;
use kube::core::DynamicObject;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Failure modes the fake can be told to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeFailure {
    /// Respond as if the object or kind does not exist
    NotFound,
    /// Respond as if the caller lacks permission
    Forbidden,
    /// Respond with a transport-level failure
    Transport(String),
}

impl FakeFailure {
    fn into_error(self, description: &str) -> GatherError {
        match self {
            Self::NotFound => GatherError::not_found(description),
            Self::Forbidden => GatherError::Forbidden {
                resource: description.to_string(),
                reason: "injected by FakeAccessor".to_string(),
            },
            Self::Transport(message) => GatherError::request_failed(
                format!("request for {description}"),
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, message),
            ),
        }
    }
}

type ObjectKey = (GroupVersionResource, String, String);

/// [`ResourceAccessor`] serving objects from memory.
#[derive(Debug, Default)]
pub struct FakeAccessor {
    objects: BTreeMap<ObjectKey, DynamicObject>,
    kind_failures: BTreeMap<GroupVersionResource, FakeFailure>,
    object_failures: BTreeMap<(GroupVersionResource, String), FakeFailure>,
    calls: AtomicUsize,
}

impl FakeAccessor {
    /// Creates an empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object under `gvr`, keyed by its metadata namespace and name.
    pub fn insert(&mut self, gvr: &GroupVersionResource, object: DynamicObject) {
        let namespace = object.metadata.namespace.clone().unwrap_or_default();
        let name = object.metadata.name.clone().unwrap_or_default();
        self.objects.insert((gvr.clone(), namespace, name), object);
    }

    /// Parses a JSON document and stores it under `gvr`.
    ///
    /// # Errors
    /// Returns a decode error when the document is not a valid object.
    pub fn insert_json(
        &mut self,
        gvr: &GroupVersionResource,
        document: serde_json::Value,
    ) -> Result<()> {
        let object: DynamicObject = serde_json::from_value(document)
            .map_err(|e| GatherError::decode_failed(format!("fixture for {gvr}"), e))?;
        self.insert(gvr, object);
        Ok(())
    }

    /// Builder form of [`FakeAccessor::insert_json`].
    ///
    /// # Panics
    /// Panics when the document is not a valid object; meant for test setup.
    #[must_use]
    #[allow(clippy::panic)]
    pub fn with_json(mut self, gvr: &GroupVersionResource, document: serde_json::Value) -> Self {
        if let Err(e) = self.insert_json(gvr, document) {
            panic!("invalid fixture: {e}");
        }
        self
    }

    /// Makes every call for `gvr` fail.
    #[must_use]
    pub fn with_kind_failure(mut self, gvr: &GroupVersionResource, failure: FakeFailure) -> Self {
        self.kind_failures.insert(gvr.clone(), failure);
        self
    }

    /// Makes `get` of one named object fail.
    #[must_use]
    pub fn with_object_failure(
        mut self,
        gvr: &GroupVersionResource,
        name: &str,
        failure: FakeFailure,
    ) -> Self {
        self.object_failures
            .insert((gvr.clone(), name.to_string()), failure);
        self
    }

    /// Number of `get`/`list` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn kind_failure(&self, gvr: &GroupVersionResource, description: &str) -> Result<()> {
        match self.kind_failures.get(gvr) {
            Some(failure) => Err(failure.clone().into_error(description)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceAccessor for FakeAccessor {
    async fn get(
        &self,
        ctx: &GatherContext,
        gvr: &GroupVersionResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let description = gvr.describe(namespace, Some(name));
        ctx.run(&description, async {
            self.kind_failure(gvr, &description)?;
            if let Some(failure) = self.object_failures.get(&(gvr.clone(), name.to_string())) {
                return Err(failure.clone().into_error(&description));
            }
            let key = (
                gvr.clone(),
                namespace.unwrap_or_default().to_string(),
                name.to_string(),
            );
            self.objects
                .get(&key)
                .cloned()
                .ok_or_else(|| GatherError::not_found(&description))
        })
        .await
    }

    async fn list(
        &self,
        ctx: &GatherContext,
        gvr: &GroupVersionResource,
        namespace: Option<&str>,
    ) -> Result<Vec<DynamicObject>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let description = gvr.describe(namespace, None);
        ctx.run(&description, async {
            self.kind_failure(gvr, &description)?;
            Ok(self
                .objects
                .iter()
                .filter(|((kind, object_namespace, _), _)| {
                    kind == gvr && namespace.is_none_or(|ns| ns == object_namespace)
                })
                .map(|(_, object)| object.clone())
                .collect())
        })
        .await
    }
}
