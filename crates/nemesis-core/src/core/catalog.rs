// nemesis-core/src/core/catalog.rs
// ============================================================================
// Module: Operation Catalog
// Description: Named schema operations with prepare/perform/cleanup phases.
// Purpose: Describe the schema changes the coordinator measures.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! A [`CatalogOperation`] is a plain record of callables: an optional
//! `prepare`, a required `perform`, an optional `cleanup`, and the set of
//! backend [`Feature`]s it needs. A [`Catalog`] is an ordered list of
//! operations with unique names, supplied whole by the caller and never
//! mutated by the engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::interfaces::Backend;
use crate::interfaces::BackendError;
use crate::interfaces::Connection;
use crate::interfaces::Feature;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Phase callable invoked on the coordinator's connection.
pub type PhaseFn = Arc<dyn Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync>;

/// Catalog construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Operation names must not be blank.
    #[error("catalog operation name must not be empty")]
    EmptyName,
    /// Two operations share a name.
    #[error("duplicate catalog operation: {0}")]
    DuplicateOperation(String),
    /// A requested operation is not part of the catalog.
    #[error("unknown catalog operation: {0}")]
    UnknownOperation(String),
}

// ============================================================================
// SECTION: Catalog Operation
// ============================================================================

/// Named schema change with its lifecycle phases.
#[derive(Clone)]
pub struct CatalogOperation {
    /// Unique human-readable name.
    name: String,
    /// Optional setup run before load starts.
    prepare: Option<PhaseFn>,
    /// Measured schema change.
    perform: PhaseFn,
    /// Optional revert of prepare/perform side effects.
    cleanup: Option<PhaseFn>,
    /// Features the backend must support.
    required_features: BTreeSet<Feature>,
}

impl CatalogOperation {
    /// Creates an operation with only a `perform` phase.
    pub fn new<F>(name: impl Into<String>, perform: F) -> Self
    where
        F: Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            prepare: None,
            perform: Arc::new(perform),
            cleanup: None,
            required_features: BTreeSet::new(),
        }
    }

    /// Attaches a `prepare` phase.
    #[must_use]
    pub fn with_prepare<F>(mut self, prepare: F) -> Self
    where
        F: Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync + 'static,
    {
        self.prepare = Some(Arc::new(prepare));
        self
    }

    /// Attaches a `cleanup` phase.
    #[must_use]
    pub fn with_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn(&mut dyn Connection) -> Result<(), BackendError> + Send + Sync + 'static,
    {
        self.cleanup = Some(Arc::new(cleanup));
        self
    }

    /// Adds a backend feature the operation depends on.
    #[must_use]
    pub fn requires(mut self, feature: Feature) -> Self {
        self.required_features.insert(feature);
        self
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates the required features in a stable order.
    pub fn required_features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.required_features.iter().copied()
    }

    /// Returns true when `backend` supports every required feature.
    #[must_use]
    pub fn is_supported_by(&self, backend: &dyn Backend) -> bool {
        self.required_features.iter().all(|feature| backend.supports(*feature))
    }

    /// Returns true when the operation has a `prepare` phase.
    #[must_use]
    pub const fn has_prepare(&self) -> bool {
        self.prepare.is_some()
    }

    /// Returns true when the operation has a `cleanup` phase.
    #[must_use]
    pub const fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Runs the `prepare` phase; a missing phase succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when a prepare statement fails.
    pub fn prepare(&self, connection: &mut dyn Connection) -> Result<(), BackendError> {
        self.prepare.as_ref().map_or(Ok(()), |prepare| prepare(connection))
    }

    /// Runs the measured `perform` phase.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the schema change fails.
    pub fn perform(&self, connection: &mut dyn Connection) -> Result<(), BackendError> {
        (self.perform)(connection)
    }

    /// Runs the `cleanup` phase; a missing phase succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when a cleanup statement fails.
    pub fn cleanup(&self, connection: &mut dyn Connection) -> Result<(), BackendError> {
        self.cleanup.as_ref().map_or(Ok(()), |cleanup| cleanup(connection))
    }
}

impl fmt::Debug for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogOperation")
            .field("name", &self.name)
            .field("has_prepare", &self.prepare.is_some())
            .field("has_cleanup", &self.cleanup.is_some())
            .field("required_features", &self.required_features)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Ordered list of uniquely named operations.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Catalog name (for example the migration strategy it models).
    name: String,
    /// Operations in run order.
    operations: Vec<CatalogOperation>,
}

impl Catalog {
    /// Creates a catalog, rejecting blank or duplicate operation names.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when an operation name is blank or repeated.
    pub fn new(
        name: impl Into<String>,
        operations: Vec<CatalogOperation>,
    ) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for operation in &operations {
            if operation.name().trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !seen.insert(operation.name()) {
                return Err(CatalogError::DuplicateOperation(operation.name().to_string()));
            }
        }
        Ok(Self {
            name: name.into(),
            operations,
        })
    }

    /// Returns the catalog name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operations in run order.
    #[must_use]
    pub fn operations(&self) -> &[CatalogOperation] {
        &self.operations
    }

    /// Returns the operation names in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.operations.iter().map(CatalogOperation::name).collect()
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true when the catalog has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the operation with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogOperation> {
        self.operations.iter().find(|operation| operation.name() == name)
    }

    /// Returns a catalog restricted to `names`, keeping catalog order. An
    /// empty selection keeps every operation.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownOperation`] when a name is not present.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, CatalogError> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        for name in names {
            if self.get(name.as_ref()).is_none() {
                return Err(CatalogError::UnknownOperation(name.as_ref().to_string()));
            }
        }
        let operations = self
            .operations
            .iter()
            .filter(|operation| names.iter().any(|name| name.as_ref() == operation.name()))
            .cloned()
            .collect();
        Ok(Self {
            name: self.name.clone(),
            operations,
        })
    }
}
