//! The host contract: what a wrapped component provides to the loader.
//!
//! Rather than grafting loading behavior onto the component itself, the host
//! implements a small trait and the driver holds a reference to it, so there
//! is never ambiguity about whose state an operation reads. Host state lives
//! in an explicit container passed by reference into every operation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::ResourceDescriptor;

// =============================================================================
// Host Inputs
// =============================================================================

/// The driving inputs of the host, snapshotted for structural change
/// detection.
///
/// Only `data` and `params` participate in the comparison; an input-change
/// event whose snapshot equals the previous one is ignored entirely. Equality
/// is deep structural equality over the JSON values, not serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInputs {
    /// Arbitrary data the host was handed.
    pub data: Value,
    /// Parameters the host was handed.
    pub params: Value,
}

impl HostInputs {
    /// Create an input snapshot.
    pub fn new(data: Value, params: Value) -> Self {
        Self { data, params }
    }
}

// =============================================================================
// Host State
// =============================================================================

/// The host's mutable state container.
///
/// Successful payloads are merged in as a single batched update per
/// completion. The most recent failure payload is recorded separately so the
/// error placeholder can surface it.
#[derive(Debug, Default)]
pub struct HostState {
    fields: Map<String, Value>,
    last_failure: Option<Value>,
}

impl HostState {
    /// Create an empty state container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of field updates in one step.
    pub fn merge(&mut self, updates: Map<String, Value>) {
        for (field, value) in updates {
            self.fields.insert(field, value);
        }
    }

    /// Set a single field.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Read a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Record the raw payload of a failed fetch.
    pub fn record_failure(&mut self, error: Value) {
        self.last_failure = Some(error);
    }

    /// The most recently recorded failure payload.
    pub fn last_failure(&self) -> Option<&Value> {
        self.last_failure.as_ref()
    }
}

// =============================================================================
// Loader Host
// =============================================================================

/// Contract implemented by the wrapped component.
///
/// Only `resources` is required. The default methods cover the optional
/// surface: a manual-orchestration escape hatch, custom placeholder messages,
/// and silent loading.
pub trait LoaderHost: Send {
    /// The descriptor table for the current inputs and state.
    ///
    /// Called on every pass; descriptors whose roles are already resolved are
    /// skipped, so returning newly relevant resources from later passes is
    /// how conditional loading is expressed.
    fn resources(&self, inputs: &HostInputs, state: &HostState) -> Vec<ResourceDescriptor>;

    /// Manual-orchestration escape hatch, invoked at the start of every load
    /// pass in addition to the descriptor table.
    fn on_load_resources(&self, _inputs: &HostInputs) {}

    /// Custom loading placeholder text; `None` uses the configured default.
    fn loading_message(&self) -> Option<String> {
        None
    }

    /// Custom error placeholder text, given the recorded failure payload;
    /// `None` uses the configured default.
    fn error_message(&self, _failure: Option<&Value>) -> Option<String> {
        None
    }

    /// Suppresses the loading placeholder (renders empty). Never suppresses
    /// the error placeholder.
    fn silent_loading(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
