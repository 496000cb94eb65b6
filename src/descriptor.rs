//! Resource descriptors: the declarative unit of loading work.
//!
//! A host declares each remote resource it depends on as a
//! [`ResourceDescriptor`]: a unique [`Role`], the [`Endpoint`] to call, the
//! ordered parameters to pass, and how the successful payload maps into host
//! state. Blocking and critical default to true; a resource opts out of either
//! with the builder methods.
//!
//! # Example
//!
//! ```ignore
//! use loadgate::descriptor::{Mapping, ResourceDescriptor};
//!
//! let descriptor = ResourceDescriptor::new("commits", endpoint)
//!     .with_params(vec![json!("main")])
//!     .with_mapping(Mapping::new().field("commits", "items"))
//!     .non_critical();
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::host::{HostInputs, HostState};
use crate::request::Endpoint;

// =============================================================================
// Role
// =============================================================================

/// Unique name identifying one resource-fetch slot for the current pass.
///
/// Roles key the status tracker, the request-identifier table, and the
/// default state mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role(Arc<str>);

impl Role {
    /// Create a new role from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().into())
    }

    /// Get the role name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Where a mapped host-state field takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// Copy a single named field out of the payload.
    Key(String),
    /// Assign the entire payload (the `*` wildcard).
    Whole,
}

/// Mapping from host-state field names to payload fields.
///
/// Applied only when the descriptor declares no custom success handler, or
/// alongside one when both are declared. A payload field that is absent maps
/// to `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: BTreeMap<String, FieldSource>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default mapping for a role: `{role: role}`.
    pub fn for_role(role: &Role) -> Self {
        Self::new().field(role.as_str(), role.as_str())
    }

    /// Map a host-state field from a named payload field.
    pub fn field(mut self, state_field: impl Into<String>, payload_key: impl Into<String>) -> Self {
        self.entries
            .insert(state_field.into(), FieldSource::Key(payload_key.into()));
        self
    }

    /// Map a host-state field from the entire payload.
    pub fn whole(mut self, state_field: impl Into<String>) -> Self {
        self.entries.insert(state_field.into(), FieldSource::Whole);
        self
    }

    /// Returns true if the mapping declares no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build the batch of host-state updates for a payload.
    pub fn apply(&self, payload: &Value) -> Map<String, Value> {
        let mut updates = Map::with_capacity(self.entries.len());
        for (state_field, source) in &self.entries {
            let value = match source {
                FieldSource::Key(key) => payload.get(key).cloned().unwrap_or(Value::Null),
                FieldSource::Whole => payload.clone(),
            };
            updates.insert(state_field.clone(), value);
        }
        updates
    }
}

// =============================================================================
// Handler Types
// =============================================================================

/// Guard predicate evaluated immediately before dispatch.
///
/// Returning false skips the dispatch for this pass without marking the
/// resource as attempted; it is reconsidered on the next pass.
pub type Guard = Arc<dyn Fn(&HostInputs, &HostState) -> bool + Send + Sync>;

/// Custom success handler, given the payload data and the host state.
pub type SuccessHandler = Arc<dyn Fn(&Value, &mut HostState) + Send + Sync>;

/// Custom failure handler, given the failure payload and the host state.
pub type FailureHandler = Arc<dyn Fn(&Value, &mut HostState) + Send + Sync>;

// =============================================================================
// Resource Descriptor
// =============================================================================

/// Declares one fetchable unit of remote data.
///
/// Cloning is cheap: endpoints and handlers are shared behind `Arc`. The
/// coordinator clones a descriptor at dispatch time so a late completion is
/// classified with the options that were in force when its fetch was issued.
#[derive(Clone)]
pub struct ResourceDescriptor {
    /// Unique role for this pass.
    pub role: Role,

    /// The callable that performs the fetch.
    pub endpoint: Arc<dyn Endpoint>,

    /// Ordered arguments passed to the endpoint ahead of the reply handle.
    pub params: Vec<Value>,

    /// How the payload maps into host state; absent defaults to `{role: role}`.
    pub mapping: Option<Mapping>,

    /// Custom success handler.
    pub on_success: Option<SuccessHandler>,

    /// Custom failure handler.
    pub on_failure: Option<FailureHandler>,

    /// Whether this resource must complete before the host is ready.
    pub blocking: bool,

    /// Whether a failure here surfaces the error placeholder.
    pub critical: bool,

    /// Guard predicate evaluated before dispatch.
    pub before: Option<Guard>,
}

impl ResourceDescriptor {
    /// Create a descriptor with the default options: blocking and critical.
    pub fn new(role: impl Into<Role>, endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            role: role.into(),
            endpoint,
            params: Vec::new(),
            mapping: None,
            on_success: None,
            on_failure: None,
            blocking: true,
            critical: true,
            before: None,
        }
    }

    /// Set the ordered endpoint parameters.
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Declare an explicit state mapping.
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Attach a custom success handler.
    pub fn with_success(mut self, handler: SuccessHandler) -> Self {
        self.on_success = Some(handler);
        self
    }

    /// Attach a custom failure handler.
    pub fn with_failure(mut self, handler: FailureHandler) -> Self {
        self.on_failure = Some(handler);
        self
    }

    /// Mark this resource as non-blocking: it does not keep the host in the
    /// loading state while in flight.
    pub fn non_blocking(mut self) -> Self {
        self.blocking = false;
        self
    }

    /// Mark this resource as non-critical: a failure does not surface the
    /// error placeholder.
    pub fn non_critical(mut self) -> Self {
        self.critical = false;
        self
    }

    /// Attach a dispatch guard.
    pub fn with_before(mut self, guard: Guard) -> Self {
        self.before = Some(guard);
        self
    }

    /// The mapping to apply on success: the declared one, or `{role: role}`.
    pub(crate) fn effective_mapping(&self) -> Mapping {
        self.mapping
            .clone()
            .unwrap_or_else(|| Mapping::for_role(&self.role))
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("role", &self.role)
            .field("params", &self.params)
            .field("mapping", &self.mapping)
            .field("has_success", &self.on_success.is_some())
            .field("has_failure", &self.on_failure.is_some())
            .field("blocking", &self.blocking)
            .field("critical", &self.critical)
            .field("has_before", &self.before.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{CompletionSender, RequestId};
    use serde_json::json;

    struct NullEndpoint;

    impl Endpoint for NullEndpoint {
        fn dispatch(&self, _params: &[Value], _reply: CompletionSender) -> Option<RequestId> {
            None
        }
    }

    fn endpoint() -> Arc<dyn Endpoint> {
        Arc::new(NullEndpoint)
    }

    #[test]
    fn test_role_display_and_eq() {
        let role = Role::new("commits");
        assert_eq!(role.as_str(), "commits");
        assert_eq!(format!("{}", role), "commits");
        assert_eq!(role, Role::from("commits"));
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = ResourceDescriptor::new("commits", endpoint());

        assert!(descriptor.blocking);
        assert!(descriptor.critical);
        assert!(descriptor.params.is_empty());
        assert!(descriptor.mapping.is_none());
        assert!(descriptor.before.is_none());
    }

    #[test]
    fn test_descriptor_builder_options() {
        let descriptor = ResourceDescriptor::new("commits", endpoint())
            .with_params(vec![json!("main"), json!(10)])
            .non_blocking()
            .non_critical();

        assert!(!descriptor.blocking);
        assert!(!descriptor.critical);
        assert_eq!(descriptor.params.len(), 2);
    }

    #[test]
    fn test_mapping_named_field() {
        let mapping = Mapping::new().field("x", "a");
        let updates = mapping.apply(&json!({"a": 1, "b": 2}));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates["x"], json!(1));
    }

    #[test]
    fn test_mapping_wildcard_copies_whole_payload() {
        let mapping = Mapping::new().whole("target");
        let updates = mapping.apply(&json!({"a": 1, "b": 2}));

        assert_eq!(updates["target"], json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_mapping_missing_payload_field_maps_to_null() {
        let mapping = Mapping::new().field("x", "missing");
        let updates = mapping.apply(&json!({"a": 1}));

        assert_eq!(updates["x"], Value::Null);
    }

    #[test]
    fn test_default_mapping_is_role_to_role() {
        let descriptor = ResourceDescriptor::new("commits", endpoint());
        let mapping = descriptor.effective_mapping();
        let updates = mapping.apply(&json!({"commits": [1, 2, 3]}));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates["commits"], json!([1, 2, 3]));
    }

    #[test]
    fn test_declared_mapping_wins_over_default() {
        let descriptor = ResourceDescriptor::new("commits", endpoint())
            .with_mapping(Mapping::new().field("history", "items"));
        let updates = descriptor.effective_mapping().apply(&json!({"items": 7}));

        assert_eq!(updates.len(), 1);
        assert_eq!(updates["history"], json!(7));
    }

    #[test]
    fn test_descriptor_debug_omits_closures() {
        let descriptor = ResourceDescriptor::new("commits", endpoint())
            .with_before(Arc::new(|_, _| true));
        let debug = format!("{:?}", descriptor);

        assert!(debug.contains("commits"));
        assert!(debug.contains("has_before: true"));
    }
}
