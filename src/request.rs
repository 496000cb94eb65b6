//! Request identity and completion plumbing.
//!
//! Endpoints are fire-and-forget from the caller's perspective: a dispatch
//! returns immediately with an opaque [`RequestId`] (or `None` when the
//! endpoint does not track identifiers), and the eventual success or failure
//! arrives later as a [`Completion`] through the driver's channel.
//!
//! # Architecture
//!
//! ```text
//! RequestCoordinator               Endpoint                  LifecycleDriver
//!       │                             │                            │
//!       │ dispatch(params, sender)    │                            │
//!       ├────────────────────────────►│                            │
//!       │◄── Option<RequestId> ───────┤                            │
//!       │                             │  sender.success(payload)   │
//!       │                             ├───────────────────────────►│ (channel)
//!       │                             │                            │ pump()
//! ```
//!
//! The [`RequestIdTable`] remembers the most recently dispatched identifier
//! per role; it is the sole mechanism imposing latest-wins semantics when
//! reloads overlap.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::descriptor::Role;

// =============================================================================
// Request Identity
// =============================================================================

/// Opaque identifier for one dispatched fetch.
///
/// Identifiers are only ever compared for equality; the loader attaches no
/// meaning to their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Create a new request identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Payload and Outcome
// =============================================================================

/// Payload delivered on success, with the two optional race-guard markers.
#[derive(Debug, Clone)]
pub struct Payload {
    /// The fetched data.
    pub data: Value,

    /// Identifier of the request this payload answers, when the endpoint
    /// tracks identifiers.
    pub request_id: Option<RequestId>,

    /// Whether this payload was served from a cache. Cache-served payloads
    /// bypass the identifier currency check.
    pub cached: bool,
}

impl Payload {
    /// Create a payload with no markers.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            request_id: None,
            cached: false,
        }
    }

    /// Attach the request identifier this payload answers.
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Mark this payload as served from a cache.
    pub fn from_cache(mut self) -> Self {
        self.cached = true;
        self
    }
}

/// Terminal outcome of one fetch.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The fetch succeeded with a payload.
    Success(Payload),
    /// The fetch failed; the value is the raw failure payload.
    Failure(Value),
}

/// A completion event routed back to the driver.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Role whose fetch completed.
    pub role: Role,
    /// What happened.
    pub outcome: Outcome,
}

// =============================================================================
// Completion Sender
// =============================================================================

/// Reply handle given to an endpoint for exactly one dispatch.
///
/// Success and error delivery collapse into this one typed handle. Sending
/// never blocks; if the driver is gone the completion is silently dropped.
#[derive(Clone)]
pub struct CompletionSender {
    role: Role,
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionSender {
    pub(crate) fn new(role: Role, tx: mpsc::UnboundedSender<Completion>) -> Self {
        Self { role, tx }
    }

    /// The role this handle replies for.
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Deliver a successful payload.
    pub fn success(&self, payload: Payload) {
        let _ = self.tx.send(Completion {
            role: self.role.clone(),
            outcome: Outcome::Success(payload),
        });
    }

    /// Deliver a failure payload.
    pub fn failure(&self, error: Value) {
        let _ = self.tx.send(Completion {
            role: self.role.clone(),
            outcome: Outcome::Failure(error),
        });
    }
}

impl fmt::Debug for CompletionSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSender")
            .field("role", &self.role)
            .finish()
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// One callable per resource kind.
///
/// Implementations start the fetch and return immediately; the completion is
/// delivered later through `reply`, possibly from another task. An endpoint
/// that returns `None` opts out of identifier tracking and its completions
/// are always honored.
pub trait Endpoint: Send + Sync {
    /// Dispatch a fetch with the given ordered parameters.
    fn dispatch(&self, params: &[Value], reply: CompletionSender) -> Option<RequestId>;
}

// =============================================================================
// Request Id Table
// =============================================================================

/// Table of the most recently dispatched identifier per role.
///
/// A completion is honored only if its carried identifier equals the table's
/// current value for its role; clearing the table (input change) therefore
/// invalidates every response still in flight from the prior pass. Payloads
/// flagged as cache-served bypass the check entirely.
#[derive(Debug, Default)]
pub struct RequestIdTable {
    ids: HashMap<Role, RequestId>,
}

impl RequestIdTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identifier returned by a dispatch. `None` clears the entry:
    /// the endpoint opted out of tracking for this fetch.
    pub fn record(&mut self, role: &Role, id: Option<RequestId>) {
        match id {
            Some(id) => {
                self.ids.insert(role.clone(), id);
            }
            None => {
                self.ids.remove(role);
            }
        }
    }

    /// The latest identifier recorded for a role.
    pub fn current(&self, role: &Role) -> Option<&RequestId> {
        self.ids.get(role)
    }

    /// Whether a success payload answers the latest dispatch for its role.
    ///
    /// Cache-served payloads are always current. Payloads carrying no
    /// identifier are always current. Otherwise the carried identifier must
    /// equal the table entry; a carried identifier with no table entry fails,
    /// which is what makes overlapping reloads safe after a reset.
    pub fn is_current(&self, role: &Role, payload: &Payload) -> bool {
        if payload.cached {
            return true;
        }
        match &payload.request_id {
            None => true,
            Some(carried) => self.ids.get(role) == Some(carried),
        }
    }

    /// Forget every recorded identifier.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of tracked roles.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no identifiers are tracked.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
