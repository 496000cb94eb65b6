//! Dispatch passes and completion application.
//!
//! The coordinator walks the host's descriptor table once per pass, issuing
//! a fetch for every role that is neither resolved nor held back by its
//! guard, and later folds each completion back into the tracker and host
//! state. It is the only component that mutates either.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      RequestCoordinator                        │
//! │                                                                │
//! │  run_pass ──► resolved? ──► guard? ──► endpoint.dispatch       │
//! │                  │skip        │skip         │                  │
//! │                               │             ├─ record id       │
//! │                               │             └─ mark in-flight  │
//! │                                                                │
//! │  apply_completion ──► success ──► stale? ──► handler/mapping   │
//! │                  └──► failure ──► classify critical            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! A clone of the descriptor is captured at dispatch time, so a completion
//! that arrives after the host's descriptor table changed (or after a reset)
//! is still classified with the blocking/critical/mapping options that were
//! in force when its fetch was issued.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::descriptor::{ResourceDescriptor, Role};
use crate::host::{HostInputs, HostState};
use crate::request::{Completion, CompletionSender, Outcome, RequestIdTable};
use crate::tracker::{LoadingStateTracker, ResourceStatus};

// =============================================================================
// Applied
// =============================================================================

/// Classification of one applied completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Payload merged into host state (or consumed by a custom handler).
    Success,
    /// Failure recorded against the role.
    Failure,
    /// Identifier no longer current: the payload was dropped untouched.
    StaleDropped,
    /// No dispatch on record for the role; the event was ignored.
    UnknownRole,
}

// =============================================================================
// Request Coordinator
// =============================================================================

/// Issues fetches and folds completions back into tracker and host state.
pub struct RequestCoordinator {
    /// Sender cloned into every dispatch's reply handle.
    completion_tx: mpsc::UnboundedSender<Completion>,

    /// Descriptor snapshots captured at dispatch time, keyed by role.
    ///
    /// Entries are overwritten on re-dispatch and deliberately survive
    /// resets: a late failure from a superseded request still classifies
    /// with the criticality it was dispatched under.
    dispatched: HashMap<Role, ResourceDescriptor>,
}

impl RequestCoordinator {
    /// Create a coordinator and the completion channel it feeds.
    ///
    /// The receiver belongs to the driver, which drains it from its own
    /// context only.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        (
            Self {
                completion_tx,
                dispatched: HashMap::new(),
            },
            completion_rx,
        )
    }

    /// Run one dispatch pass over the descriptor table.
    ///
    /// Returns the number of fetches issued. Roles already resolved are
    /// skipped; roles whose guard declines are skipped without being marked,
    /// so they are reconsidered on the next pass.
    pub fn run_pass(
        &mut self,
        descriptors: &[ResourceDescriptor],
        inputs: &HostInputs,
        tracker: &mut LoadingStateTracker,
        ids: &mut RequestIdTable,
        state: &HostState,
    ) -> usize {
        let mut issued = 0;

        for descriptor in descriptors {
            let role = &descriptor.role;

            if tracker.is_resolved(role) {
                continue;
            }

            if let Some(before) = &descriptor.before {
                if !before(inputs, state) {
                    trace!(role = %role, "guard declined, dispatch deferred");
                    continue;
                }
            }

            let reply = CompletionSender::new(role.clone(), self.completion_tx.clone());
            let request_id = descriptor.endpoint.dispatch(&descriptor.params, reply);

            debug!(
                role = %role,
                request_id = ?request_id,
                blocking = descriptor.blocking,
                "dispatched resource fetch"
            );

            ids.record(role, request_id);
            self.dispatched.insert(role.clone(), descriptor.clone());

            let status = if descriptor.blocking {
                ResourceStatus::InProgress
            } else {
                ResourceStatus::InProgressNonBlocking
            };
            tracker.transition(role, status);
            issued += 1;
        }

        issued
    }

    /// Fold one completion into the tracker and host state.
    ///
    /// The caller is responsible for the liveness check: completions must not
    /// be applied after the host is torn down.
    pub fn apply_completion(
        &self,
        completion: Completion,
        tracker: &mut LoadingStateTracker,
        ids: &RequestIdTable,
        state: &mut HostState,
    ) -> Applied {
        let Completion { role, outcome } = completion;

        let Some(descriptor) = self.dispatched.get(&role) else {
            warn!(role = %role, "completion for a role never dispatched, ignoring");
            return Applied::UnknownRole;
        };

        match outcome {
            Outcome::Success(payload) => {
                // The status flips to succeeded before the identifier check;
                // only the payload is guarded against staleness.
                tracker.transition(&role, ResourceStatus::Succeeded);

                if !ids.is_current(&role, &payload) {
                    debug!(
                        role = %role,
                        carried = ?payload.request_id,
                        current = ?ids.current(&role),
                        "dropping stale response"
                    );
                    return Applied::StaleDropped;
                }

                if let Some(handler) = &descriptor.on_success {
                    handler(&payload.data, state);
                    if descriptor.mapping.is_none() {
                        return Applied::Success;
                    }
                }

                let updates = descriptor.effective_mapping().apply(&payload.data);
                state.merge(updates);
                Applied::Success
            }
            Outcome::Failure(error) => {
                let status = if descriptor.critical {
                    ResourceStatus::Failed
                } else {
                    ResourceStatus::FailedNonCritical
                };
                tracker.transition(&role, status);
                debug!(role = %role, critical = descriptor.critical, "resource fetch failed");

                state.record_failure(error.clone());
                if let Some(handler) = &descriptor.on_failure {
                    handler(&error, state);
                }
                Applied::Failure
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
