//! Lifecycle sequencing across mount, input change, and update.
//!
//! The driver owns everything with a lifetime: the tracker, the request-id
//! table, the host state, the completion channel, and the liveness token. It
//! reacts to the three external triggers — mount, input change, post-update —
//! and is the single place completions are applied, so every mutation happens
//! from the host's own context.
//!
//! # Architecture
//!
//! ```text
//! mount(inputs) ──────► reset ──► load pass ─┐
//! inputs_changed ──► same? ignore            │
//!          └──► different: reset ──► load pass
//!                                            │
//! endpoint completions ──► channel ──► pump()│──► apply + post-update pass
//!                                            │
//! unmount() ──► cancel liveness ──► late completions dropped
//! ```
//!
//! Overlapping reloads are safe because an input change clears the
//! request-id table before re-dispatching: any response still in flight from
//! the prior pass carries an identifier that no longer matches and is
//! dropped by the coordinator.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::coordinator::{Applied, RequestCoordinator};
use crate::error::LoaderError;
use crate::gate::{RenderGate, RenderPlan};
use crate::host::{HostInputs, HostState, LoaderHost};
use crate::request::{Completion, RequestIdTable};
use crate::tracker::LoadingStateTracker;

// =============================================================================
// Phase
// =============================================================================

/// Observable lifecycle phase of the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    /// Before mount.
    Uninitialized,
    /// Blocking fetches outstanding.
    Loading,
    /// No blocking work and no critical failure.
    Ready,
    /// A critical failure is recorded.
    Error,
    /// After unmount; terminal.
    Unmounted,
}

// =============================================================================
// Pump Summary
// =============================================================================

/// Result of draining the completion channel once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    /// Completions that affected host state this pump: successes that merged
    /// (or ran their handler) and recorded failures. Stale drops and
    /// unknown-role events are drained but not counted.
    pub applied: usize,
    /// Whether the host should re-render.
    pub render_needed: bool,
    /// Whether the blocking flag flipped, forcing one extra render so the
    /// placeholder/content transition is observed exactly once per flip.
    pub blocking_flipped: bool,
}

// =============================================================================
// Lifecycle Driver
// =============================================================================

/// Sequences the tracker, coordinator, and gate across the host's lifecycle.
pub struct LifecycleDriver<H: LoaderHost> {
    host: H,
    gate: RenderGate,
    coordinator: RequestCoordinator,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    tracker: LoadingStateTracker,
    request_ids: RequestIdTable,
    state: HostState,
    inputs: Option<HostInputs>,
    liveness: CancellationToken,
    prev_blocking: bool,
}

impl<H: LoaderHost> LifecycleDriver<H> {
    /// Create an unmounted driver around a host.
    pub fn new(host: H, config: LoaderConfig) -> Self {
        let (coordinator, completion_rx) = RequestCoordinator::new();
        Self {
            host,
            gate: RenderGate::new(config),
            coordinator,
            completion_rx,
            tracker: LoadingStateTracker::new(),
            request_ids: RequestIdTable::new(),
            state: HostState::new(),
            inputs: None,
            liveness: CancellationToken::new(),
            prev_blocking: false,
        }
    }

    /// Mount the host: reset all loading state and run the initial pass.
    pub fn mount(&mut self, inputs: HostInputs) -> Result<(), LoaderError> {
        if self.liveness.is_cancelled() {
            return Err(LoaderError::Unmounted);
        }

        info!("mounting loader");
        self.tracker.reset();
        self.request_ids.clear();
        self.inputs = Some(inputs);
        self.load_pass();
        self.prev_blocking = self.tracker.has_any_blocking_in_progress();
        Ok(())
    }

    /// Handle new driving inputs.
    ///
    /// Structurally identical inputs are ignored entirely: no reset, no
    /// pass. Different inputs reset the tracker and the request-id table and
    /// re-run the load pass; clearing the table is what invalidates every
    /// response still in flight from the prior inputs.
    ///
    /// Returns whether a reload was triggered.
    pub fn inputs_changed(&mut self, inputs: HostInputs) -> Result<bool, LoaderError> {
        if self.liveness.is_cancelled() {
            return Err(LoaderError::Unmounted);
        }
        let Some(previous) = &self.inputs else {
            return Err(LoaderError::NotMounted);
        };

        if *previous == inputs {
            debug!("inputs unchanged, ignoring");
            return Ok(false);
        }

        info!("inputs changed, reloading resources");
        self.tracker.reset();
        self.request_ids.clear();
        self.inputs = Some(inputs);
        self.load_pass();
        self.prev_blocking = self.tracker.has_any_blocking_in_progress();
        Ok(true)
    }

    /// The post-update trigger: re-run the pass (guards that declined earlier
    /// may now pass, and the descriptor table may have grown), then recompute
    /// the blocking flag.
    ///
    /// Returns true when the blocking flag flipped since the previous check,
    /// in which case the host must render once more.
    pub fn post_update(&mut self) -> bool {
        if self.liveness.is_cancelled() || self.inputs.is_none() {
            return false;
        }

        self.load_pass();

        let blocking = self.tracker.has_any_blocking_in_progress();
        let flipped = blocking != self.prev_blocking;
        self.prev_blocking = blocking;
        flipped
    }

    /// Drain and apply every queued completion, then run the post-update
    /// pass.
    ///
    /// Does nothing after unmount: queued completions are dropped without
    /// touching tracker or state.
    pub fn pump(&mut self) -> PumpSummary {
        if self.liveness.is_cancelled() || self.inputs.is_none() {
            return PumpSummary::default();
        }

        let mut drained = 0;
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            let outcome = self.coordinator.apply_completion(
                completion,
                &mut self.tracker,
                &self.request_ids,
                &mut self.state,
            );
            match outcome {
                Applied::Success | Applied::Failure => {
                    drained += 1;
                    applied += 1;
                }
                // A stale drop still transitions the role, so the pass and
                // flip check must run; it just does not warrant a render on
                // its own.
                Applied::StaleDropped => drained += 1,
                Applied::UnknownRole => {}
            }
        }

        let blocking_flipped = if drained > 0 { self.post_update() } else { false };

        PumpSummary {
            applied,
            render_needed: applied > 0 || blocking_flipped,
            blocking_flipped,
        }
    }

    /// Await completions until no blocking fetch remains in flight.
    ///
    /// There is no timeout: a blocking endpoint that never replies, or that
    /// drops its reply handle without completing, leaves its role in progress
    /// and this awaits indefinitely. Callers wanting a bound wrap the future
    /// in their own timeout; unmount remains the only loader-level escape.
    pub async fn run_until_settled(&mut self) -> Result<(), LoaderError> {
        if self.liveness.is_cancelled() {
            return Err(LoaderError::Unmounted);
        }
        if self.inputs.is_none() {
            return Err(LoaderError::NotMounted);
        }

        // Apply anything already queued before waiting.
        self.pump();

        while self.tracker.has_any_blocking_in_progress() {
            // The coordinator holds a sender for the driver's lifetime, so
            // the channel cannot close while `self` exists.
            let Some(completion) = self.completion_rx.recv().await else {
                break;
            };
            self.coordinator.apply_completion(
                completion,
                &mut self.tracker,
                &self.request_ids,
                &mut self.state,
            );
            self.post_update();
        }
        Ok(())
    }

    /// Unmount the host. Terminal: later completions are dropped and every
    /// trigger becomes a no-op or an error.
    pub fn unmount(&mut self) {
        info!("unmounting loader");
        self.liveness.cancel();
    }

    /// The render decision for the current state.
    pub fn render_plan(&self) -> RenderPlan {
        match self.inputs {
            None => self.gate.pre_mount_plan(&self.host),
            Some(_) => self.gate.plan(&self.host, &self.tracker, &self.state),
        }
    }

    /// Observable lifecycle phase.
    pub fn phase(&self) -> LoaderPhase {
        if self.liveness.is_cancelled() {
            return LoaderPhase::Unmounted;
        }
        if self.inputs.is_none() {
            return LoaderPhase::Uninitialized;
        }
        if self.tracker.has_any_critical_failure() {
            return LoaderPhase::Error;
        }
        if self.tracker.has_any_blocking_in_progress() {
            return LoaderPhase::Loading;
        }
        LoaderPhase::Ready
    }

    /// Whether the host is still live.
    pub fn is_live(&self) -> bool {
        !self.liveness.is_cancelled()
    }

    /// Token endpoints can observe to abandon work after unmount.
    pub fn liveness_token(&self) -> CancellationToken {
        self.liveness.clone()
    }

    /// The status tracker, for hosts that surface non-critical failures.
    pub fn tracker(&self) -> &LoadingStateTracker {
        &self.tracker
    }

    /// The host state container.
    pub fn state(&self) -> &HostState {
        &self.state
    }

    /// The wrapped host.
    pub fn host(&self) -> &H {
        &self.host
    }

    fn load_pass(&mut self) {
        let Some(inputs) = self.inputs.clone() else {
            return;
        };
        self.host.on_load_resources(&inputs);
        let descriptors = self.host.resources(&inputs, &self.state);
        self.coordinator.run_pass(
            &descriptors,
            &inputs,
            &mut self.tracker,
            &mut self.request_ids,
            &self.state,
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
