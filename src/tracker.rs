//! Per-role loading status tracking.
//!
//! Every resource role occupies exactly one [`ResourceStatus`] at any instant.
//! Storing a single tagged status per role, rather than moving roles between
//! separate per-status sets by hand, gives the mutual-exclusivity invariant
//! by construction.

use std::collections::HashMap;
use std::fmt;

use crate::descriptor::Role;

// =============================================================================
// Resource Status
// =============================================================================

/// Status of a single resource role.
///
/// `Idle` means the role has not been dispatched this pass; it is represented
/// by absence from the tracker's map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceStatus {
    /// Not dispatched this pass.
    #[default]
    Idle,
    /// In flight; keeps the host in the loading state.
    InProgress,
    /// In flight; does not keep the host in the loading state.
    InProgressNonBlocking,
    /// Failed; surfaces the error placeholder.
    Failed,
    /// Failed; visible only to hosts that inspect the tracker directly.
    FailedNonCritical,
    /// Completed successfully.
    Succeeded,
}

impl ResourceStatus {
    /// Whether the role has been dispatched or settled this pass.
    ///
    /// Resolved roles are skipped by the dispatch pass. This includes
    /// `FailedNonCritical`: a non-critically failed resource is not retried
    /// until the next reset.
    pub fn is_resolved(self) -> bool {
        !matches!(self, ResourceStatus::Idle)
    }

    /// Whether the role is in flight (blocking or not).
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            ResourceStatus::InProgress | ResourceStatus::InProgressNonBlocking
        )
    }

    /// Whether the role settled with a failure (critical or not).
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            ResourceStatus::Failed | ResourceStatus::FailedNonCritical
        )
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceStatus::Idle => "idle",
            ResourceStatus::InProgress => "in-progress",
            ResourceStatus::InProgressNonBlocking => "in-progress-non-blocking",
            ResourceStatus::Failed => "failed",
            ResourceStatus::FailedNonCritical => "failed-non-critical",
            ResourceStatus::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Loading State Tracker
// =============================================================================

/// Tracks which status every role occupies.
///
/// Created empty at mount and at every input-change reset, mutated only by
/// the coordinator and driver, and discarded at unmount. The two aggregate
/// queries are what the render gate consumes: anything `InProgress` keeps the
/// host blocking, anything `Failed` surfaces the error placeholder.
#[derive(Debug, Default)]
pub struct LoadingStateTracker {
    statuses: HashMap<Role, ResourceStatus>,
}

impl LoadingStateTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every status. Called at mount and whenever the host's driving
    /// inputs change.
    pub fn reset(&mut self) {
        self.statuses.clear();
    }

    /// Move a role to the given status, leaving every other status.
    ///
    /// Idempotent: repeating the same transition is a no-op.
    pub fn transition(&mut self, role: &Role, status: ResourceStatus) {
        if status == ResourceStatus::Idle {
            self.statuses.remove(role);
        } else {
            self.statuses.insert(role.clone(), status);
        }
    }

    /// The status a role currently occupies.
    pub fn status(&self, role: &Role) -> ResourceStatus {
        self.statuses.get(role).copied().unwrap_or_default()
    }

    /// Whether the role has been dispatched or settled this pass.
    pub fn is_resolved(&self, role: &Role) -> bool {
        self.status(role).is_resolved()
    }

    /// Whether any blocking fetch is still in flight.
    pub fn has_any_blocking_in_progress(&self) -> bool {
        self.statuses
            .values()
            .any(|status| *status == ResourceStatus::InProgress)
    }

    /// Whether any critical failure has been recorded.
    pub fn has_any_critical_failure(&self) -> bool {
        self.statuses
            .values()
            .any(|status| *status == ResourceStatus::Failed)
    }

    /// Number of non-idle roles.
    pub fn active_count(&self) -> usize {
        self.statuses.len()
    }

    /// Snapshot of every non-idle role and its status.
    pub fn snapshot(&self) -> Vec<(Role, ResourceStatus)> {
        let mut entries: Vec<_> = self
            .statuses
            .iter()
            .map(|(role, status)| (role.clone(), *status))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str) -> Role {
        Role::new(name)
    }

    #[test]
    fn test_new_tracker_is_empty() {
        let tracker = LoadingStateTracker::new();

        assert_eq!(tracker.active_count(), 0);
        assert!(!tracker.has_any_blocking_in_progress());
        assert!(!tracker.has_any_critical_failure());
        assert_eq!(tracker.status(&role("commits")), ResourceStatus::Idle);
    }

    #[test]
    fn test_transition_moves_between_statuses() {
        let mut tracker = LoadingStateTracker::new();
        let r = role("commits");

        tracker.transition(&r, ResourceStatus::InProgress);
        assert_eq!(tracker.status(&r), ResourceStatus::InProgress);

        tracker.transition(&r, ResourceStatus::Succeeded);
        assert_eq!(tracker.status(&r), ResourceStatus::Succeeded);

        // The role occupies exactly one status.
        assert_eq!(tracker.active_count(), 1);
    }

    #[test]
    fn test_transition_is_idempotent() {
        let mut tracker = LoadingStateTracker::new();
        let r = role("commits");

        tracker.transition(&r, ResourceStatus::Failed);
        tracker.transition(&r, ResourceStatus::Failed);

        assert_eq!(tracker.status(&r), ResourceStatus::Failed);
        assert_eq!(tracker.active_count(), 1);
    }

    #[test]
    fn test_transition_to_idle_removes_role() {
        let mut tracker = LoadingStateTracker::new();
        let r = role("commits");

        tracker.transition(&r, ResourceStatus::InProgress);
        tracker.transition(&r, ResourceStatus::Idle);

        assert_eq!(tracker.active_count(), 0);
        assert!(!tracker.is_resolved(&r));
    }

    #[test]
    fn test_exclusivity_across_many_transitions() {
        let mut tracker = LoadingStateTracker::new();
        let r = role("commits");
        let statuses = [
            ResourceStatus::InProgress,
            ResourceStatus::InProgressNonBlocking,
            ResourceStatus::Failed,
            ResourceStatus::FailedNonCritical,
            ResourceStatus::Succeeded,
            ResourceStatus::InProgress,
        ];

        for status in statuses {
            tracker.transition(&r, status);
            assert_eq!(tracker.status(&r), status);
            assert_eq!(tracker.active_count(), 1, "role must occupy one status");
        }
    }

    #[test]
    fn test_blocking_query_only_counts_in_progress() {
        let mut tracker = LoadingStateTracker::new();

        tracker.transition(&role("a"), ResourceStatus::InProgressNonBlocking);
        tracker.transition(&role("b"), ResourceStatus::Succeeded);
        tracker.transition(&role("c"), ResourceStatus::FailedNonCritical);
        assert!(!tracker.has_any_blocking_in_progress());

        tracker.transition(&role("d"), ResourceStatus::InProgress);
        assert!(tracker.has_any_blocking_in_progress());
    }

    #[test]
    fn test_critical_failure_query_ignores_non_critical() {
        let mut tracker = LoadingStateTracker::new();

        tracker.transition(&role("a"), ResourceStatus::FailedNonCritical);
        assert!(!tracker.has_any_critical_failure());

        tracker.transition(&role("b"), ResourceStatus::Failed);
        assert!(tracker.has_any_critical_failure());
    }

    #[test]
    fn test_is_resolved_covers_all_settled_statuses() {
        let mut tracker = LoadingStateTracker::new();
        let r = role("commits");

        assert!(!tracker.is_resolved(&r));

        for status in [
            ResourceStatus::InProgress,
            ResourceStatus::InProgressNonBlocking,
            ResourceStatus::Failed,
            ResourceStatus::FailedNonCritical,
            ResourceStatus::Succeeded,
        ] {
            tracker.transition(&r, status);
            assert!(tracker.is_resolved(&r), "{status} should be resolved");
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&role("a"), ResourceStatus::InProgress);
        tracker.transition(&role("b"), ResourceStatus::Failed);

        tracker.reset();

        assert_eq!(tracker.active_count(), 0);
        assert!(!tracker.has_any_blocking_in_progress());
        assert!(!tracker.has_any_critical_failure());
    }

    #[test]
    fn test_snapshot_is_sorted_by_role() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&role("b"), ResourceStatus::Succeeded);
        tracker.transition(&role("a"), ResourceStatus::InProgress);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].0.as_str(), "a");
        assert_eq!(snapshot[1].0.as_str(), "b");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", ResourceStatus::InProgress), "in-progress");
        assert_eq!(
            format!("{}", ResourceStatus::FailedNonCritical),
            "failed-non-critical"
        );
    }
}
