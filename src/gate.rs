//! Render gating: placeholder versus delegated content.
//!
//! The gate reduces the tracker to two booleans after every pass and picks
//! one of three outputs:
//!
//! | blocking   | critical failure | output               |
//! |------------|------------------|----------------------|
//! | true       | false            | loading placeholder  |
//! | true/false | true             | error placeholder    |
//! | false      | false            | delegate to content  |
//!
//! The gate never sees individual failure reasons; the recorded failure
//! payload is passed through only to the host's custom error-message
//! provider and alongside the error plan. A silent host renders nothing
//! instead of the loading placeholder, but the error placeholder is never
//! suppressed.

use serde_json::Value;

use crate::config::LoaderConfig;
use crate::host::{HostState, LoaderHost};
use crate::tracker::LoadingStateTracker;

// =============================================================================
// Render Plan
// =============================================================================

/// What the host should render this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    /// Blocking loads outstanding: show the loading placeholder.
    Loading {
        /// Placeholder text (host-provided or the configured default).
        message: String,
    },

    /// Blocking loads outstanding and the host asked for silence: render
    /// nothing.
    Silent,

    /// A critical failure was recorded: show the error placeholder.
    Error {
        /// Placeholder text (host-provided or the configured default).
        message: String,
        /// The raw failure payload, when one was recorded.
        failure: Option<Value>,
    },

    /// All blocking work settled without critical failures: delegate to the
    /// wrapped content renderer.
    Content,
}

impl RenderPlan {
    /// Returns true for either placeholder or the silent output.
    pub fn is_gated(&self) -> bool {
        !matches!(self, RenderPlan::Content)
    }
}

// =============================================================================
// Render Gate
// =============================================================================

/// Derives the render decision from tracker state.
#[derive(Debug, Clone)]
pub struct RenderGate {
    config: LoaderConfig,
}

impl RenderGate {
    /// Create a gate with the given placeholder defaults.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Compute the render plan for the current tracker state.
    pub fn plan<H: LoaderHost + ?Sized>(
        &self,
        host: &H,
        tracker: &LoadingStateTracker,
        state: &HostState,
    ) -> RenderPlan {
        self.decide(
            host,
            tracker.has_any_blocking_in_progress(),
            tracker.has_any_critical_failure(),
            state.last_failure(),
        )
    }

    /// The plan before the first pass has run: blocking, no failure.
    pub(crate) fn pre_mount_plan<H: LoaderHost + ?Sized>(&self, host: &H) -> RenderPlan {
        self.decide(host, true, false, None)
    }

    fn decide<H: LoaderHost + ?Sized>(
        &self,
        host: &H,
        blocking: bool,
        has_critical_failure: bool,
        failure: Option<&Value>,
    ) -> RenderPlan {
        if has_critical_failure {
            let message = host
                .error_message(failure)
                .unwrap_or_else(|| self.config.error_message.clone());
            return RenderPlan::Error {
                message,
                failure: failure.cloned(),
            };
        }

        if blocking {
            if host.silent_loading() {
                return RenderPlan::Silent;
            }
            let message = host
                .loading_message()
                .unwrap_or_else(|| self.config.loading_message.clone());
            return RenderPlan::Loading { message };
        }

        RenderPlan::Content
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ResourceDescriptor, Role};
    use crate::host::HostInputs;
    use crate::tracker::ResourceStatus;
    use serde_json::json;

    /// Host with configurable gate-relevant surface and no resources.
    #[derive(Default)]
    struct GateHost {
        silent: bool,
        loading_message: Option<String>,
        error_message: Option<String>,
    }

    impl LoaderHost for GateHost {
        fn resources(&self, _inputs: &HostInputs, _state: &HostState) -> Vec<ResourceDescriptor> {
            Vec::new()
        }

        fn loading_message(&self) -> Option<String> {
            self.loading_message.clone()
        }

        fn error_message(&self, failure: Option<&Value>) -> Option<String> {
            self.error_message
                .as_ref()
                .map(|m| match failure {
                    Some(f) => format!("{m}: {f}"),
                    None => m.clone(),
                })
        }

        fn silent_loading(&self) -> bool {
            self.silent
        }
    }

    fn gate() -> RenderGate {
        RenderGate::new(LoaderConfig::default())
    }

    #[test]
    fn test_blocking_without_failure_shows_loading() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::InProgress);

        let plan = gate().plan(&GateHost::default(), &tracker, &HostState::new());
        assert_eq!(
            plan,
            RenderPlan::Loading {
                message: "Loading data...".to_string()
            }
        );
    }

    #[test]
    fn test_critical_failure_wins_over_loading() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::InProgress);
        tracker.transition(&Role::new("b"), ResourceStatus::Failed);

        let plan = gate().plan(&GateHost::default(), &tracker, &HostState::new());
        assert!(matches!(plan, RenderPlan::Error { .. }));
    }

    #[test]
    fn test_settled_without_failure_delegates_to_content() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::Succeeded);
        tracker.transition(&Role::new("b"), ResourceStatus::InProgressNonBlocking);
        tracker.transition(&Role::new("c"), ResourceStatus::FailedNonCritical);

        let plan = gate().plan(&GateHost::default(), &tracker, &HostState::new());
        assert_eq!(plan, RenderPlan::Content);
    }

    #[test]
    fn test_silent_host_renders_empty_while_loading() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::InProgress);

        let host = GateHost {
            silent: true,
            ..Default::default()
        };
        let plan = gate().plan(&host, &tracker, &HostState::new());
        assert_eq!(plan, RenderPlan::Silent);
    }

    #[test]
    fn test_silent_host_still_sees_error_placeholder() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::Failed);

        let host = GateHost {
            silent: true,
            ..Default::default()
        };
        let plan = gate().plan(&host, &tracker, &HostState::new());
        assert!(matches!(plan, RenderPlan::Error { .. }));
    }

    #[test]
    fn test_custom_loading_message_provider() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::InProgress);

        let host = GateHost {
            loading_message: Some("Fetching commits...".to_string()),
            ..Default::default()
        };
        let plan = gate().plan(&host, &tracker, &HostState::new());
        assert_eq!(
            plan,
            RenderPlan::Loading {
                message: "Fetching commits...".to_string()
            }
        );
    }

    #[test]
    fn test_custom_error_provider_receives_failure_payload() {
        let mut tracker = LoadingStateTracker::new();
        tracker.transition(&Role::new("a"), ResourceStatus::Failed);

        let mut state = HostState::new();
        state.record_failure(json!(404));

        let host = GateHost {
            error_message: Some("backend says".to_string()),
            ..Default::default()
        };
        let plan = gate().plan(&host, &tracker, &state);
        assert_eq!(
            plan,
            RenderPlan::Error {
                message: "backend says: 404".to_string(),
                failure: Some(json!(404)),
            }
        );
    }

    #[test]
    fn test_pre_mount_plan_is_loading() {
        let plan = gate().pre_mount_plan(&GateHost::default());
        assert!(matches!(plan, RenderPlan::Loading { .. }));

        let silent = GateHost {
            silent: true,
            ..Default::default()
        };
        assert_eq!(gate().pre_mount_plan(&silent), RenderPlan::Silent);
    }
}
