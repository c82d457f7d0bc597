//! Request coordinator.
//!
//! A two-state machine: `Idle` until a submission is accepted, `Pending`
//! until its outcome is applied. There is no queue. A submission while
//! pending is rejected and leaves the pending request untouched.

use crate::document::{DomEvent, ElementId, HostDocument};
use crate::entitlement::Tier;
use crate::error::OptimoResult;
use crate::notice::Notice;
use crate::options::{Capability, OptionSet};
use crate::service::{OptimizeRequest, ServiceReply};

/// Shown when the surface is blank.
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt to optimize";
/// Shown after the surface was rewritten.
pub const SUCCESS_MESSAGE: &str = "Prompt optimized successfully!";
/// Shown when the service failed without a message.
pub const FAILURE_FALLBACK: &str = "Optimization failed";
/// Shown when the request never reached the service.
pub const TRANSPORT_MESSAGE: &str = "Network error. Please try again.";
/// Shown when the surface left the page.
pub const SURFACE_GONE_MESSAGE: &str = "The prompt field is no longer on the page";

/// Coordinator state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No request in flight.
    #[default]
    Idle,
    /// A request for `surface` is in flight.
    Pending {
        /// Surface that will receive the result.
        surface: ElementId,
    },
}

/// Why a submission was refused. The coordinator state is unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A request is already in flight.
    Busy,
    /// No panel is open, so there is no surface to read from.
    NoSurface,
    /// The surface left the document.
    SurfaceGone,
    /// The surface is empty after trimming.
    EmptyPrompt,
    /// The options use a capability the tier does not grant.
    UpgradeRequired(Capability),
}

impl Rejection {
    /// Notice to show for the rejection, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Busy | Self::NoSurface => None,
            Self::SurfaceGone => Some(Notice::error(SURFACE_GONE_MESSAGE)),
            Self::EmptyPrompt => Some(Notice::error(EMPTY_PROMPT_MESSAGE)),
            Self::UpgradeRequired(capability) => Some(Notice::info(capability.upgrade_message())),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "an optimization is already running"),
            Self::NoSurface => write!(f, "no prompt field selected"),
            Self::SurfaceGone => write!(f, "{}", SURFACE_GONE_MESSAGE),
            Self::EmptyPrompt => write!(f, "{}", EMPTY_PROMPT_MESSAGE),
            Self::UpgradeRequired(capability) => write!(f, "upgrade required: {}", capability),
        }
    }
}

/// An accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationRequest {
    /// Surface that will receive the result.
    pub surface: ElementId,
    /// What goes to the service.
    pub payload: OptimizeRequest,
}

/// What came back from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The rewritten prompt.
    Optimized(String),
    /// The service answered with a failure.
    Failed(String),
    /// The request never got an answer.
    Transport,
}

impl Outcome {
    /// Classify a service result.
    pub fn from_result(result: OptimoResult<ServiceReply>) -> Self {
        match result {
            Ok(ServiceReply {
                success: true,
                optimized_prompt: Some(text),
                ..
            }) => Self::Optimized(text),
            Ok(reply) => Self::Failed(
                reply
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| FAILURE_FALLBACK.to_string()),
            ),
            Err(e) => {
                log::warn!("optimization request failed: {}", e);
                Self::Transport
            }
        }
    }
}

/// Result of applying an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The surface now holds the rewritten prompt.
    Applied {
        /// Rewritten surface.
        surface: ElementId,
    },
    /// The service failed; the surface is untouched.
    Failed {
        /// Originating surface.
        surface: ElementId,
        /// Message shown to the user.
        message: String,
    },
    /// Transport failure; the surface is untouched.
    Transport {
        /// Originating surface.
        surface: ElementId,
    },
    /// The surface vanished while the request was in flight.
    SurfaceGone {
        /// Originating surface.
        surface: ElementId,
    },
    /// Nothing was pending.
    Stale,
}

impl Completion {
    /// Surface the completion belongs to.
    pub fn surface(&self) -> Option<ElementId> {
        match self {
            Self::Applied { surface }
            | Self::Failed { surface, .. }
            | Self::Transport { surface }
            | Self::SurfaceGone { surface } => Some(*surface),
            Self::Stale => None,
        }
    }

    /// Notice to show.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Applied { .. } => Some(Notice::success(SUCCESS_MESSAGE)),
            Self::Failed { message, .. } => Some(Notice::error(message.clone())),
            Self::Transport { .. } => Some(Notice::error(TRANSPORT_MESSAGE)),
            Self::SurfaceGone { .. } => Some(Notice::error(SURFACE_GONE_MESSAGE)),
            Self::Stale => None,
        }
    }

    /// Whether the panel should close. Every terminal outcome of a request
    /// closes it; a stale completion has no panel of its own.
    pub fn closes_panel(&self) -> bool {
        !matches!(self, Self::Stale)
    }
}

/// The single-flight request coordinator.
#[derive(Debug, Default)]
pub struct Coordinator {
    state: CoordinatorState,
}

impl Coordinator {
    /// An idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, CoordinatorState::Pending { .. })
    }

    /// Surface of the request in flight.
    pub fn pending_surface(&self) -> Option<ElementId> {
        match self.state {
            CoordinatorState::Pending { surface } => Some(surface),
            CoordinatorState::Idle => None,
        }
    }

    /// Validate and accept a submission. On success the coordinator is
    /// pending and the caller must dispatch exactly one service call.
    pub fn submit<D: HostDocument + ?Sized>(
        &mut self,
        document: &D,
        surface: ElementId,
        options: &OptionSet,
        tier: Tier,
    ) -> Result<OptimizationRequest, Rejection> {
        if self.is_pending() {
            return Err(Rejection::Busy);
        }

        let text = match document.value(surface) {
            Some(text) if document.contains(surface) => text,
            _ => return Err(Rejection::SurfaceGone),
        };
        let prompt_text = text.trim();
        if prompt_text.is_empty() {
            return Err(Rejection::EmptyPrompt);
        }

        let options = options.normalized();
        if let Some(capability) = options.blocked_capability(tier) {
            return Err(Rejection::UpgradeRequired(capability));
        }

        self.state = CoordinatorState::Pending { surface };
        log::info!(
            "optimizing {} chars from {:?} (tone={}, tier={})",
            prompt_text.len(),
            surface,
            options.tone,
            tier.as_str()
        );

        Ok(OptimizationRequest {
            surface,
            payload: OptimizeRequest::new(prompt_text, options),
        })
    }

    /// Apply the outcome of the pending request and return to `Idle`.
    pub fn complete<D: HostDocument + ?Sized>(
        &mut self,
        document: &mut D,
        outcome: Outcome,
    ) -> Completion {
        let surface = match std::mem::take(&mut self.state) {
            CoordinatorState::Pending { surface } => surface,
            CoordinatorState::Idle => {
                log::warn!("optimization outcome arrived with nothing pending");
                return Completion::Stale;
            }
        };

        match outcome {
            Outcome::Optimized(text) => {
                if !document.set_value(surface, &text) {
                    log::warn!("surface {:?} vanished before the result arrived", surface);
                    return Completion::SurfaceGone { surface };
                }
                document.dispatch(surface, DomEvent::Input);
                document.dispatch(surface, DomEvent::Change);
                log::info!("surface {:?} rewritten", surface);
                Completion::Applied { surface }
            }
            Outcome::Failed(message) => {
                log::warn!("optimization failed: {}", message);
                Completion::Failed { surface, message }
            }
            Outcome::Transport => Completion::Transport { surface },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementSpec, MemoryDocument};
    use crate::error::OptimoError;

    fn doc_with_text(text: &str) -> (MemoryDocument, ElementId) {
        let mut doc = MemoryDocument::new();
        let area = doc
            .append(doc.body(), ElementSpec::textarea().value(text))
            .unwrap();
        (doc, area)
    }

    #[test]
    fn test_submit_trims_and_goes_pending() {
        let (doc, area) = doc_with_text("  write a haiku \n");
        let mut coordinator = Coordinator::new();
        let request = coordinator
            .submit(&doc, area, &OptionSet::default(), Tier::Standard)
            .unwrap();
        assert_eq!(request.payload.prompt_text, "write a haiku");
        assert_eq!(coordinator.state(), CoordinatorState::Pending { surface: area });

        assert_eq!(
            coordinator.submit(&doc, area, &OptionSet::default(), Tier::Standard),
            Err(Rejection::Busy)
        );
        assert_eq!(coordinator.pending_surface(), Some(area));
    }

    #[test]
    fn test_rejections_leave_idle() {
        let (mut doc, area) = doc_with_text("   ");
        let mut coordinator = Coordinator::new();
        assert_eq!(
            coordinator.submit(&doc, area, &OptionSet::default(), Tier::Elevated),
            Err(Rejection::EmptyPrompt)
        );

        doc.set_value(area, "hello");
        let premium = OptionSet::new().with_tone("Academic");
        assert_eq!(
            coordinator.submit(&doc, area, &premium, Tier::Standard),
            Err(Rejection::UpgradeRequired(Capability::PremiumTone))
        );

        doc.remove(area);
        assert_eq!(
            coordinator.submit(&doc, area, &OptionSet::default(), Tier::Standard),
            Err(Rejection::SurfaceGone)
        );
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
    }

    #[test]
    fn test_success_replaces_value_and_notifies() {
        let (mut doc, area) = doc_with_text("draft");
        let mut coordinator = Coordinator::new();
        coordinator
            .submit(&doc, area, &OptionSet::default(), Tier::Standard)
            .unwrap();

        let completion = coordinator.complete(
            &mut doc,
            Outcome::from_result(Ok(ServiceReply::success("X"))),
        );
        assert_eq!(completion, Completion::Applied { surface: area });
        assert!(completion.closes_panel());
        assert_eq!(doc.value(area).as_deref(), Some("X"));
        assert_eq!(doc.dispatched_on(area), vec![DomEvent::Input, DomEvent::Change]);
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
    }

    #[test]
    fn test_failures_return_to_idle() {
        let (mut doc, area) = doc_with_text("draft");
        let mut coordinator = Coordinator::new();

        coordinator
            .submit(&doc, area, &OptionSet::default(), Tier::Standard)
            .unwrap();
        let completion = coordinator.complete(
            &mut doc,
            Outcome::from_result(Ok(ServiceReply {
                success: false,
                ..Default::default()
            })),
        );
        assert_eq!(completion.notice(), Some(Notice::error(FAILURE_FALLBACK)));
        assert!(completion.closes_panel());
        assert!(!coordinator.is_pending());

        coordinator
            .submit(&doc, area, &OptionSet::default(), Tier::Standard)
            .unwrap();
        let completion = coordinator.complete(
            &mut doc,
            Outcome::from_result(Err(OptimoError::Disconnected)),
        );
        assert_eq!(completion, Completion::Transport { surface: area });
        assert_eq!(completion.notice(), Some(Notice::error(TRANSPORT_MESSAGE)));
        assert!(completion.closes_panel());
        assert_eq!(doc.value(area).as_deref(), Some("draft"));
        assert!(doc.dispatched().is_empty());
        assert!(!coordinator.is_pending());
    }

    #[test]
    fn test_result_for_vanished_surface_is_dropped() {
        let (mut doc, area) = doc_with_text("draft");
        let mut coordinator = Coordinator::new();
        coordinator
            .submit(&doc, area, &OptionSet::default(), Tier::Standard)
            .unwrap();
        doc.remove(area);

        let completion = coordinator.complete(&mut doc, Outcome::Optimized("X".into()));
        assert_eq!(completion, Completion::SurfaceGone { surface: area });
        assert!(!coordinator.is_pending());
        assert_eq!(
            coordinator.complete(&mut doc, Outcome::Transport),
            Completion::Stale
        );
    }
}
