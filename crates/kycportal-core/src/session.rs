//! Intake session state machine.
//!
//! One session covers a single scan/upload → submit → result cycle. The
//! machine is a pure function of `(state, event)`; callers carry out the
//! returned effects (issue the request, show the notification, clear the
//! file selection) and feed results back in as new events.
//!
//! `Submitting` doubles as the busy flag: decoded payloads arriving while a
//! request is in flight are dropped, not queued.

use crate::error::PipelineError;
use crate::types::{Payload, RequestId};

/// Successful outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSuccess {
    pub request_id: RequestId,
    pub customer_name: String,
}

impl SubmissionSuccess {
    /// Confirmation line shown after creation.
    pub fn summary(&self) -> String {
        format!(
            "A new KYC request for {} has been successfully created with Request ID: #{}.",
            self.customer_name, self.request_id
        )
    }
}

/// Session state.
///
/// A failed submission returns straight to `Idle` with a one-off error
/// notification; there is no retained failure state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// A request is in flight. Holds the name to echo on success.
    Submitting { customer_name: String },
    Succeeded(SubmissionSuccess),
}

impl SessionState {
    /// Whether a newly decoded payload would be accepted.
    pub fn accepts_input(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Submitting { .. })
    }

    pub fn outcome(&self) -> Option<&SubmissionSuccess> {
        match self {
            SessionState::Succeeded(success) => Some(success),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Submitting { .. } => "submitting",
            SessionState::Succeeded(_) => "succeeded",
        }
    }
}

/// Events driving the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A payload passed validation.
    PayloadAccepted(Payload),
    /// Acquisition, decoding or validation failed before any request.
    InputRejected(PipelineError),
    /// Backend returned a well-formed success body.
    SubmissionSucceeded { request_id: RequestId },
    /// Request failed; carries the best available message.
    SubmissionFailed(String),
    /// User asked to create another request.
    CreateAnother,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient toast shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send exactly one create request carrying this payload.
    Submit(Payload),
    Notify(Notification),
    /// Forget the selected file and any other input artifacts.
    ClearSelection,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: &SessionState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

pub const CREATED_MESSAGE: &str = "KYC Request created successfully!";

/// Apply `event` to `state`.
pub fn transition(state: &SessionState, event: SessionEvent) -> Transition {
    match (state, event) {
        (SessionState::Idle, SessionEvent::PayloadAccepted(payload)) => Transition {
            state: SessionState::Submitting {
                customer_name: payload.customer_name.clone(),
            },
            effects: vec![Effect::Submit(payload)],
        },
        // Busy or showing a result: drop the payload silently.
        (_, SessionEvent::PayloadAccepted(_)) => Transition::stay(state),

        // Rejections never move the session; they only surface a notification.
        (_, SessionEvent::InputRejected(err)) => Transition {
            state: state.clone(),
            effects: vec![Effect::Notify(Notification::error(err.to_string()))],
        },

        (SessionState::Submitting { customer_name }, SessionEvent::SubmissionSucceeded { request_id }) => {
            Transition {
                state: SessionState::Succeeded(SubmissionSuccess {
                    request_id,
                    customer_name: customer_name.clone(),
                }),
                effects: vec![Effect::Notify(Notification::success(CREATED_MESSAGE))],
            }
        }
        (SessionState::Submitting { .. }, SessionEvent::SubmissionFailed(message)) => Transition {
            state: SessionState::Idle,
            effects: vec![Effect::Notify(Notification::error(
                PipelineError::Submission(message).to_string(),
            ))],
        },
        // Stale results with no request in flight.
        (_, SessionEvent::SubmissionSucceeded { .. } | SessionEvent::SubmissionFailed(_)) => {
            Transition::stay(state)
        }

        (SessionState::Succeeded(_), SessionEvent::CreateAnother) => Transition {
            state: SessionState::Idle,
            effects: vec![Effect::ClearSelection],
        },
        (SessionState::Idle, SessionEvent::CreateAnother) => Transition {
            state: SessionState::Idle,
            effects: vec![Effect::ClearSelection],
        },
        (SessionState::Submitting { .. }, SessionEvent::CreateAnother) => Transition::stay(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusRequest;

    fn jane() -> Payload {
        Payload {
            client_id: 1,
            customer_name: "Jane".to_string(),
            customer_email: "j@x.com".to_string(),
            customer_phone: "555".to_string(),
            status_request: StatusRequest::New,
            home_bank_code: "BA".to_string(),
        }
    }

    fn submitting() -> SessionState {
        SessionState::Submitting {
            customer_name: "Jane".to_string(),
        }
    }

    #[test]
    fn test_idle_payload_starts_submission() {
        let t = transition(&SessionState::Idle, SessionEvent::PayloadAccepted(jane()));
        assert_eq!(t.state, submitting());
        assert_eq!(t.effects, vec![Effect::Submit(jane())]);
        assert!(t.state.is_busy());
    }

    #[test]
    fn test_busy_session_drops_payloads() {
        let t = transition(&submitting(), SessionEvent::PayloadAccepted(jane()));
        assert_eq!(t.state, submitting());
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_success_echoes_name_and_id() {
        let t = transition(
            &submitting(),
            SessionEvent::SubmissionSucceeded { request_id: 42 },
        );
        let outcome = t.state.outcome().unwrap();
        assert_eq!(outcome.request_id, 42);
        assert_eq!(outcome.customer_name, "Jane");
        assert!(outcome.summary().contains("Jane"));
        assert!(outcome.summary().contains("#42"));
        assert_eq!(
            t.effects,
            vec![Effect::Notify(Notification::success(CREATED_MESSAGE))]
        );
    }

    #[test]
    fn test_failure_returns_to_idle_with_message() {
        let t = transition(
            &submitting(),
            SessionEvent::SubmissionFailed("db down".to_string()),
        );
        assert_eq!(t.state, SessionState::Idle);
        match &t.effects[..] {
            [Effect::Notify(n)] => {
                assert_eq!(n.level, NotificationLevel::Error);
                assert!(n.message.contains("db down"));
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_rejected_input_keeps_state() {
        let t = transition(
            &SessionState::Idle,
            SessionEvent::InputRejected(PipelineError::NoSymbolFound),
        );
        assert_eq!(t.state, SessionState::Idle);
        assert_eq!(t.effects.len(), 1);

        let t = transition(
            &submitting(),
            SessionEvent::InputRejected(PipelineError::Camera("unplugged".to_string())),
        );
        assert_eq!(t.state, submitting());
    }

    #[test]
    fn test_create_another_clears_outcome() {
        let done = SessionState::Succeeded(SubmissionSuccess {
            request_id: 42,
            customer_name: "Jane".to_string(),
        });
        let t = transition(&done, SessionEvent::CreateAnother);
        assert_eq!(t.state, SessionState::Idle);
        assert!(t.state.outcome().is_none());
        assert_eq!(t.effects, vec![Effect::ClearSelection]);
    }

    #[test]
    fn test_create_another_ignored_while_submitting() {
        let t = transition(&submitting(), SessionEvent::CreateAnother);
        assert_eq!(t.state, submitting());
    }

    #[test]
    fn test_stale_result_ignored() {
        let t = transition(
            &SessionState::Idle,
            SessionEvent::SubmissionSucceeded { request_id: 1 },
        );
        assert_eq!(t.state, SessionState::Idle);
        assert!(t.effects.is_empty());
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_reset_after_success_is_always_idle(request_id in any::<u64>(), name in ".{0,30}") {
            let done = SessionState::Succeeded(SubmissionSuccess { request_id, customer_name: name });
            let once = transition(&done, SessionEvent::CreateAnother);
            prop_assert_eq!(&once.state, &SessionState::Idle);
            let twice = transition(&once.state, SessionEvent::CreateAnother);
            prop_assert_eq!(twice.state, SessionState::Idle);
        }

        #[test]
        fn test_submitting_ignores_rejections(message in ".{0,30}") {
            let busy = SessionState::Submitting { customer_name: "x".to_string() };
            let t = transition(&busy, SessionEvent::InputRejected(PipelineError::InvalidPayload(message)));
            prop_assert!(t.state.is_busy());
        }
    }
}
