use crate::animator::ScoreAnimator;
use crate::client::{AnalysisBackend, AnalysisError};
use crate::model::{AnalysisRequest, AnalysisResult};
use crate::renderer::{render, ReportModel, ScoreBucket};
use crate::validator::{AddressShape, FieldValidator, FormField};
use crate::view::{FormView, GENERIC_ERROR_MESSAGE};

/// Identifies one submission. Only the response carrying the ticket of the
/// latest submission is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiState {
    #[default]
    Idle,
    Submitting(Ticket),
    ShowingResult(AnalysisResult),
    ShowingError(String),
}

impl UiState {
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "Idle",
            UiState::Submitting(_) => "Submitting",
            UiState::ShowingResult(_) => "ShowingResult",
            UiState::ShowingError(_) => "ShowingError",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    InputChanged { field: FormField, text: String },
    Submit { ticket: Ticket, request: AnalysisRequest },
    Resolved {
        ticket: Ticket,
        outcome: Result<AnalysisResult, AnalysisError>,
    },
    /// Teardown or restart: drop any in-flight work and return to Idle.
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AddressHint(FormField, AddressShape),
    CancelAnimation,
    SetTriggerEnabled(bool),
    SetBusy(bool),
    SendRequest(Ticket, AnalysisRequest),
    ShowReport(ReportModel),
    AnimateScore(u8, ScoreBucket),
    LogFailure(AnalysisError),
    ShowError(String),
    RevealResults,
}

/// Effects that undo the busy state. Emitted once on every way out of
/// `Submitting`.
fn release() -> [Effect; 2] {
    [Effect::SetTriggerEnabled(true), Effect::SetBusy(false)]
}

/// Total transition function of the form.
pub fn transition(state: UiState, event: Event) -> (UiState, Vec<Effect>) {
    match (state, event) {
        (state, Event::InputChanged { field, text }) => {
            let effects = FieldValidator::hint_for(field, &text)
                .map(|shape| vec![Effect::AddressHint(field, shape)])
                .unwrap_or_default();
            (state, effects)
        }

        // The trigger is disabled while a request is in flight.
        (UiState::Submitting(current), Event::Submit { .. }) => {
            log::debug!("Ignoring submit while submission {:?} is in flight", current);
            (UiState::Submitting(current), Vec::new())
        }

        (_, Event::Submit { ticket, request }) => (
            UiState::Submitting(ticket),
            vec![
                Effect::CancelAnimation,
                Effect::SetTriggerEnabled(false),
                Effect::SetBusy(true),
                Effect::SendRequest(ticket, request),
            ],
        ),

        (UiState::Submitting(current), Event::Resolved { ticket, outcome }) if current == ticket => {
            let (next, mut effects) = match outcome {
                Ok(result) => {
                    let report = render(&result);
                    let (score, bucket) = (report.score, report.bucket);
                    (
                        UiState::ShowingResult(result),
                        vec![
                            Effect::ShowReport(report),
                            Effect::AnimateScore(score, bucket),
                            Effect::RevealResults,
                        ],
                    )
                }
                Err(e) => (
                    UiState::ShowingError(GENERIC_ERROR_MESSAGE.to_string()),
                    vec![
                        Effect::LogFailure(e),
                        Effect::ShowError(GENERIC_ERROR_MESSAGE.to_string()),
                        Effect::RevealResults,
                    ],
                ),
            };
            effects.extend(release());
            (next, effects)
        }

        (state, Event::Resolved { ticket, .. }) => {
            log::debug!(
                "Discarding stale response for {:?} (state {})",
                ticket,
                state.name()
            );
            (state, Vec::new())
        }

        (UiState::Submitting(_), Event::Reset) => {
            let mut effects = vec![Effect::CancelAnimation];
            effects.extend(release());
            (UiState::Idle, effects)
        }

        (_, Event::Reset) => (UiState::Idle, vec![Effect::CancelAnimation]),
    }
}

/// A request the controller has committed to; the response must be handed
/// back through [`FormController::complete`] with the same ticket.
#[derive(Debug, Clone)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: AnalysisRequest,
}

/// Coordinates validator, client, renderer and animator for one form.
pub struct FormController<B: AnalysisBackend, V: FormView> {
    backend: B,
    view: V,
    animator: ScoreAnimator,
    state: UiState,
    last_ticket: u64,
}

impl<B: AnalysisBackend, V: FormView> FormController<B, V> {
    pub fn new(backend: B, view: V, animator: ScoreAnimator) -> Self {
        Self {
            backend,
            view,
            animator,
            state: UiState::Idle,
            last_ticket: 0,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_active()
    }

    pub fn input_changed(&mut self, field: FormField, text: &str) {
        self.dispatch(Event::InputChanged {
            field,
            text: text.to_string(),
        });
    }

    /// Freeze the form and hand out the request to send, or `None` if a
    /// submission is already in flight.
    pub fn begin_submit(&mut self, request: AnalysisRequest) -> Option<Submission> {
        let ticket = Ticket(self.last_ticket + 1);
        let submission = self.dispatch(Event::Submit { ticket, request });
        if submission.is_some() {
            self.last_ticket = ticket.0;
        }
        submission
    }

    /// Apply the outcome of a submission. Outcomes for anything but the
    /// latest submission are dropped.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<AnalysisResult, AnalysisError>) {
        self.dispatch(Event::Resolved { ticket, outcome });
    }

    /// Submit and wait for the service. Never fails: errors end in
    /// `ShowingError`.
    pub async fn submit(&mut self, request: AnalysisRequest) -> &UiState {
        if let Some(submission) = self.begin_submit(request) {
            let outcome = self.backend.submit(&submission.request).await;
            self.complete(submission.ticket, outcome);
        }
        &self.state
    }

    pub fn reset(&mut self) {
        self.dispatch(Event::Reset);
    }

    pub async fn animation_finished(&mut self) {
        self.animator.finished().await;
    }

    fn dispatch(&mut self, event: Event) -> Option<Submission> {
        let previous = std::mem::take(&mut self.state);
        let previous_name = previous.name();
        let (next, effects) = transition(previous, event);

        if previous_name != next.name() {
            log::debug!("Form state {} -> {}", previous_name, next.name());
        }
        self.state = next;

        let mut submission = None;
        for effect in effects {
            match effect {
                Effect::AddressHint(field, shape) => self.view.set_address_hint(field, shape),
                Effect::CancelAnimation => self.animator.cancel(),
                Effect::SetTriggerEnabled(enabled) => self.view.set_trigger_enabled(enabled),
                Effect::SetBusy(busy) => self.view.set_busy(busy),
                Effect::SendRequest(ticket, request) => {
                    submission = Some(Submission { ticket, request });
                }
                Effect::ShowReport(report) => self.view.show_report(&report),
                Effect::AnimateScore(score, bucket) => {
                    let display = self.view.score_display();
                    self.animator.start(score, bucket, display);
                }
                Effect::LogFailure(e) => log::error!("Analysis failed: {}", e),
                Effect::ShowError(message) => self.view.show_error(&message),
                Effect::RevealResults => self.view.reveal_results(),
            }
        }
        submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EvidenceFactor;
    use crate::renderer::{Polarity, ScoreBucket};
    use crate::view::{Page, ResultsContent};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<AnalysisResult, AnalysisError>>>,
        requests: Mutex<Vec<AnalysisRequest>>,
    }

    impl ScriptedBackend {
        fn with(responses: Vec<Result<AnalysisResult, AnalysisError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<AnalysisRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalysisBackend for ScriptedBackend {
        async fn submit(
            &self,
            request: &AnalysisRequest,
        ) -> Result<AnalysisResult, AnalysisError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AnalysisError::Transport("no scripted response".into())))
        }
    }

    fn controller(backend: ScriptedBackend) -> FormController<ScriptedBackend, Page> {
        FormController::new(
            backend,
            Page::new(),
            ScoreAnimator::new(Duration::from_millis(1)),
        )
    }

    fn spoofed_result() -> AnalysisResult {
        AnalysisResult::new(
            85.0,
            vec![EvidenceFactor {
                finding: "Spoofed domain".to_string(),
                details: "...".to_string(),
                risk_contribution: 30.0,
            }],
        )
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("x@y.com", "z@w.com", "hi")
    }

    #[test]
    fn test_submit_effects_order() {
        let (state, effects) = transition(
            UiState::Idle,
            Event::Submit {
                ticket: Ticket(1),
                request: request(),
            },
        );

        assert_eq!(state, UiState::Submitting(Ticket(1)));
        assert_eq!(
            effects,
            vec![
                Effect::CancelAnimation,
                Effect::SetTriggerEnabled(false),
                Effect::SetBusy(true),
                Effect::SendRequest(Ticket(1), request()),
            ]
        );
    }

    #[test]
    fn test_both_outcomes_release_busy_state() {
        for outcome in [Ok(spoofed_result()), Err(AnalysisError::Http(500))] {
            let (_, effects) = transition(
                UiState::Submitting(Ticket(3)),
                Event::Resolved {
                    ticket: Ticket(3),
                    outcome,
                },
            );
            let tail = &effects[effects.len() - 2..];
            assert_eq!(
                tail,
                &[Effect::SetTriggerEnabled(true), Effect::SetBusy(false)]
            );
        }
    }

    #[test]
    fn test_success_effects() {
        let (state, effects) = transition(
            UiState::Submitting(Ticket(1)),
            Event::Resolved {
                ticket: Ticket(1),
                outcome: Ok(spoofed_result()),
            },
        );

        assert_eq!(state, UiState::ShowingResult(spoofed_result()));
        assert!(matches!(effects[0], Effect::ShowReport(ref r) if r.bucket == ScoreBucket::High));
        assert_eq!(effects[1], Effect::AnimateScore(85, ScoreBucket::High));
        assert_eq!(effects[2], Effect::RevealResults);
    }

    #[test]
    fn test_stale_and_unexpected_responses_are_ignored() {
        let (state, effects) = transition(
            UiState::Submitting(Ticket(2)),
            Event::Resolved {
                ticket: Ticket(1),
                outcome: Ok(spoofed_result()),
            },
        );
        assert_eq!(state, UiState::Submitting(Ticket(2)));
        assert!(effects.is_empty());

        let (state, effects) = transition(
            UiState::Idle,
            Event::Resolved {
                ticket: Ticket(1),
                outcome: Err(AnalysisError::Http(500)),
            },
        );
        assert_eq!(state, UiState::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_input_changes_only_hint() {
        let state = UiState::ShowingError(GENERIC_ERROR_MESSAGE.to_string());
        let (next, effects) = transition(
            state.clone(),
            Event::InputChanged {
                field: FormField::Sender,
                text: "a@b".to_string(),
            },
        );
        assert_eq!(next, state);
        assert_eq!(
            effects,
            vec![Effect::AddressHint(FormField::Sender, AddressShape::Invalid)]
        );

        let (_, effects) = transition(
            UiState::Idle,
            Event::InputChanged {
                field: FormField::Body,
                text: "hello".to_string(),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_address_hints_reach_the_view() {
        let mut form = controller(ScriptedBackend::default());
        form.input_changed(FormField::Sender, "x@y.com");
        form.input_changed(FormField::Recipient, "not-an-address");

        assert_eq!(form.view().hint(FormField::Sender), Some(AddressShape::Valid));
        assert_eq!(
            form.view().hint(FormField::Recipient),
            Some(AddressShape::Invalid)
        );
        assert_eq!(form.state(), &UiState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_addresses_do_not_block_submission() {
        let mut form = controller(ScriptedBackend::with(vec![Ok(spoofed_result())]));
        form.input_changed(FormField::Sender, "bogus");

        let state = form.submit(AnalysisRequest::new("bogus", " z@w.com ", "hi")).await;
        assert_eq!(state.name(), "ShowingResult");

        // fields are sent verbatim
        assert_eq!(form.backend().requests()[0].recipient, " z@w.com ");
    }

    #[tokio::test]
    async fn test_high_risk_result_is_rendered() {
        let mut form = controller(ScriptedBackend::with(vec![Ok(spoofed_result())]));

        form.submit(request()).await;
        form.animation_finished().await;

        assert_eq!(form.state(), &UiState::ShowingResult(spoofed_result()));
        assert_eq!(form.backend().requests(), vec![request()]);

        let page = form.view();
        assert!(page.trigger_enabled());
        assert!(!page.is_busy());
        assert!(page.results_visible());
        assert_eq!(page.score().value, 85);
        assert_eq!(page.score().bucket, Some(ScoreBucket::High));

        match page.results() {
            ResultsContent::Report(report) => {
                assert_eq!(report.bucket, ScoreBucket::High);
                assert_eq!(report.items.len(), 1);
                assert_eq!(report.items[0].polarity, Polarity::Negative);
            }
            other => panic!("expected a report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fractional_score_keeps_unrounded_bucket() {
        let mut form = controller(ScriptedBackend::with(vec![Ok(AnalysisResult::new(
            69.6,
            Vec::new(),
        ))]));

        form.submit(request()).await;
        form.animation_finished().await;

        assert_eq!(form.view().score().value, 70);
        assert_eq!(form.view().score().bucket, Some(ScoreBucket::Medium));
    }

    #[tokio::test]
    async fn test_server_error_shows_generic_message() {
        let mut form = controller(ScriptedBackend::with(vec![Err(AnalysisError::Http(500))]));

        let state = form.submit(request()).await;
        assert_eq!(
            state,
            &UiState::ShowingError(GENERIC_ERROR_MESSAGE.to_string())
        );

        let page = form.view();
        assert_eq!(
            page.results(),
            &ResultsContent::Error(GENERIC_ERROR_MESSAGE.to_string())
        );
        assert!(page.results_visible());
        assert!(page.trigger_enabled());
        assert!(!page.is_busy());
        assert!(!form.is_animating());
    }

    #[tokio::test]
    async fn test_transport_error_detail_is_not_shown() {
        let mut form = controller(ScriptedBackend::with(vec![Err(AnalysisError::Transport(
            "connection refused".to_string(),
        ))]));

        form.submit(request()).await;
        match form.view().results() {
            ResultsContent::Error(message) => {
                assert_eq!(message, GENERIC_ERROR_MESSAGE);
                assert!(!message.contains("refused"));
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn test_busy_while_submitting_and_second_submit_is_noop() {
        let mut form = controller(ScriptedBackend::default());

        let first = form.begin_submit(request()).unwrap();
        assert_eq!(form.state(), &UiState::Submitting(first.ticket));
        assert!(form.view().is_busy());
        assert!(!form.view().trigger_enabled());

        assert!(form.begin_submit(request()).is_none());
        assert_eq!(form.state(), &UiState::Submitting(first.ticket));
    }

    #[tokio::test]
    async fn test_only_latest_submission_is_rendered() {
        let mut form = controller(ScriptedBackend::default());
        let late = AnalysisResult::new(10.0, Vec::new());

        let first = form.begin_submit(request()).unwrap();
        form.reset();
        let second = form.begin_submit(request()).unwrap();
        assert!(second.ticket > first.ticket);

        form.complete(second.ticket, Ok(spoofed_result()));
        form.complete(first.ticket, Ok(late.clone()));
        form.animation_finished().await;

        assert_eq!(form.state(), &UiState::ShowingResult(spoofed_result()));
        assert_eq!(form.view().score().value, 85);
    }

    #[tokio::test]
    async fn test_stale_response_arriving_first_is_dropped() {
        let mut form = controller(ScriptedBackend::default());

        let first = form.begin_submit(request()).unwrap();
        form.reset();
        let second = form.begin_submit(request()).unwrap();

        form.complete(first.ticket, Err(AnalysisError::Http(502)));
        assert_eq!(form.state(), &UiState::Submitting(second.ticket));
        assert!(form.view().is_busy());
        assert_eq!(form.view().results(), &ResultsContent::Empty);

        form.complete(second.ticket, Ok(spoofed_result()));
        assert_eq!(form.state().name(), "ShowingResult");
        assert!(!form.view().is_busy());
    }

    #[tokio::test]
    async fn test_new_submission_cancels_running_animation() {
        let mut form = FormController::new(
            ScriptedBackend::with(vec![Ok(spoofed_result())]),
            Page::new(),
            ScoreAnimator::new(Duration::from_millis(50)),
        );

        form.submit(request()).await;
        assert!(form.is_animating());

        form.begin_submit(request()).unwrap();
        assert!(!form.is_animating());
    }

    #[test]
    fn test_reset_releases_form() {
        let mut form = controller(ScriptedBackend::default());
        form.begin_submit(request()).unwrap();

        form.reset();
        assert_eq!(form.state(), &UiState::Idle);
        assert!(form.view().trigger_enabled());
        assert!(!form.view().is_busy());
    }
}
