use super::*;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use crate::contracts::FormView;
use crate::feedback::{StatusKind, StatusMessage};

const TRANSPORT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Debug, Eq, PartialEq)]
enum ViewEvent {
    FieldError(FieldKey, String),
    FieldCleared(FieldKey),
    Status(StatusKind, String),
    StatusHidden,
    InputsCleared,
}

#[derive(Default)]
struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    fn push(&self, event: ViewEvent) {
        self.events.lock().expect("view events").push(event);
    }

    fn take(&self) -> Vec<ViewEvent> {
        std::mem::take(&mut *self.events.lock().expect("view events"))
    }
}

impl FormView for RecordingView {
    fn show_field_error(&self, field: FieldKey, message: &str) {
        self.push(ViewEvent::FieldError(field, message.to_string()));
    }

    fn clear_field_error(&self, field: FieldKey) {
        self.push(ViewEvent::FieldCleared(field));
    }

    fn show_status(&self, status: &StatusMessage) {
        self.push(ViewEvent::Status(status.kind, status.text.clone()));
    }

    fn hide_status(&self) {
        self.push(ViewEvent::StatusHidden);
    }

    fn clear_inputs(&self) {
        self.push(ViewEvent::InputsCleared);
    }
}

/// Resolves immediately with a fixed result and counts invocations.
struct CountingTransport {
    calls: AtomicUsize,
    result: TransportResult,
}

impl CountingTransport {
    fn new(result: TransportResult) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            result,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for CountingTransport {
    fn send(&self, _snapshot: FormSnapshot) -> BoxFuture<'static, TransportResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(futures::future::ready(self.result.clone()))
    }
}

struct Harness {
    controller: FormController,
    view: Arc<RecordingView>,
    timer: ManualTimer,
    transport: Arc<SimulatedTransport>,
}

fn harness(outcome: SimulatedOutcome) -> Harness {
    let view = Arc::new(RecordingView::default());
    let timer = ManualTimer::new();
    let transport = Arc::new(
        SimulatedTransport::new(Arc::new(timer.clone()), TRANSPORT_DELAY).outcome(outcome),
    );
    let controller = FormController::contact_form(
        FormOptions::default(),
        view.clone(),
        transport.clone(),
        Arc::new(timer.clone()),
    )
    .expect("contact form builds");
    Harness {
        controller,
        view,
        timer,
        transport,
    }
}

fn fill_valid(controller: &FormController) {
    controller
        .input(FieldKey::NAME, "Al")
        .expect("name input");
    controller
        .input(FieldKey::CONTACT, "test@example.com")
        .expect("contact input");
}

/// Drives a submit through the simulated transport delay.
fn submit_and_deliver(h: &Harness) -> SubmitOutcome {
    let mut submit = Box::pin(h.controller.submit());
    assert!((&mut submit).now_or_never().is_none());
    h.timer.advance(TRANSPORT_DELAY);
    submit
        .now_or_never()
        .expect("transport resolved")
        .expect("submit succeeds")
}

#[test]
fn input_renders_field_error_and_clears_it_when_fixed() {
    let h = harness(SimulatedOutcome::Accept);

    let name = h.controller.input(FieldKey::NAME, " A ").expect("input");
    assert!(!name.is_valid);
    assert_eq!(name.error_message.as_deref(), Some("name too short"));

    let name = h.controller.input(FieldKey::NAME, "Al").expect("input");
    assert_eq!(name, FieldState::valid("Al"));

    let contact = h.controller.input(FieldKey::CONTACT, "12345").expect("input");
    assert_eq!(contact.error_message.as_deref(), Some("invalid email or phone"));

    assert_eq!(
        h.view.take(),
        vec![
            ViewEvent::FieldError(FieldKey::NAME, "name too short".to_string()),
            ViewEvent::FieldCleared(FieldKey::NAME),
            ViewEvent::FieldError(FieldKey::CONTACT, "invalid email or phone".to_string()),
        ]
    );
}

#[test]
fn input_without_live_validation_keeps_view_untouched() {
    let view = Arc::new(RecordingView::default());
    let transport = Arc::new(CountingTransport::new(Ok(TransportReceipt { field_count: 2 })));
    let controller = FormController::contact_form(
        FormOptions {
            validate_on_input: false,
            ..FormOptions::default()
        },
        view.clone(),
        transport,
        Arc::new(ManualTimer::new()),
    )
    .expect("contact form builds");

    let field = controller.input(FieldKey::NAME, "").expect("input");
    assert!(!field.is_valid);
    assert!(view.take().is_empty());
}

#[test]
fn invalid_submit_never_invokes_transport() {
    let view = Arc::new(RecordingView::default());
    let transport = Arc::new(CountingTransport::new(Ok(TransportReceipt { field_count: 2 })));
    let controller = FormController::contact_form(
        FormOptions::default(),
        view.clone(),
        transport.clone(),
        Arc::new(ManualTimer::new()),
    )
    .expect("contact form builds");

    for (name, contact) in [("", "test@example.com"), ("Al", "abc"), ("A", "12345")] {
        let snapshot = FormSnapshot::new()
            .with(FieldKey::NAME, name)
            .with(FieldKey::CONTACT, contact);
        let outcome = controller
            .submit_snapshot(snapshot)
            .now_or_never()
            .expect("rejected submit resolves synchronously")
            .expect("submit returns Ok when validation fails");
        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert_eq!(controller.submit_state().expect("state"), SubmitState::Idle);
    }

    assert_eq!(transport.calls(), 0);
    let status = controller.status().expect("status").expect("status shown");
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, FormMessages::default().fix_errors);
    assert_eq!(controller.snapshot().expect("snapshot").submit_count, 3);
}

#[test]
fn rejected_submit_names_invalid_fields() {
    let h = harness(SimulatedOutcome::Accept);
    let decision = h
        .controller
        .begin_submit(
            FormSnapshot::new()
                .with(FieldKey::NAME, "Al")
                .with(FieldKey::CONTACT, "abc"),
        )
        .expect("begin submit");
    assert_eq!(
        decision,
        SubmitDecision::Rejected {
            invalid_fields: vec![FieldKey::CONTACT]
        }
    );
    assert_eq!(
        h.view.take(),
        vec![
            ViewEvent::FieldError(FieldKey::CONTACT, "invalid email or phone".to_string()),
            ViewEvent::FieldCleared(FieldKey::NAME),
            ViewEvent::Status(StatusKind::Error, FormMessages::default().fix_errors),
        ]
    );
}

#[test]
fn missing_required_value_is_validated_as_empty() {
    let h = harness(SimulatedOutcome::Accept);
    let decision = h
        .controller
        .begin_submit(FormSnapshot::new().with(FieldKey::CONTACT, "test@example.com"))
        .expect("begin submit");
    assert_eq!(
        decision,
        SubmitDecision::Rejected {
            invalid_fields: vec![FieldKey::NAME]
        }
    );
    assert_eq!(h.transport.sent_count(), 0);
}

#[test]
fn valid_submit_invokes_transport_exactly_once() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);

    let mut submit = Box::pin(h.controller.submit());
    assert!((&mut submit).now_or_never().is_none());
    assert_eq!(h.transport.sent_count(), 1);
    assert_eq!(
        h.controller.submit_state().expect("state"),
        SubmitState::Submitting
    );
    assert_eq!(
        h.controller.status().expect("status").map(|status| status.kind),
        Some(StatusKind::Info)
    );

    h.timer.advance(TRANSPORT_DELAY);
    let outcome = submit
        .now_or_never()
        .expect("transport resolved")
        .expect("submit succeeds");
    assert!(matches!(
        outcome,
        SubmitOutcome::Delivered {
            receipt: TransportReceipt { field_count: 2 },
            ..
        }
    ));
    assert_eq!(h.transport.sent_count(), 1);
    assert_eq!(
        h.controller.submit_state().expect("state"),
        SubmitState::Succeeded
    );
}

#[test]
fn second_submit_while_in_flight_is_refused() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);

    let mut first = Box::pin(h.controller.submit());
    assert!((&mut first).now_or_never().is_none());

    let second = h
        .controller
        .submit()
        .now_or_never()
        .expect("refusal is immediate");
    assert_eq!(second, Err(FormError::AlreadySubmitting));
    assert_eq!(h.transport.sent_count(), 1);

    h.timer.advance(TRANSPORT_DELAY);
    assert!(matches!(
        first.now_or_never().expect("resolved"),
        Ok(SubmitOutcome::Delivered { .. })
    ));
}

#[test]
fn submit_is_refused_while_another_is_validating() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    h.controller
        .register_field_validator(FieldKey::NAME, move |_value: &str| {
            let _ = entered_tx.send(());
            let _ = release_rx.lock().expect("release channel").recv();
            Ok(())
        })
        .expect("register blocking validator");

    let controller = h.controller.clone();
    let first = thread::spawn(move || {
        let snapshot = controller.submission_snapshot().expect("snapshot");
        controller.begin_submit(snapshot)
    });

    entered_rx.recv().expect("first submit reaches validation");
    assert_eq!(
        h.controller.submit_state().expect("state"),
        SubmitState::Validating
    );
    let snapshot = h.controller.submission_snapshot().expect("snapshot");
    assert_eq!(
        h.controller.begin_submit(snapshot),
        Err(FormError::AlreadySubmitting)
    );

    release_tx.send(()).expect("release first submit");
    let first = first
        .join()
        .expect("first submit thread")
        .expect("first submit");
    assert!(matches!(first, SubmitDecision::Dispatch { .. }));
    assert_eq!(
        h.controller.submit_state().expect("state"),
        SubmitState::Submitting
    );
    assert_eq!(h.controller.snapshot().expect("snapshot").submit_count, 1);
}

#[test]
fn success_clears_inputs_but_keeps_confirmation() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    h.view.take();

    submit_and_deliver(&h);

    let snapshot = h.controller.snapshot().expect("snapshot");
    assert!(snapshot.fields.is_empty());
    let status = snapshot.status.expect("confirmation visible");
    assert_eq!(status.kind, StatusKind::Success);
    assert_eq!(status.auto_hide, Some(Duration::from_secs(5)));

    let events = h.view.take();
    assert!(events.contains(&ViewEvent::InputsCleared));
    assert_eq!(
        events.last(),
        Some(&ViewEvent::Status(
            StatusKind::Success,
            FormMessages::default().success
        ))
    );
    assert!(!events.contains(&ViewEvent::StatusHidden));
}

#[test]
fn confirmation_hides_after_display_duration_and_not_before() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    let SubmitOutcome::Delivered { hide, .. } = submit_and_deliver(&h) else {
        panic!("submission should be delivered");
    };

    let mut auto_hide = Box::pin(h.controller.auto_hide(hide));
    assert!((&mut auto_hide).now_or_never().is_none());

    h.timer.advance(Duration::from_millis(4_999));
    assert!((&mut auto_hide).now_or_never().is_none());
    assert_eq!(
        h.controller.submit_state().expect("state"),
        SubmitState::Succeeded
    );
    assert!(h.controller.status().expect("status").is_some());

    h.timer.advance(Duration::from_millis(1));
    assert_eq!(auto_hide.now_or_never(), Some(Ok(true)));
    assert_eq!(h.controller.submit_state().expect("state"), SubmitState::Idle);
    assert_eq!(h.controller.status().expect("status"), None);
    assert_eq!(h.view.take().last(), Some(&ViewEvent::StatusHidden));
}

#[test]
fn transport_failure_prompts_retry_without_timer() {
    let h = harness(SimulatedOutcome::Reject("backend down".to_string()));
    fill_valid(&h.controller);

    let outcome = submit_and_deliver(&h);
    assert_eq!(
        outcome,
        SubmitOutcome::TransportFailed(TransportError::Rejected("backend down".to_string()))
    );
    assert_eq!(h.controller.submit_state().expect("state"), SubmitState::Failed);
    assert_eq!(h.timer.pending(), 0);

    let status = h.controller.status().expect("status").expect("retry prompt");
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, FormMessages::default().failure);
    assert_eq!(status.auto_hide, None);

    // Values survive a failure so the user can simply retry.
    assert_eq!(
        h.controller
            .field(FieldKey::NAME)
            .expect("field")
            .map(|field| field.value),
        Some("Al".to_string())
    );

    h.controller
        .input(FieldKey::NAME, "Alex")
        .expect("next interaction");
    assert_eq!(h.controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn failed_form_can_be_resubmitted() {
    let view = Arc::new(RecordingView::default());
    let transport = Arc::new(CountingTransport::new(Err(TransportError::Unavailable)));
    let controller = FormController::contact_form(
        FormOptions::default(),
        view,
        transport.clone(),
        Arc::new(ManualTimer::new()),
    )
    .expect("contact form builds");
    fill_valid(&controller);

    for attempt in 1..=2 {
        let outcome = controller
            .submit()
            .now_or_never()
            .expect("ready transport")
            .expect("submit");
        assert_eq!(outcome, SubmitOutcome::TransportFailed(TransportError::Unavailable));
        assert_eq!(transport.calls(), attempt);
    }
}

#[test]
fn reset_clears_errors_and_status_in_every_state() {
    // After a rejected submit.
    let h = harness(SimulatedOutcome::Accept);
    h.controller.input(FieldKey::NAME, "A").expect("input");
    h.controller
        .begin_submit(FormSnapshot::new())
        .expect("begin submit");
    h.view.take();
    h.controller.reset().expect("reset");
    assert_reset(&h);
    assert_eq!(
        h.view.take(),
        vec![
            ViewEvent::InputsCleared,
            ViewEvent::FieldCleared(FieldKey::CONTACT),
            ViewEvent::FieldCleared(FieldKey::NAME),
            ViewEvent::StatusHidden,
        ]
    );

    // While the transport is working.
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    let mut submit = Box::pin(h.controller.submit());
    assert!((&mut submit).now_or_never().is_none());
    h.controller.reset().expect("reset");
    assert_reset(&h);
    h.timer.advance(TRANSPORT_DELAY);
    assert_eq!(submit.now_or_never(), Some(Ok(SubmitOutcome::Superseded)));
    assert_reset(&h);

    // While the confirmation is displayed.
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    submit_and_deliver(&h);
    h.controller.reset().expect("reset");
    assert_reset(&h);
}

fn assert_reset(h: &Harness) {
    let snapshot = h.controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.submit_state, SubmitState::Idle);
    assert!(snapshot.fields.is_empty());
    assert_eq!(snapshot.status, None);
}

#[test]
fn reset_cancels_pending_auto_hide() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    let SubmitOutcome::Delivered { hide, .. } = submit_and_deliver(&h) else {
        panic!("submission should be delivered");
    };
    let mut auto_hide = Box::pin(h.controller.auto_hide(hide));
    assert!((&mut auto_hide).now_or_never().is_none());

    h.controller.reset().expect("reset");
    h.controller
        .begin_submit(FormSnapshot::new())
        .expect("new interaction");
    h.view.take();

    h.timer.advance(Duration::from_secs(5));
    assert_eq!(auto_hide.now_or_never(), Some(Ok(false)));
    let status = h.controller.status().expect("status").expect("newer status kept");
    assert_eq!(status.text, FormMessages::default().fix_errors);
    assert!(h.view.take().is_empty());
}

#[test]
fn new_submit_supersedes_displayed_confirmation() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    let SubmitOutcome::Delivered { hide, .. } = submit_and_deliver(&h) else {
        panic!("submission should be delivered");
    };

    fill_valid(&h.controller);
    let mut again = Box::pin(h.controller.submit());
    assert!((&mut again).now_or_never().is_none());
    assert_eq!(h.controller.dismiss_status(hide), Ok(false));
    assert_eq!(
        h.controller.submit_state().expect("state"),
        SubmitState::Submitting
    );
}

#[test]
fn stale_transport_ticket_is_ignored() {
    let h = harness(SimulatedOutcome::Accept);
    fill_valid(&h.controller);
    let snapshot = h.controller.submission_snapshot().expect("snapshot");
    let SubmitDecision::Dispatch { ticket, .. } =
        h.controller.begin_submit(snapshot).expect("begin submit")
    else {
        panic!("valid form should dispatch");
    };
    h.controller.reset().expect("reset");

    let outcome = h
        .controller
        .on_transport_result(ticket, Ok(TransportReceipt { field_count: 2 }))
        .expect("stale result");
    assert_eq!(outcome, SubmitOutcome::Superseded);
    assert_eq!(h.controller.submit_state().expect("state"), SubmitState::Idle);
}

#[test]
fn custom_validators_run_after_builtin_rules() {
    let h = harness(SimulatedOutcome::Accept);
    h.controller
        .register_field_validator(FieldKey::NAME, |value: &str| {
            if value.trim().eq_ignore_ascii_case("admin") {
                Err(ValidationError::new("reserved name"))
            } else {
                Ok(())
            }
        })
        .expect("register validator");

    assert_eq!(
        h.controller
            .check_field(FieldKey::NAME, "Admin")
            .expect("check")
            .error_message
            .as_deref(),
        Some("reserved name")
    );
    assert_eq!(
        h.controller
            .check_field(FieldKey::NAME, "A")
            .expect("check")
            .error_message
            .as_deref(),
        Some("name too short")
    );
}

#[test]
fn optional_fields_are_submitted_but_not_required() {
    let h = harness(SimulatedOutcome::Accept);
    let comment = FieldKey::new("comment");
    h.controller
        .input(comment, "call after six")
        .expect("comment input");
    fill_valid(&h.controller);
    assert!(!h.controller.is_required(comment).expect("required"));

    let snapshot = h.controller.submission_snapshot().expect("snapshot");
    assert_eq!(snapshot.get(comment), Some("call after six"));
    assert!(matches!(
        submit_and_deliver(&h),
        SubmitOutcome::Delivered {
            receipt: TransportReceipt { field_count: 3 },
            ..
        }
    ));
}

#[test]
fn submit_state_transitions_are_enforced() {
    let h = harness(SimulatedOutcome::Accept);
    let mut state = h.controller.state.write().expect("state lock");
    assert_eq!(
        super::controller::transition_submit_state(&mut state, SubmitState::Succeeded),
        Err(FormError::InvalidStateTransition {
            from: SubmitState::Idle,
            to: SubmitState::Succeeded,
        })
    );
    assert!(super::controller::transition_submit_state(&mut state, SubmitState::Validating).is_ok());
    assert!(super::controller::transition_submit_state(&mut state, SubmitState::Failed).is_err());
    assert!(super::controller::transition_submit_state(&mut state, SubmitState::Idle).is_ok());
}

#[test]
fn form_ids_are_unique() {
    let first = harness(SimulatedOutcome::Accept);
    let second = harness(SimulatedOutcome::Accept);
    assert_ne!(
        first.controller.form_id().expect("id"),
        second.controller.form_id().expect("id")
    );
}
