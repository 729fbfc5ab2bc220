use super::controller::{
    FieldKey, FormController, FormError, FormResult, FormSnapshot, HideTicket,
    SubmissionTicket, SubmitState, read_lock, transition_submit_state, write_lock,
};
use super::transport::{TransportError, TransportReceipt, TransportResult};
use crate::feedback::StatusMessage;

/// Result of the synchronous validation step of a submit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitDecision {
    /// At least one field failed validation; the transport must not be called.
    Rejected { invalid_fields: Vec<FieldKey> },
    /// Every field passed; `snapshot` should be handed to the transport.
    Dispatch {
        ticket: SubmissionTicket,
        snapshot: FormSnapshot,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Rejected { invalid_fields: Vec<FieldKey> },
    Delivered {
        receipt: TransportReceipt,
        hide: HideTicket,
    },
    TransportFailed(TransportError),
    /// The form was reset while the transport was still working.
    Superseded,
}

impl FormController {
    /// Submits the values currently held by the form.
    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        let snapshot = self.submission_snapshot()?;
        self.submit_snapshot(snapshot).await
    }

    /// Validates `snapshot`, hands it to the transport when every field is
    /// valid and applies the transport's answer.
    pub async fn submit_snapshot(&self, snapshot: FormSnapshot) -> FormResult<SubmitOutcome> {
        let (ticket, snapshot) = match self.begin_submit(snapshot)? {
            SubmitDecision::Rejected { invalid_fields } => {
                return Ok(SubmitOutcome::Rejected { invalid_fields });
            }
            SubmitDecision::Dispatch { ticket, snapshot } => (ticket, snapshot),
        };

        let result = self.transport.send(snapshot).await;
        self.on_transport_result(ticket, result)
    }

    /// Validates every required field and every field present in `snapshot`.
    ///
    /// A required field missing from the snapshot is validated as empty. On
    /// success the form moves to `Submitting` and the returned ticket must be
    /// passed back to [`FormController::on_transport_result`].
    pub fn begin_submit(&self, snapshot: FormSnapshot) -> FormResult<SubmitDecision> {
        let form_id = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if matches!(
                state.submit_state,
                SubmitState::Validating | SubmitState::Submitting
            ) {
                tracing::warn!(
                    form = %state.id,
                    state = ?state.submit_state,
                    "submit ignored, a submission is in progress"
                );
                return Err(FormError::AlreadySubmitting);
            }
            // A new submit supersedes whatever the previous one left behind.
            transition_submit_state(&mut state, SubmitState::Idle)?;
            state.pending_hide = None;
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            state.id
        };

        let mut keys = read_lock(&self.required_fields, "reading required fields for submit")?
            .clone();
        keys.extend(snapshot.keys());

        let mut checked = Vec::with_capacity(keys.len());
        for key in keys {
            let value = snapshot.get(key).unwrap_or_default();
            checked.push((key, self.check_field(key, value)?));
        }
        let invalid_fields = checked
            .iter()
            .filter_map(|(key, field)| (!field.is_valid).then_some(*key))
            .collect::<Vec<_>>();

        let (decision, status) = {
            let mut state = write_lock(&self.state, "applying submit validation")?;
            for (key, field) in &checked {
                state.fields.insert(*key, field.clone());
            }

            if invalid_fields.is_empty() {
                transition_submit_state(&mut state, SubmitState::Submitting)?;
                let ticket = SubmissionTicket(state.issue_ticket());
                state.in_flight = Some(ticket);
                let status = StatusMessage::info(self.options.messages.sending.clone());
                state.status = Some(status.clone());
                tracing::debug!(form = %form_id, ticket = ticket.0, "submission dispatched");
                (SubmitDecision::Dispatch { ticket, snapshot }, status)
            } else {
                transition_submit_state(&mut state, SubmitState::Idle)?;
                let status = StatusMessage::error(self.options.messages.fix_errors.clone());
                state.status = Some(status.clone());
                tracing::debug!(form = %form_id, invalid = ?invalid_fields, "submission rejected by validation");
                (SubmitDecision::Rejected { invalid_fields }, status)
            }
        };

        for (key, field) in &checked {
            self.render_field(*key, field);
        }
        self.view.show_status(&status);
        Ok(decision)
    }

    /// Applies the transport's answer for `ticket`. Answers for a ticket that
    /// is no longer in flight (the form was reset meanwhile) are ignored.
    pub fn on_transport_result(
        &self,
        ticket: SubmissionTicket,
        result: TransportResult,
    ) -> FormResult<SubmitOutcome> {
        let (outcome, status, cleared) = {
            let mut state = write_lock(&self.state, "completing submit")?;
            if state.in_flight != Some(ticket) || state.submit_state != SubmitState::Submitting {
                tracing::debug!(form = %state.id, ticket = ticket.0, "stale transport result ignored");
                return Ok(SubmitOutcome::Superseded);
            }
            state.in_flight = None;

            match result {
                Ok(receipt) => {
                    transition_submit_state(&mut state, SubmitState::Succeeded)?;
                    let cleared = if self.options.clear_on_success {
                        std::mem::take(&mut state.fields)
                            .into_keys()
                            .collect::<Vec<_>>()
                    } else {
                        Vec::new()
                    };
                    let hide = HideTicket(state.issue_ticket());
                    state.pending_hide = Some(hide);
                    let status = StatusMessage::success(self.options.messages.success.clone())
                        .auto_hide(Some(self.options.auto_hide));
                    state.status = Some(status.clone());
                    tracing::info!(
                        form = %state.id,
                        event = "form_submission",
                        fields = receipt.field_count,
                        "conversion tracked"
                    );
                    (SubmitOutcome::Delivered { receipt, hide }, status, cleared)
                }
                Err(error) => {
                    transition_submit_state(&mut state, SubmitState::Failed)?;
                    let status = StatusMessage::error(self.options.messages.failure.clone());
                    state.status = Some(status.clone());
                    tracing::warn!(form = %state.id, %error, "form submission failed");
                    (SubmitOutcome::TransportFailed(error), status, Vec::new())
                }
            }
        };

        if !cleared.is_empty() {
            self.view.clear_inputs();
            for key in cleared {
                self.view.clear_field_error(key);
            }
        }
        self.view.show_status(&status);
        Ok(outcome)
    }

    /// Waits the configured display time, then hides the success message
    /// and returns to `Idle` unless `ticket` was superseded meanwhile.
    pub async fn auto_hide(&self, ticket: HideTicket) -> FormResult<bool> {
        self.timer.sleep(self.options.auto_hide).await;
        self.dismiss_status(ticket)
    }

    /// Hides the status immediately if `ticket` is still the pending one.
    pub fn dismiss_status(&self, ticket: HideTicket) -> FormResult<bool> {
        {
            let mut state = write_lock(&self.state, "dismissing status")?;
            if state.pending_hide != Some(ticket) {
                return Ok(false);
            }
            state.pending_hide = None;
            state.status = None;
            transition_submit_state(&mut state, SubmitState::Idle)?;
        }
        self.view.hide_status();
        Ok(true)
    }
}

