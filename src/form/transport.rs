use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;

use super::controller::FormSnapshot;
use super::timer::Timer;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransportReceipt {
    pub field_count: usize,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("transport unavailable")]
    Unavailable,
}

pub type TransportResult = Result<TransportReceipt, TransportError>;

/// Delivers a submitted form somewhere outside the page.
pub trait Transport: Send + Sync {
    fn send(&self, snapshot: FormSnapshot) -> BoxFuture<'static, TransportResult>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SimulatedOutcome {
    Accept,
    Reject(String),
}

/// Stand-in for a real backend: waits `delay` on the injected timer, logs
/// the payload and resolves with the configured outcome.
#[derive(Clone)]
pub struct SimulatedTransport {
    timer: Arc<dyn Timer>,
    delay: Duration,
    outcome: SimulatedOutcome,
    sent: Arc<AtomicUsize>,
}

impl SimulatedTransport {
    pub fn new(timer: Arc<dyn Timer>, delay: Duration) -> Self {
        Self {
            timer,
            delay,
            outcome: SimulatedOutcome::Accept,
            sent: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn outcome(mut self, outcome: SimulatedOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

impl Transport for SimulatedTransport {
    fn send(&self, snapshot: FormSnapshot) -> BoxFuture<'static, TransportResult> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        let sleep = self.timer.sleep(self.delay);
        let outcome = self.outcome.clone();
        Box::pin(async move {
            sleep.await;
            tracing::info!(fields = ?snapshot, "form data would be sent");
            match outcome {
                SimulatedOutcome::Accept => Ok(TransportReceipt {
                    field_count: snapshot.len(),
                }),
                SimulatedOutcome::Reject(reason) => Err(TransportError::Rejected(reason)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldKey, ManualTimer};
    use futures::FutureExt;

    #[test]
    fn simulated_transport_resolves_after_delay() {
        let timer = ManualTimer::new();
        let transport = SimulatedTransport::new(Arc::new(timer.clone()), Duration::from_millis(1500));
        let snapshot = FormSnapshot::new()
            .with(FieldKey::NAME, "Al")
            .with(FieldKey::CONTACT, "test@example.com");

        let mut pending = transport.send(snapshot);
        assert_eq!(transport.sent_count(), 1);
        assert!((&mut pending).now_or_never().is_none());

        timer.advance(Duration::from_millis(1500));
        assert_eq!(
            pending.now_or_never().expect("transport resolves"),
            Ok(TransportReceipt { field_count: 2 })
        );
    }

    #[test]
    fn simulated_transport_can_reject() {
        let timer = ManualTimer::new();
        let transport = SimulatedTransport::new(Arc::new(timer), Duration::ZERO)
            .outcome(SimulatedOutcome::Reject("backend down".to_string()));

        let result = transport
            .send(FormSnapshot::new())
            .now_or_never()
            .expect("zero delay resolves immediately");
        assert_eq!(
            result,
            Err(TransportError::Rejected("backend down".to_string()))
        );
    }
}
