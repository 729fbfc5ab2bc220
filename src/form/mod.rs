mod controller;
mod submission;
mod timer;
mod transport;
mod validation;

#[cfg(test)]
mod tests;

pub use controller::{
    FieldKey, FieldState, FormController, FormError, FormId, FormMessages, FormOptions,
    FormResult, FormSnapshot, FormStateSnapshot, HideTicket, SubmissionTicket, SubmitState,
};
pub(crate) use controller::{read_lock, write_lock};
pub use submission::{SubmitDecision, SubmitOutcome};
pub use timer::{FuturesTimer, ManualTimer, Timer};
pub use transport::{
    SimulatedOutcome, SimulatedTransport, Transport, TransportError, TransportReceipt,
    TransportResult,
};
pub use validation::{
    ContactPattern, FieldValidator, MinLength, ValidationError, is_valid_contact, is_valid_name,
};
